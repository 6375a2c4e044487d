//! Validation of uploaded image files before any decoding happens.

/// Content types accepted by the upload endpoints start with this prefix.
pub const IMAGE_MIME_PREFIX: &str = "image/";

/// Reasons an uploaded file is rejected as input.
///
/// The `Display` text of each variant is the client-facing message.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UploadError {
    #[error("No file provided")]
    MissingFile,

    #[error("Invalid file type: {0}. Only image files are allowed")]
    NotAnImage(String),

    #[error("Empty file uploaded")]
    Empty,

    #[error("Could not decode image: {0}")]
    Undecodable(String),
}

/// Whether a multipart content type denotes an image.
pub fn is_image_content_type(content_type: Option<&str>) -> bool {
    content_type.is_some_and(|ct| ct.starts_with(IMAGE_MIME_PREFIX))
}

/// Check the declared content type and the payload size of an upload.
///
/// The content type is checked first, so a non-image empty upload reports
/// the type error.
pub fn validate_upload(content_type: Option<&str>, bytes: &[u8]) -> Result<(), UploadError> {
    if !is_image_content_type(content_type) {
        return Err(UploadError::NotAnImage(
            content_type.unwrap_or("unknown").to_string(),
        ));
    }
    if bytes.is_empty() {
        return Err(UploadError::Empty);
    }
    Ok(())
}
