//! Extraction of a single named file field from a multipart body.

use axum::body::Bytes;
use axum::extract::Multipart;

use crate::error::{AppError, AppResult};

/// A file part of a multipart upload.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

/// Read the first field named `field_name`, skipping every other field.
///
/// Returns `Ok(None)` when the body has no such field.
pub async fn read_file_field(
    mut multipart: Multipart,
    field_name: &str,
) -> AppResult<Option<UploadedFile>> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        if field.name() != Some(field_name) {
            continue;
        }

        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(e.to_string()))?;

        return Ok(Some(UploadedFile {
            file_name,
            content_type,
            bytes,
        }));
    }

    Ok(None)
}
