//! Image decoding from upload bytes and PNG / data-URL encoding of results.

use std::io::Cursor;
use std::path::Path;

use base64::Engine;
use image::{DynamicImage, GrayImage, ImageFormat, RgbImage};

use crate::error::CoreError;
use crate::upload::UploadError;

/// Prefix of every data URL produced by [`png_data_url`].
pub const PNG_DATA_URL_PREFIX: &str = "data:image/png;base64,";

fn decode(bytes: &[u8]) -> Result<DynamicImage, UploadError> {
    image::load_from_memory(bytes).map_err(|e| UploadError::Undecodable(e.to_string()))
}

/// Decode any supported image format into 8-bit grayscale.
pub fn decode_grayscale(bytes: &[u8]) -> Result<GrayImage, UploadError> {
    Ok(decode(bytes)?.to_luma8())
}

/// Decode any supported image format into 8-bit RGB.
pub fn decode_rgb(bytes: &[u8]) -> Result<RgbImage, UploadError> {
    Ok(decode(bytes)?.to_rgb8())
}

/// Read an image file from disk as 8-bit RGB.
pub fn open_rgb(path: &Path) -> Result<RgbImage, CoreError> {
    let image = image::open(path).map_err(|e| {
        CoreError::Validation(format!("Failed to open image {}: {e}", path.display()))
    })?;
    Ok(image.to_rgb8())
}

/// Encode an RGB image as PNG bytes.
pub fn encode_png(image: &RgbImage) -> Result<Vec<u8>, CoreError> {
    let mut buf = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .map_err(|e| CoreError::Internal(format!("PNG encoding failed: {e}")))?;
    Ok(buf)
}

/// Wrap PNG bytes in a `data:image/png;base64,...` URL.
pub fn png_data_url(png: &[u8]) -> String {
    let encoded = base64::engine::general_purpose::STANDARD.encode(png);
    format!("{PNG_DATA_URL_PREFIX}{encoded}")
}
