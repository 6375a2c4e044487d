//! Handler for sketch-to-photo generation.
//!
//! Endpoints:
//! - POST /image/upload

use std::sync::Arc;

use axum::extract::{Multipart, State};
use axum::Json;
use serde::Serialize;

use sketchface_core::imaging::{decode_grayscale, encode_png, png_data_url};
use sketchface_core::upload::{validate_upload, UploadError};

use crate::error::{AppError, AppResult};
use crate::state::SketchState;
use crate::upload::read_file_field;

/// Multipart field carrying the sketch.
pub const SKETCH_FIELD: &str = "digitalImage";

#[derive(Debug, Serialize)]
pub struct GenerationResponse {
    pub result: GeneratedImage,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedImage {
    /// `data:image/png;base64,...`
    pub generated_image: String,
}

/// POST /image/upload
///
/// Decode the uploaded sketch as grayscale, run the generator and return the
/// photo as a PNG data URL. Input problems are 422; generator failures 500.
pub async fn upload_image(
    State(state): State<SketchState>,
    multipart: Multipart,
) -> AppResult<Json<GenerationResponse>> {
    let upload = read_file_field(multipart, SKETCH_FIELD)
        .await?
        .ok_or_else(|| AppError::Unprocessable(UploadError::MissingFile.to_string()))?;

    validate_upload(upload.content_type.as_deref(), &upload.bytes)
        .map_err(|e| AppError::Unprocessable(e.to_string()))?;

    let sketch = decode_grayscale(&upload.bytes).map_err(|e| {
        tracing::warn!(error = %e, "Undecodable sketch upload");
        AppError::Unprocessable(
            "Could not decode image. Ensure it's a valid grayscale image".to_string(),
        )
    })?;

    let generator = Arc::clone(&state.generator);
    let photo = tokio::task::spawn_blocking(move || generator.generate(&sketch))
        .await
        .map_err(|e| generation_failed(&e))?
        .map_err(|e| generation_failed(&e))?;

    let png = encode_png(&photo).map_err(|e| generation_failed(&e))?;

    tracing::info!(
        file_name = upload.file_name.as_deref().unwrap_or("unknown"),
        "Successfully processed image"
    );

    Ok(Json(GenerationResponse {
        result: GeneratedImage {
            generated_image: png_data_url(&png),
        },
    }))
}

fn generation_failed(err: &dyn std::fmt::Display) -> AppError {
    AppError::ServiceFailure(format!("Photo generation failed: {err}"))
}
