//! Handlers for face-similarity search.
//!
//! Endpoints:
//! - POST /find_similar/
//! - GET  /preprocess/

use std::sync::Arc;

use axum::extract::{Multipart, State};
use axum::Json;
use serde::Serialize;

use sketchface_core::embedding::validate_dimension;
use sketchface_core::imaging::decode_rgb;
use sketchface_core::similarity::{fallback_matches, format_matches, rank_by_cosine, TOP_K};
use sketchface_core::upload::{is_image_content_type, UploadError};

use crate::error::{AppError, AppResult};
use crate::preprocess::rebuild_store;
use crate::state::SimilarityState;
use crate::upload::read_file_field;

/// Multipart field carrying the probe image.
pub const PROBE_FIELD: &str = "file";

#[derive(Debug, Serialize)]
pub struct PreprocessResponse {
    pub message: String,
}

/// POST /find_similar/
///
/// Embed the largest face of the upload and return the five most similar
/// gallery entries as `[id, "0.1234"]` pairs, best first. When no face is
/// found, five random gallery ids are returned with score `0.0000`.
pub async fn find_similar(
    State(state): State<SimilarityState>,
    multipart: Multipart,
) -> AppResult<Json<Vec<[String; 2]>>> {
    let upload = read_file_field(multipart, PROBE_FIELD)
        .await?
        .ok_or_else(|| AppError::BadRequest(UploadError::MissingFile.to_string()))?;

    tracing::info!(
        file_name = upload.file_name.as_deref().unwrap_or("unknown"),
        content_type = upload.content_type.as_deref().unwrap_or("unknown"),
        size = upload.bytes.len(),
        "Received file"
    );

    if !is_image_content_type(upload.content_type.as_deref()) {
        return Err(AppError::BadRequest("File must be an image".to_string()));
    }
    if upload.bytes.is_empty() {
        return Err(AppError::BadRequest(UploadError::Empty.to_string()));
    }
    let image = decode_rgb(&upload.bytes).map_err(|e| AppError::BadRequest(e.to_string()))?;

    let pipeline = Arc::clone(&state.pipeline);
    let embedding = tokio::task::spawn_blocking(move || pipeline.embed_face(&image))
        .await
        .map_err(|e| AppError::InternalError(format!("Embedding task failed: {e}")))??;

    let store = state.store.read().await;
    let matches = match embedding {
        None => {
            tracing::warn!("No face detected in uploaded image, returning fallback images");
            fallback_matches(store.ids(), TOP_K, &mut rand::rng())
        }
        Some(embedding) => {
            if let Some(dimension) = store.dimension() {
                validate_dimension(&embedding, dimension)
                    .map_err(|e| AppError::InternalError(e.to_string()))?;
            }
            rank_by_cosine(&embedding, store.iter(), TOP_K)
        }
    };

    let formatted = format_matches(&matches);
    tracing::info!(count = formatted.len(), "Returning similar images");
    Ok(Json(formatted))
}

/// GET /preprocess/
///
/// Re-embed the whole dataset directory and replace the stored embeddings.
pub async fn preprocess(State(state): State<SimilarityState>) -> AppResult<Json<PreprocessResponse>> {
    let count = rebuild_store(&state).await.map_err(|e| {
        tracing::error!(error = %e, "Error during preprocessing");
        AppError::ServiceFailure("Preprocessing failed".to_string())
    })?;

    Ok(Json(PreprocessResponse {
        message: format!("Preprocessed {count} images"),
    }))
}
