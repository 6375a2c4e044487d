pub mod health;

use axum::routing::{get, post};
use axum::Router;

use crate::handlers;
use crate::state::{SimilarityState, SketchState};

/// Route tree of the sketch-to-photo service.
///
/// ```text
/// /image/upload        generate a photo from a sketch (POST, multipart)
/// ```
pub fn sketch_routes() -> Router<SketchState> {
    Router::new().route("/image/upload", post(handlers::sketch::upload_image))
}

/// Route tree of the face-similarity service.
///
/// ```text
/// /find_similar/       top-5 gallery matches for a face (POST, multipart)
/// /preprocess/         re-embed the dataset directory (GET)
/// ```
pub fn similarity_routes() -> Router<SimilarityState> {
    Router::new()
        .route("/find_similar/", post(handlers::similarity::find_similar))
        .route("/preprocess/", get(handlers::similarity::preprocess))
}
