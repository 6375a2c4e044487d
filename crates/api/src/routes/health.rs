use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::state::{SimilarityState, SketchState};

/// Health check response of the sketch service.
#[derive(Serialize)]
pub struct SketchHealth {
    pub status: &'static str,
    /// Crate version from Cargo.toml.
    pub version: &'static str,
    /// The generator is loaded and verified before the server binds, so a
    /// running service always reports `true`.
    pub model_loaded: bool,
}

/// Health check response of the similarity service.
#[derive(Serialize)]
pub struct SimilarityHealth {
    /// `ok`, or `degraded` while the gallery is empty.
    pub status: &'static str,
    pub version: &'static str,
    pub stored_embeddings: usize,
}

/// GET /health
async fn sketch_health() -> Json<SketchHealth> {
    Json(SketchHealth {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        model_loaded: true,
    })
}

/// GET /health
async fn similarity_health(State(state): State<SimilarityState>) -> Json<SimilarityHealth> {
    let stored_embeddings = state.store.read().await.len();
    let status = if stored_embeddings > 0 { "ok" } else { "degraded" };

    Json(SimilarityHealth {
        status,
        version: env!("CARGO_PKG_VERSION"),
        stored_embeddings,
    })
}

pub fn sketch_router() -> Router<SketchState> {
    Router::new().route("/health", get(sketch_health))
}

pub fn similarity_router() -> Router<SimilarityState> {
    Router::new().route("/health", get(similarity_health))
}
