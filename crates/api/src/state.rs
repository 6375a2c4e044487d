use std::sync::Arc;

use sketchface_core::store::EmbeddingStore;
use sketchface_inference::{FacePipeline, PhotoGenerator};
use tokio::sync::{Mutex, RwLock};

use crate::config::{ServerConfig, SimilarityConfig};

/// Shared state of the sketch-to-photo service.
///
/// This is cheaply cloneable (inner data is behind `Arc`).
#[derive(Clone)]
pub struct SketchState {
    pub config: Arc<ServerConfig>,
    /// The loaded generator, verified at startup.
    pub generator: Arc<dyn PhotoGenerator>,
}

/// Shared state of the face-similarity service.
#[derive(Clone)]
pub struct SimilarityState {
    pub config: Arc<ServerConfig>,
    pub settings: Arc<SimilarityConfig>,
    /// Face detector + embedder.
    pub pipeline: Arc<FacePipeline>,
    /// Gallery embeddings. Readers rank against it; `/preprocess/` swaps it.
    pub store: Arc<RwLock<EmbeddingStore>>,
    /// Held for the whole of a store rebuild so rebuilds never overlap.
    pub rebuild_lock: Arc<Mutex<()>>,
}
