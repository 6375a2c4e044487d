//! `similarity-server` -- face-similarity search over HTTP.
//!
//! # Environment variables
//!
//! | Variable                   | Default                        |
//! |----------------------------|--------------------------------|
//! | `FACE_DETECTOR_MODEL_PATH` | `models/face_detector.onnx`    |
//! | `FACE_EMBEDDER_MODEL_PATH` | `models/facenet_vggface2.onnx` |
//! | `EMBEDDINGS_PATH`          | `embeddings.json`              |
//! | `DATASET_PATH`             | `criminal_faces/`              |
//! | `PORT`                     | `5004`                         |
//!
//! plus the shared server variables documented on `ServerConfig`.

use std::sync::Arc;

use sketchface_api::config::{ServerConfig, SimilarityConfig, DEFAULT_SIMILARITY_PORT};
use sketchface_api::preprocess::{ensure_store, load_store};
use sketchface_api::router::build_similarity_app;
use sketchface_api::server;
use sketchface_api::state::SimilarityState;
use sketchface_inference::{FacePipeline, OnnxFaceDetector, OnnxFaceEmbedder};
use tokio::sync::{Mutex, RwLock};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    server::init_tracing("similarity_server=debug,sketchface_api=debug,sketchface_inference=info,tower_http=debug");

    // --- Configuration ---
    let config = ServerConfig::from_env(DEFAULT_SIMILARITY_PORT);
    let settings = SimilarityConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Models ---
    let detector = OnnxFaceDetector::load(&settings.detector_model_path, settings.detector)
        .unwrap_or_else(|e| {
            tracing::error!(error = %e, "Failed to load face detector");
            std::process::exit(1);
        });
    let embedder = OnnxFaceEmbedder::load(&settings.embedder_model_path, settings.embedder)
        .unwrap_or_else(|e| {
            tracing::error!(error = %e, "Failed to load face embedder");
            std::process::exit(1);
        });
    let pipeline = FacePipeline::new(Arc::new(detector), Arc::new(embedder))
        .with_margin(settings.face_margin);

    // --- Embedding store ---
    let store = load_store(&settings.embeddings_path);

    let state = SimilarityState {
        config: Arc::new(config.clone()),
        settings: Arc::new(settings),
        pipeline: Arc::new(pipeline),
        store: Arc::new(RwLock::new(store)),
        rebuild_lock: Arc::new(Mutex::new(())),
    };
    ensure_store(&state).await;

    // --- App ---
    let app = build_similarity_app(state, &config);

    server::serve(app, &config).await.expect("Server error");
}
