//! `sketch-server` -- sketch-to-photo generation over HTTP.
//!
//! # Environment variables
//!
//! | Variable            | Default                          |
//! |---------------------|----------------------------------|
//! | `SKETCH_MODEL_PATH` | `models/G_sketch_to_photo.onnx`  |
//! | `PORT`              | `5003`                           |
//!
//! plus the shared server variables documented on `ServerConfig`.

use std::sync::Arc;

use sketchface_api::config::{ServerConfig, SketchConfig, DEFAULT_SKETCH_PORT};
use sketchface_api::router::build_sketch_app;
use sketchface_api::server;
use sketchface_api::state::SketchState;
use sketchface_inference::OnnxSketchGenerator;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    server::init_tracing("sketch_server=debug,sketchface_api=debug,sketchface_inference=info,tower_http=debug");

    // --- Configuration ---
    let config = ServerConfig::from_env(DEFAULT_SKETCH_PORT);
    let sketch_config = SketchConfig::from_env();
    tracing::info!(
        host = %config.host,
        port = %config.port,
        model = %sketch_config.model_path.display(),
        "Loaded server configuration"
    );

    // --- Model ---
    let generator = OnnxSketchGenerator::load(&sketch_config.model_path).unwrap_or_else(|e| {
        tracing::error!(error = %e, "Error loading model weights");
        std::process::exit(1);
    });

    // --- App ---
    let state = SketchState {
        config: Arc::new(config.clone()),
        generator: Arc::new(generator),
    };
    let app = build_sketch_app(state, &config);

    server::serve(app, &config).await.expect("Server error");
}
