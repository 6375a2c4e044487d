use std::path::PathBuf;

use sketchface_core::error::CoreError;

#[derive(Debug, thiserror::Error)]
pub enum InferenceError {
    /// The model file does not exist on disk.
    #[error("Model file not found: {}", .0.display())]
    ModelNotFound(PathBuf),

    /// ONNX Runtime could not build a session for the model.
    #[error("Model initialization failed: {0}")]
    ModelInit(String),

    /// A forward pass failed or its output could not be extracted.
    #[error("Inference failed: {0}")]
    Inference(String),

    /// A tensor did not have the shape the caller expects.
    #[error("Unexpected tensor shape: {0}")]
    Shape(String),

    #[error(transparent)]
    Core(#[from] CoreError),
}
