use std::path::PathBuf;

use sketchface_core::error::CoreError;
use sketchface_inference::InferenceError;

#[derive(Debug, thiserror::Error)]
pub enum RecognizeError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Inference(#[from] InferenceError),

    /// The query image path does not name a file.
    #[error("Image file {} does not exist", .0.display())]
    ImageNotFound(PathBuf),

    /// Not a single gallery image produced an embedding.
    #[error("No face embeddings could be produced from {}", .0.display())]
    NoEmbeddings(PathBuf),

    #[error("Index dimension ({index}) does not match embedding model dimension ({model})")]
    DimensionMismatch { index: usize, model: usize },
}
