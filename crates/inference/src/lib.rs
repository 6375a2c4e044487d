//! Pretrained model wrappers for the sketchface services.
//!
//! Each model sits behind a small trait ([`PhotoGenerator`], [`FaceDetector`],
//! [`FaceEmbedder`]) with an ONNX Runtime implementation. The [`mock`] module
//! provides deterministic stand-ins so the HTTP and CLI layers can be
//! exercised without model files.

pub mod detector;
pub mod embedder;
pub mod error;
pub mod generator;
pub mod mock;
pub mod pipeline;
mod session;
pub mod tensor;

pub use detector::{DetectorSettings, FaceBox, FaceDetector, OnnxFaceDetector};
pub use embedder::{EmbedderSettings, FaceEmbedder, OnnxFaceEmbedder};
pub use error::InferenceError;
pub use generator::{OnnxSketchGenerator, PhotoGenerator};
pub use pipeline::{embed_dataset, DatasetEmbeddings, FacePipeline};
