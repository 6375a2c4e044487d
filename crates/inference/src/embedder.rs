//! Face embedding models.

use std::path::Path;
use std::sync::Mutex;

use image::RgbImage;
use ort::session::Session;

use crate::error::InferenceError;
use crate::session;
use crate::tensor;

/// Maps an aligned face crop to a fixed-length embedding.
pub trait FaceEmbedder: Send + Sync {
    fn embed(&self, face: &RgbImage) -> Result<Vec<f32>, InferenceError>;

    fn dimension(&self) -> usize;
}

/// Input geometry and normalization of an embedding network.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EmbedderSettings {
    pub input_size: u32,
    pub mean: f32,
    pub std: f32,
    pub dimension: usize,
}

impl EmbedderSettings {
    /// InceptionResnetV1 trained on VGGFace2: 160x160 input, 512-d output.
    pub const fn facenet() -> Self {
        Self {
            input_size: 160,
            mean: 127.5,
            std: 128.0,
            dimension: 512,
        }
    }

    /// ArcFace (ResNet backbone): 112x112 input, 512-d output.
    pub const fn arcface() -> Self {
        Self {
            input_size: 112,
            mean: 127.5,
            std: 128.0,
            dimension: 512,
        }
    }

    /// Look up a preset by name (`facenet` or `arcface`, case-insensitive).
    pub fn from_preset(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "facenet" => Some(Self::facenet()),
            "arcface" => Some(Self::arcface()),
            _ => None,
        }
    }
}

pub struct OnnxFaceEmbedder {
    session: Mutex<Session>,
    settings: EmbedderSettings,
}

impl std::fmt::Debug for OnnxFaceEmbedder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnnxFaceEmbedder")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl OnnxFaceEmbedder {
    pub fn load(model_path: &Path, settings: EmbedderSettings) -> Result<Self, InferenceError> {
        let session = session::load(model_path)?;
        tracing::info!(
            path = %model_path.display(),
            input_size = settings.input_size,
            dimension = settings.dimension,
            "Face embedder loaded"
        );
        Ok(Self { session, settings })
    }
}

impl FaceEmbedder for OnnxFaceEmbedder {
    fn embed(&self, face: &RgbImage) -> Result<Vec<f32>, InferenceError> {
        let s = &self.settings;
        let input = tensor::face_to_tensor(face, s.input_size, s.mean, s.std);

        let output = session::run(&self.session, &input, 1)?
            .pop()
            .ok_or_else(|| InferenceError::Inference("Embedder produced no output".into()))?;

        if output.data.len() != s.dimension {
            return Err(InferenceError::Shape(format!(
                "embedder produced {:?}, expected [1, {}]",
                output.shape, s.dimension
            )));
        }
        Ok(output.data)
    }

    fn dimension(&self) -> usize {
        self.settings.dimension
    }
}
