//! Sketch-to-photo generator.
//!
//! The pretrained network is an encoder/decoder with skip connections and a
//! self-attention block at the bottleneck, exported to ONNX. It maps a
//! `[1, 1, 256, 256]` normalized sketch to a `[1, 3, 256, 256]` photo in
//! `[-1, 1]`.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use image::{GrayImage, RgbImage};
use ndarray::Array4;
use ort::session::Session;
use rand::Rng;

use crate::error::InferenceError;
use crate::session;
use crate::tensor::{self, PHOTO_CHANNELS, SKETCH_SIZE};

/// Turns a grayscale sketch into an RGB photo.
pub trait PhotoGenerator: Send + Sync {
    fn generate(&self, sketch: &GrayImage) -> Result<RgbImage, InferenceError>;
}

/// Output shape every generator forward pass must produce.
pub fn expected_output_shape() -> [usize; 4] {
    let side = SKETCH_SIZE as usize;
    [1, PHOTO_CHANNELS, side, side]
}

/// Check a generator output shape against [`expected_output_shape`].
pub fn validate_output_shape(shape: &[usize]) -> Result<(), InferenceError> {
    let expected = expected_output_shape();
    if shape != expected.as_slice() {
        return Err(InferenceError::Shape(format!(
            "generator produced {shape:?}, expected {expected:?}"
        )));
    }
    Ok(())
}

pub struct OnnxSketchGenerator {
    session: Mutex<Session>,
    model_path: PathBuf,
}

impl std::fmt::Debug for OnnxSketchGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnnxSketchGenerator")
            .field("model_path", &self.model_path)
            .finish_non_exhaustive()
    }
}

impl OnnxSketchGenerator {
    /// Load the generator and verify it with one forward pass on random input.
    pub fn load(model_path: &Path) -> Result<Self, InferenceError> {
        let generator = Self {
            session: session::load(model_path)?,
            model_path: model_path.to_path_buf(),
        };

        tracing::info!(path = %model_path.display(), "Testing generator with dummy input");
        generator.verify()?;
        tracing::info!(path = %model_path.display(), "Generator loaded and verified");

        Ok(generator)
    }

    pub fn model_path(&self) -> &Path {
        &self.model_path
    }

    fn verify(&self) -> Result<(), InferenceError> {
        let side = SKETCH_SIZE as usize;
        let mut rng = rand::rng();
        let dummy = Array4::from_shape_fn((1, 1, side, side), |_| rng.random_range(-1.0..=1.0));

        let output = self.forward(&dummy)?;
        tracing::info!(shape = ?output.shape, "Dummy inference output shape");
        validate_output_shape(&output.shape)
    }

    fn forward(&self, input: &Array4<f32>) -> Result<session::OutputTensor, InferenceError> {
        session::run(&self.session, input, 1)?
            .pop()
            .ok_or_else(|| InferenceError::Inference("Generator produced no output".into()))
    }
}

impl PhotoGenerator for OnnxSketchGenerator {
    fn generate(&self, sketch: &GrayImage) -> Result<RgbImage, InferenceError> {
        let input = tensor::sketch_to_tensor(sketch);
        let output = self.forward(&input)?;
        validate_output_shape(&output.shape)?;
        tensor::tensor_to_rgb(tensor::view4(&output.shape, &output.data)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn accepts_expected_shape() {
        assert!(validate_output_shape(&[1, 3, 256, 256]).is_ok());
    }

    #[test]
    fn rejects_other_shapes() {
        assert_matches!(
            validate_output_shape(&[1, 1, 256, 256]),
            Err(InferenceError::Shape(_))
        );
        assert_matches!(
            validate_output_shape(&[1, 3, 128, 128]),
            Err(InferenceError::Shape(_))
        );
    }

    #[test]
    fn missing_model_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("G_sketch_to_photo.onnx");
        assert_matches!(
            OnnxSketchGenerator::load(&path),
            Err(InferenceError::ModelNotFound(p)) if p == path
        );
    }
}
