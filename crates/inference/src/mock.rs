//! Deterministic model stand-ins for tests and offline runs.

use image::imageops::{self, FilterType};
use image::{GrayImage, Rgb, RgbImage};

use crate::detector::{FaceBox, FaceDetector};
use crate::embedder::FaceEmbedder;
use crate::error::InferenceError;
use crate::generator::PhotoGenerator;
use crate::tensor::SKETCH_SIZE;

/// Reports the whole frame as one face unless every pixel is black.
#[derive(Debug, Default, Clone, Copy)]
pub struct MockFaceDetector;

impl FaceDetector for MockFaceDetector {
    fn detect(&self, image: &RgbImage) -> Result<Vec<FaceBox>, InferenceError> {
        if image.pixels().all(|p| p.0 == [0, 0, 0]) {
            return Ok(Vec::new());
        }
        let (width, height) = image.dimensions();
        Ok(vec![FaceBox {
            x1: 0.0,
            y1: 0.0,
            x2: width as f32,
            y2: height as f32,
            score: 0.99,
        }])
    }
}

/// Embeds a face as its mean colour plus a constant bias component.
///
/// Faces of similar colour therefore get high cosine similarity.
#[derive(Debug, Default, Clone, Copy)]
pub struct MockFaceEmbedder;

impl MockFaceEmbedder {
    pub const DIMENSION: usize = 4;

    pub fn new() -> Self {
        Self
    }
}

impl FaceEmbedder for MockFaceEmbedder {
    fn embed(&self, face: &RgbImage) -> Result<Vec<f32>, InferenceError> {
        let count = (face.width() * face.height()).max(1) as f32;
        let mut sums = [0.0f32; 3];
        for pixel in face.pixels() {
            for (sum, value) in sums.iter_mut().zip(pixel.0) {
                *sum += value as f32;
            }
        }
        Ok(vec![
            sums[0] / count / 255.0,
            sums[1] / count / 255.0,
            sums[2] / count / 255.0,
            0.1,
        ])
    }

    fn dimension(&self) -> usize {
        Self::DIMENSION
    }
}

/// Returns the resized sketch copied into all three channels.
#[derive(Debug, Default, Clone, Copy)]
pub struct MockPhotoGenerator;

impl PhotoGenerator for MockPhotoGenerator {
    fn generate(&self, sketch: &GrayImage) -> Result<RgbImage, InferenceError> {
        let resized = imageops::resize(sketch, SKETCH_SIZE, SKETCH_SIZE, FilterType::Triangle);
        Ok(RgbImage::from_fn(SKETCH_SIZE, SKETCH_SIZE, |x, y| {
            let v = resized.get_pixel(x, y)[0];
            Rgb([v, v, v])
        }))
    }
}

/// Always fails, for exercising error paths.
#[derive(Debug, Default, Clone, Copy)]
pub struct FailingPhotoGenerator;

impl PhotoGenerator for FailingPhotoGenerator {
    fn generate(&self, _sketch: &GrayImage) -> Result<RgbImage, InferenceError> {
        Err(InferenceError::Inference("generator unavailable".into()))
    }
}
