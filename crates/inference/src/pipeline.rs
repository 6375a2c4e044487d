//! Detect → crop → embed → normalize.

use std::sync::Arc;

use image::RgbImage;
use sketchface_core::dataset::DatasetImage;
use sketchface_core::embedding::l2_normalize;
use sketchface_core::imaging::open_rgb;

use crate::detector::{crop_face, select_largest, FaceDetector};
use crate::embedder::FaceEmbedder;
use crate::error::InferenceError;

/// Produces one unit-length embedding per image from its largest face.
#[derive(Clone)]
pub struct FacePipeline {
    detector: Arc<dyn FaceDetector>,
    embedder: Arc<dyn FaceEmbedder>,
    margin: u32,
    require_face: bool,
}

impl FacePipeline {
    pub fn new(detector: Arc<dyn FaceDetector>, embedder: Arc<dyn FaceEmbedder>) -> Self {
        Self {
            detector,
            embedder,
            margin: 0,
            require_face: true,
        }
    }

    /// Pixels added around each detected face before cropping.
    pub fn with_margin(mut self, margin: u32) -> Self {
        self.margin = margin;
        self
    }

    /// When `false`, an image with no detected face is embedded whole
    /// instead of yielding `None`.
    pub fn with_require_face(mut self, require_face: bool) -> Self {
        self.require_face = require_face;
        self
    }

    pub fn dimension(&self) -> usize {
        self.embedder.dimension()
    }

    /// Embed the largest face in `image`.
    ///
    /// Returns `Ok(None)` when no face is found and a face is required.
    pub fn embed_face(&self, image: &RgbImage) -> Result<Option<Vec<f32>>, InferenceError> {
        let faces = self.detector.detect(image)?;
        let crop = select_largest(&faces).and_then(|face| crop_face(image, face, self.margin));

        let mut embedding = match crop {
            Some(face) => self.embedder.embed(&face)?,
            None if self.require_face => return Ok(None),
            None => {
                tracing::debug!("No face detected, embedding the full frame");
                self.embedder.embed(image)?
            }
        };

        l2_normalize(&mut embedding);
        Ok(Some(embedding))
    }
}

/// Outcome of embedding every image of a dataset.
#[derive(Debug, Default)]
pub struct DatasetEmbeddings {
    /// `(id, embedding)` in dataset order.
    pub embedded: Vec<(String, Vec<f32>)>,
    /// Ids of images where no face was detected.
    pub no_face: Vec<String>,
    /// Ids of images that could not be read or embedded, with the reason.
    pub failed: Vec<(String, String)>,
}

/// Embed each dataset image. Per-image failures are logged and recorded,
/// never fatal.
pub fn embed_dataset(pipeline: &FacePipeline, images: &[DatasetImage]) -> DatasetEmbeddings {
    let mut report = DatasetEmbeddings::default();

    for image in images {
        let result = open_rgb(&image.path)
            .map_err(InferenceError::from)
            .and_then(|rgb| pipeline.embed_face(&rgb));

        match result {
            Ok(Some(embedding)) => {
                tracing::info!(id = %image.id, "Processed image");
                report.embedded.push((image.id.clone(), embedding));
            }
            Ok(None) => {
                tracing::warn!(id = %image.id, "No face detected");
                report.no_face.push(image.id.clone());
            }
            Err(e) => {
                tracing::error!(id = %image.id, error = %e, "Error processing image");
                report.failed.push((image.id.clone(), e.to_string()));
            }
        }
    }

    report
}
