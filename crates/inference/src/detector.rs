//! Face detection.
//!
//! [`OnnxFaceDetector`] runs an UltraFace-style single-shot detector:
//!
//! - input: `[1, 3, 240, 320]`, each channel `(value - 127) / 128`
//! - output 0 `scores`: `[1, N, 2]` (background, face)
//! - output 1 `boxes`:  `[1, N, 4]` relative `(x1, y1, x2, y2)`
//!
//! Candidates under the confidence threshold are dropped, then greedy
//! non-maximum suppression removes overlapping boxes.

use std::path::Path;
use std::sync::Mutex;

use image::imageops::{self, FilterType};
use image::RgbImage;
use ndarray::Array4;
use ort::session::Session;

use crate::error::InferenceError;
use crate::session;

/// A detected face in pixel coordinates of the source image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaceBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
    pub score: f32,
}

impl FaceBox {
    pub fn width(&self) -> f32 {
        (self.x2 - self.x1).max(0.0)
    }

    pub fn height(&self) -> f32 {
        (self.y2 - self.y1).max(0.0)
    }

    pub fn area(&self) -> f32 {
        self.width() * self.height()
    }

    /// Intersection over union with `other`, in `[0, 1]`.
    pub fn iou(&self, other: &FaceBox) -> f32 {
        let ix = (self.x2.min(other.x2) - self.x1.max(other.x1)).max(0.0);
        let iy = (self.y2.min(other.y2) - self.y1.max(other.y1)).max(0.0);
        let intersection = ix * iy;
        let union = self.area() + other.area() - intersection;
        if union <= 0.0 {
            0.0
        } else {
            intersection / union
        }
    }
}

/// Finds faces in an RGB image.
pub trait FaceDetector: Send + Sync {
    fn detect(&self, image: &RgbImage) -> Result<Vec<FaceBox>, InferenceError>;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectorSettings {
    pub input_width: u32,
    pub input_height: u32,
    pub min_confidence: f32,
    pub iou_threshold: f32,
}

impl Default for DetectorSettings {
    fn default() -> Self {
        Self {
            input_width: 320,
            input_height: 240,
            min_confidence: 0.7,
            iou_threshold: 0.3,
        }
    }
}

pub struct OnnxFaceDetector {
    session: Mutex<Session>,
    settings: DetectorSettings,
}

impl std::fmt::Debug for OnnxFaceDetector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnnxFaceDetector")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl OnnxFaceDetector {
    pub fn load(model_path: &Path, settings: DetectorSettings) -> Result<Self, InferenceError> {
        let session = session::load(model_path)?;
        tracing::info!(
            path = %model_path.display(),
            min_confidence = settings.min_confidence,
            "Face detector loaded"
        );
        Ok(Self { session, settings })
    }

    fn to_input(&self, image: &RgbImage) -> Array4<f32> {
        let (w, h) = (self.settings.input_width, self.settings.input_height);
        let resized = imageops::resize(image, w, h, FilterType::Triangle);

        Array4::from_shape_fn((1, 3, h as usize, w as usize), |(_, c, y, x)| {
            (resized.get_pixel(x as u32, y as u32)[c] as f32 - 127.0) / 128.0
        })
    }
}

impl FaceDetector for OnnxFaceDetector {
    fn detect(&self, image: &RgbImage) -> Result<Vec<FaceBox>, InferenceError> {
        let outputs = session::run(&self.session, &self.to_input(image), 2)?;
        let (scores, boxes) = (&outputs[0], &outputs[1]);

        if scores.data.len() % 2 != 0
            || boxes.data.len() % 4 != 0
            || scores.data.len() / 2 != boxes.data.len() / 4
        {
            return Err(InferenceError::Shape(format!(
                "detector scores {:?} and boxes {:?} disagree",
                scores.shape, boxes.shape
            )));
        }

        let (width, height) = image.dimensions();
        let candidates = decode_detections(
            &scores.data,
            &boxes.data,
            self.settings.min_confidence,
            width as f32,
            height as f32,
        );
        Ok(non_max_suppression(candidates, self.settings.iou_threshold))
    }
}

/// Turn raw detector outputs into pixel-space boxes above `min_confidence`.
pub fn decode_detections(
    scores: &[f32],
    boxes: &[f32],
    min_confidence: f32,
    width: f32,
    height: f32,
) -> Vec<FaceBox> {
    scores
        .chunks_exact(2)
        .zip(boxes.chunks_exact(4))
        .filter(|(score, _)| score[1] >= min_confidence)
        .map(|(score, b)| FaceBox {
            x1: (b[0] * width).clamp(0.0, width),
            y1: (b[1] * height).clamp(0.0, height),
            x2: (b[2] * width).clamp(0.0, width),
            y2: (b[3] * height).clamp(0.0, height),
            score: score[1],
        })
        .filter(|face| face.area() > 0.0)
        .collect()
}

/// Greedy NMS: keep the best-scoring box, drop boxes overlapping it by more
/// than `iou_threshold`, repeat.
pub fn non_max_suppression(mut boxes: Vec<FaceBox>, iou_threshold: f32) -> Vec<FaceBox> {
    boxes.sort_by(|a, b| b.score.total_cmp(&a.score));

    let mut kept: Vec<FaceBox> = Vec::new();
    for candidate in boxes {
        if kept.iter().all(|k| k.iou(&candidate) <= iou_threshold) {
            kept.push(candidate);
        }
    }
    kept
}

/// The face with the largest area, if any.
pub fn select_largest(faces: &[FaceBox]) -> Option<&FaceBox> {
    faces.iter().max_by(|a, b| a.area().total_cmp(&b.area()))
}

/// Crop `face` out of `image`, grown by `margin` pixels on every side and
/// clamped to the image bounds. Returns `None` for an empty region.
pub fn crop_face(image: &RgbImage, face: &FaceBox, margin: u32) -> Option<RgbImage> {
    let (width, height) = image.dimensions();
    let margin = margin as f32;

    let x1 = (face.x1 - margin).max(0.0).floor() as u32;
    let y1 = (face.y1 - margin).max(0.0).floor() as u32;
    let x2 = ((face.x2 + margin).ceil() as u32).min(width);
    let y2 = ((face.y2 + margin).ceil() as u32).min(height);

    if x2 <= x1 || y2 <= y1 {
        return None;
    }
    Some(imageops::crop_imm(image, x1, y1, x2 - x1, y2 - y1).to_image())
}
