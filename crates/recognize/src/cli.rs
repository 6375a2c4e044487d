//! Command-line arguments shared by `face-recognize` and `face-index`.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sketchface_inference::{
    DetectorSettings, EmbedderSettings, FacePipeline, InferenceError, OnnxFaceDetector,
    OnnxFaceEmbedder,
};

/// Embedding network the index was built with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Preset {
    Facenet,
    Arcface,
}

impl Preset {
    pub fn settings(self) -> EmbedderSettings {
        match self {
            Preset::Facenet => EmbedderSettings::facenet(),
            Preset::Arcface => EmbedderSettings::arcface(),
        }
    }
}

/// Face detection and embedding models.
#[derive(Debug, Clone, Args)]
pub struct ModelArgs {
    /// Face detector ONNX model
    #[arg(long, env = "FACE_DETECTOR_MODEL_PATH", default_value = "models/face_detector.onnx")]
    pub detector: PathBuf,

    /// Face embedding ONNX model
    #[arg(long, env = "FACE_EMBEDDER_MODEL_PATH", default_value = "models/arcface.onnx")]
    pub embedder: PathBuf,

    /// Preprocessing preset matching the embedding model
    #[arg(long, value_enum, env = "FACE_EMBEDDER_PRESET", default_value = "arcface")]
    pub preset: Preset,

    /// Minimum detector confidence for a face
    #[arg(long, env = "FACE_MIN_CONFIDENCE", default_value_t = 0.7)]
    pub min_confidence: f32,

    /// Pixels of context kept around the detected face
    #[arg(long, env = "FACE_MARGIN", default_value_t = 0)]
    pub margin: u32,

    /// Embed the whole image when no face is detected instead of giving up
    #[arg(long, default_value_t = false)]
    pub allow_undetected: bool,
}

impl ModelArgs {
    /// Load both models into a ready pipeline.
    pub fn load_pipeline(&self) -> Result<FacePipeline, InferenceError> {
        let detector = OnnxFaceDetector::load(
            &self.detector,
            DetectorSettings {
                min_confidence: self.min_confidence,
                ..DetectorSettings::default()
            },
        )?;
        let embedder = OnnxFaceEmbedder::load(&self.embedder, self.preset.settings())?;

        Ok(FacePipeline::new(Arc::new(detector), Arc::new(embedder))
            .with_margin(self.margin)
            .with_require_face(!self.allow_undetected))
    }
}

/// Location of the index and its ids file.
#[derive(Debug, Clone, Args)]
pub struct IndexArgs {
    /// Binary vector index
    #[arg(long, env = "FACE_INDEX_PATH", default_value = "face_index.bin")]
    pub index: PathBuf,

    /// JSON file naming the index rows
    #[arg(long, env = "FACE_IDS_PATH", default_value = "face_ids.json")]
    pub ids: PathBuf,
}

/// Install a tracing subscriber that logs to stderr, keeping stdout for
/// the JSON result.
pub fn init_tracing(default_filter: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Debug, Parser)]
    struct TestCli {
        #[command(flatten)]
        models: ModelArgs,
        #[command(flatten)]
        index: IndexArgs,
    }

    #[test]
    fn flags_override_defaults() {
        let cli = TestCli::try_parse_from([
            "test",
            "--detector",
            "d.onnx",
            "--embedder",
            "e.onnx",
            "--preset",
            "facenet",
            "--min-confidence",
            "0.5",
            "--margin",
            "12",
            "--allow-undetected",
            "--index",
            "i.bin",
            "--ids",
            "i.json",
        ])
        .unwrap();

        assert_eq!(cli.models.detector, PathBuf::from("d.onnx"));
        assert_eq!(cli.models.embedder, PathBuf::from("e.onnx"));
        assert_eq!(cli.models.preset, Preset::Facenet);
        assert_eq!(cli.models.min_confidence, 0.5);
        assert_eq!(cli.models.margin, 12);
        assert!(cli.models.allow_undetected);
        assert_eq!(cli.index.index, PathBuf::from("i.bin"));
        assert_eq!(cli.index.ids, PathBuf::from("i.json"));
    }

    #[test]
    fn unknown_preset_is_rejected() {
        assert!(TestCli::try_parse_from(["test", "--preset", "vgg"]).is_err());
    }

    #[test]
    fn presets_map_to_settings() {
        assert_eq!(Preset::Facenet.settings().input_size, 160);
        assert_eq!(Preset::Arcface.settings().input_size, 112);
    }
}
