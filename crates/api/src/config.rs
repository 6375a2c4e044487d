use std::path::PathBuf;
use std::str::FromStr;

use sketchface_inference::{DetectorSettings, EmbedderSettings};

/// Default port of the sketch-to-photo server.
pub const DEFAULT_SKETCH_PORT: u16 = 5003;
/// Default port of the face-similarity server.
pub const DEFAULT_SIMILARITY_PORT: u16 = 5004;

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default depends on the service).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `60`). Model inference on
    /// CPU can take several seconds.
    pub request_timeout_secs: u64,
    /// Maximum accepted request body size in bytes (default: 10 MiB).
    pub max_upload_bytes: usize,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                    |
    /// |------------------------|----------------------------|
    /// | `HOST`                 | `0.0.0.0`                  |
    /// | `PORT`                 | `default_port`             |
    /// | `CORS_ORIGINS`         | `http://localhost:3000`    |
    /// | `REQUEST_TIMEOUT_SECS` | `60`                       |
    /// | `MAX_UPLOAD_BYTES`     | `10485760`                 |
    pub fn from_env(default_port: u16) -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port = parse_env("PORT", default_port);

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:3000".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs = parse_env("REQUEST_TIMEOUT_SECS", 60);
        let max_upload_bytes = parse_env("MAX_UPLOAD_BYTES", 10 * 1024 * 1024);

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            max_upload_bytes,
        }
    }
}

/// Sketch-to-photo model configuration.
#[derive(Debug, Clone)]
pub struct SketchConfig {
    /// `SKETCH_MODEL_PATH` (default: `models/G_sketch_to_photo.onnx`).
    pub model_path: PathBuf,
}

impl SketchConfig {
    pub fn from_env() -> Self {
        Self {
            model_path: path_env("SKETCH_MODEL_PATH", "models/G_sketch_to_photo.onnx"),
        }
    }
}

/// Face-similarity service configuration.
#[derive(Debug, Clone)]
pub struct SimilarityConfig {
    pub detector_model_path: PathBuf,
    pub embedder_model_path: PathBuf,
    pub embedder: EmbedderSettings,
    pub detector: DetectorSettings,
    /// Pixels of context kept around each detected face.
    pub face_margin: u32,
    /// JSON file the embedding store is persisted to.
    pub embeddings_path: PathBuf,
    /// Directory of gallery images re-embedded by `/preprocess/`.
    pub dataset_path: PathBuf,
}

impl SimilarityConfig {
    /// | Env Var                    | Default                          |
    /// |----------------------------|----------------------------------|
    /// | `FACE_DETECTOR_MODEL_PATH` | `models/face_detector.onnx`      |
    /// | `FACE_EMBEDDER_MODEL_PATH` | `models/facenet_vggface2.onnx`   |
    /// | `FACE_EMBEDDER_PRESET`     | `facenet`                        |
    /// | `FACE_MIN_CONFIDENCE`      | `0.7`                            |
    /// | `FACE_MARGIN`              | `0`                              |
    /// | `EMBEDDINGS_PATH`          | `embeddings.json`                |
    /// | `DATASET_PATH`             | `criminal_faces/`                |
    pub fn from_env() -> Self {
        let preset = std::env::var("FACE_EMBEDDER_PRESET").unwrap_or_else(|_| "facenet".into());
        let embedder = EmbedderSettings::from_preset(&preset)
            .unwrap_or_else(|| panic!("FACE_EMBEDDER_PRESET must be facenet or arcface, got '{preset}'"));

        let detector = DetectorSettings {
            min_confidence: parse_env("FACE_MIN_CONFIDENCE", 0.7),
            ..DetectorSettings::default()
        };

        Self {
            detector_model_path: path_env("FACE_DETECTOR_MODEL_PATH", "models/face_detector.onnx"),
            embedder_model_path: path_env(
                "FACE_EMBEDDER_MODEL_PATH",
                "models/facenet_vggface2.onnx",
            ),
            embedder,
            detector,
            face_margin: parse_env("FACE_MARGIN", 0),
            embeddings_path: path_env("EMBEDDINGS_PATH", "embeddings.json"),
            dataset_path: path_env("DATASET_PATH", "criminal_faces/"),
        }
    }
}

fn path_env(name: &str, default: &str) -> PathBuf {
    std::env::var(name)
        .unwrap_or_else(|_| default.into())
        .into()
}

/// Parse `name` from the environment, falling back to `default` when unset.
///
/// Panics at startup on an unparsable value so misconfiguration fails fast.
fn parse_env<T>(name: &str, default: T) -> T
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .parse()
            .unwrap_or_else(|e| panic!("{name} has an invalid value '{raw}': {e}")),
        Err(_) => default,
    }
}
