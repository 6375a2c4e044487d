#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use image::{Rgb, RgbImage};
use tokio::sync::{Mutex, RwLock};
use tower::ServiceExt;

use sketchface_api::config::{ServerConfig, SimilarityConfig};
use sketchface_api::router::{build_similarity_app, build_sketch_app};
use sketchface_api::state::{SimilarityState, SketchState};
use sketchface_core::embedding::l2_normalize;
use sketchface_core::imaging::encode_png;
use sketchface_core::store::EmbeddingStore;
use sketchface_inference::mock::{MockFaceDetector, MockFaceEmbedder};
use sketchface_inference::{
    DetectorSettings, EmbedderSettings, FaceEmbedder, FacePipeline, PhotoGenerator,
};

pub const BOUNDARY: &str = "sketchface-test-boundary";

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:3000".to_string()],
        request_timeout_secs: 30,
        max_upload_bytes: 10 * 1024 * 1024,
    }
}

/// Build the sketch app around the given generator.
pub fn build_sketch_test_app(generator: impl PhotoGenerator + 'static) -> Router {
    let config = test_config();
    let state = SketchState {
        config: Arc::new(config.clone()),
        generator: Arc::new(generator),
    };
    build_sketch_app(state, &config)
}

/// Similarity settings rooted at `dir`: the dataset lives in `dir/faces` and
/// embeddings are saved to `dir/embeddings.json`.
pub fn test_similarity_config(dir: &Path) -> SimilarityConfig {
    SimilarityConfig {
        detector_model_path: dir.join("detector.onnx"),
        embedder_model_path: dir.join("embedder.onnx"),
        embedder: EmbedderSettings::facenet(),
        detector: DetectorSettings::default(),
        face_margin: 0,
        embeddings_path: dir.join("embeddings.json"),
        dataset_path: dir.join("faces"),
    }
}

/// Similarity state with the mock pipeline and the given store.
pub fn similarity_test_state(dir: &Path, store: EmbeddingStore) -> SimilarityState {
    let pipeline = FacePipeline::new(Arc::new(MockFaceDetector), Arc::new(MockFaceEmbedder));
    SimilarityState {
        config: Arc::new(test_config()),
        settings: Arc::new(test_similarity_config(dir)),
        pipeline: Arc::new(pipeline),
        store: Arc::new(RwLock::new(store)),
        rebuild_lock: Arc::new(Mutex::new(())),
    }
}

/// Build the similarity app with the mock pipeline and a preloaded store.
pub fn build_similarity_test_app(dir: &Path, store: EmbeddingStore) -> Router {
    build_similarity_app(similarity_test_state(dir, store), &test_config())
}

/// Write solid-colour PNG faces into `dir/faces`.
pub fn write_dataset(dir: &Path, faces: &[(&str, [u8; 3])]) {
    let faces_dir = dir.join("faces");
    std::fs::create_dir_all(&faces_dir).unwrap();
    for (id, colour) in faces {
        std::fs::write(faces_dir.join(format!("{id}.png")), png_bytes(*colour)).unwrap();
    }
}

/// A store holding one solid-colour face per entry, embedded the way the
/// mock pipeline embeds uploads.
pub fn colour_store(entries: &[(&str, [u8; 3])]) -> EmbeddingStore {
    let mut store = EmbeddingStore::new();
    for (id, colour) in entries {
        let face = RgbImage::from_pixel(8, 8, Rgb(*colour));
        let mut embedding = MockFaceEmbedder.embed(&face).unwrap();
        l2_normalize(&mut embedding);
        store.insert(*id, embedding).unwrap();
    }
    store
}

/// PNG bytes of a solid-colour image.
pub fn png_bytes(colour: [u8; 3]) -> Vec<u8> {
    encode_png(&RgbImage::from_pixel(32, 32, Rgb(colour))).unwrap()
}

/// A multipart body with a single file part.
pub fn multipart_body(field: &str, file_name: &str, content_type: &str, bytes: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

/// POST a multipart body to `uri`.
pub async fn post_multipart(app: Router, uri: &str, body: Vec<u8>) -> Response<Body> {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

/// POST a single file part to `uri`.
pub async fn post_file(
    app: Router,
    uri: &str,
    field: &str,
    content_type: &str,
    bytes: &[u8],
) -> Response<Body> {
    post_multipart(app, uri, multipart_body(field, "upload.png", content_type, bytes)).await
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    app.oneshot(request).await.unwrap()
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
