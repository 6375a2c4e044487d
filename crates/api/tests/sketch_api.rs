//! Integration tests for POST /image/upload.

mod common;

use axum::http::StatusCode;
use base64::Engine;
use common::{body_json, build_sketch_test_app, png_bytes, post_file, post_multipart};
use sketchface_inference::mock::{FailingPhotoGenerator, MockPhotoGenerator};

const UPLOAD: &str = "/image/upload";

// ---------------------------------------------------------------------------
// Test: a valid sketch yields a 256x256 PNG data URL
// ---------------------------------------------------------------------------

#[tokio::test]
async fn upload_returns_png_data_url() {
    let app = build_sketch_test_app(MockPhotoGenerator);
    let response = post_file(app, UPLOAD, "digitalImage", "image/png", &png_bytes([120, 120, 120])).await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let url = json["result"]["generatedImage"].as_str().unwrap();
    let encoded = url
        .strip_prefix("data:image/png;base64,")
        .expect("data URL prefix");

    let png = base64::engine::general_purpose::STANDARD
        .decode(encoded)
        .unwrap();
    let photo = image::load_from_memory(&png).unwrap();
    assert_eq!((photo.width(), photo.height()), (256, 256));
}

// ---------------------------------------------------------------------------
// Test: input problems are rejected with 422
// ---------------------------------------------------------------------------

#[tokio::test]
async fn non_image_upload_returns_422() {
    let app = build_sketch_test_app(MockPhotoGenerator);
    let response = post_file(app, UPLOAD, "digitalImage", "text/plain", b"hello").await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let json = body_json(response).await;
    assert_eq!(json["code"], "UNPROCESSABLE_ENTITY");
    assert_eq!(
        json["error"],
        "Invalid file type: text/plain. Only image files are allowed"
    );
}

#[tokio::test]
async fn empty_upload_returns_422() {
    let app = build_sketch_test_app(MockPhotoGenerator);
    let response = post_file(app, UPLOAD, "digitalImage", "image/png", b"").await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body_json(response).await["error"], "Empty file uploaded");
}

#[tokio::test]
async fn undecodable_upload_returns_422() {
    let app = build_sketch_test_app(MockPhotoGenerator);
    let response = post_file(app, UPLOAD, "digitalImage", "image/png", b"not a png").await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        body_json(response).await["error"],
        "Could not decode image. Ensure it's a valid grayscale image"
    );
}

#[tokio::test]
async fn missing_field_returns_422() {
    let app = build_sketch_test_app(MockPhotoGenerator);
    let body = common::multipart_body("other", "sketch.png", "image/png", &png_bytes([1, 2, 3]));
    let response = post_multipart(app, UPLOAD, body).await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body_json(response).await["error"], "No file provided");
}

// ---------------------------------------------------------------------------
// Test: generator failures surface as 500 with the failure message
// ---------------------------------------------------------------------------

#[tokio::test]
async fn generator_failure_returns_500() {
    let app = build_sketch_test_app(FailingPhotoGenerator);
    let response = post_file(app, UPLOAD, "digitalImage", "image/png", &png_bytes([9, 9, 9])).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = body_json(response).await;
    assert_eq!(json["code"], "SERVICE_FAILURE");
    let message = json["error"].as_str().unwrap();
    assert!(message.starts_with("Photo generation failed: "), "got {message}");
    assert!(message.contains("generator unavailable"));
}
