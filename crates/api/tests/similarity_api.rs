//! Integration tests for POST /find_similar/ and GET /preprocess/.

mod common;

use assert_matches::assert_matches;
use axum::http::StatusCode;
use common::{
    body_json, build_similarity_test_app, colour_store, get, png_bytes, post_file,
    similarity_test_state, write_dataset,
};
use sketchface_api::preprocess::{ensure_store, load_store};
use sketchface_core::store::EmbeddingStore;

const FIND: &str = "/find_similar/";

const GALLERY: &[(&str, [u8; 3])] = &[
    ("red", [250, 10, 10]),
    ("crimson", [200, 30, 40]),
    ("green", [10, 240, 10]),
    ("blue", [10, 10, 240]),
    ("grey", [128, 128, 128]),
    ("teal", [0, 128, 128]),
    ("yellow", [240, 240, 0]),
];

fn scores(json: &serde_json::Value) -> Vec<f64> {
    json.as_array()
        .unwrap()
        .iter()
        .map(|pair| pair[1].as_str().unwrap().parse().unwrap())
        .collect()
}

// ---------------------------------------------------------------------------
// Test: a face upload is ranked against the gallery, best first
// ---------------------------------------------------------------------------

#[tokio::test]
async fn find_similar_ranks_top_five() {
    let dir = tempfile::tempdir().unwrap();
    let app = build_similarity_test_app(dir.path(), colour_store(GALLERY));

    let response = post_file(app, FIND, "file", "image/png", &png_bytes([250, 10, 10])).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    let matches = json.as_array().unwrap();
    assert_eq!(matches.len(), 5);
    assert_eq!(matches[0][0], "red");
    assert_eq!(matches[0][1], "1.0000");
    assert_eq!(matches[1][0], "crimson");

    let scores = scores(&json);
    assert!(scores.windows(2).all(|w| w[0] >= w[1]), "scores not descending: {scores:?}");
}

#[tokio::test]
async fn find_similar_returns_whole_gallery_when_smaller_than_five() {
    let dir = tempfile::tempdir().unwrap();
    let app = build_similarity_test_app(dir.path(), colour_store(&GALLERY[..2]));

    let response = post_file(app, FIND, "file", "image/jpeg", &png_bytes([10, 240, 10])).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn find_similar_against_empty_store_returns_empty_list() {
    let dir = tempfile::tempdir().unwrap();
    let app = build_similarity_test_app(dir.path(), EmbeddingStore::new());

    let response = post_file(app, FIND, "file", "image/png", &png_bytes([1, 2, 3])).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, serde_json::json!([]));
}

// ---------------------------------------------------------------------------
// Test: no detected face falls back to random gallery ids with score 0
// ---------------------------------------------------------------------------

#[tokio::test]
async fn no_face_returns_fallback_ids() {
    let dir = tempfile::tempdir().unwrap();
    let app = build_similarity_test_app(dir.path(), colour_store(GALLERY));

    let response = post_file(app, FIND, "file", "image/png", &png_bytes([0, 0, 0])).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    let matches = json.as_array().unwrap();
    assert_eq!(matches.len(), 5);

    let known: Vec<&str> = GALLERY.iter().map(|(id, _)| *id).collect();
    let mut seen = Vec::new();
    for pair in matches {
        let id = pair[0].as_str().unwrap();
        assert!(known.contains(&id), "unknown id {id}");
        assert!(!seen.contains(&id), "duplicate id {id}");
        seen.push(id);
        assert_eq!(pair[1], "0.0000");
    }
}

// ---------------------------------------------------------------------------
// Test: invalid uploads are rejected with 400
// ---------------------------------------------------------------------------

#[tokio::test]
async fn non_image_upload_returns_400() {
    let dir = tempfile::tempdir().unwrap();
    let app = build_similarity_test_app(dir.path(), colour_store(GALLERY));

    let response = post_file(app, FIND, "file", "application/pdf", b"%PDF-1.4").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_json(response).await;
    assert_eq!(json["error"], "File must be an image");
    assert_eq!(json["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn empty_upload_returns_400() {
    let dir = tempfile::tempdir().unwrap();
    let app = build_similarity_test_app(dir.path(), colour_store(GALLERY));

    let response = post_file(app, FIND, "file", "image/png", b"").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "Empty file uploaded");
}

#[tokio::test]
async fn malformed_image_returns_400() {
    let dir = tempfile::tempdir().unwrap();
    let app = build_similarity_test_app(dir.path(), colour_store(GALLERY));

    let response = post_file(app, FIND, "file", "image/png", b"\x89PNG broken").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_matches!(
        body_json(response).await["error"].as_str(),
        Some(message) if message.starts_with("Could not decode image")
    );
}

#[tokio::test]
async fn missing_file_field_returns_400() {
    let dir = tempfile::tempdir().unwrap();
    let app = build_similarity_test_app(dir.path(), colour_store(GALLERY));

    let body = common::multipart_body("image", "face.png", "image/png", &png_bytes([5, 5, 5]));
    let response = common::post_multipart(app, FIND, body).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "No file provided");
}

// ---------------------------------------------------------------------------
// Test: /preprocess/ rebuilds and persists the store
// ---------------------------------------------------------------------------

#[tokio::test]
async fn preprocess_embeds_dataset_and_saves_store() {
    let dir = tempfile::tempdir().unwrap();
    let faces = dir.path().join("faces");
    std::fs::create_dir(&faces).unwrap();
    std::fs::write(faces.join("alice.png"), png_bytes([200, 20, 20])).unwrap();
    std::fs::write(faces.join("bob.png"), png_bytes([20, 20, 200])).unwrap();
    // No face in an all-black frame.
    std::fs::write(faces.join("empty.png"), png_bytes([0, 0, 0])).unwrap();
    std::fs::write(faces.join("notes.txt"), b"ignored").unwrap();

    let app = build_similarity_test_app(dir.path(), EmbeddingStore::new());

    let response = get(app.clone(), "/preprocess/").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await["message"],
        "Preprocessed 2 images"
    );

    let saved = EmbeddingStore::load(&dir.path().join("embeddings.json")).unwrap();
    assert_eq!(saved.len(), 2);
    assert!(saved.get("alice").is_some());
    assert!(saved.get("bob").is_some());

    // The rebuilt store serves searches immediately.
    let response = post_file(app, FIND, "file", "image/png", &png_bytes([200, 20, 20])).await;
    let json = body_json(response).await;
    assert_eq!(json[0][0], "alice");
}

#[tokio::test]
async fn preprocess_without_dataset_returns_500() {
    let dir = tempfile::tempdir().unwrap();
    let app = build_similarity_test_app(dir.path(), colour_store(GALLERY));

    let response = get(app.clone(), "/preprocess/").await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let json = body_json(response).await;
    assert_eq!(json["error"], "Preprocessing failed");
    assert_eq!(json["code"], "SERVICE_FAILURE");

    // The previous store stays in place.
    let response = get(app, "/health").await;
    assert_eq!(body_json(response).await["stored_embeddings"], GALLERY.len());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn overlapping_preprocess_requests_both_succeed() {
    let dir = tempfile::tempdir().unwrap();
    write_dataset(dir.path(), &[("alice", [200, 20, 20]), ("bob", [20, 20, 200])]);
    let app = build_similarity_test_app(dir.path(), EmbeddingStore::new());

    let (first, second) = tokio::join!(
        get(app.clone(), "/preprocess/"),
        get(app.clone(), "/preprocess/")
    );

    for response in [first, second] {
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["message"], "Preprocessed 2 images");
    }
    let saved = EmbeddingStore::load(&dir.path().join("embeddings.json")).unwrap();
    assert_eq!(saved.len(), 2);
}

// ---------------------------------------------------------------------------
// Test: a query whose dimension differs from the store is a sanitized 500
// ---------------------------------------------------------------------------

#[tokio::test]
async fn store_dimension_mismatch_returns_500() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = EmbeddingStore::new();
    store.insert("legacy", vec![1.0, 0.0, 0.0]).unwrap();
    let app = build_similarity_test_app(dir.path(), store);

    let response = post_file(app, FIND, "file", "image/png", &png_bytes([200, 20, 20])).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let json = body_json(response).await;
    assert_eq!(json["code"], "INTERNAL_ERROR");
    assert_eq!(json["error"], "An internal error occurred");
}

// ---------------------------------------------------------------------------
// Test: startup loading and rebuilding of the store
// ---------------------------------------------------------------------------

#[tokio::test]
async fn startup_without_store_file_embeds_dataset() {
    let dir = tempfile::tempdir().unwrap();
    write_dataset(dir.path(), &[("alice", [200, 20, 20]), ("bob", [20, 20, 200])]);
    let path = dir.path().join("embeddings.json");

    let store = load_store(&path);
    assert!(store.is_empty());

    let state = similarity_test_state(dir.path(), store);
    ensure_store(&state).await;

    assert_eq!(state.store.read().await.len(), 2);
    let saved = EmbeddingStore::load(&path).unwrap();
    assert_eq!(saved.ids().collect::<Vec<_>>(), vec!["alice", "bob"]);
}

#[tokio::test]
async fn startup_with_corrupt_store_file_rebuilds_it() {
    let dir = tempfile::tempdir().unwrap();
    write_dataset(dir.path(), &[("alice", [200, 20, 20])]);
    let path = dir.path().join("embeddings.json");
    std::fs::write(&path, b"{not json").unwrap();

    let store = load_store(&path);
    assert!(store.is_empty());

    let state = similarity_test_state(dir.path(), store);
    ensure_store(&state).await;

    assert_eq!(state.store.read().await.len(), 1);
    let saved = EmbeddingStore::load(&path).unwrap();
    assert!(saved.get("alice").is_some());
}

#[tokio::test]
async fn startup_with_populated_store_skips_rebuild() {
    let dir = tempfile::tempdir().unwrap();
    write_dataset(dir.path(), &[("alice", [200, 20, 20])]);
    let path = dir.path().join("embeddings.json");
    colour_store(GALLERY).save(&path).unwrap();
    let before = std::fs::read(&path).unwrap();

    let store = load_store(&path);
    assert_eq!(store.len(), GALLERY.len());

    let state = similarity_test_state(dir.path(), store);
    ensure_store(&state).await;

    let store = state.store.read().await;
    assert_eq!(store.len(), GALLERY.len());
    assert!(store.get("alice").is_none());
    assert_eq!(std::fs::read(&path).unwrap(), before);
}
