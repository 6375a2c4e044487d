//! Rebuilding the gallery embedding store from the dataset directory.

use std::path::Path;
use std::sync::Arc;

use sketchface_core::dataset::scan_images;
use sketchface_core::store::EmbeddingStore;
use sketchface_inference::embed_dataset;

use crate::error::{AppError, AppResult};
use crate::state::SimilarityState;

/// Re-embed every dataset image, persist the result, then swap it in.
///
/// The new store is built without holding the store lock, so searches keep
/// being served from the previous store until the swap. Concurrent rebuilds
/// queue on `rebuild_lock` and run one after another. Returns the number of
/// embedded images.
pub async fn rebuild_store(state: &SimilarityState) -> AppResult<usize> {
    let _rebuilding = state.rebuild_lock.lock().await;

    let pipeline = Arc::clone(&state.pipeline);
    let settings = Arc::clone(&state.settings);

    let store = tokio::task::spawn_blocking(move || -> AppResult<EmbeddingStore> {
        let images = scan_images(&settings.dataset_path)?;
        tracing::info!(
            dataset = %settings.dataset_path.display(),
            images = images.len(),
            "Preprocessing dataset"
        );

        let report = embed_dataset(&pipeline, &images);
        let mut store = EmbeddingStore::new();
        for (id, embedding) in report.embedded {
            store.insert(id, embedding)?;
        }

        store.save(&settings.embeddings_path)?;
        tracing::info!(
            count = store.len(),
            no_face = report.no_face.len(),
            failed = report.failed.len(),
            path = %settings.embeddings_path.display(),
            "Saved embeddings"
        );
        Ok(store)
    })
    .await
    .map_err(|e| AppError::InternalError(format!("Preprocessing task failed: {e}")))??;

    let count = store.len();
    *state.store.write().await = store;
    Ok(count)
}

/// Load the persisted store, falling back to an empty one when the file is
/// unreadable.
pub fn load_store(path: &Path) -> EmbeddingStore {
    match EmbeddingStore::load(path) {
        Ok(store) if store.is_empty() => {
            tracing::warn!(path = %path.display(), "No embeddings found");
            store
        }
        Ok(store) => {
            tracing::info!(count = store.len(), path = %path.display(), "Loaded embeddings");
            store
        }
        Err(e) => {
            tracing::error!(error = %e, "Error loading embeddings");
            EmbeddingStore::new()
        }
    }
}

/// Startup hook: rebuild the store if nothing was loaded from disk.
///
/// Failures are logged, not fatal; the service then runs with an empty
/// store until `/preprocess/` succeeds.
pub async fn ensure_store(state: &SimilarityState) {
    if !state.store.read().await.is_empty() {
        return;
    }

    tracing::info!("No embeddings found, preprocessing images...");
    match rebuild_store(state).await {
        Ok(count) => tracing::info!(count, "Startup preprocessing complete"),
        Err(e) => tracing::error!(error = %e, "Startup preprocessing failed"),
    }
}
