//! Query side: one image in, ranked gallery ids out.

use std::path::Path;

use serde::Serialize;

use sketchface_core::dataset::has_supported_extension;
use sketchface_core::imaging::open_rgb;
use sketchface_core::index::{check_consistency, distance_to_score, FlatIndex, IndexIds};
use sketchface_core::similarity::TOP_K;
use sketchface_inference::FacePipeline;

use crate::error::RecognizeError;

/// A gallery id and its similarity score, serialized as `["id", 0.87]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecognizedMatch(pub String, pub f64);

/// A loaded index together with the ids naming its rows.
#[derive(Debug)]
pub struct Recognizer {
    index: FlatIndex,
    ids: Vec<String>,
}

impl Recognizer {
    /// Pair an index with its ids, rejecting files that disagree.
    pub fn new(index: FlatIndex, ids: IndexIds) -> Result<Self, RecognizeError> {
        check_consistency(&index, &ids)?;
        Ok(Self {
            index,
            ids: ids.ids,
        })
    }

    pub fn load(index_path: &Path, ids_path: &Path) -> Result<Self, RecognizeError> {
        let index = FlatIndex::read(index_path)?;
        let ids = IndexIds::read(ids_path)?;
        Self::new(index, ids)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn dimension(&self) -> usize {
        self.index.dimension()
    }

    /// Reject an embedding model whose vectors cannot be searched here.
    pub fn check_dimension(&self, model: usize) -> Result<(), RecognizeError> {
        if self.dimension() != model {
            return Err(RecognizeError::DimensionMismatch {
                index: self.dimension(),
                model,
            });
        }
        Ok(())
    }

    /// The `k` nearest gallery entries, highest score first.
    ///
    /// A query of the wrong dimension is an error.
    pub fn search(&self, embedding: &[f32], k: usize) -> Result<Vec<RecognizedMatch>, RecognizeError> {
        let mut matches: Vec<RecognizedMatch> = self
            .index
            .search(embedding, k)?
            .into_iter()
            .filter_map(|(row, distance)| {
                self.ids
                    .get(row)
                    .map(|id| RecognizedMatch(id.clone(), distance_to_score(distance)))
            })
            .collect();

        matches.sort_by(|a, b| b.1.total_cmp(&a.1));
        Ok(matches)
    }
}

/// Recognize the face in the image at `path`.
///
/// A missing file is an error. An unsupported extension, an unreadable
/// image, a failed embedding or no detected face all yield an empty list.
pub fn recognize(
    recognizer: &Recognizer,
    pipeline: &FacePipeline,
    path: &Path,
) -> Result<Vec<RecognizedMatch>, RecognizeError> {
    if !path.is_file() {
        return Err(RecognizeError::ImageNotFound(path.to_path_buf()));
    }

    if !has_supported_extension(path) {
        tracing::error!(
            path = %path.display(),
            "Unsupported file format. Use JPG or PNG"
        );
        return Ok(Vec::new());
    }

    let image = match open_rgb(path) {
        Ok(image) => image,
        Err(e) => {
            tracing::error!(path = %path.display(), error = %e, "Error reading image");
            return Ok(Vec::new());
        }
    };

    let embedding = match pipeline.embed_face(&image) {
        Ok(Some(embedding)) => embedding,
        Ok(None) => {
            tracing::warn!(path = %path.display(), "No face detected");
            return Ok(Vec::new());
        }
        Err(e) => {
            tracing::error!(path = %path.display(), error = %e, "Error generating embedding");
            return Ok(Vec::new());
        }
    };

    recognizer.search(&embedding, TOP_K)
}
