//! In-memory embedding store persisted as JSON.
//!
//! Maps image identifiers to embedding vectors in insertion order. Every
//! vector in a store has the same dimension.

use std::io::Write;
use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::embedding::validate_dimension;
use crate::error::CoreError;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EmbeddingStore {
    entries: IndexMap<String, Vec<f32>>,
}

impl EmbeddingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Dimension shared by all stored vectors, or `None` when empty.
    pub fn dimension(&self) -> Option<usize> {
        self.entries.values().next().map(Vec::len)
    }

    /// Insert or replace the embedding for `id`.
    ///
    /// Rejects empty vectors and vectors whose dimension differs from the
    /// ones already stored.
    pub fn insert(&mut self, id: impl Into<String>, embedding: Vec<f32>) -> Result<(), CoreError> {
        if embedding.is_empty() {
            return Err(CoreError::Validation("Embedding must not be empty".into()));
        }
        if let Some(dim) = self.dimension() {
            validate_dimension(&embedding, dim)?;
        }
        self.entries.insert(id.into(), embedding);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&[f32]> {
        self.entries.get(id).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[f32])> {
        self.entries
            .iter()
            .map(|(id, embedding)| (id.as_str(), embedding.as_slice()))
    }

    /// Load a store from `path`.
    ///
    /// A missing file yields an empty store. A file that does not parse, or
    /// that mixes dimensions, is an error.
    pub fn load(path: &Path) -> Result<Self, CoreError> {
        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::new()),
            Err(e) => return Err(e.into()),
        };

        let raw: IndexMap<String, Vec<f32>> = serde_json::from_slice(&bytes).map_err(|e| {
            CoreError::Validation(format!(
                "Corrupt embedding store {}: {e}",
                path.display()
            ))
        })?;

        let mut store = Self::new();
        for (id, embedding) in raw {
            store.insert(id, embedding)?;
        }
        Ok(store)
    }

    /// Persist the store to `path`, replacing any previous file atomically.
    ///
    /// Each call writes its own uniquely named temp file next to `path`, so
    /// concurrent saves never share an intermediate file.
    pub fn save(&self, path: &Path) -> Result<(), CoreError> {
        let json = serde_json::to_vec(self)
            .map_err(|e| CoreError::Internal(format!("Failed to serialize embeddings: {e}")))?;

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(&json)?;
        tmp.as_file().sync_all()?;
        tmp.persist(path).map_err(|e| CoreError::Io(e.error))?;
        Ok(())
    }
}
