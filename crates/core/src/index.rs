//! Exhaustive squared-L2 vector index and its on-disk formats.
//!
//! The index file is a small header followed by raw vectors:
//!
//! ```text
//! magic "SFIX" | version u32 | dimension u32 | count u64 | count*dimension f32
//! ```
//!
//! All integers and floats are little-endian. Row `i` of the index is named
//! by `ids[i]` in the companion JSON ids file.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::embedding::validate_dimension;
use crate::error::CoreError;

pub const INDEX_MAGIC: &[u8; 4] = b"SFIX";
pub const INDEX_VERSION: u32 = 1;

/// Flat (brute-force) nearest-neighbour index over fixed-length vectors.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatIndex {
    dimension: usize,
    data: Vec<f32>,
}

impl FlatIndex {
    pub fn new(dimension: usize) -> Result<Self, CoreError> {
        if dimension == 0 {
            return Err(CoreError::Validation(
                "Index dimension must be positive".into(),
            ));
        }
        Ok(Self {
            dimension,
            data: Vec::new(),
        })
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn len(&self) -> usize {
        self.data.len() / self.dimension
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Append one vector as the next row.
    pub fn add(&mut self, vector: &[f32]) -> Result<(), CoreError> {
        validate_dimension(vector, self.dimension)?;
        self.data.extend_from_slice(vector);
        Ok(())
    }

    /// Return the `k` nearest rows as `(row, squared_l2_distance)` pairs,
    /// nearest first. Fewer than `k` are returned when the index is smaller.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<(usize, f32)>, CoreError> {
        validate_dimension(query, self.dimension)?;

        let mut hits: Vec<(usize, f32)> = self
            .data
            .chunks_exact(self.dimension)
            .enumerate()
            .map(|(row, v)| (row, squared_l2(query, v)))
            .collect();

        hits.sort_by(|a, b| a.1.total_cmp(&b.1));
        hits.truncate(k);
        Ok(hits)
    }

    pub fn write(&self, path: &Path) -> Result<(), CoreError> {
        let mut out = BufWriter::new(File::create(path)?);
        out.write_all(INDEX_MAGIC)?;
        out.write_all(&INDEX_VERSION.to_le_bytes())?;
        out.write_all(&(self.dimension as u32).to_le_bytes())?;
        out.write_all(&(self.len() as u64).to_le_bytes())?;
        for value in &self.data {
            out.write_all(&value.to_le_bytes())?;
        }
        out.flush()?;
        Ok(())
    }

    pub fn read(path: &Path) -> Result<Self, CoreError> {
        let file = open_existing(path, "Vector index")?;
        let mut input = BufReader::new(file);

        let mut magic = [0u8; 4];
        input.read_exact(&mut magic).map_err(|_| truncated(path))?;
        if &magic != INDEX_MAGIC {
            return Err(CoreError::Validation(format!(
                "{} is not a vector index file",
                path.display()
            )));
        }

        let version = read_u32(&mut input, path)?;
        if version != INDEX_VERSION {
            return Err(CoreError::Validation(format!(
                "Unsupported index version {version} in {}",
                path.display()
            )));
        }

        let dimension = read_u32(&mut input, path)? as usize;
        let mut count_bytes = [0u8; 8];
        input
            .read_exact(&mut count_bytes)
            .map_err(|_| truncated(path))?;
        let count = u64::from_le_bytes(count_bytes) as usize;

        let mut payload = Vec::new();
        input.read_to_end(&mut payload)?;

        let expected = count
            .checked_mul(dimension)
            .and_then(|n| n.checked_mul(4))
            .ok_or_else(|| CoreError::Validation("Index header overflows".into()))?;
        if payload.len() != expected {
            return Err(CoreError::Validation(format!(
                "Index {} holds {} payload bytes, header promises {expected}",
                path.display(),
                payload.len()
            )));
        }

        let mut index = Self::new(dimension)?;
        index.data = payload
            .chunks_exact(4)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect();
        Ok(index)
    }
}

/// Identifiers naming the rows of a [`FlatIndex`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexIds {
    pub ids: Vec<String>,
    pub dimension: usize,
}

impl IndexIds {
    pub fn read(path: &Path) -> Result<Self, CoreError> {
        let file = open_existing(path, "Index ids file")?;
        serde_json::from_reader(BufReader::new(file)).map_err(|e| {
            CoreError::Validation(format!("Corrupt ids file {}: {e}", path.display()))
        })
    }

    pub fn write(&self, path: &Path) -> Result<(), CoreError> {
        let json = serde_json::to_vec_pretty(self)
            .map_err(|e| CoreError::Internal(format!("Failed to serialize ids: {e}")))?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

/// Ensure an index and its ids file describe the same rows.
pub fn check_consistency(index: &FlatIndex, ids: &IndexIds) -> Result<(), CoreError> {
    if index.len() != ids.ids.len() {
        return Err(CoreError::Validation(format!(
            "Index size ({}) does not match ids length ({})",
            index.len(),
            ids.ids.len()
        )));
    }
    if index.dimension() != ids.dimension {
        return Err(CoreError::Validation(format!(
            "Index dimension ({}) does not match ids dimension ({})",
            index.dimension(),
            ids.dimension
        )));
    }
    Ok(())
}

/// Map a squared-L2 distance to a similarity score in `(0, 1]`.
pub fn distance_to_score(distance: f32) -> f64 {
    1.0 / (1.0 + distance as f64)
}

fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

fn open_existing(path: &Path, what: &'static str) -> Result<File, CoreError> {
    File::open(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => CoreError::NotFound {
            what,
            path: path.to_path_buf(),
        },
        _ => CoreError::Io(e),
    })
}

fn read_u32(input: &mut impl Read, path: &Path) -> Result<u32, CoreError> {
    let mut buf = [0u8; 4];
    input.read_exact(&mut buf).map_err(|_| truncated(path))?;
    Ok(u32::from_le_bytes(buf))
}

fn truncated(path: &Path) -> CoreError {
    CoreError::Validation(format!("Index file {} is truncated", path.display()))
}
