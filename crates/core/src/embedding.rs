//! Embedding vector helpers.

use crate::error::CoreError;

/// Euclidean norm of a vector.
pub fn l2_norm(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

/// Scale `v` to unit length in place. A zero vector is left untouched.
pub fn l2_normalize(v: &mut [f32]) {
    let norm = l2_norm(v);
    if norm > 0.0 {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}

/// Validate that an embedding vector has the expected dimensionality.
pub fn validate_dimension(embedding: &[f32], expected: usize) -> Result<(), CoreError> {
    if embedding.len() != expected {
        return Err(CoreError::Validation(format!(
            "Embedding must be {expected}-dimensional, got {}",
            embedding.len()
        )));
    }
    Ok(())
}
