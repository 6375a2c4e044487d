//! ONNX Runtime session loading and single-input execution.

use std::path::Path;
use std::sync::Mutex;

use ndarray::Array4;
use ort::session::Session;
use ort::value::TensorRef;

use crate::error::InferenceError;

/// Intra-op threads per session. Each process serves one request at a time
/// per model, so a small pool is enough.
const INTRA_THREADS: usize = 2;

/// A model output copied out of the session.
#[derive(Debug, Clone)]
pub(crate) struct OutputTensor {
    pub shape: Vec<usize>,
    pub data: Vec<f32>,
}

/// Build a session for the ONNX model at `path`.
///
/// Wrapped in a `Mutex` because `Session::run` requires `&mut self` while
/// the model traits expose `&self`.
pub(crate) fn load(path: &Path) -> Result<Mutex<Session>, InferenceError> {
    if !path.exists() {
        return Err(InferenceError::ModelNotFound(path.to_path_buf()));
    }

    let session = Session::builder()
        .map_err(|e| InferenceError::ModelInit(e.to_string()))?
        .with_intra_threads(INTRA_THREADS)
        .map_err(|e| InferenceError::ModelInit(e.to_string()))?
        .commit_from_file(path)
        .map_err(|e| {
            InferenceError::ModelInit(format!("ONNX load failed for {}: {e}", path.display()))
        })?;

    Ok(Mutex::new(session))
}

/// Run a single-input model and copy out its first `output_count` outputs.
pub(crate) fn run(
    session: &Mutex<Session>,
    input: &Array4<f32>,
    output_count: usize,
) -> Result<Vec<OutputTensor>, InferenceError> {
    let tensor = TensorRef::from_array_view(input)
        .map_err(|e| InferenceError::Inference(format!("Input tensor: {e}")))?;

    let mut session = session
        .lock()
        .map_err(|_| InferenceError::Inference("Session lock poisoned".to_string()))?;

    let outputs = session
        .run(ort::inputs![tensor])
        .map_err(|e| InferenceError::Inference(format!("ONNX inference failed: {e}")))?;

    let mut extracted = Vec::with_capacity(output_count);
    for i in 0..output_count {
        let (shape, data) = outputs[i]
            .try_extract_tensor::<f32>()
            .map_err(|e| InferenceError::Inference(format!("Output {i} extraction: {e}")))?;

        extracted.push(OutputTensor {
            shape: shape.iter().map(|&d| d.max(0) as usize).collect(),
            data: data.to_vec(),
        });
    }

    Ok(extracted)
}
