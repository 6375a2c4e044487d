//! Index side: a gallery directory in, index and ids files out.

use std::path::Path;

use sketchface_core::dataset::scan_images;
use sketchface_core::index::{FlatIndex, IndexIds};
use sketchface_inference::{embed_dataset, FacePipeline};

use crate::error::RecognizeError;

/// An index built from a gallery directory.
#[derive(Debug)]
pub struct BuiltIndex {
    pub index: FlatIndex,
    pub ids: IndexIds,
    /// Ids of images in which no face was found.
    pub no_face: Vec<String>,
    /// Ids of images that could not be read or embedded, with the reason.
    pub failed: Vec<(String, String)>,
}

impl BuiltIndex {
    pub fn write(&self, index_path: &Path, ids_path: &Path) -> Result<(), RecognizeError> {
        self.index.write(index_path)?;
        self.ids.write(ids_path)?;
        Ok(())
    }
}

/// Embed every supported image in `dir` into a fresh index.
///
/// Images without a face are skipped. Fails when nothing could be embedded.
pub fn build_index(pipeline: &FacePipeline, dir: &Path) -> Result<BuiltIndex, RecognizeError> {
    let images = scan_images(dir)?;
    tracing::info!(dir = %dir.display(), images = images.len(), "Indexing gallery");

    let report = embed_dataset(pipeline, &images);
    if report.embedded.is_empty() {
        return Err(RecognizeError::NoEmbeddings(dir.to_path_buf()));
    }

    let mut index = FlatIndex::new(pipeline.dimension())?;
    let mut ids = Vec::with_capacity(report.embedded.len());
    for (id, embedding) in report.embedded {
        index.add(&embedding)?;
        ids.push(id);
    }

    Ok(BuiltIndex {
        ids: IndexIds {
            ids,
            dimension: index.dimension(),
        },
        index,
        no_face: report.no_face,
        failed: report.failed,
    })
}
