//! `face-index <dir>` -- build the vector index queried by `face-recognize`.

use std::path::PathBuf;

use clap::Parser;
use sketchface_recognize::build_index;
use sketchface_recognize::cli::{self, IndexArgs, ModelArgs};

#[derive(Parser)]
#[command(name = "face-index")]
#[command(about = "Embed a directory of face images into a vector index")]
struct Cli {
    /// Directory of gallery images (JPG or PNG)
    #[arg(env = "DATASET_PATH", default_value = "criminal_faces/")]
    dataset: PathBuf,

    #[command(flatten)]
    index: IndexArgs,

    #[command(flatten)]
    models: ModelArgs,
}

fn main() {
    dotenvy::dotenv().ok();
    cli::init_tracing("face_index=info,sketchface_recognize=info,sketchface_inference=info");

    let args = Cli::parse();

    let pipeline = args.models.load_pipeline().unwrap_or_else(|e| {
        tracing::error!(error = %e, "Error loading face models");
        std::process::exit(1);
    });

    let built = build_index(&pipeline, &args.dataset).unwrap_or_else(|e| {
        tracing::error!(error = %e, "Error building vector index");
        std::process::exit(1);
    });

    if let Err(e) = built.write(&args.index.index, &args.index.ids) {
        tracing::error!(error = %e, "Error writing vector index");
        std::process::exit(1);
    }

    tracing::info!(
        indexed = built.ids.ids.len(),
        no_face = built.no_face.len(),
        failed = built.failed.len(),
        index = %args.index.index.display(),
        ids = %args.index.ids.display(),
        "Vector index written"
    );
}
