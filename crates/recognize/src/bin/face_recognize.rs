//! `face-recognize <image>` -- print the closest gallery faces as JSON.
//!
//! Output is a JSON list of `[id, score]` pairs on stdout, best first, with
//! `score = 1 / (1 + squared_l2)`. Logs go to stderr.

use std::path::PathBuf;

use clap::Parser;
use sketchface_recognize::cli::{self, IndexArgs, ModelArgs};
use sketchface_recognize::{recognize, Recognizer};

#[derive(Parser)]
#[command(name = "face-recognize")]
#[command(about = "Find the gallery faces most similar to the face in an image")]
struct Cli {
    /// Query image (JPG or PNG)
    image: PathBuf,

    #[command(flatten)]
    index: IndexArgs,

    #[command(flatten)]
    models: ModelArgs,
}

fn main() {
    dotenvy::dotenv().ok();
    cli::init_tracing("face_recognize=info,sketchface_recognize=info,sketchface_inference=warn");

    let args = Cli::parse();

    tracing::info!("Loading vector index and ids...");
    let recognizer = Recognizer::load(&args.index.index, &args.index.ids).unwrap_or_else(|e| {
        tracing::error!(error = %e, "Error loading vector index or ids");
        std::process::exit(1);
    });
    tracing::info!(entries = recognizer.len(), "Vector index loaded");

    if !args.image.is_file() {
        tracing::error!(path = %args.image.display(), "Image file does not exist");
        std::process::exit(1);
    }

    let pipeline = args.models.load_pipeline().unwrap_or_else(|e| {
        tracing::error!(error = %e, "Error loading face models");
        std::process::exit(1);
    });

    if let Err(e) = recognizer.check_dimension(pipeline.dimension()) {
        tracing::error!(error = %e, "Vector index was built with a different embedding model");
        std::process::exit(1);
    }

    let matches = recognize(&recognizer, &pipeline, &args.image).unwrap_or_else(|e| {
        tracing::error!(error = %e, "Error searching vector index");
        std::process::exit(1);
    });

    match serde_json::to_string(&matches) {
        Ok(json) => println!("{json}"),
        Err(e) => {
            tracing::error!(error = %e, "Failed to serialize matches");
            std::process::exit(1);
        }
    }
}
