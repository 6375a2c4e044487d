//! Offline face recognition against a prebuilt vector index.
//!
//! `face-index` embeds a directory of gallery images into a [`FlatIndex`]
//! plus its ids file; `face-recognize` embeds one query image and prints
//! the nearest gallery ids as JSON.
//!
//! [`FlatIndex`]: sketchface_core::index::FlatIndex

pub mod build;
pub mod cli;
pub mod error;
pub mod query;

pub use build::{build_index, BuiltIndex};
pub use error::RecognizeError;
pub use query::{recognize, RecognizedMatch, Recognizer};
