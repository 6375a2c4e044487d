//! Model-free domain logic shared by the sketchface services.
//!
//! Upload validation, image decode/encode, embedding math, cosine ranking,
//! the persisted embedding store and the flat L2 vector index all live here
//! so they can be tested without a model runtime.

pub mod dataset;
pub mod embedding;
pub mod error;
pub mod imaging;
pub mod index;
pub mod similarity;
pub mod store;
pub mod upload;
