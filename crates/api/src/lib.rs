//! sketchface HTTP services.
//!
//! Two independent Axum applications share this library:
//!
//! - the sketch-to-photo generator (`sketch-server`, `POST /image/upload`)
//! - the face-similarity search (`similarity-server`, `POST /find_similar/`,
//!   `GET /preprocess/`)
//!
//! Config, state, error handling and routers are exposed so integration
//! tests and the binary entrypoints build the exact same apps.

pub mod config;
pub mod error;
pub mod handlers;
pub mod preprocess;
pub mod router;
pub mod routes;
pub mod server;
pub mod state;
pub mod upload;
