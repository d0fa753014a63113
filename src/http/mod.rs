//! Dashboard HTTP surface
//!
//! Serves the single-page dashboard and the JSON API its buttons and
//! dropdowns call.

pub mod handler;
pub mod server;

pub use handler::ApiError;
pub use server::{router, AppState, HttpServer, SharedSession};
