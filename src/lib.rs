//! todo-api - Minimal JSON to-do list service backed by an embedded document store

pub mod config;
pub mod error;
pub mod types;

pub mod store;
pub mod api;
pub mod server;

pub use config::Config;
pub use error::{Error, Result};
pub use types::*;
