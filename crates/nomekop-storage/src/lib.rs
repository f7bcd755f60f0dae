//! Nomekop Storage Layer
//!
//! Client-local persistence. Only non-sensitive values live here: the
//! wallet hint is a single boolean and never carries an address.

mod database;
mod error;
mod hints;
mod migrations;

pub use database::Database;
pub use error::StorageError;
pub use hints::{HintStore, MemoryHintStore, SqliteHintStore, PREVIOUSLY_CONNECTED_KEY};

pub type Result<T> = std::result::Result<T, StorageError>;
