//! Storage abstraction and implementations for CourseTrack.
//!
//! This crate provides trait-based catalog, enrollment and progress stores
//! with a JSON file backend (default) and an optional SQLite backend.

#![warn(missing_docs)]

pub mod trait_;
pub mod config;
#[cfg(feature = "json")]
pub mod json_storage;
#[cfg(feature = "sqlite")]
pub mod sqlite_storage;

pub use trait_::{
    CatalogStore, EnrollmentStore, MergeOutcome, ProgressStore, Result, Storage, StorageError,
};
pub use config::{open_storage, StorageBackend, StorageConfig};
#[cfg(feature = "json")]
pub use json_storage::JsonStorage;
#[cfg(feature = "sqlite")]
pub use sqlite_storage::SqliteStorage;
