#![warn(clippy::all, missing_docs)]

//! Core data management for the game catalog admin tool.
//!
//! This crate owns the record model, the JSON-backed record store and
//! its committed/working-copy synchronisation, the external metadata
//! client, and the batch reconciliation that repairs mismatched
//! entries. Frontends drive it and render the [`Notice`]s it emits.

pub mod catalog;
pub mod config;
pub mod error;
pub mod events;
pub mod models;
pub mod provider;
pub mod reconcile;
pub mod schema;

pub use catalog::{CatalogSync, RecordStore, StoreStats};
pub use config::AppConfig;
pub use error::{FieldError, ProviderError, StoreError};
pub use events::{Notice, Notifier, NotifyOptions};
pub use models::{Platform, Record, RecordPatch, Requirements};
pub use provider::{ExternalMetadata, MetadataSource, RawgProvider};
pub use reconcile::{auto_fix, AutoFixReport};
