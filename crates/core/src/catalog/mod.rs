//! Record storage and committed/working-copy synchronisation.

/// Name/torrent consistency heuristic.
pub mod correctness;
/// The in-memory record list and its mutators.
pub mod store;
/// Committed file and working copy management.
pub mod sync;

pub use store::{RecordFilter, RecordStore, StoreStats};
pub use sync::{CatalogSync, PrepareOutcome};
