//! Domain types and models
//!
//! - [`cache`]: entity types, per-record cache metadata and cache configuration
//! - [`sync`]: sync results, run states and reports
//! - [`events`]: progress events published to the UI

pub mod cache;
pub mod events;
pub mod sync;

pub use cache::{looks_server_assigned, CacheConfiguration, CacheMetadata, EntityType, SyncStatus};
pub use events::{SyncEvent, SyncEventStatus, SyncOperation};
pub use sync::{SyncErrorEntry, SyncReport, SyncResult, SyncResultStatus, SyncRunState};
