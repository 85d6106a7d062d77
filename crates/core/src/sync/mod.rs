//! Bidirectional synchronization
//!
//! - [`ports`]: remote resource and connectivity interfaces
//! - [`TypedSynchronizer`]: upload and download passes for one entity type
//! - [`SyncRegistry`]: synchronizers keyed by entity type, in priority order
//! - [`SyncOrchestrator`]: single-flight campaigns across every type
//! - [`SyncEventBus`]: non-blocking progress channel

mod events;
mod orchestrator;
pub mod ports;
mod reconcile;
mod registry;
mod synchronizer;

pub use events::SyncEventBus;
pub use orchestrator::SyncOrchestrator;
pub use reconcile::Reconciliation;
pub use registry::SyncRegistry;
pub use synchronizer::{EntitySynchronizer, TypedSynchronizer, UploadAction};
