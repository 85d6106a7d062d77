//! # LubeSync Core
//!
//! Pure business logic layer - no infrastructure dependencies.
//!
//! This crate contains:
//! - Port interfaces (traits) for the local store, remote resources and
//!   connectivity probes
//! - The cache policy engine
//! - Per-type synchronizers, their registry and the sync orchestrator
//!
//! ## Architecture Principles
//! - Only depends on `lubesync-domain`
//! - No database, HTTP, or platform code
//! - All external dependencies via traits

pub mod cache;
pub mod sync;

pub use cache::ports::EntityStore;
pub use cache::{CacheConfigurations, CachePolicy};
pub use sync::ports::{ConnectivityProbe, RemoteHealthProbe, ResourceAdapter};
pub use sync::{EntitySynchronizer, SyncEventBus, SyncOrchestrator, SyncRegistry, TypedSynchronizer};
