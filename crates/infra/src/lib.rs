//! # LubeSync Infrastructure
//!
//! Infrastructure implementations of core domain ports.
//!
//! This crate contains:
//! - The resilient HTTP transport (reqwest)
//! - Remote resource adapters, one per entity family
//! - Local stores (SQLite via r2d2, in-memory)
//! - Connectivity probing, configuration loading and logging setup
//!
//! ## Architecture
//! - Implements traits defined in `lubesync-core`
//! - Contains all "impure" code (network, disk, environment)

pub mod api;
pub mod config;
pub mod connectivity;
pub mod database;
pub mod errors;
pub mod http;
pub mod logging;

// Re-export commonly used items
pub use api::{HttpResourceAdapter, ResourceEndpoints};
pub use connectivity::HostConnectivityProbe;
pub use database::{DbManager, InMemoryEntityStore, SqliteEntityStore};
pub use errors::InfraError;
pub use http::{HealthStatus, ResilientTransport, TransportError};
pub use logging::init_tracing;
