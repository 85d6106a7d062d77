//! # LubeSync Domain
//!
//! Business domain types and models for LubeSync.
//!
//! This crate contains:
//! - Cached entity records and their sync metadata
//! - Sync results, run states and progress events
//! - Domain error types and Result definitions
//! - Configuration structures and domain constants
//!
//! ## Architecture
//! - No dependencies on other LubeSync crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures

pub mod config;
pub mod constants;
pub mod entities;
pub mod errors;
pub mod macros;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use entities::*;
pub use errors::*;
pub use types::*;
