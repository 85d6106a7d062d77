//! Cache policy engine
//!
//! Decides which records are stale and which carry local edits, and stamps
//! the sync metadata embedded in every record.

mod configurations;
mod policy;
pub mod ports;

pub use configurations::CacheConfigurations;
pub use policy::CachePolicy;
