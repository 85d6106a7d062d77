//! HTTP transport

pub mod errors;
pub mod transport;

pub use errors::TransportError;
pub use transport::{HealthStatus, ResilientTransport};
