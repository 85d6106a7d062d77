//! # LubeSync App
//!
//! Application layer: wires config, transport, stores and the orchestrator
//! into one [`AppContext`], and hosts the `lubesync` binary.

pub mod context;

pub use context::*;
