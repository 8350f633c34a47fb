//! Adapters layer - Host system implementations.
//!
//! This module contains implementations of the port traits defined in `ports`.
//! Each adapter talks to the operating system.

pub mod connections;
pub mod process;

// Re-export main types for convenience
pub use connections::SystemConnections;
pub use process::{SystemProcess, SystemProcesses};
