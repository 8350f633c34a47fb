//! Ports layer - Trait definitions (interfaces).
//!
//! This module defines the interfaces that the application layer uses
//! to interact with the host. Implementations live in `adapters`.

mod connections;
mod process;

pub use connections::ConnectionSource;
pub use process::{ProcessHandle, ProcessRegistry};
