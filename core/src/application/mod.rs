//! Application layer - Use case services.
//!
//! Services are thin orchestrators that:
//! - Accept domain types as inputs
//! - Use ports (traits) for host access
//! - Return domain types as outputs

mod port_inspector;

pub use port_inspector::PortInspector;

use crate::adapters::{SystemConnections, SystemProcesses};
use crate::config::Config;

/// Inspector wired to the host's own sockets and processes.
pub type SystemInspector = PortInspector<SystemConnections, SystemProcesses>;

impl SystemInspector {
    /// Build an inspector for the current platform.
    pub fn system() -> Self {
        PortInspector::new(SystemConnections::new(), SystemProcesses::new())
    }

    /// Build an inspector for the current platform using `config`.
    pub fn from_config(config: &Config) -> Self {
        PortInspector::new(
            SystemConnections::from_config(config),
            SystemProcesses::from_config(config),
        )
    }
}
