//! portmem Core Library
//!
//! Lists the listening network ports on the current host, maps each to its
//! owning process and reports that process's memory usage.
//!
//! # Architecture
//! This library follows hexagonal architecture (ports & adapters):
//! - `domain`: Pure data models
//! - `ports`: Trait definitions (interfaces)
//! - `adapters`: Host system implementations
//! - `application`: Use case services
//!
//! # Platform Support
//! - Linux: Reads the socket tables and process files under `/proc`
//! - macOS: Uses `lsof`, `ps` and `sysctl`
//! - Others: Enumeration fails with [`Error::UnsupportedPlatform`]

// Hexagonal architecture layers
pub mod adapters;
pub mod application;
pub mod domain;
pub mod ports;

pub mod config;
pub mod error;
pub mod output;

// Re-export domain types (primary API)
pub use domain::{
    filter_records, AddressFamily, Connection, ConnectionState, PortRecord, Protocol,
    ProtocolSelection, RecordFilter,
};

// Re-export other commonly used types
pub use adapters::{SystemConnections, SystemProcesses};
pub use application::{PortInspector, SystemInspector};
pub use config::{Config, ConfigStore};
pub use error::{Error, Result};
pub use output::{render_json, OutputFormat, DEFAULT_INDENT};
pub use ports::{ConnectionSource, ProcessHandle, ProcessRegistry};

/// Inspect the host and return the listening ports as JSON text indented
/// with four spaces.
pub async fn inspect() -> Result<String> {
    let records = SystemInspector::system().inspect().await?;
    render_json(&records, DEFAULT_INDENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn test_inspect_live_host() {
        let json = inspect().await.unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        for record in value.as_array().unwrap() {
            let usage = record["memory_usage"].as_f64().unwrap();
            assert!((0.0..=100.0).contains(&usage));
            assert!(record["port"].as_u64().is_some());
            assert!(record["process"].is_string());
        }
    }
}
