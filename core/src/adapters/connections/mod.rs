//! Connection source adapters.
//!
//! Platform-specific implementations of socket enumeration.

#[cfg(target_os = "macos")]
mod darwin;

#[cfg(target_os = "linux")]
mod linux;

#[cfg(not(any(target_os = "linux", target_os = "macos")))]
mod unsupported;

#[cfg(target_os = "macos")]
mod utils;

#[cfg(target_os = "macos")]
pub use darwin::LsofConnectionSource;

#[cfg(target_os = "linux")]
pub use linux::ProcfsConnectionSource;

use crate::config::Config;
use crate::domain::{Connection, ProtocolSelection};
use crate::error::Result;
use crate::ports::ConnectionSource;

/// The connection source for the current platform.
pub struct SystemConnections {
    #[cfg(target_os = "macos")]
    inner: darwin::LsofConnectionSource,

    #[cfg(target_os = "linux")]
    inner: linux::ProcfsConnectionSource,

    #[cfg(not(any(target_os = "linux", target_os = "macos")))]
    inner: unsupported::UnsupportedConnectionSource,
}

impl SystemConnections {
    /// Create a connection source for the current platform.
    pub fn new() -> Self {
        Self::with_selection(ProtocolSelection::All)
    }

    /// Create a connection source limited to `selection`.
    #[cfg_attr(
        not(any(target_os = "linux", target_os = "macos")),
        allow(unused_variables)
    )]
    pub fn with_selection(selection: ProtocolSelection) -> Self {
        Self {
            #[cfg(target_os = "macos")]
            inner: darwin::LsofConnectionSource::new().with_selection(selection),

            #[cfg(target_os = "linux")]
            inner: linux::ProcfsConnectionSource::new().with_selection(selection),

            #[cfg(not(any(target_os = "linux", target_os = "macos")))]
            inner: unsupported::UnsupportedConnectionSource::new(),
        }
    }

    /// Create a connection source from user configuration.
    #[cfg_attr(
        not(any(target_os = "linux", target_os = "macos")),
        allow(unused_variables)
    )]
    pub fn from_config(config: &Config) -> Self {
        #[cfg(target_os = "macos")]
        let inner = darwin::LsofConnectionSource::new().with_selection(config.protocols);

        #[cfg(target_os = "linux")]
        let inner = linux::ProcfsConnectionSource::with_root(&config.proc_root)
            .with_selection(config.protocols);

        #[cfg(not(any(target_os = "linux", target_os = "macos")))]
        let inner = unsupported::UnsupportedConnectionSource::new();

        Self { inner }
    }
}

impl Default for SystemConnections {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectionSource for SystemConnections {
    async fn connections(&self) -> Result<Vec<Connection>> {
        self.inner.connections().await
    }
}
