//! Process registry adapters.
//!
//! Platform-specific implementations of process lookup.

#[cfg(target_os = "macos")]
mod darwin;

#[cfg(target_os = "linux")]
mod linux;

#[cfg(not(any(target_os = "linux", target_os = "macos")))]
mod unsupported;

#[cfg(target_os = "macos")]
pub use darwin::{PsProcess, PsRegistry};

#[cfg(target_os = "linux")]
pub use linux::{ProcfsProcess, ProcfsRegistry};

#[cfg(not(any(target_os = "linux", target_os = "macos")))]
pub use unsupported::{UnsupportedProcess, UnsupportedRegistry};

use crate::config::Config;
use crate::error::Result;
use crate::ports::ProcessRegistry;

#[cfg(target_os = "macos")]
type PlatformRegistry = darwin::PsRegistry;

#[cfg(target_os = "linux")]
type PlatformRegistry = linux::ProcfsRegistry;

#[cfg(not(any(target_os = "linux", target_os = "macos")))]
type PlatformRegistry = unsupported::UnsupportedRegistry;

/// The process handle type of the current platform.
pub type SystemProcess = <PlatformRegistry as ProcessRegistry>::Handle;

/// The process registry for the current platform.
pub struct SystemProcesses {
    inner: PlatformRegistry,
}

impl SystemProcesses {
    /// Create a process registry for the current platform.
    pub fn new() -> Self {
        Self {
            inner: PlatformRegistry::new(),
        }
    }

    /// Create a process registry from user configuration.
    #[cfg_attr(not(target_os = "linux"), allow(unused_variables))]
    pub fn from_config(config: &Config) -> Self {
        #[cfg(target_os = "linux")]
        let inner = linux::ProcfsRegistry::with_root(&config.proc_root);

        #[cfg(not(target_os = "linux"))]
        let inner = PlatformRegistry::new();

        Self { inner }
    }
}

impl Default for SystemProcesses {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessRegistry for SystemProcesses {
    type Handle = SystemProcess;

    async fn resolve(&self, pid: u32) -> Result<SystemProcess> {
        self.inner.resolve(pid).await
    }
}
