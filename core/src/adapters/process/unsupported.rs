//! Fallback process registry for platforms without an implementation.

use crate::error::{Error, Result};
use crate::ports::{ProcessHandle, ProcessRegistry};

pub struct UnsupportedRegistry;

impl UnsupportedRegistry {
    pub fn new() -> Self {
        Self
    }
}

impl Default for UnsupportedRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessRegistry for UnsupportedRegistry {
    type Handle = UnsupportedProcess;

    async fn resolve(&self, _pid: u32) -> Result<UnsupportedProcess> {
        Err(unsupported())
    }
}

/// Never constructed; exists to name the registry's handle type.
pub struct UnsupportedProcess {
    pid: u32,
}

impl ProcessHandle for UnsupportedProcess {
    fn pid(&self) -> u32 {
        self.pid
    }

    async fn name(&self) -> Result<String> {
        Err(unsupported())
    }

    async fn memory_percent(&self) -> Result<f64> {
        Err(unsupported())
    }
}

fn unsupported() -> Error {
    Error::UnsupportedPlatform(format!(
        "process inspection is not implemented on {}",
        std::env::consts::OS
    ))
}
