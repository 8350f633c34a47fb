//! Fallback connection source for platforms without an implementation.

use crate::domain::Connection;
use crate::error::{Error, Result};
use crate::ports::ConnectionSource;

pub struct UnsupportedConnectionSource;

impl UnsupportedConnectionSource {
    pub fn new() -> Self {
        Self
    }
}

impl Default for UnsupportedConnectionSource {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectionSource for UnsupportedConnectionSource {
    async fn connections(&self) -> Result<Vec<Connection>> {
        Err(Error::UnsupportedPlatform(format!(
            "socket enumeration is not implemented on {}",
            std::env::consts::OS
        )))
    }
}
