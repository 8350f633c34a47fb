//! Connection source port (interface).

use crate::domain::Connection;
use crate::error::Result;

/// Port for enumerating the host's sockets.
///
/// Implementations return every socket they can see, in the order the host
/// reports them; filtering to listening sockets happens in the inspector.
pub trait ConnectionSource: Send + Sync {
    /// Enumerate all current sockets.
    fn connections(&self) -> impl std::future::Future<Output = Result<Vec<Connection>>> + Send;
}
