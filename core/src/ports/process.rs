//! Process registry port (interface).

use crate::error::Result;

/// A live process that can be queried.
///
/// Any query may fail with [`Error::ProcessNotFound`](crate::Error::ProcessNotFound)
/// if the process exits after it was resolved.
pub trait ProcessHandle: Send + Sync {
    /// Process ID.
    fn pid(&self) -> u32;

    /// Short process name (e.g. `nginx`).
    fn name(&self) -> impl std::future::Future<Output = Result<String>> + Send;

    /// Resident memory as a percentage of total physical memory.
    fn memory_percent(&self) -> impl std::future::Future<Output = Result<f64>> + Send;
}

/// Port for resolving process IDs to live processes.
pub trait ProcessRegistry: Send + Sync {
    type Handle: ProcessHandle;

    /// Resolve a PID.
    ///
    /// Fails with [`Error::ProcessNotFound`](crate::Error::ProcessNotFound)
    /// if no such process exists.
    fn resolve(&self, pid: u32) -> impl std::future::Future<Output = Result<Self::Handle>> + Send;
}
