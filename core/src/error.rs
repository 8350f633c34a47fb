//! Error types for the portmem-core library.

use thiserror::Error;

/// Result type alias for portmem operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while enumerating sockets and querying processes.
#[derive(Error, Debug)]
pub enum Error {
    /// The process exited between socket enumeration and lookup.
    ///
    /// This is the only error the inspector recovers from.
    #[error("Process with PID {0} not found")]
    ProcessNotFound(u32),

    /// Failed to execute a system command.
    #[error("Command execution failed: {0}")]
    CommandFailed(String),

    /// Failed to parse command output or a kernel table.
    #[error("Failed to parse output: {0}")]
    ParseError(String),

    /// Permission denied for an operation.
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Platform not supported.
    #[error("Platform not supported: {0}")]
    UnsupportedPlatform(String),
}

impl Error {
    /// Whether this error means the process is gone.
    pub fn is_process_not_found(&self) -> bool {
        matches!(self, Error::ProcessNotFound(_))
    }

    /// Map an I/O error on a per-process file.
    ///
    /// `NotFound` and `ESRCH` both mean the process is gone and become
    /// [`Error::ProcessNotFound`].
    #[cfg_attr(not(target_os = "linux"), allow(dead_code))]
    pub(crate) fn from_process_io(pid: u32, err: std::io::Error) -> Self {
        if err.raw_os_error() == Some(libc::ESRCH) {
            return Error::ProcessNotFound(pid);
        }
        match err.kind() {
            std::io::ErrorKind::NotFound => Error::ProcessNotFound(pid),
            std::io::ErrorKind::PermissionDenied => {
                Error::PermissionDenied(format!("process {}: {}", pid, err))
            }
            _ => Error::Io(err),
        }
    }

    /// Map a procfs error raised while reading a process.
    #[cfg(target_os = "linux")]
    pub(crate) fn from_proc_error(pid: u32, err: procfs::ProcError) -> Self {
        use procfs::ProcError;

        match err {
            ProcError::NotFound(_) => Error::ProcessNotFound(pid),
            ProcError::PermissionDenied(path) => Error::PermissionDenied(match path {
                Some(path) => format!("process {}: {}", pid, path.display()),
                None => format!("process {}", pid),
            }),
            ProcError::Io(e, _) => Error::from_process_io(pid, e),
            other => Error::ParseError(format!("process {}: {}", pid, other)),
        }
    }
}
