//! macOS process registry implementation using ps and sysctl.

use std::process::Stdio;

use tokio::process::Command;
use tokio::sync::OnceCell;

use crate::error::{Error, Result};
use crate::ports::{ProcessHandle, ProcessRegistry};

/// macOS-specific process registry.
pub struct PsRegistry {
    mem_total_bytes: OnceCell<u64>,
}

impl PsRegistry {
    /// Create a new macOS process registry.
    pub fn new() -> Self {
        Self {
            mem_total_bytes: OnceCell::new(),
        }
    }

    /// Physical memory size.
    ///
    /// Executes: `sysctl -n hw.memsize`
    async fn mem_total_bytes(&self) -> Result<u64> {
        let total = self
            .mem_total_bytes
            .get_or_try_init(|| async {
                let output = Command::new("/usr/sbin/sysctl")
                    .args(["-n", "hw.memsize"])
                    .stdout(Stdio::piped())
                    .stderr(Stdio::null())
                    .output()
                    .await
                    .map_err(|e| Error::CommandFailed(format!("Failed to run sysctl: {}", e)))?;

                let stdout = String::from_utf8_lossy(&output.stdout);
                match stdout.trim().parse::<u64>() {
                    Ok(total) if total > 0 => Ok(total),
                    _ => Err(Error::ParseError(format!(
                        "Unexpected hw.memsize value: {:?}",
                        stdout.trim()
                    ))),
                }
            })
            .await?;
        Ok(*total)
    }
}

impl Default for PsRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessRegistry for PsRegistry {
    type Handle = PsProcess;

    /// Look up a process with ps.
    ///
    /// Executes: `ps -o rss=,comm= -p <pid>`
    ///
    /// ps prints nothing (and exits non-zero) for an unknown PID.
    async fn resolve(&self, pid: u32) -> Result<PsProcess> {
        let mem_total_bytes = self.mem_total_bytes().await?;

        let pid_arg = pid.to_string();
        let output = Command::new("/bin/ps")
            .args(["-o", "rss=,comm=", "-p", pid_arg.as_str()])
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .output()
            .await
            .map_err(|e| Error::CommandFailed(format!("Failed to run ps: {}", e)))?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let Some(line) = stdout.lines().find(|l| !l.trim().is_empty()) else {
            return Err(Error::ProcessNotFound(pid));
        };

        let (rss_kb, name) = parse_ps_row(line)
            .ok_or_else(|| Error::ParseError(format!("Unexpected ps output: {:?}", line)))?;

        Ok(PsProcess {
            pid,
            name,
            rss_kb,
            mem_total_bytes,
        })
    }
}

/// A process snapshot taken at resolve time.
pub struct PsProcess {
    pid: u32,
    name: String,
    rss_kb: u64,
    mem_total_bytes: u64,
}

impl ProcessHandle for PsProcess {
    fn pid(&self) -> u32 {
        self.pid
    }

    async fn name(&self) -> Result<String> {
        Ok(self.name.clone())
    }

    async fn memory_percent(&self) -> Result<f64> {
        Ok((self.rss_kb * 1024) as f64 / self.mem_total_bytes as f64 * 100.0)
    }
}

/// Parse a `ps -o rss=,comm=` row into (rss in KiB, short name).
fn parse_ps_row(line: &str) -> Option<(u64, String)> {
    let mut parts = line.trim().splitn(2, char::is_whitespace);
    let rss_kb = parts.next()?.parse().ok()?;
    let comm = parts.next()?.trim();
    let name = comm.rsplit('/').next().unwrap_or(comm);
    if name.is_empty() {
        return None;
    }
    Some((rss_kb, name.to_string()))
}
