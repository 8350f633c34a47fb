//! macOS connection source implementation using lsof.

use std::net::SocketAddr;
use std::process::Stdio;

use tokio::process::Command;
use tracing::debug;

use crate::domain::{AddressFamily, Connection, ConnectionState, Protocol, ProtocolSelection};
use crate::error::{Error, Result};
use crate::ports::ConnectionSource;

use super::utils::Utils;

/// macOS-specific connection source using lsof.
pub struct LsofConnectionSource {
    selection: ProtocolSelection,
}

impl LsofConnectionSource {
    /// Create a new macOS connection source.
    pub fn new() -> Self {
        Self {
            selection: ProtocolSelection::All,
        }
    }

    /// Restrict the protocols that are listed.
    pub fn with_selection(mut self, selection: ProtocolSelection) -> Self {
        self.selection = selection;
        self
    }

    fn args(&self) -> Vec<&'static str> {
        // -n: Show IP addresses (don't resolve to hostnames)
        // -P: Show port numbers (don't resolve to service names)
        // +c 0: Show full command name (unlimited length)
        let mut args = vec!["-n", "-P", "+c", "0"];
        if self.selection.includes(Protocol::Tcp) {
            args.push("-iTCP");
        }
        if self.selection.includes(Protocol::Udp) {
            args.push("-iUDP");
        }
        args
    }
}

impl Default for LsofConnectionSource {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectionSource for LsofConnectionSource {
    /// List sockets using lsof.
    ///
    /// Executes: `lsof -n -P +c 0 -iTCP -iUDP`
    ///
    /// lsof exits with status 1 when nothing matched, so an empty output is
    /// treated as "no sockets" rather than a failure.
    async fn connections(&self) -> Result<Vec<Connection>> {
        let output = Command::new("/usr/sbin/lsof")
            .args(self.args())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .output()
            .await
            .map_err(|e| Error::CommandFailed(format!("Failed to run lsof: {}", e)))?;

        let stdout = String::from_utf8(output.stdout)
            .map_err(|e| Error::ParseError(format!("Invalid UTF-8 in lsof output: {}", e)))?;

        if !output.status.success() && !stdout.trim().is_empty() {
            return Err(Error::CommandFailed(format!(
                "lsof exited with {}",
                output.status
            )));
        }

        let connections = parse_lsof_output(&stdout);
        debug!(count = connections.len(), "parsed lsof output");
        Ok(connections)
    }
}

/// Parse lsof output into connections.
///
/// Expected lsof output format:
/// ```text
/// COMMAND    PID  USER   FD   TYPE             DEVICE SIZE/OFF NODE NAME
/// node     34805  code   19u  IPv6 0x3d8015e195af1f3f      0t0  TCP [::1]:3000 (LISTEN)
/// mDNSResp   321  root    8u  IPv4 0x1234567890abcdef      0t0  UDP *:5353
/// ```
fn parse_lsof_output(output: &str) -> Vec<Connection> {
    let mut connections = Vec::new();

    // Skip header line
    for line in output.lines().skip(1) {
        let components: Vec<&str> = line.split_whitespace().collect();
        if components.len() < 9 {
            continue;
        }

        let pid: u32 = match components[1].parse() {
            Ok(p) => p,
            Err(_) => continue,
        };

        let family = match components[4] {
            "IPv4" => AddressFamily::Ipv4,
            "IPv6" => AddressFamily::Ipv6,
            _ => continue,
        };

        // The protocol column sits right before NAME
        let Some(proto_idx) = components
            .iter()
            .skip(5)
            .position(|c| *c == "TCP" || *c == "UDP")
            .map(|i| i + 5)
        else {
            continue;
        };
        let protocol = if components[proto_idx] == "TCP" {
            Protocol::Tcp
        } else {
            Protocol::Udp
        };

        let Some(name) = components.get(proto_idx + 1) else {
            continue;
        };
        let (local, remote) = match name.split_once("->") {
            Some((l, r)) => (l, Some(r)),
            None => (*name, None),
        };

        let Some((local_addr, local_port)) = Utils::parse_address(local, family) else {
            continue;
        };
        let remote = remote
            .and_then(|r| Utils::parse_address(r, family))
            .map(|(addr, port)| SocketAddr::new(addr, port));

        let state = match (protocol, components.get(proto_idx + 2)) {
            (Protocol::Tcp, Some(s)) => {
                ConnectionState::from_lsof_name(s.trim_start_matches('(').trim_end_matches(')'))
            }
            _ => ConnectionState::None,
        };

        connections.push(Connection::new(
            protocol,
            local_addr,
            local_port,
            remote,
            state,
            Some(pid),
        ));
    }

    connections
}
