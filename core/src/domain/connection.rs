//! Socket and connection domain models.

use std::net::{IpAddr, SocketAddr};

use serde::{Deserialize, Serialize};

// ============================================================================
// Protocol
// ============================================================================

/// Transport protocol of a socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Tcp,
    Udp,
}

impl std::fmt::Display for Protocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Protocol::Tcp => write!(f, "tcp"),
            Protocol::Udp => write!(f, "udp"),
        }
    }
}

/// Which protocols to enumerate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProtocolSelection {
    #[default]
    All,
    Tcp,
    Udp,
}

impl ProtocolSelection {
    /// Whether sockets of `protocol` are part of this selection.
    pub fn includes(&self, protocol: Protocol) -> bool {
        match self {
            ProtocolSelection::All => true,
            ProtocolSelection::Tcp => protocol == Protocol::Tcp,
            ProtocolSelection::Udp => protocol == Protocol::Udp,
        }
    }
}

impl std::str::FromStr for ProtocolSelection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "all" => Ok(ProtocolSelection::All),
            "tcp" => Ok(ProtocolSelection::Tcp),
            "udp" => Ok(ProtocolSelection::Udp),
            other => Err(format!("unknown protocol selection: {}", other)),
        }
    }
}

// ============================================================================
// AddressFamily
// ============================================================================

/// IP address family of a socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AddressFamily {
    Ipv4,
    Ipv6,
}

impl From<&IpAddr> for AddressFamily {
    fn from(addr: &IpAddr) -> Self {
        match addr {
            IpAddr::V4(_) => AddressFamily::Ipv4,
            IpAddr::V6(_) => AddressFamily::Ipv6,
        }
    }
}

// ============================================================================
// ConnectionState
// ============================================================================

/// State of a socket as reported by the host.
///
/// Connectionless sockets (UDP) always report [`ConnectionState::None`], so
/// only TCP sockets can ever be listening.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConnectionState {
    Established,
    SynSent,
    SynRecv,
    FinWait1,
    FinWait2,
    TimeWait,
    Close,
    CloseWait,
    LastAck,
    Listen,
    Closing,
    NewSynRecv,
    None,
}

impl ConnectionState {
    /// Map an `lsof` state name, e.g. `LISTEN` or `CLOSE_WAIT`.
    pub fn from_lsof_name(name: &str) -> Self {
        match name {
            "ESTABLISHED" => ConnectionState::Established,
            "SYN_SENT" => ConnectionState::SynSent,
            "SYN_RECV" | "SYN_RECEIVED" => ConnectionState::SynRecv,
            "FIN_WAIT_1" => ConnectionState::FinWait1,
            "FIN_WAIT_2" => ConnectionState::FinWait2,
            "TIME_WAIT" => ConnectionState::TimeWait,
            "CLOSED" | "CLOSE" => ConnectionState::Close,
            "CLOSE_WAIT" => ConnectionState::CloseWait,
            "LAST_ACK" => ConnectionState::LastAck,
            "LISTEN" => ConnectionState::Listen,
            "CLOSING" => ConnectionState::Closing,
            _ => ConnectionState::None,
        }
    }

    /// Upper-case name, e.g. `LISTEN`.
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionState::Established => "ESTABLISHED",
            ConnectionState::SynSent => "SYN_SENT",
            ConnectionState::SynRecv => "SYN_RECV",
            ConnectionState::FinWait1 => "FIN_WAIT1",
            ConnectionState::FinWait2 => "FIN_WAIT2",
            ConnectionState::TimeWait => "TIME_WAIT",
            ConnectionState::Close => "CLOSE",
            ConnectionState::CloseWait => "CLOSE_WAIT",
            ConnectionState::LastAck => "LAST_ACK",
            ConnectionState::Listen => "LISTEN",
            ConnectionState::Closing => "CLOSING",
            ConnectionState::NewSynRecv => "NEW_SYN_RECV",
            ConnectionState::None => "NONE",
        }
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Connection
// ============================================================================

/// One socket as enumerated from the host.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Connection {
    /// Transport protocol.
    pub protocol: Protocol,
    /// Local bound address.
    pub local_addr: IpAddr,
    /// Local port.
    pub local_port: u16,
    /// Remote endpoint, absent for unconnected sockets.
    pub remote: Option<SocketAddr>,
    /// Socket state.
    pub state: ConnectionState,
    /// Owning process, when the host could attribute one.
    pub pid: Option<u32>,
}

impl Connection {
    /// Create a connection record.
    pub fn new(
        protocol: Protocol,
        local_addr: IpAddr,
        local_port: u16,
        remote: Option<SocketAddr>,
        state: ConnectionState,
        pid: Option<u32>,
    ) -> Self {
        Self {
            protocol,
            local_addr,
            local_port,
            remote,
            state,
            pid,
        }
    }

    /// Address family of the local address.
    pub fn family(&self) -> AddressFamily {
        AddressFamily::from(&self.local_addr)
    }

    /// Whether this socket is waiting for incoming connections.
    pub fn is_listening(&self) -> bool {
        self.state == ConnectionState::Listen
    }
}

impl std::fmt::Display for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {} {} (PID: {})",
            self.protocol,
            SocketAddr::new(self.local_addr, self.local_port),
            self.state,
            self.pid.map_or_else(|| "-".to_string(), |p| p.to_string())
        )
    }
}
