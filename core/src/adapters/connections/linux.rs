//! Linux connection source reading the kernel socket tables in procfs.
//!
//! Sockets come from `net/tcp`, `net/tcp6`, `net/udp` and `net/udp6`.
//! Owning processes are found by matching socket inodes against the
//! socket descriptors of every process under the same root.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use procfs::net::{TcpNetEntries, TcpState, UdpNetEntries};
use procfs::process::{all_processes_with_root, FDTarget};
use procfs::{current_system_info, FromReadSI, ProcError};
use tokio::fs;
use tracing::debug;

use crate::domain::{Connection, ConnectionState, Protocol, ProtocolSelection};
use crate::error::{Error, Result};
use crate::ports::ConnectionSource;

/// Kernel tables in the order they are read.
const TABLES: [(&str, Protocol); 4] = [
    ("tcp", Protocol::Tcp),
    ("tcp6", Protocol::Tcp),
    ("udp", Protocol::Udp),
    ("udp6", Protocol::Udp),
];

/// Linux-specific connection source.
pub struct ProcfsConnectionSource {
    root: PathBuf,
    selection: ProtocolSelection,
}

impl ProcfsConnectionSource {
    /// Create a source reading the live `/proc`.
    pub fn new() -> Self {
        Self::with_root("/proc")
    }

    /// Create a source reading a procfs tree rooted at `root`.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            selection: ProtocolSelection::All,
        }
    }

    /// Restrict the tables that are read.
    pub fn with_selection(mut self, selection: ProtocolSelection) -> Self {
        self.selection = selection;
        self
    }

    /// Read and parse one socket table, or `None` if the kernel does not
    /// provide it.
    async fn read_table(&self, name: &str, protocol: Protocol) -> Result<Option<Vec<Socket>>> {
        let path = self.root.join("net").join(name);
        let content = match fs::read(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "socket table not present, skipping");
                return Ok(None);
            }
            Err(e) if e.kind() == ErrorKind::PermissionDenied => {
                return Err(Error::PermissionDenied(format!(
                    "cannot read {}: {}",
                    path.display(),
                    e
                )));
            }
            Err(e) => return Err(e.into()),
        };

        let sockets = match protocol {
            Protocol::Tcp => TcpNetEntries::from_read(content.as_slice(), current_system_info())
                .map_err(|e| table_error(&path, e))?
                .0
                .into_iter()
                .map(|entry| Socket {
                    local: entry.local_address,
                    remote: entry.remote_address,
                    state: tcp_state(entry.state),
                    inode: entry.inode,
                })
                .collect(),
            // Connectionless sockets have no meaningful state
            Protocol::Udp => UdpNetEntries::from_read(content.as_slice(), current_system_info())
                .map_err(|e| table_error(&path, e))?
                .0
                .into_iter()
                .map(|entry| Socket {
                    local: entry.local_address,
                    remote: entry.remote_address,
                    state: ConnectionState::None,
                    inode: entry.inode,
                })
                .collect(),
        };

        Ok(Some(sockets))
    }

    /// Map every socket inode to the process holding it.
    ///
    /// Processes whose descriptors cannot be read (other users, or exited
    /// mid-scan) are skipped, leaving their sockets unattributed. When
    /// several processes share a socket the lowest PID wins.
    fn socket_owners(&self) -> Result<HashMap<u64, u32>> {
        let mut owners: HashMap<u64, u32> = HashMap::new();
        let processes =
            all_processes_with_root(&self.root).map_err(|e| table_error(&self.root, e))?;

        for process in processes.flatten() {
            let Ok(pid) = u32::try_from(process.pid()) else {
                continue;
            };
            let Ok(fds) = process.fd() else {
                continue;
            };

            for fd in fds.flatten() {
                if let FDTarget::Socket(inode) = fd.target {
                    if inode == 0 {
                        continue;
                    }
                    owners
                        .entry(inode)
                        .and_modify(|owner| *owner = (*owner).min(pid))
                        .or_insert(pid);
                }
            }
        }

        Ok(owners)
    }
}

impl Default for ProcfsConnectionSource {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectionSource for ProcfsConnectionSource {
    async fn connections(&self) -> Result<Vec<Connection>> {
        let owners = self.socket_owners()?;
        debug!(sockets = owners.len(), "mapped socket inodes to processes");

        let mut connections = Vec::new();
        for (name, protocol) in TABLES {
            if !self.selection.includes(protocol) {
                continue;
            }
            if let Some(sockets) = self.read_table(name, protocol).await? {
                connections.extend(
                    sockets
                        .into_iter()
                        .map(|socket| socket.into_connection(protocol, &owners)),
                );
            }
        }

        Ok(connections)
    }
}

/// One row of a kernel socket table.
struct Socket {
    local: SocketAddr,
    remote: SocketAddr,
    state: ConnectionState,
    inode: u64,
}

impl Socket {
    fn into_connection(self, protocol: Protocol, owners: &HashMap<u64, u32>) -> Connection {
        let remote = if self.remote.ip().is_unspecified() && self.remote.port() == 0 {
            None
        } else {
            Some(self.remote)
        };

        let pid = match self.inode {
            0 => None,
            inode => owners.get(&inode).copied(),
        };

        Connection::new(
            protocol,
            self.local.ip(),
            self.local.port(),
            remote,
            self.state,
            pid,
        )
    }
}

fn tcp_state(state: TcpState) -> ConnectionState {
    match state {
        TcpState::Established => ConnectionState::Established,
        TcpState::SynSent => ConnectionState::SynSent,
        TcpState::SynRecv => ConnectionState::SynRecv,
        TcpState::FinWait1 => ConnectionState::FinWait1,
        TcpState::FinWait2 => ConnectionState::FinWait2,
        TcpState::TimeWait => ConnectionState::TimeWait,
        TcpState::Close => ConnectionState::Close,
        TcpState::CloseWait => ConnectionState::CloseWait,
        TcpState::LastAck => ConnectionState::LastAck,
        TcpState::Listen => ConnectionState::Listen,
        TcpState::Closing => ConnectionState::Closing,
        TcpState::NewSynRecv => ConnectionState::NewSynRecv,
        #[allow(unreachable_patterns)]
        _ => ConnectionState::None,
    }
}

fn table_error(path: &Path, err: ProcError) -> Error {
    match err {
        ProcError::NotFound(_) => Error::Io(std::io::Error::new(
            ErrorKind::NotFound,
            format!("{} not found", path.display()),
        )),
        ProcError::PermissionDenied(_) => {
            Error::PermissionDenied(format!("cannot read {}", path.display()))
        }
        ProcError::Io(e, _) => Error::Io(e),
        other => Error::ParseError(format!("{}: {}", path.display(), other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{IpAddr, Ipv4Addr};
    use std::os::unix::fs::symlink;
    use tempfile::tempdir;

    const HEADER: &str = "  sl  local_address rem_address   st tx_queue rx_queue tr tm->when retrnsmt   uid  timeout inode";

    fn tcp_table() -> String {
        format!(
            "{}\n{}\n{}\n{}\n",
            HEADER,
            "   0: 00000000:1F90 00000000:0000 0A 00000000:00000000 00:00000000 00000000     0        0 1111 1 0000000000000000 100 0 0 10 0",
            "   1: 00000000:0CEA 00000000:A1B2 01 00000000:00000000 00:00000000 00000000  1000        0 2222 1 0000000000000000 20 4 30 10 -1",
            "   2: 00000000:1F91 00000000:0000 0A 00000000:00000000 00:00000000 00000000  1000        0 0 1 0000000000000000 100 0 0 10 0",
        )
    }

    fn tcp6_table() -> String {
        format!(
            "{}\n{}\n",
            HEADER,
            "   0: 00000000000000000000000000000000:1F90 00000000000000000000000000000000:0000 0A 00000000:00000000 00:00000000 00000000     0        0 1111 1 0000000000000000 100 0 0 10 0",
        )
    }

    fn udp_table() -> String {
        format!(
            "{}\n{}\n",
            HEADER,
            "   5: 00000000:0035 00000000:0000 07 00000000:00000000 00:00000000 00000000     0        0 3333 2 0000000000000000 0",
        )
    }

    /// Build a procfs tree with one listening socket shared by pids 42 and 77.
    fn fake_procfs() -> tempfile::TempDir {
        let dir = tempdir().unwrap();
        let root = dir.path();

        std::fs::create_dir_all(root.join("net")).unwrap();
        std::fs::write(root.join("net/tcp"), tcp_table()).unwrap();
        std::fs::write(root.join("net/tcp6"), tcp6_table()).unwrap();

        std::fs::create_dir_all(root.join("42/fd")).unwrap();
        symlink("socket:[1111]", root.join("42/fd/3")).unwrap();
        symlink("/dev/null", root.join("42/fd/0")).unwrap();

        std::fs::create_dir_all(root.join("77/fd")).unwrap();
        symlink("socket:[1111]", root.join("77/fd/5")).unwrap();
        symlink("socket:[2222]", root.join("77/fd/6")).unwrap();

        // Non-process entries are ignored
        std::fs::create_dir_all(root.join("sys")).unwrap();

        dir
    }

    #[test]
    fn test_tcp_state_mapping() {
        assert_eq!(tcp_state(TcpState::Listen), ConnectionState::Listen);
        assert_eq!(tcp_state(TcpState::Established), ConnectionState::Established);
        assert_eq!(tcp_state(TcpState::TimeWait), ConnectionState::TimeWait);
    }

    #[test]
    fn test_socket_owners() {
        let dir = fake_procfs();
        let source = ProcfsConnectionSource::with_root(dir.path());

        let owners = source.socket_owners().unwrap();
        // Shared socket goes to the lowest pid
        assert_eq!(owners.get(&1111), Some(&42));
        assert_eq!(owners.get(&2222), Some(&77));
        assert_eq!(owners.len(), 2);
    }

    #[tokio::test]
    async fn test_connections_from_procfs() {
        let dir = fake_procfs();
        let source = ProcfsConnectionSource::with_root(dir.path());

        let conns = source.connections().await.unwrap();
        // tcp (3 rows) then tcp6 (1 row); udp tables are absent
        assert_eq!(conns.len(), 4);

        assert_eq!(conns[0].local_port, 8080);
        assert_eq!(conns[0].local_addr, IpAddr::V4(Ipv4Addr::UNSPECIFIED));
        assert_eq!(conns[0].state, ConnectionState::Listen);
        assert_eq!(conns[0].remote, None);
        assert_eq!(conns[0].pid, Some(42));

        assert_eq!(conns[1].local_port, 3306);
        assert_eq!(conns[1].state, ConnectionState::Established);
        assert_eq!(
            conns[1].remote,
            Some(SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 0xA1B2))
        );
        assert_eq!(conns[1].pid, Some(77));

        // Inode 0 is never attributed
        assert_eq!(conns[2].pid, None);

        assert!(conns[3].local_addr.is_ipv6());
        assert_eq!(conns[3].local_port, 8080);
        assert!(conns[3].is_listening());
        assert_eq!(conns[3].pid, Some(42));
    }

    #[tokio::test]
    async fn test_udp_sockets_have_no_state() {
        let dir = fake_procfs();
        std::fs::write(dir.path().join("net/udp"), udp_table()).unwrap();
        let source =
            ProcfsConnectionSource::with_root(dir.path()).with_selection(ProtocolSelection::Udp);

        let conns = source.connections().await.unwrap();
        assert_eq!(conns.len(), 1);
        assert_eq!(conns[0].protocol, Protocol::Udp);
        assert_eq!(conns[0].local_port, 53);
        assert_eq!(conns[0].state, ConnectionState::None);
        assert!(!conns[0].is_listening());
    }

    #[tokio::test]
    async fn test_selection_skips_tables() {
        let dir = fake_procfs();
        let source =
            ProcfsConnectionSource::with_root(dir.path()).with_selection(ProtocolSelection::Udp);

        let conns = source.connections().await.unwrap();
        assert!(conns.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_table_is_an_error() {
        let dir = fake_procfs();
        std::fs::write(
            dir.path().join("net/tcp"),
            format!("{}\n   0: garbage\n", HEADER),
        )
        .unwrap();
        let source = ProcfsConnectionSource::with_root(dir.path());

        let err = source.connections().await.unwrap_err();
        assert!(!err.is_process_not_found());
    }

    #[tokio::test]
    async fn test_missing_root_is_an_error() {
        let dir = tempdir().unwrap();
        let source = ProcfsConnectionSource::with_root(dir.path().join("missing"));
        assert!(source.connections().await.is_err());
    }
}
