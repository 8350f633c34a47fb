//! Listening-port inspection service.

use tracing::{debug, trace};

use crate::domain::{filter_records, Connection, PortRecord, RecordFilter};
use crate::error::{Error, Result};
use crate::ports::{ConnectionSource, ProcessHandle, ProcessRegistry};

/// Application service mapping listening sockets to their owning processes.
///
/// The service uses the `ConnectionSource` and `ProcessRegistry` traits,
/// allowing different implementations to be injected.
pub struct PortInspector<C: ConnectionSource, R: ProcessRegistry> {
    connections: C,
    processes: R,
}

impl<C: ConnectionSource, R: ProcessRegistry> PortInspector<C, R> {
    /// Create a new inspector over the given collaborators.
    pub fn new(connections: C, processes: R) -> Self {
        Self {
            connections,
            processes,
        }
    }

    /// Produce one record per listening socket whose owner can be queried.
    ///
    /// Records follow the connection source's enumeration order and are not
    /// deduplicated. A process that exits before it can be queried is
    /// skipped; any other failure aborts the inspection.
    pub async fn inspect(&self) -> Result<Vec<PortRecord>> {
        let connections = self.connections.connections().await?;
        let listening: Vec<&Connection> =
            connections.iter().filter(|c| c.is_listening()).collect();
        debug!(
            total = connections.len(),
            listening = listening.len(),
            "enumerated sockets"
        );

        let mut records = Vec::with_capacity(listening.len());
        for conn in listening {
            let Some(pid) = conn.pid else {
                trace!(port = conn.local_port, "listening socket has no known owner, skipping");
                continue;
            };

            match self.query(conn.local_port, pid).await {
                Ok(record) => records.push(record),
                Err(Error::ProcessNotFound(pid)) => {
                    trace!(port = conn.local_port, pid, "process vanished, skipping");
                }
                Err(e) => return Err(e),
            }
        }

        Ok(records)
    }

    /// Inspect, then keep only records matching `filter`.
    pub async fn inspect_filtered(&self, filter: &RecordFilter) -> Result<Vec<PortRecord>> {
        let records = self.inspect().await?;
        Ok(filter_records(records, filter))
    }

    async fn query(&self, port: u16, pid: u32) -> Result<PortRecord> {
        let process = self.processes.resolve(pid).await?;
        let name = process.name().await?;
        let memory_usage = process.memory_percent().await?;
        Ok(PortRecord::new(port, name, memory_usage))
    }
}
