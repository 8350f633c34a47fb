//! Domain layer - Pure data models.
//!
//! These types have no I/O dependencies and can be tested in isolation.

mod connection;
mod record;

// Re-export all domain types
pub use connection::{AddressFamily, Connection, ConnectionState, Protocol, ProtocolSelection};
pub use record::{filter_records, PortRecord, RecordFilter};
