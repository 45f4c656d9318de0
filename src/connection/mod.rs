//! Connection management
//!
//! This module handles:
//! * Connection lifecycle (dial, session copies, close)
//! * Lifecycle state machine enforcement
//! * Diagnostic probes (server version, node role)

mod conn;
mod probe;
mod state;

pub use conn::{Connection, ConnectionConfig, ConnectionConfigBuilder, DIAL_TIMEOUT, SYNC_TIMEOUT};
pub use probe::NodeKind;
pub use state::ConnectionState;
