//! Session management and topology probing for MongoDB.
//!
//! A thin shim over the [`mongodb`] driver: dial a deployment once, hand
//! out independent session copies from behind a lock, and answer two
//! diagnostic questions about the node on the other end: its server
//! version and its role in the topology. Everything hard (wire protocol,
//! authentication, replica-set and mongos discovery, failover) stays in
//! the driver.
//!
//! # Example
//!
//! ```no_run
//! # async fn example() -> mongoprobe::Result<()> {
//! use mongoprobe::Connection;
//!
//! let conn = Connection::connect("mongodb://localhost:27017").await?;
//!
//! println!("version: {}", conn.server_version().await?);
//! println!("role:    {}", conn.node_type().await?);
//!
//! // Copies are owned by the caller and share the driver's pool.
//! let session = conn.session().expect("session present after connect");
//! drop(session);
//!
//! conn.close().await;
//! # Ok(())
//! # }
//! ```

pub mod connection;
mod error;
pub mod metrics;

pub use connection::{
    Connection, ConnectionConfig, ConnectionConfigBuilder, ConnectionState, NodeKind,
};
pub use error::{Error, Result};

// Session handles are driver clients, so the driver is part of this
// crate's public surface; re-export it for downstream use.
pub use mongodb;
