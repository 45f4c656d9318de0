//! Dial a deployment and print its server version and node role.
//!
//! Usage: cargo run --example topology_probe [uri]

use mongoprobe::Connection;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> mongoprobe::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let uri = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "mongodb://localhost:27017".to_string());

    let conn = Connection::connect(uri.as_str()).await?;

    println!("server version: {}", conn.server_version().await?);
    println!("node type:      {}", conn.node_type().await?);

    conn.close().await;
    Ok(())
}
