//! Core connection type

use std::sync::Mutex;
use std::time::Duration;

use mongodb::bson::doc;
use mongodb::options::{ClientOptions, ReadPreference, SelectionCriteria};
use mongodb::Client;

use super::state::ConnectionState;
use crate::{metrics, Error, Result};

/// Window for the initial dial
pub const DIAL_TIMEOUT: Duration = Duration::from_secs(10);
/// Server selection window for operations issued after the dial
pub const SYNC_TIMEOUT: Duration = Duration::from_secs(60);

/// Connection configuration
///
/// Defaults: a direct (non-routed) connection, a 10 second dial window and
/// a 60 second server selection window. Per-socket I/O carries no
/// deadline, so an operation against a hung-but-connected server blocks
/// until server selection gives up.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Window for the initial dial
    pub dial_timeout: Duration,
    /// Server selection window for operations issued after the dial
    pub sync_timeout: Duration,
    /// Connect to the seed host only, bypassing topology-based routing
    pub direct: bool,
    /// Application name reported in the server log
    pub app_name: Option<String>,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            dial_timeout: DIAL_TIMEOUT,
            sync_timeout: SYNC_TIMEOUT,
            direct: true,
            app_name: None,
        }
    }
}

impl ConnectionConfig {
    /// Create a builder for overriding the defaults
    ///
    /// # Examples
    ///
    /// ```
    /// use std::time::Duration;
    /// use mongoprobe::ConnectionConfig;
    ///
    /// let config = ConnectionConfig::builder()
    ///     .dial_timeout(Duration::from_secs(3))
    ///     .app_name("my_exporter")
    ///     .build();
    /// ```
    pub fn builder() -> ConnectionConfigBuilder {
        ConnectionConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ConnectionConfig`]
#[derive(Debug, Clone)]
pub struct ConnectionConfigBuilder {
    config: ConnectionConfig,
}

impl ConnectionConfigBuilder {
    /// Set the window for the initial dial
    pub fn dial_timeout(mut self, duration: Duration) -> Self {
        self.config.dial_timeout = duration;
        self
    }

    /// Set the server selection window for post-dial operations
    pub fn sync_timeout(mut self, duration: Duration) -> Self {
        self.config.sync_timeout = duration;
        self
    }

    /// Connect to the seed host only (true) or route via the discovered
    /// topology (false)
    pub fn direct(mut self, direct: bool) -> Self {
        self.config.direct = direct;
        self
    }

    /// Set the application name reported in the server log
    pub fn app_name(mut self, name: impl Into<String>) -> Self {
        self.config.app_name = Some(name.into());
        self
    }

    /// Build the configuration
    pub fn build(self) -> ConnectionConfig {
        self.config
    }
}

/// One logical connection to a MongoDB server or cluster.
///
/// Owns a single driver handle behind a mutex and hands out independent
/// copies via [`session`](Connection::session). The internal handle is
/// never exposed directly; duplication under the lock is the concurrency
/// boundary.
pub struct Connection {
    uri: String,
    inner: Mutex<Inner>,
}

struct Inner {
    session: Option<Client>,
    state: ConnectionState,
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.lock().expect("connection mutex poisoned");
        f.debug_struct("Connection")
            .field("uri", &self.uri)
            .field("state", &inner.state)
            .field(
                "session",
                &if inner.session.is_some() {
                    "present"
                } else {
                    "absent"
                },
            )
            .finish()
    }
}

impl Connection {
    /// Dial a deployment with the default configuration.
    ///
    /// Returns an error if the connection string does not parse or the
    /// server cannot be reached within the dial window.
    pub async fn connect(uri: impl Into<String>) -> Result<Self> {
        Self::connect_with_config(uri, ConnectionConfig::default()).await
    }

    /// Dial a deployment with an explicit configuration.
    pub async fn connect_with_config(
        uri: impl Into<String>,
        config: ConnectionConfig,
    ) -> Result<Self> {
        let uri = uri.into();
        let session = dial(&uri, &config).await?;
        tracing::debug!(uri = %uri, "connection established");
        Ok(Self {
            uri,
            inner: Mutex::new(Inner {
                session: Some(session),
                state: ConnectionState::Live,
            }),
        })
    }

    /// Best-effort dial: never fails loudly.
    ///
    /// On any construction failure this logs at error severity and yields
    /// a `Connection` whose session slot is empty; callers must check
    /// [`session`](Connection::session) before use. Prefer
    /// [`connect`](Connection::connect), which cannot hand back a dead
    /// connection silently.
    pub async fn connect_lenient(uri: impl Into<String>) -> Self {
        Self::connect_lenient_with_config(uri, ConnectionConfig::default()).await
    }

    /// Best-effort dial with an explicit configuration.
    pub async fn connect_lenient_with_config(
        uri: impl Into<String>,
        config: ConnectionConfig,
    ) -> Self {
        let uri = uri.into();
        match Self::connect_with_config(uri.clone(), config).await {
            Ok(conn) => conn,
            Err(err) => {
                tracing::error!(uri = %uri, error = %err, "cannot connect to server");
                Self {
                    uri,
                    inner: Mutex::new(Inner {
                        session: None,
                        state: ConnectionState::Uninitialized,
                    }),
                }
            }
        }
    }

    /// Connection string this connection was dialed with
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Current lifecycle state
    pub fn state(&self) -> ConnectionState {
        self.inner.lock().expect("connection mutex poisoned").state
    }

    /// Hand out an independent copy of the session handle.
    ///
    /// Returns `None` if no session was ever established or the connection
    /// is closed. The copy shares the driver's connection pool with the
    /// internal handle but is owned by the caller; dropping it releases
    /// only the caller's claim.
    pub fn session(&self) -> Option<Client> {
        let inner = self.inner.lock().expect("connection mutex poisoned");
        let copy = inner.session.clone();
        if copy.is_some() {
            metrics::counters::session_copied();
        }
        copy
    }

    /// Clone of the internal handle for the diagnostic probes.
    pub(crate) fn live_session(&self) -> Result<Client> {
        let inner = self.inner.lock().expect("connection mutex poisoned");
        inner.session.clone().ok_or(Error::NoSession)
    }

    /// Release the internal session.
    ///
    /// Idempotent: the first call takes the handle out of the slot and
    /// shuts the driver client down; later calls find the slot empty and
    /// do nothing. Shutdown state is shared with any copies still
    /// outstanding: after `close()` their next operation errors instead
    /// of blocking on a dead pool.
    pub async fn close(&self) {
        let taken = {
            let mut inner = self.inner.lock().expect("connection mutex poisoned");
            inner
                .state
                .transition(ConnectionState::Closed)
                .expect("close is valid from every state");
            inner.session.take()
        };
        if let Some(session) = taken {
            session.shutdown().await;
            tracing::debug!(uri = %self.uri, "connection closed");
        }
    }
}

/// Parse the URI, build the client, and force the dial.
async fn dial(uri: &str, config: &ConnectionConfig) -> Result<Client> {
    metrics::counters::dial_attempted();

    let mut options = ClientOptions::parse(uri).await.map_err(|err| {
        metrics::counters::dial_failed(metrics::labels::REASON_URI);
        Error::Uri(err)
    })?;

    options.direct_connection = Some(config.direct);
    options.connect_timeout = Some(config.dial_timeout);
    options.server_selection_timeout = Some(config.sync_timeout);
    options.app_name = config.app_name.clone();
    // Reads may land on any reachable member; the driver retries them once.
    options.retry_reads = Some(true);
    options.selection_criteria = Some(SelectionCriteria::ReadPreference(
        ReadPreference::Nearest {
            options: Default::default(),
        },
    ));

    let session = Client::with_options(options).map_err(|err| {
        metrics::counters::dial_failed(metrics::labels::REASON_URI);
        Error::Uri(err)
    })?;

    // The driver connects lazily. Force the dial now so an unreachable
    // server is reported by the constructor, not by the first command.
    let admin = session.database("admin");
    let ping = admin.run_command(doc! { "ping": 1 });
    match tokio::time::timeout(config.dial_timeout, ping).await {
        Ok(Ok(_)) => Ok(session),
        Ok(Err(err)) => {
            metrics::counters::dial_failed(metrics::labels::REASON_DIAL);
            Err(Error::Dial(err))
        }
        Err(_) => {
            metrics::counters::dial_failed(metrics::labels::REASON_TIMEOUT);
            Err(Error::DialTimeout(config.dial_timeout))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = ConnectionConfig::default();

        assert_eq!(config.dial_timeout, Duration::from_secs(10));
        assert_eq!(config.sync_timeout, Duration::from_secs(60));
        assert!(config.direct);
        assert!(config.app_name.is_none());
    }

    #[test]
    fn test_config_builder_fluent() {
        let config = ConnectionConfig::builder()
            .dial_timeout(Duration::from_secs(3))
            .sync_timeout(Duration::from_secs(30))
            .direct(false)
            .app_name("probe_test")
            .build();

        assert_eq!(config.dial_timeout, Duration::from_secs(3));
        assert_eq!(config.sync_timeout, Duration::from_secs(30));
        assert!(!config.direct);
        assert_eq!(config.app_name, Some("probe_test".to_string()));
    }

    #[tokio::test]
    async fn test_connect_rejects_bad_uri() {
        let err = Connection::connect("definitely not a uri")
            .await
            .expect_err("parse must fail");
        assert!(matches!(err, Error::Uri(_)));
    }

    #[tokio::test]
    async fn test_lenient_connect_bad_uri_yields_absent_session() {
        let conn = Connection::connect_lenient("definitely not a uri").await;

        assert!(conn.session().is_none());
        assert_eq!(conn.state(), ConnectionState::Uninitialized);
        assert_eq!(conn.uri(), "definitely not a uri");
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let conn = lazy_connection().await;
        assert!(conn.session().is_some());

        conn.close().await;
        assert_eq!(conn.state(), ConnectionState::Closed);
        assert!(conn.session().is_none());

        // Second close finds an empty slot and does nothing.
        conn.close().await;
        assert_eq!(conn.state(), ConnectionState::Closed);
        assert!(conn.session().is_none());
    }

    #[tokio::test]
    async fn test_close_on_absent_session_is_safe() {
        let conn = Connection::connect_lenient("definitely not a uri").await;
        conn.close().await;
        assert_eq!(conn.state(), ConnectionState::Closed);
        assert!(conn.session().is_none());
    }

    #[tokio::test]
    async fn test_session_copies_are_independent() {
        let conn = lazy_connection().await;

        let first = conn.session().expect("first copy");
        let second = conn.session().expect("second copy");

        // Dropping one copy leaves the other and the internal handle intact.
        drop(first);
        let _ = second.database("admin");
        assert!(conn.session().is_some());
    }

    /// Build a `Live` connection without touching the network: the driver
    /// hands out clients lazily, so no server is needed until a command
    /// actually runs.
    async fn lazy_connection() -> Connection {
        let options = ClientOptions::parse("mongodb://localhost:27017")
            .await
            .expect("parse uri");
        let session = Client::with_options(options).expect("client");
        Connection {
            uri: "mongodb://localhost:27017".to_string(),
            inner: Mutex::new(Inner {
                session: Some(session),
                state: ConnectionState::Live,
            }),
        }
    }
}
