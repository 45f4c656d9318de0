//! Diagnostic probes: server version and node role

use mongodb::bson::{self, doc};
use serde::Deserialize;

use super::conn::Connection;
use crate::{metrics, Error, Result};

/// Role a deployment member reports through the `isMaster` probe
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// Replica-set member
    ReplSet,
    /// Sharded-cluster query router
    Mongos,
    /// Standalone server
    Mongod,
}

impl NodeKind {
    /// Canonical lowercase name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ReplSet => "replset",
            Self::Mongos => "mongos",
            Self::Mongod => "mongod",
        }
    }
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// isdbgrid is always the msg value when isMaster runs on a mongos
// see https://docs.mongodb.com/manual/core/sharded-cluster-query-router/
const MONGOS_MSG: &str = "isdbgrid";

/// `buildInfo` reply, reduced to the field the probe reports
#[derive(Debug, Deserialize)]
struct BuildInfoReply {
    version: String,
}

/// `isMaster` reply, reduced to the fields that drive classification
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TopologyReply {
    #[serde(default)]
    set_name: Option<String>,
    #[serde(default)]
    hosts: Option<Vec<String>>,
    #[serde(default)]
    msg: Option<String>,
}

/// Replica-set markers win over the mongos signature; a reply carrying
/// neither is a standalone mongod.
fn classify(reply: &TopologyReply) -> NodeKind {
    if reply.set_name.is_some() || reply.hosts.is_some() {
        NodeKind::ReplSet
    } else if reply.msg.as_deref() == Some(MONGOS_MSG) {
        NodeKind::Mongos
    } else {
        NodeKind::Mongod
    }
}

impl Connection {
    /// Server version string, from the `buildInfo` admin command.
    pub async fn server_version(&self) -> Result<String> {
        let session = self.live_session()?;
        let reply = session
            .database("admin")
            .run_command(doc! { "buildInfo": 1 })
            .await
            .map_err(|err| {
                tracing::error!(uri = %self.uri(), error = %err, "buildInfo command failed");
                metrics::counters::probe_failed(metrics::labels::COMMAND_BUILD_INFO);
                Error::Command(err)
            })?;
        let reply: BuildInfoReply = bson::from_document(reply).map_err(|source| Error::Reply {
            command: "buildInfo",
            source,
        })?;
        Ok(reply.version)
    }

    /// Role of the dialed node, from the `isMaster` admin command.
    pub async fn node_type(&self) -> Result<NodeKind> {
        let session = self.live_session()?;
        let reply = session
            .database("admin")
            .run_command(doc! { "isMaster": 1 })
            .await
            .map_err(|err| {
                tracing::error!(uri = %self.uri(), error = %err, "isMaster command failed");
                metrics::counters::probe_failed(metrics::labels::COMMAND_IS_MASTER);
                Error::Command(err)
            })?;
        let reply: TopologyReply = bson::from_document(reply).map_err(|source| Error::Reply {
            command: "isMaster",
            source,
        })?;
        Ok(classify(&reply))
    }
}
