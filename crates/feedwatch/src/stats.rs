//! Read-only reporting view over a registry snapshot.

use serde::{Deserialize, Serialize};
use serde_json::ser::{PrettyFormatter, Serializer};

use crate::client::ClientSnapshot;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsEntry {
    pub email: String,
    pub client: String,
    pub interval: u64,
    /// Unix seconds of the last accepted ping.
    pub last_ping: Option<i64>,
    pub online: bool,
}

impl From<ClientSnapshot> for StatsEntry {
    fn from(snapshot: ClientSnapshot) -> Self {
        Self {
            email: snapshot.key.email,
            client: snapshot.key.client,
            interval: snapshot.interval_seconds,
            last_ping: Some(snapshot.last_ping.timestamp()),
            online: snapshot.online,
        }
    }
}

/// `{"data": [...]}` document served on the stats endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsReport {
    pub data: Vec<StatsEntry>,
}

impl From<Vec<ClientSnapshot>> for StatsReport {
    fn from(snapshots: Vec<ClientSnapshot>) -> Self {
        Self { data: snapshots.into_iter().map(StatsEntry::from).collect() }
    }
}

impl StatsReport {
    /// Pretty JSON with four-space indentation.
    pub fn to_pretty_json(&self) -> serde_json::Result<String> {
        let mut out = Vec::new();
        let mut serializer = Serializer::with_formatter(&mut out, PrettyFormatter::with_indent(b"    "));
        self.serialize(&mut serializer)?;
        // serde_json only ever writes valid UTF-8
        Ok(String::from_utf8_lossy(&out).into_owned())
    }
}
