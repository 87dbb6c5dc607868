//! Fleet status model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One managed llama-server entry as reported by `status --json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusRecord {
    /// Unique entry name
    pub name: String,

    /// Present only while the process is running
    #[serde(rename = "pid", default, skip_serializing_if = "Option::is_none")]
    pub process_id: Option<u32>,

    pub host: String,

    pub port: u16,

    /// Reachability as judged by the manager's health check
    pub up: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_status: Option<u16>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// How the process was launched (e.g. "direct", "launchd", "stopped")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_path: Option<PathBuf>,
}

impl StatusRecord {
    pub fn new(name: impl Into<String>, host: impl Into<String>, port: u16, up: bool) -> Self {
        Self {
            name: name.into(),
            process_id: None,
            host: host.into(),
            port,
            up,
            latency_ms: None,
            http_status: None,
            version: None,
            mode: None,
            log_path: None,
        }
    }

    /// `host:port` as shown in the menu
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Immutable, ordered result of one successful status query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FleetSnapshot {
    records: Vec<StatusRecord>,
    captured_at: DateTime<Utc>,
}

impl FleetSnapshot {
    /// Records keep the order the manager reported them in.
    pub fn new(records: Vec<StatusRecord>) -> Self {
        Self::captured(records, Utc::now())
    }

    pub fn captured(records: Vec<StatusRecord>, captured_at: DateTime<Utc>) -> Self {
        Self {
            records,
            captured_at,
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    pub fn records(&self) -> &[StatusRecord] {
        &self.records
    }

    pub fn iter(&self) -> impl Iterator<Item = &StatusRecord> {
        self.records.iter()
    }

    pub fn get(&self, name: &str) -> Option<&StatusRecord> {
        self.records.iter().find(|r| r.name == name)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }

    /// Number of entries the manager reports as up
    pub fn up_count(&self) -> usize {
        self.records.iter().filter(|r| r.up).count()
    }
}
