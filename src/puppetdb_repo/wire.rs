// PuppetDB v3 response payloads and query strings.

use crate::models::{Event, EventStatus, Node, ResourceKey, Run};
use chrono::{DateTime, Utc};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub(crate) struct NodeRecord {
    pub name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub(crate) struct ReportRecord {
    pub hash: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub(crate) struct EventRecord {
    pub status: String,
    pub resource_type: String,
    pub resource_title: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct FactRecord {
    pub value: serde_json::Value,
}

impl From<NodeRecord> for Node {
    fn from(r: NodeRecord) -> Self {
        Node::new(r.name)
    }
}

impl From<ReportRecord> for Run {
    /// Clock skew can put end before start; that run counts as zero duration.
    fn from(r: ReportRecord) -> Self {
        let run_time = (r.end_time - r.start_time).to_std().unwrap_or_default();
        Run {
            id: r.hash,
            start: r.start_time,
            run_time,
        }
    }
}

impl From<EventRecord> for Event {
    fn from(r: EventRecord) -> Self {
        Event {
            status: EventStatus::from_puppetdb(&r.status),
            resource: ResourceKey::new(r.resource_type, r.resource_title),
        }
    }
}

impl FactRecord {
    /// Structured fact values are tallied by their JSON text.
    pub(crate) fn into_value_string(self) -> String {
        match self.value {
            serde_json::Value::String(s) => s,
            other => other.to_string(),
        }
    }
}

/// `["=", field, value]`
pub(crate) fn equals_query(field: &str, value: &str) -> String {
    serde_json::json!(["=", field, value]).to_string()
}

/// Newest reports first.
pub(crate) fn reports_order_by() -> String {
    serde_json::json!([{ "field": "start-time", "order": "desc" }]).to_string()
}
