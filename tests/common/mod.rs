// Shared test helpers: an in-memory Inventory and record builders.
#![allow(dead_code)]

use chrono::{DateTime, Utc};
use puppetdb_daily_report::models::*;
use puppetdb_daily_report::puppetdb_repo::{Inventory, InventoryError};
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

pub fn ts(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
}

pub fn run(id: &str, start: DateTime<Utc>, secs: u64) -> Run {
    Run {
        id: id.to_string(),
        start,
        run_time: Duration::from_secs(secs),
    }
}

pub fn event(status: &str, resource_type: &str, title: &str) -> Event {
    Event {
        status: EventStatus::from_puppetdb(status),
        resource: ResourceKey::new(resource_type, title),
    }
}

pub fn key(s: &str) -> ResourceKey {
    s.parse().unwrap()
}

/// A node aggregate with the given run counters and no resources.
pub fn node_agg(run_count: u64, with_failures: u64, with_changes: u64, with_skips: u64) -> WindowAggregate {
    WindowAggregate {
        reports: Some(RunCounters {
            run_count: Some(run_count),
            with_failures,
            with_changes,
            with_skips,
            ..RunCounters::default()
        }),
        resources: ResourceOutcomes::default(),
    }
}

/// In-memory inventory. Unknown metrics fail with HTTP 404; unknown nodes and runs are empty.
/// `fail_runs_for` (node name) and `fail_events_for` (run id) make those fetches fail with 500.
#[derive(Default)]
pub struct FakeInventory {
    pub nodes: Vec<Node>,
    pub runs: HashMap<String, Vec<Run>>,
    pub events: HashMap<String, Vec<Event>>,
    pub metrics: HashMap<String, serde_json::Value>,
    pub facts: HashMap<String, Vec<String>>,
    pub fail_runs_for: Option<String>,
    pub fail_events_for: Option<String>,
    pub node_calls: AtomicUsize,
    pub run_calls: AtomicUsize,
    pub events_requested: Mutex<Vec<String>>,
}

impl FakeInventory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_node(mut self, name: &str, runs: Vec<Run>) -> Self {
        self.nodes.push(Node::new(name));
        self.runs.insert(name.to_string(), runs);
        self
    }

    pub fn with_events(mut self, run_id: &str, events: Vec<Event>) -> Self {
        self.events.insert(run_id.to_string(), events);
        self
    }

    pub fn with_metric(mut self, path: &str, value: serde_json::Value) -> Self {
        self.metrics.insert(path.to_string(), value);
        self
    }

    pub fn with_fact(mut self, name: &str, values: &[&str]) -> Self {
        self.facts
            .insert(name.to_string(), values.iter().map(|v| v.to_string()).collect());
        self
    }

    pub fn node_calls(&self) -> usize {
        self.node_calls.load(Ordering::SeqCst)
    }

    pub fn run_calls(&self) -> usize {
        self.run_calls.load(Ordering::SeqCst)
    }

    pub fn events_requested(&self) -> Vec<String> {
        self.events_requested.lock().unwrap().clone()
    }
}

fn not_found(what: &str) -> InventoryError {
    InventoryError::Status {
        url: format!("fake://{}", what),
        status: 404,
    }
}

impl Inventory for FakeInventory {
    async fn nodes(&self) -> Result<Vec<Node>, InventoryError> {
        self.node_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.nodes.clone())
    }

    async fn runs(&self, node: &Node) -> Result<Vec<Run>, InventoryError> {
        self.run_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_runs_for.as_deref() == Some(node.name.as_str()) {
            return Err(InventoryError::Status {
                url: format!("fake://reports/{}", node.name),
                status: 500,
            });
        }
        Ok(self.runs.get(&node.name).cloned().unwrap_or_default())
    }

    async fn events(&self, run_id: &str) -> Result<Vec<Event>, InventoryError> {
        self.events_requested.lock().unwrap().push(run_id.to_string());
        if self.fail_events_for.as_deref() == Some(run_id) {
            return Err(InventoryError::Status {
                url: format!("fake://events/{}", run_id),
                status: 500,
            });
        }
        Ok(self.events.get(run_id).cloned().unwrap_or_default())
    }

    async fn metric(&self, path: &str) -> Result<serde_json::Value, InventoryError> {
        self.metrics.get(path).cloned().ok_or_else(|| not_found(path))
    }

    async fn fact_values(&self, name: &str) -> Result<Vec<String>, InventoryError> {
        Ok(self.facts.get(name).cloned().unwrap_or_default())
    }
}
