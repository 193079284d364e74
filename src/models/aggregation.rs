// Per-node and fleet-wide aggregates for one day window.
// Per-node data is what gets cached; the fleet aggregate is recomputed from it every run.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

use super::ResourceKey;

/// Resource -> count. Zero on first touch; ordered so output is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceTally(BTreeMap<ResourceKey, u64>);

impl ResourceTally {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bump(&mut self, key: &ResourceKey, by: u64) {
        *self.0.entry(key.clone()).or_insert(0) += by;
    }

    pub fn get(&self, key: &ResourceKey) -> u64 {
        self.0.get(key).copied().unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ResourceKey, u64)> {
        self.0.iter().map(|(k, v)| (k, *v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Highest counts first; ties ordered by resource key. At most `n` entries.
    pub fn top(&self, n: usize) -> Vec<(ResourceKey, u64)> {
        let mut entries: Vec<(ResourceKey, u64)> =
            self.0.iter().map(|(k, v)| (k.clone(), *v)).collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        entries.truncate(n);
        entries
    }
}

impl FromIterator<(ResourceKey, u64)> for ResourceTally {
    fn from_iter<T: IntoIterator<Item = (ResourceKey, u64)>>(iter: T) -> Self {
        let mut tally = ResourceTally::new();
        for (k, v) in iter {
            tally.bump(&k, v);
        }
        tally
    }
}

/// Event tallies by outcome. `changed` counts `success` events.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceOutcomes {
    #[serde(default)]
    pub failed: ResourceTally,
    #[serde(default)]
    pub changed: ResourceTally,
    #[serde(default)]
    pub skipped: ResourceTally,
}

/// Run counters for one node over one window. `run_count: None` means no report data.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunCounters {
    #[serde(default)]
    pub run_count: Option<u64>,
    #[serde(default)]
    pub with_failures: u64,
    #[serde(default)]
    pub with_changes: u64,
    #[serde(default)]
    pub with_skips: u64,
    #[serde(default)]
    pub run_time_total: Duration,
    #[serde(default)]
    pub run_time_max: Duration,
}

/// Everything known about one node for one window.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowAggregate {
    #[serde(default)]
    pub reports: Option<RunCounters>,
    #[serde(default)]
    pub resources: ResourceOutcomes,
}

/// Fleet sums of the per-node run counters, plus per-resource event totals.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FleetReports {
    pub run_count: u64,
    pub with_failures: u64,
    pub with_changes: u64,
    pub with_skips: u64,
    pub run_time_total: Duration,
    pub run_time_max: Duration,
    pub run_time_avg: Duration,
    pub resources: ResourceOutcomes,
}

/// Node counts per resource outcome, plus flapping votes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeResourceCounts {
    pub failed: ResourceTally,
    pub changed: ResourceTally,
    pub skipped: ResourceTally,
    pub flapping: ResourceTally,
}

/// Node classification buckets and presence counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FleetNodes {
    pub total: u64,
    pub with_no_report: u64,
    pub with_no_successful_runs: u64,
    #[serde(rename = "with_50+%_failed")]
    pub with_50_plus_failed: u64,
    pub with_too_few_runs: u64,
    pub run_count: u64,
    pub with_failures: u64,
    pub with_changes: u64,
    pub with_skips: u64,
    pub resources: NodeResourceCounts,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FleetAggregate {
    pub reports: FleetReports,
    pub nodes: FleetNodes,
}
