// Day-level structures: the cached per-node data and the assembled multi-day report

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{FactTally, FleetAggregate, MetricSnapshot, WindowAggregate};

/// Raw per-node aggregates for one day window. This is the unit stored in the cache.
///
/// The dashboard snapshot is taken only when the day is first computed as the most
/// recent day, so older cached days keep the values they had then.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DayData {
    pub nodes: BTreeMap<String, WindowAggregate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<MetricSnapshot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facts: Option<FactTally>,
}

/// One inclusive day window in service time, labelled in local time (e.g. "Tue 06/10").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayWindow {
    pub label: String,
    /// Local calendar date the window covers.
    pub date: NaiveDate,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// One day of the report: node data and its fleet aggregate.
#[derive(Debug, Clone, PartialEq)]
pub struct DayReport {
    pub data: DayData,
    pub aggregate: FleetAggregate,
}

/// Everything the renderer needs.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub hostname: String,
    /// Day labels, most recent first.
    pub dates: Vec<String>,
    pub days: BTreeMap<String, DayReport>,
    /// Start of the oldest window.
    pub start: DateTime<Utc>,
    /// End of the most recent window.
    pub end: DateTime<Utc>,
    /// Local dates of the oldest and most recent windows.
    pub first_date: NaiveDate,
    pub last_date: NaiveDate,
}

impl Report {
    /// The most recent day, if any windows were requested.
    pub fn latest(&self) -> Option<&DayReport> {
        self.dates.first().and_then(|d| self.days.get(d))
    }
}
