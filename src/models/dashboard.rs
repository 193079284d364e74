// Point-in-time service metrics and fact value counts

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Display form of a metric: preformatted text, a whole number, or the raw response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricValue {
    Integer(i64),
    Text(String),
    Raw(serde_json::Value),
}

impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricValue::Integer(i) => write!(f, "{}", i),
            MetricValue::Text(s) => f.write_str(s),
            MetricValue::Raw(v) => write!(f, "{}", v),
        }
    }
}

/// One catalog metric. `formatted` is None when the fetch failed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricEntry {
    pub name: String,
    pub path: String,
    pub formatted: Option<MetricValue>,
}

/// The metric catalog in catalog order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricSnapshot {
    pub entries: Vec<MetricEntry>,
}

impl MetricSnapshot {
    pub fn get(&self, name: &str) -> Option<&MetricEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// fact name -> (value -> number of nodes reporting it)
pub type FactTally = BTreeMap<String, BTreeMap<String, u64>>;
