// Inventory records: nodes, agent runs, resource events

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// A managed host known to the inventory service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub name: String,
}

impl Node {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// One agent run on a node. `id` is the opaque report hash used to fetch its events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Run {
    pub id: String,
    pub start: DateTime<Utc>,
    pub run_time: Duration,
}

/// Event status as reported by the agent; anything unrecognised is `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    Success,
    Failure,
    Skipped,
    #[serde(other)]
    Other,
}

impl EventStatus {
    /// Parse from the service's status string (e.g. "success", "failure").
    pub fn from_puppetdb(s: &str) -> Self {
        match s {
            "success" => EventStatus::Success,
            "failure" => EventStatus::Failure,
            "skipped" => EventStatus::Skipped,
            _ => EventStatus::Other,
        }
    }
}

/// One resource outcome within a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub status: EventStatus,
    pub resource: ResourceKey,
}

/// `(type, title)` of a managed resource. Displays and serializes as `Type[title]`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ResourceKey {
    pub resource_type: String,
    pub title: String,
}

impl ResourceKey {
    pub fn new(resource_type: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            title: title.into(),
        }
    }
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.resource_type, self.title)
    }
}

#[derive(Debug, thiserror::Error)]
#[error("invalid resource reference: {0:?}")]
pub struct ParseResourceKeyError(String);

impl FromStr for ResourceKey {
    type Err = ParseResourceKeyError;

    // Type names never contain '[', titles may.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (resource_type, rest) = s
            .split_once('[')
            .ok_or_else(|| ParseResourceKeyError(s.to_string()))?;
        let title = rest
            .strip_suffix(']')
            .ok_or_else(|| ParseResourceKeyError(s.to_string()))?;
        if resource_type.is_empty() {
            return Err(ParseResourceKeyError(s.to_string()));
        }
        Ok(ResourceKey::new(resource_type, title))
    }
}

impl Serialize for ResourceKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ResourceKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
