// Report driver: walks the day windows, pulls node data through the cache, folds each day.

pub mod dates;

pub use dates::get_date_list;

use anyhow::Context;
use chrono::{DateTime, TimeZone, Utc};
use std::collections::BTreeMap;
use tracing::{info, instrument};

use crate::aggregation::{AggregationThresholds, aggregate_fleet, aggregate_node};
use crate::cache_repo::{ReportCache, get_or_compute};
use crate::dashboard::{get_dashboard_metrics, get_facts};
use crate::models::{DayData, DayReport, Report};
use crate::puppetdb_repo::Inventory;

#[derive(Debug, Clone)]
pub struct ReportOptions {
    pub num_days: u32,
    pub thresholds: AggregationThresholds,
}

/// Aggregate every node for one window, one node at a time. With `with_dashboard` set
/// (the most recent day) the metric snapshot and fact tally are taken as well.
#[instrument(skip(inventory), fields(operation = "query_data_for_timespan"))]
pub async fn query_data_for_timespan<I: Inventory>(
    inventory: &I,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    with_dashboard: bool,
) -> anyhow::Result<DayData> {
    let mut data = DayData::default();
    if with_dashboard {
        data.metrics = Some(get_dashboard_metrics(inventory).await);
        data.facts = Some(get_facts(inventory).await.context("fact values")?);
    }
    let nodes = inventory.nodes().await.context("listing nodes")?;
    info!(nodes = nodes.len(), "aggregating nodes");
    for node in &nodes {
        let agg = aggregate_node(inventory, node, start, end)
            .await
            .with_context(|| format!("aggregating node {}", node.name))?;
        data.nodes.insert(node.name.clone(), agg);
    }
    Ok(data)
}

/// Build the full multi-day report. Days already in the cache, dashboard snapshot
/// included, are not queried again.
pub async fn run_report<I, Tz>(
    inventory: &I,
    hostname: &str,
    options: &ReportOptions,
    cache: Option<&ReportCache>,
    now: DateTime<Tz>,
) -> anyhow::Result<Report>
where
    I: Inventory,
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let windows = get_date_list(options.num_days, now)?;
    let (Some(first), Some(last)) = (windows.first(), windows.last()) else {
        anyhow::bail!("report needs at least one day (num_days was 0)");
    };
    let (end, start) = (first.end, last.start);
    let (last_date, first_date) = (first.date, last.date);

    let mut days = BTreeMap::new();
    let mut dates = Vec::with_capacity(windows.len());
    for (i, window) in windows.iter().enumerate() {
        info!(day = %window.label, "querying window");
        let data = get_or_compute(hostname, window.start, window.end, cache, || {
            query_data_for_timespan(inventory, window.start, window.end, i == 0)
        })
        .await
        .with_context(|| format!("data for {}", window.label))?;
        let aggregate = aggregate_fleet(data.nodes.values(), &options.thresholds);

        dates.push(window.label.clone());
        days.insert(window.label.clone(), DayReport { data, aggregate });
    }

    Ok(Report {
        hostname: hostname.to_string(),
        dates,
        days,
        start,
        end,
        first_date,
        last_date,
    })
}
