// Template context built from a Report. All formatting happens here; the template only lays out.

use chrono::{DateTime, Local};
use serde::Serialize;

use crate::aggregation::{count_with_percent, format_duration, report_metric_name};
use crate::models::{DayReport, Report, ResourceTally};

/// One table row: a label and one cell per day. `None` renders as an empty cell.
#[derive(Debug, Clone, Serialize)]
pub struct Row {
    pub label: String,
    pub cells: Vec<Option<String>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FactGroup {
    pub name: String,
    pub values: Vec<FactValue>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FactValue {
    pub value: String,
    pub count: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResourceRow {
    pub resource: String,
    pub nodes: u64,
    /// Event total; absent for the flapping table.
    pub events: Option<u64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResourceTable {
    pub title: String,
    pub has_events: bool,
    pub rows: Vec<ResourceRow>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunInfo {
    pub name: String,
    pub version: String,
    pub user: String,
    pub host: String,
    pub generated: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportView {
    pub title: String,
    pub dates: Vec<String>,
    pub metrics: Vec<Row>,
    pub facts: Vec<FactGroup>,
    pub overview: Vec<Row>,
    pub node_summary: Vec<Row>,
    pub resources: Vec<ResourceTable>,
    pub run_info: RunInfo,
}

pub struct ViewSettings {
    pub num_rows: usize,
    pub runs_per_day: u64,
}

impl ReportView {
    pub fn build(report: &Report, settings: &ViewSettings, run_info: RunInfo) -> Self {
        let days: Vec<Option<&DayReport>> =
            report.dates.iter().map(|d| report.days.get(d)).collect();

        Self {
            title: format!(
                "daily puppet(db) run summary on {} for {} to {}",
                report.hostname,
                report.first_date.format("%a %b %d, %Y"),
                report.last_date.format("%a %b %d")
            ),
            dates: report.dates.clone(),
            metrics: metric_rows(&days),
            facts: fact_groups(report),
            overview: overview_rows(&days, settings.runs_per_day),
            node_summary: node_rows(&days, settings.runs_per_day),
            resources: resource_tables(report, settings.num_rows),
            run_info,
        }
    }
}

impl RunInfo {
    pub fn current(now: DateTime<Local>) -> Self {
        Self {
            name: crate::version::NAME.to_string(),
            version: crate::version::VERSION.to_string(),
            user: whoami::username(),
            host: whoami::fallible::hostname().unwrap_or_else(|_| "localhost".to_string()),
            generated: now.format("%Y-%m-%d %H:%M:%S %Z").to_string(),
        }
    }
}

fn metric_rows(days: &[Option<&DayReport>]) -> Vec<Row> {
    // Row order comes from the newest day that carries a snapshot.
    let Some(catalog) = days.iter().flatten().find_map(|d| d.data.metrics.as_ref()) else {
        return Vec::new();
    };
    catalog
        .entries
        .iter()
        .map(|entry| Row {
            label: entry.name.clone(),
            cells: days
                .iter()
                .copied()
                .map(|day| {
                    day.and_then(|d| d.data.metrics.as_ref())
                        .and_then(|m| m.get(&entry.name))
                        .and_then(|e| e.formatted.as_ref())
                        .map(|v| v.to_string())
                })
                .collect(),
        })
        .collect()
}

fn fact_groups(report: &Report) -> Vec<FactGroup> {
    let Some(facts) = report.latest().and_then(|d| d.data.facts.as_ref()) else {
        return Vec::new();
    };
    facts
        .iter()
        .filter(|(_, values)| !values.is_empty())
        .map(|(name, values)| FactGroup {
            name: name.clone(),
            values: values
                .iter()
                .map(|(value, count)| FactValue {
                    value: value.clone(),
                    count: *count,
                })
                .collect(),
        })
        .collect()
}

/// Cells for days with no nodes at all stay empty.
fn per_day<F>(days: &[Option<&DayReport>], f: F) -> Vec<Option<String>>
where
    F: Fn(&DayReport) -> String,
{
    days.iter()
        .copied()
        .map(|day| day.filter(|d| d.aggregate.nodes.total > 0).map(&f))
        .collect()
}

fn overview_rows(days: &[Option<&DayReport>], runs_per_day: u64) -> Vec<Row> {
    let label = |key: &str| report_metric_name(key, runs_per_day);
    vec![
        Row {
            label: label("run_count"),
            cells: per_day(days, |d| d.aggregate.reports.run_count.to_string()),
        },
        Row {
            label: label("with_failures"),
            cells: per_day(days, |d| {
                count_with_percent(d.aggregate.reports.with_failures, d.aggregate.reports.run_count)
            }),
        },
        Row {
            label: label("with_changes"),
            cells: per_day(days, |d| {
                count_with_percent(d.aggregate.reports.with_changes, d.aggregate.reports.run_count)
            }),
        },
        Row {
            label: label("with_skips"),
            cells: per_day(days, |d| {
                count_with_percent(d.aggregate.reports.with_skips, d.aggregate.reports.run_count)
            }),
        },
        Row {
            label: label("run_time_avg"),
            cells: per_day(days, |d| format_duration(d.aggregate.reports.run_time_avg)),
        },
        Row {
            label: label("run_time_max"),
            cells: per_day(days, |d| format_duration(d.aggregate.reports.run_time_max)),
        },
    ]
}

fn node_rows(days: &[Option<&DayReport>], runs_per_day: u64) -> Vec<Row> {
    let bucket = |key: &str, get: fn(&DayReport) -> u64| Row {
        label: report_metric_name(key, runs_per_day),
        cells: per_day(days, |d| count_with_percent(get(d), d.aggregate.nodes.total)),
    };
    vec![
        Row {
            label: "Total Nodes".to_string(),
            cells: per_day(days, |d| d.aggregate.nodes.total.to_string()),
        },
        bucket("with_no_report", |d| d.aggregate.nodes.with_no_report),
        bucket("with_no_successful_runs", |d| {
            d.aggregate.nodes.with_no_successful_runs
        }),
        bucket("with_50+%_failed", |d| d.aggregate.nodes.with_50_plus_failed),
        bucket("with_too_few_runs", |d| d.aggregate.nodes.with_too_few_runs),
        bucket("with_failures", |d| d.aggregate.nodes.with_failures),
        bucket("with_changes", |d| d.aggregate.nodes.with_changes),
        bucket("with_skips", |d| d.aggregate.nodes.with_skips),
    ]
}

fn resource_tables(report: &Report, num_rows: usize) -> Vec<ResourceTable> {
    let Some(latest) = report.latest() else {
        return Vec::new();
    };
    let fleet = &latest.aggregate;
    let table = |title: &str, nodes: &ResourceTally, events: Option<&ResourceTally>| ResourceTable {
        title: title.to_string(),
        has_events: events.is_some(),
        rows: nodes
            .top(num_rows)
            .into_iter()
            .map(|(key, count)| ResourceRow {
                events: events.map(|e| e.get(&key)),
                resource: key.to_string(),
                nodes: count,
            })
            .collect(),
    };
    vec![
        table(
            "Failed Resources",
            &fleet.nodes.resources.failed,
            Some(&fleet.reports.resources.failed),
        ),
        table(
            "Changed Resources",
            &fleet.nodes.resources.changed,
            Some(&fleet.reports.resources.changed),
        ),
        table(
            "Skipped Resources",
            &fleet.nodes.resources.skipped,
            Some(&fleet.reports.resources.skipped),
        ),
        table("Flapping Resources", &fleet.nodes.resources.flapping, None),
    ]
}
