// HTML rendering of a full report

mod common;

use chrono::{Duration as ChronoDuration, FixedOffset, TimeZone};
use common::{FakeInventory, event, run, ts};
use puppetdb_daily_report::aggregation::AggregationThresholds;
use puppetdb_daily_report::models::{MetricValue, Report};
use puppetdb_daily_report::render::{HtmlRenderer, ReportView, RunInfo, ViewSettings, format_html};
use puppetdb_daily_report::report::{ReportOptions, run_report};
use serde_json::json;

fn strip_whitespace(s: &str) -> String {
    s.chars().filter(|c| !c.is_whitespace()).collect()
}

fn settings() -> ViewSettings {
    ViewSettings {
        num_rows: 10,
        runs_per_day: 40,
    }
}

fn run_info() -> RunInfo {
    RunInfo {
        name: "puppetdb-daily-report".to_string(),
        version: "0.0.0-test".to_string(),
        user: "ops".to_string(),
        host: "reporter".to_string(),
        generated: "2014-06-11 04:15:43 -04:00".to_string(),
    }
}

async fn sample_report() -> Report {
    let day = ts("2014-06-10T16:00:00Z");
    let inv = FakeInventory::new()
        .with_node(
            "node1.example.com",
            vec![
                run("n1-a", day, 60),
                run("n1-b", day - ChronoDuration::hours(1), 120),
                run("n1-old", day - ChronoDuration::days(1), 30),
            ],
        )
        .with_node("node2.example.com", vec![run("n2-a", day, 90)])
        .with_events("n1-a", vec![event("failure", "Service", "ntpd")])
        .with_events("n1-b", vec![event("success", "File", "motd")])
        .with_events("n2-a", vec![event("failure", "Service", "ntpd")])
        .with_metric(
            "com.puppetlabs.puppetdb.query.population:type=default,name=num-nodes",
            json!({"Value": 2}),
        )
        .with_fact("puppetversion", &["3.6.2", "3.6.2"]);
    let now = FixedOffset::west_opt(4 * 3600)
        .unwrap()
        .with_ymd_and_hms(2014, 6, 11, 4, 15, 43)
        .unwrap();
    let options = ReportOptions {
        num_days: 3,
        thresholds: AggregationThresholds::default(),
    };
    run_report(&inv, "puppetdb.example.com", &options, None, now)
        .await
        .unwrap()
}

async fn render_sample() -> String {
    let report = sample_report().await;
    let view = ReportView::build(&report, &settings(), run_info());
    HtmlRenderer::new().unwrap().render(&view).unwrap()
}

#[tokio::test]
async fn render_heading() {
    let html = render_sample().await;
    assert!(html.contains("<html>"));
    assert!(html.contains(
        "<h1>daily puppet(db) run summary on puppetdb.example.com for Sun Jun 08, 2014 to Tue Jun 10</h1>"
    ));
}

#[tokio::test]
async fn render_metrics_table() {
    let html = strip_whitespace(&render_sample().await);
    // tera autoescapes '/' in day labels
    assert!(html.contains(
        "<tr><th>Metric</th><th>Tue06&#x2F;10</th><th>Mon06&#x2F;09</th><th>Sun06&#x2F;08</th></tr>"
    ));
    assert!(html.contains("<tr><th>Nodes</th><td>2</td><td>&nbsp;</td><td>&nbsp;</td></tr>"));
    assert!(html.contains("<tr><th>Catalogduplication</th><td>&nbsp;</td><td>&nbsp;</td><td>&nbsp;</td></tr>"));
}

#[tokio::test]
async fn render_fact_table() {
    let html = strip_whitespace(&render_sample().await);
    assert!(html.contains("<h2>FactValues</h2>"));
    assert!(html.contains("<tr><throwspan=\"1\">puppetversion</th><td>3.6.2</td><td>2</td></tr>"));
    assert!(!html.contains("facterversion"));
}

#[tokio::test]
async fn render_report_overview() {
    let html = strip_whitespace(&render_sample().await);
    assert!(html.contains("<h2>ReportOverview</h2>"));
    assert!(html.contains("<tr><th>TotalReports</th><td>3</td><td>1</td><td>0</td></tr>"));
    assert!(html.contains("<tr><th>WithFailures</th><td>2(67%)</td><td>0</td><td>0</td></tr>"));
    assert!(html.contains("<tr><th>WithChanges</th><td>1(33%)</td><td>0</td><td>0</td></tr>"));
    assert!(html.contains("<tr><th>AverageRuntime</th><td>1m30s</td><td>30s</td><td>0s</td></tr>"));
    assert!(html.contains("<tr><th>MaximumRuntime</th><td>2m</td><td>30s</td><td>0s</td></tr>"));
}

#[tokio::test]
async fn render_node_summary() {
    let html = strip_whitespace(&render_sample().await);
    assert!(html.contains("<h2>NodeSummary</h2>"));
    assert!(html.contains("<tr><th>TotalNodes</th><td>2</td><td>2</td><td>2</td></tr>"));
    assert!(html.contains("<tr><th>With&lt;40Runsin24h</th><td>2(100%)</td><td>2(100%)</td><td>2(100%)</td></tr>"));
    assert!(html.contains("<tr><th>With100%FailedRuns</th><td>1(50%)</td><td>1(50%)</td><td>2(100%)</td></tr>"));
}

#[tokio::test]
async fn render_resource_tables() {
    let html = strip_whitespace(&render_sample().await);
    assert!(html.contains(
        "<h2>FailedResources</h2><table><tr><th>Resource</th><th>Nodes</th><th>Events</th></tr><tr><td>Service[ntpd]</td><td>2</td><td>2</td></tr></table>"
    ));
    assert!(html.contains(
        "<h2>FlappingResources</h2><table><tr><th>Resource</th><th>Nodes</th></tr><tr><td>File[motd]</td><td>1</td></tr></table>"
    ));
    assert!(html.contains("<h2>SkippedResources</h2><p>none</p>"));
}

#[tokio::test]
async fn render_metrics_use_each_days_snapshot() {
    let mut report = sample_report().await;
    let mut older = report.days["Tue 06/10"].data.metrics.clone().unwrap();
    for entry in older.entries.iter_mut() {
        entry.formatted = None;
    }
    older.entries[0].formatted = Some(MetricValue::Integer(7));
    report.days.get_mut("Mon 06/09").unwrap().data.metrics = Some(older);

    let view = ReportView::build(&report, &settings(), run_info());
    let nodes = view.metrics.iter().find(|r| r.label == "Nodes").unwrap();
    assert_eq!(nodes.cells, vec![Some("2".to_string()), None, None]);
    let first = &view.metrics[0];
    assert_eq!(first.cells[1].as_deref(), Some("7"));
}

#[tokio::test]
async fn render_footer() {
    let html = render_sample().await;
    assert!(html.contains("generated by puppetdb-daily-report 0.0.0-test as ops@reporter"));
}

#[tokio::test]
async fn render_format_html_renders_with_current_run_info() {
    let report = sample_report().await;
    let html = format_html(&report, &settings()).unwrap();
    assert!(html.contains("<h2>Report Overview</h2>"));
    assert!(html.contains(puppetdb_daily_report::version::VERSION));
}
