// Fleet-wide fold over per-node window aggregates. Pure; input order does not matter.

use std::time::Duration;

use crate::models::{FleetAggregate, ResourceTally, WindowAggregate};

/// Classification thresholds. Applied on every run, never cached.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AggregationThresholds {
    /// Nodes with fewer runs than this in a window are "too few runs".
    pub runs_per_day: u64,
    /// A changed resource flaps on a node when its event count is at least this share of runs.
    pub flapping_ratio: f64,
}

impl Default for AggregationThresholds {
    fn default() -> Self {
        Self {
            runs_per_day: 40,
            flapping_ratio: 0.45,
        }
    }
}

pub fn aggregate_fleet<'a, I>(nodes: I, thresholds: &AggregationThresholds) -> FleetAggregate
where
    I: IntoIterator<Item = &'a WindowAggregate>,
{
    let mut fleet = FleetAggregate::default();

    for node in nodes {
        fleet.nodes.total += 1;

        let Some(reports) = node.reports.as_ref() else {
            fleet.nodes.with_no_report += 1;
            fleet.nodes.with_no_successful_runs += 1;
            continue;
        };
        let Some(run_count) = reports.run_count else {
            fleet.nodes.with_no_report += 1;
            fleet.nodes.with_no_successful_runs += 1;
            continue;
        };

        let failpct = if run_count > 0 {
            reports.with_failures as f64 / run_count as f64
        } else {
            0.0
        };

        if run_count < thresholds.runs_per_day {
            fleet.nodes.with_too_few_runs += 1;
        }

        if run_count == 0 {
            fleet.nodes.with_no_report += 1;
            fleet.nodes.with_no_successful_runs += 1;
        } else if reports.with_failures == run_count {
            fleet.nodes.with_no_successful_runs += 1;
        } else if (0.5..1.0).contains(&failpct) {
            fleet.nodes.with_50_plus_failed += 1;
        }

        add_counter(
            &mut fleet.reports.run_count,
            &mut fleet.nodes.run_count,
            run_count,
        );
        add_counter(
            &mut fleet.reports.with_failures,
            &mut fleet.nodes.with_failures,
            reports.with_failures,
        );
        add_counter(
            &mut fleet.reports.with_changes,
            &mut fleet.nodes.with_changes,
            reports.with_changes,
        );
        add_counter(
            &mut fleet.reports.with_skips,
            &mut fleet.nodes.with_skips,
            reports.with_skips,
        );

        fleet.reports.run_time_total += reports.run_time_total;
        fleet.reports.run_time_max = fleet.reports.run_time_max.max(reports.run_time_max);

        add_tally(
            &mut fleet.reports.resources.failed,
            &mut fleet.nodes.resources.failed,
            &node.resources.failed,
        );
        add_tally(
            &mut fleet.reports.resources.changed,
            &mut fleet.nodes.resources.changed,
            &node.resources.changed,
        );
        add_tally(
            &mut fleet.reports.resources.skipped,
            &mut fleet.nodes.resources.skipped,
            &node.resources.skipped,
        );

        let flap_floor = thresholds.flapping_ratio * run_count as f64;
        for (resource, count) in node.resources.changed.iter() {
            if count as f64 >= flap_floor {
                fleet.nodes.resources.flapping.bump(resource, 1);
            }
        }
    }

    fleet.reports.run_time_avg = average(fleet.reports.run_time_total, fleet.reports.run_count);
    fleet
}

fn add_counter(sum: &mut u64, presence: &mut u64, value: u64) {
    *sum += value;
    if value > 0 {
        *presence += 1;
    }
}

/// Event counts go to `events`; each touched resource adds one node to `nodes`.
fn add_tally(events: &mut ResourceTally, nodes: &mut ResourceTally, node_tally: &ResourceTally) {
    for (resource, count) in node_tally.iter() {
        nodes.bump(resource, 1);
        events.bump(resource, count);
    }
}

fn average(total: Duration, count: u64) -> Duration {
    if count == 0 {
        return Duration::ZERO;
    }
    Duration::from_nanos((total.as_nanos() / u128::from(count)) as u64)
}
