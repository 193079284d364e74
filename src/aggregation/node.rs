// Per-node fold of runs and events over one inclusive window.

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::models::{EventStatus, Node, RunCounters, WindowAggregate};
use crate::puppetdb_repo::{Inventory, InventoryError};

/// Counts runs of `node` that started in `[start, end]` and tallies their events.
///
/// Relies on `Inventory::runs` returning newest-first: runs after `end` are skipped and
/// the scan stops at the first run before `start`.
pub async fn aggregate_node<I: Inventory>(
    inventory: &I,
    node: &Node,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<WindowAggregate, InventoryError> {
    debug!(node = %node.name, %start, %end, "querying runs");
    let runs = inventory.runs(node).await?;

    let mut counters = RunCounters::default();
    let mut agg = WindowAggregate::default();
    let mut counted = 0u64;

    for run in &runs {
        if run.start > end {
            continue;
        }
        if run.start < start {
            debug!(node = %node.name, run_start = %run.start, "found run before window start; stopping");
            break;
        }
        counted += 1;
        counters.run_time_total += run.run_time;
        counters.run_time_max = counters.run_time_max.max(run.run_time);

        let events = inventory.events(&run.id).await?;
        let (mut failed, mut changed, mut skipped) = (false, false, false);
        for event in &events {
            match event.status {
                EventStatus::Failure => {
                    failed = true;
                    agg.resources.failed.bump(&event.resource, 1);
                }
                EventStatus::Success => {
                    changed = true;
                    agg.resources.changed.bump(&event.resource, 1);
                }
                EventStatus::Skipped => {
                    skipped = true;
                    agg.resources.skipped.bump(&event.resource, 1);
                }
                EventStatus::Other => {}
            }
        }
        counters.with_failures += u64::from(failed);
        counters.with_changes += u64::from(changed);
        counters.with_skips += u64::from(skipped);
    }

    debug!(node = %node.name, runs = counted, "counted runs in window");
    counters.run_count = Some(counted);
    agg.reports = Some(counters);
    Ok(agg)
}
