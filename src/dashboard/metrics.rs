// Service health metrics shown in the dashboard table.

use tracing::warn;

use crate::aggregation::format_metric;
use crate::models::{MetricEntry, MetricSnapshot};
use crate::puppetdb_repo::Inventory;

/// Display name and mbean path, in table order.
pub const METRIC_CATALOG: [(&str, &str); 17] = [
    ("JVM Heap", "java.lang:type=Memory"),
    (
        "Nodes",
        "com.puppetlabs.puppetdb.query.population:type=default,name=num-nodes",
    ),
    (
        "Resources",
        "com.puppetlabs.puppetdb.query.population:type=default,name=num-resources",
    ),
    (
        "Resource duplication",
        "com.puppetlabs.puppetdb.query.population:type=default,name=pct-resource-dupes",
    ),
    (
        "Catalog duplication",
        "com.puppetlabs.puppetdb.scf.storage:type=default,name=duplicate-pct",
    ),
    (
        "Command Queue",
        "org.apache.activemq:BrokerName=localhost,Type=Queue,Destination=com.puppetlabs.puppetdb.commands",
    ),
    (
        "Command Processing",
        "com.puppetlabs.puppetdb.command:type=global,name=processing-time",
    ),
    (
        "Processed",
        "com.puppetlabs.puppetdb.command:type=global,name=processed",
    ),
    (
        "Retried",
        "com.puppetlabs.puppetdb.command:type=global,name=retried",
    ),
    (
        "Discarded",
        "com.puppetlabs.puppetdb.command:type=global,name=discarded",
    ),
    (
        "Rejected",
        "com.puppetlabs.puppetdb.command:type=global,name=fatal",
    ),
    (
        "Enqueueing",
        "org.apache.activemq:BrokerName=localhost,Type=Queue,Destination=com.puppetlabs.puppetdb.commands",
    ),
    (
        "Collection Queries",
        "com.puppetlabs.puppetdb.http.server:type=/v3/resources,name=service-time",
    ),
    (
        "DB Compaction",
        "com.puppetlabs.puppetdb.scf.storage:type=default,name=gc-time",
    ),
    (
        "DLO Size on Disk",
        "com.puppetlabs.puppetdb.command.dlo:type=global,name=filesize",
    ),
    (
        "Discarded Messages",
        "com.puppetlabs.puppetdb.command.dlo:type=global,name=messages",
    ),
    (
        "Catalog Replace Time",
        "com.puppetlabs.puppetdb.scf.storage:type=default,name=replace-catalog-time",
    ),
];

/// Fetch every catalog metric in order. A failed fetch is logged and leaves that entry empty.
pub async fn get_dashboard_metrics<I: Inventory>(inventory: &I) -> MetricSnapshot {
    let mut entries = Vec::with_capacity(METRIC_CATALOG.len());
    for (name, path) in METRIC_CATALOG {
        let formatted = match inventory.metric(path).await {
            Ok(raw) => Some(format_metric(&raw)),
            Err(e) => {
                warn!(error = %e, "unable to get value for metric: {}", name);
                None
            }
        };
        entries.push(MetricEntry {
            name: name.to_string(),
            path: path.to_string(),
            formatted,
        });
    }
    MetricSnapshot { entries }
}
