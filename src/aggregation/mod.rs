// Aggregation core: per-node fold, fleet fold, display formatting.

pub mod fleet;
pub mod format;
pub mod node;

pub use fleet::{AggregationThresholds, aggregate_fleet};
pub use format::{
    count_with_percent, format_decimal, format_duration, format_metric, report_metric_name,
};
pub use node::aggregate_node;
