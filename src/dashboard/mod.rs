// Latest-day dashboard data: service metrics and fact value counts.

pub mod facts;
pub mod metrics;

pub use facts::{FACTS, get_facts};
pub use metrics::{METRIC_CATALOG, get_dashboard_metrics};
