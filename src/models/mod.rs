// Domain models

mod aggregation;
mod dashboard;
mod report;
mod run;

pub use aggregation::{
    FleetAggregate, FleetNodes, FleetReports, NodeResourceCounts, ResourceOutcomes, ResourceTally,
    RunCounters, WindowAggregate,
};
pub use dashboard::{FactTally, MetricEntry, MetricSnapshot, MetricValue};
pub use report::{DayData, DayReport, DayWindow, Report};
pub use run::{Event, EventStatus, Node, ParseResourceKeyError, ResourceKey, Run};
