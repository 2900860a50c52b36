pub mod aggregator;
pub mod breakpoints;
pub mod classifier;
pub mod imputer;
pub mod pipeline;

pub use aggregator::{group_and_reduce, Aggregator, GroupStats, MetricAccumulator, SummaryRow};
pub use breakpoints::{interpolate, Bracket, BreakpointTable, SubIndex, CPCB_BREAKPOINTS};
pub use classifier::classify;
pub use imputer::{AqiImputer, Imputation, ImputationStats};
pub use pipeline::{AqiPipeline, PipelineOutput};
