pub mod controller;
pub mod cycle;
pub mod loop_worker;

pub use controller::{SampleScheduler, SchedulerStatus};
pub use cycle::{AnalysisCycle, CycleLimits, CycleResult, Pipeline};
pub use loop_worker::TickHandler;
