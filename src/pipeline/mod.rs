pub mod clock;
pub mod orchestrator;
pub mod processing;

pub use clock::{Clock, FixedClock, SystemClock};
pub use orchestrator::{PipelineOrchestrator, PipelineSettings, RunCounts, RunResult};
