pub mod config;
pub mod constants;
pub mod domain;
pub mod error;
pub mod observability;
pub mod pipeline;

// Layered boundaries for application and infrastructure
pub mod app;
pub mod infra;

pub use error::{InsightsError, Result};
pub use pipeline::{PipelineOrchestrator, RunResult};
