pub mod config;
pub mod error;
pub mod filter;
pub mod location;
pub mod log;
pub mod matcher;
pub mod profiler;
pub mod report;
pub mod stats;

pub use config::RunConfig;
pub use error::{ConfigError, Error, Result};
pub use profiler::{Profiler, RunSummary};
