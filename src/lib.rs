//! Quick machine health check.
//!
//! Samples CPU, memory, storage and (when a GPU is reachable) accelerator
//! throughput for a few seconds, scores each resource and folds the scores
//! into one overall number.

pub mod app;
pub mod bench;
pub mod config;
pub mod error;
pub mod monitor;
pub mod report;
pub mod ui;

pub use bench::{BenchmarkOrchestrator, ProbeSet};
pub use config::BenchConfig;
pub use error::{BenchError, ConfigError, ProbeUnavailable};
pub use report::BenchmarkReport;
