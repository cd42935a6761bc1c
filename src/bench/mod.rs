//! Sampling-and-scoring engine: probes are sampled into series, series are
//! reduced to per-resource scores, and scores are folded into one number.

mod aggregate;
mod observer;
mod orchestrator;
mod sampler;
mod scorer;

#[cfg(test)]
pub(crate) mod testing;

pub use aggregate::{aggregate, AggregationPolicy};
pub use observer::{BenchObserver, TracingObserver};
pub use orchestrator::{BenchmarkOrchestrator, ProbeSet};
pub use sampler::sample;
pub use scorer::{leading_two_digits, score, ResourceScore, Score, CPU_SCORE_SCALE};
