use super::scorer::{ResourceScore, Score};
use crate::monitor::{RawReading, ResourceKind, SampleSeries};
use crate::report::BenchmarkReport;

/// Receives progress narration from the orchestrator.
///
/// Must be `Sync`: in concurrent mode several resources report at once.
pub trait BenchObserver: Sync {
    fn resource_started(&self, _kind: ResourceKind) {}
    fn resource_sampled(&self, _series: &SampleSeries) {}
    fn resource_scored(&self, _score: &ResourceScore) {}
    fn finished(&self, _report: &BenchmarkReport) {}
}

/// Narrates a run through `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl BenchObserver for TracingObserver {
    fn resource_started(&self, kind: ResourceKind) {
        tracing::info!("{kind} benchmark");
    }

    fn resource_sampled(&self, series: &SampleSeries) {
        for reading in &series.readings {
            match reading {
                RawReading::Available(m) => tracing::debug!(kind = %series.kind, reading = ?m),
                RawReading::Unavailable { reason } => {
                    tracing::warn!(kind = %series.kind, %reason, "reading unavailable")
                }
            }
        }
        if let Some(reason) = &series.absence {
            tracing::info!(kind = %series.kind, %reason, "skipping");
        }
    }

    fn resource_scored(&self, score: &ResourceScore) {
        match &score.score {
            Score::Present(v) => tracing::info!("Average {} score: {v:.2}", score.kind),
            Score::Absent { reason } => tracing::info!("{} score unavailable: {reason}", score.kind),
        }
    }

    fn finished(&self, report: &BenchmarkReport) {
        tracing::info!(
            elapsed = ?report.elapsed,
            "Overall score: {:.2}",
            report.overall_score
        );
    }
}
