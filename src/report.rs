use std::fmt;
use std::time::Duration;

use serde::Serialize;

use crate::bench::{ResourceScore, Score};
use crate::error::{BenchError, Result};
use crate::monitor::ResourceKind;

/// Absence details carried alongside the bare scores
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AbsentResource {
    pub kind: ResourceKind,
    pub reason: String,
}

/// Outcome of one benchmark run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BenchmarkReport {
    pub cpu_score: Option<f64>,
    pub memory_score: f64,
    pub storage_score: f64,
    pub accelerator_score: Option<f64>,
    pub overall_score: f64,
    /// Why Cpu or Accelerator came back without a score
    pub absent: Vec<AbsentResource>,
    #[serde(serialize_with = "serialize_secs")]
    pub elapsed: Duration,
}

impl BenchmarkReport {
    /// Assemble a report. Memory and Storage must be present.
    pub fn new(scores: &[ResourceScore], overall_score: f64, elapsed: Duration) -> Result<Self> {
        let find = |kind: ResourceKind| scores.iter().find(|s| s.kind == kind);
        let value = |kind: ResourceKind| find(kind).and_then(ResourceScore::value);
        let required = |kind: ResourceKind| value(kind).ok_or(BenchError::CoreResourceAbsent(kind));

        let absent = scores
            .iter()
            .filter_map(|s| match &s.score {
                Score::Absent { reason } => Some(AbsentResource {
                    kind: s.kind,
                    reason: reason.clone(),
                }),
                Score::Present(_) => None,
            })
            .collect();

        Ok(Self {
            cpu_score: value(ResourceKind::Cpu),
            memory_score: required(ResourceKind::Memory)?,
            storage_score: required(ResourceKind::Storage)?,
            accelerator_score: value(ResourceKind::Accelerator),
            overall_score,
            absent,
            elapsed,
        })
    }

    pub fn score(&self, kind: ResourceKind) -> Option<f64> {
        match kind {
            ResourceKind::Cpu => self.cpu_score,
            ResourceKind::Memory => Some(self.memory_score),
            ResourceKind::Storage => Some(self.storage_score),
            ResourceKind::Accelerator => self.accelerator_score,
        }
    }

    /// Label/value rows in display order, absent scores rendered as "N/A"
    pub fn rows(&self) -> Vec<(String, String)> {
        [
            ResourceKind::Cpu,
            ResourceKind::Accelerator,
            ResourceKind::Memory,
            ResourceKind::Storage,
        ]
        .iter()
        .map(|kind| (format!("{kind} Score:"), format_score(self.score(*kind))))
        .chain(std::iter::once((
            "Overall Score:".to_string(),
            format_score(Some(self.overall_score)),
        )))
        .collect()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl fmt::Display for BenchmarkReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (label, value) in self.rows() {
            writeln!(f, "{label:<15}{value}")?;
        }
        for absent in &self.absent {
            writeln!(f, "  ({} skipped: {})", absent.kind, absent.reason)?;
        }
        write!(f, "Completed in {:.1}s", self.elapsed.as_secs_f64())
    }
}

fn format_score(score: Option<f64>) -> String {
    match score {
        Some(v) => format!("{v:.2}"),
        None => "N/A".to_string(),
    }
}

fn serialize_secs<S: serde::Serializer>(d: &Duration, s: S) -> std::result::Result<S::Ok, S::Error> {
    s.serialize_f64(d.as_secs_f64())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scores(accelerator: Option<f64>) -> Vec<ResourceScore> {
        vec![
            ResourceScore::present(ResourceKind::Cpu, 1500.0),
            match accelerator {
                Some(v) => ResourceScore::present(ResourceKind::Accelerator, v),
                None => ResourceScore::absent(ResourceKind::Accelerator, "capability absent"),
            },
            ResourceScore::present(ResourceKind::Memory, 30.0),
            ResourceScore::present(ResourceKind::Storage, 50.0),
        ]
    }

    #[test]
    fn renders_missing_accelerator_as_na() {
        let report = BenchmarkReport::new(&scores(None), 526.67, Duration::from_secs(10)).unwrap();
        let text = report.to_string();
        assert!(text.contains("CPU Score:     1500.00"));
        assert!(text.contains("GPU Score:     N/A"));
        assert!(text.contains("Overall Score: 526.67"));
        assert!(text.contains("GPU skipped: capability absent"));
    }

    #[test]
    fn requires_memory_and_storage() {
        let mut s = scores(Some(12.0));
        s[3] = ResourceScore::absent(ResourceKind::Storage, "no eligible volumes mounted");
        assert!(matches!(
            BenchmarkReport::new(&s, 1.0, Duration::ZERO),
            Err(BenchError::CoreResourceAbsent(ResourceKind::Storage))
        ));
    }

    #[test]
    fn json_carries_presentation_fields() {
        let report = BenchmarkReport::new(&scores(Some(12.0)), 398.0, Duration::from_millis(1500)).unwrap();
        let value: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert_eq!(value["cpu_score"], 1500.0);
        assert_eq!(value["accelerator_score"], 12.0);
        assert_eq!(value["overall_score"], 398.0);
        assert_eq!(value["elapsed"], 1.5);
    }
}
