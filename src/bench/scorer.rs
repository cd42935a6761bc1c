use serde::Serialize;

use crate::monitor::{Measurement, ResourceKind, SampleSeries};

/// CPU scores are reported on a 0-100 scale multiplied once more by 100,
/// so a fully idle machine scores 0 and a saturated one 10000.
pub const CPU_SCORE_SCALE: f64 = 100.0;

/// Score of one resource: a number, or absent with the reason why
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Score {
    Present(f64),
    Absent { reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResourceScore {
    pub kind: ResourceKind,
    pub score: Score,
}

impl ResourceScore {
    pub fn present(kind: ResourceKind, value: f64) -> Self {
        Self {
            kind,
            score: Score::Present(value),
        }
    }

    pub fn absent(kind: ResourceKind, reason: impl Into<String>) -> Self {
        Self {
            kind,
            score: Score::Absent {
                reason: reason.into(),
            },
        }
    }

    pub fn value(&self) -> Option<f64> {
        match self.score {
            Score::Present(v) => Some(v),
            Score::Absent { .. } => None,
        }
    }

    pub fn is_present(&self) -> bool {
        self.value().is_some()
    }
}

/// Reduce a series to one score using the rule for its resource kind.
///
/// Unavailable readings are skipped, not counted as zero. The score is
/// absent only when no usable reading is left.
pub fn score(series: &SampleSeries) -> ResourceScore {
    let kind = series.kind;
    let value = match kind {
        ResourceKind::Cpu => mean(series.usable().filter_map(|m| match m {
            Measurement::Cpu(cores) => mean(cores.iter().copied()),
            _ => None,
        }))
        .map(|avg| avg * CPU_SCORE_SCALE),
        ResourceKind::Memory => mean(series.usable().filter_map(|m| match m {
            Measurement::Memory(percent) => Some(*percent),
            _ => None,
        })),
        ResourceKind::Storage => mean(series.usable().filter_map(|m| match m {
            Measurement::Storage { percent, .. } => Some(*percent),
            _ => None,
        })),
        ResourceKind::Accelerator => series
            .usable()
            .filter_map(|m| match m {
                Measurement::Accelerator {
                    elements_per_sec, ..
                } => leading_two_digits(*elements_per_sec),
                _ => None,
            })
            .next()
            .map(f64::from),
    };

    match value {
        Some(v) => ResourceScore::present(kind, v),
        None => ResourceScore::absent(
            kind,
            series
                .absence
                .clone()
                .unwrap_or_else(|| "no usable samples".to_string()),
        ),
    }
}

/// Accelerator normalization: round the throughput and keep its two most
/// significant decimal digits (123_456_789 -> 12, 9_999 -> 99, 7 -> 7).
///
/// Lossy on purpose, it only brings the accelerator onto the same small
/// scale as the percentage-based scores.
pub fn leading_two_digits(throughput: f64) -> Option<u32> {
    if !throughput.is_finite() || throughput <= 0.0 {
        return None;
    }
    let digits = format!("{:.0}", throughput.round_ties_even());
    digits[..digits.len().min(2)].parse().ok()
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    (count > 0).then(|| sum / count as f64)
}
