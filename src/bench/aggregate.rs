use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use super::scorer::ResourceScore;
use crate::error::{BenchError, Result};

/// How absent Cpu/Memory/Storage scores are treated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregationPolicy {
    /// Only the accelerator may be missing; anything else is a probe fault
    #[default]
    Strict,
    /// Any absent score is folded out of the mean
    Lenient,
}

impl FromStr for AggregationPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(Self::Strict),
            "lenient" => Ok(Self::Lenient),
            other => Err(format!("unknown aggregation policy {other:?}")),
        }
    }
}

impl fmt::Display for AggregationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Strict => f.write_str("strict"),
            Self::Lenient => f.write_str("lenient"),
        }
    }
}

/// Arithmetic mean of the present scores.
///
/// The divisor is the number of present scores, so a missing accelerator
/// yields the mean of three rather than four. Never returns NaN: with
/// nothing present the result is `AllResourcesAbsent`.
pub fn aggregate(scores: &[ResourceScore], policy: AggregationPolicy) -> Result<f64> {
    let present: Vec<f64> = scores.iter().filter_map(ResourceScore::value).collect();
    if present.is_empty() {
        return Err(BenchError::AllResourcesAbsent);
    }

    if policy == AggregationPolicy::Strict {
        if let Some(missing) = scores.iter().find(|s| s.kind.is_core() && !s.is_present()) {
            return Err(BenchError::CoreResourceAbsent(missing.kind));
        }
    }

    Ok(present.iter().sum::<f64>() / present.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitor::ResourceKind;

    fn all(value: f64) -> Vec<ResourceScore> {
        ResourceKind::ALL
            .iter()
            .map(|k| ResourceScore::present(*k, value))
            .collect()
    }

    #[test]
    fn absent_accelerator_divides_by_three() {
        let scores = vec![
            ResourceScore::present(ResourceKind::Cpu, 50.0),
            ResourceScore::present(ResourceKind::Memory, 50.0),
            ResourceScore::present(ResourceKind::Storage, 50.0),
            ResourceScore::absent(ResourceKind::Accelerator, "capability absent"),
        ];
        assert_eq!(aggregate(&scores, AggregationPolicy::Strict).unwrap(), 50.0);

        let mut uneven = scores.clone();
        uneven[0] = ResourceScore::present(ResourceKind::Cpu, 80.0);
        assert_eq!(aggregate(&uneven, AggregationPolicy::Strict).unwrap(), 60.0);
    }

    #[test]
    fn all_equal_gives_that_value() {
        assert_eq!(aggregate(&all(42.0), AggregationPolicy::Strict).unwrap(), 42.0);
    }

    #[test]
    fn nothing_present_is_an_error_not_nan() {
        let scores: Vec<_> = ResourceKind::ALL
            .iter()
            .map(|k| ResourceScore::absent(*k, "gone"))
            .collect();
        assert!(matches!(
            aggregate(&scores, AggregationPolicy::Lenient),
            Err(BenchError::AllResourcesAbsent)
        ));
        assert!(matches!(
            aggregate(&[], AggregationPolicy::Strict),
            Err(BenchError::AllResourcesAbsent)
        ));
    }

    #[test]
    fn nothing_present_wins_over_strict_core_check() {
        let scores: Vec<_> = ResourceKind::ALL
            .iter()
            .map(|k| ResourceScore::absent(*k, "gone"))
            .collect();
        assert!(matches!(
            aggregate(&scores, AggregationPolicy::Strict),
            Err(BenchError::AllResourcesAbsent)
        ));
        assert!(matches!(
            aggregate(&scores, AggregationPolicy::default()),
            Err(BenchError::AllResourcesAbsent)
        ));
    }

    #[test]
    fn strict_policy_rejects_missing_core_resource() {
        let mut scores = all(10.0);
        scores[2] = ResourceScore::absent(ResourceKind::Memory, "no usable samples");
        assert!(matches!(
            aggregate(&scores, AggregationPolicy::Strict),
            Err(BenchError::CoreResourceAbsent(ResourceKind::Memory))
        ));
    }

    #[test]
    fn lenient_policy_folds_out_missing_core_resource() {
        let mut scores = all(10.0);
        scores[0] = ResourceScore::absent(ResourceKind::Cpu, "no usable samples");
        assert_eq!(aggregate(&scores, AggregationPolicy::Lenient).unwrap(), 10.0);
    }

    #[test]
    fn policy_parses_case_insensitively() {
        assert_eq!("Strict".parse::<AggregationPolicy>().unwrap(), AggregationPolicy::Strict);
        assert_eq!(" lenient ".parse::<AggregationPolicy>().unwrap(), AggregationPolicy::Lenient);
        assert!("loose".parse::<AggregationPolicy>().is_err());
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn overall_lies_between_min_and_max(values in prop::collection::vec(0.0f64..10_000.0, 4)) {
                let scores: Vec<_> = ResourceKind::ALL
                    .iter()
                    .zip(&values)
                    .map(|(k, v)| ResourceScore::present(*k, *v))
                    .collect();
                let overall = aggregate(&scores, AggregationPolicy::Strict).unwrap();
                let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
                let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
                prop_assert!(overall.is_finite());
                prop_assert!(overall >= min - 1e-9 && overall <= max + 1e-9);
            }
        }
    }
}
