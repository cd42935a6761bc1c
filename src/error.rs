use thiserror::Error;

use crate::monitor::ResourceKind;

/// A probe could not produce a measurement.
///
/// Never fatal on its own: the sampler records it as an unavailable reading
/// (or an empty, tagged series for once-only probes).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{kind} unavailable: {reason}")]
pub struct ProbeUnavailable {
    pub kind: ResourceKind,
    pub reason: String,
}

impl ProbeUnavailable {
    pub fn new(kind: ResourceKind, reason: impl Into<String>) -> Self {
        Self {
            kind,
            reason: reason.into(),
        }
    }

    pub fn capability_absent(kind: ResourceKind) -> Self {
        Self::new(kind, "capability absent")
    }
}

/// Configuration rejected before any sampling starts
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("sample count must be at least 1")]
    ZeroSampleCount,

    #[error("sample interval must be a finite, non-negative number of seconds (got {0})")]
    InvalidInterval(f64),

    #[error("accelerator timeout must be a finite, positive number of seconds (got {0})")]
    InvalidTimeout(f64),

    #[error("accelerator element count must be at least 1")]
    ZeroAcceleratorElements,

    #[error("invalid value {value:?} for {key}")]
    InvalidValue { key: &'static str, value: String },

    #[error("failed to read config file: {0}")]
    Ini(#[from] ini::Error),
}

#[derive(Debug, Error)]
pub enum BenchError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("no resources available: every probe came back empty")]
    AllResourcesAbsent,

    #[error("{0} produced no usable samples; probe layer is faulty")]
    CoreResourceAbsent(ResourceKind),
}

pub type Result<T> = std::result::Result<T, BenchError>;
