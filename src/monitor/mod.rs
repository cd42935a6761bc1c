mod accelerator;
mod cpu;
mod disk;
mod memory;

use std::fmt;
use std::time::Duration;

use serde::Serialize;

use crate::error::ProbeUnavailable;

pub use accelerator::AcceleratorProbe;
pub use cpu::CpuProbe;
pub use disk::StorageProbe;
pub use memory::MemoryProbe;

/// The measured subsystems
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Cpu,
    Memory,
    Storage,
    Accelerator,
}

impl ResourceKind {
    /// Default run order. Only wall time and log order depend on it.
    pub const ALL: [ResourceKind; 4] = [Self::Cpu, Self::Accelerator, Self::Memory, Self::Storage];

    /// Cpu and Memory are polled repeatedly; Storage and Accelerator once
    pub fn is_repeated(&self) -> bool {
        matches!(self, Self::Cpu | Self::Memory)
    }

    /// Absence of these indicates a broken probe rather than missing hardware
    pub fn is_core(&self) -> bool {
        !matches!(self, Self::Accelerator)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Cpu => "CPU",
            Self::Memory => "RAM",
            Self::Storage => "Drive",
            Self::Accelerator => "GPU",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A single raw measurement; the payload shape depends on the resource
#[derive(Debug, Clone, PartialEq)]
pub enum Measurement {
    /// Utilization of each logical core, in percent
    Cpu(Vec<f64>),
    /// Used memory, in percent of total
    Memory(f64),
    /// Used space of one mounted volume, in percent
    Storage { volume: String, percent: f64 },
    /// Elements processed per second by the square kernel
    Accelerator { device: String, elements_per_sec: f64 },
}

impl Measurement {
    pub fn kind(&self) -> ResourceKind {
        match self {
            Self::Cpu(_) => ResourceKind::Cpu,
            Self::Memory(_) => ResourceKind::Memory,
            Self::Storage { .. } => ResourceKind::Storage,
            Self::Accelerator { .. } => ResourceKind::Accelerator,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RawReading {
    Available(Measurement),
    Unavailable { reason: String },
}

impl RawReading {
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable {
            reason: reason.into(),
        }
    }

    pub fn measurement(&self) -> Option<&Measurement> {
        match self {
            Self::Available(m) => Some(m),
            Self::Unavailable { .. } => None,
        }
    }
}

impl From<Measurement> for RawReading {
    fn from(m: Measurement) -> Self {
        Self::Available(m)
    }
}

/// Ordered readings taken from one probe during a run
#[derive(Debug, Clone, PartialEq)]
pub struct SampleSeries {
    pub kind: ResourceKind,
    pub readings: Vec<RawReading>,
    /// Set when a once-only probe reported the whole capability missing
    pub absence: Option<String>,
}

impl SampleSeries {
    pub fn new(kind: ResourceKind) -> Self {
        Self {
            kind,
            readings: Vec::new(),
            absence: None,
        }
    }

    pub fn absent(kind: ResourceKind, reason: impl Into<String>) -> Self {
        Self {
            kind,
            readings: Vec::new(),
            absence: Some(reason.into()),
        }
    }

    /// Readings that carry a measurement of this series' kind
    pub fn usable(&self) -> impl Iterator<Item = &Measurement> {
        let kind = self.kind;
        self.readings
            .iter()
            .filter_map(RawReading::measurement)
            .filter(move |m| m.kind() == kind)
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }
}

/// Source of raw readings for one resource kind
pub trait Probe: Send {
    fn kind(&self) -> ResourceKind;

    /// Whether `read` itself spends `window` measuring. Such probes are not
    /// additionally slept between calls.
    fn measures_over_window(&self) -> bool {
        false
    }

    /// Take one reading round.
    ///
    /// Repeated probes return exactly one reading per call. Once-only probes
    /// return every reading they have (possibly none). `Err` means the
    /// capability is missing altogether.
    fn read(&mut self, window: Duration) -> Result<Vec<RawReading>, ProbeUnavailable>;
}
