use std::thread;
use std::time::Duration;

use sysinfo::System;

use super::{Measurement, Probe, RawReading, ResourceKind};
use crate::error::ProbeUnavailable;

/// Per-core CPU utilization, measured across a window
pub struct CpuProbe {
    system: System,
}

impl CpuProbe {
    pub fn new() -> Self {
        let mut system = System::new();
        // Initial refresh to get baseline
        system.refresh_cpu_usage();
        Self { system }
    }

    /// Returns CPU usage for each core in percent (0.0 to 100.0)
    pub fn per_core_usage(&self) -> Vec<f64> {
        self.system
            .cpus()
            .iter()
            .map(|cpu| f64::from(cpu.cpu_usage()))
            .collect()
    }
}

impl Default for CpuProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl Probe for CpuProbe {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Cpu
    }

    fn measures_over_window(&self) -> bool {
        true
    }

    fn read(&mut self, window: Duration) -> Result<Vec<RawReading>, ProbeUnavailable> {
        // Usage is the delta between two refreshes, so the window must not be
        // shorter than what sysinfo can resolve.
        self.system.refresh_cpu_usage();
        thread::sleep(window.max(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL));
        self.system.refresh_cpu_usage();

        let cores = self.per_core_usage();
        if cores.is_empty() {
            return Ok(vec![RawReading::unavailable("no logical cores reported")]);
        }
        Ok(vec![Measurement::Cpu(cores).into()])
    }
}
