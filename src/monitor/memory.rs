use std::time::Duration;

use sysinfo::System;

use super::{Measurement, Probe, RawReading, ResourceKind};
use crate::error::ProbeUnavailable;

pub struct MemoryProbe {
    system: System,
}

impl MemoryProbe {
    pub fn new() -> Self {
        let mut system = System::new();
        system.refresh_memory();
        Self { system }
    }

    /// Returns memory usage in percent, or `None` when the host reports no memory
    pub fn usage_percent(&self) -> Option<f64> {
        let total = self.system.total_memory();
        let used = self.system.used_memory();

        if total == 0 {
            return None;
        }

        Some(used as f64 / total as f64 * 100.0)
    }
}

impl Default for MemoryProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl Probe for MemoryProbe {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Memory
    }

    fn read(&mut self, _window: Duration) -> Result<Vec<RawReading>, ProbeUnavailable> {
        self.system.refresh_memory();
        let reading = match self.usage_percent() {
            Some(percent) => Measurement::Memory(percent).into(),
            None => RawReading::unavailable("total memory reported as zero"),
        };
        Ok(vec![reading])
    }
}
