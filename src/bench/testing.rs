//! Deterministic probes for exercising the engine without touching the host.

use std::thread;
use std::time::Duration;

use crate::error::ProbeUnavailable;
use crate::monitor::{Measurement, Probe, RawReading, ResourceKind};

pub struct ScriptedProbe {
    kind: ResourceKind,
    rounds: Vec<Vec<RawReading>>,
    fail_on: Vec<usize>,
    absent: bool,
    delay: Duration,
    calls: usize,
}

impl ScriptedProbe {
    fn with_rounds(kind: ResourceKind, rounds: Vec<Vec<RawReading>>) -> Self {
        Self {
            kind,
            rounds,
            fail_on: Vec::new(),
            absent: false,
            delay: Duration::ZERO,
            calls: 0,
        }
    }

    /// One round per row; the last row repeats once the script runs out
    pub fn cpu(rows: &[&[f64]]) -> Self {
        let rounds = rows
            .iter()
            .map(|row| vec![Measurement::Cpu(row.to_vec()).into()])
            .collect();
        Self::with_rounds(ResourceKind::Cpu, rounds)
    }

    pub fn memory(values: &[f64]) -> Self {
        let rounds = values
            .iter()
            .map(|v| vec![Measurement::Memory(*v).into()])
            .collect();
        Self::with_rounds(ResourceKind::Memory, rounds)
    }

    /// A single round with one reading per volume
    pub fn storage(percents: &[f64]) -> Self {
        let readings = percents
            .iter()
            .enumerate()
            .map(|(i, p)| {
                Measurement::Storage {
                    volume: format!("/mnt/vol{i}"),
                    percent: *p,
                }
                .into()
            })
            .collect();
        Self::with_rounds(ResourceKind::Storage, vec![readings])
    }

    pub fn accelerator(elements_per_sec: f64) -> Self {
        let reading = Measurement::Accelerator {
            device: "scripted".to_string(),
            elements_per_sec,
        };
        Self::with_rounds(ResourceKind::Accelerator, vec![vec![reading.into()]])
    }

    /// Every call reports the capability as missing
    pub fn absent(kind: ResourceKind) -> Self {
        let mut probe = Self::with_rounds(kind, Vec::new());
        probe.absent = true;
        probe
    }

    /// Fail the calls with these zero-based indices
    pub fn failing_on(mut self, calls: &[usize]) -> Self {
        self.fail_on = calls.to_vec();
        self
    }

    /// Block for `delay` on every call
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls
    }
}

impl Probe for ScriptedProbe {
    fn kind(&self) -> ResourceKind {
        self.kind
    }

    fn read(&mut self, _window: Duration) -> Result<Vec<RawReading>, ProbeUnavailable> {
        let call = self.calls;
        self.calls += 1;
        if !self.delay.is_zero() {
            thread::sleep(self.delay);
        }

        if self.absent {
            return Err(ProbeUnavailable::capability_absent(self.kind));
        }
        if self.fail_on.contains(&call) {
            return Err(ProbeUnavailable::new(self.kind, "scripted failure"));
        }
        let round = call.min(self.rounds.len().saturating_sub(1));
        Ok(self.rounds.get(round).cloned().unwrap_or_default())
    }
}
