use std::sync::mpsc;
use std::sync::{Arc, Mutex, TryLockError};
use std::thread;
use std::time::Instant;

use super::aggregate::aggregate;
use super::observer::{BenchObserver, TracingObserver};
use super::sampler::sample;
use super::scorer::{score, ResourceScore};
use crate::config::BenchConfig;
use crate::error::Result;
use crate::monitor::{
    AcceleratorProbe, CpuProbe, MemoryProbe, Probe, ResourceKind, SampleSeries, StorageProbe,
};
use crate::report::BenchmarkReport;

/// Accelerator probe shared with the worker thread that runs it, so a
/// device that never answers can be abandoned
type SharedProbe = Arc<Mutex<Box<dyn Probe>>>;

/// One probe per resource kind
pub struct ProbeSet {
    pub cpu: Box<dyn Probe>,
    pub memory: Box<dyn Probe>,
    pub storage: Box<dyn Probe>,
    pub accelerator: Box<dyn Probe>,
}

impl ProbeSet {
    /// Probes reading the machine this process runs on
    pub fn host(config: &BenchConfig) -> Self {
        Self {
            cpu: Box::new(CpuProbe::new()),
            memory: Box::new(MemoryProbe::new()),
            storage: Box::new(StorageProbe::new()),
            accelerator: Box::new(AcceleratorProbe::new(
                config.accelerator_elements,
                config.accelerator_enabled,
            )),
        }
    }
}

/// Runs every resource benchmark and folds the scores into a report
pub struct BenchmarkOrchestrator<O = TracingObserver> {
    cpu: Box<dyn Probe>,
    memory: Box<dyn Probe>,
    storage: Box<dyn Probe>,
    accelerator: SharedProbe,
    observer: O,
}

impl BenchmarkOrchestrator<TracingObserver> {
    pub fn new(probes: ProbeSet) -> Self {
        Self::with_observer(probes, TracingObserver)
    }
}

impl<O: BenchObserver> BenchmarkOrchestrator<O> {
    pub fn with_observer(probes: ProbeSet, observer: O) -> Self {
        Self {
            cpu: probes.cpu,
            memory: probes.memory,
            storage: probes.storage,
            accelerator: Arc::new(Mutex::new(probes.accelerator)),
            observer,
        }
    }

    /// Sample, score and aggregate every resource.
    ///
    /// The report is only returned once complete. Zero present scores,
    /// or a missing core resource under the strict policy, is an error.
    pub fn run(&mut self, config: &BenchConfig) -> Result<BenchmarkReport> {
        config.validate()?;
        let start = Instant::now();

        let scores = if config.concurrent {
            self.run_concurrent(config)
        } else {
            self.run_sequential(config)
        };

        let overall = aggregate(&scores, config.policy)?;
        let report = BenchmarkReport::new(&scores, overall, start.elapsed())?;
        self.observer.finished(&report);
        Ok(report)
    }

    fn run_sequential(&mut self, config: &BenchConfig) -> Vec<ResourceScore> {
        let observer = &self.observer;
        ResourceKind::ALL
            .iter()
            .map(|&kind| match kind {
                ResourceKind::Cpu => score_probe(observer, &mut *self.cpu, config),
                ResourceKind::Memory => score_probe(observer, &mut *self.memory, config),
                ResourceKind::Storage => score_probe(observer, &mut *self.storage, config),
                ResourceKind::Accelerator => {
                    observer.resource_started(kind);
                    score_series(observer, &sample_accelerator(&self.accelerator, config))
                }
            })
            .collect()
    }

    /// One thread per resource; each owns its probe exclusively
    fn run_concurrent(&mut self, config: &BenchConfig) -> Vec<ResourceScore> {
        let observer = &self.observer;
        let accelerator = &self.accelerator;
        let (cpu, memory, storage) = (&mut self.cpu, &mut self.memory, &mut self.storage);

        thread::scope(|scope| {
            let handles = [
                (
                    ResourceKind::Cpu,
                    scope.spawn(move || score_probe(observer, &mut **cpu, config)),
                ),
                (
                    ResourceKind::Accelerator,
                    scope.spawn(move || {
                        observer.resource_started(ResourceKind::Accelerator);
                        score_series(observer, &sample_accelerator(accelerator, config))
                    }),
                ),
                (
                    ResourceKind::Memory,
                    scope.spawn(move || score_probe(observer, &mut **memory, config)),
                ),
                (
                    ResourceKind::Storage,
                    scope.spawn(move || score_probe(observer, &mut **storage, config)),
                ),
            ];

            handles
                .into_iter()
                .map(|(kind, handle)| {
                    handle
                        .join()
                        .unwrap_or_else(|_| ResourceScore::absent(kind, "probe panicked"))
                })
                .collect()
        })
    }
}

fn score_probe<O: BenchObserver>(
    observer: &O,
    probe: &mut dyn Probe,
    config: &BenchConfig,
) -> ResourceScore {
    observer.resource_started(probe.kind());
    score_series(observer, &sample_probe(probe, config))
}

fn score_series<O: BenchObserver>(observer: &O, series: &SampleSeries) -> ResourceScore {
    observer.resource_sampled(series);
    let score = score(series);
    observer.resource_scored(&score);
    score
}

fn sample_probe(probe: &mut dyn Probe, config: &BenchConfig) -> SampleSeries {
    sample(
        probe.kind(),
        probe,
        config.sample_count,
        config.sample_interval,
    )
}

/// Run the accelerator probe on its own thread and wait at most
/// `accelerator_timeout` for it
fn sample_accelerator(probe: &SharedProbe, config: &BenchConfig) -> SampleSeries {
    const KIND: ResourceKind = ResourceKind::Accelerator;

    let (tx, rx) = mpsc::channel();
    let worker_probe = Arc::clone(probe);
    let (count, interval) = (config.sample_count, config.sample_interval);

    let spawned = thread::Builder::new()
        .name("accelerator-probe".to_string())
        .spawn(move || {
            let series = match worker_probe.try_lock() {
                Ok(mut probe) => sample(KIND, &mut **probe, count, interval),
                Err(TryLockError::WouldBlock) => {
                    SampleSeries::absent(KIND, "device still busy from an earlier run")
                }
                Err(TryLockError::Poisoned(_)) => {
                    SampleSeries::absent(KIND, "probe panicked in an earlier run")
                }
            };
            // The receiver is gone if we already timed out
            let _ = tx.send(series);
        });
    if let Err(e) = spawned {
        return SampleSeries::absent(KIND, format!("failed to start probe thread: {e}"));
    }

    match rx.recv_timeout(config.accelerator_timeout) {
        Ok(series) => series,
        Err(mpsc::RecvTimeoutError::Timeout) => {
            tracing::warn!(timeout = ?config.accelerator_timeout, "accelerator did not respond");
            SampleSeries::absent(KIND, "timed out")
        }
        Err(mpsc::RecvTimeoutError::Disconnected) => SampleSeries::absent(KIND, "probe panicked"),
    }
}
