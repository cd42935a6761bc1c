use std::thread;
use std::time::Duration;

use crate::monitor::{Probe, RawReading, ResourceKind, SampleSeries};

/// Drive `probe` at a fixed cadence and collect its readings.
///
/// Repeated kinds (Cpu, Memory) get exactly `iterations` readings; a failed
/// call turns into one unavailable reading. Once-only kinds (Storage,
/// Accelerator) are read a single time, and a failed call yields an empty
/// series tagged with the reason.
pub fn sample(
    kind: ResourceKind,
    probe: &mut dyn Probe,
    iterations: usize,
    interval: Duration,
) -> SampleSeries {
    debug_assert_eq!(kind, probe.kind());

    if !kind.is_repeated() {
        return match probe.read(interval) {
            Ok(readings) => SampleSeries {
                kind,
                readings,
                absence: None,
            },
            Err(e) => SampleSeries::absent(kind, e.reason),
        };
    }

    let mut series = SampleSeries::new(kind);
    for i in 0..iterations {
        let reading = match probe.read(interval) {
            Ok(mut readings) if !readings.is_empty() => {
                if readings.len() > 1 {
                    tracing::warn!(%kind, count = readings.len(), "repeated probe returned several readings, keeping the first");
                }
                readings.swap_remove(0)
            }
            Ok(_) => RawReading::unavailable("probe returned no reading"),
            Err(e) => RawReading::unavailable(e.reason),
        };
        tracing::debug!(%kind, sample = i + 1, ?reading, "sampled");
        series.readings.push(reading);

        if !probe.measures_over_window() && i + 1 < iterations {
            thread::sleep(interval);
        }
    }
    series
}
