use std::io::{self, Write};

use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::bench::{BenchmarkOrchestrator, ProbeSet};
use crate::config::BenchConfig;
use crate::error::BenchError;
use crate::report::BenchmarkReport;

/// How the finished report is presented
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// Plain text summary on stdout
    #[default]
    Text,
    /// Pretty-printed JSON on stdout
    Json,
}

/// One benchmark invocation against the host machine
pub struct App {
    config: BenchConfig,
    output: OutputMode,
    show_window: bool,
}

impl App {
    pub fn new(config: BenchConfig, output: OutputMode, show_window: bool) -> Self {
        Self {
            config,
            output,
            show_window,
        }
    }

    /// Sample the host and build the report
    pub fn run(&self) -> Result<BenchmarkReport, BenchError> {
        tracing::info!(
            samples = self.config.sample_count,
            interval = ?self.config.sample_interval,
            concurrent = self.config.concurrent,
            policy = %self.config.policy,
            "starting benchmark"
        );

        let mut orchestrator = BenchmarkOrchestrator::new(ProbeSet::host(&self.config));
        orchestrator.run(&self.config)
    }

    /// Write the report to stdout and, if asked for, open the results window
    pub fn present(&self, report: &BenchmarkReport) -> Result<(), Box<dyn std::error::Error>> {
        self.write_report(report, &mut io::stdout().lock())?;

        if self.show_window {
            self.open_window(report)?;
        }
        Ok(())
    }

    /// Render the report in the configured output mode. Nothing else goes to `out`.
    pub fn write_report<W: Write>(
        &self,
        report: &BenchmarkReport,
        out: &mut W,
    ) -> Result<(), Box<dyn std::error::Error>> {
        match self.output {
            OutputMode::Text => writeln!(out, "\n{report}")?,
            OutputMode::Json => writeln!(out, "{}", report.to_json()?)?,
        }
        out.flush()?;
        Ok(())
    }

    #[cfg(feature = "gui")]
    fn open_window(&self, report: &BenchmarkReport) -> Result<(), Box<dyn std::error::Error>> {
        crate::ui::show_results(report)?;
        Ok(())
    }

    #[cfg(not(feature = "gui"))]
    fn open_window(&self, _report: &BenchmarkReport) -> Result<(), Box<dyn std::error::Error>> {
        tracing::warn!("built without the `gui` feature, results window unavailable");
        Ok(())
    }
}

/// Narration subscriber writing to `make_writer`; `-v` raises the level to debug
pub fn log_subscriber<W>(verbose: bool, make_writer: W) -> impl tracing::Subscriber + Send + Sync
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let log_level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with_target(false)
        .with_writer(make_writer)
        .finish()
}

/// Install the global subscriber. Logs go to stderr so stdout carries only the report.
pub fn init_logging(verbose: bool) {
    log_subscriber(verbose, io::stderr).init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bench::testing::ScriptedProbe;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().write(buf)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn json_output_is_not_mixed_with_narration() {
        let logs = SharedBuf::default();
        let log_sink = logs.clone();
        let subscriber = log_subscriber(true, move || log_sink.clone());

        let config = BenchConfig {
            sample_interval: Duration::ZERO,
            ..BenchConfig::default()
        };
        let app = App::new(config.clone(), OutputMode::Json, false);
        let mut stdout = Vec::new();

        tracing::subscriber::with_default(subscriber, || {
            let probes = ProbeSet {
                cpu: Box::new(ScriptedProbe::cpu(&[&[0.5, 0.5]])),
                memory: Box::new(ScriptedProbe::memory(&[50.0])),
                storage: Box::new(ScriptedProbe::storage(&[20.0, 80.0])),
                accelerator: Box::new(ScriptedProbe::absent(crate::monitor::ResourceKind::Accelerator)),
            };
            let report = BenchmarkOrchestrator::new(probes).run(&config).unwrap();
            app.write_report(&report, &mut stdout).unwrap();
        });

        let value: serde_json::Value = serde_json::from_slice(&stdout).unwrap();
        assert_eq!(value["overall_score"], 50.0);

        let logged = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
        assert!(logged.contains("Overall score"));
    }

    #[test]
    fn text_output_lists_every_score() {
        let app = App::new(BenchConfig::default(), OutputMode::Text, false);
        let scores = vec![
            crate::bench::ResourceScore::present(crate::monitor::ResourceKind::Cpu, 10.0),
            crate::bench::ResourceScore::present(crate::monitor::ResourceKind::Memory, 20.0),
            crate::bench::ResourceScore::present(crate::monitor::ResourceKind::Storage, 30.0),
        ];
        let report = BenchmarkReport::new(&scores, 20.0, Duration::ZERO).unwrap();
        let mut out = Vec::new();
        app.write_report(&report, &mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("RAM Score:     20.00"));
        assert!(text.contains("Overall Score: 20.00"));
    }
}
