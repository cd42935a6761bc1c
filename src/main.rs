use std::path::PathBuf;
use std::process;

use clap::Parser;

use system_bench::app::{self, App, OutputMode};
use system_bench::bench::AggregationPolicy;
use system_bench::config::{self, ConfigOverrides};

#[derive(Parser, Debug)]
#[command(name = "system-bench")]
#[command(author, version, about = "Sample CPU, RAM, disk and GPU and combine them into one score")]
struct Cli {
    /// Config file (defaults to <config dir>/system-bench/bench.ini)
    #[arg(short, long, env = "SYSTEM_BENCH_CONFIG")]
    config: Option<PathBuf>,

    /// Readings taken for CPU and RAM
    #[arg(short = 'n', long)]
    samples: Option<usize>,

    /// Seconds between CPU/RAM readings
    #[arg(short, long, allow_negative_numbers = true)]
    interval: Option<f64>,

    /// f32 elements per buffer in the GPU kernel
    #[arg(long)]
    elements: Option<u64>,

    /// Seconds to wait for the GPU before giving up on it
    #[arg(long, allow_negative_numbers = true)]
    accelerator_timeout: Option<f64>,

    /// Skip the GPU benchmark
    #[arg(long)]
    no_accelerator: bool,

    /// Sample all resources at the same time
    #[arg(long)]
    concurrent: bool,

    /// How missing CPU/RAM/disk scores are treated
    #[arg(long, value_parser = clap::value_parser!(AggregationPolicy))]
    policy: Option<AggregationPolicy>,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,

    /// Also show the results in a window (requires the `gui` feature)
    #[arg(short, long)]
    window: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            sample_count: self.samples,
            sample_interval: self.interval,
            accelerator_elements: self.elements,
            accelerator_timeout: self.accelerator_timeout,
            accelerator: self.no_accelerator.then_some(false),
            concurrent: self.concurrent.then_some(true),
            policy: self.policy,
        }
    }
}

fn main() {
    let cli = Cli::parse();

    app::init_logging(cli.verbose);

    // A run blocks for several seconds; make Ctrl-C say what happened
    if let Err(e) = ctrlc::set_handler(|| {
        tracing::warn!("benchmark interrupted");
        process::exit(130);
    }) {
        tracing::warn!(error = %e, "failed to install Ctrl-C handler");
    }

    let config = match config::load(cli.config.as_deref(), cli.overrides()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid configuration: {}", e);
            process::exit(2);
        }
    };

    let output = if cli.json {
        OutputMode::Json
    } else {
        OutputMode::Text
    };
    let app = App::new(config, output, cli.window);

    let report = match app.run() {
        Ok(report) => report,
        Err(e) => {
            eprintln!("Benchmark failed: {}", e);
            process::exit(1);
        }
    };

    if let Err(e) = app.present(&report) {
        eprintln!("Failed to present results: {}", e);
        process::exit(1);
    }
}
