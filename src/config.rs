use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use ini::Ini;

use crate::bench::AggregationPolicy;
use crate::error::ConfigError;

/// INI section holding the benchmark settings
const SECTION: &str = "benchmark";

/// Validated settings for one benchmark run
#[derive(Debug, Clone, PartialEq)]
pub struct BenchConfig {
    /// Readings taken for Cpu and Memory
    pub sample_count: usize,
    /// Cadence of Cpu/Memory readings; also the CPU measurement window
    pub sample_interval: Duration,
    /// f32 elements per buffer in the accelerator kernel
    pub accelerator_elements: u64,
    /// Run the accelerator benchmark at all
    pub accelerator_enabled: bool,
    /// Give up on an unresponsive accelerator after this long
    pub accelerator_timeout: Duration,
    /// Sample all resources in parallel instead of one after another
    pub concurrent: bool,
    pub policy: AggregationPolicy,
}

impl BenchConfig {
    pub const DEFAULT_SAMPLE_COUNT: usize = 5;
    pub const DEFAULT_SAMPLE_INTERVAL: Duration = Duration::from_secs(1);
    pub const DEFAULT_ACCELERATOR_ELEMENTS: u64 = 10 * 1024 * 1024;
    pub const DEFAULT_ACCELERATOR_TIMEOUT: Duration = Duration::from_secs(30);

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sample_count == 0 {
            return Err(ConfigError::ZeroSampleCount);
        }
        if self.accelerator_elements == 0 {
            return Err(ConfigError::ZeroAcceleratorElements);
        }
        if self.accelerator_timeout.is_zero() {
            return Err(ConfigError::InvalidTimeout(0.0));
        }
        Ok(())
    }

    /// Apply `overrides` on top of the defaults and validate the result
    pub fn from_overrides(overrides: &ConfigOverrides) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(count) = overrides.sample_count {
            config.sample_count = count;
        }
        if let Some(secs) = overrides.sample_interval {
            config.sample_interval =
                Duration::try_from_secs_f64(secs).map_err(|_| ConfigError::InvalidInterval(secs))?;
        }
        if let Some(elements) = overrides.accelerator_elements {
            config.accelerator_elements = elements;
        }
        if let Some(secs) = overrides.accelerator_timeout {
            config.accelerator_timeout =
                Duration::try_from_secs_f64(secs).map_err(|_| ConfigError::InvalidTimeout(secs))?;
        }
        if let Some(enabled) = overrides.accelerator {
            config.accelerator_enabled = enabled;
        }
        if let Some(concurrent) = overrides.concurrent {
            config.concurrent = concurrent;
        }
        if let Some(policy) = overrides.policy {
            config.policy = policy;
        }

        config.validate()?;
        Ok(config)
    }
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            sample_count: Self::DEFAULT_SAMPLE_COUNT,
            sample_interval: Self::DEFAULT_SAMPLE_INTERVAL,
            accelerator_elements: Self::DEFAULT_ACCELERATOR_ELEMENTS,
            accelerator_enabled: true,
            accelerator_timeout: Self::DEFAULT_ACCELERATOR_TIMEOUT,
            concurrent: false,
            policy: AggregationPolicy::Strict,
        }
    }
}

/// Unvalidated settings from one source (config file or command line).
/// Intervals stay as raw seconds so bad input can be reported.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigOverrides {
    pub sample_count: Option<usize>,
    pub sample_interval: Option<f64>,
    pub accelerator_elements: Option<u64>,
    pub accelerator_timeout: Option<f64>,
    pub accelerator: Option<bool>,
    pub concurrent: Option<bool>,
    pub policy: Option<AggregationPolicy>,
}

impl ConfigOverrides {
    /// Parse the `[benchmark]` section of a bench.ini
    pub fn from_ini(ini: &Ini) -> Result<Self, ConfigError> {
        let Some(section) = ini.section(Some(SECTION)) else {
            return Ok(Self::default());
        };

        Ok(Self {
            sample_count: parse_key(section.get("SampleCount"), "SampleCount")?,
            sample_interval: parse_key(section.get("SampleInterval"), "SampleInterval")?,
            accelerator_elements: parse_key(
                section.get("AcceleratorElements"),
                "AcceleratorElements",
            )?,
            accelerator_timeout: parse_key(
                section.get("AcceleratorTimeout"),
                "AcceleratorTimeout",
            )?,
            accelerator: parse_flag(section.get("Accelerator"), "Accelerator")?,
            concurrent: parse_flag(section.get("Concurrent"), "Concurrent")?,
            policy: parse_key(section.get("Policy"), "Policy")?,
        })
    }

    pub fn from_ini_file(path: &Path) -> Result<Self, ConfigError> {
        let ini = Ini::load_from_file(path)?;
        Self::from_ini(&ini)
    }

    /// Values set in `other` win over values set in `self`
    pub fn merge(self, other: Self) -> Self {
        Self {
            sample_count: other.sample_count.or(self.sample_count),
            sample_interval: other.sample_interval.or(self.sample_interval),
            accelerator_elements: other.accelerator_elements.or(self.accelerator_elements),
            accelerator_timeout: other.accelerator_timeout.or(self.accelerator_timeout),
            accelerator: other.accelerator.or(self.accelerator),
            concurrent: other.concurrent.or(self.concurrent),
            policy: other.policy.or(self.policy),
        }
    }
}

fn parse_key<T: FromStr>(value: Option<&str>, key: &'static str) -> Result<Option<T>, ConfigError> {
    value
        .map(|v| {
            v.trim().parse().map_err(|_| ConfigError::InvalidValue {
                key,
                value: v.to_string(),
            })
        })
        .transpose()
}

/// Flags follow the 0/1 convention, but true/false is accepted too
fn parse_flag(value: Option<&str>, key: &'static str) -> Result<Option<bool>, ConfigError> {
    value
        .map(|v| match v.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::InvalidValue {
                key,
                value: v.to_string(),
            }),
        })
        .transpose()
}

/// `<user config dir>/system-bench/bench.ini`
pub fn default_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "system-bench")
        .map(|dirs| dirs.config_dir().join("bench.ini"))
}

/// Resolve the run configuration: defaults, then the config file, then `cli`.
///
/// An explicitly given file must exist; the default location is optional.
pub fn load(explicit: Option<&Path>, cli: ConfigOverrides) -> Result<BenchConfig, ConfigError> {
    let file = match explicit {
        Some(path) => {
            tracing::debug!(path = %path.display(), "loading config");
            ConfigOverrides::from_ini_file(path)?
        }
        None => match default_config_path() {
            Some(path) if path.exists() => {
                tracing::debug!(path = %path.display(), "loading config");
                ConfigOverrides::from_ini_file(&path)?
            }
            _ => ConfigOverrides::default(),
        },
    };

    BenchConfig::from_overrides(&file.merge(cli))
}
