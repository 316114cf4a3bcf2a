//! Configuration for a campaign: number of states, step budget, enumeration mode, checkpoint
//! cadence, and worker count. Defaults are read from an on-disk TOML file (created with
//! defaults on first run if absent) and then overridden field-by-field by the builder, which
//! the CLI front-end feeds from explicit flags.

use std::fmt::Display;
use std::path::PathBuf;
use std::sync::LazyLock;

use num_format::ToFormattedString;

use crate::encoder::Symbol;
use crate::toml::ConfigToml;

pub const DEFAULT_OUTPUT_FILE: &str = "distribution.json";
pub const DEFAULT_CHECKPOINT_FILE: &str = "checkpoint.json";

/// Read config.toml only once.
pub static CONFIG_TOML: LazyLock<ConfigToml> = LazyLock::new(ConfigToml::read_toml);

/// This is used to define the CPU usage during a campaign.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoreUsage {
    SingleCore,
    MultiCore(usize),
}

impl CoreUsage {
    pub fn worker_count(self) -> usize {
        match self {
            CoreUsage::SingleCore => 1,
            CoreUsage::MultiCore(n) => n.max(1),
        }
    }
}

/// Immutable, cloneable configuration for one campaign. Use [`Config::builder`], or
/// [`Config::builder_from_config`] to start from an existing config's values.
#[derive(Debug, Clone)]
pub struct Config {
    n_states: usize,
    max_steps: u64,
    use_reduced_enum: bool,
    blank_symbol: Symbol,
    checkpoint_interval: u64,
    batch_size: u128,
    core_usage: CoreUsage,
    limit: Option<u128>,
    output_file: PathBuf,
    checkpoint_file: PathBuf,
}

impl Config {
    pub fn builder(n_states: usize) -> ConfigBuilder {
        ConfigBuilder::new(n_states)
    }

    pub fn builder_from_config(config: &Config) -> ConfigBuilder {
        ConfigBuilder::new_config(config.clone())
    }

    /// Step budget default for n_states, used when no explicit `--max-steps` is given.
    pub fn max_steps_default(n_states: usize) -> u64 {
        match n_states {
            1 => 10,
            2 => 100,
            3 => 500,
            4 => 2_000,
            _ => 10_000,
        }
    }

    pub fn new_default(n_states: usize) -> Config {
        Self {
            n_states,
            max_steps: Self::max_steps_default(n_states),
            use_reduced_enum: false,
            blank_symbol: 0,
            checkpoint_interval: CONFIG_TOML.checkpoint_interval(),
            batch_size: CONFIG_TOML.batch_size() as u128,
            core_usage: CoreUsage::MultiCore(crate::utils::num_cpus_percentage(
                CONFIG_TOML.cpu_utilization_percent(),
            )),
            limit: None,
            output_file: PathBuf::from(DEFAULT_OUTPUT_FILE),
            checkpoint_file: PathBuf::from(DEFAULT_CHECKPOINT_FILE),
        }
    }

    pub fn n_states(&self) -> usize {
        self.n_states
    }

    pub fn max_steps(&self) -> u64 {
        self.max_steps
    }

    pub fn use_reduced_enum(&self) -> bool {
        self.use_reduced_enum
    }

    pub fn blank_symbol(&self) -> Symbol {
        self.blank_symbol
    }

    pub fn checkpoint_interval(&self) -> u64 {
        self.checkpoint_interval
    }

    pub fn batch_size(&self) -> u128 {
        self.batch_size
    }

    pub fn core_usage(&self) -> CoreUsage {
        self.core_usage
    }

    pub fn worker_count(&self) -> usize {
        self.core_usage.worker_count()
    }

    pub fn limit(&self) -> Option<u128> {
        self.limit
    }

    pub fn output_file(&self) -> &std::path::Path {
        &self.output_file
    }

    pub fn checkpoint_file(&self) -> &std::path::Path {
        &self.checkpoint_file
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new_default(5)
    }
}

#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
    max_steps: Option<u64>,
    use_reduced_enum: Option<bool>,
    blank_symbol: Option<Symbol>,
    checkpoint_interval: Option<u64>,
    batch_size: Option<u128>,
    core_usage: Option<CoreUsage>,
    limit: Option<u128>,
    output_file: Option<PathBuf>,
    checkpoint_file: Option<PathBuf>,
}

impl ConfigBuilder {
    fn new(n_states: usize) -> Self {
        Self {
            config: Config::new_default(n_states),
            ..Default::default()
        }
    }

    fn new_config(config: Config) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    pub fn max_steps(mut self, value: u64) -> Self {
        self.max_steps = Some(value);
        self
    }

    pub fn use_reduced_enum(mut self, value: bool) -> Self {
        self.use_reduced_enum = Some(value);
        self
    }

    pub fn blank_symbol(mut self, value: Symbol) -> Self {
        self.blank_symbol = Some(value);
        self
    }

    pub fn checkpoint_interval(mut self, value: u64) -> Self {
        self.checkpoint_interval = Some(value);
        self
    }

    pub fn batch_size(mut self, value: u128) -> Self {
        self.batch_size = Some(value);
        self
    }

    pub fn core_usage(mut self, value: CoreUsage) -> Self {
        self.core_usage = Some(value);
        self
    }

    pub fn limit(mut self, value: u128) -> Self {
        self.limit = Some(value);
        self
    }

    pub fn output_file(mut self, value: PathBuf) -> Self {
        self.output_file = Some(value);
        self
    }

    pub fn checkpoint_file(mut self, value: PathBuf) -> Self {
        self.checkpoint_file = Some(value);
        self
    }

    pub fn build(self) -> Config {
        Config {
            n_states: self.config.n_states,
            max_steps: self.max_steps.unwrap_or(self.config.max_steps),
            use_reduced_enum: self
                .use_reduced_enum
                .unwrap_or(self.config.use_reduced_enum),
            blank_symbol: self.blank_symbol.unwrap_or(self.config.blank_symbol),
            checkpoint_interval: self
                .checkpoint_interval
                .unwrap_or(self.config.checkpoint_interval),
            batch_size: self.batch_size.unwrap_or(self.config.batch_size),
            core_usage: self.core_usage.unwrap_or(self.config.core_usage),
            limit: self.limit.or(self.config.limit),
            output_file: self.output_file.unwrap_or(self.config.output_file),
            checkpoint_file: self.checkpoint_file.unwrap_or(self.config.checkpoint_file),
        }
    }
}

impl Display for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let locale = user_locale();
        writeln!(
            f,
            "n_states: {}, max_steps: {}, mode: {}",
            self.n_states,
            self.max_steps.to_formatted_string(&locale),
            if self.use_reduced_enum { "reduced" } else { "raw" }
        )?;
        write!(
            f,
            "batch_size: {}, checkpoint_interval: {}, workers: {}",
            self.batch_size.to_formatted_string(&locale),
            self.checkpoint_interval.to_formatted_string(&locale),
            self.worker_count()
        )
    }
}

pub fn user_locale() -> num_format::Locale {
    num_format::Locale::en
}
