//! Reads and writes campaign defaults into a TOML configuration file, created with defaults on
//! first run if absent. Kept deliberately thin: one-off overrides (file paths, `--limit`) stay
//! CLI-only and never round-trip through this file.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::CtmResult;

const CONFIG_FILE: &str = "ctm_estimator.toml";

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ConfigToml {
    /// Number of TMs processed between checkpoints.
    #[serde(default = "default_checkpoint_interval")]
    checkpoint_interval: u64,

    /// Size of a chunk handed to one worker thread at a time.
    #[serde(default = "default_batch_size")]
    batch_size: usize,

    /// CPU utilization in percent, e.g. 75 -> 6 of 8 cores used. 0-150 allowed.
    #[serde(default = "default_cpu_utilization_percent")]
    cpu_utilization_percent: usize,
}

impl ConfigToml {
    pub fn read_toml() -> ConfigToml {
        if Path::new(CONFIG_FILE).exists() {
            let config_content = fs::read_to_string(CONFIG_FILE)
                .expect("Config file {CONFIG_FILE} could not be read.");
            toml::from_str(&config_content).expect("Config file {CONFIG_FILE} could not be parsed.")
        } else {
            println!(
                "Config file {CONFIG_FILE} not found, creating a new one with default values."
            );
            let default_config = ConfigToml::default();
            let toml_string = toml::to_string_pretty(&default_config)
                .expect("Failed to serialize default config");
            let write_result = fs::write(CONFIG_FILE, toml_string);
            if write_result.is_err() {
                println!(
                    "ERROR: Config file {CONFIG_FILE} was not found and could not be written. Using default values, some functionality might not be available."
                );
            }
            default_config
        }
    }

    pub fn checkpoint_interval(&self) -> u64 {
        self.checkpoint_interval
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn cpu_utilization_percent(&self) -> usize {
        self.cpu_utilization_percent
    }

    /// Reads an explicit config file (the `--config-file` override), rather than the fixed
    /// [`CONFIG_FILE`] name consulted by [`Self::read_toml`].
    pub fn read_toml_path(path: &Path) -> CtmResult<ConfigToml> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }
}

impl Default for ConfigToml {
    fn default() -> Self {
        ConfigToml {
            checkpoint_interval: default_checkpoint_interval(),
            batch_size: default_batch_size(),
            cpu_utilization_percent: default_cpu_utilization_percent(),
        }
    }
}

fn default_checkpoint_interval() -> u64 {
    100_000
}

fn default_batch_size() -> usize {
    10_000
}

fn default_cpu_utilization_percent() -> usize {
    100
}
