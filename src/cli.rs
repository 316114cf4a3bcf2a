//! Clap-derived command line surface: `run` launches a campaign, `estimate` queries a
//! previously-produced distribution file.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::{Config, CoreUsage};
use crate::driver;
use crate::encoder::Symbol;
use crate::error::{CtmError, CtmResult};
use crate::estimator::KolmogorovComplexityEstimator;
use crate::toml::ConfigToml;
use crate::utils::num_cpus_percentage;

#[derive(Parser, Debug)]
#[command(name = "ctm_estimator", about = "Estimates algorithmic complexity of binary strings via the coding theorem method")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Enumerates (n,2) machines, simulates each, and writes a distribution/checkpoint file.
    Run(RunArgs),
    /// Looks up K(s) for one or more strings against an existing distribution file.
    Estimate(EstimateArgs),
}

#[derive(Args, Debug)]
pub struct RunArgs {
    #[arg(long)]
    pub n_states: usize,
    #[arg(long)]
    pub max_steps: Option<u64>,
    #[arg(long, default_value_t = false)]
    pub use_reduced_enum: bool,
    #[arg(long, default_value_t = 0)]
    pub blank_symbol: Symbol,
    #[arg(long)]
    pub output_file: Option<PathBuf>,
    #[arg(long)]
    pub checkpoint_file: Option<PathBuf>,
    #[arg(long)]
    pub checkpoint_interval: Option<u64>,
    #[arg(long)]
    pub workers: Option<usize>,
    #[arg(long)]
    pub batch_size: Option<u128>,
    #[arg(long)]
    pub limit: Option<u128>,
    /// TOML file to read campaign defaults from, in place of the fixed `ctm_estimator.toml`.
    #[arg(long)]
    pub config_file: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct EstimateArgs {
    #[arg(long)]
    pub distribution_file: PathBuf,
    #[arg(long)]
    pub n_states: usize,
    #[arg(long)]
    pub top_n: Option<usize>,
    /// Binary strings to estimate; if empty, the full ranked distribution is printed.
    pub strings: Vec<String>,
}

/// Validates `--blank-symbol` against the `{0,1}` alphabet required by §6. A value outside that
/// range would otherwise propagate silently into `Tape::new` and corrupt the whole campaign.
fn validate_blank_symbol(blank_symbol: Symbol) -> CtmResult<Symbol> {
    if blank_symbol == 0 || blank_symbol == 1 {
        Ok(blank_symbol)
    } else {
        Err(CtmError::ConfigError(format!(
            "--blank-symbol must be 0 or 1, got {blank_symbol}"
        )))
    }
}

/// Builds the campaign [`Config`] that `run` would use, without running it. Split out from
/// [`execute_run`] so CLI argument wiring can be tested without a live campaign.
pub fn build_run_config(args: &RunArgs) -> CtmResult<Config> {
    let blank_symbol = validate_blank_symbol(args.blank_symbol)?;
    let mut builder = Config::builder(args.n_states);

    if let Some(config_file) = &args.config_file {
        let toml_cfg = ConfigToml::read_toml_path(config_file)?;
        builder = builder
            .checkpoint_interval(toml_cfg.checkpoint_interval())
            .batch_size(toml_cfg.batch_size() as u128)
            .core_usage(CoreUsage::MultiCore(num_cpus_percentage(
                toml_cfg.cpu_utilization_percent(),
            )));
    }

    if let Some(v) = args.max_steps {
        builder = builder.max_steps(v);
    }
    builder = builder
        .use_reduced_enum(args.use_reduced_enum)
        .blank_symbol(blank_symbol);
    if let Some(v) = args.checkpoint_interval {
        builder = builder.checkpoint_interval(v);
    }
    if let Some(v) = args.batch_size {
        builder = builder.batch_size(v);
    }
    if let Some(v) = args.workers {
        builder = builder.core_usage(CoreUsage::MultiCore(v));
    }
    if let Some(v) = args.limit {
        builder = builder.limit(v);
    }
    if let Some(v) = args.output_file.clone() {
        builder = builder.output_file(v);
    }
    if let Some(v) = args.checkpoint_file.clone() {
        builder = builder.checkpoint_file(v);
    }
    Ok(builder.build())
}

pub fn execute(cli: Cli) -> CtmResult<()> {
    match cli.command {
        Command::Run(args) => execute_run(&args),
        Command::Estimate(args) => execute_estimate(&args),
    }
}

fn execute_run(args: &RunArgs) -> CtmResult<()> {
    let config = build_run_config(args)?;
    println!("{config}");
    let aggregator = driver::run_campaign(&config)?;
    println!(
        "campaign finished: processed {}, halting {}",
        aggregator.total_processed_raw(),
        aggregator.total_halting_raw()
    );
    Ok(())
}

fn execute_estimate(args: &EstimateArgs) -> CtmResult<()> {
    let estimator =
        KolmogorovComplexityEstimator::from_file(&args.distribution_file, args.n_states)?;
    if args.strings.is_empty() {
        for (s, k) in estimator.ranked(args.top_n) {
            println!("{s}\t{k}");
        }
    } else {
        for s in &args.strings {
            println!("{}\t{}", s, estimator.estimate(s));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_subcommand_parses_required_flags() {
        let cli = Cli::try_parse_from([
            "ctm_estimator",
            "run",
            "--n-states",
            "3",
            "--max-steps",
            "500",
            "--use-reduced-enum",
        ])
        .unwrap();
        match cli.command {
            Command::Run(args) => {
                assert_eq!(args.n_states, 3);
                assert_eq!(args.max_steps, Some(500));
                assert!(args.use_reduced_enum);
            }
            Command::Estimate(_) => panic!("expected Run"),
        }
    }

    #[test]
    fn run_subcommand_rejects_missing_n_states() {
        let result = Cli::try_parse_from(["ctm_estimator", "run"]);
        assert!(result.is_err());
    }

    #[test]
    fn estimate_subcommand_parses_positional_strings() {
        let cli = Cli::try_parse_from([
            "ctm_estimator",
            "estimate",
            "--distribution-file",
            "distribution.json",
            "--n-states",
            "2",
            "0",
            "1",
        ])
        .unwrap();
        match cli.command {
            Command::Estimate(args) => {
                assert_eq!(args.strings, vec!["0".to_string(), "1".to_string()]);
            }
            Command::Run(_) => panic!("expected Estimate"),
        }
    }

    #[test]
    fn build_run_config_applies_overrides() {
        let args = RunArgs {
            n_states: 2,
            max_steps: Some(42),
            use_reduced_enum: true,
            blank_symbol: 0,
            output_file: None,
            checkpoint_file: None,
            checkpoint_interval: Some(10),
            workers: Some(3),
            batch_size: Some(500),
            limit: Some(1000),
            config_file: None,
        };
        let config = build_run_config(&args).unwrap();
        assert_eq!(config.max_steps(), 42);
        assert!(config.use_reduced_enum());
        assert_eq!(config.checkpoint_interval(), 10);
        assert_eq!(config.worker_count(), 3);
        assert_eq!(config.batch_size(), 500);
        assert_eq!(config.limit(), Some(1000));
    }

    #[test]
    fn build_run_config_rejects_blank_symbol_out_of_range() {
        let args = RunArgs {
            n_states: 2,
            max_steps: None,
            use_reduced_enum: false,
            blank_symbol: 2,
            output_file: None,
            checkpoint_file: None,
            checkpoint_interval: None,
            workers: None,
            batch_size: None,
            limit: None,
            config_file: None,
        };
        assert!(matches!(
            build_run_config(&args),
            Err(CtmError::ConfigError(_))
        ));
    }

    #[test]
    fn build_run_config_accepts_blank_symbol_one() {
        let args = RunArgs {
            n_states: 2,
            max_steps: None,
            use_reduced_enum: false,
            blank_symbol: 1,
            output_file: None,
            checkpoint_file: None,
            checkpoint_interval: None,
            workers: None,
            batch_size: None,
            limit: None,
            config_file: None,
        };
        let config = build_run_config(&args).unwrap();
        assert_eq!(config.blank_symbol(), 1);
    }
}
