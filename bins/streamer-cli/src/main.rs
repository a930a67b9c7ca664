//! streamer — command-line front end for oracle-priced token streams.
//!
//! Previews deterministic streamer addresses and runs time-stepped stream
//! simulations from a configuration file.

mod settings;
mod simulate;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::info;

use streamer_core::clock::SystemClock;
use streamer_core::ledger::MemoryLedger;
use streamer_core::types::{Address, Hash256};
use streamer_factory::address::{deployment_key, streamer_address};
use streamer_factory::{DeploymentKeyPolicy, FactoryConfig, StreamerFactory};

use crate::settings::SimulationConfig;

#[derive(Parser)]
#[command(name = "streamer", version, about = "Oracle-priced token streams")]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Log output format ("text" or "json")
    #[arg(long, global = true, default_value = "text")]
    log_format: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the address a deployment would get.
    ///
    /// Without --config the key is derived from creator and salt only
    /// (the `creator_and_salt` policy). Pass the factory's configuration
    /// to predict addresses for a factory that binds parameters into the key.
    Preview(PreviewArgs),
    /// Run a stream from deployment to completion and print every receipt.
    Simulate(SimulateArgs),
}

#[derive(Args)]
struct PreviewArgs {
    /// Factory address. Overrides the configuration file.
    #[arg(long)]
    factory: Option<Address>,

    /// Deploying caller, who becomes the stream creator.
    #[arg(long)]
    creator: Option<Address>,

    /// 32-byte hex salt.
    #[arg(long)]
    salt: Option<Hash256>,

    /// Configuration file supplying the stream parameters and key policy.
    /// Without it the `creator_and_salt` policy is assumed.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[derive(Args)]
struct SimulateArgs {
    /// Configuration file (TOML or JSON).
    #[arg(short, long)]
    config: PathBuf,

    /// Days between claims.
    #[arg(long, default_value_t = 7)]
    step_days: u64,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level, &cli.log_format);

    match cli.command {
        Commands::Preview(args) => preview(args),
        Commands::Simulate(args) => simulate(args),
    }
}

fn preview(args: PreviewArgs) -> Result<()> {
    let address = match &args.config {
        Some(path) => {
            let config = SimulationConfig::load(path)?;
            let factory_config = FactoryConfig {
                address: args.factory.unwrap_or(config.factory.address),
                key_policy: config.factory.key_policy,
            };
            let creator = args.creator.unwrap_or(config.stream.creator);
            let salt = args.salt.unwrap_or(config.stream.salt);
            let request = config.stream.request(config.feed.build()?);
            let factory = StreamerFactory::new(
                factory_config,
                Arc::new(MemoryLedger::new()),
                Arc::new(SystemClock::new()),
            );
            factory.preview_address(&creator, &request, &salt)?
        }
        None => {
            // Parameters are unknown here, so only the default policy applies.
            let factory = args.factory.context("--factory is required without --config")?;
            let creator = args.creator.context("--creator is required without --config")?;
            let salt = args.salt.context("--salt is required without --config")?;
            let key = deployment_key(
                DeploymentKeyPolicy::CreatorAndSalt,
                &creator,
                &salt,
                &Hash256::ZERO,
            );
            streamer_address(&factory, &key)
        }
    };
    info!(%address, "previewed");
    println!("{address}");
    Ok(())
}

fn simulate(args: SimulateArgs) -> Result<()> {
    let config = SimulationConfig::load(&args.config)?;
    info!(config = %args.config.display(), step_days = args.step_days, "simulating");
    let report = simulate::run(&config, args.step_days)?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

/// Initialize tracing subscriber with the given log level and output format.
///
/// Pass `format = "json"` for structured JSON output. Any other value
/// defaults to human-readable text. Logs go to stderr so stdout stays
/// machine-readable.
fn init_logging(level_str: &str, format: &str) {
    use tracing_subscriber::filter::EnvFilter;
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level_str));

    if format == "json" {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_level(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn preview_help_names_the_assumed_policy() {
        let mut cli = Cli::command();
        let preview = cli.find_subcommand_mut("preview").unwrap();
        let help = preview.render_long_help().to_string();
        assert!(help.contains("creator_and_salt"), "{help}");
    }
}
