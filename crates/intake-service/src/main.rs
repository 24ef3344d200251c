//! Main entry point for the order-intake bot.
//!
//! Loads configuration from a TOML file or from the environment, builds the
//! conversation engine with the configured transport and store, and runs it
//! until interrupted.

use clap::Parser;
use intake_config::Config;
use intake_core::{ConversationEngine, EngineBuilder};
use std::path::PathBuf;

mod factory_registry;

use factory_registry::FactoryRegistry;

/// Command-line arguments for the intake bot.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
	/// Path to a configuration file. Without it, configuration is read from
	/// the environment.
	#[arg(short, long)]
	config: Option<PathBuf>,

	/// Log level (trace, debug, info, warn, error). Defaults to debug when
	/// verbose logging is configured, info otherwise.
	#[arg(short, long)]
	log_level: Option<String>,
}

impl Args {
	fn log_directive(&self, verbose: bool) -> String {
		match &self.log_level {
			Some(level) => level.clone(),
			None if verbose => "debug".to_string(),
			None => "info".to_string(),
		}
	}
}

async fn load_config(args: &Args) -> Result<Config, intake_config::ConfigError> {
	match &args.config {
		Some(path) => Config::from_file(path).await,
		None => Config::from_env(),
	}
}

fn init_tracing(directive: &str) {
	use tracing_subscriber::{fmt, EnvFilter};

	let env_filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive));

	fmt()
		.with_env_filter(env_filter)
		.with_thread_ids(true)
		.with_target(true)
		.init();
}

fn build_engine(config: Config) -> Result<ConversationEngine, Box<dyn std::error::Error>> {
	let factories = FactoryRegistry::new().into_factories();
	Ok(EngineBuilder::new(config).build(factories)?)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let args = Args::parse();

	let config = load_config(&args).await?;
	init_tracing(&args.log_directive(config.bot.verbose));

	tracing::info!(
		username = %config.bot.username,
		transport = %config.transport.implementation,
		storage = config.storage.primary.as_deref().unwrap_or("memory"),
		"Loaded configuration"
	);

	let engine = build_engine(config)?;
	engine.run().await?;

	tracing::info!("Stopped");
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_args_defaults() {
		let args = Args::parse_from(["intake"]);
		assert!(args.config.is_none());
		assert_eq!(args.log_directive(false), "info");
		assert_eq!(args.log_directive(true), "debug");
	}

	#[test]
	fn test_explicit_log_level_wins() {
		let args = Args::parse_from(["intake", "--log-level", "warn", "-c", "bot.toml"]);
		assert_eq!(args.config, Some(PathBuf::from("bot.toml")));
		assert_eq!(args.log_directive(true), "warn");
	}

	#[tokio::test]
	async fn test_load_and_build_from_file() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("bot.toml");
		std::fs::write(
			&path,
			r#"
[bot]
username = "@Test_Bot"
operator_id = 12345
verbose = true

[transport]
implementation = "memory"
token = "${INTAKE_TEST_TOKEN:-dummy}"
"#,
		)
		.unwrap();

		let args = Args::parse_from(["intake", "--config", path.to_str().unwrap()]);
		let config = load_config(&args).await.unwrap();
		assert!(config.bot.verbose);
		assert_eq!(config.bot.operator_id, 12345);

		let engine = build_engine(config).unwrap();
		assert!(engine.ledger().is_empty().await);
	}

	#[tokio::test]
	async fn test_missing_config_file() {
		let args = Args::parse_from(["intake", "--config", "/nonexistent/intake.toml"]);
		assert!(matches!(
			load_config(&args).await,
			Err(intake_config::ConfigError::Io(_))
		));
	}
}
