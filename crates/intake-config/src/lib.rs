//! Configuration module for the order-intake bot.
//!
//! Configuration comes from one of two places:
//! - a TOML file whose string values may reference `${VAR}` or
//!   `${VAR:-default}` environment variables, or
//! - the process environment alone (`TELEGRAM_BOT_TOKEN`, `ADMIN_ID`,
//!   `DATABASE_URL`, `ORDER_DIR`, `DEBUG`, `BOT_USERNAME`).
//!
//! Both paths end in the same validation, so a missing token or operator
//! identity stops the process before it connects to anything.

use intake_types::SecretString;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Error that occurs during file I/O operations.
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
	/// Error that occurs when parsing TOML configuration.
	#[error("Configuration error: {0}")]
	Parse(String),
	/// Error that occurs when configuration validation fails.
	#[error("Validation error: {0}")]
	Validation(String),
}

impl From<toml::de::Error> for ConfigError {
	fn from(err: toml::de::Error) -> Self {
		// Keep only the message, not the echoed input
		ConfigError::Parse(err.message().to_string())
	}
}

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
	/// Bot identity and operator settings.
	pub bot: BotConfig,
	/// Messaging transport settings.
	pub transport: TransportConfig,
	/// Durable order store; absent means orders live in memory only.
	#[serde(default)]
	pub storage: StorageConfig,
}

/// Bot identity and operator settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BotConfig {
	/// Public handle mentioned in help, contact and confirmation messages.
	#[serde(default = "default_bot_username")]
	pub username: String,
	/// Platform identity of the operator notified about every order.
	pub operator_id: i64,
	/// Raises the default log level to debug.
	#[serde(default)]
	pub verbose: bool,
}

/// Messaging transport settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TransportConfig {
	/// Which transport implementation to use.
	#[serde(default = "default_transport")]
	pub implementation: String,
	/// Platform credential.
	pub token: SecretString,
}

/// Durable order store settings.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct StorageConfig {
	/// Which implementation to mirror orders into. `None` keeps orders in
	/// memory only.
	pub primary: Option<String>,
	/// Map of storage implementation names to their configurations.
	#[serde(default)]
	pub implementations: HashMap<String, toml::Value>,
}

fn default_bot_username() -> String {
	"@NeuraMarket_Bot".to_string()
}

fn default_transport() -> String {
	"telegram".to_string()
}

/// Resolves environment variables in a string.
///
/// Replaces ${VAR_NAME} with the value of the environment variable VAR_NAME.
/// Supports default values with ${VAR_NAME:-default_value}.
///
/// Input strings are limited to 1MB.
pub(crate) fn resolve_env_vars(input: &str) -> Result<String, ConfigError> {
	const MAX_INPUT_SIZE: usize = 1024 * 1024;
	if input.len() > MAX_INPUT_SIZE {
		return Err(ConfigError::Validation(format!(
			"Configuration file too large: {} bytes (max: {} bytes)",
			input.len(),
			MAX_INPUT_SIZE
		)));
	}

	let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]{0,127})(?::-([^}]{0,256}))?\}")
		.map_err(|e| ConfigError::Parse(format!("Regex error: {}", e)))?;

	let mut result = String::with_capacity(input.len());
	let mut last_end = 0;

	for cap in re.captures_iter(input) {
		let (Some(full_match), Some(var_name)) = (cap.get(0), cap.get(1)) else {
			continue;
		};
		let default_value = cap.get(2).map(|m| m.as_str());

		let value = match std::env::var(var_name.as_str()) {
			Ok(v) => v,
			Err(_) => match default_value {
				Some(default) => default.to_string(),
				None => {
					return Err(ConfigError::Validation(format!(
						"Environment variable '{}' not found",
						var_name.as_str()
					)));
				},
			},
		};

		result.push_str(&input[last_end..full_match.start()]);
		result.push_str(&value);
		last_end = full_match.end();
	}
	result.push_str(&input[last_end..]);

	Ok(result)
}

/// Parses a boolean flag: `1`, `t` and `true` (any case) are true, anything
/// else counts as false.
fn parse_flag(value: &str) -> bool {
	matches!(
		value.trim().to_ascii_lowercase().as_str(),
		"1" | "t" | "true"
	)
}

impl Config {
	/// Loads configuration from a TOML file, resolving environment variables.
	pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
		let content = tokio::fs::read_to_string(path.as_ref()).await?;
		content.parse()
	}

	/// Builds configuration from the process environment.
	pub fn from_env() -> Result<Self, ConfigError> {
		Self::from_env_with(|key| std::env::var(key).ok())
	}

	/// Builds configuration from an arbitrary variable lookup.
	///
	/// `DATABASE_URL` selects the postgres store, otherwise `ORDER_DIR`
	/// selects the file store, otherwise orders stay in memory.
	pub fn from_env_with<F>(lookup: F) -> Result<Self, ConfigError>
	where
		F: Fn(&str) -> Option<String>,
	{
		let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

		let token = get("TELEGRAM_BOT_TOKEN").ok_or_else(|| {
			ConfigError::Validation("TELEGRAM_BOT_TOKEN is not set".into())
		})?;

		let operator_id = get("ADMIN_ID")
			.and_then(|v| v.trim().parse::<i64>().ok())
			.ok_or_else(|| ConfigError::Validation("ADMIN_ID is not set or not a number".into()))?;

		let mut storage = StorageConfig::default();
		if let Some(url) = get("DATABASE_URL") {
			let mut table = toml::map::Map::new();
			table.insert("url".to_string(), toml::Value::String(url));
			storage
				.implementations
				.insert("postgres".to_string(), toml::Value::Table(table));
			storage.primary = Some("postgres".to_string());
		} else if let Some(dir) = get("ORDER_DIR") {
			let mut table = toml::map::Map::new();
			table.insert("storage_path".to_string(), toml::Value::String(dir));
			storage
				.implementations
				.insert("file".to_string(), toml::Value::Table(table));
			storage.primary = Some("file".to_string());
		}

		let config = Config {
			bot: BotConfig {
				username: get("BOT_USERNAME").unwrap_or_else(default_bot_username),
				operator_id,
				verbose: get("DEBUG").map(|v| parse_flag(&v)).unwrap_or(false),
			},
			transport: TransportConfig {
				implementation: default_transport(),
				token: SecretString::new(token),
			},
			storage,
		};
		config.validate()?;
		Ok(config)
	}

	/// Validates the configuration.
	///
	/// - The transport credential must not be blank
	/// - The operator identity must be non-zero
	/// - A configured primary store must name a configured implementation
	fn validate(&self) -> Result<(), ConfigError> {
		if self.transport.token.is_empty() {
			return Err(ConfigError::Validation(
				"Transport token cannot be empty".into(),
			));
		}
		if self.transport.implementation.is_empty() {
			return Err(ConfigError::Validation(
				"Transport implementation cannot be empty".into(),
			));
		}

		if self.bot.operator_id == 0 {
			return Err(ConfigError::Validation(
				"Operator id must be a non-zero platform identity".into(),
			));
		}

		if let Some(primary) = &self.storage.primary {
			if !self.storage.implementations.contains_key(primary) {
				return Err(ConfigError::Validation(format!(
					"Primary storage '{}' not found in implementations",
					primary
				)));
			}
		}

		Ok(())
	}
}

/// Parses a TOML document, resolving environment variables first and
/// validating the result.
impl FromStr for Config {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let resolved = resolve_env_vars(s)?;
		let config: Config = toml::from_str(&resolved)?;
		config.validate()?;
		Ok(config)
	}
}
