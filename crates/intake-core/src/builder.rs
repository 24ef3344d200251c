//! Builder for the conversation engine.
//!
//! Picks the configured transport and optional durable store from the
//! factories handed in by the binary, and wires them into a
//! [`ConversationEngine`].

use crate::engine::ConversationEngine;
use crate::ledger::OrderLedger;
use intake_config::Config;
use intake_storage::{OrderStoreInterface, StorageError, StorageService};
use intake_transport::{TransportError, TransportInterface, TransportService};
use intake_types::SecretString;
use std::collections::HashMap;
use thiserror::Error;

/// Errors that can occur while building the engine.
#[derive(Debug, Error)]
pub enum BuilderError {
	#[error("Configuration error: {0}")]
	Config(String),
	#[error("Unknown implementation: {0}")]
	UnknownImplementation(String),
}

/// Factory functions available to the builder, keyed by implementation name.
pub struct EngineFactories<SF, TF> {
	pub storage_factories: HashMap<String, SF>,
	pub transport_factories: HashMap<String, TF>,
}

/// Builds a [`ConversationEngine`] from configuration.
pub struct EngineBuilder {
	config: Config,
}

impl EngineBuilder {
	pub fn new(config: Config) -> Self {
		Self { config }
	}

	pub fn build<SF, TF>(self, factories: EngineFactories<SF, TF>) -> Result<ConversationEngine, BuilderError>
	where
		SF: Fn(&toml::Value) -> Result<Box<dyn OrderStoreInterface>, StorageError>,
		TF: Fn(&SecretString) -> Result<Box<dyn TransportInterface>, TransportError>,
	{
		let store = match &self.config.storage.primary {
			Some(name) => {
				let settings = self.config.storage.implementations.get(name).ok_or_else(|| {
					BuilderError::Config(format!(
						"Primary storage '{}' has no configuration",
						name
					))
				})?;
				let factory = factories
					.storage_factories
					.get(name)
					.ok_or_else(|| BuilderError::UnknownImplementation(format!("storage '{}'", name)))?;

				let backend = factory(settings).map_err(|e| {
					tracing::error!(
						component = "storage",
						implementation = %name,
						error = %e,
						"Failed to create storage implementation"
					);
					BuilderError::Config(format!(
						"Failed to create storage implementation '{}': {}",
						name, e
					))
				})?;
				backend.config_schema().validate(settings).map_err(|e| {
					BuilderError::Config(format!(
						"Invalid configuration for storage implementation '{}': {}",
						name, e
					))
				})?;
				tracing::info!(component = "storage", implementation = %name, "Loaded");
				Some(StorageService::new(name.clone(), backend))
			},
			None => {
				tracing::info!(component = "storage", "No durable store, orders are kept in memory");
				None
			},
		};

		for name in self.config.storage.implementations.keys() {
			if self.config.storage.primary.as_ref() != Some(name) {
				tracing::debug!(component = "storage", implementation = %name, "Configured but not primary, skipped");
			}
		}

		let transport_name = &self.config.transport.implementation;
		let transport_factory = factories
			.transport_factories
			.get(transport_name)
			.ok_or_else(|| {
				BuilderError::UnknownImplementation(format!("transport '{}'", transport_name))
			})?;
		let transport = transport_factory(&self.config.transport.token).map_err(|e| {
			BuilderError::Config(format!(
				"Failed to create transport implementation '{}': {}",
				transport_name, e
			))
		})?;
		tracing::info!(component = "transport", implementation = %transport_name, "Loaded");

		Ok(ConversationEngine::new(
			TransportService::new(transport),
			OrderLedger::new(store),
			&self.config.bot,
		))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use async_trait::async_trait;
	use intake_storage::StorageFactory;
	use intake_transport::TransportFactory;
	use intake_types::{ConfigSchema, Field, FieldType, Order, Schema, ValidationError};

	/// Store whose factory accepts anything; only its schema checks settings.
	struct SchemaOnlyStore;

	struct RequiresLabel;

	impl ConfigSchema for RequiresLabel {
		fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
			Schema::new(vec![Field::new("label", FieldType::String)], vec![]).validate(config)
		}
	}

	#[async_trait]
	impl OrderStoreInterface for SchemaOnlyStore {
		async fn insert(&self, _order: &Order) -> Result<(), StorageError> {
			Ok(())
		}

		fn config_schema(&self) -> Box<dyn ConfigSchema> {
			Box::new(RequiresLabel)
		}
	}

	fn create_schema_only_store(
		_config: &toml::Value,
	) -> Result<Box<dyn OrderStoreInterface>, StorageError> {
		Ok(Box::new(SchemaOnlyStore))
	}

	fn factories_with_schema_only_store() -> EngineFactories<StorageFactory, TransportFactory> {
		let mut factories = factories();
		factories
			.storage_factories
			.insert("schema_only".to_string(), create_schema_only_store);
		factories
	}

	fn schema_only_config(settings: &str) -> Config {
		config(&format!(
			r#"
[bot]
operator_id = 1

[transport]
implementation = "memory"
token = "t"

[storage]
primary = "schema_only"

[storage.implementations.schema_only]
{}
"#,
			settings
		))
	}

	fn factories() -> EngineFactories<StorageFactory, TransportFactory> {
		EngineFactories {
			storage_factories: intake_storage::get_all_implementations()
				.into_iter()
				.map(|(name, factory)| (name.to_string(), factory))
				.collect(),
			transport_factories: intake_transport::get_all_implementations()
				.into_iter()
				.map(|(name, factory)| (name.to_string(), factory))
				.collect(),
		}
	}

	fn config(toml: &str) -> Config {
		toml.parse().unwrap()
	}

	#[tokio::test]
	async fn test_build_in_memory() {
		let engine = EngineBuilder::new(config(
			r#"
[bot]
operator_id = 1

[transport]
implementation = "memory"
token = "unused"
"#,
		))
		.build(factories())
		.unwrap();

		assert!(engine.ledger().is_empty().await);
	}

	#[tokio::test]
	async fn test_build_with_file_store() {
		let dir = tempfile::tempdir().unwrap();
		let toml = format!(
			r#"
[bot]
operator_id = 1

[transport]
implementation = "memory"
token = "unused"

[storage]
primary = "file"

[storage.implementations.file]
storage_path = "{}"
"#,
			dir.path().display()
		);

		let engine = EngineBuilder::new(config(&toml)).build(factories()).unwrap();
		engine
			.handle_event(intake_types::InboundEvent::CallbackQuery {
				sender: intake_types::UserId(5),
				id: "1".into(),
				action: "budget_2900".into(),
			})
			.await;

		assert_eq!(engine.ledger().len().await, 1);
		let written: Vec<_> = std::fs::read_dir(dir.path())
			.unwrap()
			.map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
			.collect();
		assert_eq!(written.len(), 1);
		assert!(written[0].starts_with("order_") && written[0].ends_with("_1.bin"));
	}

	#[test]
	fn test_unknown_transport() {
		let result = EngineBuilder::new(config(
			r#"
[bot]
operator_id = 1

[transport]
implementation = "carrier-pigeon"
token = "t"
"#,
		))
		.build(factories());

		assert!(matches!(result, Err(BuilderError::UnknownImplementation(_))));
	}

	#[test]
	fn test_invalid_store_settings() {
		let result = EngineBuilder::new(config(
			r#"
[bot]
operator_id = 1

[transport]
implementation = "memory"
token = "t"

[storage]
primary = "postgres"

[storage.implementations.postgres]
url = "mysql://nope"
"#,
		))
		.build(factories());

		assert!(matches!(result, Err(BuilderError::Config(_))));
	}

	#[test]
	fn test_store_schema_is_checked() {
		let rejected = EngineBuilder::new(schema_only_config("other = 1"))
			.build(factories_with_schema_only_store());
		assert!(matches!(rejected, Err(BuilderError::Config(_))));

		let accepted = EngineBuilder::new(schema_only_config("label = \"orders\""))
			.build(factories_with_schema_only_store());
		assert!(accepted.is_ok());
	}
}
