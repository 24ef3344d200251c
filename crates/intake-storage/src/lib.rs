//! Durable order store for the intake bot.
//!
//! The order ledger keeps every order in memory. When a durable store is
//! configured, each appended order is additionally mirrored into it. Writes
//! are best-effort: the caller logs a failed insert and carries on.

use async_trait::async_trait;
use intake_types::{ConfigSchema, ImplementationRegistry, Order};
use thiserror::Error;

/// Re-export implementations
pub mod implementations {
	pub mod file;
	pub mod postgres;
}

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
	/// Error that occurs during serialization/deserialization.
	#[error("Serialization error: {0}")]
	Serialization(String),
	/// Connectivity or constraint failure in the backend.
	#[error("Backend error: {0}")]
	Backend(String),
	/// Error that occurs during configuration validation.
	#[error("Configuration error: {0}")]
	Configuration(String),
}

/// Interface every durable order store implements.
#[async_trait]
pub trait OrderStoreInterface: Send + Sync {
	/// Persists one finalized order.
	async fn insert(&self, order: &Order) -> Result<(), StorageError>;

	/// Returns the configuration schema for validation.
	fn config_schema(&self) -> Box<dyn ConfigSchema>;
}

/// Type alias for storage factory functions.
pub type StorageFactory = fn(&toml::Value) -> Result<Box<dyn OrderStoreInterface>, StorageError>;

/// Registry trait for storage implementations.
pub trait StorageRegistry: ImplementationRegistry<Factory = StorageFactory> {}

/// Get all registered storage implementations.
///
/// Returns a vector of (name, factory) tuples used by the engine builder to
/// resolve `storage.primary`.
pub fn get_all_implementations() -> Vec<(&'static str, StorageFactory)> {
	use implementations::{file, postgres};

	vec![
		(file::Registry::NAME, file::Registry::factory()),
		(postgres::Registry::NAME, postgres::Registry::factory()),
	]
}

/// Named wrapper around the configured backend.
pub struct StorageService {
	/// Configuration name of the backend, used in logs.
	name: String,
	/// The underlying storage backend implementation.
	backend: Box<dyn OrderStoreInterface>,
}

impl StorageService {
	pub fn new(name: impl Into<String>, backend: Box<dyn OrderStoreInterface>) -> Self {
		Self {
			name: name.into(),
			backend,
		}
	}

	/// Returns the configuration name of the backend.
	pub fn name(&self) -> &str {
		&self.name
	}

	/// Mirrors an order into the backend.
	pub async fn persist(&self, order: &Order) -> Result<(), StorageError> {
		self.backend.insert(order).await
	}
}
