//! PostgreSQL order store.
//!
//! The connection pool is created lazily, so a database that is unreachable
//! at startup does not stop the bot; inserts fail individually instead and
//! the ledger keeps the order in memory. The `orders` table is created on the
//! first successful insert.

use crate::{OrderStoreInterface, StorageError, StorageFactory, StorageRegistry};
use async_trait::async_trait;
use intake_types::{ConfigSchema, Field, FieldType, ImplementationRegistry, Order, Schema, ValidationError};
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use tokio::sync::OnceCell;

const CREATE_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS orders (
	id BIGSERIAL PRIMARY KEY,
	order_id BIGINT NOT NULL,
	user_id BIGINT NOT NULL,
	name VARCHAR(255),
	contact VARCHAR(255),
	tier VARCHAR(100) NOT NULL,
	description TEXT,
	budget VARCHAR(100),
	status VARCHAR(50) NOT NULL DEFAULT 'new',
	created_at TIMESTAMPTZ NOT NULL DEFAULT CURRENT_TIMESTAMP
)
"#;

const INSERT_ORDER: &str = r#"
INSERT INTO orders
	(order_id, user_id, name, contact, tier, description, budget, status, created_at)
VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
"#;

/// Mirrors orders into a PostgreSQL table.
pub struct PostgresStorage {
	pool: PgPool,
	table_ready: OnceCell<()>,
}

impl PostgresStorage {
	pub fn new(pool: PgPool) -> Self {
		Self {
			pool,
			table_ready: OnceCell::new(),
		}
	}

	async fn ensure_table(&self) -> Result<(), StorageError> {
		self.table_ready
			.get_or_try_init(|| async {
				sqlx::query(CREATE_TABLE)
					.execute(&self.pool)
					.await
					.map(|_| ())
					.map_err(|e| StorageError::Backend(e.to_string()))
			})
			.await?;
		Ok(())
	}
}

#[async_trait]
impl OrderStoreInterface for PostgresStorage {
	async fn insert(&self, order: &Order) -> Result<(), StorageError> {
		self.ensure_table().await?;

		sqlx::query(INSERT_ORDER)
			.bind(order.id as i64)
			.bind(order.user_id.0)
			.bind(order.name.as_str())
			.bind(order.contact.as_str())
			.bind(order.tier.as_str())
			.bind(order.description.as_str())
			.bind(order.budget.as_str())
			.bind(order.status.as_str())
			.bind(order.created_at)
			.execute(&self.pool)
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))?;

		tracing::debug!(order_id = order.id, "Inserted order row");
		Ok(())
	}

	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(PostgresStorageSchema)
	}
}

/// Configuration schema for PostgresStorage.
pub struct PostgresStorageSchema;

impl ConfigSchema for PostgresStorageSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let schema = Schema::new(
			vec![Field::new("url", FieldType::String).with_validator(|v| {
				match v.as_str() {
					Some(s) if s.starts_with("postgres://") || s.starts_with("postgresql://") => {
						Ok(())
					},
					_ => Err("must be a postgres:// connection URL".to_string()),
				}
			})],
			vec![
				Field::new(
					"max_connections",
					FieldType::Integer {
						min: Some(1),
						max: Some(100),
					},
				),
				Field::new(
					"connect_timeout_seconds",
					FieldType::Integer {
						min: Some(1),
						max: Some(300),
					},
				),
			],
		);
		schema.validate(config)
	}
}

/// Factory function to create a postgres store from configuration.
///
/// Configuration parameters:
/// - `url`: Connection URL (required)
/// - `max_connections`: Pool size (default: 5)
/// - `connect_timeout_seconds`: Time to wait for a connection (default: 5)
pub fn create_storage(config: &toml::Value) -> Result<Box<dyn OrderStoreInterface>, StorageError> {
	PostgresStorageSchema
		.validate(config)
		.map_err(|e| StorageError::Configuration(e.to_string()))?;

	let url = config
		.get("url")
		.and_then(|v| v.as_str())
		.ok_or_else(|| StorageError::Configuration("url is required".into()))?;
	let max_connections = config
		.get("max_connections")
		.and_then(|v| v.as_integer())
		.unwrap_or(5) as u32;
	let connect_timeout = config
		.get("connect_timeout_seconds")
		.and_then(|v| v.as_integer())
		.unwrap_or(5) as u64;

	let pool = PgPoolOptions::new()
		.max_connections(max_connections)
		.acquire_timeout(Duration::from_secs(connect_timeout))
		.connect_lazy(url)
		.map_err(|e| StorageError::Configuration(e.to_string()))?;

	Ok(Box::new(PostgresStorage::new(pool)))
}

/// Registry for the postgres store.
pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "postgres";
	type Factory = StorageFactory;

	fn factory() -> Self::Factory {
		create_storage
	}
}

impl StorageRegistry for Registry {}
