//! File-based order store.
//!
//! Each order is written to its own file, `order_<created_nanos>_<id>.bin`,
//! consisting of a fixed-size header followed by the JSON-encoded order. Ledger
//! identities restart at one with every process, so the creation time keeps
//! names apart across restarts. Files are written to a temporary path first
//! and hard-linked into place, which never replaces an existing file.

use crate::{OrderStoreInterface, StorageError, StorageFactory, StorageRegistry};
use async_trait::async_trait;
use intake_types::{ConfigSchema, Field, FieldType, ImplementationRegistry, Order, Schema, ValidationError};
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::fs;

#[allow(clippy::doc_nested_refdefs)]
/// Fixed-size file header.
///
/// Binary layout (16 bytes total):
/// - [0-3]: Magic bytes "NMOR"
/// - [4-5]: Version (u16, little-endian)
/// - [6-13]: Write timestamp (u64, little-endian, Unix seconds)
/// - [14-15]: Reserved
#[derive(Debug, Clone, PartialEq, Eq)]
struct FileHeader {
	version: u16,
	written_at: u64,
}

impl FileHeader {
	const MAGIC: &'static [u8; 4] = b"NMOR";
	const VERSION: u16 = 1;
	const SIZE: usize = 16;

	fn now() -> Self {
		let written_at = SystemTime::now()
			.duration_since(UNIX_EPOCH)
			.map(|d| d.as_secs())
			.unwrap_or(0);

		Self {
			version: Self::VERSION,
			written_at,
		}
	}

	fn serialize(&self) -> [u8; Self::SIZE] {
		let mut bytes = [0u8; Self::SIZE];
		bytes[0..4].copy_from_slice(Self::MAGIC);
		bytes[4..6].copy_from_slice(&self.version.to_le_bytes());
		bytes[6..14].copy_from_slice(&self.written_at.to_le_bytes());
		bytes
	}

	fn deserialize(bytes: &[u8]) -> Result<Self, StorageError> {
		if bytes.len() < Self::SIZE {
			return Err(StorageError::Backend("File too small for header".into()));
		}

		if &bytes[0..4] != Self::MAGIC {
			return Err(StorageError::Backend("Not an order file".into()));
		}

		let version = u16::from_le_bytes([bytes[4], bytes[5]]);
		if version > Self::VERSION {
			return Err(StorageError::Backend(format!(
				"Unsupported file version: {}",
				version
			)));
		}

		let mut written_bytes = [0u8; 8];
		written_bytes.copy_from_slice(&bytes[6..14]);

		Ok(Self {
			version,
			written_at: u64::from_le_bytes(written_bytes),
		})
	}
}

/// Stores orders as individual files below a base directory.
pub struct FileStorage {
	base_path: PathBuf,
}

impl FileStorage {
	pub fn new(base_path: PathBuf) -> Self {
		Self { base_path }
	}

	fn order_path(&self, order: &Order) -> PathBuf {
		let created = order.created_at.timestamp_nanos_opt().unwrap_or_default();
		self.base_path
			.join(format!("order_{}_{}.bin", created, order.id))
	}

	#[cfg(test)]
	async fn load(&self, path: &std::path::Path) -> Result<Order, StorageError> {
		let data = fs::read(path)
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))?;

		FileHeader::deserialize(&data)?;
		serde_json::from_slice(&data[FileHeader::SIZE..])
			.map_err(|e| StorageError::Serialization(e.to_string()))
	}
}

#[async_trait]
impl OrderStoreInterface for FileStorage {
	async fn insert(&self, order: &Order) -> Result<(), StorageError> {
		fs::create_dir_all(&self.base_path)
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))?;

		let body =
			serde_json::to_vec(order).map_err(|e| StorageError::Serialization(e.to_string()))?;

		let mut file_data = Vec::with_capacity(FileHeader::SIZE + body.len());
		file_data.extend_from_slice(&FileHeader::now().serialize());
		file_data.extend_from_slice(&body);

		let path = self.order_path(order);
		let temp_path = path.with_extension("tmp");
		fs::write(&temp_path, file_data)
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))?;

		let linked = fs::hard_link(&temp_path, &path).await;
		if let Err(e) = fs::remove_file(&temp_path).await {
			tracing::debug!(path = %temp_path.display(), error = %e, "Failed to remove temp file");
		}
		linked.map_err(|e| match e.kind() {
			std::io::ErrorKind::AlreadyExists => {
				StorageError::Backend(format!("{} already exists", path.display()))
			},
			_ => StorageError::Backend(e.to_string()),
		})?;

		tracing::debug!(order_id = order.id, path = %path.display(), "Wrote order file");
		Ok(())
	}

	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(FileStorageSchema)
	}
}

/// Configuration schema for FileStorage.
pub struct FileStorageSchema;

impl ConfigSchema for FileStorageSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let schema = Schema::new(
			vec![],
			vec![Field::new("storage_path", FieldType::String).with_validator(|v| {
				match v.as_str() {
					Some(s) if s.trim().is_empty() => Err("must not be empty".to_string()),
					_ => Ok(()),
				}
			})],
		);
		schema.validate(config)
	}
}

/// Factory function to create a file store from configuration.
///
/// Configuration parameters:
/// - `storage_path`: Directory for order files (default: "./data/orders")
pub fn create_storage(config: &toml::Value) -> Result<Box<dyn OrderStoreInterface>, StorageError> {
	FileStorageSchema
		.validate(config)
		.map_err(|e| StorageError::Configuration(e.to_string()))?;

	let storage_path = config
		.get("storage_path")
		.and_then(|v| v.as_str())
		.unwrap_or("./data/orders");

	Ok(Box::new(FileStorage::new(PathBuf::from(storage_path))))
}

/// Registry for the file store.
pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "file";
	type Factory = StorageFactory;

	fn factory() -> Self::Factory {
		create_storage
	}
}

impl StorageRegistry for Registry {}
