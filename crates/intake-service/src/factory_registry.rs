//! Registry of every storage and transport implementation compiled into the
//! binary.

use intake_core::EngineFactories;
use intake_storage::StorageFactory;
use intake_transport::TransportFactory;
use std::collections::HashMap;

/// Factories keyed by the name used in configuration.
pub struct FactoryRegistry {
	pub storage: HashMap<String, StorageFactory>,
	pub transport: HashMap<String, TransportFactory>,
}

impl FactoryRegistry {
	/// Collects every registered implementation.
	pub fn new() -> Self {
		Self {
			storage: intake_storage::get_all_implementations()
				.into_iter()
				.map(|(name, factory)| (name.to_string(), factory))
				.collect(),
			transport: intake_transport::get_all_implementations()
				.into_iter()
				.map(|(name, factory)| (name.to_string(), factory))
				.collect(),
		}
	}

	pub fn into_factories(self) -> EngineFactories<StorageFactory, TransportFactory> {
		EngineFactories {
			storage_factories: self.storage,
			transport_factories: self.transport,
		}
	}
}

impl Default for FactoryRegistry {
	fn default() -> Self {
		Self::new()
	}
}
