//! Append-only order ledger.
//!
//! Orders are kept in memory for the lifetime of the process and optionally
//! mirrored into a durable store. Mirroring is best effort: a failed write is
//! logged and the in-memory append still counts.

use intake_storage::StorageService;
use intake_types::{Order, UserId};
use tokio::sync::RwLock;

#[derive(Debug)]
struct LedgerEntries {
	orders: Vec<Order>,
	next_id: u64,
}

/// In-memory list of submitted orders.
pub struct OrderLedger {
	entries: RwLock<LedgerEntries>,
	store: Option<StorageService>,
}

impl OrderLedger {
	/// Creates an empty ledger, mirroring into `store` when given.
	pub fn new(store: Option<StorageService>) -> Self {
		Self {
			entries: RwLock::new(LedgerEntries {
				orders: Vec::new(),
				next_id: 1,
			}),
			store,
		}
	}

	pub fn in_memory() -> Self {
		Self::new(None)
	}

	/// Appends an order and returns the identity assigned to it.
	///
	/// Identities start at one and are assigned under the ledger lock, so
	/// concurrent appends never share one.
	pub async fn append(&self, mut order: Order) -> u64 {
		let id = {
			let mut entries = self.entries.write().await;
			let id = entries.next_id;
			entries.next_id += 1;
			order.id = id;
			entries.orders.push(order.clone());
			id
		};

		if let Some(store) = &self.store {
			if let Err(e) = store.persist(&order).await {
				tracing::warn!(
					order_id = id,
					store = %store.name(),
					error = %e,
					"Failed to mirror order, keeping it in memory only"
				);
			}
		}

		id
	}

	/// Returns the user's orders in the order they were appended.
	pub async fn query_by_user(&self, user: UserId) -> Vec<Order> {
		self.entries
			.read()
			.await
			.orders
			.iter()
			.filter(|order| order.user_id == user)
			.cloned()
			.collect()
	}

	pub async fn len(&self) -> usize {
		self.entries.read().await.orders.len()
	}

	pub async fn is_empty(&self) -> bool {
		self.entries.read().await.orders.is_empty()
	}
}
