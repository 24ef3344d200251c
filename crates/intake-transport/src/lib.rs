//! Messaging transport module for the intake bot.
//!
//! The transport is the only component that talks to the messaging platform.
//! It turns platform updates into [`InboundEvent`]s pushed onto a channel and
//! delivers [`OutboundMessage`]s. The conversation engine only sees this
//! interface, so it can run against the in-memory transport in tests.

use async_trait::async_trait;
use intake_types::{ImplementationRegistry, InboundEvent, OutboundMessage, SecretString};
use thiserror::Error;
use tokio::sync::mpsc;

/// Re-export implementations
pub mod implementations {
	pub mod memory;
	pub mod telegram;
}

/// Errors that can occur during transport operations.
#[derive(Debug, Error)]
pub enum TransportError {
	/// The platform could not be reached.
	#[error("Network error: {0}")]
	Network(String),
	/// The platform rejected a request.
	#[error("API error: {0}")]
	Api(String),
	/// Receiving was started twice.
	#[error("Already receiving")]
	AlreadyReceiving,
	/// The transport could not be constructed from its configuration.
	#[error("Configuration error: {0}")]
	Configuration(String),
}

/// Interface every messaging transport implements.
#[async_trait]
pub trait TransportInterface: Send + Sync {
	/// Starts receiving platform updates.
	///
	/// Events are pushed through `sender` in the order the platform delivers
	/// them until [`stop_receiving`](Self::stop_receiving) is called.
	async fn start_receiving(
		&self,
		sender: mpsc::UnboundedSender<InboundEvent>,
	) -> Result<(), TransportError>;

	/// Stops receiving and releases the connection.
	async fn stop_receiving(&self) -> Result<(), TransportError>;

	/// Delivers one message.
	async fn send_message(&self, message: &OutboundMessage) -> Result<(), TransportError>;

	/// Acknowledges a callback query so the client stops showing it as pending.
	async fn acknowledge_callback(&self, callback_id: &str) -> Result<(), TransportError>;
}

/// Type alias for transport factory functions.
pub type TransportFactory = fn(&SecretString) -> Result<Box<dyn TransportInterface>, TransportError>;

/// Registry trait for transport implementations.
pub trait TransportRegistry: ImplementationRegistry<Factory = TransportFactory> {}

/// Get all registered transport implementations.
pub fn get_all_implementations() -> Vec<(&'static str, TransportFactory)> {
	use implementations::{memory, telegram};

	vec![
		(telegram::Registry::NAME, telegram::Registry::factory()),
		(memory::Registry::NAME, memory::Registry::factory()),
	]
}

/// Service wrapping the configured transport.
pub struct TransportService {
	backend: Box<dyn TransportInterface>,
}

impl TransportService {
	pub fn new(backend: Box<dyn TransportInterface>) -> Self {
		Self { backend }
	}

	/// Starts receiving; see [`TransportInterface::start_receiving`].
	pub async fn start(
		&self,
		sender: mpsc::UnboundedSender<InboundEvent>,
	) -> Result<(), TransportError> {
		self.backend.start_receiving(sender).await
	}

	/// Stops receiving; see [`TransportInterface::stop_receiving`].
	pub async fn stop(&self) -> Result<(), TransportError> {
		self.backend.stop_receiving().await
	}

	/// Delivers one message.
	pub async fn send(&self, message: &OutboundMessage) -> Result<(), TransportError> {
		self.backend.send_message(message).await
	}

	/// Acknowledges a callback query.
	pub async fn acknowledge(&self, callback_id: &str) -> Result<(), TransportError> {
		self.backend.acknowledge_callback(callback_id).await
	}
}
