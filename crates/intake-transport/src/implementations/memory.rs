//! In-memory transport.
//!
//! Records every outbound message and acknowledgement instead of talking to
//! a platform, and lets callers inject inbound events. Used by tests and for
//! dry runs without credentials.

use crate::{TransportError, TransportFactory, TransportInterface, TransportRegistry};
use async_trait::async_trait;
use intake_types::{ImplementationRegistry, InboundEvent, OutboundMessage, SecretString};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};

/// Transport that keeps everything in memory.
///
/// Clones share state, so a test can keep one clone for inspection while
/// the engine owns another.
#[derive(Clone, Default)]
pub struct MemoryTransport {
	sent: Arc<Mutex<Vec<OutboundMessage>>>,
	acknowledged: Arc<Mutex<Vec<String>>>,
	sender: Arc<Mutex<Option<mpsc::UnboundedSender<InboundEvent>>>>,
	fail_sends: Arc<AtomicBool>,
}

impl MemoryTransport {
	pub fn new() -> Self {
		Self::default()
	}

	/// Makes every subsequent send fail with a network error.
	pub fn set_fail_sends(&self, fail: bool) {
		self.fail_sends.store(fail, Ordering::SeqCst);
	}

	/// Pushes an event to the receiver, as if the platform delivered it.
	///
	/// Returns false when receiving has not been started or was stopped.
	pub async fn inject(&self, event: InboundEvent) -> bool {
		match self.sender.lock().await.as_ref() {
			Some(sender) => sender.send(event).is_ok(),
			None => false,
		}
	}

	/// Returns all messages sent so far.
	pub async fn sent(&self) -> Vec<OutboundMessage> {
		self.sent.lock().await.clone()
	}

	/// Returns and forgets all messages sent so far.
	pub async fn take_sent(&self) -> Vec<OutboundMessage> {
		std::mem::take(&mut *self.sent.lock().await)
	}

	/// Returns the ids of all acknowledged callback queries.
	pub async fn acknowledged(&self) -> Vec<String> {
		self.acknowledged.lock().await.clone()
	}
}

#[async_trait]
impl TransportInterface for MemoryTransport {
	async fn start_receiving(
		&self,
		sender: mpsc::UnboundedSender<InboundEvent>,
	) -> Result<(), TransportError> {
		let mut slot = self.sender.lock().await;
		if slot.is_some() {
			return Err(TransportError::AlreadyReceiving);
		}
		*slot = Some(sender);
		Ok(())
	}

	async fn stop_receiving(&self) -> Result<(), TransportError> {
		self.sender.lock().await.take();
		Ok(())
	}

	async fn send_message(&self, message: &OutboundMessage) -> Result<(), TransportError> {
		if self.fail_sends.load(Ordering::SeqCst) {
			return Err(TransportError::Network("send disabled".into()));
		}
		self.sent.lock().await.push(message.clone());
		Ok(())
	}

	async fn acknowledge_callback(&self, callback_id: &str) -> Result<(), TransportError> {
		self.acknowledged.lock().await.push(callback_id.to_string());
		Ok(())
	}
}

/// Factory function; the credential is ignored.
pub fn create_transport(_token: &SecretString) -> Result<Box<dyn TransportInterface>, TransportError> {
	Ok(Box::new(MemoryTransport::new()))
}

/// Registry for the in-memory transport.
pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "memory";
	type Factory = TransportFactory;

	fn factory() -> Self::Factory {
		create_transport
	}
}

impl TransportRegistry for Registry {}
