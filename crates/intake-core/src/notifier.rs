//! Operator notification.

use crate::messages::Messages;
use intake_transport::{TransportError, TransportService};
use intake_types::{Order, UserId};
use std::sync::Arc;

/// Sends a summary of every finalized order to the operator.
pub struct Notifier {
	operator: UserId,
	transport: Arc<TransportService>,
	messages: Messages,
}

impl Notifier {
	pub fn new(operator: UserId, transport: Arc<TransportService>, messages: Messages) -> Self {
		Self {
			operator,
			transport,
			messages,
		}
	}

	pub fn operator(&self) -> UserId {
		self.operator
	}

	/// Sends the summary once. Not retried.
	pub async fn notify(&self, order: &Order) -> Result<(), TransportError> {
		let message = self.messages.operator_notification(self.operator, order);
		self.transport.send(&message).await?;
		tracing::debug!(order_id = order.id, operator = %self.operator, "Notified operator");
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::ledger::tests::order_for;
	use intake_transport::implementations::memory::MemoryTransport;

	#[tokio::test]
	async fn test_notification_goes_to_operator() {
		let transport = MemoryTransport::new();
		let notifier = Notifier::new(
			UserId(999),
			Arc::new(TransportService::new(Box::new(transport.clone()))),
			Messages::new("@bot"),
		);
		assert_eq!(notifier.operator(), UserId(999));

		notifier.notify(&order_for(1, "2.900€/Monat")).await.unwrap();

		let sent = transport.sent().await;
		assert_eq!(sent.len(), 1);
		assert_eq!(sent[0].recipient, UserId(999));
		assert!(sent[0].text.contains("2.900€/Monat"));
	}

	#[tokio::test]
	async fn test_delivery_failure_is_returned() {
		let transport = MemoryTransport::new();
		transport.set_fail_sends(true);
		let notifier = Notifier::new(
			UserId(999),
			Arc::new(TransportService::new(Box::new(transport))),
			Messages::new("@bot"),
		);

		assert!(notifier.notify(&order_for(1, "x")).await.is_err());
	}
}
