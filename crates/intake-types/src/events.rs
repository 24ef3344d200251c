//! Inbound event types produced by the transport.
//!
//! The transport turns whatever the messaging platform delivers into one of
//! two event shapes. Everything else the platform sends is dropped before it
//! reaches the conversation engine.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Platform-supplied identity of a user.
///
/// For private chats the user identity doubles as the chat to reply to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(pub i64);

impl fmt::Display for UserId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}

impl From<i64> for UserId {
	fn from(id: i64) -> Self {
		Self(id)
	}
}

/// An event received from the messaging platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
	/// A plain text message.
	Message { sender: UserId, text: String },
	/// A press on an inline keyboard button.
	CallbackQuery {
		sender: UserId,
		/// Identifier the platform expects back in the acknowledgement.
		id: String,
		/// Opaque action code attached to the pressed button.
		action: String,
	},
}

impl InboundEvent {
	/// Returns the user that produced this event.
	pub fn sender(&self) -> UserId {
		match self {
			InboundEvent::Message { sender, .. } => *sender,
			InboundEvent::CallbackQuery { sender, .. } => *sender,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_sender_of_both_variants() {
		let message = InboundEvent::Message {
			sender: UserId(7),
			text: "hallo".to_string(),
		};
		let callback = InboundEvent::CallbackQuery {
			sender: UserId(8),
			id: "cb-1".to_string(),
			action: "tarif_start".to_string(),
		};

		assert_eq!(message.sender(), UserId(7));
		assert_eq!(callback.sender(), UserId(8));
	}

	#[test]
	fn test_user_id_display() {
		assert_eq!(UserId(-1001).to_string(), "-1001");
	}
}
