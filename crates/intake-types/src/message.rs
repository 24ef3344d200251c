//! Outbound message types.
//!
//! Messages are described independently of the messaging platform so that
//! the conversation engine can be exercised without a network connection.
//! Transport implementations translate these into platform requests.

use crate::UserId;
use serde::{Deserialize, Serialize};

/// How the platform should interpret the message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TextFormat {
	/// Text is sent verbatim.
	Plain,
	/// Text uses legacy Markdown markup.
	#[default]
	Markdown,
}

/// A button attached to a message that reports an action code when pressed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineButton {
	/// Label shown to the user.
	pub label: String,
	/// Action code delivered back in the callback query.
	pub action: String,
}

impl InlineButton {
	pub fn new(label: impl Into<String>, action: impl Into<String>) -> Self {
		Self {
			label: label.into(),
			action: action.into(),
		}
	}
}

/// Keyboard layout attached to an outbound message.
///
/// Both variants are row-major: the outer vector holds rows, the inner one
/// the buttons of a row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Keyboard {
	/// Persistent keyboard whose buttons send their label as a text message.
	Reply(Vec<Vec<String>>),
	/// Buttons attached to the message itself, reporting action codes.
	Inline(Vec<Vec<InlineButton>>),
}

impl Keyboard {
	/// Builds a reply keyboard from rows of labels.
	pub fn reply(rows: &[&[&str]]) -> Self {
		Keyboard::Reply(
			rows.iter()
				.map(|row| row.iter().map(|label| label.to_string()).collect())
				.collect(),
		)
	}

	/// Builds an inline keyboard with one button per row.
	pub fn inline_column(buttons: Vec<InlineButton>) -> Self {
		Keyboard::Inline(buttons.into_iter().map(|button| vec![button]).collect())
	}

	/// Returns every action code carried by an inline keyboard.
	pub fn actions(&self) -> Vec<&str> {
		match self {
			Keyboard::Reply(_) => Vec::new(),
			Keyboard::Inline(rows) => rows
				.iter()
				.flat_map(|row| row.iter().map(|button| button.action.as_str()))
				.collect(),
		}
	}
}

/// A message to be delivered to a single recipient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundMessage {
	/// Recipient of the message.
	pub recipient: UserId,
	/// Message body.
	pub text: String,
	/// Formatting applied to the body.
	pub format: TextFormat,
	/// Optional keyboard shown with the message.
	pub keyboard: Option<Keyboard>,
}

impl OutboundMessage {
	/// Creates a Markdown message without a keyboard.
	pub fn markdown(recipient: UserId, text: impl Into<String>) -> Self {
		Self {
			recipient,
			text: text.into(),
			format: TextFormat::Markdown,
			keyboard: None,
		}
	}

	/// Attaches a keyboard to the message.
	pub fn with_keyboard(mut self, keyboard: Keyboard) -> Self {
		self.keyboard = Some(keyboard);
		self
	}
}
