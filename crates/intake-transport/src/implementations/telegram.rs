//! Telegram transport built on teloxide.
//!
//! Updates are received by long polling through a teloxide dispatcher that
//! forwards text messages and callback queries onto the engine's channel.
//! Private chats are assumed, so the chat id is used as the sender identity.

use crate::{TransportError, TransportFactory, TransportInterface, TransportRegistry};
use async_trait::async_trait;
use intake_types::{
	ImplementationRegistry, InboundEvent, Keyboard, OutboundMessage, SecretString, TextFormat,
	UserId,
};
use teloxide::dispatching::{ShutdownToken, UpdateHandler};
use teloxide::payloads::SendMessageSetters;
use teloxide::prelude::*;
use teloxide::types::{
	InlineKeyboardButton, InlineKeyboardMarkup, KeyboardButton, KeyboardMarkup, ParseMode,
	ReplyMarkup,
};
use teloxide::RequestError;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;

type EventSender = mpsc::UnboundedSender<InboundEvent>;

/// Telegram Bot API transport.
pub struct TelegramTransport {
	bot: Bot,
	shutdown: Mutex<Option<ShutdownToken>>,
	dispatcher: Mutex<Option<JoinHandle<()>>>,
}

impl TelegramTransport {
	pub fn new(token: &SecretString) -> Self {
		Self {
			bot: Bot::new(token.expose_secret()),
			shutdown: Mutex::new(None),
			dispatcher: Mutex::new(None),
		}
	}
}

fn handler_schema() -> UpdateHandler<RequestError> {
	dptree::entry()
		.branch(Update::filter_message().endpoint(forward_message))
		.branch(Update::filter_callback_query().endpoint(forward_callback))
}

async fn forward_message(msg: Message, sender: EventSender) -> ResponseResult<()> {
	let event = InboundEvent::Message {
		sender: UserId(msg.chat.id.0),
		text: msg.text().unwrap_or_default().to_string(),
	};
	if sender.send(event).is_err() {
		tracing::debug!("Engine stopped, dropping message");
	}
	Ok(())
}

async fn forward_callback(query: CallbackQuery, sender: EventSender) -> ResponseResult<()> {
	let event = InboundEvent::CallbackQuery {
		sender: UserId(query.from.id.0 as i64),
		id: query.id.clone(),
		action: query.data.clone().unwrap_or_default(),
	};
	if sender.send(event).is_err() {
		tracing::debug!("Engine stopped, dropping callback query");
	}
	Ok(())
}

fn to_reply_markup(keyboard: &Keyboard) -> ReplyMarkup {
	match keyboard {
		Keyboard::Reply(rows) => ReplyMarkup::Keyboard(KeyboardMarkup::new(
			rows.iter()
				.map(|row| row.iter().map(|label| KeyboardButton::new(label.clone())).collect::<Vec<_>>())
				.collect::<Vec<_>>(),
		)),
		Keyboard::Inline(rows) => ReplyMarkup::InlineKeyboard(InlineKeyboardMarkup::new(
			rows.iter()
				.map(|row| {
					row.iter()
						.map(|button| {
							InlineKeyboardButton::callback(button.label.clone(), button.action.clone())
						})
						.collect::<Vec<_>>()
				})
				.collect::<Vec<_>>(),
		)),
	}
}

fn map_request_error(err: RequestError) -> TransportError {
	match err {
		RequestError::Network(e) => TransportError::Network(e.to_string()),
		other => TransportError::Api(other.to_string()),
	}
}

#[async_trait]
impl TransportInterface for TelegramTransport {
	async fn start_receiving(&self, sender: EventSender) -> Result<(), TransportError> {
		let mut dispatcher_slot = self.dispatcher.lock().await;
		if dispatcher_slot.is_some() {
			return Err(TransportError::AlreadyReceiving);
		}

		let me = self.bot.get_me().await.map_err(map_request_error)?;
		tracing::info!(username = %me.username(), "Logged in to Telegram");

		let mut dispatcher = Dispatcher::builder(self.bot.clone(), handler_schema())
			.dependencies(dptree::deps![sender])
			.build();

		*self.shutdown.lock().await = Some(dispatcher.shutdown_token());
		*dispatcher_slot = Some(tokio::spawn(async move {
			dispatcher.dispatch().await;
		}));
		Ok(())
	}

	async fn stop_receiving(&self) -> Result<(), TransportError> {
		if let Some(token) = self.shutdown.lock().await.take() {
			match token.shutdown() {
				Ok(done) => done.await,
				Err(_) => tracing::debug!("Dispatcher was idle at shutdown"),
			}
		}
		if let Some(handle) = self.dispatcher.lock().await.take() {
			handle.abort();
		}
		Ok(())
	}

	async fn send_message(&self, message: &OutboundMessage) -> Result<(), TransportError> {
		let mut request = self
			.bot
			.send_message(ChatId(message.recipient.0), message.text.clone());
		if message.format == TextFormat::Markdown {
			request = request.parse_mode(ParseMode::Markdown);
		}
		if let Some(keyboard) = &message.keyboard {
			request = request.reply_markup(to_reply_markup(keyboard));
		}

		request.await.map_err(map_request_error)?;
		Ok(())
	}

	async fn acknowledge_callback(&self, callback_id: &str) -> Result<(), TransportError> {
		self.bot
			.answer_callback_query(callback_id.to_string())
			.await
			.map_err(map_request_error)?;
		Ok(())
	}
}

/// Factory function to create the Telegram transport.
pub fn create_transport(token: &SecretString) -> Result<Box<dyn TransportInterface>, TransportError> {
	if token.is_empty() {
		return Err(TransportError::Configuration(
			"Telegram bot token is empty".into(),
		));
	}
	Ok(Box::new(TelegramTransport::new(token)))
}

/// Registry for the Telegram transport.
pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "telegram";
	type Factory = TransportFactory;

	fn factory() -> Self::Factory {
		create_transport
	}
}

impl TransportRegistry for Registry {}

#[cfg(test)]
mod tests {
	use super::*;
	use intake_types::InlineButton;

	#[test]
	fn test_empty_token_rejected() {
		let result = create_transport(&SecretString::from(""));
		assert!(matches!(result, Err(TransportError::Configuration(_))));
	}

	#[test]
	fn test_reply_keyboard_conversion() {
		let markup = to_reply_markup(&Keyboard::reply(&[&["A", "B"], &["C"]]));
		match markup {
			ReplyMarkup::Keyboard(keyboard) => {
				assert_eq!(keyboard.keyboard.len(), 2);
				assert_eq!(keyboard.keyboard[0].len(), 2);
				assert_eq!(keyboard.keyboard[1][0].text, "C");
			},
			other => panic!("unexpected markup: {:?}", other),
		}
	}

	#[test]
	fn test_inline_keyboard_conversion() {
		let markup = to_reply_markup(&Keyboard::inline_column(vec![
			InlineButton::new("Start", "tarif_start"),
			InlineButton::new("Menü", "hauptmenü"),
		]));
		match markup {
			ReplyMarkup::InlineKeyboard(keyboard) => {
				assert_eq!(keyboard.inline_keyboard.len(), 2);
				assert_eq!(keyboard.inline_keyboard[0][0].text, "Start");
			},
			other => panic!("unexpected markup: {:?}", other),
		}
	}
}
