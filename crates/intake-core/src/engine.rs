//! Conversation engine.
//!
//! Interprets every inbound event against the sender's conversation state,
//! replies through the transport and appends finalized orders to the ledger.
//! Events are handled one at a time, in the order the transport delivers
//! them.

use crate::catalog::{CallbackAction, Command, CURRENCY_SUFFIX};
use crate::keywords::{self, KeywordIntent};
use crate::ledger::OrderLedger;
use crate::messages::Messages;
use crate::notifier::Notifier;
use crate::state::{ConversationStore, Step};
use chrono::Utc;
use intake_config::BotConfig;
use intake_transport::TransportService;
use intake_types::{InboundEvent, Order, OrderStatus, OutboundMessage, UserId};
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;

/// Errors that stop the engine.
///
/// Everything that happens while handling a single event is logged instead.
#[derive(Debug, Error)]
pub enum EngineError {
	#[error("Transport error: {0}")]
	Transport(String),
}

/// The order-intake state machine.
pub struct ConversationEngine {
	transport: Arc<TransportService>,
	states: ConversationStore,
	ledger: OrderLedger,
	notifier: Notifier,
	messages: Messages,
}

impl ConversationEngine {
	pub fn new(transport: TransportService, ledger: OrderLedger, bot: &BotConfig) -> Self {
		let transport = Arc::new(transport);
		let messages = Messages::new(bot.username.clone());
		Self {
			notifier: Notifier::new(UserId(bot.operator_id), transport.clone(), messages.clone()),
			transport,
			states: ConversationStore::new(),
			ledger,
			messages,
		}
	}

	pub fn states(&self) -> &ConversationStore {
		&self.states
	}

	pub fn ledger(&self) -> &OrderLedger {
		&self.ledger
	}

	/// Receives events until Ctrl+C, then stops the transport.
	pub async fn run(&self) -> Result<(), EngineError> {
		self.run_until(async {
			if let Err(e) = tokio::signal::ctrl_c().await {
				tracing::error!(error = %e, "Failed to listen for Ctrl+C");
			}
		})
		.await
	}

	/// Receives events until `shutdown` completes, then stops the transport.
	pub async fn run_until<F>(&self, shutdown: F) -> Result<(), EngineError>
	where
		F: Future<Output = ()>,
	{
		let (event_tx, mut event_rx) = mpsc::unbounded_channel();
		self.transport
			.start(event_tx)
			.await
			.map_err(|e| EngineError::Transport(e.to_string()))?;
		tracing::info!("Receiving updates");

		tokio::pin!(shutdown);
		loop {
			tokio::select! {
				event = event_rx.recv() => match event {
					Some(event) => self.handle_event(event).await,
					None => {
						tracing::warn!("Transport closed the event stream");
						break;
					}
				},

				_ = &mut shutdown => {
					tracing::info!("Shutdown requested");
					break;
				}
			}
		}

		self.transport
			.stop()
			.await
			.map_err(|e| EngineError::Transport(e.to_string()))?;
		Ok(())
	}

	/// Handles one inbound event.
	pub async fn handle_event(&self, event: InboundEvent) {
		match event {
			InboundEvent::Message { sender, text } => self.handle_message(sender, &text).await,
			InboundEvent::CallbackQuery { sender, id, action } => {
				self.handle_callback(sender, &action).await;
				if let Err(e) = self.transport.acknowledge(&id).await {
					tracing::warn!(user_id = %sender, error = %e, "Failed to acknowledge callback");
				}
			},
		}
	}

	async fn handle_message(&self, user: UserId, text: &str) {
		let text = text.trim();
		if let Some(command) = Command::parse(text) {
			tracing::debug!(user_id = %user, ?command, "Command");
			return self.handle_command(user, command).await;
		}

		let step = self.states.snapshot(user).await.step;
		match step {
			Step::Idle => self.handle_free_text(user, text).await,
			Step::AwaitingName => {
				self.advance(user, Step::AwaitingContact, |a| a.name = Some(text.to_string()))
					.await;
				self.send(self.messages.contact_prompt(user, text)).await;
			},
			Step::AwaitingContact => {
				self.advance(user, Step::AwaitingDescription, |a| {
					a.contact = Some(text.to_string())
				})
				.await;
				self.send(self.messages.description_prompt(user)).await;
			},
			Step::AwaitingDescription => {
				self.advance(user, Step::AwaitingBudget, |a| {
					a.description = Some(text.to_string())
				})
				.await;
				self.send(self.messages.budget_menu(user)).await;
			},
			Step::AwaitingBudget => self.finalize(user, text.to_string()).await,
			Step::AwaitingCustomBudget => {
				self.finalize(user, format!("{}{}", text, CURRENCY_SUFFIX))
					.await
			},
		}
	}

	async fn handle_command(&self, user: UserId, command: Command) {
		match command {
			Command::Menu => self.show_menu(user).await,
			Command::Tariffs => self.send(self.messages.tariffs(user)).await,
			Command::Order => self.start_order(user, None).await,
			Command::Help => self.send(self.messages.help(user)).await,
			Command::Contacts => self.send(self.messages.contacts(user)).await,
			Command::Status => self.show_status(user).await,
		}
	}

	async fn handle_callback(&self, user: UserId, action: &str) {
		let Ok(action) = action.parse::<CallbackAction>() else {
			tracing::debug!(user_id = %user, action, "Unknown callback action");
			return;
		};
		tracing::debug!(user_id = %user, %action, "Callback");

		match action {
			CallbackAction::SelectTier(tier) => self.start_order(user, Some(tier.label())).await,
			CallbackAction::SelectBudget(budget) => {
				self.finalize(user, budget.value().to_string()).await
			},
			CallbackAction::CustomBudget => {
				self.advance(user, Step::AwaitingCustomBudget, |_| {}).await;
				self.send(self.messages.custom_budget_prompt(user)).await;
			},
			CallbackAction::Contacts => self.send(self.messages.contacts(user)).await,
			CallbackAction::Menu => self.show_menu(user).await,
		}
	}

	async fn handle_free_text(&self, user: UserId, text: &str) {
		match keywords::classify(text) {
			Some(KeywordIntent::Greeting) => self.show_menu(user).await,
			Some(KeywordIntent::Pricing) => self.send(self.messages.tariffs(user)).await,
			Some(KeywordIntent::Contacts) => self.send(self.messages.contacts(user)).await,
			Some(KeywordIntent::Help) => self.send(self.messages.help(user)).await,
			Some(KeywordIntent::Status) => self.show_status(user).await,
			None => self.send(self.messages.not_understood(user)).await,
		}
	}

	/// Welcome message; abandons any form in progress.
	async fn show_menu(&self, user: UserId) {
		self.states.update(user, |state| state.reset()).await;
		self.send(self.messages.welcome(user)).await;
	}

	/// Enters the name step. Answers from an earlier attempt are kept, and
	/// the tier is only overwritten when one is given.
	async fn start_order(&self, user: UserId, tier: Option<&str>) {
		self.advance(user, Step::AwaitingName, |answers| {
			if let Some(tier) = tier {
				answers.tier = Some(tier.to_string());
			}
		})
		.await;
		self.send(self.messages.name_prompt(user)).await;
	}

	async fn show_status(&self, user: UserId) {
		let orders = self.ledger.query_by_user(user).await;
		self.send(self.messages.order_status(user, &orders)).await;
	}

	async fn advance<F>(&self, user: UserId, next: Step, record: F)
	where
		F: FnOnce(&mut crate::state::PartialAnswers),
	{
		let previous = self
			.states
			.update(user, |state| {
				record(&mut state.answers);
				std::mem::replace(&mut state.step, next)
			})
			.await;
		tracing::debug!(user_id = %user, from = ?previous, to = ?next, "Step changed");
	}

	/// Turns the collected answers into an order.
	async fn finalize(&self, user: UserId, budget: String) {
		let answers = self
			.states
			.update(user, |state| {
				let answers = std::mem::take(&mut state.answers);
				state.reset();
				answers
			})
			.await;

		let mut order = Order {
			id: 0,
			user_id: user,
			name: answers.name.unwrap_or_default(),
			contact: answers.contact.unwrap_or_default(),
			tier: answers.tier.unwrap_or_default(),
			description: answers.description.unwrap_or_default(),
			budget,
			status: OrderStatus::New,
			created_at: Utc::now(),
		};
		order.id = self.ledger.append(order.clone()).await;

		tracing::info!(
			order_id = order.id,
			user_id = %user,
			tier = %order.tier,
			budget = %order.budget,
			"New order"
		);

		self.send(self.messages.confirmation(user, &order)).await;
		if let Err(e) = self.notifier.notify(&order).await {
			tracing::error!(order_id = order.id, error = %e, "Failed to notify operator");
		}
	}

	async fn send(&self, message: OutboundMessage) {
		if let Err(e) = self.transport.send(&message).await {
			tracing::warn!(user_id = %message.recipient, error = %e, "Failed to send message");
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::ledger::tests::FailingStore;
	use crate::messages;
	use crate::state::{ConversationState, PartialAnswers};
	use intake_storage::StorageService;
	use intake_transport::implementations::memory::MemoryTransport;
	use std::sync::atomic::Ordering;

	const OPERATOR: UserId = UserId(999);
	const MARIA: UserId = UserId(42);

	fn bot_config() -> BotConfig {
		BotConfig {
			username: "@Test_Bot".into(),
			operator_id: OPERATOR.0,
			verbose: false,
		}
	}

	fn engine_with(ledger: OrderLedger) -> (ConversationEngine, MemoryTransport) {
		let transport = MemoryTransport::new();
		let engine = ConversationEngine::new(
			TransportService::new(Box::new(transport.clone())),
			ledger,
			&bot_config(),
		);
		(engine, transport)
	}

	fn engine() -> (ConversationEngine, MemoryTransport) {
		engine_with(OrderLedger::in_memory())
	}

	async fn say(engine: &ConversationEngine, user: UserId, text: &str) {
		engine
			.handle_event(InboundEvent::Message {
				sender: user,
				text: text.to_string(),
			})
			.await;
	}

	async fn press(engine: &ConversationEngine, user: UserId, action: &str) {
		engine
			.handle_event(InboundEvent::CallbackQuery {
				sender: user,
				id: format!("cb-{}", action),
				action: action.to_string(),
			})
			.await;
	}

	async fn step(engine: &ConversationEngine, user: UserId) -> Step {
		engine.states().snapshot(user).await.step
	}

	async fn last_text(transport: &MemoryTransport) -> String {
		transport
			.sent()
			.await
			.last()
			.map(|m| m.text.clone())
			.unwrap_or_default()
	}

	async fn fill_form(engine: &ConversationEngine, user: UserId) {
		say(engine, user, "/bestellen").await;
		say(engine, user, "Maria").await;
		say(engine, user, "@maria99").await;
		say(engine, user, "Kundenservice-Bot").await;
	}

	#[tokio::test]
	async fn test_fresh_user_is_idle() {
		let (engine, _) = engine();
		assert_eq!(
			engine.states().snapshot(UserId(7)).await,
			ConversationState::default()
		);
	}

	#[tokio::test]
	async fn test_full_order_flow() {
		let (engine, transport) = engine();

		say(&engine, MARIA, "/bestellen").await;
		assert_eq!(step(&engine, MARIA).await, Step::AwaitingName);
		assert!(last_text(&transport).await.contains("Schritt 1 von 4"));

		say(&engine, MARIA, "Maria").await;
		assert_eq!(step(&engine, MARIA).await, Step::AwaitingContact);
		assert_eq!(
			engine.states().snapshot(MARIA).await.answers.name.as_deref(),
			Some("Maria")
		);
		assert!(last_text(&transport).await.contains("Perfekt, Maria!"));

		say(&engine, MARIA, "@maria99").await;
		assert_eq!(step(&engine, MARIA).await, Step::AwaitingDescription);

		say(&engine, MARIA, "Kundenservice-Bot").await;
		assert_eq!(step(&engine, MARIA).await, Step::AwaitingBudget);
		assert_eq!(
			transport.sent().await.last().and_then(|m| m.keyboard.clone()),
			Some(messages::budget_keyboard())
		);

		transport.take_sent().await;
		press(&engine, MARIA, "budget_49900").await;

		let orders = engine.ledger().query_by_user(MARIA).await;
		assert_eq!(orders.len(), 1);
		let order = &orders[0];
		assert_eq!(order.id, 1);
		assert_eq!(order.name, "Maria");
		assert_eq!(order.contact, "@maria99");
		assert_eq!(order.tier, "");
		assert_eq!(order.description, "Kundenservice-Bot");
		assert_eq!(order.budget, "49.900€");
		assert_eq!(order.status, OrderStatus::New);

		assert_eq!(
			engine.states().snapshot(MARIA).await,
			ConversationState::default()
		);

		let sent = transport.sent().await;
		let to_operator: Vec<_> = sent.iter().filter(|m| m.recipient == OPERATOR).collect();
		assert_eq!(to_operator.len(), 1);
		assert!(to_operator[0].text.contains("📞 *Kontakt:* @maria99"));
		assert!(sent
			.iter()
			.any(|m| m.recipient == MARIA && m.text.contains("Bestellung erfolgreich")));
		assert_eq!(transport.acknowledged().await, vec!["cb-budget_49900".to_string()]);
	}

	#[tokio::test]
	async fn test_each_completed_flow_appends_one_order() {
		let (engine, _) = engine();

		for expected in 1..=3 {
			fill_form(&engine, MARIA).await;
			press(&engine, MARIA, "budget_2900").await;
			assert_eq!(engine.ledger().len().await, expected);
		}

		let ids: Vec<_> = engine
			.ledger()
			.query_by_user(MARIA)
			.await
			.iter()
			.map(|o| o.id)
			.collect();
		assert_eq!(ids, vec![1, 2, 3]);
	}

	#[tokio::test]
	async fn test_custom_budget_appends_currency() {
		let (engine, transport) = engine();
		fill_form(&engine, MARIA).await;

		press(&engine, MARIA, "budget_custom").await;
		assert_eq!(step(&engine, MARIA).await, Step::AwaitingCustomBudget);
		assert!(last_text(&transport).await.contains("Betrag in Euro"));

		say(&engine, MARIA, "1500").await;
		let orders = engine.ledger().query_by_user(MARIA).await;
		assert_eq!(orders.len(), 1);
		assert_eq!(orders[0].budget, "1500€");
		assert_eq!(step(&engine, MARIA).await, Step::Idle);
	}

	#[tokio::test]
	async fn test_free_text_budget_is_taken_verbatim() {
		let (engine, _) = engine();
		fill_form(&engine, MARIA).await;

		say(&engine, MARIA, "ca. 3000 Euro").await;
		let orders = engine.ledger().query_by_user(MARIA).await;
		assert_eq!(orders[0].budget, "ca. 3000 Euro");
	}

	#[tokio::test]
	async fn test_tier_selection_is_recorded() {
		let (engine, _) = engine();

		press(&engine, MARIA, "tarif_business").await;
		assert_eq!(step(&engine, MARIA).await, Step::AwaitingName);
		assert_eq!(
			engine.states().snapshot(MARIA).await.answers,
			PartialAnswers {
				tier: Some("👑 BUSINESS - 5.900€/Monat".into()),
				..Default::default()
			}
		);

		say(&engine, MARIA, "Maria").await;
		say(&engine, MARIA, "@maria99").await;
		say(&engine, MARIA, "Shop").await;
		press(&engine, MARIA, "budget_5900").await;

		let orders = engine.ledger().query_by_user(MARIA).await;
		assert_eq!(orders[0].tier, "👑 BUSINESS - 5.900€/Monat");
		assert_eq!(orders[0].budget, "5.900€/Monat");
	}

	#[tokio::test]
	async fn test_menu_interrupts_form_and_drops_answers() {
		let (engine, transport) = engine();
		say(&engine, MARIA, "/bestellen").await;
		say(&engine, MARIA, "Maria").await;
		assert_eq!(step(&engine, MARIA).await, Step::AwaitingContact);

		say(&engine, MARIA, "/menu").await;
		let state = engine.states().snapshot(MARIA).await;
		assert_eq!(state.step, Step::Idle);
		assert!(state.answers.is_empty());
		assert!(last_text(&transport).await.contains("NeuraMarket KI-Bots"));
		assert!(engine.ledger().is_empty().await);
	}

	#[tokio::test]
	async fn test_button_label_matches_command_mid_form() {
		let (engine, _) = engine();
		say(&engine, MARIA, "/bestellen").await;

		say(&engine, MARIA, " 📋 Tarife ").await;
		let state = engine.states().snapshot(MARIA).await;
		assert_eq!(state.step, Step::AwaitingName);
		assert_eq!(state.answers.name, None);
	}

	#[tokio::test]
	async fn test_keyword_fallback_when_idle() {
		let (engine, transport) = engine();

		say(&engine, MARIA, "Preis bitte").await;
		let sent = transport.take_sent().await;
		assert_eq!(sent.len(), 1);
		assert_eq!(sent[0].keyboard, Some(messages::tier_keyboard()));

		say(&engine, MARIA, "Wie geht's?").await;
		assert!(last_text(&transport).await.contains("nicht ganz verstanden"));
		assert_eq!(step(&engine, MARIA).await, Step::Idle);
	}

	#[tokio::test]
	async fn test_keywords_ignored_inside_form() {
		let (engine, _) = engine();
		say(&engine, MARIA, "/bestellen").await;
		say(&engine, MARIA, "Hallo Preis").await;

		let state = engine.states().snapshot(MARIA).await;
		assert_eq!(state.step, Step::AwaitingContact);
		assert_eq!(state.answers.name.as_deref(), Some("Hallo Preis"));
	}

	#[tokio::test]
	async fn test_status_lists_only_own_orders() {
		let (engine, transport) = engine();
		let other = UserId(7);

		say(&engine, MARIA, "/status").await;
		assert!(last_text(&transport).await.contains("noch keine Bestellungen"));

		fill_form(&engine, MARIA).await;
		press(&engine, MARIA, "budget_2900").await;
		fill_form(&engine, other).await;
		press(&engine, other, "budget_5900").await;

		say(&engine, MARIA, "📊 Meine Bestellungen").await;
		let text = last_text(&transport).await;
		assert!(text.contains("*Bestellung #1* 🟡"));
		assert!(text.contains("2.900€/Monat"));
		assert!(!text.contains("#2"));
	}

	#[tokio::test]
	async fn test_every_callback_is_acknowledged() {
		let (engine, transport) = engine();
		press(&engine, MARIA, "kontakt").await;
		press(&engine, MARIA, "no_such_action").await;
		press(&engine, MARIA, "hauptmenü").await;

		assert_eq!(transport.acknowledged().await.len(), 3);
		assert_eq!(transport.sent().await.len(), 2);
	}

	#[tokio::test]
	async fn test_failing_store_keeps_flow_going() {
		let store = FailingStore::default();
		let attempts = store.attempts.clone();
		let (engine, transport) = engine_with(OrderLedger::new(Some(StorageService::new(
			"failing",
			Box::new(store),
		))));

		fill_form(&engine, MARIA).await;
		press(&engine, MARIA, "budget_49900").await;

		assert_eq!(attempts.load(Ordering::SeqCst), 1);
		assert_eq!(engine.ledger().len().await, 1);
		assert!(transport.sent().await.iter().any(|m| m.recipient == OPERATOR));
	}

	#[tokio::test]
	async fn test_send_failures_do_not_block_state() {
		let (engine, transport) = engine();
		transport.set_fail_sends(true);

		fill_form(&engine, MARIA).await;
		press(&engine, MARIA, "budget_2900").await;

		assert_eq!(engine.ledger().len().await, 1);
		assert_eq!(step(&engine, MARIA).await, Step::Idle);
		assert!(transport.sent().await.is_empty());
	}

	#[tokio::test]
	async fn test_run_until_processes_events_and_stops() {
		let (engine, transport) = engine();
		let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();

		let driver = async {
			while !transport
				.inject(InboundEvent::Message {
					sender: MARIA,
					text: "/start".into(),
				})
				.await
			{
				tokio::task::yield_now().await;
			}
			while transport.sent().await.is_empty() {
				tokio::task::yield_now().await;
			}
			let _ = stop_tx.send(());
		};

		let (result, _) = tokio::join!(
			engine.run_until(async {
				let _ = stop_rx.await;
			}),
			driver
		);

		assert!(result.is_ok());
		assert!(last_text(&transport).await.contains("NeuraMarket KI-Bots"));
		assert!(!transport
			.inject(InboundEvent::Message {
				sender: MARIA,
				text: "/start".into(),
			})
			.await);
	}
}
