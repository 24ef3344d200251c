//! Per-user conversation state.
//!
//! A state is created the first time a user is seen and lives for the rest
//! of the process. Events for one user are handled one at a time by the
//! engine, so a single lock around the map is enough.

use intake_types::UserId;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Step of the order form a user is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Step {
	#[default]
	Idle,
	AwaitingName,
	AwaitingContact,
	AwaitingDescription,
	AwaitingBudget,
	AwaitingCustomBudget,
}

/// Answers collected so far in the current order attempt.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PartialAnswers {
	pub name: Option<String>,
	pub contact: Option<String>,
	pub description: Option<String>,
	/// Tier label, set when the form was started from the tier catalog.
	pub tier: Option<String>,
}

impl PartialAnswers {
	pub fn is_empty(&self) -> bool {
		self.name.is_none()
			&& self.contact.is_none()
			&& self.description.is_none()
			&& self.tier.is_none()
	}
}

/// Session of one user.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ConversationState {
	pub step: Step,
	pub answers: PartialAnswers,
}

impl ConversationState {
	/// Returns to idle and forgets the current attempt.
	pub fn reset(&mut self) {
		self.step = Step::Idle;
		self.answers = PartialAnswers::default();
	}
}

/// Map from user to conversation state.
#[derive(Debug, Default)]
pub struct ConversationStore {
	states: RwLock<HashMap<UserId, ConversationState>>,
}

impl ConversationStore {
	pub fn new() -> Self {
		Self::default()
	}

	/// Returns a copy of the user's state, creating it if the user is new.
	pub async fn snapshot(&self, user: UserId) -> ConversationState {
		if let Some(state) = self.states.read().await.get(&user) {
			return state.clone();
		}
		self.states.write().await.entry(user).or_default().clone()
	}

	/// Applies `update` to the user's state, creating it if the user is new.
	pub async fn update<F, R>(&self, user: UserId, update: F) -> R
	where
		F: FnOnce(&mut ConversationState) -> R,
	{
		let mut states = self.states.write().await;
		update(states.entry(user).or_default())
	}

	/// Number of users seen so far.
	pub async fn len(&self) -> usize {
		self.states.read().await.len()
	}

	pub async fn is_empty(&self) -> bool {
		self.states.read().await.is_empty()
	}
}
