//! Conversation core of the order-intake bot.
//!
//! This crate holds everything between the transport and the store: the
//! fixed catalog of tiers, budgets, commands and action codes, the message
//! templates, the per-user conversation state, the order ledger, the keyword
//! fallback, the operator notifier and the engine that ties them together.
//! [`EngineBuilder`] assembles an engine from configuration.

pub mod builder;
pub mod catalog;
pub mod engine;
pub mod keywords;
pub mod ledger;
pub mod messages;
pub mod notifier;
pub mod state;

pub use builder::{BuilderError, EngineBuilder, EngineFactories};
pub use engine::{ConversationEngine, EngineError};
pub use ledger::OrderLedger;
pub use state::{ConversationState, ConversationStore, PartialAnswers, Step};
