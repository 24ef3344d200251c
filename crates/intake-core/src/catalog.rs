//! Fixed catalog of the bot.
//!
//! Text commands, their button labels, inline action codes, service tiers and
//! preset budgets. Every symbol the user can send is mapped to an enum here,
//! so the engine dispatches over a closed set.

use std::fmt;
use std::str::FromStr;

pub const BUTTON_MENU: &str = "🏠 Hauptmenü";
pub const BUTTON_TARIFFS: &str = "📋 Tarife";
pub const BUTTON_ORDER: &str = "🚀 Bot bestellen";
pub const BUTTON_HELP: &str = "❓ Hilfe";
pub const BUTTON_CONTACTS: &str = "📞 Kontakt";
pub const BUTTON_STATUS: &str = "📊 Meine Bestellungen";

/// Currency suffix appended to custom budget amounts.
pub const CURRENCY_SUFFIX: &str = "€";

/// Global commands, matched before the conversation step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
	/// Welcome text and main menu; abandons any form in progress.
	Menu,
	/// Tier catalog.
	Tariffs,
	/// Starts the order form without a tier.
	Order,
	Help,
	Contacts,
	/// Lists the sender's orders.
	Status,
}

impl Command {
	/// Matches a text message against the command strings and button labels.
	///
	/// Surrounding whitespace is ignored; matching is otherwise exact.
	pub fn parse(text: &str) -> Option<Self> {
		match text.trim() {
			"/start" | "/menu" | BUTTON_MENU => Some(Command::Menu),
			"/tarife" | BUTTON_TARIFFS => Some(Command::Tariffs),
			"/bestellen" | BUTTON_ORDER => Some(Command::Order),
			"/hilfe" | BUTTON_HELP => Some(Command::Help),
			"/kontakt" | BUTTON_CONTACTS => Some(Command::Contacts),
			"/status" | BUTTON_STATUS => Some(Command::Status),
			_ => None,
		}
	}
}

/// Service tiers offered in the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
	Start,
	Business,
	Purchase,
}

impl Tier {
	pub const ALL: [Tier; 3] = [Tier::Start, Tier::Business, Tier::Purchase];

	/// Label shown on the button and recorded on the order.
	pub fn label(&self) -> &'static str {
		match self {
			Tier::Start => "🚀 START - 2.900€/Monat",
			Tier::Business => "👑 BUSINESS - 5.900€/Monat",
			Tier::Purchase => "💎 KAUF - 49.900€",
		}
	}

	pub fn action(&self) -> &'static str {
		match self {
			Tier::Start => "tarif_start",
			Tier::Business => "tarif_business",
			Tier::Purchase => "tarif_kauf",
		}
	}
}

/// Budgets that can be picked from the budget menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresetBudget {
	Monthly2900,
	Monthly5900,
	OneOff49900,
}

impl PresetBudget {
	pub const ALL: [PresetBudget; 3] = [
		PresetBudget::Monthly2900,
		PresetBudget::Monthly5900,
		PresetBudget::OneOff49900,
	];

	/// Budget string recorded on the order.
	pub fn value(&self) -> &'static str {
		match self {
			PresetBudget::Monthly2900 => "2.900€/Monat",
			PresetBudget::Monthly5900 => "5.900€/Monat",
			PresetBudget::OneOff49900 => "49.900€",
		}
	}

	pub fn button_label(&self) -> &'static str {
		match self {
			PresetBudget::Monthly2900 => "💰 2.900€/Monat",
			PresetBudget::Monthly5900 => "💎 5.900€/Monat",
			PresetBudget::OneOff49900 => "👑 49.900€ einmalig",
		}
	}

	pub fn action(&self) -> &'static str {
		match self {
			PresetBudget::Monthly2900 => "budget_2900",
			PresetBudget::Monthly5900 => "budget_5900",
			PresetBudget::OneOff49900 => "budget_49900",
		}
	}
}

/// Action codes carried by inline buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackAction {
	/// Starts the order form with a tier preselected.
	SelectTier(Tier),
	/// Finalizes the order with a preset budget.
	SelectBudget(PresetBudget),
	/// Asks for a free-text amount.
	CustomBudget,
	Contacts,
	Menu,
}

impl CallbackAction {
	pub fn as_str(&self) -> &'static str {
		match self {
			CallbackAction::SelectTier(tier) => tier.action(),
			CallbackAction::SelectBudget(budget) => budget.action(),
			CallbackAction::CustomBudget => "budget_custom",
			CallbackAction::Contacts => "kontakt",
			CallbackAction::Menu => "hauptmenü",
		}
	}
}

impl fmt::Display for CallbackAction {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for CallbackAction {
	type Err = ();

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		if let Some(tier) = Tier::ALL.iter().find(|t| t.action() == s) {
			return Ok(CallbackAction::SelectTier(*tier));
		}
		if let Some(budget) = PresetBudget::ALL.iter().find(|b| b.action() == s) {
			return Ok(CallbackAction::SelectBudget(*budget));
		}
		match s {
			"budget_custom" => Ok(CallbackAction::CustomBudget),
			"kontakt" => Ok(CallbackAction::Contacts),
			"hauptmenü" => Ok(CallbackAction::Menu),
			_ => Err(()),
		}
	}
}
