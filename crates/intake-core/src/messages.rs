//! Message templates and keyboards.
//!
//! All texts use Markdown. Templates that mention the bot's own handle take
//! it from [`Messages::new`].

use crate::catalog::{
	PresetBudget, Tier, BUTTON_CONTACTS, BUTTON_HELP, BUTTON_MENU, BUTTON_ORDER, BUTTON_STATUS,
	BUTTON_TARIFFS,
};
use intake_types::{InlineButton, Keyboard, Order, OutboundMessage, UserId};

const LIST_DATE_FORMAT: &str = "%d.%m.%Y %H:%M";
const NOTIFICATION_TIME_FORMAT: &str = "%H:%M %d.%m.%Y";

const WELCOME: &str = "🤖 *NeuraMarket KI-Bots*

*Automatisieren Sie Ihr Geschäft mit KI-Bots für Telegram*

✨ *Unsere Möglichkeiten:*
• 🤖 Intelligente Chat-Bots
• 🛍 Bestellannahme und -bearbeitung
• 💳 Online-Zahlung
• 📊 Analysen und Berichte
• 🚀 Schneller Start (1-3 Tage)

*Wählen Sie eine Aktion:*";

const TARIFFS: &str = "💰 *Unsere Tarife*

Wählen Sie eine passende Option:";

const NAME_PROMPT: &str = "✨ *Bestellung aufgeben*

*Schritt 1 von 4*
Wie sollen wir Sie ansprechen?
Geben Sie Ihren Namen ein:";

const DESCRIPTION_PROMPT: &str = "✅ *Kontakt gespeichert!*

*Schritt 3 von 4*
Beschreiben Sie die Aufgabe für den Bot:
Was soll Ihr zukünftiger Bot tun? (Bestellungen entgegennehmen, Beratung, Zahlung usw.):";

const BUDGET_PROMPT: &str = "✅ *Aufgabe verstanden!*

*Schritt 4 von 4*
Wählen Sie ein passendes Budget:";

const CUSTOM_BUDGET_PROMPT: &str = "💵 *Ihr Budget*

Geben Sie den Betrag in Euro ein:";

const NO_ORDERS: &str = "📭 *Sie haben noch keine Bestellungen*

Beginnen Sie mit der Schaltfläche *\"🚀 Bot bestellen\"* 👇";

const NOT_UNDERSTOOD: &str = "🤔 *Ich habe Ihre Frage nicht ganz verstanden*

👉 *Wählen Sie eine der folgenden Aktionen:*";

/// Main reply keyboard.
pub fn main_keyboard() -> Keyboard {
	Keyboard::reply(&[
		&[BUTTON_ORDER, BUTTON_TARIFFS],
		&[BUTTON_CONTACTS, BUTTON_STATUS],
		&[BUTTON_HELP],
	])
}

/// Keyboard shown under every form prompt.
pub fn back_to_menu_keyboard() -> Keyboard {
	Keyboard::reply(&[&[BUTTON_MENU]])
}

pub fn help_keyboard() -> Keyboard {
	Keyboard::reply(&[&[BUTTON_TARIFFS, BUTTON_ORDER], &[BUTTON_CONTACTS, BUTTON_MENU]])
}

pub fn contact_keyboard() -> Keyboard {
	Keyboard::reply(&[&[BUTTON_ORDER, BUTTON_TARIFFS], &[BUTTON_MENU]])
}

/// Inline tier catalog.
pub fn tier_keyboard() -> Keyboard {
	let mut buttons: Vec<InlineButton> = Tier::ALL
		.iter()
		.map(|tier| InlineButton::new(tier.label(), tier.action()))
		.collect();
	buttons.push(InlineButton::new("📞 Beratung", "kontakt"));
	buttons.push(InlineButton::new("↩️ Hauptmenü", "hauptmenü"));
	Keyboard::inline_column(buttons)
}

/// Inline budget menu.
pub fn budget_keyboard() -> Keyboard {
	let mut buttons: Vec<InlineButton> = PresetBudget::ALL
		.iter()
		.map(|budget| InlineButton::new(budget.button_label(), budget.action()))
		.collect();
	buttons.push(InlineButton::new("🎯 Anderes Budget", "budget_custom"));
	buttons.push(InlineButton::new("↩️ Hauptmenü", "hauptmenü"));
	Keyboard::inline_column(buttons)
}

/// Builds every outbound message of the bot.
#[derive(Debug, Clone)]
pub struct Messages {
	bot_username: String,
}

impl Messages {
	pub fn new(bot_username: impl Into<String>) -> Self {
		Self {
			bot_username: bot_username.into(),
		}
	}

	pub fn welcome(&self, to: UserId) -> OutboundMessage {
		OutboundMessage::markdown(to, WELCOME).with_keyboard(main_keyboard())
	}

	pub fn tariffs(&self, to: UserId) -> OutboundMessage {
		OutboundMessage::markdown(to, TARIFFS).with_keyboard(tier_keyboard())
	}

	pub fn name_prompt(&self, to: UserId) -> OutboundMessage {
		OutboundMessage::markdown(to, NAME_PROMPT).with_keyboard(back_to_menu_keyboard())
	}

	pub fn contact_prompt(&self, to: UserId, name: &str) -> OutboundMessage {
		let text = format!(
			"✅ *Perfekt, {}!*

*Schritt 2 von 4*
Wie können wir Sie kontaktieren?
Geben Sie Ihre Telefonnummer oder @username in Telegram ein:",
			name
		);
		OutboundMessage::markdown(to, text).with_keyboard(back_to_menu_keyboard())
	}

	pub fn description_prompt(&self, to: UserId) -> OutboundMessage {
		OutboundMessage::markdown(to, DESCRIPTION_PROMPT).with_keyboard(back_to_menu_keyboard())
	}

	pub fn budget_menu(&self, to: UserId) -> OutboundMessage {
		OutboundMessage::markdown(to, BUDGET_PROMPT).with_keyboard(budget_keyboard())
	}

	pub fn custom_budget_prompt(&self, to: UserId) -> OutboundMessage {
		OutboundMessage::markdown(to, CUSTOM_BUDGET_PROMPT).with_keyboard(back_to_menu_keyboard())
	}

	/// Confirmation sent to the customer after finalization.
	pub fn confirmation(&self, to: UserId, order: &Order) -> OutboundMessage {
		let text = format!(
			"🎉 *Bestellung erfolgreich aufgegeben!*

*Vielen Dank für Ihre Bestellung!*

📋 *Bestelldetails:*
┌─────────────────────────
│ • **Tarif:** {}
│ • **Budget:** {}
│ • **Status:** 🟡 Wird bearbeitet
└─────────────────────────

⏱ *Durchschnittliche Entwicklungszeit:* 1-3 Tage
👨‍💻 *Unser Manager wird sich innerhalb von 15 Minuten bei Ihnen melden*

*Für Kontakt:* {}",
			order.tier, order.budget, self.bot_username
		);
		OutboundMessage::markdown(to, text).with_keyboard(main_keyboard())
	}

	pub fn help(&self, to: UserId) -> OutboundMessage {
		let text = format!(
			"❓ *Hilfe*

*Häufige Fragen:*

🔹 *Wie lange dauert die Entwicklung?*
   └ Vorlagen-Bot: 1-3 Tage
   └ Individueller Bot: 5-10 Tage

🔹 *Wie erfolgt die Zahlung?*
   └ 50% Vorauszahlung, 50% nach Fertigstellung
   └ Karte, SEPA, Kryptowährung

🔹 *Gibt es eine Testphase?*
   └ Ja, 3 Tage kostenloses Testen

🔹 *Welche Unterstützung gibt es nach dem Start?*
   └ 1 Monat kostenlose Unterstützung
   └ Danach nach Vereinbarung

📞 *Bei allen Fragen:* {}",
			self.bot_username
		);
		OutboundMessage::markdown(to, text).with_keyboard(help_keyboard())
	}

	pub fn contacts(&self, to: UserId) -> OutboundMessage {
		let text = format!(
			"📞 *Kontakte*

*Haupt-Bot:* {}
*Neuigkeiten:* @NeuraMarket_news

📧 *E-Mail:* support@neuramarket.de
🌐 *Webseite:* https://neuramarket.de

🕐 *Support-Zeiten:*
┌ Mo-Fr: 9:00-21:00
└ Sa-So: 10:00-18:00

*Wir sind immer für Sie da!* ✨",
			self.bot_username
		);
		OutboundMessage::markdown(to, text).with_keyboard(contact_keyboard())
	}

	/// Lists `orders` numbered from one, in the given order.
	pub fn order_status(&self, to: UserId, orders: &[Order]) -> OutboundMessage {
		if orders.is_empty() {
			return OutboundMessage::markdown(to, NO_ORDERS).with_keyboard(main_keyboard());
		}

		let mut text = String::from("📋 *Ihre Bestellungen:*\n\n");
		for (index, order) in orders.iter().enumerate() {
			let icon = order.status.icon();
			text.push_str(&format!(
				"*Bestellung #{}* {}\n┌ Tarif: {}\n├ Budget: {}\n├ Status: {} {}\n└ Datum: {}\n\n",
				index + 1,
				icon,
				order.tier,
				order.budget,
				icon,
				order.status.label(),
				order.created_at.format(LIST_DATE_FORMAT)
			));
		}
		OutboundMessage::markdown(to, text).with_keyboard(main_keyboard())
	}

	pub fn not_understood(&self, to: UserId) -> OutboundMessage {
		OutboundMessage::markdown(to, NOT_UNDERSTOOD).with_keyboard(main_keyboard())
	}

	/// Order summary for the operator.
	pub fn operator_notification(&self, operator: UserId, order: &Order) -> OutboundMessage {
		let text = format!(
			"🎯 *Neue Bestellung!*

👤 *Kunde:* {}
📞 *Kontakt:* {}
💰 *Tarif:* {}
💎 *Budget:* {}
📝 *Aufgabe:* {}
🕐 *Zeit:* {}
🆔 *ID:* {}

*Status:* 🟡 Neue Anfrage",
			order.name,
			order.contact,
			order.tier,
			order.budget,
			order.description,
			order.created_at.format(NOTIFICATION_TIME_FORMAT),
			order.user_id
		);
		OutboundMessage::markdown(operator, text)
	}
}
