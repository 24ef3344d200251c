//! Order types for the intake bot.
//!
//! An order is the frozen result of one completed intake conversation. It is
//! created exactly once, when the budget step finishes, and handed to the
//! order ledger which assigns its identity.

use crate::UserId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A submitted order.
///
/// Apart from `status`, fields are never modified once the ledger accepted
/// the order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
	/// Identity assigned by the ledger; zero until appended.
	pub id: u64,
	/// User that submitted the order.
	pub user_id: UserId,
	/// Name the user asked to be addressed by.
	pub name: String,
	/// Phone number or messenger handle.
	pub contact: String,
	/// Label of the chosen tier, empty when the flow started without one.
	pub tier: String,
	/// Free-text task description.
	pub description: String,
	/// Budget, either a preset label or a custom amount with currency suffix.
	pub budget: String,
	/// Processing status.
	pub status: OrderStatus,
	/// When the order was finalized.
	pub created_at: DateTime<Utc>,
}

/// Processing status of an order.
///
/// Only `New` is ever assigned by the intake flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
	/// Order was just submitted.
	#[default]
	New,
	/// An operator is working on the order.
	InProgress,
	/// The order has been delivered.
	Done,
}

impl OrderStatus {
	/// Returns the stable identifier used in storage.
	pub fn as_str(&self) -> &'static str {
		match self {
			OrderStatus::New => "new",
			OrderStatus::InProgress => "in_progress",
			OrderStatus::Done => "done",
		}
	}

	/// Returns the label shown to users.
	pub fn label(&self) -> &'static str {
		match self {
			OrderStatus::New => "neu",
			OrderStatus::InProgress => "in Bearbeitung",
			OrderStatus::Done => "abgeschlossen",
		}
	}

	/// Returns the status marker used in order listings.
	pub fn icon(&self) -> &'static str {
		match self {
			OrderStatus::New => "🟡",
			OrderStatus::InProgress => "🟠",
			OrderStatus::Done => "✅",
		}
	}
}

impl fmt::Display for OrderStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for OrderStatus {
	type Err = ();

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"new" => Ok(Self::New),
			"in_progress" => Ok(Self::InProgress),
			"done" => Ok(Self::Done),
			_ => Err(()),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_status_identifiers_parse_back() {
		for status in [OrderStatus::New, OrderStatus::InProgress, OrderStatus::Done] {
			assert_eq!(status.as_str().parse::<OrderStatus>(), Ok(status));
		}
		assert!("neu".parse::<OrderStatus>().is_err());
	}

	#[test]
	fn test_status_serializes_snake_case() {
		let json = serde_json::to_string(&OrderStatus::InProgress).unwrap();
		assert_eq!(json, "\"in_progress\"");
	}

	#[test]
	fn test_default_status_is_new() {
		assert_eq!(OrderStatus::default(), OrderStatus::New);
		assert_eq!(OrderStatus::New.icon(), "🟡");
	}
}
