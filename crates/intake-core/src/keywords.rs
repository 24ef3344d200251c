//! Keyword fallback for free text outside the order form.

/// Canned response picked by keyword matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeywordIntent {
	Greeting,
	Pricing,
	Contacts,
	Help,
	Status,
}

/// Keyword groups in matching order. The first group with a hit wins.
const KEYWORD_GROUPS: &[(KeywordIntent, &[&str])] = &[
	(KeywordIntent::Greeting, &["hallo", "guten tag"]),
	(KeywordIntent::Pricing, &["was kostet", "preis"]),
	(KeywordIntent::Contacts, &["kontakt", "telefon"]),
	(KeywordIntent::Help, &["hilfe"]),
	(KeywordIntent::Status, &["status", "bestellung"]),
];

/// Classifies `text` by case-insensitive substring match.
///
/// Returns `None` when no keyword occurs.
pub fn classify(text: &str) -> Option<KeywordIntent> {
	let lower = text.to_lowercase();
	KEYWORD_GROUPS
		.iter()
		.find(|(_, keywords)| keywords.iter().any(|keyword| lower.contains(keyword)))
		.map(|(intent, _)| *intent)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_case_insensitive_match() {
		assert_eq!(classify("Preis bitte"), Some(KeywordIntent::Pricing));
		assert_eq!(classify("HALLO"), Some(KeywordIntent::Greeting));
		assert_eq!(classify("Guten Tag!"), Some(KeywordIntent::Greeting));
		assert_eq!(classify("Was kostet das?"), Some(KeywordIntent::Pricing));
		assert_eq!(classify("Ihre Telefonnummer?"), Some(KeywordIntent::Contacts));
		assert_eq!(classify("brauche hilfe"), Some(KeywordIntent::Help));
		assert_eq!(classify("Meine Bestellung"), Some(KeywordIntent::Status));
	}

	#[test]
	fn test_first_group_wins() {
		assert_eq!(classify("hallo, was ist der preis?"), Some(KeywordIntent::Greeting));
		assert_eq!(classify("preis und kontakt"), Some(KeywordIntent::Pricing));
		assert_eq!(classify("kontakt zur bestellung"), Some(KeywordIntent::Contacts));
		assert_eq!(classify("hilfe beim status"), Some(KeywordIntent::Help));
	}

	#[test]
	fn test_no_match() {
		assert_eq!(classify("Maria"), None);
		assert_eq!(classify(""), None);
	}
}
