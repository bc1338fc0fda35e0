//! # Filter Engine
//!
//! Derives the displayed subset of a card list from a query. The raw list is
//! never reordered or mutated; the only side effect is that a card's number
//! gets memoized the first time a numeric query looks at it.
//!
//! Queries are trimmed and lowercased. A query that starts with `#` or is all
//! digits is a card-number query (`#007`, `07` and `7` are the same query);
//! anything else is a case-insensitive substring match on the card name.

use crate::model::{Card, Slot};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Query {
    All,
    Number(String),
    Name(String),
}

impl Query {
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim().to_lowercase();
        if trimmed.is_empty() {
            return Query::All;
        }
        if trimmed.starts_with('#') || trimmed.chars().all(|c| c.is_ascii_digit()) {
            let digits = trimmed.strip_prefix('#').unwrap_or(&trimmed);
            return Query::Number(strip_leading_zeros(digits).to_string());
        }
        Query::Name(trimmed)
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Query::All)
    }

    pub fn matches(&self, card: &Card) -> bool {
        match self {
            Query::All => true,
            Query::Number(wanted) => card
                .number()
                .is_some_and(|number| strip_leading_zeros(number) == wanted),
            Query::Name(needle) => card.name.to_lowercase().contains(needle.as_str()),
        }
    }
}

/// `"007"` → `"7"`; an all-zero (or empty) run becomes `"0"`.
pub fn strip_leading_zeros(digits: &str) -> &str {
    let stripped = digits.trim_start_matches('0');
    if stripped.is_empty() {
        "0"
    } else {
        stripped
    }
}

/// Order-preserving filter over catalog cards. An empty query is a full copy.
pub fn filter_cards(raw: &[Card], query: &str) -> Vec<Card> {
    let query = Query::parse(query);
    raw.iter()
        .filter(|card| query.matches(card))
        .cloned()
        .collect()
}

/// A binder slot as displayed, remembering where it lives in the binder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplaySlot {
    pub index: usize,
    pub slot: Slot,
}

/// Order-preserving filter over binder slots.
///
/// With an empty query every slot is kept, empties included, so positions
/// equal binder indexes. With any other query empty slots never match.
pub fn filter_slots(raw: &[Slot], query: &str) -> Vec<DisplaySlot> {
    let query = Query::parse(query);
    raw.iter()
        .enumerate()
        .filter(|(_, slot)| match slot {
            Slot::Empty => query.is_all(),
            Slot::Card(card) => query.matches(card),
        })
        .map(|(index, slot)| DisplaySlot {
            index,
            slot: slot.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card(id: &str, name: &str) -> Card {
        Card::new(id, name, "", "Surging Sparks", "sv08")
    }

    fn sample() -> Vec<Card> {
        vec![
            card("sv08-007", "Squirtle"),
            card("sv08-070", "Pikachu ex"),
            card("sv08-7", "Wartortle"),
            card("sv08-100", "Pikachu"),
            card("sv08-000", "Energy"),
        ]
    }

    fn ids(cards: &[Card]) -> Vec<&str> {
        cards.iter().map(|c| c.id.as_str()).collect()
    }

    #[test]
    fn empty_query_returns_everything_in_order() {
        let cards = sample();
        assert_eq!(filter_cards(&cards, ""), cards);
        assert_eq!(filter_cards(&cards, "   "), cards);
    }

    #[test]
    fn name_match_is_case_insensitive_substring() {
        let cards = sample();
        assert_eq!(
            ids(&filter_cards(&cards, "PIKA")),
            vec!["sv08-070", "sv08-100"]
        );
        assert_eq!(ids(&filter_cards(&cards, "  tortle ")), vec!["sv08-7"]);
    }

    #[test]
    fn numeric_queries_normalize_leading_zeros() {
        let cards = sample();
        let expected = vec!["sv08-007", "sv08-7"];
        assert_eq!(ids(&filter_cards(&cards, "#007")), expected);
        assert_eq!(ids(&filter_cards(&cards, "7")), expected);
        assert_eq!(ids(&filter_cards(&cards, "07")), expected);
        assert_eq!(ids(&filter_cards(&cards, "70")), vec!["sv08-070"]);
    }

    #[test]
    fn all_zero_query_means_zero() {
        let cards = sample();
        assert_eq!(ids(&filter_cards(&cards, "000")), vec!["sv08-000"]);
        assert_eq!(ids(&filter_cards(&cards, "#")), vec!["sv08-000"]);
        assert_eq!(Query::parse("#00"), Query::Number("0".into()));
    }

    #[test]
    fn filtering_is_idempotent() {
        let cards = sample();
        for q in ["", "pika", "#7", "100", "nothing"] {
            let once = filter_cards(&cards, q);
            assert_eq!(filter_cards(&once, q), once, "query {q}");
        }
    }

    #[test]
    fn numeric_filter_memoizes_card_numbers() {
        let cards = sample();
        assert!(cards.iter().all(|c| !c.is_number_derived()));
        filter_cards(&cards, "pika");
        assert!(cards.iter().all(|c| !c.is_number_derived()));
        filter_cards(&cards, "#1");
        assert!(cards.iter().all(|c| c.is_number_derived()));
    }

    #[test]
    fn slot_filter_keeps_binder_indexes() {
        let slots = vec![
            Slot::Card(card("sv08-001", "Exeggcute")),
            Slot::Empty,
            Slot::Card(card("sv08-025", "Pikachu")),
        ];

        let all = filter_slots(&slots, "");
        assert_eq!(all.len(), 3);
        assert_eq!(all[1].slot, Slot::Empty);

        let hits = filter_slots(&slots, "pika");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].index, 2);

        assert!(filter_slots(&slots, "empty").is_empty());
    }
}
