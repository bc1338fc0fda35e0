//! Sorting compacts the binder: empty slots are dropped first, then the
//! remaining cards are ordered with a stable sort.

use crate::commands::helpers::write_through;
use crate::commands::{CmdMessage, CmdResult};
use crate::error::Result;
use crate::model::{Card, Session, Slot};
use crate::store::{CollectionStore, StorageBackend};
use std::cmp::Ordering;

/// Case-insensitive lexicographic order on the card name.
pub fn by_name<B: StorageBackend>(
    store: &mut CollectionStore<B>,
    session: &Session,
) -> Result<CmdResult> {
    sort_with(store, session, "name", |a, b| {
        a.name.to_lowercase().cmp(&b.name.to_lowercase())
    })
}

/// Ascending by derived card number. Cards without one sort last.
pub fn by_number<B: StorageBackend>(
    store: &mut CollectionStore<B>,
    session: &Session,
) -> Result<CmdResult> {
    sort_with(store, session, "number", |a, b| {
        match (a.number_value(), b.number_value()) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    })
}

fn sort_with<B, F>(
    store: &mut CollectionStore<B>,
    session: &Session,
    key: &str,
    compare: F,
) -> Result<CmdResult>
where
    B: StorageBackend,
    F: Fn(&Card, &Card) -> Ordering,
{
    let slots = store.slots_mut(session)?;
    let mut cards: Vec<Card> = slots
        .drain(..)
        .filter_map(|slot| match slot {
            Slot::Card(card) => Some(card),
            Slot::Empty => None,
        })
        .collect();
    cards.sort_by(|a, b| compare(a, b));
    slots.extend(cards.into_iter().map(Slot::Card));
    let count = slots.len();

    let mut result = CmdResult::default();
    result.add_message(CmdMessage::success(format!(
        "Sorted {} card(s) by {}",
        count, key
    )));
    write_through(store, &mut result);
    Ok(result)
}
