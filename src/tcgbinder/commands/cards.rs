use crate::commands::helpers::write_through;
use crate::commands::{CapacityPrompt, CmdMessage, CmdResult};
use crate::error::{BinderError, Result};
use crate::model::{Card, Session, Slot};
use crate::store::{CollectionStore, StorageBackend};

/// Appends one card to the binder. See [`add_many`].
pub fn add<B: StorageBackend>(
    store: &mut CollectionStore<B>,
    session: &Session,
    card: Card,
    confirmed: bool,
) -> Result<CmdResult> {
    add_many(store, session, vec![card], confirmed)
}

/// Appends cards to the end of the binder's sequence.
///
/// If the last card would land past the declared capacity and `confirmed`
/// is false, nothing changes and the result carries a [`CapacityPrompt`].
pub fn add_many<B: StorageBackend>(
    store: &mut CollectionStore<B>,
    session: &Session,
    cards: Vec<Card>,
    confirmed: bool,
) -> Result<CmdResult> {
    let mut result = CmdResult::default();
    if cards.is_empty() {
        result.add_message(CmdMessage::info("Nothing to add"));
        return Ok(result);
    }

    let layout = store.layout(session)?;
    let start = store.slots(session)?.len();
    let last_index = start + cards.len() - 1;

    if layout.is_overflow(last_index) && !confirmed {
        return Ok(result.with_confirmation(CapacityPrompt {
            adding: cards.len(),
            capacity: layout.capacity(),
            last_index,
        }));
    }

    store
        .slots_mut(session)?
        .extend(cards.iter().cloned().map(Slot::Card));

    let overflowing = (start..=last_index)
        .filter(|&i| layout.is_overflow(i))
        .count();
    let mut result = result
        .with_slot_indexes((start..=last_index).collect())
        .with_affected_cards(cards);

    let summary = match result.affected_cards.as_slice() {
        [card] => format!("Added {} to slot {}", card.name, start + 1),
        many => format!("Added {} cards to {}", many.len(), session.binder),
    };
    result.add_message(CmdMessage::success(summary));
    if overflowing > 0 {
        result.add_message(CmdMessage::warning(format!(
            "{} card(s) placed beyond binder capacity",
            overflowing
        )));
    }

    write_through(store, &mut result);
    Ok(result)
}

/// Empties the slot at `index`. The sequence keeps its length so no other
/// card changes page.
pub fn remove<B: StorageBackend>(
    store: &mut CollectionStore<B>,
    session: &Session,
    index: usize,
) -> Result<CmdResult> {
    let slots = store.slots_mut(session)?;
    let card = match slots.get(index) {
        Some(Slot::Card(card)) => card.clone(),
        _ => {
            return Err(BinderError::Api(format!(
                "No card in slot {}",
                index + 1
            )))
        }
    };
    slots[index] = Slot::Empty;

    let mut result = CmdResult::default()
        .with_slot_indexes(vec![index])
        .with_affected_cards(vec![card.clone()]);
    result.add_message(CmdMessage::success(format!("Removed {}", card.name)));
    write_through(store, &mut result);
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::MessageLevel;
    use crate::store::memory::fixtures::{card, StoreFixture};

    #[test]
    fn add_appends_and_persists() {
        let mut f = StoreFixture::new().with_slots(&["Pikachu"]);
        let result = add(&mut f.store, &f.session, card(9, "Zapdos"), false).unwrap();

        assert_eq!(result.slot_indexes, vec![1]);
        assert_eq!(f.slot_names(), vec!["Pikachu", "Zapdos"]);
        let saved = f.store.backend().snapshot();
        assert_eq!(saved["default"].binders["Main Binder"].len(), 2);
    }

    #[test]
    fn tenth_card_in_single_page_binder_needs_confirmation() {
        let mut f = StoreFixture::new().with_layout(3, 3, 1);
        for n in 1..=9 {
            let result = add(&mut f.store, &f.session, card(n, "Filler"), false).unwrap();
            assert!(!result.needs_confirmation());
        }

        let result = add(&mut f.store, &f.session, card(10, "Tenth"), false).unwrap();
        let prompt = result.confirmation.unwrap();
        assert_eq!(prompt.last_index, 9);
        assert_eq!(prompt.capacity, 9);
        assert_eq!(f.store.slots(&f.session).unwrap().len(), 9);

        let result = add(&mut f.store, &f.session, card(10, "Tenth"), true).unwrap();
        assert_eq!(result.slot_indexes, vec![9]);
        assert!(result
            .messages
            .iter()
            .any(|m| m.level == MessageLevel::Warning));
        let layout = f.store.layout(&f.session).unwrap();
        assert!(layout.is_overflow(9));
        assert!((0..9).all(|i| !layout.is_overflow(i)));
    }

    #[test]
    fn add_many_checks_its_last_card() {
        let mut f = StoreFixture::new().with_layout(2, 2, 1).with_slots(&["A", "B"]);
        let cards = vec![card(3, "C"), card(4, "D"), card(5, "E")];

        let result = add_many(&mut f.store, &f.session, cards.clone(), false).unwrap();
        assert!(result.needs_confirmation());
        assert_eq!(f.slot_names(), vec!["A", "B"]);

        let result = add_many(&mut f.store, &f.session, cards, true).unwrap();
        assert_eq!(result.slot_indexes, vec![2, 3, 4]);
        assert_eq!(f.slot_names(), vec!["A", "B", "C", "D", "E"]);
    }

    #[test]
    fn remove_leaves_a_gap() {
        let mut f = StoreFixture::new().with_slots(&["A", "B", "C"]);
        remove(&mut f.store, &f.session, 1).unwrap();
        assert_eq!(f.slot_names(), vec!["A", "empty", "C"]);
    }

    #[test]
    fn remove_of_empty_slot_is_an_error() {
        let mut f = StoreFixture::new().with_slots(&["A", "empty"]);
        assert!(remove(&mut f.store, &f.session, 1).is_err());
        assert!(remove(&mut f.store, &f.session, 7).is_err());
        assert_eq!(f.slot_names(), vec!["A", "empty"]);
    }

    #[test]
    fn save_failure_keeps_change_and_reports() {
        let mut f = StoreFixture::new();
        f.store.backend().set_simulate_write_error(true);
        let result = add(&mut f.store, &f.session, card(1, "A"), false).unwrap();
        assert!(result.has_errors());
        assert_eq!(f.slot_names(), vec!["A"]);
        assert!(f.store.backend().snapshot()["default"].binders["Main Binder"].is_empty());
    }
}
