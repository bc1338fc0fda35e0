use crate::commands::helpers::write_through;
use crate::commands::{CmdMessage, CmdResult};
use crate::error::Result;
use crate::model::{Card, Session, Slot};
use crate::moves::{self, MoveOrigin};
use crate::store::{CollectionStore, StorageBackend};

/// The card a move would carry, or `None` when the origin slot holds nothing.
fn carried_card(slots: &[Slot], origin: &MoveOrigin) -> Option<Card> {
    match origin {
        MoveOrigin::Binder(from) => slots.get(*from).and_then(Slot::card).cloned(),
        MoveOrigin::External(card) => Some(card.clone()),
    }
}

/// Drops a card on slot `target`: swaps within the binder, overwrites for an
/// external card. Moving an empty slot, or onto itself, is a no-op.
pub fn move_card<B: StorageBackend>(
    store: &mut CollectionStore<B>,
    session: &Session,
    origin: MoveOrigin,
    target: usize,
) -> Result<CmdResult> {
    let layout = store.layout(session)?;
    let slots = store.slots_mut(session)?;
    let Some(card) = carried_card(slots, &origin) else {
        return Ok(CmdResult::default());
    };
    let touched = match origin {
        MoveOrigin::Binder(from) if from == target => return Ok(CmdResult::default()),
        MoveOrigin::Binder(from) => vec![from, target],
        MoveOrigin::External(_) => vec![target],
    };
    moves::move_card(slots, origin, target, &layout)?;

    let mut result = CmdResult::default()
        .with_slot_indexes(touched)
        .with_affected_cards(vec![card.clone()]);
    result.add_message(CmdMessage::info(format!(
        "Moved {} to slot {}",
        card.name,
        target + 1
    )));
    write_through(store, &mut result);
    Ok(result)
}

/// Moves a card to the first free slot of `page` (1-based).
pub fn move_to_page<B: StorageBackend>(
    store: &mut CollectionStore<B>,
    session: &Session,
    origin: MoveOrigin,
    page: usize,
) -> Result<CmdResult> {
    let layout = store.layout(session)?;
    let slots = store.slots_mut(session)?;
    let Some(card) = carried_card(slots, &origin) else {
        return Ok(CmdResult::default());
    };
    let from = match origin {
        MoveOrigin::Binder(from) => Some(from),
        MoveOrigin::External(_) => None,
    };
    let landed = moves::move_to_page(slots, origin, page, &layout)?;

    let mut result = CmdResult::default()
        .with_slot_indexes(from.into_iter().chain([landed]).collect())
        .with_affected_cards(vec![card.clone()]);
    if layout.slots_for_page(page).contains(&landed) {
        result.add_message(CmdMessage::info(format!(
            "Moved {} to page {} (slot {})",
            card.name,
            page,
            landed + 1
        )));
    } else {
        result.add_message(CmdMessage::warning(format!(
            "Page {} is full; {} placed in slot {}",
            page,
            card.name,
            landed + 1
        )));
    }
    write_through(store, &mut result);
    Ok(result)
}
