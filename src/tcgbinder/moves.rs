//! # Move Engine
//!
//! Relocates cards inside a binder's slot sequence. The sequence is padded
//! with empty slots as needed so any index can be a target.
//!
//! Reordering within a binder swaps the two positions and never shifts
//! anything else: every other card keeps its page and pocket. A card coming
//! from outside the binder (a search result) overwrites the target slot.

use crate::error::{BinderError, Result};
use crate::layout::Layout;
use crate::model::{Card, Slot};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveOrigin {
    /// The card already sits at this index of the same binder.
    Binder(usize),
    /// The card comes from outside the binder.
    External(Card),
}

fn pad_to(slots: &mut Vec<Slot>, len: usize) {
    if slots.len() < len {
        slots.resize(len, Slot::Empty);
    }
}

/// One past the furthest index a move may reach: the declared capacity or the
/// current contents, whichever is longer, plus one more page.
pub fn target_limit(len: usize, layout: &Layout) -> usize {
    layout.capacity().max(len).saturating_add(layout.per_page())
}

fn check_index(index: usize, limit: usize) -> Result<()> {
    if index >= limit {
        return Err(BinderError::Validation(format!(
            "Slot {} is out of range (moves reach up to slot {})",
            index.saturating_add(1),
            limit
        )));
    }
    Ok(())
}

/// Swaps `origin` and `target` within the binder, or writes an external card
/// over `target`. Targets past [`target_limit`] are rejected untouched.
pub fn move_card(
    slots: &mut Vec<Slot>,
    origin: MoveOrigin,
    target: usize,
    layout: &Layout,
) -> Result<()> {
    let limit = target_limit(slots.len(), layout);
    check_index(target, limit)?;
    if let MoveOrigin::Binder(from) = origin {
        check_index(from, limit)?;
    }

    pad_to(slots, target + 1);
    match origin {
        MoveOrigin::Binder(from) => {
            pad_to(slots, from + 1);
            slots.swap(from, target);
        }
        MoveOrigin::External(card) => {
            slots[target] = Slot::Card(card);
        }
    }
    Ok(())
}

/// First free index on `page`: past the end of the sequence or an empty slot.
/// A full page resolves to the index just past its range.
pub fn resolve_page_target(slots: &[Slot], page: usize, layout: &Layout) -> usize {
    let range = layout.slots_for_page(page);
    let end = range.end;
    range
        .into_iter()
        .find(|&i| slots.get(i).map_or(true, Slot::is_empty))
        .unwrap_or(end)
}

/// Moves a card to the first free slot of `page` and returns the index it landed on.
pub fn move_to_page(
    slots: &mut Vec<Slot>,
    origin: MoveOrigin,
    page: usize,
    layout: &Layout,
) -> Result<usize> {
    if page == 0 {
        return Err(BinderError::Validation(
            "Page numbers start at 1".to_string(),
        ));
    }
    let target = resolve_page_target(slots, page, layout);
    if target >= target_limit(slots.len(), layout) {
        return Err(BinderError::Validation(format!(
            "Page {} is past the end of the binder",
            page
        )));
    }
    move_card(slots, origin, target, layout)?;
    Ok(target)
}
