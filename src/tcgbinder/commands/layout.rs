use crate::commands::helpers::write_through;
use crate::commands::{CmdMessage, CmdResult};
use crate::error::Result;
use crate::layout::Layout;
use crate::model::Session;
use crate::store::{CollectionStore, StorageBackend};

/// Applies a grid from raw user input. Anything that is not a positive whole
/// number is a validation error and the current layout stays.
pub fn apply<B: StorageBackend>(
    store: &mut CollectionStore<B>,
    session: &Session,
    rows: &str,
    cols: &str,
    pages: &str,
) -> Result<CmdResult> {
    let layout = Layout::parse(rows, cols, pages)?;
    store.set_layout(session, layout)?;

    let overflowing = store
        .slots(session)?
        .iter()
        .enumerate()
        .filter(|(i, slot)| !slot.is_empty() && layout.is_overflow(*i))
        .count();

    let mut result = CmdResult::default();
    result.add_message(CmdMessage::success(format!(
        "{} is now {}x{} with {} page(s) ({} slots)",
        session.binder,
        layout.rows,
        layout.cols,
        layout.pages,
        layout.capacity()
    )));
    if overflowing > 0 {
        result.add_message(CmdMessage::warning(format!(
            "{} card(s) are beyond the new capacity",
            overflowing
        )));
    }
    write_through(store, &mut result);
    Ok(result)
}
