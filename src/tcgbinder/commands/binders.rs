use crate::commands::helpers::write_through;
use crate::commands::{CmdMessage, CmdResult};
use crate::error::{BinderError, Result};
use crate::model::Session;
use crate::store::{CollectionStore, StorageBackend};

/// Removes every slot from the binder. Its layout is kept.
pub fn clear<B: StorageBackend>(
    store: &mut CollectionStore<B>,
    session: &Session,
) -> Result<CmdResult> {
    let slots = store.slots_mut(session)?;
    let removed = slots.iter().filter(|s| !s.is_empty()).count();
    slots.clear();

    let mut result = CmdResult::default();
    result.add_message(CmdMessage::success(format!(
        "Cleared {} ({} card(s) removed)",
        session.binder, removed
    )));
    write_through(store, &mut result);
    Ok(result)
}

/// Adds an empty binder with the default layout at the end of the user's list.
pub fn create<B: StorageBackend>(
    store: &mut CollectionStore<B>,
    user: &str,
    name: &str,
) -> Result<CmdResult> {
    let name = name.trim();
    if name.is_empty() {
        return Err(BinderError::Validation(
            "Binder name cannot be empty".to_string(),
        ));
    }
    let record = store.user_mut(user)?;
    if record.binders.contains_key(name) {
        return Err(BinderError::DuplicateBinder(name.to_string()));
    }
    record.insert_binder(name);
    let binders = record.binder_order.clone();

    let mut result = CmdResult::default().with_binders(binders);
    result.add_message(CmdMessage::success(format!("Created binder {}", name)));
    write_through(store, &mut result);
    Ok(result)
}

/// Deletes a binder with its slots and layout. A user's last binder cannot
/// be deleted.
pub fn delete<B: StorageBackend>(
    store: &mut CollectionStore<B>,
    user: &str,
    name: &str,
) -> Result<CmdResult> {
    let record = store.user_mut(user)?;
    if !record.binders.contains_key(name) {
        return Err(BinderError::BinderNotFound(name.to_string()));
    }
    if record.binders.len() <= 1 {
        return Err(BinderError::LastBinder(name.to_string()));
    }
    record.binders.remove(name);
    record.binder_settings.remove(name);
    record.binder_order.retain(|b| b != name);
    let binders = record.binder_order.clone();

    let mut result = CmdResult::default().with_binders(binders);
    result.add_message(CmdMessage::success(format!("Deleted binder {}", name)));
    write_through(store, &mut result);
    Ok(result)
}

pub fn list<B: StorageBackend>(store: &CollectionStore<B>, user: &str) -> Result<CmdResult> {
    let binders = store.binder_names(user)?.to_vec();
    Ok(CmdResult::default().with_binders(binders))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::Layout;
    use crate::model::DEFAULT_BINDER;
    use crate::store::memory::fixtures::StoreFixture;

    #[test]
    fn clear_empties_the_binder_but_keeps_layout() {
        let mut f = StoreFixture::new()
            .with_layout(2, 2, 2)
            .with_slots(&["A", "empty", "C"]);
        let result = clear(&mut f.store, &f.session).unwrap();
        assert!(result.messages[0].content.contains("2 card(s)"));
        assert!(f.slot_names().is_empty());
        assert_eq!(f.store.layout(&f.session).unwrap(), Layout::new(2, 2, 2).unwrap());
    }

    #[test]
    fn create_appends_with_default_layout() {
        let mut f = StoreFixture::new();
        let result = create(&mut f.store, "default", "  Trades ").unwrap();
        assert_eq!(result.binders, vec![DEFAULT_BINDER.to_string(), "Trades".into()]);

        let session = f.store.session_for(Some("default"), Some("Trades")).unwrap();
        assert_eq!(f.store.layout(&session).unwrap(), Layout::default());
        assert!(f.store.slots(&session).unwrap().is_empty());
        assert!(f.store.backend().snapshot()["default"].binders.contains_key("Trades"));
    }

    #[test]
    fn create_rejects_duplicates_and_blank_names() {
        let mut f = StoreFixture::new();
        assert!(matches!(
            create(&mut f.store, "default", DEFAULT_BINDER),
            Err(BinderError::DuplicateBinder(_))
        ));
        assert!(matches!(
            create(&mut f.store, "default", "   "),
            Err(BinderError::Validation(_))
        ));
    }

    #[test]
    fn deleting_the_only_binder_is_rejected() {
        let mut f = StoreFixture::new().with_slots(&["A"]);
        let before = f.store.users().clone();

        let result = delete(&mut f.store, "default", DEFAULT_BINDER);
        assert!(matches!(result, Err(BinderError::LastBinder(_))));
        assert_eq!(f.store.users(), &before);
        assert_eq!(f.store.backend().save_count(), 1);
    }

    #[test]
    fn delete_removes_slots_layout_and_order() {
        let mut f = StoreFixture::new().with_binder("Trades");
        let result = delete(&mut f.store, "default", "Trades").unwrap();
        assert_eq!(result.binders, vec![DEFAULT_BINDER.to_string()]);

        let user = f.store.user("default").unwrap();
        assert!(!user.binders.contains_key("Trades"));
        assert!(!user.binder_settings.contains_key("Trades"));
    }

    #[test]
    fn delete_unknown_binder() {
        let mut f = StoreFixture::new().with_binder("Trades");
        assert!(matches!(
            delete(&mut f.store, "default", "Vault"),
            Err(BinderError::BinderNotFound(_))
        ));
    }

    #[test]
    fn list_follows_binder_order() {
        let f = StoreFixture::new().with_binder("Zeta").with_binder("Alpha");
        let result = list(&f.store, "default").unwrap();
        assert_eq!(
            result.binders,
            vec![DEFAULT_BINDER.to_string(), "Zeta".into(), "Alpha".into()]
        );
    }
}
