use crate::commands::{CmdMessage, CmdResult};
use crate::store::{CollectionStore, StorageBackend};
use log::warn;

/// Persists the whole collection after a mutation.
///
/// A failed write is reported on `result` and logged; it never aborts the
/// command. Returns whether the save went through.
pub fn write_through<B: StorageBackend>(store: &CollectionStore<B>, result: &mut CmdResult) -> bool {
    match store.save() {
        Ok(()) => true,
        Err(e) => {
            warn!("Saving collection failed: {}", e);
            result.add_message(CmdMessage::error(format!(
                "Could not save collection: {}",
                e
            )));
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::MessageLevel;
    use crate::store::mem_backend::MemBackend;

    #[test]
    fn failed_save_becomes_an_error_message() {
        let mut store = CollectionStore::open(MemBackend::new());
        store.ensure_default_user().unwrap();
        store.backend().set_simulate_write_error(true);

        let mut result = CmdResult::default();
        assert!(!write_through(&store, &mut result));
        assert_eq!(result.messages.len(), 1);
        assert_eq!(result.messages[0].level, MessageLevel::Error);
        assert!(result.messages[0].content.contains("Simulated write error"));
    }

    #[test]
    fn successful_save_is_silent() {
        let mut store = CollectionStore::open(MemBackend::new());
        store.ensure_default_user().unwrap();
        let mut result = CmdResult::default();
        assert!(write_through(&store, &mut result));
        assert!(result.messages.is_empty());
    }
}
