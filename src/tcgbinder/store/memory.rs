use super::mem_backend::MemBackend;
use super::CollectionStore;

pub type InMemoryStore = CollectionStore<MemBackend>;

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    pub fn new() -> Self {
        CollectionStore::open(MemBackend::new())
    }
}

// --- Test Fixtures ---

#[cfg(any(test, feature = "test_utils"))]
pub mod fixtures {
    use super::*;
    use crate::layout::Layout;
    use crate::model::{Card, Session, Slot};

    /// A card of the test set "Surging Sparks" (`sv08`), numbered by `n`.
    pub fn card(n: usize, name: &str) -> Card {
        Card::new(
            format!("sv08-{:03}", n),
            name,
            format!("https://assets.tcgdex.net/en/sv/sv08/{:03}", n),
            "Surging Sparks",
            "sv08",
        )
    }

    /// Names of a slot sequence, `"empty"` for the sentinel.
    pub fn names(slots: &[Slot]) -> Vec<String> {
        slots
            .iter()
            .map(|slot| match slot {
                Slot::Empty => "empty".to_string(),
                Slot::Card(c) => c.name.clone(),
            })
            .collect()
    }

    pub struct StoreFixture {
        pub store: InMemoryStore,
        pub session: Session,
    }

    impl Default for StoreFixture {
        fn default() -> Self {
            Self::new()
        }
    }

    impl StoreFixture {
        pub fn new() -> Self {
            let mut store = InMemoryStore::new();
            store.ensure_default_user().unwrap();
            let session = store.default_session().unwrap();
            Self { store, session }
        }

        /// Appends one card per name; `"empty"` appends the sentinel.
        pub fn with_slots(mut self, names: &[&str]) -> Self {
            let slots = self.store.slots_mut(&self.session).unwrap();
            let start = slots.len();
            for (i, name) in names.iter().enumerate() {
                if *name == "empty" {
                    slots.push(Slot::Empty);
                } else {
                    slots.push(Slot::Card(card(start + i + 1, name)));
                }
            }
            self
        }

        pub fn with_layout(mut self, rows: usize, cols: usize, pages: usize) -> Self {
            let layout = Layout::new(rows, cols, pages).unwrap();
            self.store.set_layout(&self.session, layout).unwrap();
            self
        }

        pub fn with_binder(mut self, name: &str) -> Self {
            self.store
                .user_mut(&self.session.user)
                .unwrap()
                .insert_binder(name);
            self
        }

        pub fn slot_names(&self) -> Vec<String> {
            names(self.store.slots(&self.session).unwrap())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::StoreFixture;

    #[test]
    fn fixture_builds_slots_in_order() {
        let fixture = StoreFixture::new()
            .with_slots(&["Pikachu", "empty", "Zapdos"])
            .with_binder("Trades");
        assert_eq!(fixture.slot_names(), vec!["Pikachu", "empty", "Zapdos"]);
        assert_eq!(
            fixture.store.binder_names(&fixture.session.user).unwrap().len(),
            2
        );
    }
}
