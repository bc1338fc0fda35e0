use super::backend::StorageBackend;
use crate::error::{BinderError, Result};
use crate::model::Collection;
use std::cell::{Cell, RefCell};
use std::path::PathBuf;

/// In-memory storage backend, used by tests and as the fallback when the
/// data directory cannot be created.
///
/// Uses `RefCell` for interior mutability since the main context is
/// single-threaded.
#[derive(Default)]
pub struct MemBackend {
    users: RefCell<Collection>,
    simulate_write_error: Cell<bool>,
    saves: Cell<usize>,
}

impl MemBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_collection(users: Collection) -> Self {
        Self {
            users: RefCell::new(users),
            ..Self::default()
        }
    }

    /// Enable write error simulation for testing error handling.
    pub fn set_simulate_write_error(&self, simulate: bool) {
        self.simulate_write_error.set(simulate);
    }

    /// What a reload would see.
    pub fn snapshot(&self) -> Collection {
        self.users.borrow().clone()
    }

    /// Number of successful saves so far.
    pub fn save_count(&self) -> usize {
        self.saves.get()
    }
}

impl StorageBackend for MemBackend {
    fn load(&self) -> Result<Collection> {
        Ok(self.users.borrow().clone())
    }

    fn save(&self, users: &Collection) -> Result<()> {
        if self.simulate_write_error.get() {
            return Err(BinderError::Store("Simulated write error".to_string()));
        }
        *self.users.borrow_mut() = users.clone();
        self.saves.set(self.saves.get() + 1);
        Ok(())
    }

    fn location(&self) -> Option<PathBuf> {
        None
    }
}
