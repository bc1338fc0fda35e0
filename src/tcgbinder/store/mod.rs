//! # Storage Layer
//!
//! The collection is a mapping from user name to a [`User`] record, persisted
//! as one JSON document. [`CollectionStore`] is the single owner of every
//! binder's slot sequence; nothing else holds a second copy that it mutates.
//! Views read through it and mutators reach a sequence only by its
//! `(user, binder)` key, carried in a [`Session`].
//!
//! ## Soft load
//!
//! [`CollectionStore::open`] never fails. A missing file is an empty
//! collection; a corrupt or unreadable one is logged and also treated as empty,
//! so the first successful save replaces it.
//!
//! ## Write-through
//!
//! Every mutation is followed by a full [`CollectionStore::save`]. Backends
//! write atomically, so a failed save leaves the previous document on disk.
//!
//! ## Implementations
//!
//! - [`fs_backend::FsBackend`]: `collection.json` in the data directory.
//! - [`mem_backend::MemBackend`] (via [`memory::InMemoryStore`]): tests, and
//!   the fallback when the data directory cannot be created.
//!
//! ## Storage Layout
//!
//! ```text
//! <data dir>/
//! ├── collection.json     # Users, binders, slots, layouts, theme
//! ├── config.json         # Tunables (see config.rs)
//! └── card_cache/         # Image cache, one <card id>.jpg per card
//! ```

use crate::error::{BinderError, Result};
use crate::layout::Layout;
use crate::model::{Collection, Session, Slot, User, DEFAULT_USER};
use log::{info, warn};

pub mod backend;
pub mod fs_backend;
pub mod mem_backend;
pub mod memory;

pub use backend::StorageBackend;

pub struct CollectionStore<B: StorageBackend> {
    backend: B,
    users: Collection,
}

impl<B: StorageBackend> CollectionStore<B> {
    /// Loads the collection, falling back to an empty one on any error.
    pub fn open(backend: B) -> Self {
        let mut users = match backend.load() {
            Ok(users) => users,
            Err(e) => {
                warn!("Could not load collection, starting empty: {}", e);
                Collection::new()
            }
        };
        for (name, user) in users.iter_mut() {
            if user.normalize() {
                info!("Repaired binder index for user '{}'", name);
            }
        }
        Self { backend, users }
    }

    /// Guarantees a default user with one default binder exists.
    /// Returns true if one had to be created.
    pub fn ensure_default_user(&mut self) -> Result<bool> {
        if !self.users.is_empty() {
            return Ok(false);
        }
        self.users.insert(DEFAULT_USER.to_string(), User::new(""));
        self.save()?;
        Ok(true)
    }

    pub fn save(&self) -> Result<()> {
        self.backend.save(&self.users)
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn users(&self) -> &Collection {
        &self.users
    }

    pub fn has_user(&self, name: &str) -> bool {
        self.users.contains_key(name)
    }

    pub fn user(&self, name: &str) -> Result<&User> {
        self.users
            .get(name)
            .ok_or_else(|| BinderError::UserNotFound(name.to_string()))
    }

    pub fn user_mut(&mut self, name: &str) -> Result<&mut User> {
        self.users
            .get_mut(name)
            .ok_or_else(|| BinderError::UserNotFound(name.to_string()))
    }

    pub fn insert_user(&mut self, name: &str, user: User) -> Result<()> {
        if self.users.contains_key(name) {
            return Err(BinderError::DuplicateUser(name.to_string()));
        }
        self.users.insert(name.to_string(), user);
        Ok(())
    }

    /// Binder names of `user` in display order.
    pub fn binder_names(&self, user: &str) -> Result<&[String]> {
        Ok(&self.user(user)?.binder_order)
    }

    pub fn slots(&self, session: &Session) -> Result<&[Slot]> {
        self.user(&session.user)?
            .binders
            .get(&session.binder)
            .map(Vec::as_slice)
            .ok_or_else(|| BinderError::BinderNotFound(session.binder.clone()))
    }

    pub fn slots_mut(&mut self, session: &Session) -> Result<&mut Vec<Slot>> {
        self.user_mut(&session.user)?
            .binders
            .get_mut(&session.binder)
            .ok_or_else(|| BinderError::BinderNotFound(session.binder.clone()))
    }

    pub fn layout(&self, session: &Session) -> Result<Layout> {
        let user = self.user(&session.user)?;
        if !user.binders.contains_key(&session.binder) {
            return Err(BinderError::BinderNotFound(session.binder.clone()));
        }
        Ok(user.layout(&session.binder))
    }

    pub fn set_layout(&mut self, session: &Session, layout: Layout) -> Result<()> {
        let user = self.user_mut(&session.user)?;
        if !user.binders.contains_key(&session.binder) {
            return Err(BinderError::BinderNotFound(session.binder.clone()));
        }
        user.binder_settings.insert(session.binder.clone(), layout);
        Ok(())
    }

    /// The default user if present, else the first user; their first binder.
    pub fn default_session(&self) -> Result<Session> {
        let user = if self.users.contains_key(DEFAULT_USER) {
            DEFAULT_USER
        } else {
            self.users
                .keys()
                .next()
                .map(String::as_str)
                .ok_or_else(|| BinderError::UserNotFound(DEFAULT_USER.to_string()))?
        };
        self.session_for(Some(user), None)
    }

    /// Resolves a session, defaulting the binder to the user's first one.
    pub fn session_for(&self, user: Option<&str>, binder: Option<&str>) -> Result<Session> {
        let user_name = match user {
            Some(name) => name.to_string(),
            None => return self.default_session(),
        };
        let record = self.user(&user_name)?;
        let binder_name = match binder {
            Some(name) if record.binders.contains_key(name) => name.to_string(),
            Some(name) => return Err(BinderError::BinderNotFound(name.to_string())),
            None => record
                .binder_order
                .first()
                .cloned()
                .ok_or_else(|| BinderError::BinderNotFound(String::new()))?,
        };
        Ok(Session::new(user_name, binder_name))
    }
}

#[cfg(test)]
mod tests {
    use super::mem_backend::MemBackend;
    use super::*;
    use crate::model::{Card, DEFAULT_BINDER};
    use std::path::PathBuf;

    struct CorruptBackend;

    impl StorageBackend for CorruptBackend {
        fn load(&self) -> Result<Collection> {
            let parsed: Collection = serde_json::from_str("{ not json")?;
            Ok(parsed)
        }

        fn save(&self, _users: &Collection) -> Result<()> {
            Ok(())
        }

        fn location(&self) -> Option<PathBuf> {
            None
        }
    }

    #[test]
    fn corrupt_store_loads_empty() {
        let store = CollectionStore::open(CorruptBackend);
        assert!(store.users().is_empty());
    }

    #[test]
    fn ensure_default_user_is_idempotent() {
        let mut store = CollectionStore::open(MemBackend::new());
        assert!(store.ensure_default_user().unwrap());
        assert!(!store.ensure_default_user().unwrap());
        assert_eq!(store.backend().save_count(), 1);

        let user = store.user(DEFAULT_USER).unwrap();
        assert_eq!(user.binder_order, vec![DEFAULT_BINDER.to_string()]);
        assert_eq!(user.layout(DEFAULT_BINDER), Layout::default());
        assert!(store.backend().snapshot().contains_key(DEFAULT_USER));
    }

    #[test]
    fn existing_users_are_left_alone() {
        let mut users = Collection::new();
        users.insert("ash".into(), User::new("pikachu"));
        let mut store = CollectionStore::open(MemBackend::with_collection(users));
        assert!(!store.ensure_default_user().unwrap());
        assert_eq!(store.default_session().unwrap(), Session::new("ash", DEFAULT_BINDER));
    }

    #[test]
    fn session_resolution() {
        let mut store = CollectionStore::open(MemBackend::new());
        store.ensure_default_user().unwrap();

        let session = store.session_for(None, None).unwrap();
        assert_eq!(session, Session::new(DEFAULT_USER, DEFAULT_BINDER));
        assert!(matches!(
            store.session_for(Some("nobody"), None),
            Err(BinderError::UserNotFound(_))
        ));
        assert!(matches!(
            store.session_for(Some(DEFAULT_USER), Some("Trade Binder")),
            Err(BinderError::BinderNotFound(_))
        ));
    }

    #[test]
    fn slots_are_addressed_by_session() {
        let mut store = CollectionStore::open(MemBackend::new());
        store.ensure_default_user().unwrap();
        let session = store.default_session().unwrap();

        store
            .slots_mut(&session)
            .unwrap()
            .push(Slot::Card(Card::new("sv08-1", "Exeggcute", "", "", "")));
        assert_eq!(store.slots(&session).unwrap().len(), 1);

        let layout = Layout::new(2, 2, 1).unwrap();
        store.set_layout(&session, layout).unwrap();
        assert_eq!(store.layout(&session).unwrap(), layout);
    }

    #[test]
    fn load_repairs_binder_index() {
        let mut user = User::new("");
        user.binder_order.clear();
        let mut users = Collection::new();
        users.insert(DEFAULT_USER.into(), user);

        let store = CollectionStore::open(MemBackend::with_collection(users));
        assert_eq!(
            store.binder_names(DEFAULT_USER).unwrap(),
            &[DEFAULT_BINDER.to_string()]
        );
    }
}
