use crate::error::Result;
use crate::model::Collection;
use std::path::PathBuf;

/// Abstract interface for raw storage I/O.
///
/// The backend handles the "how" of persistence (a JSON file, memory); the
/// [`CollectionStore`](super::CollectionStore) handles the "what".
/// Persistence is always the whole collection at once.
pub trait StorageBackend {
    /// Load every profile. A missing store is an empty collection, not an error.
    fn load(&self) -> Result<Collection>;

    /// Replace the stored collection.
    /// MUST be atomic (e.g. write to tmp then rename) so a failed write leaves
    /// the previous state in place.
    fn save(&self, users: &Collection) -> Result<()>;

    /// Where the data lives, if it lives anywhere.
    fn location(&self) -> Option<PathBuf>;
}

impl<T: StorageBackend + ?Sized> StorageBackend for Box<T> {
    fn load(&self) -> Result<Collection> {
        (**self).load()
    }

    fn save(&self, users: &Collection) -> Result<()> {
        (**self).save(users)
    }

    fn location(&self) -> Option<PathBuf> {
        (**self).location()
    }
}
