use super::backend::StorageBackend;
use crate::error::{BinderError, Result};
use crate::model::Collection;
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

pub const COLLECTION_FILENAME: &str = "collection.json";

/// Stores the whole collection in one JSON file, overwritten on every save.
pub struct FsBackend {
    root: PathBuf,
}

impl FsBackend {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn data_file(&self) -> PathBuf {
        self.root.join(COLLECTION_FILENAME)
    }

    fn ensure_dir(&self, path: &Path) -> Result<()> {
        if !path.exists() {
            fs::create_dir_all(path).map_err(BinderError::Io)?;
        }
        Ok(())
    }
}

impl StorageBackend for FsBackend {
    fn load(&self) -> Result<Collection> {
        let data_file = self.data_file();
        if !data_file.exists() {
            return Ok(Collection::new());
        }
        let content = fs::read_to_string(data_file).map_err(BinderError::Io)?;
        let users: Collection =
            serde_json::from_str(&content).map_err(BinderError::Serialization)?;
        Ok(users)
    }

    fn save(&self, users: &Collection) -> Result<()> {
        self.ensure_dir(&self.root)?;

        let content = serde_json::to_string_pretty(users).map_err(BinderError::Serialization)?;

        let tmp_file = self.root.join(format!(".collection-{}.tmp", Uuid::new_v4()));
        fs::write(&tmp_file, content).map_err(BinderError::Io)?;
        if let Err(e) = fs::rename(&tmp_file, self.data_file()) {
            let _ = fs::remove_file(&tmp_file);
            return Err(BinderError::Io(e));
        }

        Ok(())
    }

    fn location(&self) -> Option<PathBuf> {
        Some(self.data_file())
    }
}
