//! Profiles. Credentials are stored and compared as given; this is a
//! convenience switch between collections, not access control.

use crate::commands::helpers::write_through;
use crate::commands::{CmdMessage, CmdResult};
use crate::error::{BinderError, Result};
use crate::model::{Session, User};
use crate::store::{CollectionStore, StorageBackend};

/// Creates a user with one empty default binder.
pub fn create_user<B: StorageBackend>(
    store: &mut CollectionStore<B>,
    name: &str,
    password: &str,
) -> Result<CmdResult> {
    let name = name.trim();
    if name.is_empty() {
        return Err(BinderError::Validation(
            "Profile name cannot be empty".to_string(),
        ));
    }
    store.insert_user(name, User::new(password))?;
    let binders = store.binder_names(name)?.to_vec();

    let mut result = CmdResult::default().with_binders(binders);
    result.add_message(CmdMessage::success(format!("Created profile {}", name)));
    write_through(store, &mut result);
    Ok(result)
}

/// Checks the credential and returns the user's session on their first binder.
pub fn authenticate<B: StorageBackend>(
    store: &CollectionStore<B>,
    name: &str,
    password: &str,
) -> Result<Session> {
    let user = store.user(name)?;
    if user.password != password {
        return Err(BinderError::Api("Invalid name or password".to_string()));
    }
    store.session_for(Some(name), None)
}

pub fn set_theme<B: StorageBackend>(
    store: &mut CollectionStore<B>,
    user: &str,
    dark_mode: bool,
) -> Result<CmdResult> {
    store.user_mut(user)?.dark_mode = dark_mode;
    let mut result = CmdResult::default();
    result.add_message(CmdMessage::success(if dark_mode {
        "Theme set to dark"
    } else {
        "Theme set to light"
    }));
    write_through(store, &mut result);
    Ok(result)
}
