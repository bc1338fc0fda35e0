use thiserror::Error;

#[derive(Error, Debug)]
pub enum BinderError {
    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("Binder not found: {0}")]
    BinderNotFound(String),

    #[error("A binder named '{0}' already exists")]
    DuplicateBinder(String),

    #[error("A profile named '{0}' already exists")]
    DuplicateUser(String),

    #[error("Cannot delete '{0}': it is the only binder left")]
    LastBinder(String),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Api Error: {0}")]
    Api(String),
}

pub type Result<T> = std::result::Result<T, BinderError>;
