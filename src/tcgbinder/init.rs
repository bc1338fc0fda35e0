use crate::api::BinderApp;
use crate::cache::{HttpImageSource, ImageCache, Sweeper, CACHE_DIR_NAME};
use crate::catalog::{CardCatalog, TcgdexCatalog};
use crate::commands::CmdMessage;
use crate::config::BinderConfig;
use crate::error::{BinderError, Result};
use crate::runtime::MainContext;
use crate::store::fs_backend::FsBackend;
use crate::store::mem_backend::MemBackend;
use crate::store::{CollectionStore, StorageBackend};
use directories::ProjectDirs;
use log::warn;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Overrides the data directory, mostly for tests and portable installs.
pub const HOME_ENV: &str = "TCGBINDER_HOME";

pub type Backend = Box<dyn StorageBackend>;
pub type App = BinderApp<Backend>;

pub struct BinderContext {
    pub app: App,
    pub main: MainContext<App>,
    pub config: BinderConfig,
    pub data_dir: PathBuf,
    pub images: Arc<ImageCache>,
    /// Problems met while starting up, for the client to show.
    pub notices: Vec<CmdMessage>,
}

impl BinderContext {
    /// Starts the periodic image cache sweep.
    pub fn spawn_sweeper(&self) -> Result<Sweeper> {
        Sweeper::spawn(Arc::clone(&self.images), self.config.sweep_interval())
    }
}

/// `$TCGBINDER_HOME`, else the platform data directory.
pub fn data_dir() -> Result<PathBuf> {
    if let Some(home) = std::env::var_os(HOME_ENV).filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(home));
    }
    ProjectDirs::from("com", "tcgbinder", "tcgbinder")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .ok_or_else(|| BinderError::Store("Could not determine a data directory".to_string()))
}

/// Opens the collection in `dir`. If the directory cannot be created the
/// session runs from memory and nothing is saved.
pub fn open_backend(dir: &Path, notices: &mut Vec<CmdMessage>) -> Backend {
    match fs::create_dir_all(dir) {
        Ok(()) => Box::new(FsBackend::new(dir.to_path_buf())),
        Err(e) => {
            warn!("Cannot create {}: {}", dir.display(), e);
            notices.push(CmdMessage::warning(format!(
                "Cannot use {} ({}); changes will not be saved",
                dir.display(),
                e
            )));
            Box::new(MemBackend::new())
        }
    }
}

pub fn initialize(dir: &Path) -> Result<BinderContext> {
    let catalog_for = |config: &BinderConfig| -> Result<Arc<dyn CardCatalog>> {
        Ok(Arc::new(TcgdexCatalog::new(
            &config.catalog_url,
            config.fetch_timeout(),
        )?))
    };
    initialize_with(dir, catalog_for)
}

/// Like [`initialize`], with the catalog built by `catalog_for`.
pub fn initialize_with<F>(dir: &Path, catalog_for: F) -> Result<BinderContext>
where
    F: FnOnce(&BinderConfig) -> Result<Arc<dyn CardCatalog>>,
{
    let mut notices = Vec::new();
    let backend = open_backend(dir, &mut notices);

    let config = BinderConfig::load(dir).unwrap_or_else(|e| {
        warn!("Could not read config, using defaults: {}", e);
        notices.push(CmdMessage::warning(format!("Ignoring config.json: {}", e)));
        BinderConfig::default()
    });

    let source = HttpImageSource::new(config.fetch_timeout())?;
    let images = Arc::new(ImageCache::new(
        dir.join(CACHE_DIR_NAME),
        config.cache_max_files,
        Arc::new(source),
    ));

    let main = MainContext::new();
    let store = CollectionStore::open(backend);
    let app = BinderApp::new(store, &main, catalog_for(&config)?, &config)?
        .with_images(Arc::clone(&images));

    Ok(BinderContext {
        app,
        main,
        config,
        data_dir: dir.to_path_buf(),
        images,
        notices,
    })
}
