//! # Image Cache
//!
//! A disk directory of card images keyed by card id, bounded by file count.
//!
//! - A miss fetches the locator through an [`ImageSource`] and writes the raw
//!   bytes to `<encoded id>.jpg` (temp file, then rename). A failed fetch
//!   leaves nothing behind, so the next access retries.
//! - Every access, hit or fresh fetch, sets the file mtime to now. The mtime
//!   is the entry's last-touched time.
//! - [`ImageCache::sweep`] deletes the oldest-touched files until at most
//!   `max_files` remain. [`Sweeper`] runs it periodically on its own thread.
//!
//! Rendering (`get`) resizes to `(width, round(width * 1.4))` and can dim the
//! result for overflow slots. Decode and resize failures count as a miss for
//! that pass.

use crate::error::{BinderError, Result};
use chrono::{DateTime, Utc};
use filetime::FileTime;
use image::imageops::FilterType;
use image::RgbImage;
use log::{debug, info, warn};
use reqwest::blocking::Client;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

pub const CACHE_DIR_NAME: &str = "card_cache";
const CACHE_EXTENSION: &str = "jpg";
const ASPECT: f32 = 1.4;
const DIM_FACTOR: f32 = 0.5;

/// Where image bytes come from on a miss.
pub trait ImageSource: Send + Sync {
    fn fetch(&self, locator: &str) -> Result<Vec<u8>>;
}

pub struct HttpImageSource {
    client: Client,
}

impl HttpImageSource {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("tcgbinder/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }
}

impl ImageSource for HttpImageSource {
    fn fetch(&self, locator: &str) -> Result<Vec<u8>> {
        let response = self.client.get(locator).send()?.error_for_status()?;
        Ok(response.bytes()?.to_vec())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub card_id: String,
    pub path: PathBuf,
    pub touched: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub kept: usize,
    pub removed: Vec<String>,
}

pub fn image_height(width: u32) -> u32 {
    (width as f32 * ASPECT).round() as u32
}

/// Card ids become file names: `[A-Za-z0-9_-]` is kept and every other byte
/// is written as `%XX`. The mapping is reversible, so two ids never share a file.
fn encode_id(card_id: &str) -> String {
    let mut name = String::with_capacity(card_id.len());
    for byte in card_id.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'-' || byte == b'_' {
            name.push(byte as char);
        } else {
            let _ = write!(name, "%{:02X}", byte);
        }
    }
    name
}

fn decode_id(name: &str) -> Option<String> {
    let raw = name.as_bytes();
    let mut bytes = Vec::with_capacity(raw.len());
    let mut i = 0;
    while i < raw.len() {
        if raw[i] == b'%' {
            let hex = name.get(i + 1..i + 3)?;
            bytes.push(u8::from_str_radix(hex, 16).ok()?);
            i += 3;
        } else {
            bytes.push(raw[i]);
            i += 1;
        }
    }
    String::from_utf8(bytes).ok()
}

fn touch(path: &Path) -> Result<()> {
    filetime::set_file_mtime(path, FileTime::now())?;
    Ok(())
}

pub struct ImageCache {
    dir: PathBuf,
    max_files: usize,
    source: Arc<dyn ImageSource>,
}

impl ImageCache {
    pub fn new(dir: PathBuf, max_files: usize, source: Arc<dyn ImageSource>) -> Self {
        Self {
            dir,
            max_files,
            source,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn max_files(&self) -> usize {
        self.max_files
    }

    pub fn path_for(&self, card_id: &str) -> PathBuf {
        self.dir
            .join(format!("{}.{}", encode_id(card_id), CACHE_EXTENSION))
    }

    pub fn contains(&self, card_id: &str) -> bool {
        self.path_for(card_id).is_file()
    }

    /// Returns the local file for `card_id`, fetching it first on a miss.
    pub fn ensure_local(&self, card_id: &str, locator: &str) -> Result<PathBuf> {
        let path = self.path_for(card_id);
        if path.is_file() {
            touch(&path)?;
            return Ok(path);
        }
        if locator.is_empty() {
            return Err(BinderError::Api(format!("No image for card {}", card_id)));
        }

        let bytes = self.source.fetch(locator)?;
        fs::create_dir_all(&self.dir)?;
        let tmp = self
            .dir
            .join(format!(".{}.{}.tmp", encode_id(card_id), uuid::Uuid::new_v4()));
        fs::write(&tmp, &bytes)?;
        if let Err(e) = fs::rename(&tmp, &path) {
            let _ = fs::remove_file(&tmp);
            return Err(e.into());
        }
        touch(&path)?;
        debug!("Cached image for {} ({} bytes)", card_id, bytes.len());
        Ok(path)
    }

    /// A render-ready bitmap, or `None` when any step fails.
    pub fn get(&self, card_id: &str, locator: &str, width: u32, dimmed: bool) -> Option<RgbImage> {
        match self.render(card_id, locator, width, dimmed) {
            Ok(img) => Some(img),
            Err(e) => {
                debug!("No image for {}: {}", card_id, e);
                None
            }
        }
    }

    fn render(&self, card_id: &str, locator: &str, width: u32, dimmed: bool) -> Result<RgbImage> {
        if width == 0 {
            return Err(BinderError::Validation("Image width must be positive".into()));
        }
        let path = self.ensure_local(card_id, locator)?;
        // Sniff the format from the bytes; the .jpg name is only a convention.
        let decoded = image::load_from_memory(&fs::read(&path)?)?;
        let mut img = decoded
            .resize_exact(width, image_height(width), FilterType::Lanczos3)
            .to_rgb8();
        if dimmed {
            dim(&mut img);
        }
        Ok(img)
    }

    /// Cached files with their last-touched time. In-flight temp files are not
    /// entries.
    pub fn entries(&self) -> Result<Vec<CacheEntry>> {
        let read = match fs::read_dir(&self.dir) {
            Ok(read) => read,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut entries = Vec::new();
        for entry in read {
            let entry = entry?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(CACHE_EXTENSION) {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let touched: DateTime<Utc> = entry.metadata()?.modified()?.into();
            entries.push(CacheEntry {
                card_id: decode_id(stem).unwrap_or_else(|| stem.to_string()),
                path: path.clone(),
                touched,
            });
        }
        Ok(entries)
    }

    /// Deletes the oldest-touched files until at most `max_files` remain.
    pub fn sweep(&self) -> Result<SweepReport> {
        let mut entries = self.entries()?;
        if entries.len() <= self.max_files {
            return Ok(SweepReport {
                kept: entries.len(),
                removed: Vec::new(),
            });
        }

        // Newest first; everything past max_files goes.
        entries.sort_by(|a, b| b.touched.cmp(&a.touched));
        let stale = entries.split_off(self.max_files);
        let mut report = SweepReport {
            kept: entries.len(),
            removed: Vec::with_capacity(stale.len()),
        };
        for entry in stale {
            match fs::remove_file(&entry.path) {
                Ok(()) => report.removed.push(entry.card_id),
                Err(e) => {
                    warn!("Could not evict {}: {}", entry.path.display(), e);
                    report.kept += 1;
                }
            }
        }
        info!(
            "Image cache sweep removed {} file(s), {} kept",
            report.removed.len(),
            report.kept
        );
        Ok(report)
    }
}

fn dim(img: &mut RgbImage) {
    for pixel in img.pixels_mut() {
        for channel in pixel.0.iter_mut() {
            *channel = (*channel as f32 * DIM_FACTOR) as u8;
        }
    }
}

/// Periodic cache sweep on a background thread.
///
/// The first sweep runs as soon as the thread starts, so even a short session
/// trims the cache. Between sweeps the thread waits on its stop channel, and
/// `stop` returns once any sweep in progress is done.
pub struct Sweeper {
    stop_tx: Sender<()>,
    handle: Option<JoinHandle<usize>>,
}

impl Sweeper {
    pub fn spawn(cache: Arc<ImageCache>, interval: Duration) -> Result<Self> {
        let (stop_tx, stop_rx) = channel();
        let handle = thread::Builder::new()
            .name("cache-sweeper".to_string())
            .spawn(move || {
                let mut sweeps = 0;
                loop {
                    if let Err(e) = cache.sweep() {
                        warn!("Image cache sweep failed: {}", e);
                    }
                    sweeps += 1;
                    match stop_rx.recv_timeout(interval) {
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                        Err(RecvTimeoutError::Timeout) => {}
                    }
                }
                sweeps
            })?;

        Ok(Self {
            stop_tx,
            handle: Some(handle),
        })
    }

    /// Stops the thread and returns how many sweeps it ran.
    pub fn stop(mut self) -> usize {
        self.shutdown()
    }

    fn shutdown(&mut self) -> usize {
        let _ = self.stop_tx.send(());
        self.handle
            .take()
            .and_then(|handle| handle.join().ok())
            .unwrap_or(0)
    }
}

impl Drop for Sweeper {
    fn drop(&mut self) {
        self.shutdown();
    }
}

// --- Test Fixtures ---

#[cfg(any(test, feature = "test_utils"))]
pub mod fixtures {
    use super::*;
    use image::{ImageOutputFormat, Rgb};
    use std::io::Cursor;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Serves a solid-colour PNG for every locator, or fails every fetch.
    #[derive(Default)]
    pub struct FakeImageSource {
        pub failing: bool,
        pub fetches: AtomicUsize,
    }

    impl FakeImageSource {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn failing() -> Self {
            Self {
                failing: true,
                ..Self::default()
            }
        }

        pub fn fetch_count(&self) -> usize {
            self.fetches.load(Ordering::SeqCst)
        }
    }

    impl ImageSource for FakeImageSource {
        fn fetch(&self, locator: &str) -> Result<Vec<u8>> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            if self.failing {
                return Err(BinderError::Api(format!("timed out fetching {}", locator)));
            }
            let img = RgbImage::from_pixel(20, 28, Rgb([200, 100, 50]));
            let mut bytes = Cursor::new(Vec::new());
            img.write_to(&mut bytes, ImageOutputFormat::Png)?;
            Ok(bytes.into_inner())
        }
    }
}
