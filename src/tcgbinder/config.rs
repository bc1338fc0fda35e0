use crate::error::{BinderError, Result};
use crate::layout::{GridSize, DEFAULT_SEARCH_COLS, DEFAULT_SEARCH_ROWS, MAX_GRID_SIDE};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

const CONFIG_FILENAME: &str = "config.json";

pub const DEFAULT_CATALOG_URL: &str = "https://api.tcgdex.net/v2/en";
const DEFAULT_CACHE_MAX_FILES: usize = 500;
const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 5;
const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 300;
const DEFAULT_FILTER_DEBOUNCE_MS: u64 = 600;

/// Keys accepted by `binder config`, in display order.
pub const CONFIG_KEYS: &[&str] = &[
    "cache-max-files",
    "fetch-timeout-secs",
    "sweep-interval-secs",
    "filter-debounce-ms",
    "search-rows",
    "search-cols",
    "catalog-url",
];

/// Tunables, stored in `<data dir>/config.json`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct BinderConfig {
    /// Most image files the cache keeps after a sweep.
    #[serde(default = "default_cache_max_files")]
    pub cache_max_files: usize,

    /// Timeout for catalog requests and image downloads.
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,

    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,

    /// Quiet period before a typed filter is applied.
    #[serde(default = "default_filter_debounce_ms")]
    pub filter_debounce_ms: u64,

    #[serde(default = "default_search_rows")]
    pub search_rows: usize,

    #[serde(default = "default_search_cols")]
    pub search_cols: usize,

    #[serde(default = "default_catalog_url")]
    pub catalog_url: String,
}

fn default_cache_max_files() -> usize {
    DEFAULT_CACHE_MAX_FILES
}

fn default_fetch_timeout_secs() -> u64 {
    DEFAULT_FETCH_TIMEOUT_SECS
}

fn default_sweep_interval_secs() -> u64 {
    DEFAULT_SWEEP_INTERVAL_SECS
}

fn default_filter_debounce_ms() -> u64 {
    DEFAULT_FILTER_DEBOUNCE_MS
}

fn default_search_rows() -> usize {
    DEFAULT_SEARCH_ROWS
}

fn default_search_cols() -> usize {
    DEFAULT_SEARCH_COLS
}

fn default_catalog_url() -> String {
    DEFAULT_CATALOG_URL.to_string()
}

impl Default for BinderConfig {
    fn default() -> Self {
        Self {
            cache_max_files: DEFAULT_CACHE_MAX_FILES,
            fetch_timeout_secs: DEFAULT_FETCH_TIMEOUT_SECS,
            sweep_interval_secs: DEFAULT_SWEEP_INTERVAL_SECS,
            filter_debounce_ms: DEFAULT_FILTER_DEBOUNCE_MS,
            search_rows: DEFAULT_SEARCH_ROWS,
            search_cols: DEFAULT_SEARCH_COLS,
            catalog_url: default_catalog_url(),
        }
    }
}

impl BinderConfig {
    /// Load config from the given directory, or return defaults if not found.
    /// A hand-edited file holding values `set` would refuse is rejected.
    pub fn load<P: AsRef<Path>>(config_dir: P) -> Result<Self> {
        let config_path = config_dir.as_ref().join(CONFIG_FILENAME);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&config_path).map_err(BinderError::Io)?;
        let config: BinderConfig =
            serde_json::from_str(&content).map_err(BinderError::Serialization)?;
        config.validate().map_err(BinderError::Validation)?;
        Ok(config)
    }

    /// Checks every value against the rules `set` applies.
    pub fn validate(&self) -> std::result::Result<(), String> {
        let mut checked = Self::default();
        for key in CONFIG_KEYS {
            if let Some(value) = self.get(key) {
                checked.set(key, &value)?;
            }
        }
        Ok(())
    }

    /// Save config to the given directory
    pub fn save<P: AsRef<Path>>(&self, config_dir: P) -> Result<()> {
        let config_dir = config_dir.as_ref();

        if !config_dir.exists() {
            fs::create_dir_all(config_dir).map_err(BinderError::Io)?;
        }

        let config_path = config_dir.join(CONFIG_FILENAME);
        let content = serde_json::to_string_pretty(self).map_err(BinderError::Serialization)?;
        fs::write(config_path, content).map_err(BinderError::Io)?;
        Ok(())
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    pub fn filter_debounce(&self) -> Duration {
        Duration::from_millis(self.filter_debounce_ms)
    }

    /// The search grid, falling back to 4x4 if the stored values are unusable.
    pub fn search_grid(&self) -> GridSize {
        GridSize::new(self.search_rows, self.search_cols).unwrap_or_default()
    }

    pub fn get(&self, key: &str) -> Option<String> {
        match key {
            "cache-max-files" => Some(self.cache_max_files.to_string()),
            "fetch-timeout-secs" => Some(self.fetch_timeout_secs.to_string()),
            "sweep-interval-secs" => Some(self.sweep_interval_secs.to_string()),
            "filter-debounce-ms" => Some(self.filter_debounce_ms.to_string()),
            "search-rows" => Some(self.search_rows.to_string()),
            "search-cols" => Some(self.search_cols.to_string()),
            "catalog-url" => Some(self.catalog_url.clone()),
            _ => None,
        }
    }

    /// Sets a key from its string form. Numeric keys must be positive.
    pub fn set(&mut self, key: &str, value: &str) -> std::result::Result<(), String> {
        match key {
            "cache-max-files" => self.cache_max_files = parse_positive(key, value)?,
            "fetch-timeout-secs" => self.fetch_timeout_secs = parse_positive(key, value)?,
            "sweep-interval-secs" => self.sweep_interval_secs = parse_positive(key, value)?,
            "filter-debounce-ms" => self.filter_debounce_ms = parse_positive(key, value)?,
            "search-rows" => self.search_rows = parse_grid_side(key, value)?,
            "search-cols" => self.search_cols = parse_grid_side(key, value)?,
            "catalog-url" => {
                let url = value.trim().trim_end_matches('/');
                if !(url.starts_with("http://") || url.starts_with("https://")) {
                    return Err(format!("{} must be an http(s) URL, got '{}'", key, value));
                }
                self.catalog_url = url.to_string();
            }
            _ => return Err(format!("Unknown config key: {}", key)),
        }
        Ok(())
    }
}

fn parse_positive<T>(key: &str, value: &str) -> std::result::Result<T, String>
where
    T: std::str::FromStr + PartialOrd + From<u8>,
{
    match value.trim().parse::<T>() {
        Ok(n) if n >= T::from(1) => Ok(n),
        _ => Err(format!(
            "{} must be a positive whole number, got '{}'",
            key, value
        )),
    }
}

fn parse_grid_side(key: &str, value: &str) -> std::result::Result<usize, String> {
    let n = parse_positive(key, value)?;
    if n > MAX_GRID_SIDE {
        return Err(format!("{} must be at most {}, got '{}'", key, MAX_GRID_SIDE, value));
    }
    Ok(n)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = BinderConfig::default();
        assert_eq!(config.cache_max_files, 500);
        assert_eq!(config.fetch_timeout(), Duration::from_secs(5));
        assert_eq!(config.filter_debounce(), Duration::from_millis(600));
        assert_eq!(config.search_grid(), GridSize::default());
    }

    #[test]
    fn test_load_missing_config() {
        let temp = TempDir::new().unwrap();
        let config = BinderConfig::load(temp.path().join("absent")).unwrap();
        assert_eq!(config, BinderConfig::default());
    }

    #[test]
    fn test_save_and_load() {
        let temp = TempDir::new().unwrap();
        let mut config = BinderConfig::default();
        config.set("cache-max-files", "25").unwrap();
        config.save(temp.path()).unwrap();

        let loaded = BinderConfig::load(temp.path()).unwrap();
        assert_eq!(loaded.cache_max_files, 25);
        assert_eq!(loaded.catalog_url, DEFAULT_CATALOG_URL);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(CONFIG_FILENAME), r#"{"search-rows": 2}"#).unwrap();
        let loaded = BinderConfig::load(temp.path()).unwrap();
        assert_eq!(loaded.search_rows, 2);
        assert_eq!(loaded.search_cols, 4);
    }

    #[test]
    fn test_set_rejects_bad_values() {
        let mut config = BinderConfig::default();
        assert!(config.set("search-rows", "0").is_err());
        assert!(config.set("fetch-timeout-secs", "soon").is_err());
        assert!(config.set("catalog-url", "ftp://x").is_err());
        assert!(config.set("colour", "blue").is_err());
        assert!(config.set("search-cols", "101").is_err());
        assert_eq!(config, BinderConfig::default());
    }

    #[test]
    fn test_every_key_is_readable() {
        let config = BinderConfig::default();
        for key in CONFIG_KEYS {
            assert!(config.get(key).is_some(), "{key}");
        }
    }

    #[test]
    fn hand_edited_zeros_are_rejected_on_load() {
        let temp = TempDir::new().unwrap();
        for content in [
            r#"{"sweep-interval-secs": 0}"#,
            r#"{"cache-max-files": 0}"#,
            r#"{"fetch-timeout-secs": 0}"#,
            r#"{"search-rows": 5000}"#,
            r#"{"catalog-url": "file:///etc"}"#,
        ] {
            fs::write(temp.path().join(CONFIG_FILENAME), content).unwrap();
            let err = BinderConfig::load(temp.path()).unwrap_err();
            assert!(matches!(err, BinderError::Validation(_)), "{content}: {err:?}");
        }
    }
}
