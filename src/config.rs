use crate::constants::{
    DEFAULT_PROVIDER_LIMIT, DEFAULT_REGION, DEFAULT_THROTTLE_MS, DEFAULT_TIMEOUT_SECS,
};
use crate::error::{PickerError, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

pub const CONFIG_PATH: &str = "config.toml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub paths: PathsConfig,
    pub enrichment: EnrichmentConfig,
    pub server: ServerConfig,
    #[serde(skip)]
    pub keys: ApiKeys,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub movies_csv: PathBuf,
    pub streaming_csv: PathBuf,
    pub cache_file: PathBuf,
    pub bag_file: PathBuf,
    pub static_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            movies_csv: PathBuf::from("movies_min85.csv"),
            streaming_csv: PathBuf::from("streaming_coverage.csv"),
            cache_file: PathBuf::from("tmdb_cache.json"),
            bag_file: PathBuf::from("shuffle_bag.json"),
            static_dir: PathBuf::from("static"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EnrichmentConfig {
    pub provider_limit: usize,
    pub throttle_ms: u64,
    pub timeout_seconds: u64,
    pub region: String,
    /// Look up rating, genre and runtime at startup for CSV rows missing them
    pub fill_missing_fields: bool,
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            provider_limit: DEFAULT_PROVIDER_LIMIT,
            throttle_ms: DEFAULT_THROTTLE_MS,
            timeout_seconds: DEFAULT_TIMEOUT_SECS,
            region: DEFAULT_REGION.to_string(),
            fill_missing_fields: true,
        }
    }
}

impl EnrichmentConfig {
    pub fn throttle(&self) -> Duration {
        Duration::from_millis(self.throttle_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: 5000 }
    }
}

/// Credentials for the remote metadata APIs, read from the environment
#[derive(Debug, Clone, Default)]
pub struct ApiKeys {
    pub tmdb: Option<String>,
    pub omdb: Option<String>,
}

impl ApiKeys {
    pub fn from_env() -> Self {
        let read = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());
        Self {
            tmdb: read("TMDB_API_KEY"),
            omdb: read("OMDB_API_KEY"),
        }
    }
}

impl Config {
    /// Load `config.toml` from the working directory, falling back to
    /// defaults when it does not exist. API keys come from the environment
    /// (a `.env` file is honored).
    pub fn load() -> Result<Self> {
        Self::load_from(CONFIG_PATH)
    }

    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        dotenv::dotenv().ok();

        let mut config = if path.exists() {
            let content = fs::read_to_string(path).map_err(|e| {
                PickerError::Config(format!(
                    "Failed to read config file '{}': {}",
                    path.display(),
                    e
                ))
            })?;
            let parsed: Config = toml::from_str(&content)?;
            info!("Loaded configuration from {}", path.display());
            parsed
        } else {
            info!("No config file at {}; using defaults", path.display());
            Config::default()
        };

        if config.enrichment.provider_limit == 0 {
            return Err(PickerError::Config(
                "enrichment.provider_limit must be at least 1".to_string(),
            ));
        }
        config.keys = ApiKeys::from_env();
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let config = Config::load_from(dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.enrichment.provider_limit, DEFAULT_PROVIDER_LIMIT);
        assert_eq!(config.enrichment.throttle(), Duration::from_millis(200));
        assert!(config.enrichment.fill_missing_fields);
        assert_eq!(config.server.port, 5000);
    }

    #[test]
    fn test_partial_file_overrides_selected_fields() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "[enrichment]\nprovider_limit = 3\nregion = \"GB\"\n\n[paths]\ncache_file = \"state/cache.json\"\n",
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.enrichment.provider_limit, 3);
        assert_eq!(config.enrichment.region, "GB");
        assert_eq!(config.enrichment.timeout_seconds, DEFAULT_TIMEOUT_SECS);
        assert_eq!(config.paths.cache_file, PathBuf::from("state/cache.json"));
        assert_eq!(config.paths.bag_file, PathBuf::from("shuffle_bag.json"));
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[enrichment\nprovider_limit = ").unwrap();
        assert!(matches!(Config::load_from(&path), Err(PickerError::Toml(_))));

        fs::write(&path, "[enrichment]\nprovider_limit = 0\n").unwrap();
        assert!(matches!(Config::load_from(&path), Err(PickerError::Config(_))));
    }
}
