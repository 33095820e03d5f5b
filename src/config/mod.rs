pub mod ingest;
pub mod log;
pub mod rank;

use std::path::Path;

use serde::Deserialize;
use serde::Serialize;
use tracing::debug;
use tracing::warn;

pub use ingest::IngestConfig;
pub use log::LoggingConfig;
pub use rank::PageRankConfig;
pub use rank::RankingConfig;

use crate::error::ConfigError;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub ingest: IngestConfig,
    pub pagerank: PageRankConfig,
    pub ranking: RankingConfig,
    pub logging: LoggingConfig,
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.ingest.validate()?;
        self.pagerank.validate()?;
        self.ranking.validate()?;
        Ok(())
    }
}

pub fn parse_config(config_str: &str) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(config_str)?;
    config.validate()?;
    Ok(config)
}

pub async fn load_config(path: impl AsRef<Path>) -> crate::Result<Config> {
    let path = path.as_ref();
    let config_str = tokio::fs::read_to_string(path).await.map_err(|source| ConfigError::OpenFileError {
        path: path.display().to_string(),
        source,
    })?;
    Ok(parse_config(&config_str)?)
}

/// Loads the config file when present, otherwise falls back to defaults.
/// A file that exists but fails to parse is still an error.
pub async fn load_config_or_default(path: impl AsRef<Path>) -> crate::Result<Config> {
    let path = path.as_ref();
    if tokio::fs::try_exists(path).await.unwrap_or(false) {
        debug!("loading_configuration::path::{}", path.display());
        load_config(path).await
    } else {
        warn!("config_file_not_found::path::{}::using_defaults", path.display());
        Ok(Config::default())
    }
}
