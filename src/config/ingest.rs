use serde::Deserialize;
use serde::Serialize;

use crate::error::ConfigError;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct IngestConfig {
    // Bytes accumulated in the carry buffer before a chunk is decoded
    pub chunk_threshold: usize,
    pub read_buffer_size: usize,
    // Decoded records held before a `data` event is emitted
    pub batch_size: usize,
    pub channel_capacity: usize,
    pub delimiter: char,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            chunk_threshold: 1024 * 1024,
            read_buffer_size: 64 * 1024,
            batch_size: 10_000,
            channel_capacity: 64,
            delimiter: ',',
        }
    }
}

impl IngestConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.read_buffer_size == 0 {
            return Err(ConfigError::InvalidValue("ingest.read_buffer_size must be positive".to_string()));
        }
        if self.batch_size == 0 {
            return Err(ConfigError::InvalidValue("ingest.batch_size must be positive".to_string()));
        }
        if self.channel_capacity == 0 {
            return Err(ConfigError::InvalidValue("ingest.channel_capacity must be positive".to_string()));
        }
        if self.delimiter == '"' || self.delimiter == '\n' || self.delimiter == '\r' {
            return Err(ConfigError::InvalidValue(format!(
                "ingest.delimiter {:?} is reserved",
                self.delimiter
            )));
        }
        Ok(())
    }
}
