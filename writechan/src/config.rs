//! Writer channel options, read from JSON
//!
//! ```json
//! { "queue_capacity": 16, "max_buffer_len": 65536 }
//! ```
//!
//! Missing fields take their defaults, unknown fields are rejected.

use serde::Deserialize;
use std::fmt;

pub const DEFAULT_QUEUE_CAPACITY: usize = 64;

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct WriterConfig {
    /// Number of buffers the queue holds before writers block
    pub queue_capacity: usize,
    /// Upper bound on a single buffer, `None` for unbounded buffers
    pub max_buffer_len: Option<usize>,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            max_buffer_len: None,
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    /// Reading the options failed
    Read(String),
    /// The options are not valid JSON for `WriterConfig`
    Parse(serde_json::Error),
    /// A bounded queue needs at least one slot
    ZeroCapacity,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read(msg) => write!(f, "Failed to read writer config: {msg}"),
            Self::Parse(e) => write!(f, "Failed to parse writer config JSON: {e}"),
            Self::ZeroCapacity => write!(f, "queue_capacity must be at least 1"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Parse(e) => Some(e),
            Self::Read(_) | Self::ZeroCapacity => None,
        }
    }
}

impl WriterConfig {
    /// Parse and validate options from a JSON document.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or `queue_capacity` is zero.
    pub fn from_slice(json: &[u8]) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_slice(json).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Read a JSON document to the end and parse it.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - There are I/O errors reading from the provided reader
    /// - The JSON input is invalid or malformed
    /// - `queue_capacity` is zero
    pub fn from_reader(mut reader: impl embedded_io::Read) -> Result<Self, ConfigError> {
        let mut json = Vec::new();
        let mut chunk = [0u8; 1024];
        loop {
            match embedded_io::Read::read(&mut reader, &mut chunk) {
                Ok(0) => break,
                Ok(n) => json.extend_from_slice(&chunk[..n]),
                Err(e) => return Err(ConfigError::Read(format!("{e:?}"))),
            }
        }
        Self::from_slice(&json)
    }

    /// # Errors
    ///
    /// Returns `ConfigError::ZeroCapacity` if `queue_capacity` is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.queue_capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        Ok(())
    }
}
