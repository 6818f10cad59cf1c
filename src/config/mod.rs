//! Configuration loading, validation and defaults.
//!
//! Settings live in an optional `config.toml` next to the binary; missing
//! files and missing fields fall back to defaults.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Default bound on per-call scratch memory during bulk re-reads
pub const DEFAULT_CHUNK_SIZE: usize = 128 * 1024;

/// Configuration error type
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub scanner: ScannerConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Scan engine settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScannerConfig {
    /// Scratch buffer size for chunked region re-reads, in bytes
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Element width offered as the default at the width prompt
    #[serde(default = "default_width")]
    pub default_width: usize,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        ScannerConfig {
            chunk_size: default_chunk_size(),
            default_width: default_width(),
        }
    }
}

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// tracing filter directive, e.g. "info" or "memscan=debug"
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: default_log_level(),
        }
    }
}

fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}

fn default_width() -> usize {
    4
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Loads and validates configuration from `path`; a missing file yields
/// the defaults.
pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let config = if path.exists() {
        let contents = fs::read_to_string(path)?;
        toml::from_str(&contents)?
    } else {
        Config::default()
    };
    validate(&config)?;
    Ok(config)
}

/// Loads configuration from the default location (`config.toml`)
pub fn load() -> Result<Config, ConfigError> {
    load_from("config.toml")
}

/// Checks configuration invariants.
///
/// The chunk size must be a nonzero multiple of 4 so that no element of
/// any supported width ever straddles a chunk boundary. The default width
/// is deliberately not validated: unsupported widths fall back to 4 bytes
/// at scan time.
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.scanner.chunk_size == 0 {
        return Err(ConfigError::Invalid(
            "scanner.chunk_size must be nonzero".to_string(),
        ));
    }
    if config.scanner.chunk_size % 4 != 0 {
        return Err(ConfigError::Invalid(
            "scanner.chunk_size must be a multiple of 4".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.scanner.chunk_size, DEFAULT_CHUNK_SIZE);
        assert_eq!(config.scanner.default_width, 4);
        assert_eq!(config.logging.level, "info");
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_parse_partial_toml() {
        let config: Config = toml::from_str(
            r#"
            [scanner]
            chunk_size = 4096

            [logging]
            level = "memscan=debug"
            "#,
        )
        .unwrap();
        assert_eq!(config.scanner.chunk_size, 4096);
        assert_eq!(config.scanner.default_width, 4); // defaulted
        assert_eq!(config.logging.level, "memscan=debug");
    }

    #[test]
    fn test_validate_rejects_bad_chunk_size() {
        let mut config = Config::default();
        config.scanner.chunk_size = 0;
        assert!(matches!(validate(&config), Err(ConfigError::Invalid(_))));

        config.scanner.chunk_size = 10;
        assert!(matches!(validate(&config), Err(ConfigError::Invalid(_))));

        config.scanner.chunk_size = 12;
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_load_missing_file_gives_defaults() {
        let config = load_from("/definitely/not/here/config.toml").unwrap();
        assert_eq!(config.scanner.chunk_size, DEFAULT_CHUNK_SIZE);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[scanner]\nchunk_size = 8192").unwrap();

        let config = load_from(file.path()).unwrap();
        assert_eq!(config.scanner.chunk_size, 8192);
    }

    #[test]
    fn test_load_rejects_invalid_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[scanner]\nchunk_size = 7").unwrap();

        assert!(matches!(
            load_from(file.path()),
            Err(ConfigError::Invalid(_))
        ));
    }
}
