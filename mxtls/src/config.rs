use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use mxtls_common::{config::ProbeTimeouts, logging::LogFormat};
use mxtls_processor::ProcessorConfig;
use mxtls_smtp::SmtpConfig;
use serde::Deserialize;
use thiserror::Error;

/// Environment variable naming the configuration file.
pub const CONFIG_ENV: &str = "MXTLS_CONFIG";

const DEFAULT_PATHS: [&str; 2] = ["./mxtls.config.ron", "/etc/mxtls/mxtls.config.ron"];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("MXTLS_CONFIG points to non-existent file: {}", .0.display())]
    Missing(PathBuf),

    #[error("Failed to read config from {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config: {0}")]
    Parse(#[from] ron::error::SpannedError),
}

/// Everything the binary can be configured with. Every section is optional.
///
/// ```ron
/// (
///     smtp: (gateway_suffix: "probe.example.net"),
///     timeouts: (connect_secs: 30),
///     processor: (max_batch_size: 20),
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub smtp: SmtpConfig,

    #[serde(default)]
    pub timeouts: ProbeTimeouts,

    #[serde(default)]
    pub processor: ProcessorConfig,

    #[serde(default)]
    pub log_format: LogFormat,

    /// How long `serve` waits on stdin for the rest of a batch (in seconds)
    ///
    /// Default: 1 second
    #[serde(default = "defaults::linger_secs")]
    pub linger_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            smtp: SmtpConfig::default(),
            timeouts: ProbeTimeouts::default(),
            processor: ProcessorConfig::default(),
            log_format: LogFormat::default(),
            linger_secs: defaults::linger_secs(),
        }
    }
}

impl Config {
    /// Finds the configuration file using the following precedence:
    /// 1. `MXTLS_CONFIG` environment variable
    /// 2. ./mxtls.config.ron (current working directory)
    /// 3. /etc/mxtls/mxtls.config.ron (system-wide config)
    ///
    /// # Errors
    ///
    /// When `MXTLS_CONFIG` names a file that does not exist.
    pub fn discover() -> Result<Option<PathBuf>, ConfigError> {
        if let Ok(env_path) = std::env::var(CONFIG_ENV) {
            let path = PathBuf::from(env_path);
            return if path.exists() {
                Ok(Some(path))
            } else {
                Err(ConfigError::Missing(path))
            };
        }

        Ok(DEFAULT_PATHS.iter().map(PathBuf::from).find(|path| path.exists()))
    }

    /// # Errors
    ///
    /// When the file cannot be read or is not valid RON.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        Self::parse(&content)
    }

    /// # Errors
    ///
    /// When `content` is not a valid configuration.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        Ok(ron::from_str(content)?)
    }

    pub const fn linger(&self) -> Duration {
        Duration::from_secs(self.linger_secs)
    }
}

mod defaults {
    pub const fn linger_secs() -> u64 {
        1
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_empty_config_is_default() {
        let config = Config::parse("()").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.linger(), Duration::from_secs(1));
        assert_eq!(config.smtp.port, 25);
        assert_eq!(config.processor.max_batch_size, 10);
    }

    #[test]
    fn test_sections_override_defaults() {
        let config = Config::parse(
            r#"(
                smtp: (gateway_suffix: "probe.example.net", port: 2525),
                timeouts: (connect_secs: 30),
                processor: (max_batch_size: 20),
                log_format: json,
            )"#,
        )
        .unwrap();

        assert_eq!(config.smtp.gateway_suffix, "probe.example.net");
        assert_eq!(config.smtp.port, 2525);
        assert_eq!(config.timeouts.connect_secs, 30);
        assert_eq!(config.timeouts.receive_secs, 300);
        assert_eq!(config.processor.max_batch_size, 20);
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn test_load_reports_the_path() {
        let error = Config::load(Path::new("/nonexistent/mxtls.config.ron")).unwrap_err();
        assert!(error.to_string().contains("/nonexistent/mxtls.config.ron"));
    }

    #[test]
    fn test_load_from_file() {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), "(linger_secs: 5)").unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.linger(), Duration::from_secs(5));
    }
}
