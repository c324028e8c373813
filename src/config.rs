//! Layered configuration: defaults, optional TOML file, command-line overrides

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::error::RecommendError;
use crate::logging::LogFormat;
use crate::pipeline::MiningConfig;
use crate::rules::Metric;

/// Config file picked up from the working directory when no path is given
pub const DEFAULT_CONFIG_FILE: &str = "ruleforge.toml";

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub mining: MiningConfig,
    /// Recommendations returned per seed
    pub count: usize,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            mining: MiningConfig::default(),
            count: 1,
            logging: LoggingConfig {
                level: "info".to_string(),
                format: LogFormat::Compact,
            },
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("configuration validation failed: {0}")]
    Validation(#[from] RecommendError),
}

/// Values given explicitly on the command line; `None` keeps the lower layer
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub min_support: Option<f64>,
    pub metric: Option<Metric>,
    pub min_threshold: Option<f64>,
    pub max_len: Option<usize>,
    pub count: Option<usize>,
    pub log_level: Option<String>,
    pub log_format: Option<LogFormat>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigPatch {
    mining: Option<MiningPatch>,
    rules: Option<RulesPatch>,
    recommend: Option<RecommendPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct MiningPatch {
    min_support: Option<f64>,
    max_len: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RulesPatch {
    metric: Option<Metric>,
    min_threshold: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RecommendPatch {
    count: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

impl AppConfig {
    /// Build the effective configuration.
    ///
    /// An explicit `config_path` must exist; otherwise `ruleforge.toml` in the
    /// working directory is used when present.
    pub fn load(config_path: Option<&Path>, overrides: ConfigOverrides) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        let path = match config_path {
            Some(path) => Some(path.to_path_buf()),
            None => Some(PathBuf::from(DEFAULT_CONFIG_FILE)).filter(|path| path.is_file()),
        };
        if let Some(path) = path {
            config.apply_patch(read_patch(&path)?);
        }

        config.apply_overrides(overrides);
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML document on top of the defaults, without overrides
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let patch = toml::from_str(contents).map_err(|source| ConfigError::ParseFile {
            path: PathBuf::from("<inline>"),
            source,
        })?;
        let mut config = Self::default();
        config.apply_patch(patch);
        config.validate()?;
        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(mining) = patch.mining {
            if let Some(min_support) = mining.min_support {
                self.mining.min_support = min_support;
            }
            if let Some(max_len) = mining.max_len {
                self.mining.max_len = Some(max_len);
            }
        }

        if let Some(rules) = patch.rules {
            if let Some(metric) = rules.metric {
                self.mining.metric = metric;
            }
            if let Some(min_threshold) = rules.min_threshold {
                self.mining.min_threshold = min_threshold;
            }
        }

        if let Some(count) = patch.recommend.and_then(|recommend| recommend.count) {
            self.count = count;
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(min_support) = overrides.min_support {
            self.mining.min_support = min_support;
        }
        if let Some(metric) = overrides.metric {
            self.mining.metric = metric;
        }
        if let Some(min_threshold) = overrides.min_threshold {
            self.mining.min_threshold = min_threshold;
        }
        if let Some(max_len) = overrides.max_len {
            self.mining.max_len = Some(max_len);
        }
        if let Some(count) = overrides.count {
            self.count = count;
        }
        if let Some(level) = overrides.log_level {
            self.logging.level = level;
        }
        if let Some(format) = overrides.log_format {
            self.logging.format = format;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.mining.validate()?;
        if self.count == 0 {
            return Err(RecommendError::invalid_argument("count must be at least 1").into());
        }
        Ok(())
    }
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&contents).map_err(|source| ConfigError::ParseFile {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults_match_reference_run() {
        let config = AppConfig::default();
        assert_eq!(config.mining.min_support, 0.01);
        assert_eq!(config.mining.metric, Metric::Support);
        assert_eq!(config.mining.min_threshold, 0.01);
        assert_eq!(config.mining.max_len, None);
        assert_eq!(config.count, 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_toml_patch() {
        let config = AppConfig::from_toml_str(
            r#"
            [mining]
            min_support = 0.05
            max_len = 3

            [rules]
            metric = "lift"
            min_threshold = 1.2

            [recommend]
            count = 5

            [logging]
            format = "json"
            "#,
        )
        .unwrap();

        assert_eq!(config.mining.min_support, 0.05);
        assert_eq!(config.mining.max_len, Some(3));
        assert_eq!(config.mining.metric, Metric::Lift);
        assert_eq!(config.mining.min_threshold, 1.2);
        assert_eq!(config.count, 5);
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_unknown_keys_rejected() {
        let result = AppConfig::from_toml_str("[mining]\nminimum = 0.2\n");
        assert!(matches!(result, Err(ConfigError::ParseFile { .. })));
    }

    #[test]
    fn test_validation_errors() {
        let result = AppConfig::from_toml_str("[mining]\nmin_support = 1.5\n");
        assert!(matches!(result, Err(ConfigError::Validation(_))));

        let result = AppConfig::from_toml_str("[recommend]\ncount = 0\n");
        assert!(matches!(result, Err(ConfigError::Validation(_))));

        let result = AppConfig::from_toml_str("[rules]\nmetric = \"confidence\"\nmin_threshold = 2.0\n");
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_file_then_overrides() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[mining]\nmin_support = 0.2\n\n[recommend]\ncount = 3").unwrap();

        let overrides = ConfigOverrides {
            count: Some(7),
            metric: Some(Metric::Confidence),
            min_threshold: Some(0.4),
            ..ConfigOverrides::default()
        };
        let config = AppConfig::load(Some(file.path()), overrides).unwrap();

        assert_eq!(config.mining.min_support, 0.2);
        assert_eq!(config.count, 7);
        assert_eq!(config.mining.metric, Metric::Confidence);
        assert_eq!(config.mining.min_threshold, 0.4);
    }

    #[test]
    fn test_missing_explicit_file() {
        let result = AppConfig::load(
            Some(Path::new("/nonexistent/ruleforge.toml")),
            ConfigOverrides::default(),
        );
        assert!(matches!(result, Err(ConfigError::ReadFile { .. })));
    }
}
