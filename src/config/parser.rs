//! Configuration parser for loading controller settings and scenarios.
//!
//! This module handles loading configuration from YAML files and environment
//! variables, with proper precedence and error handling.

use crate::error::{ConfigError, PlacementError, Result};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info};

use super::spec::{ControllerConfig, Scenario};

/// Environment override for `operator_timeout_secs`.
pub const ENV_OPERATOR_TIMEOUT_SECS: &str = "PLACECTL_OPERATOR_TIMEOUT_SECS";
/// Environment override for `max_history`.
pub const ENV_MAX_HISTORY: &str = "PLACECTL_MAX_HISTORY";
/// Environment override for `poll_interval_ms`.
pub const ENV_POLL_INTERVAL_MS: &str = "PLACECTL_POLL_INTERVAL_MS";

/// Configuration parser.
#[derive(Debug, Default)]
pub struct ConfigParser {
    /// Base path for resolving relative paths.
    base_path: Option<PathBuf>,
}

impl ConfigParser {
    /// Creates a new configuration parser.
    #[must_use]
    pub const fn new() -> Self {
        Self { base_path: None }
    }

    /// Sets the base path for resolving relative paths.
    #[must_use]
    pub fn with_base_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.base_path = Some(path.into());
        self
    }

    /// Loads controller settings from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_file(&self, path: impl AsRef<Path>) -> Result<ControllerConfig> {
        let path = self.resolve(path.as_ref());
        info!("Loading configuration from: {}", path.display());
        let content = read_file(&path)?;
        parse_yaml(&content, Some(path.as_path()))
    }

    /// Loads controller settings with environment variable overrides.
    ///
    /// Without a path, defaults are used as the base.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or an override
    /// is not a number.
    pub fn load_with_env(&self, path: Option<&Path>) -> Result<ControllerConfig> {
        let mut config = match path {
            Some(p) => self.load_file(p)?,
            None => {
                debug!("No configuration file, using defaults");
                ControllerConfig::default()
            }
        };

        Self::apply_env_overrides(&mut config)?;
        Ok(config)
    }

    /// Parses controller settings from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML is invalid.
    pub fn parse_yaml(&self, content: &str) -> Result<ControllerConfig> {
        parse_yaml(content, None)
    }

    /// Loads a scenario file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_scenario(&self, path: impl AsRef<Path>) -> Result<Scenario> {
        let path = self.resolve(path.as_ref());
        info!("Loading scenario from: {}", path.display());
        let content = read_file(&path)?;
        let scenario: Scenario = parse_yaml(&content, Some(path.as_path()))?;
        debug!(
            "Scenario for partition {} with {} timeline snapshots",
            scenario.partition.id,
            scenario.timeline.len()
        );
        Ok(scenario)
    }

    /// Applies environment variable overrides to the configuration.
    fn apply_env_overrides(config: &mut ControllerConfig) -> Result<()> {
        if let Some(timeout) = env_number(ENV_OPERATOR_TIMEOUT_SECS)? {
            debug!("Overriding operator_timeout_secs from environment");
            config.operator_timeout_secs = timeout;
        }

        if let Some(history) = env_number(ENV_MAX_HISTORY)? {
            debug!("Overriding max_history from environment");
            config.max_history = history;
        }

        if let Some(interval) = env_number(ENV_POLL_INTERVAL_MS)? {
            debug!("Overriding poll_interval_ms from environment");
            config.poll_interval_ms = interval;
        }

        Ok(())
    }

    /// Loads the .env file if present.
    ///
    /// # Errors
    ///
    /// Returns an error if the .env file exists but cannot be loaded.
    pub fn load_dotenv(&self) -> Result<()> {
        let env_path = self
            .base_path
            .as_ref()
            .map_or_else(|| PathBuf::from(".env"), |p| p.join(".env"));

        if env_path.exists() {
            info!("Loading environment from: {}", env_path.display());
            dotenvy::from_path(&env_path).map_err(|e| {
                PlacementError::Config(ConfigError::ParseError {
                    message: format!("Failed to load .env file: {e}"),
                    location: Some(env_path.display().to_string()),
                })
            })?;
        } else {
            debug!(".env file not found at: {}", env_path.display());
        }

        Ok(())
    }

    /// Resolves `path` against the base path when it is relative.
    fn resolve(&self, path: &Path) -> PathBuf {
        match &self.base_path {
            Some(base) if path.is_relative() => base.join(path),
            _ => path.to_path_buf(),
        }
    }
}

/// Reads a file, mapping a missing file to [`ConfigError::FileNotFound`].
fn read_file(path: &Path) -> Result<String> {
    if !path.exists() {
        return Err(PlacementError::Config(ConfigError::FileNotFound {
            path: path.to_path_buf(),
        }));
    }

    std::fs::read_to_string(path).map_err(|e| {
        PlacementError::Config(ConfigError::ParseError {
            message: format!("Failed to read file: {e}"),
            location: Some(path.display().to_string()),
        })
    })
}

/// Deserializes YAML content, tagging errors with the source path.
fn parse_yaml<T: serde::de::DeserializeOwned>(content: &str, source: Option<&Path>) -> Result<T> {
    serde_yaml::from_str(content).map_err(|e| {
        PlacementError::Config(ConfigError::ParseError {
            message: format!("YAML parse error: {e}"),
            location: source.map(|p| p.display().to_string()),
        })
    })
}

/// Reads a numeric environment variable, if set.
fn env_number<T: FromStr>(name: &str) -> Result<Option<T>> {
    let Ok(value) = std::env::var(name) else {
        return Ok(None);
    };
    value.trim().parse().map(Some).map_err(|_| {
        PlacementError::Config(ConfigError::InvalidEnvVar {
            name: name.to_string(),
            value,
        })
    })
}

/// Default configuration file names to search for.
pub const DEFAULT_CONFIG_FILES: &[&str] = &["placectl.yaml", "placectl.yml"];

/// Finds the configuration file in `start_dir`, its parents, or the user
/// configuration directory.
///
/// # Errors
///
/// Returns an error if no configuration file is found.
pub fn find_config_file(start_dir: impl AsRef<Path>) -> Result<PathBuf> {
    let start = start_dir.as_ref();
    let mut current = start.to_path_buf();

    loop {
        for filename in DEFAULT_CONFIG_FILES {
            let config_path = current.join(filename);
            if config_path.exists() {
                info!("Found configuration file: {}", config_path.display());
                return Ok(config_path);
            }
        }

        if !current.pop() {
            break;
        }
    }

    if let Some(user_dir) = dirs::config_dir().map(|d| d.join("placectl")) {
        for filename in DEFAULT_CONFIG_FILES {
            let config_path = user_dir.join(filename);
            if config_path.exists() {
                info!("Found user configuration file: {}", config_path.display());
                return Ok(config_path);
            }
        }
    }

    Err(PlacementError::Config(ConfigError::FileNotFound {
        path: start.join(DEFAULT_CONFIG_FILES[0]),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OperatorAction;

    #[test]
    fn test_parse_minimal_config() {
        let parser = ConfigParser::new();
        let config = parser.parse_yaml("max_history: 5\n").unwrap();
        assert_eq!(config.max_history, 5);
        assert_eq!(config.operator_timeout_secs, 300);
    }

    #[test]
    fn test_parse_invalid_yaml() {
        let parser = ConfigParser::new();
        let err = parser.parse_yaml("max_history: [").unwrap_err();
        assert!(matches!(err, PlacementError::Config(ConfigError::ParseError { .. })));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let parser = ConfigParser::new().with_base_path(dir.path());
        let err = parser.load_file("nope.yaml").unwrap_err();
        assert!(matches!(err, PlacementError::Config(ConfigError::FileNotFound { .. })));
    }

    #[test]
    fn test_load_scenario_file() {
        let dir = tempfile::tempdir().unwrap();
        let yaml = r"
partition:
  id: 7
  leader: { id: 11, store_id: 1 }
  peers:
    - { id: 11, store_id: 1 }
    - { id: 12, store_id: 2 }
  approximate_size: 100
operator:
  type: remove-peer
  store: 1
timeline:
  - id: 7
    leader: { id: 12, store_id: 2 }
    peers:
      - { id: 12, store_id: 2 }
    approximate_size: 100
";
        std::fs::write(dir.path().join("scenario.yaml"), yaml).unwrap();

        let parser = ConfigParser::new().with_base_path(dir.path());
        let scenario = parser.load_scenario("scenario.yaml").unwrap();
        assert_eq!(scenario.partition.id, 7);
        assert_eq!(scenario.operator.action, OperatorAction::RemovePeer { store: 1 });
        assert_eq!(scenario.timeline.len(), 1);
    }

    #[test]
    fn test_find_config_in_parent() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("placectl.yaml"), "{}").unwrap();
        let nested = dir.path().join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();

        let found = find_config_file(&nested).unwrap();
        assert_eq!(found, dir.path().join("placectl.yaml"));
    }
}
