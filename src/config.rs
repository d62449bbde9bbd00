use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::matcher::ConformanceMode;

/// Trait for abstracting environment variable access
pub trait EnvProvider {
    fn get(&self, key: &str) -> Option<String>;
}

/// System environment variable provider for production use
pub struct SystemEnvProvider;

impl EnvProvider for SystemEnvProvider {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlParsing(#[from] toml::de::Error),

    #[error("JSON parsing error: {0}")]
    JsonParsing(#[from] serde_json::Error),

    #[error("Configuration validation error: {0}")]
    Validation(String),

    #[error("Environment variable error: {0}")]
    Environment(String),

    #[error("Unsupported configuration file format: {0}")]
    UnsupportedFormat(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Main library configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub validation: ValidationConfig,
    pub output: OutputConfig,
}

/// Validation-specific configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ValidationConfig {
    /// Evaluate schemas at all; when false, validation is a pass-through
    pub enabled: bool,
    /// Conformance check applied by the validator
    pub mode: ConformanceMode,
    /// Worker threads for batch validation
    pub threads: Option<usize>,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            enabled: !cfg!(feature = "elide-validation"),
            mode: ConformanceMode::Permissive,
            threads: None,
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OutputConfig {
    /// Output format
    pub format: OutputFormatConfig,
    /// Verbose output
    pub verbose: bool,
    /// Quiet mode (errors only)
    pub quiet: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormatConfig::Human,
            verbose: false,
            quiet: false,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormatConfig {
    Human,
    Json,
    Summary,
}

/// Configuration manager for loading and merging configurations
pub struct ConfigManager;

impl ConfigManager {
    /// Load configuration with precedence: defaults -> file -> environment
    pub async fn load_config(path: Option<&Path>) -> Result<Config> {
        Self::load_config_with(&SystemEnvProvider, path).await
    }

    /// [`ConfigManager::load_config`] with a custom environment provider
    pub async fn load_config_with(env: &impl EnvProvider, path: Option<&Path>) -> Result<Config> {
        let mut config = Config::default();

        if let Some(config_path) = path {
            let file_config = Self::load_from_file(config_path).await?;
            config = Self::merge_configs(config, file_config);
        } else if let Some(found_config) = Self::find_config_file().await? {
            config = Self::merge_configs(config, found_config);
        }

        config = Self::apply_environment_overrides_with(env, config)?;

        Self::validate_config(&config)?;

        Ok(config)
    }

    /// Load configuration from a file (TOML or JSON)
    pub async fn load_from_file(path: &Path) -> Result<Config> {
        let content = tokio::fs::read_to_string(path).await?;

        let config: Config = match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => toml::from_str(&content)?,
            Some("json") => serde_json::from_str(&content)?,
            Some(ext) => return Err(ConfigError::UnsupportedFormat(ext.to_string())),
            None => {
                // Try to parse as TOML first, then JSON
                match toml::from_str::<Config>(&content) {
                    Ok(config) => config,
                    Err(_) => serde_json::from_str(&content)?,
                }
            }
        };

        tracing::debug!(path = %path.display(), "loaded configuration file");
        Ok(config)
    }

    /// Find configuration file in standard locations
    pub async fn find_config_file() -> Result<Option<Config>> {
        let config_names = [
            "validate-shape.toml",
            "validate-shape.json",
            ".validate-shape.toml",
            ".validate-shape.json",
        ];

        // Check current directory first
        for name in &config_names {
            let path = PathBuf::from(name);
            if path.exists() {
                return Ok(Some(Self::load_from_file(&path).await?));
            }
        }

        // Check user config directory
        if let Some(config_dir) = dirs::config_dir() {
            let app_config_dir = config_dir.join("validate-shape");
            for name in &config_names {
                let path = app_config_dir.join(name);
                if path.exists() {
                    return Ok(Some(Self::load_from_file(&path).await?));
                }
            }
        }

        Ok(None)
    }

    /// Apply environment variable overrides using the system environment
    pub fn apply_environment_overrides(config: Config) -> Result<Config> {
        Self::apply_environment_overrides_with(&SystemEnvProvider, config)
    }

    /// Apply environment variable overrides with a custom environment provider
    pub fn apply_environment_overrides_with(
        env: &impl EnvProvider,
        mut config: Config,
    ) -> Result<Config> {
        // Validation settings
        if let Some(enabled) = env.get("VALIDATE_SHAPE_ENABLED") {
            config.validation.enabled = parse_env("VALIDATE_SHAPE_ENABLED", &enabled)?;
        }

        if let Some(mode) = env.get("VALIDATE_SHAPE_MODE") {
            config.validation.mode = mode.parse().map_err(|_| {
                ConfigError::Environment(format!("Invalid VALIDATE_SHAPE_MODE value: {}", mode))
            })?;
        }

        if let Some(threads) = env.get("VALIDATE_SHAPE_THREADS") {
            config.validation.threads = Some(parse_env("VALIDATE_SHAPE_THREADS", &threads)?);
        }

        // Output settings
        if let Some(verbose) = env.get("VALIDATE_SHAPE_VERBOSE") {
            config.output.verbose = parse_env("VALIDATE_SHAPE_VERBOSE", &verbose)?;
        }

        if let Some(quiet) = env.get("VALIDATE_SHAPE_QUIET") {
            config.output.quiet = parse_env("VALIDATE_SHAPE_QUIET", &quiet)?;
        }

        if let Some(format) = env.get("VALIDATE_SHAPE_FORMAT") {
            config.output.format = match format.to_lowercase().as_str() {
                "human" => OutputFormatConfig::Human,
                "json" => OutputFormatConfig::Json,
                "summary" => OutputFormatConfig::Summary,
                _ => {
                    return Err(ConfigError::Environment(format!(
                        "Invalid VALIDATE_SHAPE_FORMAT value: {}",
                        format
                    )));
                }
            };
        }

        Ok(config)
    }

    /// Merge two configurations (second takes precedence for non-None values)
    pub fn merge_configs(mut base: Config, override_config: Config) -> Config {
        // Validation settings
        base.validation.enabled = override_config.validation.enabled;
        base.validation.mode = override_config.validation.mode;
        if override_config.validation.threads.is_some() {
            base.validation.threads = override_config.validation.threads;
        }

        // Output settings
        base.output = override_config.output;

        base
    }

    /// Validate configuration values
    pub fn validate_config(config: &Config) -> Result<()> {
        if let Some(threads) = config.validation.threads {
            if threads == 0 {
                return Err(ConfigError::Validation(
                    "Number of threads must be greater than 0".to_string(),
                ));
            }
            if threads > 1000 {
                return Err(ConfigError::Validation(
                    "Number of threads cannot exceed 1000".to_string(),
                ));
            }
        }

        if config.output.verbose && config.output.quiet {
            return Err(ConfigError::Validation(
                "Cannot enable both verbose and quiet modes".to_string(),
            ));
        }

        Ok(())
    }

    /// Get the effective thread count
    pub fn get_thread_count(config: &ValidationConfig) -> usize {
        config.threads.unwrap_or_else(num_cpus::get)
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T> {
    raw.parse()
        .map_err(|_| ConfigError::Environment(format!("Invalid {} value: {}", key, raw)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::fs;
    use tempfile::TempDir;

    /// Mock environment variable provider for testing
    #[derive(Default)]
    struct MockEnvProvider {
        vars: HashMap<String, String>,
    }

    impl MockEnvProvider {
        fn new() -> Self {
            Self {
                vars: HashMap::new(),
            }
        }

        fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
            self.vars.insert(key.into(), value.into());
        }
    }

    impl EnvProvider for MockEnvProvider {
        fn get(&self, key: &str) -> Option<String> {
            self.vars.get(key).cloned()
        }
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.validation.enabled, !cfg!(feature = "elide-validation"));
        assert_eq!(config.validation.mode, ConformanceMode::Permissive);
        assert_eq!(config.validation.threads, None);

        assert_eq!(config.output.format, OutputFormatConfig::Human);
        assert!(!config.output.verbose);
        assert!(!config.output.quiet);
    }

    #[tokio::test]
    async fn test_load_toml_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");

        let toml_content = r#"
[validation]
enabled = false
mode = "exact"
threads = 8

[output]
format = "json"
verbose = true
quiet = false
"#;

        fs::write(&config_path, toml_content).unwrap();

        let config = ConfigManager::load_from_file(&config_path).await.unwrap();

        assert!(!config.validation.enabled);
        assert_eq!(config.validation.mode, ConformanceMode::Exact);
        assert_eq!(config.validation.threads, Some(8));

        assert_eq!(config.output.format, OutputFormatConfig::Json);
        assert!(config.output.verbose);
        assert!(!config.output.quiet);
    }

    #[tokio::test]
    async fn test_load_json_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");

        let json_content = r#"{
  "validation": {
    "enabled": true,
    "mode": "permissive",
    "threads": 2
  },
  "output": {
    "format": "summary",
    "verbose": false,
    "quiet": true
  }
}"#;

        fs::write(&config_path, json_content).unwrap();

        let config = ConfigManager::load_from_file(&config_path).await.unwrap();

        assert!(config.validation.enabled);
        assert_eq!(config.validation.mode, ConformanceMode::Permissive);
        assert_eq!(config.validation.threads, Some(2));
        assert_eq!(config.output.format, OutputFormatConfig::Summary);
        assert!(config.output.quiet);
    }

    #[tokio::test]
    async fn test_partial_file_keeps_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        fs::write(&config_path, "[validation]\nmode = \"exact\"\n").unwrap();

        let config = ConfigManager::load_from_file(&config_path).await.unwrap();

        assert_eq!(config.validation.mode, ConformanceMode::Exact);
        assert_eq!(config.validation.enabled, !cfg!(feature = "elide-validation"));
        assert_eq!(config.output, OutputConfig::default());
    }

    #[tokio::test]
    async fn test_extensionless_file_falls_back_to_json() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("shape-config");
        fs::write(&config_path, r#"{"validation": {"mode": "exact"}}"#).unwrap();

        let config = ConfigManager::load_from_file(&config_path).await.unwrap();
        assert_eq!(config.validation.mode, ConformanceMode::Exact);
    }

    #[tokio::test]
    async fn test_unsupported_file_format() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.yaml");

        fs::write(&config_path, "invalid: yaml").unwrap();

        let result = ConfigManager::load_from_file(&config_path).await;
        assert!(result.is_err());

        match result.unwrap_err() {
            ConfigError::UnsupportedFormat(ext) => assert_eq!(ext, "yaml"),
            _ => panic!("Expected UnsupportedFormat error"),
        }
    }

    #[tokio::test]
    async fn test_invalid_toml() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");

        fs::write(&config_path, "invalid toml [[[").unwrap();

        let result = ConfigManager::load_from_file(&config_path).await;
        assert!(matches!(result.unwrap_err(), ConfigError::TomlParsing(_)));
    }

    #[tokio::test]
    async fn test_missing_file_is_io_error() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("absent.toml");

        let result = ConfigManager::load_from_file(&config_path).await;
        assert!(matches!(result.unwrap_err(), ConfigError::Io(_)));
    }

    #[test]
    fn test_environment_overrides() {
        let mut env = MockEnvProvider::new();
        env.set("VALIDATE_SHAPE_ENABLED", "false");
        env.set("VALIDATE_SHAPE_MODE", "EXACT");
        env.set("VALIDATE_SHAPE_THREADS", "3");
        env.set("VALIDATE_SHAPE_FORMAT", "json");
        env.set("VALIDATE_SHAPE_QUIET", "true");

        let config =
            ConfigManager::apply_environment_overrides_with(&env, Config::default()).unwrap();

        assert!(!config.validation.enabled);
        assert_eq!(config.validation.mode, ConformanceMode::Exact);
        assert_eq!(config.validation.threads, Some(3));
        assert_eq!(config.output.format, OutputFormatConfig::Json);
        assert!(config.output.quiet);
    }

    #[test]
    fn test_invalid_environment_values() {
        for (key, value) in [
            ("VALIDATE_SHAPE_ENABLED", "maybe"),
            ("VALIDATE_SHAPE_MODE", "strict"),
            ("VALIDATE_SHAPE_THREADS", "many"),
            ("VALIDATE_SHAPE_FORMAT", "xml"),
        ] {
            let mut env = MockEnvProvider::new();
            env.set(key, value);

            let result = ConfigManager::apply_environment_overrides_with(&env, Config::default());
            match result {
                Err(ConfigError::Environment(message)) => assert!(message.contains(key)),
                other => panic!("Expected Environment error for {}, got {:?}", key, other),
            }
        }
    }

    #[tokio::test]
    async fn test_load_config_precedence() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("validate-shape.toml");
        fs::write(
            &config_path,
            "[validation]\nmode = \"exact\"\nthreads = 2\n",
        )
        .unwrap();

        let mut env = MockEnvProvider::new();
        env.set("VALIDATE_SHAPE_THREADS", "6");

        let config = ConfigManager::load_config_with(&env, Some(&config_path))
            .await
            .unwrap();

        // file beats defaults, environment beats file
        assert_eq!(config.validation.mode, ConformanceMode::Exact);
        assert_eq!(config.validation.threads, Some(6));
    }

    #[tokio::test]
    async fn test_load_config_rejects_invalid_result() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("validate-shape.toml");
        fs::write(&config_path, "[output]\nverbose = true\nquiet = true\n").unwrap();

        let result = ConfigManager::load_config_with(&MockEnvProvider::default(), Some(&config_path)).await;
        assert!(matches!(result.unwrap_err(), ConfigError::Validation(_)));
    }

    #[test]
    fn test_validate_config_threads() {
        let mut config = Config::default();
        config.validation.threads = Some(0);
        assert!(ConfigManager::validate_config(&config).is_err());

        config.validation.threads = Some(1001);
        assert!(ConfigManager::validate_config(&config).is_err());

        config.validation.threads = Some(16);
        assert!(ConfigManager::validate_config(&config).is_ok());
        assert_eq!(ConfigManager::get_thread_count(&config.validation), 16);
    }

    #[test]
    fn test_thread_count_defaults_to_cpu_count() {
        let config = ValidationConfig::default();
        assert_eq!(ConfigManager::get_thread_count(&config), num_cpus::get());
        assert!(ConfigManager::get_thread_count(&config) >= 1);
    }

    #[test]
    fn test_merge_configs() {
        let base = Config {
            validation: ValidationConfig {
                threads: Some(4),
                ..ValidationConfig::default()
            },
            ..Config::default()
        };
        let override_config = Config {
            validation: ValidationConfig {
                enabled: false,
                mode: ConformanceMode::Exact,
                threads: None,
            },
            ..Config::default()
        };

        let merged = ConfigManager::merge_configs(base, override_config);
        assert!(!merged.validation.enabled);
        assert_eq!(merged.validation.mode, ConformanceMode::Exact);
        assert_eq!(merged.validation.threads, Some(4));
    }
}
