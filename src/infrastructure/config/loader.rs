use anyhow::{Context, Result};
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Yaml};
use thiserror::Error;

use crate::domain::models::config::{Config, FixerKind};

/// Upper bound on the per-file iteration budget.
pub const MAX_ITERATIONS_LIMIT: u32 = 50;

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid max_iterations: {0}. Must be between 1 and {MAX_ITERATIONS_LIMIT}")]
    InvalidMaxIterations(u32),

    #[error("Invalid {field}: must be at least 1")]
    ZeroLimit { field: &'static str },

    #[error("Executor program cannot be empty")]
    EmptyExecutorProgram,

    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),

    #[error("The anthropic-api fixer needs an API key (fixer.api_key or ANTHROPIC_API_KEY)")]
    MissingApiKey,
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. .test-healer/config.yaml (project config)
    /// 3. .test-healer/local.yaml (project local overrides, optional)
    /// 4. Environment variables (TEST_HEALER_* prefix, highest priority)
    pub fn load() -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(".test-healer/config.yaml"))
            .merge(Yaml::file(".test-healer/local.yaml"))
            .merge(Env::prefixed("TEST_HEALER_").split("__"))
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file
    ///
    /// Environment variables still override values from the file.
    pub fn load_from_file(path: impl AsRef<std::path::Path>) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path.as_ref()))
            .merge(Env::prefixed("TEST_HEALER_").split("__"))
            .extract()
            .context(format!(
                "Failed to load config from {}",
                path.as_ref().display()
            ))?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate configuration after loading
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        let repair = &config.repair;
        if repair.max_iterations == 0 || repair.max_iterations > MAX_ITERATIONS_LIMIT {
            return Err(ConfigError::InvalidMaxIterations(repair.max_iterations));
        }

        let limits = [
            ("repair.error_context_chars", repair.error_context_chars),
            ("repair.signature_prefix_chars", repair.signature_prefix_chars),
            ("repair.max_concurrent_files", repair.max_concurrent_files),
        ];
        if let Some((field, _)) = limits.iter().find(|(_, value)| *value == 0) {
            return Err(ConfigError::ZeroLimit { field });
        }

        if config.executor.program.trim().is_empty() {
            return Err(ConfigError::EmptyExecutorProgram);
        }
        if config.executor.timeout_secs == 0 {
            return Err(ConfigError::ZeroLimit {
                field: "executor.timeout_secs",
            });
        }
        if config.fixer.timeout_secs == 0 {
            return Err(ConfigError::ZeroLimit {
                field: "fixer.timeout_secs",
            });
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }

        if config.fixer.kind == FixerKind::AnthropicApi && config.fixer.resolved_api_key().is_none()
        {
            return Err(ConfigError::MissingApiKey);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        ConfigLoader::validate(&config).expect("Default config should be valid");
    }

    #[test]
    fn test_validate_zero_iterations() {
        let mut config = Config::default();
        config.repair.max_iterations = 0;

        assert!(matches!(
            ConfigLoader::validate(&config).unwrap_err(),
            ConfigError::InvalidMaxIterations(0)
        ));
    }

    #[test]
    fn test_validate_too_many_iterations() {
        let mut config = Config::default();
        config.repair.max_iterations = 51;

        assert!(matches!(
            ConfigLoader::validate(&config).unwrap_err(),
            ConfigError::InvalidMaxIterations(51)
        ));

        config.repair.max_iterations = 50;
        assert!(ConfigLoader::validate(&config).is_ok());
    }

    #[test]
    fn test_validate_zero_limits() {
        let mut config = Config::default();
        config.repair.signature_prefix_chars = 0;
        match ConfigLoader::validate(&config).unwrap_err() {
            ConfigError::ZeroLimit { field } => assert_eq!(field, "repair.signature_prefix_chars"),
            other => panic!("Expected ZeroLimit error, got {other}"),
        }

        let mut config = Config::default();
        config.executor.timeout_secs = 0;
        match ConfigLoader::validate(&config).unwrap_err() {
            ConfigError::ZeroLimit { field } => assert_eq!(field, "executor.timeout_secs"),
            other => panic!("Expected ZeroLimit error, got {other}"),
        }
    }

    #[test]
    fn test_validate_empty_program() {
        let mut config = Config::default();
        config.executor.program = "  ".to_string();

        assert!(matches!(
            ConfigLoader::validate(&config).unwrap_err(),
            ConfigError::EmptyExecutorProgram
        ));
    }

    #[test]
    fn test_validate_invalid_log_level() {
        let mut config = Config::default();
        config.logging.level = "invalid".to_string();

        match ConfigLoader::validate(&config).unwrap_err() {
            ConfigError::InvalidLogLevel(level) => assert_eq!(level, "invalid"),
            _ => panic!("Expected InvalidLogLevel error"),
        }
    }

    #[test]
    fn test_validate_invalid_log_format() {
        let mut config = Config::default();
        config.logging.format = "xml".to_string();

        match ConfigLoader::validate(&config).unwrap_err() {
            ConfigError::InvalidLogFormat(format) => assert_eq!(format, "xml"),
            _ => panic!("Expected InvalidLogFormat error"),
        }
    }

    #[test]
    fn test_anthropic_api_with_explicit_key() {
        let mut config = Config::default();
        config.fixer.kind = FixerKind::AnthropicApi;
        config.fixer.api_key = Some("sk-test".to_string());

        assert!(ConfigLoader::validate(&config).is_ok());
    }

    #[test]
    fn test_hierarchical_merging() {
        use std::io::Write;
        use tempfile::NamedTempFile;

        let mut base_file = NamedTempFile::new().unwrap();
        writeln!(
            base_file,
            "repair:\n  max_iterations: 4\nlogging:\n  level: info\n  format: json"
        )
        .unwrap();
        base_file.flush().unwrap();

        let mut override_file = NamedTempFile::new().unwrap();
        writeln!(override_file, "repair:\n  max_iterations: 9\nlogging:\n  level: debug").unwrap();
        override_file.flush().unwrap();

        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(base_file.path()))
            .merge(Yaml::file(override_file.path()))
            .extract()
            .unwrap();

        assert_eq!(config.repair.max_iterations, 9, "Override should win");
        assert_eq!(
            config.logging.level, "debug",
            "Override should win for nested fields"
        );
        assert_eq!(
            config.logging.format, "json",
            "Base value should persist when not overridden"
        );
        assert_eq!(config.repair.error_context_chars, 3000);
    }
}
