//! Configuration loading from disk and the environment.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::AppConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Overrides the hosting environment (`development` / `production`).
pub const ENV_ENVIRONMENT: &str = "REACTIVITIES_ENV";
/// Overrides `listener.bind_address`.
pub const ENV_BIND: &str = "REACTIVITIES_BIND";
/// Overrides `database.path`.
pub const ENV_DATABASE: &str = "REACTIVITIES_DB";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {name}: {message}")]
    Env { name: &'static str, message: String },

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<AppConfig, ConfigError> {
    let mut config: AppConfig = toml::from_str(content)?;
    apply_env_overrides(&mut config, |name| std::env::var(name).ok())?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Build the configuration used when no file is given: defaults plus environment overrides.
pub fn default_config() -> Result<AppConfig, ConfigError> {
    let mut config = AppConfig::default();
    apply_env_overrides(&mut config, |name| std::env::var(name).ok())?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Apply `REACTIVITIES_*` overrides using the given variable lookup.
pub fn apply_env_overrides<F>(config: &mut AppConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(value) = lookup(ENV_ENVIRONMENT) {
        config.environment = value.parse().map_err(|message| ConfigError::Env {
            name: ENV_ENVIRONMENT,
            message,
        })?;
    }
    if let Some(value) = lookup(ENV_BIND) {
        config.listener.bind_address = value;
    }
    if let Some(value) = lookup(ENV_DATABASE) {
        config.database.path = value;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::Environment;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            environment = "development"

            [database]
            path = ":memory:"

            [auth.password]
            min_length = 10
            "#,
        )
        .unwrap();

        assert_eq!(config.environment, Environment::Development);
        assert_eq!(config.database.path, ":memory:");
        assert_eq!(config.database.busy_timeout_ms, 5_000);
        assert_eq!(config.auth.password.min_length, 10);
        assert!(config.auth.password.require_digit);
        assert_eq!(config.cors.allowed_origins.len(), 2);
    }

    #[test]
    fn test_env_overrides() {
        let mut config = AppConfig::default();
        apply_env_overrides(&mut config, |name| match name {
            ENV_ENVIRONMENT => Some("dev".into()),
            ENV_DATABASE => Some("/tmp/other.db".into()),
            _ => None,
        })
        .unwrap();

        assert_eq!(config.environment, Environment::Development);
        assert_eq!(config.database.path, "/tmp/other.db");
        assert_eq!(config.listener.bind_address, "0.0.0.0:5001");
    }

    #[test]
    fn test_bad_environment_override() {
        let mut config = AppConfig::default();
        let err = apply_env_overrides(&mut config, |name| {
            (name == ENV_ENVIRONMENT).then(|| "staging".to_string())
        })
        .unwrap_err();
        assert!(matches!(err, ConfigError::Env { name: ENV_ENVIRONMENT, .. }));
    }

    #[test]
    fn test_validation_errors_are_reported() {
        let err = toml::from_str::<AppConfig>("[timeouts]\nrequest_secs = 0\n")
            .map_err(ConfigError::from)
            .and_then(|config| validate_config(&config).map_err(ConfigError::Validation))
            .unwrap_err();
        assert!(err.to_string().contains("timeouts.request_secs"));
    }
}
