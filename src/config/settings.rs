//! Application settings and configuration
//!
//! This module provides configuration management for the application,
//! loading settings from environment variables with sensible defaults.

use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;

use crate::services::gemini::{DEFAULT_MODEL, GEMINI_API_BASE};

/// Default request body limit; images travel inline as base64.
pub const DEFAULT_MAX_BODY_BYTES: usize = 20 * 1024 * 1024;

/// Application environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, ValueEnum, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    #[value(alias = "dev")]
    Development,
    #[value(alias = "stage")]
    Staging,
    #[value(alias = "prod")]
    Production,
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Staging => write!(f, "staging"),
            Environment::Production => write!(f, "production"),
        }
    }
}

impl std::str::FromStr for Environment {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "staging" | "stage" => Ok(Environment::Staging),
            "production" | "prod" => Ok(Environment::Production),
            _ => anyhow::bail!(
                "Invalid environment: {}. Expected: development, staging, or production",
                s
            ),
        }
    }
}

/// Main application settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    // App settings
    pub app_name: String,
    pub app_version: String,
    pub environment: Environment,
    pub log_level: String,

    // Server settings
    pub host: String,
    pub port: u16,
    pub max_body_bytes: usize,

    // Gemini settings
    #[serde(skip_serializing)]
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub gemini_base_url: String,
}

impl Settings {
    /// Load settings from environment variables with defaults
    ///
    /// Not validated here; call [`Settings::validate`] once CLI overrides are
    /// applied and logging is up.
    pub fn load() -> Result<Self> {
        // Load .env file if it exists
        dotenvy::dotenv().ok();

        Ok(Self {
            app_name: env_or_default("APP_NAME", "lunar-lens"),
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            environment: env_or_default("ENVIRONMENT", "development")
                .parse()
                .unwrap_or_default(),
            log_level: env_or_default("LOG_LEVEL", "info"),

            host: env_or_default("HOST", "0.0.0.0"),
            port: env_or_default("PORT", "8000")
                .parse()
                .context("Invalid PORT value")?,
            max_body_bytes: env_or_default("MAX_BODY_BYTES", &DEFAULT_MAX_BODY_BYTES.to_string())
                .parse()
                .context("Invalid MAX_BODY_BYTES value")?,

            gemini_api_key: non_empty_var("GEMINI_API_KEY").or_else(|| non_empty_var("GOOGLE_API_KEY")),
            gemini_model: env_or_default("GEMINI_MODEL", DEFAULT_MODEL),
            gemini_base_url: env_or_default("GEMINI_BASE_URL", GEMINI_API_BASE),
        })
    }

    /// Validate settings
    pub fn validate(&self) -> Result<()> {
        if self.port == 0 {
            anyhow::bail!("Port cannot be 0");
        }

        if self.max_body_bytes == 0 {
            anyhow::bail!("MAX_BODY_BYTES must be > 0");
        }

        if self.gemini_model.trim().is_empty() {
            anyhow::bail!("GEMINI_MODEL cannot be empty");
        }

        if self.gemini_api_key.is_none() {
            tracing::warn!("No GEMINI_API_KEY set; the server will refuse to start");
        }

        Ok(())
    }

    /// Get the server address string
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            app_name: "lunar-lens".to_string(),
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            environment: Environment::Development,
            log_level: "info".to_string(),
            host: "0.0.0.0".to_string(),
            port: 8000,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            gemini_api_key: None,
            gemini_model: DEFAULT_MODEL.to_string(),
            gemini_base_url: GEMINI_API_BASE.to_string(),
        }
    }
}

/// Helper function to get environment variable with default
fn env_or_default(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.app_name, "lunar-lens");
        assert_eq!(settings.port, 8000);
        assert_eq!(settings.max_body_bytes, 20_971_520);
        assert_eq!(settings.gemini_model, "gemini-2.0-flash");
        assert_eq!(settings.environment, Environment::Development);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_environment_parsing() {
        assert_eq!("development".parse::<Environment>().unwrap(), Environment::Development);
        assert_eq!("dev".parse::<Environment>().unwrap(), Environment::Development);
        assert_eq!("stage".parse::<Environment>().unwrap(), Environment::Staging);
        assert_eq!("PROD".parse::<Environment>().unwrap(), Environment::Production);
        assert!("moonbase".parse::<Environment>().is_err());
    }

    // Only test that writes process environment.
    #[test]
    fn test_load_from_environment() {
        let vars = [
            ("APP_NAME", "lunar-lens-test"),
            ("ENVIRONMENT", "prod"),
            ("PORT", "9123"),
            ("MAX_BODY_BYTES", "1048576"),
            ("GEMINI_API_KEY", " "),
            ("GOOGLE_API_KEY", "google-key"),
            ("GEMINI_MODEL", "gemini-2.5-flash"),
            ("GEMINI_BASE_URL", "http://127.0.0.1:9999/v1beta"),
        ];
        for (key, value) in vars {
            env::set_var(key, value);
        }

        let settings = Settings::load().unwrap();
        assert_eq!(settings.app_name, "lunar-lens-test");
        assert_eq!(settings.environment, Environment::Production);
        assert_eq!(settings.port, 9123);
        assert_eq!(settings.max_body_bytes, 1_048_576);
        assert_eq!(settings.gemini_api_key.as_deref(), Some("google-key"));
        assert_eq!(settings.gemini_model, "gemini-2.5-flash");
        assert_eq!(settings.gemini_base_url, "http://127.0.0.1:9999/v1beta");

        env::set_var("GEMINI_API_KEY", "gemini-key");
        assert_eq!(
            Settings::load().unwrap().gemini_api_key.as_deref(),
            Some("gemini-key")
        );

        env::set_var("PORT", "not-a-port");
        let err = Settings::load().unwrap_err();
        assert!(err.to_string().contains("Invalid PORT value"));

        env::set_var("PORT", "0");
        assert!(Settings::load().unwrap().validate().is_err());

        for (key, _) in vars {
            env::remove_var(key);
        }
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let settings = Settings {
            port: 0,
            ..Settings::default()
        };
        assert!(settings.validate().is_err());

        let settings = Settings {
            max_body_bytes: 0,
            ..Settings::default()
        };
        assert!(settings.validate().is_err());

        let settings = Settings {
            gemini_model: " ".to_string(),
            ..Settings::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_api_key_is_not_serialized() {
        let settings = Settings {
            gemini_api_key: Some("AIza-secret".to_string()),
            ..Settings::default()
        };
        let json = serde_json::to_string(&settings).unwrap();
        assert!(!json.contains("AIza-secret"));
        assert!(json.contains("gemini-2.0-flash"));
    }

    #[test]
    fn test_server_addr() {
        let settings = Settings::default();
        assert_eq!(settings.server_addr(), "0.0.0.0:8000");
    }
}
