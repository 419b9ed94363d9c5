//! Cart configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `FERNWAY_DATA_DIR` - Directory for durable slot files (default: ./data)
//! - `FERNWAY_ORDERS_URL` - Order submission endpoint; enables checkout
//! - `FERNWAY_ORDERS_API_KEY` - Bearer token for the order endpoint
//!   (required when `FERNWAY_ORDERS_URL` is set)

use std::path::PathBuf;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

const DEFAULT_DATA_DIR: &str = "./data";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Cart application configuration.
#[derive(Debug, Clone)]
pub struct CartConfig {
    /// Directory holding the durable slot files.
    pub data_dir: PathBuf,
    /// Order endpoint configuration, when checkout is enabled.
    pub orders: Option<OrdersConfig>,
}

/// Order submission endpoint configuration.
#[derive(Debug, Clone)]
pub struct OrdersConfig {
    /// Order submission endpoint URL.
    pub endpoint: Url,
    /// Bearer token for the order endpoint.
    pub api_key: SecretString,
}

impl CartConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if `FERNWAY_ORDERS_URL` is set but malformed,
    /// or set without `FERNWAY_ORDERS_API_KEY`.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let data_dir = PathBuf::from(get_env_or_default("FERNWAY_DATA_DIR", DEFAULT_DATA_DIR));
        let orders = OrdersConfig::from_env()?;

        Ok(Self { data_dir, orders })
    }
}

impl OrdersConfig {
    fn from_env() -> Result<Option<Self>, ConfigError> {
        let Some(raw_url) = get_optional_env("FERNWAY_ORDERS_URL") else {
            return Ok(None);
        };
        let endpoint = Url::parse(&raw_url).map_err(|e| {
            ConfigError::InvalidEnvVar("FERNWAY_ORDERS_URL".to_string(), e.to_string())
        })?;
        let api_key = get_required_secret("FERNWAY_ORDERS_API_KEY")?;

        Ok(Some(Self { endpoint, api_key }))
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get a required environment variable as a secret.
fn get_required_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    Ok(SecretString::from(value))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::MissingEnvVar("FERNWAY_ORDERS_API_KEY".to_string());
        assert_eq!(
            err.to_string(),
            "Missing environment variable: FERNWAY_ORDERS_API_KEY"
        );

        let err = ConfigError::InvalidEnvVar("FERNWAY_ORDERS_URL".to_string(), "bad".to_string());
        assert!(err.to_string().contains("FERNWAY_ORDERS_URL"));
    }

    #[test]
    fn test_orders_config_debug_redacts_api_key() {
        let config = OrdersConfig {
            endpoint: Url::parse("https://orders.example.com/v1/orders").unwrap(),
            api_key: SecretString::from("super_secret_token"),
        };

        let debug_output = format!("{config:?}");
        assert!(debug_output.contains("orders.example.com"));
        assert!(!debug_output.contains("super_secret_token"));
    }
}
