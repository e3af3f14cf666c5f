use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info};

/// Application configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Environment (dev, staging, prod)
    #[serde(default = "default_environment")]
    pub environment: String,

    /// Allowed origins for HTTP and WebSocket clients, comma separated. `*` allows any.
    pub cors_origins: Option<String>,

    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default = "default_service_name")]
    pub service_name: String,

    /// Database URL. The in-memory store is used when absent.
    pub db_url: Option<String>,

    /// Interval between autosave snapshots of an occupied room
    #[serde(default = "default_autosave_interval_ms")]
    pub autosave_interval_ms: u64,
}

impl Config {
    /// Load configuration from environment variables or app.env file
    pub fn load() -> Result<Self, ConfigError> {
        // Try to load from app.env file first
        if std::path::Path::new("app.env").exists() {
            dotenvy::from_filename("app.env").ok();
        } else {
            // Fallback to .env file
            dotenvy::dotenv().ok();
        }

        match envy::from_env::<Config>() {
            Ok(config) => {
                info!("✅ Configuration loaded successfully");
                Ok(config)
            }
            Err(e) => {
                error!("❌ Failed to load configuration: {}", e);
                Err(ConfigError::EnvError(e))
            }
        }
    }

    /// Get the full server address
    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn autosave_interval(&self) -> Duration {
        Duration::from_millis(self.autosave_interval_ms.max(1))
    }

    pub fn allowed_origins(&self) -> Vec<String> {
        match &self.cors_origins {
            Some(origins) => origins
                .split(',')
                .map(|o| o.trim().trim_end_matches('/').to_string())
                .filter(|o| !o.is_empty())
                .collect(),
            None => vec![default_client_origin()],
        }
    }

    pub fn allows_any_origin(&self) -> bool {
        self.allowed_origins().iter().any(|o| o == "*")
    }

    pub fn is_origin_allowed(&self, origin: &str) -> bool {
        let origin = origin.trim_end_matches('/');
        self.allowed_origins().iter().any(|o| o == "*" || o == origin)
    }

    /// Check if running in development mode
    pub fn is_development(&self) -> bool {
        self.environment.to_lowercase() == "dev" || self.environment.to_lowercase() == "development"
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            environment: default_environment(),
            log_level: default_log_level(),
            cors_origins: None,
            service_name: default_service_name(),
            db_url: None,
            autosave_interval_ms: default_autosave_interval_ms(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Environment variable error: {0}")]
    EnvError(#[from] envy::Error),
}

// Default value functions
fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    4000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_service_name() -> String {
    "notes-collab".to_string()
}

fn default_environment() -> String {
    "development".to_string()
}

fn default_autosave_interval_ms() -> u64 {
    5000
}

fn default_client_origin() -> String {
    "http://localhost:5173".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from_pairs(pairs: &[(&str, &str)]) -> Config {
        envy::from_iter(pairs.iter().map(|(k, v)| (k.to_string(), v.to_string()))).unwrap()
    }

    #[test]
    fn defaults_apply_when_env_is_empty() {
        let config = from_pairs(&[]);
        assert_eq!(config.port, 4000);
        assert_eq!(config.autosave_interval(), Duration::from_millis(5000));
        assert_eq!(config.allowed_origins(), vec!["http://localhost:5173".to_string()]);
        assert!(config.db_url.is_none());
        assert!(config.is_development());
    }

    #[test]
    fn env_overrides_are_read() {
        let config = from_pairs(&[
            ("PORT", "8080"),
            ("AUTOSAVE_INTERVAL_MS", "250"),
            ("CORS_ORIGINS", "https://notes.example.com/, http://localhost:5173"),
        ]);
        assert_eq!(config.server_address(), "0.0.0.0:8080");
        assert_eq!(config.autosave_interval(), Duration::from_millis(250));
        assert!(config.is_origin_allowed("https://notes.example.com"));
        assert!(!config.is_origin_allowed("https://evil.example.com"));
        assert!(!config.allows_any_origin());
    }

    #[test]
    fn malformed_values_are_reported() {
        let err: ConfigError = envy::from_iter::<_, Config>(vec![("PORT".to_string(), "not-a-port".to_string())])
            .unwrap_err()
            .into();
        assert!(err.to_string().starts_with("Environment variable error:"));
    }

    #[test]
    fn wildcard_allows_everyone() {
        let config = from_pairs(&[("CORS_ORIGINS", "*")]);
        assert!(config.allows_any_origin());
        assert!(config.is_origin_allowed("https://anywhere.example"));
    }
}
