use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;

use crate::error::ReviewError;

pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub database_url: String,
    pub server_host: String,
    pub server_port: u16,
    pub server_id: String,
    pub cors: CorsConfig,
    pub auth: AuthConfig,
    pub audit: AuditConfig,
    pub simulation: SimulationConfig,
    pub client: ClientConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CorsConfig {
    /// `*` (or an empty list) permits every origin.
    pub allowed_origins: Vec<String>,
    pub max_age_secs: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthMode {
    /// Bearer tokens are looked up in the local `sessions` table.
    Database,
    /// Bearer tokens are verified by the hosted auth backend.
    Remote,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub mode: AuthMode,
    pub url: Option<String>,
    pub anon_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    pub enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub sentinel_user_id: String,
    pub delay_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub gateway_url: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite://proposal-review.db?mode=rwc".to_string(),
            server_host: "0.0.0.0".to_string(),
            server_port: 3000,
            server_id: "review-01".to_string(),
            cors: CorsConfig::default(),
            auth: AuthConfig::default(),
            audit: AuditConfig::default(),
            simulation: SimulationConfig::default(),
            client: ClientConfig::default(),
        }
    }
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            // TODO: restrict to the deployed frontend origin before production
            allowed_origins: vec!["*".to_string()],
            max_age_secs: 3600,
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            mode: AuthMode::Database,
            url: None,
            anon_key: None,
        }
    }
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            sentinel_user_id: "dev-admin-id".to_string(),
            delay_ms: 800,
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            gateway_url: "http://127.0.0.1:3000/functions/v1/submit-vote".to_string(),
        }
    }
}

impl AppConfig {
    /// Defaults, then the config file named by `REVIEW_CONFIG` (or
    /// `config.toml` if present), then `REVIEW_*` environment variables.
    pub fn load() -> Result<Self, ReviewError> {
        let path = env::var("REVIEW_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        let explicit = env::var("REVIEW_CONFIG").is_ok();

        let builder = config::Config::builder()
            .add_source(config::File::from(Path::new(&path)).required(explicit))
            .add_source(Self::environment());

        Self::build(builder)
    }

    /// Load from a single file, ignoring the environment.
    pub fn from_file(path: &Path) -> Result<Self, ReviewError> {
        let builder = config::Config::builder().add_source(config::File::from(path));
        Self::build(builder)
    }

    fn environment() -> config::Environment {
        config::Environment::with_prefix("REVIEW")
            .prefix_separator("_")
            .separator("__")
            .list_separator(",")
            .with_list_parse_key("cors.allowed_origins")
            .try_parsing(true)
    }

    fn build(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<Self, ReviewError> {
        let config: AppConfig = builder
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(|e| ReviewError::ConfigError(format!("Failed to load configuration: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ReviewError> {
        if self.auth.mode == AuthMode::Remote && self.auth.url.is_none() {
            return Err(ReviewError::ConfigError(
                "auth.url is required when auth.mode = \"remote\"".to_string(),
            ));
        }
        if self.simulation.sentinel_user_id.trim().is_empty() {
            return Err(ReviewError::ConfigError(
                "simulation.sentinel_user_id must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }

    pub fn allows_any_origin(&self) -> bool {
        self.cors.allowed_origins.is_empty()
            || self.cors.allowed_origins.iter().any(|o| o.trim() == "*")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.server_port, 3000);
        assert_eq!(config.auth.mode, AuthMode::Database);
        assert!(config.audit.enabled);
        assert!(config.allows_any_origin());
        assert_eq!(config.simulation.sentinel_user_id, "dev-admin-id");
        assert_eq!(config.simulation.delay_ms, 800);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_file_overrides_sections() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
server_port = 8088
database_url = "sqlite::memory:"

[cors]
allowed_origins = ["https://review.example.org"]

[auth]
mode = "remote"
url = "https://auth.example.org"
anon_key = "anon"

[simulation]
delay_ms = 10
"#
        )
        .unwrap();

        let config = AppConfig::from_file(file.path()).unwrap();
        assert_eq!(config.server_port, 8088);
        assert_eq!(config.database_url, "sqlite::memory:");
        assert_eq!(config.auth.mode, AuthMode::Remote);
        assert_eq!(config.auth.url.as_deref(), Some("https://auth.example.org"));
        assert!(!config.allows_any_origin());
        assert_eq!(config.simulation.delay_ms, 10);
        // untouched sections keep their defaults
        assert_eq!(config.simulation.sentinel_user_id, "dev-admin-id");
        assert_eq!(config.server_host, "0.0.0.0");
    }

    #[test]
    fn test_remote_mode_requires_url() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[auth]\nmode = \"remote\"").unwrap();

        let err = AppConfig::from_file(file.path()).unwrap_err();
        assert!(matches!(err, ReviewError::ConfigError(_)));
    }
}
