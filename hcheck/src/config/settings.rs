use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_CONFIG_FILE: &str = "hcheck.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub health: HealthConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Where the health endpoint is mounted and how long a single evaluation may take.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthConfig {
    pub prefix: String,
    pub endpoint: String,
    pub timeout_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            prefix: String::new(),
            endpoint: "/_hcheck".to_string(),
            timeout_ms: 5000,
        }
    }
}

impl HealthConfig {
    pub fn path(&self) -> String {
        format!("{}{}", self.prefix, self.endpoint)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.endpoint.starts_with('/') {
            return Err(ConfigError::Message(format!(
                "Health endpoint must start with '/': {:?}",
                self.endpoint
            )));
        }

        if !self.prefix.is_empty() && (!self.prefix.starts_with('/') || self.prefix.ends_with('/')) {
            return Err(ConfigError::Message(format!(
                "Health prefix must start with '/' and must not end with '/': {:?}",
                self.prefix
            )));
        }

        // axum reads ':' and '*' as captures, so the route would not be exact.
        if self.path().contains(|c: char| c == ':' || c == '*') {
            return Err(ConfigError::Message(format!(
                "Health path must not contain ':' or '*': {:?}",
                self.path()
            )));
        }

        if self.timeout_ms == 0 {
            return Err(ConfigError::Message(
                "Health timeout must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(Path::new(DEFAULT_CONFIG_FILE))
    }

    /// Defaults, then `path` if it exists, then `HCHECK_*` environment variables.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            .add_source(Config::try_from(&AppConfig::default())?);

        if path.exists() {
            builder = builder.add_source(File::from(path));
        }

        builder = builder.add_source(
            Environment::with_prefix("HCHECK")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        let app_config: AppConfig = config.try_deserialize()?;

        app_config.validate()?;

        Ok(app_config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Message("Server port cannot be 0".to_string()));
        }

        if self.server.host.is_empty() {
            return Err(ConfigError::Message("Server host cannot be empty".to_string()));
        }

        self.health.validate()
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::Builder;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.health.prefix, "");
        assert_eq!(config.health.endpoint, "/_hcheck");
        assert_eq!(config.health.timeout(), Duration::from_secs(5));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_health_path() {
        let mut health = HealthConfig::default();
        assert_eq!(health.path(), "/_hcheck");

        health.prefix = "/internal".to_string();
        assert_eq!(health.path(), "/internal/_hcheck");
    }

    #[test]
    fn test_config_validation() {
        let mut config = AppConfig::default();
        config.server.port = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.health.endpoint = "_hcheck".to_string();
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.health.prefix = "internal".to_string();
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.health.prefix = "/internal/".to_string();
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.health.timeout_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_health_path_rejects_route_patterns() {
        let health = HealthConfig {
            endpoint: "/*rest".to_string(),
            ..HealthConfig::default()
        };
        assert!(health.validate().is_err());

        let health = HealthConfig {
            prefix: "/:tenant".to_string(),
            ..HealthConfig::default()
        };
        assert!(health.validate().is_err());

        let health = HealthConfig {
            endpoint: String::new(),
            ..HealthConfig::default()
        };
        assert!(health.validate().is_err());
    }

    #[test]
    fn test_with_timeout() {
        let health = HealthConfig::default().with_timeout(Duration::from_millis(50));
        assert_eq!(health.timeout_ms, 50);
    }

    #[test]
    fn test_bind_address() {
        let mut config = AppConfig::default();
        config.server.host = "0.0.0.0".to_string();
        config.server.port = 8080;
        assert_eq!(config.bind_address(), "0.0.0.0:8080");
    }

    #[test]
    fn test_config_loading_from_file() {
        let mut file = Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[server]\nport = 8081\n\n[health]\nprefix = \"/ops\"\ntimeout_ms = 250"
        )
        .unwrap();

        let config = AppConfig::load_from(file.path()).expect("Should load file configuration");

        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8081);
        assert_eq!(config.health.path(), "/ops/_hcheck");
        assert_eq!(config.health.timeout(), Duration::from_millis(250));
    }

    #[test]
    fn test_config_loading_rejects_invalid_file() {
        let mut file = Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[health]\nendpoint = \"no-slash\"").unwrap();

        assert!(AppConfig::load_from(file.path()).is_err());
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = AppConfig::load_from(Path::new("does-not-exist.toml"))
            .expect("Should fall back to defaults");
        assert_eq!(config.health.endpoint, "/_hcheck");
    }
}
