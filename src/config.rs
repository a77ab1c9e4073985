//! Configuration module for environment variables and application settings

use std::env;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Result, anyhow};

const DEFAULT_PORT: u16 = 3001;
const DEFAULT_FRONTEND_URL: &str = "http://localhost:5173";
const DEFAULT_API_URL: &str = "http://localhost:3001";
const DEV_JWT_SECRET: &str = "clinica_dev_secret";
const DEFAULT_TOKEN_TTL_HOURS: i64 = 24;
const DEFAULT_POLL_INTERVAL_SECS: u64 = 30;

/// Deployment environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Development,
    Production,
    Test,
}

impl Environment {
    fn parse(value: &str) -> Result<Self> {
        match value.trim().to_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "production" | "prod" => Ok(Self::Production),
            "test" => Ok(Self::Test),
            other => Err(anyhow!("unknown environment '{other}'")),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
            Self::Test => "test",
        }
    }

    pub fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,

    /// Frontend origin, reported at startup
    pub frontend_url: String,

    pub environment: Environment,

    pub auth: AuthConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
}

// Keeps the secret out of logs.
impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"<redacted>")
            .field("token_ttl_hours", &self.token_ttl_hours)
            .finish()
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = match lookup("APP_ENV").or_else(|| lookup("NODE_ENV")) {
            Some(value) => Environment::parse(&value)?,
            None => Environment::default(),
        };

        let jwt_secret = match lookup("JWT_SECRET") {
            Some(secret) if !secret.trim().is_empty() => secret,
            _ if environment == Environment::Production => {
                return Err(anyhow!("JWT_SECRET environment variable is required in production"));
            }
            _ => DEV_JWT_SECRET.to_string(),
        };

        Ok(Self {
            server: ServerConfig {
                host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                port: parse_or(lookup("PORT"), DEFAULT_PORT, "PORT")?,
            },
            frontend_url: lookup("FRONTEND_URL")
                .unwrap_or_else(|| DEFAULT_FRONTEND_URL.to_string()),
            environment,
            auth: AuthConfig {
                jwt_secret,
                token_ttl_hours: parse_or(
                    lookup("TOKEN_TTL_HOURS"),
                    DEFAULT_TOKEN_TTL_HOURS,
                    "TOKEN_TTL_HOURS",
                )?,
            },
        })
    }
}

/// Client configuration used by the `clinica` CLI
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_url: String,
    pub session_file: PathBuf,
    pub poll_interval: Duration,
}

impl ClientConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let session_file = match lookup("CLINICA_SESSION_FILE") {
            Some(path) => PathBuf::from(path),
            None => default_session_file(),
        };

        Ok(Self {
            api_url: lookup("API_URL")
                .or_else(|| lookup("VITE_API_URL"))
                .unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            session_file,
            poll_interval: Duration::from_secs(parse_or(
                lookup("AUTH_POLL_INTERVAL_SECS"),
                DEFAULT_POLL_INTERVAL_SECS,
                "AUTH_POLL_INTERVAL_SECS",
            )?),
        })
    }
}

fn default_session_file() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("clinica")
        .join("session.json")
}

fn parse_or<T>(value: Option<String>, default: T, name: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: fmt::Display,
{
    match value {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow!("invalid value for {name} ('{raw}'): {e}")),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> + use<> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn server_defaults() {
        let config = Config::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.server.port, 3001);
        assert_eq!(config.frontend_url, "http://localhost:5173");
        assert_eq!(config.environment, Environment::Development);
        assert_eq!(config.auth.token_ttl_hours, 24);
        assert_eq!(config.auth.jwt_secret, DEV_JWT_SECRET);
    }

    #[test]
    fn node_env_is_honoured_when_app_env_is_absent() {
        let config = Config::from_lookup(lookup_from(&[
            ("NODE_ENV", "test"),
            ("PORT", "8080"),
        ]))
        .unwrap();
        assert_eq!(config.environment, Environment::Test);
        assert_eq!(config.server.port, 8080);

        let config = Config::from_lookup(lookup_from(&[
            ("APP_ENV", "development"),
            ("NODE_ENV", "test"),
        ]))
        .unwrap();
        assert_eq!(config.environment, Environment::Development);
    }

    #[test]
    fn production_requires_a_jwt_secret() {
        let err = Config::from_lookup(lookup_from(&[("APP_ENV", "production")])).unwrap_err();
        assert!(err.to_string().contains("JWT_SECRET"));

        let config = Config::from_lookup(lookup_from(&[
            ("APP_ENV", "production"),
            ("JWT_SECRET", "s3cret"),
        ]))
        .unwrap();
        assert_eq!(config.auth.jwt_secret, "s3cret");
    }

    #[test]
    fn malformed_port_is_an_error() {
        let err = Config::from_lookup(lookup_from(&[("PORT", "abc")])).unwrap_err();
        assert!(err.to_string().contains("PORT"));
    }

    #[test]
    fn client_prefers_api_url_over_vite_api_url() {
        let config = ClientConfig::from_lookup(lookup_from(&[
            ("VITE_API_URL", "http://vite:3001"),
            ("CLINICA_SESSION_FILE", "/tmp/session.json"),
        ]))
        .unwrap();
        assert_eq!(config.api_url, "http://vite:3001");
        assert_eq!(config.session_file, PathBuf::from("/tmp/session.json"));
        assert_eq!(config.poll_interval, Duration::from_secs(30));

        let config = ClientConfig::from_lookup(lookup_from(&[
            ("API_URL", "http://api:9000"),
            ("VITE_API_URL", "http://vite:3001"),
        ]))
        .unwrap();
        assert_eq!(config.api_url, "http://api:9000");
    }

    #[test]
    fn auth_config_debug_redacts_secret() {
        let auth = AuthConfig { jwt_secret: "topsecret".into(), token_ttl_hours: 1 };
        assert!(!format!("{auth:?}").contains("topsecret"));
    }
}
