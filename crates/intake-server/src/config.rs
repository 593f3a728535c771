//! Configuration management
//!
//! Everything is read from the environment (optionally seeded from a `.env`
//! file) and validated once at startup.

use crate::store::object::config::ObjectStoreConfig;
use crate::store::StoreBackend;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

// ============================================================================
// Defaults
// ============================================================================

pub const DEFAULT_SERVER_HOST: &str = "127.0.0.1";

pub const DEFAULT_SERVER_PORT: u16 = 8000;

pub const DEFAULT_SHUTDOWN_TIMEOUT_SECS: u64 = 30;

/// Base of the questionnaire links handed to respondents.
pub const DEFAULT_PUBLIC_BASE_URL: &str = "http://localhost:3000";

/// Upper bound on any single storage call.
pub const DEFAULT_STORE_TIMEOUT_SECS: u64 = 10;

pub const DEFAULT_DATABASE_URL: &str = "postgresql://localhost/intake";

pub const DEFAULT_DATABASE_MAX_CONNECTIONS: u32 = 10;

pub const DEFAULT_DATABASE_MIN_CONNECTIONS: u32 = 2;

pub const DEFAULT_DATABASE_CONNECT_TIMEOUT_SECS: u64 = 10;

/// 10 minutes
pub const DEFAULT_DATABASE_IDLE_TIMEOUT_SECS: u64 = 600;

pub const DEFAULT_CORS_ALLOWED_ORIGIN: &str = "http://localhost:3000";

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub invitations: InvitationConfig,
    pub store: StoreConfig,
    pub database: DatabaseConfig,
    pub object_store: ObjectStoreConfig,
    pub cors: CorsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub shutdown_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvitationConfig {
    /// Links are built as `{public_base_url}/questionnaire/{token}`
    pub public_base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(with = "backend_name")]
    pub backend: StoreBackend,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout_secs: u64,
    pub idle_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
    pub allow_credentials: bool,
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}

impl Config {
    /// Load configuration from environment and defaults
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let backend = match std::env::var("INTAKE_STORE_BACKEND") {
            Ok(name) => name.parse()?,
            Err(_) => StoreBackend::default(),
        };

        let config = Config {
            server: ServerConfig {
                host: std::env::var("INTAKE_HOST")
                    .unwrap_or_else(|_| DEFAULT_SERVER_HOST.to_string()),
                port: env_or("INTAKE_PORT", DEFAULT_SERVER_PORT),
                shutdown_timeout_secs: env_or(
                    "INTAKE_SHUTDOWN_TIMEOUT",
                    DEFAULT_SHUTDOWN_TIMEOUT_SECS,
                ),
            },
            invitations: InvitationConfig {
                public_base_url: std::env::var("INTAKE_PUBLIC_BASE_URL")
                    .unwrap_or_else(|_| DEFAULT_PUBLIC_BASE_URL.to_string()),
            },
            store: StoreConfig {
                backend,
                timeout_secs: env_or("INTAKE_STORE_TIMEOUT", DEFAULT_STORE_TIMEOUT_SECS),
            },
            database: DatabaseConfig {
                url: std::env::var("DATABASE_URL")
                    .unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string()),
                max_connections: env_or(
                    "DATABASE_MAX_CONNECTIONS",
                    DEFAULT_DATABASE_MAX_CONNECTIONS,
                ),
                min_connections: env_or(
                    "DATABASE_MIN_CONNECTIONS",
                    DEFAULT_DATABASE_MIN_CONNECTIONS,
                ),
                connect_timeout_secs: env_or(
                    "DATABASE_CONNECT_TIMEOUT",
                    DEFAULT_DATABASE_CONNECT_TIMEOUT_SECS,
                ),
                idle_timeout_secs: env_or(
                    "DATABASE_IDLE_TIMEOUT",
                    DEFAULT_DATABASE_IDLE_TIMEOUT_SECS,
                ),
            },
            object_store: ObjectStoreConfig::from_env(),
            cors: CorsConfig {
                allowed_origins: std::env::var("CORS_ALLOWED_ORIGINS")
                    .unwrap_or_else(|_| DEFAULT_CORS_ALLOWED_ORIGIN.to_string())
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
                allow_credentials: env_or("CORS_ALLOW_CREDENTIALS", true),
            },
        };

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.server.port == 0 {
            anyhow::bail!("Server port must be greater than 0");
        }

        let base = &self.invitations.public_base_url;
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            anyhow::bail!(
                "INTAKE_PUBLIC_BASE_URL must start with http:// or https://, got '{}'",
                base
            );
        }

        if self.store.timeout_secs == 0 {
            anyhow::bail!("Store timeout must be greater than 0");
        }

        match self.store.backend {
            StoreBackend::Postgres => {
                if self.database.url.is_empty() {
                    anyhow::bail!("Database URL cannot be empty");
                }
                if self.database.max_connections == 0 {
                    anyhow::bail!("Database max_connections must be greater than 0");
                }
                if self.database.min_connections > self.database.max_connections {
                    anyhow::bail!(
                        "Database min_connections ({}) cannot be greater than max_connections ({})",
                        self.database.min_connections,
                        self.database.max_connections
                    );
                }
            }
            StoreBackend::Object => {
                if self.object_store.bucket.is_empty() {
                    anyhow::bail!("S3 bucket cannot be empty");
                }
            }
            StoreBackend::Memory => {
                tracing::warn!("Using the in-memory store: records are lost on restart");
            }
        }

        if self.cors.allowed_origins.is_empty() {
            tracing::warn!("No CORS origins configured - all origins will be allowed");
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: DEFAULT_SERVER_HOST.to_string(),
                port: DEFAULT_SERVER_PORT,
                shutdown_timeout_secs: DEFAULT_SHUTDOWN_TIMEOUT_SECS,
            },
            invitations: InvitationConfig {
                public_base_url: DEFAULT_PUBLIC_BASE_URL.to_string(),
            },
            store: StoreConfig {
                backend: StoreBackend::default(),
                timeout_secs: DEFAULT_STORE_TIMEOUT_SECS,
            },
            database: DatabaseConfig {
                url: DEFAULT_DATABASE_URL.to_string(),
                max_connections: DEFAULT_DATABASE_MAX_CONNECTIONS,
                min_connections: DEFAULT_DATABASE_MIN_CONNECTIONS,
                connect_timeout_secs: DEFAULT_DATABASE_CONNECT_TIMEOUT_SECS,
                idle_timeout_secs: DEFAULT_DATABASE_IDLE_TIMEOUT_SECS,
            },
            object_store: ObjectStoreConfig::default(),
            cors: CorsConfig {
                allowed_origins: vec![DEFAULT_CORS_ALLOWED_ORIGIN.to_string()],
                allow_credentials: true,
            },
        }
    }
}

mod backend_name {
    use crate::store::StoreBackend;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(backend: &StoreBackend, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(backend)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<StoreBackend, D::Error> {
        let name = String::deserialize(d)?;
        name.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serial_test::serial;

    const VARS: [&str; 8] = [
        "INTAKE_HOST",
        "INTAKE_PORT",
        "INTAKE_PUBLIC_BASE_URL",
        "INTAKE_STORE_BACKEND",
        "INTAKE_STORE_TIMEOUT",
        "DATABASE_URL",
        "S3_BUCKET",
        "CORS_ALLOWED_ORIGINS",
    ];

    fn clear_env() {
        for var in VARS {
            std::env::remove_var(var);
        }
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.store.backend, StoreBackend::Postgres);
        assert_eq!(config.store.timeout_secs, 10);
    }

    #[test]
    #[serial]
    fn test_load_reads_environment() {
        clear_env();
        std::env::set_var("INTAKE_PORT", "9100");
        std::env::set_var("INTAKE_STORE_BACKEND", "memory");
        std::env::set_var("INTAKE_PUBLIC_BASE_URL", "https://apply.example.org");
        std::env::set_var("CORS_ALLOWED_ORIGINS", "https://a.example, https://b.example");

        let config = Config::load().unwrap();
        assert_eq!(config.server.port, 9100);
        assert_eq!(config.store.backend, StoreBackend::Memory);
        assert_eq!(config.invitations.public_base_url, "https://apply.example.org");
        assert_eq!(
            config.cors.allowed_origins,
            vec!["https://a.example", "https://b.example"]
        );

        clear_env();
    }

    #[test]
    #[serial]
    fn test_unknown_backend_fails_loudly() {
        clear_env();
        std::env::set_var("INTAKE_STORE_BACKEND", "mongo");
        assert!(Config::load().is_err());
        clear_env();
    }

    #[test]
    fn test_validation_failures() {
        let mut config = Config::default();
        config.invitations.public_base_url = "apply.example.org".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.database.min_connections = 50;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.store.timeout_secs = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.store.backend = StoreBackend::Object;
        config.object_store.bucket.clear();
        assert!(config.validate().is_err());

        // Database settings are irrelevant to the object backend
        config.object_store.bucket = "intake".to_string();
        config.database.url.clear();
        assert!(config.validate().is_ok());
    }
}
