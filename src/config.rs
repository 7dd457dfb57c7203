use anyhow::{Context, Result};
use serde::Deserialize;
use std::env;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub app: AppConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: IpAddr,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub name: String,
    pub environment: Environment,
    pub static_dir: String,
    /// Directory of `.ftl` overrides layered over the embedded messages.
    pub locales_dir: Option<String>,
    /// Buffer of the live notification broadcast channel.
    pub live_channel_capacity: usize,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key lookup, e.g. a map in tests.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup("SERVER_HOST")
            .unwrap_or_else(|| "0.0.0.0".to_string())
            .parse::<IpAddr>()
            .context("Failed to parse SERVER_HOST")?;

        let port = lookup("SERVER_PORT")
            .unwrap_or_else(|| "8000".to_string())
            .parse::<u16>()
            .context("Failed to parse SERVER_PORT")?;

        let db_url = lookup("DATABASE_URL").context("DATABASE_URL must be set")?;
        let db_max_connections = match lookup("DATABASE_MAX_CONNECTIONS") {
            Some(val) => val.parse().context("Failed to parse DATABASE_MAX_CONNECTIONS")?,
            None => 10,
        };
        let db_min_connections = match lookup("DATABASE_MIN_CONNECTIONS") {
            Some(val) => val.parse().context("Failed to parse DATABASE_MIN_CONNECTIONS")?,
            None => 1,
        };
        if db_min_connections > db_max_connections {
            anyhow::bail!("DATABASE_MIN_CONNECTIONS exceeds DATABASE_MAX_CONNECTIONS");
        }

        let environment = match lookup("APP_ENVIRONMENT") {
            Some(val) => val
                .parse::<Environment>()
                .map_err(anyhow::Error::msg)
                .context("Failed to parse APP_ENVIRONMENT")?,
            None => Environment::Development,
        };

        let app_name = lookup("APP_NAME").unwrap_or_else(|| "School Backend".to_string());
        let static_dir = lookup("STATIC_DIR").unwrap_or_else(|| "static".to_string());
        let locales_dir = lookup("LOCALES_DIR").filter(|dir| !dir.trim().is_empty());
        let live_channel_capacity = match lookup("LIVE_CHANNEL_CAPACITY") {
            Some(val) => val.parse().context("Failed to parse LIVE_CHANNEL_CAPACITY")?,
            None => 256,
        };
        if live_channel_capacity == 0 {
            anyhow::bail!("LIVE_CHANNEL_CAPACITY must be positive");
        }

        Ok(Config {
            server: ServerConfig { host, port },
            database: DatabaseConfig {
                url: db_url,
                max_connections: db_max_connections,
                min_connections: db_min_connections,
            },
            app: AppConfig {
                name: app_name,
                environment,
                static_dir,
                locales_dir,
                live_channel_capacity,
            },
        })
    }

    pub fn server_addr(&self) -> SocketAddr {
        SocketAddr::new(self.server.host, self.server.port)
    }

    pub fn is_production(&self) -> bool {
        self.app.environment == Environment::Production
    }
}

impl Environment {
    pub fn as_str(self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Staging => "staging",
            Environment::Production => "production",
        }
    }
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "production" => Ok(Environment::Production),
            "staging" => Ok(Environment::Staging),
            "development" => Ok(Environment::Development),
            _ => Err(format!("Unknown environment: {}", s)),
        }
    }
}

// Global config, initialized once at startup
use once_cell::sync::OnceCell;

static CONFIG: OnceCell<Config> = OnceCell::new();

pub fn init() -> Result<&'static Config> {
    CONFIG.get_or_try_init(Config::from_env)
}

pub fn get() -> Option<&'static Config> {
    CONFIG.get()
}
