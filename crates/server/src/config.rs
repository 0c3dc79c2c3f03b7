use shared_types::{AppConfig, FeatureFlags};
use std::str::FromStr;
use std::sync::OnceLock;

static FLAGS: OnceLock<FeatureFlags> = OnceLock::new();

/// Path to the config file, relative to the project root.
const CONFIG_PATH: &str = "config.toml";

const DEFAULT_PORT: u16 = 5000;
const DEFAULT_BIND_ADDR: &str = "0.0.0.0";
const DEFAULT_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_JWT_EXPIRY_MINUTES: i64 = 24 * 60;
const DEFAULT_RATE_LIMIT_MAX: u32 = 20;
const DEFAULT_RATE_LIMIT_WINDOW_SECS: u64 = 60;
/// One year.
const MAX_JWT_EXPIRY_MINUTES: i64 = 525_600;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{key} has an invalid value: {value}")]
    Invalid { key: &'static str, value: String },
}

/// Where todos and accounts are persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "pg" => Ok(StoreBackend::Postgres),
            "memory" | "mem" => Ok(StoreBackend::Memory),
            _ => Err(()),
        }
    }
}

/// Process configuration read from the environment (and `.env`).
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub store_backend: StoreBackend,
    pub database_url: Option<String>,
    pub max_connections: u32,
    pub bind_addr: String,
    pub port: u16,
    pub jwt_secret: String,
    pub jwt_expiry_minutes: i64,
    pub rate_limit_max: u32,
    pub rate_limit_window_secs: u64,
    /// Rate-limit on proxy-reported client addresses instead of the peer.
    pub trust_proxy: bool,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let store_backend = match get("STORE_BACKEND") {
            Some(raw) => raw.parse().map_err(|_| ConfigError::Invalid {
                key: "STORE_BACKEND",
                value: raw,
            })?,
            None => StoreBackend::Postgres,
        };

        let database_url = get("DATABASE_URL");
        if store_backend == StoreBackend::Postgres && database_url.is_none() {
            return Err(ConfigError::Missing("DATABASE_URL"));
        }

        let jwt_secret = get("JWT_SECRET").ok_or(ConfigError::Missing("JWT_SECRET"))?;

        let jwt_expiry_minutes = parse_or(
            "JWT_EXPIRY_MINUTES",
            get("JWT_EXPIRY_MINUTES"),
            DEFAULT_JWT_EXPIRY_MINUTES,
        )?;
        if !(1..=MAX_JWT_EXPIRY_MINUTES).contains(&jwt_expiry_minutes) {
            return Err(ConfigError::Invalid {
                key: "JWT_EXPIRY_MINUTES",
                value: jwt_expiry_minutes.to_string(),
            });
        }

        Ok(Self {
            store_backend,
            database_url,
            max_connections: parse_or(
                "DATABASE_MAX_CONNECTIONS",
                get("DATABASE_MAX_CONNECTIONS"),
                DEFAULT_MAX_CONNECTIONS,
            )?,
            bind_addr: get("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            port: parse_or("PORT", get("PORT"), DEFAULT_PORT)?,
            jwt_secret,
            jwt_expiry_minutes,
            rate_limit_max: parse_or("RATE_LIMIT_MAX", get("RATE_LIMIT_MAX"), DEFAULT_RATE_LIMIT_MAX)?,
            rate_limit_window_secs: parse_or(
                "RATE_LIMIT_WINDOW_SECS",
                get("RATE_LIMIT_WINDOW_SECS"),
                DEFAULT_RATE_LIMIT_WINDOW_SECS,
            )?,
            trust_proxy: parse_or("TRUST_PROXY", get("TRUST_PROXY"), false)?,
        })
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }
}

fn parse_or<T: FromStr>(key: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError> {
    match raw {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
        None => Ok(default),
    }
}

/// Read `config.toml`, parse feature flags, and store them in the global
/// `OnceLock`. Only the first call has effect.
///
/// A missing or unparseable file yields the default flags.
pub fn load_feature_flags() -> &'static FeatureFlags {
    FLAGS.get_or_init(|| match std::fs::read_to_string(CONFIG_PATH) {
        Ok(contents) => match toml::from_str::<AppConfig>(&contents) {
            Ok(config) => {
                tracing::info!(flags = ?config.features, "Loaded feature flags");
                config.features
            }
            Err(e) => {
                tracing::warn!(path = CONFIG_PATH, error = %e, "Failed to parse config, using default flags");
                FeatureFlags::default()
            }
        },
        Err(e) => {
            tracing::info!(path = CONFIG_PATH, error = %e, "No config file, using default flags");
            FeatureFlags::default()
        }
    })
}
