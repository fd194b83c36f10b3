use std::env;
use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;

use crate::retry::RetryPolicy;

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8080";
const DEV_ADMIN_TOKEN: &str = "dev-admin-token";

/// Application runtime environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
    Test,
}

impl Environment {
    fn parse(value: &str) -> Result<Self, ConfigError> {
        match value {
            "development" | "dev" => Ok(Self::Development),
            "production" | "prod" => Ok(Self::Production),
            "test" => Ok(Self::Test),
            other => Err(ConfigError::InvalidEnvironment(other.to_string())),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
            Self::Test => "test",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Json,
}

/// Runtime configuration resolved from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub environment: Environment,
    pub admin_token: String,
    /// Mailbox size of each resource actor.
    pub actor_buffer: usize,
    pub retry: RetryPolicy,
    pub log_format: LogFormat,
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("APP_ENV must be one of 'development', 'production', or 'test' (got {0})")]
    InvalidEnvironment(String),
    #[error("invalid APP_BIND_ADDR value: {0}")]
    BindAddress(String),
    #[error("ADMIN_TOKEN must be set in production")]
    MissingAdminToken,
    #[error("invalid {name} value: {value}")]
    InvalidNumber { name: &'static str, value: String },
    #[error("LOG_FORMAT must be 'compact' or 'json' (got {0})")]
    InvalidLogFormat(String),
}

fn parse_number<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidNumber { name, value }),
        Err(_) => Ok(default),
    }
}

impl AppConfig {
    /// Reads and validates the environment. Call `dotenvy::dotenv()` first to
    /// pick up a local `.env`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let env_value = env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());
        let environment = Environment::parse(&env_value)?;

        let bind_value = env::var("APP_BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_value
            .parse()
            .map_err(|_| ConfigError::BindAddress(bind_value.clone()))?;

        let admin_token = match env::var("ADMIN_TOKEN") {
            Ok(token) if !token.trim().is_empty() => token,
            _ if environment == Environment::Production => return Err(ConfigError::MissingAdminToken),
            _ => DEV_ADMIN_TOKEN.to_string(),
        };

        let actor_buffer = parse_number("ACTOR_BUFFER", 32usize)?;
        if actor_buffer == 0 {
            return Err(ConfigError::InvalidNumber { name: "ACTOR_BUFFER", value: "0".to_string() });
        }
        let max_attempts = parse_number("RETRY_MAX_ATTEMPTS", 3u32)?.max(1);
        let base_delay_ms = parse_number("RETRY_BASE_DELAY_MS", 50u64)?;

        let log_format = match env::var("LOG_FORMAT").as_deref() {
            Err(_) | Ok("compact") => LogFormat::Compact,
            Ok("json") => LogFormat::Json,
            Ok(other) => return Err(ConfigError::InvalidLogFormat(other.to_string())),
        };

        Ok(Self {
            bind_addr,
            environment,
            admin_token,
            actor_buffer,
            retry: RetryPolicy {
                max_attempts,
                base_delay: Duration::from_millis(base_delay_ms),
                ..RetryPolicy::default()
            },
            log_format,
        })
    }

    /// Configuration for in-process tests: no retries, fixed admin token.
    #[cfg(test)]
    pub fn for_tests() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            environment: Environment::Test,
            admin_token: DEV_ADMIN_TOKEN.to_string(),
            actor_buffer: 32,
            retry: RetryPolicy::no_retry(),
            log_format: LogFormat::Compact,
        }
    }
}
