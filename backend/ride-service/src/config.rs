use crate::error::AppError;
use dotenvy::dotenv;
use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub websocket: WebSocketConfig,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    /// Public frontend URL used to build e-mail confirmation links
    pub public_url: String,
    /// Offset applied to UTC to obtain the naive local time routes are stored in
    pub utc_offset_hours: i64,
}

#[derive(Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub acquire_timeout_secs: u64,
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("url", &"[REDACTED]")
            .field("max_connections", &self.max_connections)
            .field("acquire_timeout_secs", &self.acquire_timeout_secs)
            .finish()
    }
}

#[derive(Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_ttl_minutes: i64,
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"[REDACTED]")
            .field("token_ttl_minutes", &self.token_ttl_minutes)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct WebSocketConfig {
    /// Bounded per-connection outbox; pushes beyond it are dropped
    pub outbox_capacity: usize,
    pub heartbeat_interval_secs: u64,
    pub client_timeout_secs: u64,
}

impl WebSocketConfig {
    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_secs(self.heartbeat_interval_secs)
    }

    pub fn client_timeout(&self) -> Duration {
        Duration::from_secs(self.client_timeout_secs)
    }
}

impl Default for WebSocketConfig {
    fn default() -> Self {
        Self {
            outbox_capacity: 32,
            heartbeat_interval_secs: 5,
            client_timeout_secs: 30,
        }
    }
}

fn required(key: &str) -> Result<String, AppError> {
    env::var(key).map_err(|_| AppError::Config(format!("{key} missing")))
}

fn parsed_or<T: FromStr>(key: &str, default: T) -> Result<T, AppError> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| AppError::Config(format!("{key} has an invalid value: {raw}"))),
        Err(_) => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        dotenv().ok();

        let websocket = WebSocketConfig {
            outbox_capacity: parsed_or("WS_OUTBOX_CAPACITY", 32usize)?,
            heartbeat_interval_secs: parsed_or("WS_HEARTBEAT_INTERVAL_SECS", 5u64)?,
            client_timeout_secs: parsed_or("WS_CLIENT_TIMEOUT_SECS", 30u64)?,
        };
        if websocket.outbox_capacity == 0 {
            return Err(AppError::Config(
                "WS_OUTBOX_CAPACITY must be greater than zero".into(),
            ));
        }

        Ok(Config {
            app: AppConfig {
                port: parsed_or("APP_PORT", 8000u16)?,
                public_url: env::var("APP_URL")
                    .unwrap_or_else(|_| "http://localhost:8080".to_string()),
                utc_offset_hours: parsed_or("LOCAL_UTC_OFFSET_HOURS", 3i64)?,
            },
            database: DatabaseConfig {
                url: required("DATABASE_URL")?,
                max_connections: parsed_or("DB_MAX_CONNECTIONS", 10u32)?,
                acquire_timeout_secs: parsed_or("DB_ACQUIRE_TIMEOUT_SECS", 10u64)?,
            },
            auth: AuthConfig {
                jwt_secret: required("JWT_SECRET")?,
                token_ttl_minutes: parsed_or("ACCESS_TOKEN_EXPIRE_MINUTES", 120i64)?,
            },
            websocket,
        })
    }
}
