use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};

use crate::predictions::draw::DEFAULT_MIN_POINTS;
use crate::predictions::AlignmentPolicy;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub game: GameConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            game: GameConfig::from_env()?,
        })
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Defaults applied to scoring passes and draws.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameConfig {
    /// Week label used instead of the calendar week when set.
    pub current_week_override: Option<String>,
    pub draw_min_points: u32,
    pub reject_if_drawn: bool,
    pub alignment: AlignmentPolicy,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            current_week_override: None,
            draw_min_points: DEFAULT_MIN_POINTS,
            reject_if_drawn: false,
            alignment: AlignmentPolicy::Strict,
        }
    }
}

impl GameConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let current_week_override = env::var("CURRENT_WEEK_ID")
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty());

        let draw_min_points = match env::var("DRAW_MIN_POINTS") {
            Ok(raw) => raw
                .trim()
                .parse::<u32>()
                .ok()
                .filter(|value| *value >= DEFAULT_MIN_POINTS)
                .ok_or(ConfigError::InvalidMinPoints(raw))?,
            Err(_) => DEFAULT_MIN_POINTS,
        };

        let reject_if_drawn = match env::var("DRAW_REJECT_IF_DRAWN") {
            Ok(raw) => parse_flag("DRAW_REJECT_IF_DRAWN", &raw)?,
            Err(_) => false,
        };

        let alignment = match env::var("SCORING_ALIGNMENT") {
            Ok(raw) => raw.parse().map_err(ConfigError::InvalidAlignment)?,
            Err(_) => AlignmentPolicy::Strict,
        };

        Ok(Self {
            current_week_override,
            draw_min_points,
            reject_if_drawn,
            alignment,
        })
    }
}

fn parse_flag(name: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(ConfigError::InvalidFlag {
            name,
            value: raw.to_string(),
        }),
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidMinPoints(String),
    InvalidAlignment(String),
    InvalidFlag { name: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidMinPoints(value) => {
                write!(f, "DRAW_MIN_POINTS must be a whole number >= 1, got '{value}'")
            }
            ConfigError::InvalidAlignment(value) => write!(
                f,
                "SCORING_ALIGNMENT must be 'strict' or 'overlapping', got '{value}'"
            ),
            ConfigError::InvalidFlag { name, value } => {
                write!(f, "{name} must be true or false, got '{value}'")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            _ => None,
        }
    }
}
