use std::{env, fmt::Display, str::FromStr};

use tracing::{info, warn};

use crate::errors::AppError;

pub const DEFAULT_AVATAR_FUNCTION: &str = "atualizarAvatar";
const DEFAULT_RAWG_URL: &str = "https://api.rawg.io/api";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Parse,
    Memory,
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "parse" => Ok(BackendKind::Parse),
            "memory" => Ok(BackendKind::Memory),
            other => Err(format!("unknown backend '{other}'")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ParseConfig {
    pub server_url: String,
    pub app_id: String,
    pub rest_key: String,
}

#[derive(Debug, Clone)]
pub struct RawgConfig {
    pub base_url: String,
    pub api_key: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub allowed_origins: Vec<String>,
    pub backend: BackendKind,
    pub parse: Option<ParseConfig>,
    pub rawg: RawgConfig,
    pub avatar_function: String,
    pub rate_limit_per_minute: u32,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        let backend: BackendKind = try_load("GAMEHUB_BACKEND", "parse")?;

        let parse = match backend {
            BackendKind::Parse => Some(ParseConfig {
                server_url: required("PARSE_SERVER_URL")?,
                app_id: required("PARSE_APP_ID")?,
                rest_key: required("PARSE_REST_KEY")?,
            }),
            BackendKind::Memory => {
                warn!("Using the in-memory backend, nothing will be persisted");
                None
            }
        };

        let allowed_origins = env::var("ALLOWED_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:8081".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Ok(Self {
            port: try_load("PORT", "3001")?,
            allowed_origins,
            backend,
            parse,
            rawg: RawgConfig {
                base_url: try_load("RAWG_BASE_URL", DEFAULT_RAWG_URL)?,
                api_key: required("RAWG_API_KEY")?,
            },
            avatar_function: try_load("AVATAR_FUNCTION", DEFAULT_AVATAR_FUNCTION)?,
            rate_limit_per_minute: try_load("RATE_LIMIT_PER_MINUTE", "1000")?,
        })
    }
}

fn required(key: &str) -> Result<String, AppError> {
    env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| AppError::EnvError(format!("{key} must be set")))
}

fn try_load<T: FromStr>(key: &str, default: &str) -> Result<T, AppError>
where
    T::Err: Display,
{
    env::var(key)
        .unwrap_or_else(|_| {
            info!("{key} not set, using default: {default}");
            default.to_string()
        })
        .parse()
        .map_err(|e| AppError::EnvError(format!("Invalid {key} value: {e}")))
}
