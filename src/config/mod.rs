use crate::error::AppError;
use config::{Config as Cfg, File};
use serde::Deserialize;
use std::env;

/// Maximum tokens the completion provider may produce per answer.
const DEFAULT_MAX_OUTPUT_TOKENS: i32 = 2000;

/// Settings shared with the deployment environment (port, overridable via
/// an optional `configuration` file or `APP__`-prefixed variables).
#[derive(Debug, Clone, Deserialize)]
pub struct CommonConfig {
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_port() -> u16 {
    8080
}

impl CommonConfig {
    pub fn load() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let config = Cfg::builder()
            .add_source(File::with_name("configuration").required(false))
            .add_source(config::Environment::with_prefix("APP").separator("__"))
            .build()?;

        Ok(config.try_deserialize()?)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatConfig {
    #[serde(flatten)]
    pub common: CommonConfig,
    pub service_name: String,
    pub log_level: String,
    /// OTLP collector endpoint; tracing stays local-only when unset.
    pub otlp_endpoint: Option<String>,
    pub database: DatabaseConfig,
    pub openai: OpenAiSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OpenAiSettings {
    pub api_key: String,
    pub model: String,
    pub max_output_tokens: i32,
}

impl ChatConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let common = CommonConfig::load()?;
        let is_prod = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string()) == "prod";

        Ok(ChatConfig {
            common,
            service_name: get_env("SERVICE_NAME", Some("cfdi-chat-service"), is_prod)?,
            log_level: get_env("LOG_LEVEL", Some("info"), is_prod)?,
            otlp_endpoint: env::var("OTLP_ENDPOINT").ok(),
            database: DatabaseConfig {
                url: get_env("DATABASE_URL", None, is_prod)?,
                max_connections: get_env("DATABASE_MAX_CONNECTIONS", Some("10"), is_prod)?
                    .parse()
                    .unwrap_or(10),
                min_connections: get_env("DATABASE_MIN_CONNECTIONS", Some("0"), is_prod)?
                    .parse()
                    .unwrap_or(0),
            },
            openai: OpenAiSettings {
                api_key: get_env("OPENAI_API_KEY", None, is_prod)?,
                model: get_env("OPENAI_MODEL", Some("gpt-4o"), is_prod)?,
                max_output_tokens: get_env(
                    "OPENAI_MAX_OUTPUT_TOKENS",
                    Some(&DEFAULT_MAX_OUTPUT_TOKENS.to_string()),
                    is_prod,
                )?
                .parse()
                .unwrap_or(DEFAULT_MAX_OUTPUT_TOKENS),
            },
        })
    }
}

fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if is_prod {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required in production but not set",
                    key
                )))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required but not set",
                    key
                )))
            }
        }
    }
}
