use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};

use crate::embedding::hub::{DEFAULT_HUB_URL, MAX_RETRIES};
use crate::embedding::EmbeddingSettings;

/// Application configuration loaded from environment variables.
/// Every variable has a default; malformed values fail startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    pub skills_path: PathBuf,
    pub embedding_model_path: PathBuf,
    pub embedding_model_id: String,
    pub embedding_onnx_file: String,
    pub model_hub_url: String,
    pub model_hub_max_retries: u32,
    /// Per-call scoring budget; a batch gets this once per resume.
    pub inference_timeout: Duration,
    /// Resolve the embedding model before serving instead of on the first request.
    pub preload_embedding_model: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            port: parse_env("PORT", 8085).context("PORT must be a valid port number")?,
            rust_log: env_or("RUST_LOG", "info"),
            skills_path: env_or("SKILLS_PATH", "skills.json").into(),
            embedding_model_path: env_or("EMBEDDING_MODEL_PATH", "./models/e5-base-v2/").into(),
            embedding_model_id: env_or("EMBEDDING_MODEL_ID", "intfloat/e5-base-v2"),
            embedding_onnx_file: env_or("EMBEDDING_ONNX_FILE", "onnx/model.onnx"),
            model_hub_url: env_or("MODEL_HUB_URL", DEFAULT_HUB_URL),
            model_hub_max_retries: parse_env("MODEL_HUB_MAX_RETRIES", MAX_RETRIES)
                .context("MODEL_HUB_MAX_RETRIES must be a positive integer")?,
            inference_timeout: Duration::from_secs(
                parse_env("INFERENCE_TIMEOUT_SECS", 30)
                    .context("INFERENCE_TIMEOUT_SECS must be a whole number of seconds")?,
            ),
            preload_embedding_model: match std::env::var("PRELOAD_EMBEDDING_MODEL") {
                Ok(raw) => parse_flag(&raw).ok_or_else(|| {
                    anyhow!("PRELOAD_EMBEDDING_MODEL must be true or false, got '{raw}'")
                })?,
                Err(_) => false,
            },
        })
    }

    pub fn embedding_settings(&self) -> EmbeddingSettings {
        EmbeddingSettings {
            local_path: self.embedding_model_path.clone(),
            model_id: self.embedding_model_id.clone(),
            onnx_file: self.embedding_onnx_file.clone(),
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("Invalid value '{raw}' for '{key}'")),
        Err(_) => Ok(default),
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}
