//! Startup configuration.
//!
//! Resolved once in `main`; handlers never read the environment.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use medibridge_llm::OpenAiConfig;

pub const DEFAULT_ADDR: &str = "0.0.0.0:3000";
pub const DEFAULT_DB_PATH: &str = "medibridge.db";
pub const DEFAULT_LLM_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_LLM_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_LLM_TIMEOUT_SECS: u64 = 45;
const MAX_LLM_TIMEOUT_SECS: u64 = 600;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
    #[error("Missing required setting {0}")]
    Missing(&'static str),

    #[error("Invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub addr: SocketAddr,
    pub db_path: PathBuf,
    /// JSON directory imported when the database has no doctors
    pub seed_path: Option<PathBuf>,
    pub llm: OpenAiConfig,
}

impl ServerConfig {
    /// Resolve from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve from an arbitrary key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let addr_raw = get("MEDIBRIDGE_ADDR").unwrap_or_else(|| DEFAULT_ADDR.to_string());
        let addr = addr_raw.parse().map_err(|e| ConfigError::Invalid {
            key: "MEDIBRIDGE_ADDR",
            reason: format!("{addr_raw:?}: {e}"),
        })?;

        let db_path = PathBuf::from(
            get("MEDIBRIDGE_DB_PATH").unwrap_or_else(|| DEFAULT_DB_PATH.to_string()),
        );
        let seed_path = get("MEDIBRIDGE_SEED_PATH").map(PathBuf::from);

        let api_key = get("LLM_API_KEY")
            .or_else(|| get("OPENAI_API_KEY"))
            .ok_or(ConfigError::Missing("LLM_API_KEY"))?;
        let base_url = get("LLM_BASE_URL").unwrap_or_else(|| DEFAULT_LLM_BASE_URL.to_string());
        let model = get("LLM_MODEL").unwrap_or_else(|| DEFAULT_LLM_MODEL.to_string());

        let timeout_secs = match get("LLM_TIMEOUT_SECS") {
            None => DEFAULT_LLM_TIMEOUT_SECS,
            Some(raw) => {
                let secs: u64 = raw.parse().map_err(|_| ConfigError::Invalid {
                    key: "LLM_TIMEOUT_SECS",
                    reason: format!("{raw:?} is not a whole number of seconds"),
                })?;
                if !(1..=MAX_LLM_TIMEOUT_SECS).contains(&secs) {
                    return Err(ConfigError::Invalid {
                        key: "LLM_TIMEOUT_SECS",
                        reason: format!("{secs} is outside 1-{MAX_LLM_TIMEOUT_SECS}"),
                    });
                }
                secs
            }
        };

        Ok(Self {
            addr,
            db_path,
            seed_path,
            llm: OpenAiConfig {
                api_key,
                base_url,
                model,
                timeout: Duration::from_secs(timeout_secs),
            },
        })
    }

    /// Per-stage bound applied by the orchestrator on top of the HTTP timeout.
    pub fn stage_timeout(&self) -> Duration {
        self.llm.timeout
    }
}
