use crate::command::{MAX_DURATION, MAX_FORCE, MAX_SPEED};
use crate::error::{ArmplanError, Result};
use crate::position::WorkspaceLimits;
use crate::sequence::ACCELERATION;
use serde::Serialize;
use std::fmt;

pub const AVAILABLE_MODELS: &[&str] = &["mock", "openai", "anthropic", "google"];

const DEFAULT_SECRET_KEY: &str = "dev-secret-key-change-in-production";
const DEFAULT_PRODUCTION_SECRET_KEY: &str = "demo-secret-key-change-in-production";

// ---------------------------------------------------------------------------
// Environment
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Environment {
    #[default]
    Development,
    Production,
    Testing,
}

impl Environment {
    pub fn as_str(self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Production => "production",
            Environment::Testing => "testing",
        }
    }

    pub fn is_debug(self) -> bool {
        !matches!(self, Environment::Production)
    }
}

impl std::str::FromStr for Environment {
    type Err = ArmplanError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "development" | "default" => Ok(Environment::Development),
            "production" => Ok(Environment::Production),
            "testing" => Ok(Environment::Testing),
            _ => Err(ArmplanError::InvalidConfig {
                key: "APP_ENV".into(),
                value: s.to_string(),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// SafetyLimits
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SafetyLimits {
    /// mm/s
    pub max_speed: f64,
    /// mm/s²
    pub max_acceleration: f64,
    /// N
    pub gripper_force_limit: f64,
    /// s
    pub max_command_duration: f64,
}

impl Default for SafetyLimits {
    fn default() -> Self {
        Self {
            max_speed: MAX_SPEED,
            max_acceleration: ACCELERATION,
            gripper_force_limit: MAX_FORCE,
            max_command_duration: MAX_DURATION,
        }
    }
}

// ---------------------------------------------------------------------------
// Secrets
// ---------------------------------------------------------------------------

/// Credentials read from the environment. Never serialized; `Debug` redacts.
#[derive(Clone, Default)]
pub struct Secrets {
    pub secret_key: String,
    pub openai_api_key: Option<String>,
    pub anthropic_api_key: Option<String>,
    pub google_api_key: Option<String>,
}

impl fmt::Debug for Secrets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mark = |v: &Option<String>| if v.is_some() { "<set>" } else { "<unset>" };
        f.debug_struct("Secrets")
            .field("secret_key", &"<redacted>")
            .field("openai_api_key", &mark(&self.openai_api_key))
            .field("anthropic_api_key", &mark(&self.anthropic_api_key))
            .field("google_api_key", &mark(&self.google_api_key))
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

/// Process configuration, built once at startup and shared read-only.
#[derive(Debug, Clone, Serialize)]
pub struct Config {
    pub environment: Environment,
    pub debug: bool,
    /// Loaded so a configured deployment round-trips; only the mock model is
    /// wired in, so nothing reads these yet.
    #[serde(skip)]
    pub secrets: Secrets,
    pub default_ai_model: String,
    /// Reported through `/api/config`. The mock analyzer finishes in-process
    /// and never waits on it.
    pub ai_timeout_secs: u64,
    pub max_image_size: usize,
    pub workspace: WorkspaceLimits,
    pub safety: SafetyLimits,
    pub rate_limit_per_minute: u32,
    pub log_level: String,
    pub cors_origins: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            environment: Environment::Development,
            debug: true,
            secrets: Secrets {
                secret_key: DEFAULT_SECRET_KEY.to_string(),
                ..Secrets::default()
            },
            default_ai_model: "mock".to_string(),
            ai_timeout_secs: 30,
            max_image_size: 10 * 1024 * 1024,
            workspace: WorkspaceLimits::default(),
            safety: SafetyLimits::default(),
            rate_limit_per_minute: 30,
            log_level: "INFO".to_string(),
            cors_origins: vec!["*".to_string()],
        }
    }
}

impl Config {
    /// Build from process environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Config::default();

        if let Some(env) = get("APP_ENV") {
            config.environment = env.parse()?;
        }
        config.debug = config.environment.is_debug();

        let fallback_key = match config.environment {
            Environment::Production => DEFAULT_PRODUCTION_SECRET_KEY,
            _ => DEFAULT_SECRET_KEY,
        };
        config.secrets.secret_key =
            get("SECRET_KEY").unwrap_or_else(|| fallback_key.to_string());
        config.secrets.openai_api_key = get("OPENAI_API_KEY");
        config.secrets.anthropic_api_key = get("ANTHROPIC_API_KEY");
        config.secrets.google_api_key = get("GOOGLE_API_KEY");

        if let Some(model) = get("DEFAULT_AI_MODEL") {
            config.default_ai_model = model;
        }
        if config.environment == Environment::Testing {
            config.default_ai_model = "mock".to_string();
        }

        if let Some(v) = get("AI_TIMEOUT") {
            config.ai_timeout_secs = parse_number("AI_TIMEOUT", &v)?;
        }
        if let Some(v) = get("MAX_IMAGE_SIZE") {
            config.max_image_size = parse_number("MAX_IMAGE_SIZE", &v)?;
        }
        if let Some(v) = get("RATE_LIMIT_PER_MINUTE") {
            config.rate_limit_per_minute = parse_number("RATE_LIMIT_PER_MINUTE", &v)?;
        }
        if let Some(level) = get("LOG_LEVEL") {
            config.log_level = level;
        }
        if let Some(origins) = get("CORS_ORIGINS") {
            config.cors_origins = origins
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
        }

        Ok(config)
    }

    /// `LOG_LEVEL` as a tracing level, accepting the `WARNING`/`CRITICAL`
    /// spellings as well. Unknown values fall back to INFO.
    pub fn tracing_level(&self) -> tracing::Level {
        match self.log_level.to_ascii_lowercase().as_str() {
            "warning" => tracing::Level::WARN,
            "critical" | "fatal" => tracing::Level::ERROR,
            other => other.parse().unwrap_or(tracing::Level::INFO),
        }
    }

    pub fn allows_any_origin(&self) -> bool {
        self.cors_origins.is_empty() || self.cors_origins.iter().any(|o| o == "*")
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value.trim().parse().map_err(|_| ArmplanError::InvalidConfig {
        key: key.to_string(),
        value: value.to_string(),
    })
}
