//! Runtime environment configuration

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Deployment environment the process runs in
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Local development (default)
    #[default]
    Development,
    /// Production deployment
    Production,
}

/// Unknown environment name
#[derive(Debug, Error)]
#[error("unknown environment: {0}")]
pub struct UnknownEnvironment(pub String);

impl std::str::FromStr for Environment {
    type Err = UnknownEnvironment;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dev" | "development" | "local" => Ok(Self::Development),
            "prod" | "production" => Ok(Self::Production),
            other => Err(UnknownEnvironment(other.to_string())),
        }
    }
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application name
    pub app_name: String,
    /// Environment (development, production)
    pub environment: Environment,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            app_name: "liq-rs".to_string(),
            environment: Environment::Development,
        }
    }
}

impl AppConfig {
    /// Load from `LIQ_ENV`; unset or unknown values keep the default
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(value) = std::env::var("LIQ_ENV") {
            match value.parse() {
                Ok(env) => config.environment = env,
                Err(e) => tracing::warn!("{e}, using {:?}", config.environment),
            }
        }
        config
    }

    /// Whether error details may be shown to the caller
    pub fn expose_error_details(&self) -> bool {
        self.environment != Environment::Production
    }
}
