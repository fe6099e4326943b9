//! Application configuration schemas.
//!
//! Configuration is read from an optional TOML file and overlaid with
//! environment variables prefixed `CLC__` via the `config` crate. Each
//! sub-module represents a logical configuration section.

pub mod api;
pub mod logging;
pub mod walk;

use serde::{Deserialize, Serialize};
use validator::Validate;

pub use self::api::ApiConfig;
pub use self::logging::LoggingConfig;
pub use self::walk::WalkConfig;

use crate::error::AppError;

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Provider API settings.
    #[serde(default)]
    pub api: ApiConfig,
    /// Group walk engine settings.
    #[serde(default)]
    pub walk: WalkConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration.
    ///
    /// `path` names a TOML file; when `None` only `config/default.toml`
    /// (if present) and the environment are consulted. Environment variables
    /// use the `CLC` prefix and `__` as the section separator, for example
    /// `CLC__API__USERNAME`.
    pub fn load(path: Option<&str>) -> Result<Self, AppError> {
        let file = match path {
            Some(p) => config::File::with_name(p).required(true),
            None => config::File::with_name("config/default").required(false),
        };

        let config = config::Config::builder()
            .add_source(file)
            .add_source(
                config::Environment::with_prefix("CLC")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        let config: Self = config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))?;

        config.validate_all()?;
        Ok(config)
    }

    /// Run validation rules on every section.
    pub fn validate_all(&self) -> Result<(), AppError> {
        self.walk
            .validate()
            .map_err(|e| AppError::configuration(format!("Invalid [walk] section: {e}")))?;

        if self.api.base_url.trim().is_empty() {
            return Err(AppError::configuration("api.base_url must not be empty"));
        }

        Ok(())
    }

    /// Returns a copy safe to print.
    pub fn redacted(&self) -> Self {
        Self {
            api: self.api.redacted(),
            ..self.clone()
        }
    }
}
