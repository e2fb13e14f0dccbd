//! Application configuration schemas.
//!
//! Configuration is merged from TOML files and `STASHBOX__`-prefixed
//! environment variables via the `config` crate. Each sub-module is one
//! logical section.

pub mod database;
pub mod engine;
pub mod logging;

use serde::{Deserialize, Serialize};
use validator::Validate;

pub use self::database::DatabaseConfig;
pub use self::engine::{EngineConfig, ShortIdConfig};
pub use self::logging::LoggingConfig;

use crate::error::AppError;

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Database connection settings.
    pub database: DatabaseConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Short identifier format for boxes and QR codes.
    #[serde(default)]
    pub short_ids: ShortIdConfig,
    /// Lifecycle engine limits.
    #[serde(default)]
    pub engine: EngineConfig,
}

impl AppConfig {
    /// Load configuration.
    ///
    /// Sources, lowest precedence first: the file at `path` (extension
    /// optional), an overlay named after `STASHBOX_ENV` in the same
    /// directory, then `STASHBOX__SECTION__KEY` environment variables.
    pub fn load(path: &str) -> Result<Self, AppError> {
        let mut builder =
            config::Config::builder().add_source(config::File::with_name(path).required(false));

        if let Ok(env) = std::env::var("STASHBOX_ENV") {
            let overlay = std::path::Path::new(path)
                .with_file_name(&env)
                .to_string_lossy()
                .into_owned();
            builder = builder.add_source(config::File::with_name(&overlay).required(false));
        }

        let config = builder
            .add_source(
                config::Environment::with_prefix("STASHBOX")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        let app: Self = config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))?;
        app.validate()?;
        Ok(app)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(toml: &str) -> Result<Self, AppError> {
        let app: Self = config::Config::builder()
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .build()?
            .try_deserialize()?;
        app.validate()?;
        Ok(app)
    }

    /// Range-check the engine and short-id sections.
    pub fn validate(&self) -> Result<(), AppError> {
        self.short_ids
            .validate()
            .map_err(|e| AppError::configuration(format!("Invalid [short_ids] section: {e}")))?;
        self.engine
            .validate()
            .map_err(|e| AppError::configuration(format!("Invalid [engine] section: {e}")))?;
        Ok(())
    }
}
