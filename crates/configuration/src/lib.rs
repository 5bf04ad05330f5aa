use crate::error::ConfigError;
use std::path::Path;

// Declare the modules that make up this crate.
pub mod error;
pub mod settings;

// Re-export the core types to provide a clean public API.
pub use settings::{Config, Dashboard, Database, LogLevel, Logging, Server};

/// Prefix for environment overrides, e.g. `REGDASH__SERVER__PORT=8080`.
const ENV_PREFIX: &str = "REGDASH";

/// Loads the application configuration from `config.toml` in the working directory.
///
/// The file is optional: missing settings fall back to their defaults. Environment
/// overrides are applied on top, and a `DATABASE_URL` variable wins over both.
pub fn load_config() -> Result<Config, ConfigError> {
    build(Path::new("config.toml"), false)
}

/// Loads the application configuration from an explicit file, which must exist.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::NotFound(path.display().to_string()));
    }
    build(path, true)
}

fn build(path: &Path, required: bool) -> Result<Config, ConfigError> {
    let builder = config::Config::builder()
        .add_source(config::File::from(path).required(required))
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    // Attempt to deserialize the entire configuration into our `Config` struct
    let mut config = builder.try_deserialize::<Config>()?;

    override_database_url(&mut config, std::env::var("DATABASE_URL").ok());

    config.validate()?;
    Ok(config)
}

/// A non-blank `DATABASE_URL` wins over the file and `REGDASH__` settings.
fn override_database_url(config: &mut Config, url: Option<String>) {
    if let Some(url) = url.filter(|u| !u.trim().is_empty()) {
        config.database.url = url;
    }
}

impl Config {
    /// Rejects settings that would make the server or the views unusable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database.url.trim().is_empty() {
            return Err(ConfigError::ValidationError("database.url must not be empty".into()));
        }
        if self.database.max_connections == 0 {
            return Err(ConfigError::ValidationError(
                "database.max_connections must be at least 1".into(),
            ));
        }
        if self.server.port == 0 {
            return Err(ConfigError::ValidationError("server.port must not be 0".into()));
        }
        let d = &self.dashboard;
        for (name, value) in [
            ("dashboard.top_manufacturers", d.top_manufacturers),
            ("dashboard.market_share_top_n", d.market_share_top_n),
            ("dashboard.trend_top_n", d.trend_top_n),
            ("dashboard.top_states", d.top_states),
        ] {
            if value == 0 {
                return Err(ConfigError::ValidationError(format!("{} must be at least 1", name)));
            }
        }
        Ok(())
    }
}
