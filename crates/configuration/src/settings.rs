use serde::Deserialize;

/// The root configuration structure for the entire application.
///
/// Every section has defaults, so an absent or partial `config.toml` still loads.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database: Database,
    pub server: Server,
    pub dashboard: Dashboard,
    pub logging: Logging,
}

/// Where the registration table lives.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Database {
    /// An sqlx SQLite URL, e.g. `sqlite://registrations.db`.
    pub url: String,
    pub max_connections: u32,
}

impl Default for Database {
    fn default() -> Self {
        Self {
            url: "sqlite://registrations.db".to_string(),
            max_connections: 5,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Server {
    pub host: String,
    pub port: u16,
}

impl Default for Server {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

/// Presentation defaults for the dashboard views.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Dashboard {
    /// How many manufacturers the filter panel preselects.
    pub default_manufacturers: usize,
    /// How many states the filter panel preselects.
    pub default_states: usize,
    /// Series shown in the manufacturer trend chart.
    pub top_manufacturers: usize,
    /// Manufacturers per category in the latest market-share breakdown.
    pub market_share_top_n: usize,
    /// Manufacturers per category in the share trend chart.
    pub trend_top_n: usize,
    /// Rows in the top-states table.
    pub top_states: usize,
}

impl Default for Dashboard {
    fn default() -> Self {
        Self {
            default_manufacturers: 8,
            default_states: 6,
            top_manufacturers: 5,
            market_share_top_n: 10,
            trend_top_n: 3,
            top_states: 10,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Logging {
    pub level: LogLevel,
    /// Directory for the daily rolling log file.
    pub directory: String,
    pub file_prefix: String,
}

impl Default for Logging {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            directory: "logs".to_string(),
            file_prefix: "regdash.log".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// The directive understood by `tracing_subscriber::EnvFilter`.
    pub fn as_directive(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}
