use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use tracing::info;
use validator::Validate;

/// Default values for configuration
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_ENV: &str = "development";
const DEFAULT_PORT: u16 = 8080;
const CONFIG_DIR: &str = "config";
const DEFAULT_NOTIFICATION_SWEEP_SECS: u64 = 86_400;

/// Application configuration structure with validation
#[derive(Clone, Debug, Deserialize, Validate)]
pub struct AppConfig {
    /// Database connection URL
    pub database_url: String,

    /// Server host address
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Log level filter (trace, debug, info, warn, error)
    #[serde(default)]
    pub log_level: Option<String>,

    /// Emit logs as JSON
    #[serde(default)]
    pub log_json: bool,

    /// Run pending migrations at startup
    #[serde(default = "default_true")]
    pub auto_migrate: bool,

    /// Enable the periodic service-due reminder sweep
    #[serde(default)]
    pub notifications_enabled: bool,

    /// Interval between reminder sweeps, in seconds
    #[serde(default = "default_sweep_secs")]
    pub notification_sweep_secs: u64,

    /// Deployment environment name
    #[serde(default = "default_environment")]
    pub environment: String,
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_true() -> bool {
    true
}

fn default_sweep_secs() -> u64 {
    DEFAULT_NOTIFICATION_SWEEP_SECS
}

fn default_environment() -> String {
    DEFAULT_ENV.to_string()
}

impl AppConfig {
    pub fn log_level(&self) -> &str {
        self.log_level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Loads configuration from files and environment variables.
///
/// Sources are layered, later ones overriding earlier ones:
/// 1. `config/default.toml`
/// 2. `config/{RUN_MODE}.toml` (e.g. `config/production.toml`)
/// 3. environment variables prefixed with `APP_` (e.g. `APP_DATABASE_URL`)
pub fn load_config() -> Result<AppConfig, ConfigError> {
    let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| DEFAULT_ENV.to_string());

    let config = Config::builder()
        .set_default("database_url", "sqlite://servicetrack.db?mode=rwc")?
        .set_default("host", "0.0.0.0")?
        .set_default("environment", run_mode.clone())?
        .add_source(File::with_name(&format!("{CONFIG_DIR}/default")).required(false))
        .add_source(File::with_name(&format!("{CONFIG_DIR}/{run_mode}")).required(false))
        .add_source(Environment::with_prefix("APP"))
        .build()?;

    let app_config: AppConfig = config.try_deserialize()?;
    app_config
        .validate()
        .map_err(|e| ConfigError::Message(format!("invalid configuration: {e}")))?;

    info!(
        environment = %app_config.environment,
        port = app_config.port,
        "Configuration loaded"
    );
    Ok(app_config)
}

/// Initializes the global tracing subscriber.
pub fn init_tracing(log_level: &str, json: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.to_string()));

    if json {
        let _ = fmt().with_env_filter(filter).json().try_init();
    } else {
        let _ = fmt().with_env_filter(filter).try_init();
    }
}
