use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration build error: {0}")]
    Build(#[from] config::ConfigError),
    #[error("Invalid configuration: {0}")]
    Validation(String),
}

#[derive(Debug, Deserialize)]
pub struct SmtpConfig {
    pub server: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from: String,
}

/// Knobs of the polling scheduler. Defaults follow the documented sweep
/// shape: hourly system sweeps of 50 concurrent probes with a 10s deadline,
/// on-demand checks of 15 probes with a 5s deadline behind a 30-minute
/// cooldown.
#[derive(Debug, Clone, Deserialize)]
pub struct PollConfig {
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    #[serde(default = "default_sweep_concurrency")]
    pub sweep_concurrency: usize,
    #[serde(default = "default_sweep_timeout_secs")]
    pub sweep_timeout_secs: u64,
    #[serde(default = "default_on_demand_concurrency")]
    pub on_demand_concurrency: usize,
    #[serde(default = "default_on_demand_timeout_secs")]
    pub on_demand_timeout_secs: u64,
    #[serde(default = "default_cooldown_minutes")]
    pub cooldown_minutes: i64,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            sweep_concurrency: default_sweep_concurrency(),
            sweep_timeout_secs: default_sweep_timeout_secs(),
            on_demand_concurrency: default_on_demand_concurrency(),
            on_demand_timeout_secs: default_on_demand_timeout_secs(),
            cooldown_minutes: default_cooldown_minutes(),
        }
    }
}

fn default_interval_secs() -> u64 {
    3600
}
fn default_sweep_concurrency() -> usize {
    50
}
fn default_sweep_timeout_secs() -> u64 {
    10
}
fn default_on_demand_concurrency() -> usize {
    15
}
fn default_on_demand_timeout_secs() -> u64 {
    5
}
fn default_cooldown_minutes() -> i64 {
    30
}

#[derive(Debug, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    /// Public URL users are pointed at in alert messages.
    pub base_url: String,
    pub telegram_bot_token: String,
    pub smtp: SmtpConfig,
    #[serde(default)]
    pub poll: PollConfig,
}

/// Load application configuration from `config.yaml` + environment
/// overrides.
///
/// Any environment variable matching the key path separated by double
/// underscores (e.g. `SMTP__PORT`) overrides the file value.
///
/// Returns a `ConfigError` instead of panicking so the caller can decide how
/// to fail.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    use config::{Config, Environment, File};
    let cfg = Config::builder()
        .add_source(File::with_name("config.yaml"))
        .add_source(Environment::default().separator("__"))
        .build()?;

    let app: AppConfig = cfg.try_deserialize()?;
    validate(&app)?;
    Ok(app)
}

fn validate(app: &AppConfig) -> Result<(), ConfigError> {
    if app.smtp.port == 0 {
        return Err(ConfigError::Validation("smtp.port must be > 0".into()));
    }
    if app.poll.sweep_concurrency == 0 || app.poll.on_demand_concurrency == 0 {
        return Err(ConfigError::Validation(
            "poll concurrency limits must be > 0".into(),
        ));
    }
    if app.poll.sweep_timeout_secs == 0 || app.poll.on_demand_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "poll timeouts must be > 0".into(),
        ));
    }
    if app.poll.interval_secs == 0 {
        return Err(ConfigError::Validation(
            "poll.interval_secs must be > 0".into(),
        ));
    }
    if app.poll.cooldown_minutes <= 0 {
        return Err(ConfigError::Validation(
            "poll.cooldown_minutes must be > 0".into(),
        ));
    }
    Ok(())
}

/// Convenience helper for binaries wanting the old panic-on-error behaviour.
pub fn load_config_or_panic() -> AppConfig {
    match load_config() {
        Ok(c) => c,
        Err(e) => panic!("Failed to load configuration: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> AppConfig {
        AppConfig {
            database_url: "sqlite::memory:".into(),
            base_url: "https://certalert.example".into(),
            telegram_bot_token: "token".into(),
            smtp: SmtpConfig {
                server: "smtp.example".into(),
                port: 587,
                username: "mailer".into(),
                password: "secret".into(),
                from: "alerts@certalert.example".into(),
            },
            poll: PollConfig::default(),
        }
    }

    #[test]
    fn poll_defaults_match_documented_limits() {
        let poll = PollConfig::default();
        assert_eq!(poll.interval_secs, 3600);
        assert_eq!(poll.sweep_concurrency, 50);
        assert_eq!(poll.sweep_timeout_secs, 10);
        assert_eq!(poll.on_demand_concurrency, 15);
        assert_eq!(poll.on_demand_timeout_secs, 5);
        assert_eq!(poll.cooldown_minutes, 30);
    }

    #[test]
    fn validate_accepts_defaults() {
        assert!(validate(&base_config()).is_ok());
    }

    #[test]
    fn validate_rejects_zero_smtp_port() {
        let mut cfg = base_config();
        cfg.smtp.port = 0;
        assert!(validate(&cfg).is_err());
    }

    #[test]
    fn validate_rejects_zero_concurrency() {
        let mut cfg = base_config();
        cfg.poll.sweep_concurrency = 0;
        assert!(validate(&cfg).is_err());

        let mut cfg = base_config();
        cfg.poll.on_demand_concurrency = 0;
        assert!(validate(&cfg).is_err());
    }

    #[test]
    fn validate_rejects_zero_interval_and_cooldown() {
        let mut cfg = base_config();
        cfg.poll.interval_secs = 0;
        assert!(validate(&cfg).is_err());

        let mut cfg = base_config();
        cfg.poll.cooldown_minutes = 0;
        assert!(validate(&cfg).is_err());
    }
}
