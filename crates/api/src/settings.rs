//! Layered configuration
//!
//! Built-in defaults, then an optional TOML file, then `SHIELD__*`
//! environment variables (`SHIELD__SERVER__BIND_ADDR=0.0.0.0:9000`).

use crate::rate_limit::RateLimitConfig;
use alerting::AlertConfig;
use call_monitor::MonitorConfig;
use config::{Config, ConfigError, Environment, File};
use risk_signal::{SamplerConfig, SignalError};
use serde::Deserialize;
use std::net::SocketAddr;
use thiserror::Error;

/// Settings validation errors
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Invalid bind address {0:?}")]
    BindAddr(String),

    #[error("Invalid signal settings: {0}")]
    Signal(#[from] SignalError),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub bind_addr: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Filter directive, overridden by `RUST_LOG` when set
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DemoSettings {
    /// Open with the two dashboard demo alerts
    pub seed_alerts: bool,
    /// Fixed sampler seed for reproducible runs
    pub random_seed: Option<u64>,
}

impl Default for DemoSettings {
    fn default() -> Self {
        Self {
            seed_alerts: true,
            random_seed: None,
        }
    }
}

/// Top-level settings
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ShieldSettings {
    pub server: ServerSettings,
    pub logging: LoggingSettings,
    pub sampler: SamplerConfig,
    pub monitor: MonitorConfig,
    pub alerts: AlertConfig,
    pub rate_limit: RateLimitConfig,
    pub demo: DemoSettings,
}

impl ShieldSettings {
    /// Load settings. An explicit path must exist; otherwise `shield.toml` is optional.
    pub fn load(path: Option<&str>) -> Result<Self, ConfigError> {
        let name = path.unwrap_or("shield");
        Config::builder()
            .add_source(File::with_name(name).required(path.is_some()))
            .add_source(
                Environment::with_prefix("SHIELD")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        self.bind_addr()?;
        self.sampler.validate()?;
        self.monitor.tiers.validate()?;
        self.monitor.alert_levels.validate()?;
        Ok(())
    }

    pub fn bind_addr(&self) -> Result<SocketAddr, SettingsError> {
        self.server
            .bind_addr
            .parse()
            .map_err(|_| SettingsError::BindAddr(self.server.bind_addr.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let settings = ShieldSettings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.monitor.tick_interval_ms, 1000);
        assert_eq!(settings.alerts.announcement_delay_ms, 1000);
        assert!(settings.demo.seed_alerts);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let settings: ShieldSettings = Config::builder()
            .add_source(File::from_str(
                "[monitor]\ntick_interval_ms = 250\n[sampler]\nmax_rise_per_tick = 2.5\n",
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(settings.monitor.tick_interval_ms, 250);
        assert_eq!(settings.monitor.scam_warning_above, 50.0);
        assert_eq!(settings.sampler.max_rise_per_tick, 2.5);
        assert_eq!(settings.sampler.risk_ceiling, 95.0);
    }

    #[test]
    fn test_rejects_bad_values() {
        let mut settings = ShieldSettings::default();
        settings.server.bind_addr = "not an address".into();
        assert!(matches!(settings.validate(), Err(SettingsError::BindAddr(_))));

        let mut settings = ShieldSettings::default();
        settings.monitor.tiers.safe_max = 80.0;
        assert!(matches!(
            settings.validate(),
            Err(SettingsError::Signal(SignalError::InvertedBounds { .. }))
        ));
    }

    #[test]
    fn test_nan_threshold_from_toml_rejected() {
        let settings: ShieldSettings = Config::builder()
            .add_source(File::from_str(
                "[monitor.tiers]\nsafe_max = nan\n",
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert!(settings.monitor.tiers.safe_max.is_nan());
        assert!(matches!(
            settings.validate(),
            Err(SettingsError::Signal(SignalError::OutOfScale {
                field: "safe_max",
                ..
            }))
        ));
    }
}
