//! Settings loading.
//!
//! Settings come from an optional TOML file layered under environment
//! variables prefixed with `LEVELWATCH`, using `__` between section and key:
//!
//! ```toml
//! [sensor]
//! pin = 17
//! ok_level = "low"
//!
//! [monitor]
//! check_interval = "5s"
//! debounce_time = "15s"
//! cooldown = "30m"
//!
//! [email]
//! from = "monitor@example.com"
//! to = ["owner@example.com"]
//! ```
//!
//! ```bash
//! LEVELWATCH__EMAIL__PASSWORD=... levelwatch run
//! LEVELWATCH__EMAIL__TO=a@example.com,b@example.com levelwatch run
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::notify::{EmailConfig, MessageContext};
use crate::sensor::{PinLevel, DEFAULT_GPIO_ROOT};

/// Environment variable prefix for overrides.
pub const ENV_PREFIX: &str = "LEVELWATCH";

/// Config file used when none is given on the command line.
pub const DEFAULT_CONFIG_FILE: &str = "levelwatch.toml";

/// All settings, one field per file section.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    pub sensor: SensorSettings,
    pub monitor: MonitorSettings,
    pub email: EmailConfig,
    pub logging: LoggingSettings,
}

/// The `[sensor]` section.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SensorSettings {
    /// GPIO pin (BCM numbering).
    pub pin: u32,
    /// Pin level that means "level OK".
    pub ok_level: PinLevel,
    /// Root of the sysfs GPIO tree.
    pub gpio_root: PathBuf,
}

impl Default for SensorSettings {
    fn default() -> Self {
        Self {
            pin: 17,
            ok_level: PinLevel::Low,
            gpio_root: PathBuf::from(DEFAULT_GPIO_ROOT),
        }
    }
}

/// The `[monitor]` section.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MonitorSettings {
    #[serde(with = "crate::duration")]
    pub check_interval: Duration,
    #[serde(with = "crate::duration")]
    pub debounce_time: Duration,
    #[serde(with = "crate::duration")]
    pub cooldown: Duration,
    #[serde(with = "crate::duration")]
    pub send_timeout: Duration,
    pub alert_on_low: bool,
    pub alert_on_restored: bool,
    /// Label printed in every message footer.
    pub location: String,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            check_interval: Duration::from_secs(5),
            debounce_time: Duration::from_secs(15),
            cooldown: Duration::from_secs(30 * 60),
            send_timeout: Duration::from_secs(30),
            alert_on_low: true,
            alert_on_restored: true,
            location: "Raspberry Pi Water Monitor".to_string(),
        }
    }
}

/// The `[logging]` section.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Log every sample at info level; otherwise only warnings and errors.
    pub detailed: bool,
    /// Optional log file, rotated daily.
    pub file: Option<PathBuf>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            detailed: true,
            file: None,
        }
    }
}

/// Values the monitor loop consumes, resolved from [`Settings`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorConfig {
    pub check_interval: Duration,
    pub debounce_time: Duration,
    pub cooldown: Duration,
    pub send_timeout: Duration,
    pub alert_on_low: bool,
    pub alert_on_restored: bool,
    pub recipients: Vec<String>,
    pub message: MessageContext,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Settings::default().monitor_config()
    }
}

impl MonitorConfig {
    /// Both the tick period and the send timeout must be non-zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.check_interval.is_zero() {
            return Err(ConfigError::Invalid(
                "monitor.check_interval must be greater than zero".to_string(),
            ));
        }
        if self.send_timeout.is_zero() {
            return Err(ConfigError::Invalid(
                "monitor.send_timeout must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

impl Settings {
    /// Load settings from `path` (if given) and the environment.
    ///
    /// An explicitly given file must exist. Without one, `levelwatch.toml` in
    /// the working directory is used when present.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_with_env(path, None)
    }

    /// Like [`load`](Self::load), reading overrides from `env` instead of
    /// the process environment when given.
    pub fn load_with_env(
        path: Option<&Path>,
        env: Option<config::Map<String, String>>,
    ) -> Result<Self, ConfigError> {
        let file = match path {
            Some(p) => File::from(p).format(FileFormat::Toml).required(true),
            None => File::new(DEFAULT_CONFIG_FILE, FileFormat::Toml).required(false),
        };

        let config = Config::builder()
            .add_source(file)
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("email.to")
                    .try_parsing(true)
                    .source(env),
            )
            .build()?;

        let settings: Settings = config.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reject values the monitor cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.monitor_config().validate()
    }

    pub fn monitor_config(&self) -> MonitorConfig {
        MonitorConfig {
            check_interval: self.monitor.check_interval,
            debounce_time: self.monitor.debounce_time,
            cooldown: self.monitor.cooldown,
            send_timeout: self.monitor.send_timeout,
            alert_on_low: self.monitor.alert_on_low,
            alert_on_restored: self.monitor.alert_on_restored,
            recipients: self.email.to.clone(),
            message: self.message_context(),
        }
    }

    pub fn message_context(&self) -> MessageContext {
        MessageContext {
            location: self.monitor.location.clone(),
            pin: self.sensor.pin,
        }
    }
}
