//! # levelwatch
//!
//! A water level monitor for a float switch on a GPIO pin. It samples the
//! switch on a fixed interval, requires a low reading to persist for a
//! debounce period before treating it as real, and sends rate-limited email
//! alerts when the level goes low and when it comes back.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────────┐
//! │                             Monitor                               │
//! │  ┌─────────┐   ┌──────────────┐   ┌──────────────┐   ┌─────────┐  │
//! │  │ sensor  │──▶│ MonitorState │──▶│ CooldownGate │──▶│ notify  │  │
//! │  │ (input) │   │  (debounce)  │   │  (spacing)   │   │ (email) │  │
//! │  └─────────┘   └──────────────┘   └──────────────┘   └─────────┘  │
//! └───────────────────────────────────────────────────────────────────┘
//! ```
//!
//! - **[`sensor`]**: the [`SensorReader`] trait with a sysfs [`GpioSensor`]
//!   and a channel-fed [`ChannelSensor`]
//! - **[`state`]**: the debounce state machine ([`MonitorState`]) and the
//!   notification [`CooldownGate`]; pure, no I/O
//! - **[`notify`]**: the [`Notifier`] trait, SMTP delivery and message text
//! - **[`monitor`]**: the [`Monitor`] loop tying them together with a
//!   cancellation token
//! - **[`config`]**: settings from a TOML file and `LEVELWATCH__*` variables
//!
//! ## Usage
//!
//! ### As a CLI tool
//!
//! ```bash
//! # Monitor with ./levelwatch.toml
//! levelwatch run
//!
//! # Check the float switch wiring
//! levelwatch read-sensor
//!
//! # Check email delivery
//! levelwatch --config /etc/levelwatch.toml test-email
//! ```
//!
//! ### Driving the state machine directly
//!
//! ```
//! use std::time::Duration;
//! use levelwatch::{Event, MonitorState};
//! use tokio::time::Instant;
//!
//! let debounce = Duration::from_secs(15);
//! let t0 = Instant::now();
//! let mut state = MonitorState::new();
//!
//! assert_eq!(state.transition(false, t0, debounce), None);
//! assert_eq!(
//!     state.transition(false, t0 + debounce, debounce),
//!     Some(Event::LowConfirmed { debounce })
//! );
//! assert_eq!(state.transition(true, t0 + debounce * 2, debounce), Some(Event::Restored));
//! ```

pub mod config;
pub mod duration;
pub mod error;
pub mod logging;
pub mod monitor;
pub mod notify;
pub mod sensor;
pub mod state;

pub use config::{MonitorConfig, Settings};
pub use error::{ConfigError, HardwareError, NotifyError};
pub use monitor::{Monitor, MonitorReport};
pub use notify::{AlertMessage, EmailConfig, EmailNotifier, LogNotifier, MessageContext, Notifier};
pub use sensor::{ChannelSensor, GpioSensor, PinLevel, SensorReader};
pub use state::{CooldownGate, Event, MonitorState, Phase};
