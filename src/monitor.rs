//! The monitoring loop.
//!
//! [`Monitor`] samples the sensor on a fixed cadence, feeds each sample to the
//! debounce state machine and dispatches notifications for confirmed events
//! through the cooldown gate.
//!
//! ```text
//!  tick ──▶ sensor.read() ──▶ state.transition() ──▶ Event? ──▶ cooldown.permit()
//!                                                                 │
//!                                            notifier.send() ◀────┘
//!                                                 │
//!                                        cooldown.record()
//! ```
//!
//! Ticks are scheduled at `start + n * check_interval` so a slow send does not
//! push later samples back. Cancellation is observed between ticks only; a
//! send that has started always runs to completion or to its timeout.

use std::time::Duration;

use serde::Serialize;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::config::MonitorConfig;
use crate::duration::format_duration;
use crate::error::{ConfigError, HardwareError, NotifyError};
use crate::notify::{AlertMessage, Notifier};
use crate::sensor::SensorReader;
use crate::state::{CooldownGate, Event, MonitorState, Phase};

/// Counters accumulated over one [`Monitor::run`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MonitorReport {
    /// Ticks on which the sensor was read, successfully or not.
    pub ticks: u64,
    pub failed_reads: u64,
    pub low_events: u64,
    pub restored_events: u64,
    pub notifications_sent: u64,
    pub notifications_failed: u64,
    /// Events that produced no send (cooldown active or alert kind disabled).
    pub notifications_suppressed: u64,
}

/// Drives one sensor through the debounce state machine.
///
/// # Example
///
/// ```no_run
/// use levelwatch::{ChannelSensor, LogNotifier, Monitor, MonitorConfig};
/// use tokio_util::sync::CancellationToken;
///
/// # tokio_test::block_on(async {
/// let (tx, sensor) = ChannelSensor::create("simulator");
/// tx.send(Some(true)).unwrap();
///
/// let cancel = CancellationToken::new();
/// let mut monitor = Monitor::new(MonitorConfig::default(), Box::new(LogNotifier::new())).unwrap();
/// let report = monitor.run(sensor, cancel.clone()).await.unwrap();
/// println!("{} ticks", report.ticks);
/// # });
/// ```
pub struct Monitor {
    config: MonitorConfig,
    notifier: Box<dyn Notifier>,
    state: MonitorState,
    cooldown: CooldownGate,
    report: MonitorReport,
}

impl Monitor {
    /// Fails if `config` cannot drive a loop (see [`MonitorConfig::validate`]).
    pub fn new(config: MonitorConfig, notifier: Box<dyn Notifier>) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            notifier,
            state: MonitorState::new(),
            cooldown: CooldownGate::new(),
            report: MonitorReport::default(),
        })
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    pub fn state(&self) -> &MonitorState {
        &self.state
    }

    pub fn cooldown(&self) -> &CooldownGate {
        &self.cooldown
    }

    pub fn report(&self) -> &MonitorReport {
        &self.report
    }

    /// Monitor until `cancel` fires.
    ///
    /// The sensor is owned by the loop and dropped on every exit path, which
    /// releases the underlying hardware. A read failure on the first tick is
    /// treated as a startup failure and returned; later read failures are
    /// logged and the tick is skipped. Send failures never stop the loop.
    ///
    /// Each call starts a fresh [`MonitorReport`] and applies the first-read
    /// rule again. Debounce and cooldown state carry over between calls.
    pub async fn run<S: SensorReader>(
        &mut self,
        mut sensor: S,
        cancel: CancellationToken,
    ) -> Result<MonitorReport, HardwareError> {
        self.report = MonitorReport::default();
        let mut first_tick = true;

        let start = Instant::now();
        let mut ticker = tokio::time::interval_at(start, self.config.check_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        tracing::info!(
            sensor = sensor.description(),
            notifier = self.notifier.name(),
            check_interval = %format_duration(self.config.check_interval),
            debounce = %format_duration(self.config.debounce_time),
            cooldown = %format_duration(self.config.cooldown),
            "Starting water level monitoring"
        );

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tracing::info!("Monitoring stopped");
                    break;
                }
                _ = ticker.tick() => {}
            }

            self.report.ticks += 1;

            let ok = match sensor.read() {
                Ok(ok) => ok,
                Err(e) if first_tick => {
                    tracing::error!(
                        sensor = sensor.description(),
                        error = %e,
                        "Initial sensor read failed"
                    );
                    return Err(e);
                }
                Err(e) => {
                    self.report.failed_reads += 1;
                    tracing::warn!(
                        sensor = sensor.description(),
                        error = %e,
                        "Sensor read failed, skipping tick"
                    );
                    continue;
                }
            };
            first_tick = false;

            self.on_sample(ok, Instant::now()).await;
        }

        tracing::info!(
            ticks = self.report.ticks,
            low_events = self.report.low_events,
            notifications_sent = self.report.notifications_sent,
            notifications_failed = self.report.notifications_failed,
            "Monitor shut down"
        );
        Ok(self.report.clone())
    }

    /// Apply one sample and dispatch whatever event it produces.
    pub async fn on_sample(&mut self, ok: bool, now: Instant) {
        if ok {
            tracing::info!("Water level OK");
        } else {
            tracing::info!("Float switch triggered - water level low");
        }

        let before = self.state.phase();
        let event = self.state.transition(ok, now, self.config.debounce_time);
        let after = self.state.phase();

        if before != after {
            tracing::debug!(from = before.label(), to = after.label(), "Phase changed");
        }

        match (before, after) {
            (Phase::Normal, Phase::PendingLow) => {
                tracing::info!("Low water level detected, starting debounce timer");
            }
            (Phase::PendingLow, Phase::Normal) => {
                tracing::info!("Water level recovered before debounce elapsed, timer reset");
            }
            _ => {}
        }

        let Some(event) = event else {
            return;
        };

        match event {
            Event::LowConfirmed { .. } => {
                self.report.low_events += 1;
                tracing::warn!("LOW WATER LEVEL CONFIRMED");
            }
            Event::Restored => {
                self.report.restored_events += 1;
                tracing::info!("Water level restored to normal");
            }
        }

        self.dispatch(event, now).await;
    }

    async fn dispatch(&mut self, event: Event, now: Instant) {
        let kind = event_kind(&event);
        let enabled = match event {
            Event::LowConfirmed { .. } => self.config.alert_on_low,
            Event::Restored => self.config.alert_on_restored,
        };

        if !enabled {
            self.report.notifications_suppressed += 1;
            tracing::info!(event = kind, "Alerts disabled for this event, skipping notification");
            return;
        }

        if !self.cooldown.permit(now, self.config.cooldown) {
            self.report.notifications_suppressed += 1;
            tracing::info!(
                event = kind,
                remaining = %format_duration(self.cooldown.remaining(now, self.config.cooldown)),
                "Notification cooldown active, skipping notification"
            );
            return;
        }

        let message = AlertMessage::for_event(&event, &self.config.message);
        let result = send_with_timeout(
            &*self.notifier,
            &message,
            &self.config.recipients,
            self.config.send_timeout,
        )
        .await;

        // Attempts consume the window too, so an unreachable backend is not
        // retried on every tick.
        self.cooldown.record(now);

        match result {
            Ok(()) => {
                self.report.notifications_sent += 1;
                tracing::info!(event = kind, subject = %message.subject, "Notification sent");
            }
            Err(e) => {
                self.report.notifications_failed += 1;
                tracing::error!(
                    event = kind,
                    notifier = self.notifier.name(),
                    kind = e.kind(),
                    error = %e,
                    "Failed to send notification"
                );
            }
        }
    }
}

impl std::fmt::Debug for Monitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Monitor")
            .field("config", &self.config)
            .field("notifier", &self.notifier.name())
            .field("state", &self.state)
            .field("cooldown", &self.cooldown)
            .field("report", &self.report)
            .finish()
    }
}

/// Send `message`, giving up after `timeout`.
pub async fn send_with_timeout(
    notifier: &dyn Notifier,
    message: &AlertMessage,
    recipients: &[String],
    timeout: Duration,
) -> Result<(), NotifyError> {
    tokio::time::timeout(
        timeout,
        notifier.send(&message.subject, &message.body, recipients),
    )
    .await
    .unwrap_or(Err(NotifyError::Timeout(timeout)))
}

fn event_kind(event: &Event) -> &'static str {
    match event {
        Event::LowConfirmed { .. } => "low",
        Event::Restored => "restored",
    }
}
