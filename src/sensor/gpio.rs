//! Float switch on a GPIO pin, read through the sysfs GPIO interface.

use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::SensorReader;
use crate::error::HardwareError;

/// Where the kernel exposes sysfs GPIO.
pub const DEFAULT_GPIO_ROOT: &str = "/sys/class/gpio";

/// After export, udev may need a moment to create the pin directory.
const EXPORT_SETTLE_ATTEMPTS: u32 = 10;
const EXPORT_SETTLE_DELAY: Duration = Duration::from_millis(50);

/// Electrical level of a pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PinLevel {
    Low,
    High,
}

impl PinLevel {
    pub fn as_bit(&self) -> u8 {
        match self {
            PinLevel::Low => 0,
            PinLevel::High => 1,
        }
    }
}

/// A float switch read from `<root>/gpio<pin>/value`.
///
/// With the usual pull-up wiring the pin reads LOW while the switch is closed
/// to ground (float up, level OK) and HIGH when it opens (level low), so the
/// default `ok_level` is [`PinLevel::Low`].
///
/// Opening the sensor exports the pin if needed and performs one probe read,
/// so a missing or unreadable pin fails at startup. Dropping the sensor
/// unexports any pin it exported itself.
#[derive(Debug)]
pub struct GpioSensor {
    pin: u32,
    root: PathBuf,
    value_path: PathBuf,
    ok_level: PinLevel,
    exported_by_us: bool,
    description: String,
}

impl GpioSensor {
    /// Open `pin` under the default sysfs root.
    pub fn open(pin: u32, ok_level: PinLevel) -> Result<Self, HardwareError> {
        Self::open_at(DEFAULT_GPIO_ROOT, pin, ok_level)
    }

    /// Open `pin` under an explicit sysfs root.
    ///
    /// Blocks the calling thread, for up to half a second when the pin has
    /// to be exported first. From async code use [`open_async`](Self::open_async).
    pub fn open_at<P: AsRef<Path>>(
        root: P,
        pin: u32,
        ok_level: PinLevel,
    ) -> Result<Self, HardwareError> {
        let root = root.as_ref().to_path_buf();
        let pin_dir = root.join(format!("gpio{}", pin));
        let unavailable = |source| HardwareError::Unavailable { pin, source };

        let mut exported_by_us = false;
        if !pin_dir.exists() {
            fs::write(root.join("export"), pin.to_string()).map_err(unavailable)?;
            exported_by_us = true;
            wait_for_dir(&pin_dir).map_err(unavailable)?;
        }

        let sensor = Self {
            pin,
            value_path: pin_dir.join("value"),
            description: format!("gpio: pin {} ({})", pin, root.display()),
            root,
            ok_level,
            exported_by_us,
        };

        fs::write(pin_dir.join("direction"), "in").map_err(unavailable)?;
        let level = sensor.read_level()?;
        tracing::info!(pin, level = level.as_bit(), "GPIO float switch ready");

        Ok(sensor)
    }

    /// [`open_at`](Self::open_at) on tokio's blocking pool.
    pub async fn open_async(
        root: PathBuf,
        pin: u32,
        ok_level: PinLevel,
    ) -> Result<Self, HardwareError> {
        tokio::task::spawn_blocking(move || Self::open_at(root, pin, ok_level))
            .await
            .map_err(|e| HardwareError::Unavailable {
                pin,
                source: std::io::Error::other(e),
            })?
    }

    pub fn pin(&self) -> u32 {
        self.pin
    }

    pub fn ok_level(&self) -> PinLevel {
        self.ok_level
    }

    /// Read the raw electrical level of the pin.
    pub fn read_level(&self) -> Result<PinLevel, HardwareError> {
        let content = fs::read_to_string(&self.value_path).map_err(|source| {
            HardwareError::Unavailable {
                pin: self.pin,
                source,
            }
        })?;

        match content.trim() {
            "0" => Ok(PinLevel::Low),
            "1" => Ok(PinLevel::High),
            other => Err(HardwareError::InvalidValue {
                pin: self.pin,
                value: other.to_string(),
            }),
        }
    }
}

fn wait_for_dir(dir: &Path) -> std::io::Result<()> {
    for _ in 0..EXPORT_SETTLE_ATTEMPTS {
        if dir.exists() {
            return Ok(());
        }
        thread::sleep(EXPORT_SETTLE_DELAY);
    }
    Err(std::io::Error::new(
        std::io::ErrorKind::NotFound,
        format!("{} did not appear after export", dir.display()),
    ))
}

impl SensorReader for GpioSensor {
    fn read(&mut self) -> Result<bool, HardwareError> {
        Ok(self.read_level()? == self.ok_level)
    }

    fn description(&self) -> &str {
        &self.description
    }
}

impl Drop for GpioSensor {
    fn drop(&mut self) {
        if !self.exported_by_us {
            return;
        }
        match fs::write(self.root.join("unexport"), self.pin.to_string()) {
            Ok(()) => tracing::info!(pin = self.pin, "GPIO cleanup complete"),
            Err(e) => tracing::warn!(pin = self.pin, error = %e, "GPIO cleanup failed"),
        }
    }
}
