//! Channel-fed sensor.
//!
//! Readings are pushed through a tokio watch channel. Useful for bridging
//! from other acquisition code, simulators, and tests where the reading
//! comes from somewhere other than a local GPIO pin.

use tokio::sync::watch;

use super::SensorReader;
use crate::error::HardwareError;

/// A sensor whose latest reading is published on a watch channel.
///
/// `Some(true)` means the level is OK, `Some(false)` means low and `None`
/// means no reading is available yet. Once the sender is dropped every read
/// fails with [`HardwareError::Disconnected`].
#[derive(Debug)]
pub struct ChannelSensor {
    receiver: watch::Receiver<Option<bool>>,
    description: String,
}

impl ChannelSensor {
    /// Wrap an existing receiver.
    pub fn new(receiver: watch::Receiver<Option<bool>>, source_description: &str) -> Self {
        Self {
            receiver,
            description: format!("channel: {}", source_description),
        }
    }

    /// Create a channel pair with no initial reading.
    ///
    /// Returns (sender, sensor); publish readings with `sender.send(Some(ok))`.
    pub fn create(source_description: &str) -> (watch::Sender<Option<bool>>, Self) {
        let (tx, rx) = watch::channel(None);
        (tx, Self::new(rx, source_description))
    }
}

impl SensorReader for ChannelSensor {
    fn read(&mut self) -> Result<bool, HardwareError> {
        if self.receiver.has_changed().is_err() {
            return Err(HardwareError::Disconnected);
        }
        let reading = *self.receiver.borrow_and_update();
        reading.ok_or(HardwareError::NoReading)
    }

    fn description(&self) -> &str {
        &self.description
    }
}
