//! Level sensor abstraction.
//!
//! The monitor only needs one capability from the hardware: "is the level OK
//! right now?". This module defines that capability as the [`SensorReader`]
//! trait and ships two implementations:
//!
//! - [`GpioSensor`]: a float switch wired to a GPIO pin, read through sysfs
//! - [`ChannelSensor`]: readings pushed through a channel by another task
//!   (simulators, bridges from other acquisition code)

mod channel;
mod gpio;

pub use channel::ChannelSensor;
pub use gpio::{GpioSensor, PinLevel, DEFAULT_GPIO_ROOT};

use std::fmt::Debug;

use crate::error::HardwareError;

/// A binary level sensor.
///
/// The monitor takes ownership of its sensor for the whole run and drops it
/// on every exit path, so implementations release hardware in `Drop`.
///
/// # Example
///
/// ```
/// use levelwatch::{ChannelSensor, SensorReader};
///
/// let (tx, mut sensor) = ChannelSensor::create("bench");
/// tx.send(Some(true)).unwrap();
/// assert!(sensor.read().unwrap());
/// ```
pub trait SensorReader: Send + Debug {
    /// Sample the sensor once.
    ///
    /// Returns `Ok(true)` when the level is OK and `Ok(false)` when it is low.
    fn read(&mut self) -> Result<bool, HardwareError>;

    /// Human-readable description of the sensor, used in log lines.
    fn description(&self) -> &str;
}

impl<S: SensorReader + ?Sized> SensorReader for Box<S> {
    fn read(&mut self) -> Result<bool, HardwareError> {
        (**self).read()
    }

    fn description(&self) -> &str {
        (**self).description()
    }
}
