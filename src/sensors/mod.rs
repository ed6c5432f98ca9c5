//! Sensor readers and the hardware platform they sample through.
//!
//! Every reader is constructed once with a [`PlatformHandle`] and sampled every
//! tick. Readers never fail outward: a hardware fault yields a zeroed reading and
//! a warning, so the acquisition loop always gets a complete set of values.

pub mod bme280;
pub mod dust;
pub mod gas;
pub mod rtc;
pub mod sim;
pub mod uv;

use std::fmt;
use std::sync::{Arc, Mutex};

use crate::error::SensorError;

pub use bme280::{Bme280Reading, Bme280Sensor, Humidity};
pub use dust::{calculate_aqi, get_health_level, DustReading, DustSensor, HealthLevel};
pub use gas::{calculate_concentration, GasCurve, GasModel, GasReading, GasSensor};
pub use rtc::{RtcClock, RtcDateTime};
pub use sim::{LedMonitor, RtcMonitor, SimulatedPlatform};
pub use uv::{UvReading, UvSensor};

/// Analog inputs wired to the node's ADC
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AdcChannel {
    Mq9,
    Mq135,
    Uv,
    Dust,
}

impl AdcChannel {
    pub fn name(self) -> &'static str {
        match self {
            AdcChannel::Mq9 => "MQ-9",
            AdcChannel::Mq135 => "MQ-135",
            AdcChannel::Uv => "UV",
            AdcChannel::Dust => "dust",
        }
    }
}

/// Digital outputs driven by the readers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputPin {
    /// Infrared LED of the dust sensor, active low
    DustLed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinLevel {
    Low,
    High,
}

/// Human-readable values as reported by the BME280/BMP280 driver,
/// e.g. `"25.6C"` and `"1013.2hPa"`. BMP280 parts report no humidity.
#[derive(Debug, Clone, PartialEq)]
pub struct Bme280Values {
    pub temperature: String,
    pub pressure: String,
    pub humidity: Option<String>,
}

/// Access to the node's peripherals
pub trait SensorPlatform: Send {
    /// Read a 12-bit sample (0-4095)
    fn read_adc(&mut self, channel: AdcChannel) -> Result<u16, SensorError>;

    fn set_pin(&mut self, pin: OutputPin, level: PinLevel) -> Result<(), SensorError>;

    /// Busy-wait for the given number of microseconds
    fn delay_us(&mut self, micros: u32);

    fn bme280_values(&mut self) -> Result<Bme280Values, SensorError>;

    fn rtc_datetime(&mut self) -> Result<RtcDateTime, SensorError>;

    fn set_rtc_datetime(&mut self, datetime: &RtcDateTime) -> Result<(), SensorError>;

    /// Clear the RTC's oscillator-stop flag
    fn clear_oscillator_fault(&mut self) -> Result<(), SensorError>;
}

/// Shared handle to the platform, cloned into every reader
#[derive(Clone)]
pub struct PlatformHandle {
    inner: Arc<Mutex<dyn SensorPlatform>>,
}

impl PlatformHandle {
    pub fn new<P: SensorPlatform + 'static>(platform: P) -> Self {
        let inner: Arc<Mutex<dyn SensorPlatform>> = Arc::new(Mutex::new(platform));
        Self { inner }
    }

    /// Run `f` with exclusive access to the platform
    pub fn with<T>(
        &self,
        f: impl FnOnce(&mut dyn SensorPlatform) -> Result<T, SensorError>,
    ) -> Result<T, SensorError> {
        let mut guard = self
            .inner
            .lock()
            .map_err(|_| SensorError::PlatformPoisoned)?;
        f(&mut *guard)
    }
}

impl fmt::Debug for PlatformHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlatformHandle").finish_non_exhaustive()
    }
}
