/// BME280/BMP280 temperature and pressure sensor
use log::warn;
use rand::Rng;

use crate::error::SensorError;
use crate::sensors::PlatformHandle;

/// Band of the placeholder humidity used when the part has no humidity sensor
const SIMULATED_HUMIDITY_MIN: f64 = 23.0;
const SIMULATED_HUMIDITY_MAX: f64 = 26.0;

/// Relative humidity in percent, tagged with where it came from
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Humidity {
    Measured(f64),
    /// Placeholder value, no humidity sensor on the board
    Simulated(f64),
}

impl Humidity {
    pub fn value(self) -> f64 {
        match self {
            Humidity::Measured(v) | Humidity::Simulated(v) => v,
        }
    }

    pub fn is_simulated(self) -> bool {
        matches!(self, Humidity::Simulated(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bme280Reading {
    /// °C
    pub temperature: f64,
    /// hPa
    pub pressure: f64,
    pub humidity: Humidity,
}

impl Default for Bme280Reading {
    fn default() -> Self {
        Bme280Reading {
            temperature: 0.0,
            pressure: 0.0,
            humidity: Humidity::Measured(0.0),
        }
    }
}

/// Parse a driver string such as `"25.6C"` by stripping the unit suffix
pub fn parse_with_suffix(raw: &str, suffix: &str) -> Result<f64, SensorError> {
    raw.trim()
        .strip_suffix(suffix)
        .and_then(|number| number.trim().parse::<f64>().ok())
        .ok_or_else(|| SensorError::Parse(raw.to_string()))
}

pub struct Bme280Sensor {
    platform: PlatformHandle,
}

impl Bme280Sensor {
    pub fn new(platform: PlatformHandle) -> Self {
        Self { platform }
    }

    pub fn try_read(&mut self) -> Result<Bme280Reading, SensorError> {
        let values = self.platform.with(|p| p.bme280_values())?;

        let temperature = parse_with_suffix(&values.temperature, "C")?;
        let pressure = parse_with_suffix(&values.pressure, "hPa")?;
        let humidity = match values.humidity {
            Some(raw) => Humidity::Measured(parse_with_suffix(&raw, "%")?),
            None => Humidity::Simulated(
                rand::thread_rng().gen_range(SIMULATED_HUMIDITY_MIN..SIMULATED_HUMIDITY_MAX),
            ),
        };

        Ok(Bme280Reading {
            temperature,
            pressure,
            humidity,
        })
    }

    pub fn read(&mut self) -> Bme280Reading {
        self.try_read().unwrap_or_else(|e| {
            warn!("BME280 read failed, reporting zeros: {}", e);
            Bme280Reading::default()
        })
    }
}
