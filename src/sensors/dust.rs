/// GP2Y1014AU0F optical dust sensor and US EPA PM2.5 AQI mapping
use std::fmt;

use log::warn;

use crate::error::SensorError;
use crate::sensors::{AdcChannel, OutputPin, PinLevel, PlatformHandle};
use crate::utils::adc_to_voltage;

// Pulse timing from the sensor datasheet, in microseconds
const SAMPLING_TIME_US: u32 = 280;
const DELTA_TIME_US: u32 = 40;
const SLEEP_TIME_US: u32 = 9680;

/// The sensor board runs on 5 V logic
const REFERENCE_VOLTAGE: f64 = 5.0;

/// `(density low, density high, AQI low, AQI high)` per band, µg/m³
const AQI_BREAKPOINTS: [(f64, f64, f64, f64); 6] = [
    (0.0, 12.0, 0.0, 50.0),
    (12.1, 35.4, 51.0, 100.0),
    (35.5, 55.4, 101.0, 150.0),
    (55.5, 150.4, 151.0, 200.0),
    (150.5, 250.4, 201.0, 300.0),
    (250.5, 500.4, 301.0, 500.0),
];

const AQI_CEILING: u32 = 500;

/// Fixed scale used for the voltage reported in packets
const REPORTED_COUNTS_PER_VOLT: f64 = 820.0;

/// Dust density from the sensor output voltage (Chris Nafis' linear fit)
pub fn dust_density(voltage: f64) -> f64 {
    (170.0 * voltage - 0.1).max(0.0)
}

/// Air Quality Index for a PM2.5 density, clamped to 500
///
/// Linear interpolation inside the band the density falls into, truncated to an
/// integer. Densities above the last band report the ceiling.
pub fn calculate_aqi(density: f64) -> u32 {
    AQI_BREAKPOINTS
        .iter()
        .find(|(_, c_high, _, _)| density <= *c_high)
        .map(|&(c_low, c_high, i_low, i_high)| {
            let aqi = (density - c_low) / (c_high - c_low) * (i_high - i_low) + i_low;
            aqi.max(0.0) as u32
        })
        .unwrap_or(AQI_CEILING)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HealthLevel {
    #[default]
    Good,
    Moderate,
    UnhealthyForSensitiveGroups,
    Unhealthy,
    VeryUnhealthy,
    Hazardous,
    BeyondAqiScale,
}

impl HealthLevel {
    pub fn label(self) -> &'static str {
        match self {
            HealthLevel::Good => "Good",
            HealthLevel::Moderate => "Moderate",
            HealthLevel::UnhealthyForSensitiveGroups => "Unhealthy for Sensitive Groups",
            HealthLevel::Unhealthy => "Unhealthy",
            HealthLevel::VeryUnhealthy => "Very Unhealthy",
            HealthLevel::Hazardous => "Hazardous",
            HealthLevel::BeyondAqiScale => "Beyond AQI Scale",
        }
    }
}

impl fmt::Display for HealthLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

pub fn get_health_level(aqi: u32) -> HealthLevel {
    match aqi {
        0..=50 => HealthLevel::Good,
        51..=100 => HealthLevel::Moderate,
        101..=150 => HealthLevel::UnhealthyForSensitiveGroups,
        151..=200 => HealthLevel::Unhealthy,
        201..=300 => HealthLevel::VeryUnhealthy,
        301..=500 => HealthLevel::Hazardous,
        _ => HealthLevel::BeyondAqiScale,
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DustReading {
    pub raw_adc: u16,
    pub voltage: f64,
    /// µg/m³
    pub density: f64,
    pub aqi: u32,
    pub health_level: HealthLevel,
}

impl DustReading {
    pub fn from_raw(raw_adc: u16) -> Self {
        Self::from_voltage(raw_adc, adc_to_voltage(raw_adc as f64, REFERENCE_VOLTAGE))
    }

    fn from_voltage(raw_adc: u16, voltage: f64) -> Self {
        let density = dust_density(voltage);
        let aqi = calculate_aqi(density);
        DustReading {
            raw_adc,
            voltage,
            density,
            aqi,
            health_level: get_health_level(aqi),
        }
    }

    /// Voltage as published in packets and logs, `raw / 820`
    pub fn reported_voltage(&self) -> f64 {
        self.raw_adc as f64 / REPORTED_COUNTS_PER_VOLT
    }
}

pub struct DustSensor {
    platform: PlatformHandle,
}

impl DustSensor {
    pub fn new(platform: PlatformHandle) -> Self {
        Self { platform }
    }

    /// Pulse the IR LED and sample the output while it is lit
    pub fn try_read(&mut self) -> Result<DustReading, SensorError> {
        let raw = self.platform.with(|p| {
            p.set_pin(OutputPin::DustLed, PinLevel::Low)?;
            p.delay_us(SAMPLING_TIME_US);
            let sample = p.read_adc(AdcChannel::Dust);
            p.delay_us(DELTA_TIME_US);
            // Switch the LED off even if the sample failed
            p.set_pin(OutputPin::DustLed, PinLevel::High)?;
            p.delay_us(SLEEP_TIME_US);
            sample
        })?;

        Ok(DustReading::from_raw(raw))
    }

    pub fn read(&mut self) -> DustReading {
        self.try_read().unwrap_or_else(|e| {
            warn!("Dust sensor read failed, reporting zeros: {}", e);
            DustReading::default()
        })
    }
}
