/// Analog UV sensor (ML8511 style output)
use log::warn;

use crate::error::SensorError;
use crate::sensors::{AdcChannel, PlatformHandle};
use crate::utils::{adc_to_voltage, map_range};

const SAMPLES_PER_READ: u32 = 8;
const REFERENCE_VOLTAGE: f64 = 3.3;

// Output voltage span mapped onto 0-15 mW/cm²
const VOLTAGE_AT_ZERO: f64 = 0.99;
const VOLTAGE_AT_MAX: f64 = 2.8;
const MAX_INTENSITY: f64 = 15.0;

/// Fixed scale used for the voltage reported in packets
const REPORTED_VOLTS_PER_COUNT: f64 = 0.0008;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UvReading {
    /// Mean of the raw samples
    pub raw_adc: f64,
    pub voltage: f64,
    /// mW/cm²
    pub intensity: f64,
    pub index: f64,
}

impl UvReading {
    pub fn from_average(raw_adc: f64) -> Self {
        let voltage = adc_to_voltage(raw_adc, REFERENCE_VOLTAGE);
        let intensity =
            map_range(voltage, VOLTAGE_AT_ZERO, VOLTAGE_AT_MAX, 0.0, MAX_INTENSITY).max(0.0);

        UvReading {
            raw_adc,
            voltage,
            intensity,
            // Rough approximation
            index: intensity / 0.1,
        }
    }

    /// Voltage as published in packets and logs, `raw × 0.0008`.
    /// Intensity is computed from the exact `voltage` instead.
    pub fn reported_voltage(&self) -> f64 {
        self.raw_adc * REPORTED_VOLTS_PER_COUNT
    }
}

pub struct UvSensor {
    platform: PlatformHandle,
}

impl UvSensor {
    pub fn new(platform: PlatformHandle) -> Self {
        Self { platform }
    }

    pub fn try_read(&mut self) -> Result<UvReading, SensorError> {
        let total = self.platform.with(|p| {
            let mut total = 0u32;
            for _ in 0..SAMPLES_PER_READ {
                total += p.read_adc(AdcChannel::Uv)? as u32;
            }
            Ok(total)
        })?;

        Ok(UvReading::from_average(total as f64 / SAMPLES_PER_READ as f64))
    }

    pub fn read(&mut self) -> UvReading {
        self.try_read().unwrap_or_else(|e| {
            warn!("UV read failed, reporting zeros: {}", e);
            UvReading::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensors::SimulatedPlatform;

    #[test]
    fn dark_sensor_clamps_to_zero() {
        let reading = UvReading::from_average(100.0);
        assert_eq!(reading.intensity, 0.0);
        assert_eq!(reading.index, 0.0);
    }

    #[test]
    fn intensity_is_linear_in_voltage() {
        // 2.8 V is the top of the scale
        let raw = 2.8 / 3.3 * 4095.0;
        let reading = UvReading::from_average(raw);
        assert!((reading.voltage - 2.8).abs() < 1e-9);
        assert!((reading.intensity - 15.0).abs() < 1e-6);
        assert!((reading.index - 150.0).abs() < 1e-4);
    }

    #[test]
    fn averages_eight_samples() {
        let platform = PlatformHandle::new(SimulatedPlatform::fixed(2000));
        let mut sensor = UvSensor::new(platform);
        let reading = sensor.read();
        assert_eq!(reading.raw_adc, 2000.0);
        assert!(reading.intensity > 0.0);
    }

    #[test]
    fn fault_reports_default() {
        let platform =
            PlatformHandle::new(SimulatedPlatform::fixed(2000).with_adc_fault(AdcChannel::Uv));
        let mut sensor = UvSensor::new(platform);
        assert_eq!(sensor.read(), UvReading::default());
    }
}
