/// MQ-9 and MQ-135 gas sensors
///
/// Concentrations come from a step table per gas, not from a fitted curve: the
/// normalized resistance ratio Rs/R0 is compared against descending thresholds and
/// the first exceeded threshold selects the concentration.
use std::time::Duration;

use log::{debug, warn};
use tokio::time::sleep;

use crate::error::SensorError;
use crate::sensors::{AdcChannel, PlatformHandle};
use crate::utils::adc_to_voltage;

/// Supply and ADC reference voltage of the sensor boards
const SUPPLY_VOLTAGE: f64 = 3.3;

/// Clean-air calibration resistance for the MQ-9
pub const DEFAULT_R0_MQ9: f64 = 0.49;
/// Clean-air calibration resistance for the MQ-135
pub const DEFAULT_R0_MQ135: f64 = 5.29;

/// Step response for one gas.
///
/// `steps` are `(exclusive lower bound, ppm)` pairs ordered from the highest
/// threshold down; `floor` applies when the ratio exceeds none of them.
#[derive(Debug, Clone, Copy)]
pub struct GasCurve {
    /// Parameter name in the packet
    pub gas: &'static str,
    pub steps: &'static [(f64, f64)],
    pub floor: f64,
}

const MQ9_CURVES: [GasCurve; 3] = [
    GasCurve {
        gas: "LPG",
        steps: &[(1.8, 200.0), (1.0, 1000.0), (0.6, 5000.0)],
        floor: 10000.0,
    },
    GasCurve {
        gas: "CO",
        steps: &[(2.2, 100.0), (1.2, 200.0), (0.8, 400.0)],
        floor: 1000.0,
    },
    GasCurve {
        gas: "CH4",
        steps: &[(1.7, 200.0), (1.0, 500.0), (0.7, 1000.0)],
        floor: 5000.0,
    },
];

const MQ135_CURVES: [GasCurve; 6] = [
    GasCurve {
        gas: "CO2",
        steps: &[(3.5, 10.0), (2.5, 20.0), (1.5, 100.0), (1.0, 200.0)],
        floor: 500.0,
    },
    GasCurve {
        gas: "CO",
        steps: &[(2.5, 10.0), (1.8, 20.0), (1.2, 100.0), (0.8, 200.0)],
        floor: 500.0,
    },
    // Ethanol
    GasCurve {
        gas: "alcohol",
        steps: &[(2.0, 10.0), (1.5, 50.0), (1.0, 100.0)],
        floor: 300.0,
    },
    GasCurve {
        gas: "NH4",
        steps: &[(2.2, 10.0), (1.5, 50.0), (1.0, 100.0)],
        floor: 200.0,
    },
    GasCurve {
        gas: "toluene",
        steps: &[(1.8, 10.0), (1.2, 50.0), (0.9, 100.0)],
        floor: 200.0,
    },
    GasCurve {
        gas: "acetone",
        steps: &[(1.5, 10.0), (1.0, 50.0), (0.7, 100.0)],
        floor: 300.0,
    },
];

/// Look up the concentration (ppm) for a resistance ratio
pub fn calculate_concentration(ratio: f64, curve: &GasCurve) -> f64 {
    curve
        .steps
        .iter()
        .find(|(threshold, _)| ratio > *threshold)
        .map(|(_, ppm)| *ppm)
        .unwrap_or(curve.floor)
}

/// Normalized sensor resistance `(Vsupply - V) / V`, 0 without signal
pub fn sensor_resistance(voltage: f64) -> f64 {
    if voltage > 0.0 {
        (SUPPLY_VOLTAGE - voltage) / voltage
    } else {
        0.0
    }
}

/// Rs/R0 for a sensor output voltage. Zero when the sensor resistance is not positive.
pub fn resistance_ratio(voltage: f64, r0: f64) -> f64 {
    let rs = sensor_resistance(voltage);
    if rs > 0.0 {
        rs / r0
    } else {
        0.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GasModel {
    Mq9,
    Mq135,
}

impl GasModel {
    pub fn curves(self) -> &'static [GasCurve] {
        match self {
            GasModel::Mq9 => &MQ9_CURVES,
            GasModel::Mq135 => &MQ135_CURVES,
        }
    }

    pub fn channel(self) -> AdcChannel {
        match self {
            GasModel::Mq9 => AdcChannel::Mq9,
            GasModel::Mq135 => AdcChannel::Mq135,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GasReading {
    pub raw_adc: u16,
    pub voltage: f64,
    pub ratio: f64,
    /// One entry per curve of the model, in table order
    pub concentrations: Vec<(&'static str, f64)>,
}

impl GasReading {
    /// Reading with every gas of the model at 0 ppm
    pub fn zeroed(model: GasModel) -> Self {
        GasReading {
            raw_adc: 0,
            voltage: 0.0,
            ratio: 0.0,
            concentrations: model.curves().iter().map(|c| (c.gas, 0.0)).collect(),
        }
    }

    /// Concentration for `gas`, 0 if the model does not measure it
    pub fn concentration(&self, gas: &str) -> f64 {
        self.concentrations
            .iter()
            .find(|(name, _)| *name == gas)
            .map(|(_, ppm)| *ppm)
            .unwrap_or(0.0)
    }
}

pub struct GasSensor {
    platform: PlatformHandle,
    model: GasModel,
    r0: f64,
}

impl GasSensor {
    pub fn new(platform: PlatformHandle, model: GasModel, r0: f64) -> Self {
        Self {
            platform,
            model,
            r0,
        }
    }

    /// Convert one raw ADC count into a full reading
    pub fn convert(&self, raw_adc: u16) -> GasReading {
        let voltage = adc_to_voltage(raw_adc as f64, SUPPLY_VOLTAGE);
        let ratio = resistance_ratio(voltage, self.r0);
        let concentrations = self
            .model
            .curves()
            .iter()
            .map(|curve| (curve.gas, calculate_concentration(ratio, curve)))
            .collect();

        GasReading {
            raw_adc,
            voltage,
            ratio,
            concentrations,
        }
    }

    pub fn try_read(&mut self) -> Result<GasReading, SensorError> {
        let channel = self.model.channel();
        let raw = self.platform.with(|p| p.read_adc(channel))?;
        Ok(self.convert(raw))
    }

    /// Sample the sensor; a fault yields a zeroed reading
    pub fn read(&mut self) -> GasReading {
        self.try_read().unwrap_or_else(|e| {
            warn!("{} read failed, reporting zeros: {}", self.model.channel().name(), e);
            GasReading::zeroed(self.model)
        })
    }
}

/// Mean clean-air resistance of both gas sensors, usable as their R0
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Baseline {
    pub mq9: f64,
    pub mq135: f64,
    /// Samples attempted
    pub samples: u32,
}

/// Sample Rs of both sensors `samples` times, `period` apart, and average them.
///
/// Run in clean air after the heaters have warmed up. A failed sample is
/// skipped for that sensor; a sensor with no good sample reports 0.
pub async fn calibrate_baseline(
    platform: &PlatformHandle,
    samples: u32,
    period: Duration,
) -> Baseline {
    let mut totals = [(0.0, 0u32); 2];

    for n in 1..=samples {
        for (slot, model) in [GasModel::Mq9, GasModel::Mq135].into_iter().enumerate() {
            let channel = model.channel();
            match platform.with(|p| p.read_adc(channel)) {
                Ok(raw) => {
                    let rs = sensor_resistance(adc_to_voltage(raw as f64, SUPPLY_VOLTAGE));
                    totals[slot].0 += rs;
                    totals[slot].1 += 1;
                    debug!("Sample {}: {} Rs = {:.3}", n, channel.name(), rs);
                }
                Err(e) => warn!("Sample {}: {} skipped: {}", n, channel.name(), e),
            }
        }

        if n < samples {
            sleep(period).await;
        }
    }

    let mean = |(total, count): (f64, u32)| if count > 0 { total / count as f64 } else { 0.0 };
    Baseline {
        mq9: mean(totals[0]),
        mq135: mean(totals[1]),
        samples,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensors::SimulatedPlatform;

    const EPS: f64 = 1e-6;

    fn curve(model: GasModel, gas: &str) -> GasCurve {
        *model.curves().iter().find(|c| c.gas == gas).unwrap()
    }

    #[test]
    fn mq9_lpg_steps() {
        let lpg = curve(GasModel::Mq9, "LPG");
        assert_eq!(calculate_concentration(2.5, &lpg), 200.0);
        assert_eq!(calculate_concentration(1.8 + EPS, &lpg), 200.0);
        // Thresholds are exclusive: the boundary falls into the next step down
        assert_eq!(calculate_concentration(1.8, &lpg), 1000.0);
        assert_eq!(calculate_concentration(1.8 - EPS, &lpg), 1000.0);
        assert_eq!(calculate_concentration(1.0, &lpg), 5000.0);
        assert_eq!(calculate_concentration(0.6 + EPS, &lpg), 5000.0);
        assert_eq!(calculate_concentration(0.6, &lpg), 10000.0);
        assert_eq!(calculate_concentration(0.0, &lpg), 10000.0);
    }

    #[test]
    fn every_threshold_is_an_exclusive_lower_bound() {
        for curve in MQ9_CURVES.iter().chain(MQ135_CURVES.iter()) {
            let at = |ratio| calculate_concentration(ratio, curve);
            for (i, &(threshold, ppm)) in curve.steps.iter().enumerate() {
                let below = curve.steps.get(i + 1).map_or(curve.floor, |&(_, next)| next);

                assert_eq!(at(threshold + EPS), ppm, "{} > {}", curve.gas, threshold);
                assert_eq!(at(threshold), below, "{} == {}", curve.gas, threshold);
                assert_eq!(at(threshold - EPS), below, "{} < {}", curve.gas, threshold);
            }
            let top = curve.steps[0];
            assert_eq!(at(top.0 * 10.0), top.1, "{}", curve.gas);
            assert_eq!(at(0.0), curve.floor, "{}", curve.gas);
        }
    }

    #[test]
    fn mq135_co_steps() {
        let co = curve(GasModel::Mq135, "CO");
        assert_eq!(calculate_concentration(2.5 + EPS, &co), 10.0);
        assert_eq!(calculate_concentration(2.5, &co), 20.0);
        assert_eq!(calculate_concentration(1.8, &co), 100.0);
        assert_eq!(calculate_concentration(1.2, &co), 200.0);
        assert_eq!(calculate_concentration(0.8 + EPS, &co), 200.0);
        assert_eq!(calculate_concentration(0.8, &co), 500.0);
    }

    #[test]
    fn ratio_is_zero_without_signal() {
        assert_eq!(resistance_ratio(0.0, DEFAULT_R0_MQ9), 0.0);
        assert_eq!(resistance_ratio(-0.1, DEFAULT_R0_MQ9), 0.0);
        // Full scale means Rs == 0
        assert_eq!(resistance_ratio(3.3, DEFAULT_R0_MQ9), 0.0);
    }

    #[tokio::test]
    async fn baseline_averages_resistance() {
        // 1365 counts is 1.1 V, so Rs = (3.3 - 1.1) / 1.1 = 2
        let platform = PlatformHandle::new(
            SimulatedPlatform::fixed(1365).with_adc(AdcChannel::Mq135, 2730..=2730),
        );
        let baseline = calibrate_baseline(&platform, 5, Duration::ZERO).await;

        assert_eq!(baseline.samples, 5);
        assert!((baseline.mq9 - 2.0).abs() < 1e-9);
        // 2730 counts is 2.2 V, Rs = 0.5
        assert!((baseline.mq135 - 0.5).abs() < 1e-9);
    }

    #[tokio::test]
    async fn baseline_skips_failed_sensor() {
        let platform =
            PlatformHandle::new(SimulatedPlatform::fixed(1365).with_adc_fault(AdcChannel::Mq9));
        let baseline = calibrate_baseline(&platform, 3, Duration::ZERO).await;

        assert_eq!(baseline.mq9, 0.0);
        assert!((baseline.mq135 - 2.0).abs() < 1e-9);
    }

    #[test]
    fn ratio_follows_divider_formula() {
        let ratio = resistance_ratio(1.1, DEFAULT_R0_MQ135);
        assert!((ratio - (2.2 / 1.1) / 5.29).abs() < 1e-12);
    }

    #[test]
    fn convert_fills_every_gas() {
        let platform = PlatformHandle::new(SimulatedPlatform::fixed(0));
        let sensor = GasSensor::new(platform, GasModel::Mq135, DEFAULT_R0_MQ135);

        // Half scale: V = 1.65, Rs = 1.0, ratio = 1 / 5.29
        let reading = sensor.convert(2048);
        assert_eq!(reading.concentrations.len(), 6);
        assert_eq!(reading.concentration("CO2"), 500.0);
        assert_eq!(reading.concentration("acetone"), 300.0);
        assert_eq!(reading.concentration("LPG"), 0.0);
    }

    #[test]
    fn read_falls_back_to_zeros_on_fault() {
        let platform =
            PlatformHandle::new(SimulatedPlatform::fixed(1000).with_adc_fault(AdcChannel::Mq9));
        let mut sensor = GasSensor::new(platform, GasModel::Mq9, DEFAULT_R0_MQ9);

        assert!(sensor.try_read().is_err());
        let reading = sensor.read();
        assert_eq!(reading, GasReading::zeroed(GasModel::Mq9));
        assert_eq!(reading.concentrations.len(), 3);
    }
}
