/// Host-side stand-in for the node's peripherals
///
/// ADC counts are drawn from per-channel ranges, the RTC follows the host clock
/// shifted by whatever offset was last written to it, and the BME280 behaves like
/// a BMP280 (temperature and pressure only). Faults can be injected per channel.
use std::collections::{HashMap, HashSet};
use std::ops::RangeInclusive;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration as StdDuration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use time::{Duration, OffsetDateTime, PrimitiveDateTime};

use crate::error::SensorError;
use crate::sensors::{
    AdcChannel, Bme280Values, OutputPin, PinLevel, RtcDateTime, SensorPlatform,
};

const LEVEL_LOW: u8 = 1;
const LEVEL_HIGH: u8 = 2;

/// Observes the dust LED pin of a [`SimulatedPlatform`]
#[derive(Debug, Clone, Default)]
pub struct LedMonitor {
    level: Arc<AtomicU8>,
    pulses: Arc<AtomicU32>,
}

impl LedMonitor {
    /// Last level written, `None` if the pin was never driven
    pub fn level(&self) -> Option<PinLevel> {
        match self.level.load(Ordering::Relaxed) {
            LEVEL_LOW => Some(PinLevel::Low),
            LEVEL_HIGH => Some(PinLevel::High),
            _ => None,
        }
    }

    /// Number of times the LED was switched on
    pub fn pulses(&self) -> u32 {
        self.pulses.load(Ordering::Relaxed)
    }
}

/// Observes the RTC oscillator-stop flag of a [`SimulatedPlatform`]
#[derive(Debug, Clone, Default)]
pub struct RtcMonitor {
    oscillator_fault: Arc<AtomicBool>,
}

impl RtcMonitor {
    pub fn oscillator_fault(&self) -> bool {
        self.oscillator_fault.load(Ordering::Relaxed)
    }
}

enum Bme280Source {
    Random,
    Fixed(Bme280Values),
}

pub struct SimulatedPlatform {
    adc_ranges: HashMap<AdcChannel, RangeInclusive<u16>>,
    adc_faults: HashSet<AdcChannel>,
    bme280: Bme280Source,
    rtc_fault: bool,
    rtc_offset: Duration,
    rtc_monitor: RtcMonitor,
    led_monitor: LedMonitor,
    real_delays: bool,
    rng: StdRng,
}

impl SimulatedPlatform {
    /// Plausible indoor readings with random jitter
    pub fn new() -> Self {
        let adc_ranges = HashMap::from([
            (AdcChannel::Mq9, 900..=1400),
            (AdcChannel::Mq135, 1500..=2200),
            (AdcChannel::Uv, 1300..=1600),
            (AdcChannel::Dust, 60..=140),
        ]);

        SimulatedPlatform {
            adc_ranges,
            adc_faults: HashSet::new(),
            bme280: Bme280Source::Random,
            rtc_fault: false,
            rtc_offset: Duration::ZERO,
            rtc_monitor: RtcMonitor::default(),
            led_monitor: LedMonitor::default(),
            real_delays: true,
            rng: StdRng::from_entropy(),
        }
    }

    /// Every ADC channel returns `count`; BME280 values are constant. Delays do not sleep.
    pub fn fixed(count: u16) -> Self {
        let mut platform = Self::new();
        for range in platform.adc_ranges.values_mut() {
            *range = count..=count;
        }
        platform.bme280 = Bme280Source::Fixed(Bme280Values {
            temperature: "20.0C".to_string(),
            pressure: "1013.25hPa".to_string(),
            humidity: None,
        });
        platform.real_delays = false;
        platform
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn with_adc(mut self, channel: AdcChannel, range: RangeInclusive<u16>) -> Self {
        self.adc_ranges.insert(channel, range);
        self
    }

    pub fn with_adc_fault(mut self, channel: AdcChannel) -> Self {
        self.adc_faults.insert(channel);
        self
    }

    pub fn with_bme280(
        mut self,
        temperature: &str,
        pressure: &str,
        humidity: Option<&str>,
    ) -> Self {
        self.bme280 = Bme280Source::Fixed(Bme280Values {
            temperature: temperature.to_string(),
            pressure: pressure.to_string(),
            humidity: humidity.map(str::to_string),
        });
        self
    }

    pub fn with_rtc_fault(mut self) -> Self {
        self.rtc_fault = true;
        self
    }

    /// Start with the oscillator-stop flag raised, as after a battery loss
    pub fn with_oscillator_fault(self) -> Self {
        self.rtc_monitor.oscillator_fault.store(true, Ordering::Relaxed);
        self
    }

    pub fn led_monitor(&self) -> LedMonitor {
        self.led_monitor.clone()
    }

    pub fn rtc_monitor(&self) -> RtcMonitor {
        self.rtc_monitor.clone()
    }
}

impl Default for SimulatedPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl SensorPlatform for SimulatedPlatform {
    fn read_adc(&mut self, channel: AdcChannel) -> Result<u16, SensorError> {
        if self.adc_faults.contains(&channel) {
            return Err(SensorError::Adc(channel.name()));
        }
        let range = self.adc_ranges.get(&channel).cloned().unwrap_or(0..=0);
        Ok(self.rng.gen_range(range).min(4095))
    }

    fn set_pin(&mut self, pin: OutputPin, level: PinLevel) -> Result<(), SensorError> {
        match pin {
            OutputPin::DustLed => {
                let code = match level {
                    PinLevel::Low => LEVEL_LOW,
                    PinLevel::High => LEVEL_HIGH,
                };
                let previous = self.led_monitor.level.swap(code, Ordering::Relaxed);
                // LED is active low
                if code == LEVEL_LOW && previous != LEVEL_LOW {
                    self.led_monitor.pulses.fetch_add(1, Ordering::Relaxed);
                }
            }
        }
        Ok(())
    }

    // Blocks the calling thread while the platform lock is held, like the
    // board's busy-wait. One dust pulse holds it for about 10 ms.
    fn delay_us(&mut self, micros: u32) {
        if self.real_delays {
            std::thread::sleep(StdDuration::from_micros(micros as u64));
        }
    }

    fn bme280_values(&mut self) -> Result<Bme280Values, SensorError> {
        match &self.bme280 {
            Bme280Source::Fixed(values) => Ok(values.clone()),
            Bme280Source::Random => {
                let temperature: f64 = self.rng.gen_range(16.0..20.0);
                let pressure: f64 = self.rng.gen_range(1015.0..1020.0);
                Ok(Bme280Values {
                    temperature: format!("{:.1}C", temperature),
                    pressure: format!("{:.2}hPa", pressure),
                    humidity: None,
                })
            }
        }
    }

    fn rtc_datetime(&mut self) -> Result<RtcDateTime, SensorError> {
        if self.rtc_fault {
            return Err(SensorError::I2c("DS3231 did not acknowledge".to_string()));
        }
        let now = OffsetDateTime::now_utc() + self.rtc_offset;
        Ok(RtcDateTime::from_datetime(PrimitiveDateTime::new(
            now.date(),
            now.time(),
        )))
    }

    fn set_rtc_datetime(&mut self, datetime: &RtcDateTime) -> Result<(), SensorError> {
        if self.rtc_fault {
            return Err(SensorError::I2c("DS3231 did not acknowledge".to_string()));
        }
        let target = datetime.to_datetime()?.assume_utc();
        self.rtc_offset = target - OffsetDateTime::now_utc();
        Ok(())
    }

    fn clear_oscillator_fault(&mut self) -> Result<(), SensorError> {
        self.rtc_monitor
            .oscillator_fault
            .store(false, Ordering::Relaxed);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_stay_in_range() {
        let mut sim = SimulatedPlatform::new()
            .with_seed(7)
            .with_adc(AdcChannel::Uv, 10..=20);
        for _ in 0..100 {
            let count = sim.read_adc(AdcChannel::Uv).unwrap();
            assert!((10..=20).contains(&count));
        }
    }

    #[test]
    fn random_bme280_strings_parse() {
        let mut sim = SimulatedPlatform::new().with_seed(3);
        let values = sim.bme280_values().unwrap();
        assert!(values.temperature.ends_with('C'));
        assert!(values.pressure.ends_with("hPa"));
        assert!(values.humidity.is_none());
    }

    #[test]
    fn injected_fault_fails_only_that_channel() {
        let mut sim = SimulatedPlatform::fixed(5).with_adc_fault(AdcChannel::Mq135);
        assert!(sim.read_adc(AdcChannel::Mq135).is_err());
        assert_eq!(sim.read_adc(AdcChannel::Mq9).unwrap(), 5);
    }
}
