/// Builds the canonical packet from one tick's sensor readings
use log::error;

use crate::models::{Scalar, SensorPacket};
use crate::packet::set_field;
use crate::schema::{Field, FIELDS};
use crate::sensors::{Bme280Reading, DustReading, GasReading, RtcDateTime, UvReading};
use crate::utils::round2;

/// Assemble all six groups of a packet.
///
/// Floating-point values are rounded to two decimals; counts, the averaged UV
/// count, concentrations and the AQI are carried as-is. A reader that failed has
/// already substituted zeros, so the packet is always complete.
pub fn assemble(
    rtc: &RtcDateTime,
    mq9: &GasReading,
    mq135: &GasReading,
    uv: &UvReading,
    bme: &Bme280Reading,
    dust: &DustReading,
) -> SensorPacket {
    let mut packet = SensorPacket::default();

    for (index, spec) in FIELDS.iter().enumerate() {
        let value = match spec.field {
            Field::Date => Scalar::Text(rtc.date_string()),
            Field::Time => Scalar::Text(rtc.time_string()),

            Field::Mq9Lpg | Field::Mq9Co | Field::Mq9Ch4 => {
                Scalar::Number(mq9.concentration(spec.key))
            }
            Field::Mq135Co2
            | Field::Mq135Co
            | Field::Mq135Alcohol
            | Field::Mq135Nh4
            | Field::Mq135Toluene
            | Field::Mq135Acetone => Scalar::Number(mq135.concentration(spec.key)),

            Field::UvRawAdc => Scalar::Number(uv.raw_adc),
            Field::UvVoltage => Scalar::Number(round2(uv.reported_voltage())),
            Field::UvIntensity => Scalar::Number(round2(uv.intensity)),
            Field::UvIndex => Scalar::Number(round2(uv.index)),

            Field::Bme280Temperature => Scalar::Number(round2(bme.temperature)),
            Field::Bme280Pressure => Scalar::Number(round2(bme.pressure)),
            Field::Bme280Humidity => Scalar::Number(round2(bme.humidity.value())),

            Field::DustRawAdc => Scalar::Number(dust.raw_adc as f64),
            Field::DustVoltage => Scalar::Number(round2(dust.reported_voltage())),
            Field::DustDensity => Scalar::Number(round2(dust.density)),
            Field::DustAqi => Scalar::Number(dust.aqi as f64),
            Field::DustHealthLevel => Scalar::Text(dust.health_level.label().to_string()),
        };

        if let Err(e) = set_field(&mut packet, index, spec, value) {
            error!("Schema mismatch while assembling packet: {}", e);
        }
    }

    packet
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Group, Reading};
    use crate::sensors::{GasModel, HealthLevel, Humidity};

    fn sample_readings() -> (
        RtcDateTime,
        GasReading,
        GasReading,
        UvReading,
        Bme280Reading,
        DustReading,
    ) {
        let rtc = RtcDateTime::new(2025, 2, 12, 9, 55, 29).unwrap();
        let mq9 = GasReading {
            raw_adc: 1200,
            voltage: 0.967,
            ratio: 4.9,
            concentrations: vec![("LPG", 200.0), ("CO", 100.0), ("CH4", 200.0)],
        };
        let mq135 = GasReading {
            raw_adc: 1800,
            voltage: 1.45,
            ratio: 0.24,
            concentrations: vec![
                ("CO2", 500.0),
                ("CO", 500.0),
                ("alcohol", 300.0),
                ("NH4", 200.0),
                ("toluene", 200.0),
                ("acetone", 300.0),
            ],
        };
        let uv = UvReading::from_average(1450.375);
        let bme = Bme280Reading {
            temperature: 18.456,
            pressure: 1016.123,
            humidity: Humidity::Simulated(24.4449),
        };
        let dust = DustReading::from_raw(100);
        (rtc, mq9, mq135, uv, bme, dust)
    }

    #[test]
    fn packet_has_all_groups_and_units() {
        let (rtc, mq9, mq135, uv, bme, dust) = sample_readings();
        let packet = assemble(&rtc, &mq9, &mq135, &uv, &bme, &dust);

        assert_eq!(packet.rtc.date, "2025/02/12");
        assert_eq!(packet.rtc.time, "09:55:29");
        assert_eq!(packet.mq9.len(), 3);
        assert_eq!(packet.mq135.len(), 6);
        assert_eq!(packet.uv_sensor.len(), 4);
        assert_eq!(packet.bme280.len(), 3);
        assert_eq!(packet.dust_sensor.len(), 5);

        assert_eq!(
            packet.reading(Group::Mq9, "LPG"),
            Some(&Reading::new(200.0, "ppm"))
        );
        assert_eq!(
            packet.reading(Group::Mq135, "alcohol"),
            Some(&Reading::new(300.0, "ppm"))
        );
        assert_eq!(packet.reading(Group::Bme280, "temperature").unwrap().unit, "°C");
        assert_eq!(packet.reading(Group::DustSensor, "dust_density").unwrap().unit, "µg/m³");
    }

    #[test]
    fn floats_are_rounded_to_two_places() {
        let (rtc, mq9, mq135, uv, bme, dust) = sample_readings();
        let packet = assemble(&rtc, &mq9, &mq135, &uv, &bme, &dust);

        let value = |group, key| packet.reading(group, key).unwrap().value.clone();
        assert_eq!(value(Group::Bme280, "temperature"), Scalar::Number(18.46));
        assert_eq!(value(Group::Bme280, "pressure"), Scalar::Number(1016.12));
        assert_eq!(value(Group::Bme280, "humidity"), Scalar::Number(24.44));
        assert_eq!(value(Group::UvSensor, "raw_adc"), Scalar::Number(1450.375));
        assert_eq!(value(Group::UvSensor, "voltage"), Scalar::Number(1.16));
        assert_eq!(value(Group::DustSensor, "raw_adc"), Scalar::Number(100.0));
        assert_eq!(value(Group::DustSensor, "voltage"), Scalar::Number(0.12));
    }

    #[test]
    fn reported_voltages_use_fixed_scales() {
        let (rtc, mq9, mq135, _, bme, _) = sample_readings();
        let uv = UvReading::from_average(2500.0);
        let dust = DustReading::from_raw(2460);
        let packet = assemble(&rtc, &mq9, &mq135, &uv, &bme, &dust);

        let value = |group, key| packet.reading(group, key).unwrap().value.clone();
        // 2500 × 0.0008 and 2460 / 820, not the ADC reference scaling
        assert_eq!(value(Group::UvSensor, "voltage"), Scalar::Number(2.0));
        assert_eq!(value(Group::DustSensor, "voltage"), Scalar::Number(3.0));
        assert_eq!(round2(uv.voltage), 2.01);
        assert_eq!(round2(dust.voltage), 3.0);
    }

    #[test]
    fn failed_readers_still_produce_complete_packet() {
        let packet = assemble(
            &RtcDateTime::default(),
            &GasReading::zeroed(GasModel::Mq9),
            &GasReading::zeroed(GasModel::Mq135),
            &UvReading::default(),
            &Bme280Reading::default(),
            &DustReading::default(),
        );

        for spec in FIELDS.iter().filter(|s| s.group != Group::Rtc) {
            let reading = packet
                .reading(spec.group, spec.key)
                .unwrap_or_else(|| panic!("missing {}", spec.column));
            if spec.field != Field::DustHealthLevel {
                assert_eq!(reading.value, Scalar::Number(0.0), "{}", spec.column);
            }
        }
        assert_eq!(
            packet.reading(Group::DustSensor, "health_level").unwrap().value,
            Scalar::Text(HealthLevel::Good.label().to_string())
        );
    }
}
