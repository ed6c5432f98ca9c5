/// Field table shared by the packet assembler, the compact codec and the CSV log.
///
/// Position in [`FIELDS`] is the wire index of the compact record and the column
/// index of the CSV log. Reordering or resizing this table is a protocol change.
use crate::models::Group;

/// Logical fields of a packet, in wire order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Date,
    Time,
    Mq9Lpg,
    Mq9Co,
    Mq9Ch4,
    Mq135Co2,
    Mq135Co,
    Mq135Alcohol,
    Mq135Nh4,
    Mq135Toluene,
    Mq135Acetone,
    UvRawAdc,
    UvVoltage,
    UvIntensity,
    UvIndex,
    Bme280Temperature,
    Bme280Pressure,
    /// Placeholder value when the board has no humidity sensor; the wire
    /// format does not mark it as simulated
    Bme280Humidity,
    DustRawAdc,
    DustVoltage,
    DustDensity,
    DustAqi,
    DustHealthLevel,
}

/// JSON type a field must carry on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Number,
    Text,
}

#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub field: Field,
    pub group: Group,
    /// Parameter name inside the group
    pub key: &'static str,
    pub unit: &'static str,
    /// CSV header column
    pub column: &'static str,
    pub kind: ValueKind,
}

pub const FIELD_COUNT: usize = 23;

const fn spec(
    field: Field,
    group: Group,
    key: &'static str,
    unit: &'static str,
    column: &'static str,
) -> FieldSpec {
    let kind = match field {
        Field::Date | Field::Time | Field::DustHealthLevel => ValueKind::Text,
        _ => ValueKind::Number,
    };
    FieldSpec {
        field,
        group,
        key,
        unit,
        column,
        kind,
    }
}

pub const FIELDS: [FieldSpec; FIELD_COUNT] = [
    spec(Field::Date, Group::Rtc, "date", "", "date"),
    spec(Field::Time, Group::Rtc, "time", "", "time"),
    spec(Field::Mq9Lpg, Group::Mq9, "LPG", "ppm", "MQ9_LPG"),
    spec(Field::Mq9Co, Group::Mq9, "CO", "ppm", "MQ9_CO"),
    spec(Field::Mq9Ch4, Group::Mq9, "CH4", "ppm", "MQ9_CH4"),
    spec(Field::Mq135Co2, Group::Mq135, "CO2", "ppm", "MQ135_CO2"),
    spec(Field::Mq135Co, Group::Mq135, "CO", "ppm", "MQ135_CO"),
    spec(Field::Mq135Alcohol, Group::Mq135, "alcohol", "ppm", "MQ135_alcohol"),
    spec(Field::Mq135Nh4, Group::Mq135, "NH4", "ppm", "MQ135_NH4"),
    spec(Field::Mq135Toluene, Group::Mq135, "toluene", "ppm", "MQ135_toluene"),
    spec(Field::Mq135Acetone, Group::Mq135, "acetone", "ppm", "MQ135_acetone"),
    spec(Field::UvRawAdc, Group::UvSensor, "raw_adc", "counts", "UV_raw_adc"),
    spec(Field::UvVoltage, Group::UvSensor, "voltage", "V", "UV_voltage"),
    spec(Field::UvIntensity, Group::UvSensor, "uv_intensity", "mW/cm²", "UV_uv_intensity"),
    spec(Field::UvIndex, Group::UvSensor, "uv_index", "index", "UV_uv_index"),
    spec(Field::Bme280Temperature, Group::Bme280, "temperature", "°C", "BME280_temperature"),
    spec(Field::Bme280Pressure, Group::Bme280, "pressure", "hPa", "BME280_pressure"),
    spec(Field::Bme280Humidity, Group::Bme280, "humidity", "%", "BME280_humidity"),
    spec(Field::DustRawAdc, Group::DustSensor, "raw_adc", "counts", "Dust_raw_adc"),
    spec(Field::DustVoltage, Group::DustSensor, "voltage", "V", "Dust_voltage"),
    spec(Field::DustDensity, Group::DustSensor, "dust_density", "µg/m³", "Dust_dust_density"),
    spec(Field::DustAqi, Group::DustSensor, "AQI", "AQI", "Dust_AQI"),
    spec(Field::DustHealthLevel, Group::DustSensor, "health_level", "", "Dust_health_level"),
];

/// CSV header line without trailing newline
pub fn csv_header() -> String {
    FIELDS
        .iter()
        .map(|f| f.column)
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn every_field_appears_once() {
        let ids: HashSet<Field> = FIELDS.iter().map(|f| f.field).collect();
        assert_eq!(ids.len(), FIELD_COUNT);

        let columns: HashSet<&str> = FIELDS.iter().map(|f| f.column).collect();
        assert_eq!(columns.len(), FIELD_COUNT);
    }

    #[test]
    fn wire_positions_are_fixed() {
        assert_eq!(FIELDS[0].field, Field::Date);
        assert_eq!(FIELDS[1].field, Field::Time);
        assert_eq!(FIELDS[2].field, Field::Mq9Lpg);
        assert_eq!(FIELDS[10].field, Field::Mq135Acetone);
        assert_eq!(FIELDS[11].field, Field::UvRawAdc);
        assert_eq!(FIELDS[14].field, Field::UvIndex);
        assert_eq!(FIELDS[15].field, Field::Bme280Temperature);
        assert_eq!(FIELDS[17].field, Field::Bme280Humidity);
        assert_eq!(FIELDS[18].field, Field::DustRawAdc);
        assert_eq!(FIELDS[22].field, Field::DustHealthLevel);
    }

    #[test]
    fn text_fields_are_date_time_and_health() {
        let text: Vec<Field> = FIELDS
            .iter()
            .filter(|f| f.kind == ValueKind::Text)
            .map(|f| f.field)
            .collect();
        assert_eq!(text, vec![Field::Date, Field::Time, Field::DustHealthLevel]);
    }

    #[test]
    fn header_matches_log_layout() {
        assert_eq!(
            csv_header(),
            "date,time,\
             MQ9_LPG,MQ9_CO,MQ9_CH4,\
             MQ135_CO2,MQ135_CO,MQ135_alcohol,MQ135_NH4,MQ135_toluene,MQ135_acetone,\
             UV_raw_adc,UV_voltage,UV_uv_intensity,UV_uv_index,\
             BME280_temperature,BME280_pressure,BME280_humidity,\
             Dust_raw_adc,Dust_voltage,Dust_dust_density,Dust_AQI,Dust_health_level"
        );
    }
}
