use std::fmt;

use serde::de::{self, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A single packet value: a number or a label (the dust health level).
///
/// Integral numbers serialize as JSON integers so that counts, AQI and gas
/// concentrations read back the way the firmware prints them.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Number(f64),
    Text(String),
}

impl Scalar {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Scalar::Number(n) => Some(*n),
            Scalar::Text(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Scalar::Text(s) => Some(s),
            Scalar::Number(_) => None,
        }
    }
}

impl Default for Scalar {
    fn default() -> Self {
        Scalar::Number(0.0)
    }
}

impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        Scalar::Number(value)
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Scalar::Text(value.to_string())
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Number(n) => write!(f, "{}", n),
            Scalar::Text(s) => f.write_str(s),
        }
    }
}

// Largest magnitude at which every integer is still exact in an f64
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

impl Serialize for Scalar {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Scalar::Number(n) if n.fract() == 0.0 && n.abs() < MAX_EXACT_INTEGER => {
                serializer.serialize_i64(*n as i64)
            }
            Scalar::Number(n) => serializer.serialize_f64(*n),
            Scalar::Text(s) => serializer.serialize_str(s),
        }
    }
}

struct ScalarVisitor;

impl<'de> Visitor<'de> for ScalarVisitor {
    type Value = Scalar;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a number or a string")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Scalar, E> {
        Ok(Scalar::Number(v as f64))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Scalar, E> {
        Ok(Scalar::Number(v as f64))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Scalar, E> {
        Ok(Scalar::Number(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Scalar, E> {
        Ok(Scalar::Text(v.to_string()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Scalar, E> {
        Ok(Scalar::Text(v))
    }
}

impl<'de> Deserialize<'de> for Scalar {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(ScalarVisitor)
    }
}

/// Leaf of the packet. The unit is descriptive only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub value: Scalar,
    pub unit: String,
}

impl Reading {
    pub fn new(value: impl Into<Scalar>, unit: &str) -> Self {
        Reading {
            value: value.into(),
            unit: unit.to_string(),
        }
    }
}

/// Ordered mapping of parameter name to reading, e.g. `"LPG" -> 200 ppm`.
///
/// Serialized as a JSON object that keeps insertion order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SensorGroup {
    readings: Vec<(String, Reading)>,
}

impl SensorGroup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Reading> {
        self.readings
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, reading)| reading)
    }

    /// Insert or replace the reading stored under `key`
    pub fn insert(&mut self, key: &str, reading: Reading) {
        match self.readings.iter_mut().find(|(name, _)| name == key) {
            Some((_, slot)) => *slot = reading,
            None => self.readings.push((key.to_string(), reading)),
        }
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Reading)> {
        self.readings.iter().map(|(name, reading)| (name.as_str(), reading))
    }
}

impl Serialize for SensorGroup {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.readings.len()))?;
        for (name, reading) in &self.readings {
            map.serialize_entry(name, reading)?;
        }
        map.end()
    }
}

struct SensorGroupVisitor;

impl<'de> Visitor<'de> for SensorGroupVisitor {
    type Value = SensorGroup;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a map of parameter name to {value, unit}")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<SensorGroup, A::Error> {
        let mut group = SensorGroup::new();
        while let Some((name, reading)) = access.next_entry::<String, Reading>()? {
            group.insert(&name, reading);
        }
        Ok(group)
    }
}

impl<'de> Deserialize<'de> for SensorGroup {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(SensorGroupVisitor)
    }
}

/// Date and time strings as stamped by the RTC, e.g. `2025/02/12` and `09:55:29`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RtcStamp {
    pub date: String,
    pub time: String,
}

/// Named packet groups in their canonical order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Group {
    Rtc,
    Mq9,
    Mq135,
    UvSensor,
    Bme280,
    DustSensor,
}

impl Group {
    pub const ALL: [Group; 6] = [
        Group::Rtc,
        Group::Mq9,
        Group::Mq135,
        Group::UvSensor,
        Group::Bme280,
        Group::DustSensor,
    ];

    /// Key of the group in the canonical JSON object
    pub fn name(self) -> &'static str {
        match self {
            Group::Rtc => "rtc",
            Group::Mq9 => "mq9",
            Group::Mq135 => "mq135",
            Group::UvSensor => "uv_sensor",
            Group::Bme280 => "bme280",
            Group::DustSensor => "dust_sensor",
        }
    }
}

/// Canonical packet for one sampling tick
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SensorPacket {
    pub rtc: RtcStamp,
    #[serde(default)]
    pub mq9: SensorGroup,
    #[serde(default)]
    pub mq135: SensorGroup,
    #[serde(default)]
    pub uv_sensor: SensorGroup,
    #[serde(default)]
    pub bme280: SensorGroup,
    #[serde(default)]
    pub dust_sensor: SensorGroup,
}

impl SensorPacket {
    /// Reading group by name; `None` for the RTC, which carries plain strings
    pub fn group(&self, group: Group) -> Option<&SensorGroup> {
        match group {
            Group::Rtc => None,
            Group::Mq9 => Some(&self.mq9),
            Group::Mq135 => Some(&self.mq135),
            Group::UvSensor => Some(&self.uv_sensor),
            Group::Bme280 => Some(&self.bme280),
            Group::DustSensor => Some(&self.dust_sensor),
        }
    }

    pub fn group_mut(&mut self, group: Group) -> Option<&mut SensorGroup> {
        match group {
            Group::Rtc => None,
            Group::Mq9 => Some(&mut self.mq9),
            Group::Mq135 => Some(&mut self.mq135),
            Group::UvSensor => Some(&mut self.uv_sensor),
            Group::Bme280 => Some(&mut self.bme280),
            Group::DustSensor => Some(&mut self.dust_sensor),
        }
    }

    pub fn reading(&self, group: Group, key: &str) -> Option<&Reading> {
        self.group(group).and_then(|g| g.get(key))
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integral_numbers_serialize_without_fraction() {
        let json = serde_json::to_string(&Scalar::Number(42.0)).unwrap();
        assert_eq!(json, "42");

        let json = serde_json::to_string(&Scalar::Number(25.61)).unwrap();
        assert_eq!(json, "25.61");
    }

    #[test]
    fn scalar_accepts_numbers_and_strings() {
        let values: Vec<Scalar> = serde_json::from_str(r#"[1, -3, 2.5, "Good"]"#).unwrap();
        assert_eq!(
            values,
            vec![
                Scalar::Number(1.0),
                Scalar::Number(-3.0),
                Scalar::Number(2.5),
                Scalar::Text("Good".into()),
            ]
        );
        assert!(serde_json::from_str::<Scalar>("null").is_err());
    }

    #[test]
    fn group_keeps_insertion_order_in_json() {
        let mut group = SensorGroup::new();
        group.insert("LPG", Reading::new(200.0, "ppm"));
        group.insert("CO", Reading::new(100.0, "ppm"));
        group.insert("CH4", Reading::new(500.0, "ppm"));
        group.insert("CO", Reading::new(400.0, "ppm"));

        let json = serde_json::to_string(&group).unwrap();
        assert_eq!(
            json,
            concat!(
                r#"{"LPG":{"value":200,"unit":"ppm"},"#,
                r#""CO":{"value":400,"unit":"ppm"},"#,
                r#""CH4":{"value":500,"unit":"ppm"}}"#
            )
        );

        let back: SensorGroup = serde_json::from_str(&json).unwrap();
        assert_eq!(back, group);
    }

    #[test]
    fn packet_json_uses_group_names() {
        let mut packet = SensorPacket::default();
        packet.rtc.date = "2025/02/12".into();
        packet
            .dust_sensor
            .insert("health_level", Reading::new("Good", ""));

        let json = packet.to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        for group in Group::ALL {
            assert!(value.get(group.name()).is_some(), "missing {}", group.name());
        }
        assert_eq!(value["dust_sensor"]["health_level"]["value"], "Good");

        assert_eq!(SensorPacket::from_json(&json).unwrap(), packet);
    }
}
