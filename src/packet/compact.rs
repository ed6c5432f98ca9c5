/// Compact positional encoding used on the radio link
///
/// A compact record is a JSON array of exactly 23 scalars in schema order, e.g.
/// `["2025/02/12","09:55:29",200,100,200,500,...,"Moderate"]`. Units are not sent;
/// the decoder re-attaches them from the schema.
use serde::{Deserialize, Serialize};

use crate::error::DecodeError;
use crate::models::{Scalar, SensorPacket};
use crate::packet::set_field;
use crate::schema::{Field, ValueKind, FIELDS, FIELD_COUNT};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Scalar>", into = "Vec<Scalar>")]
pub struct CompactRecord {
    fields: Vec<Scalar>,
}

impl TryFrom<Vec<Scalar>> for CompactRecord {
    type Error = DecodeError;

    fn try_from(fields: Vec<Scalar>) -> Result<Self, Self::Error> {
        if fields.len() != FIELD_COUNT {
            return Err(DecodeError::FieldCount {
                expected: FIELD_COUNT,
                actual: fields.len(),
            });
        }
        Ok(CompactRecord { fields })
    }
}

impl From<CompactRecord> for Vec<Scalar> {
    fn from(record: CompactRecord) -> Self {
        record.fields
    }
}

impl CompactRecord {
    pub fn fields(&self) -> &[Scalar] {
        &self.fields
    }

    pub fn get(&self, field: Field) -> Option<&Scalar> {
        FIELDS
            .iter()
            .position(|spec| spec.field == field)
            .and_then(|index| self.fields.get(index))
    }

    pub fn to_json(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    /// Parse a datagram payload
    pub fn from_json(payload: &[u8]) -> Result<Self, DecodeError> {
        let text = std::str::from_utf8(payload)?;
        let fields: Vec<Scalar> = serde_json::from_str(text)?;
        Self::try_from(fields)
    }
}

/// Project a packet onto the 23 wire fields. Missing readings encode as 0,
/// or as an empty string for text fields.
pub fn encode(packet: &SensorPacket) -> CompactRecord {
    let fields = FIELDS
        .iter()
        .map(|spec| match spec.field {
            Field::Date => Scalar::Text(packet.rtc.date.clone()),
            Field::Time => Scalar::Text(packet.rtc.time.clone()),
            _ => match packet.reading(spec.group, spec.key) {
                Some(reading) => reading.value.clone(),
                None if spec.kind == ValueKind::Text => Scalar::Text(String::new()),
                None => Scalar::Number(0.0),
            },
        })
        .collect();

    CompactRecord { fields }
}

/// Rebuild the canonical packet, re-attaching the fixed units
pub fn decode(record: &CompactRecord) -> Result<SensorPacket, DecodeError> {
    let mut packet = SensorPacket::default();
    for (index, (spec, value)) in FIELDS.iter().zip(record.fields.iter()).enumerate() {
        set_field(&mut packet, index, spec, value.clone())?;
    }

    Ok(packet)
}
