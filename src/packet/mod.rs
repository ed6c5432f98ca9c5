pub mod assembler;
pub mod compact;

pub use assembler::assemble;
pub use compact::{decode, encode, CompactRecord};

use crate::error::DecodeError;
use crate::models::{Reading, Scalar, SensorPacket};
use crate::schema::{Field, FieldSpec, ValueKind};

/// Store one schema field into a packet, re-attaching the schema's unit.
/// A value of the wrong JSON type is rejected.
pub(crate) fn set_field(
    packet: &mut SensorPacket,
    index: usize,
    spec: &FieldSpec,
    value: Scalar,
) -> Result<(), DecodeError> {
    let mismatch = || DecodeError::FieldType {
        index,
        column: spec.column,
    };

    let kind_matches = match spec.kind {
        ValueKind::Number => value.as_f64().is_some(),
        ValueKind::Text => value.as_str().is_some(),
    };
    if !kind_matches {
        return Err(mismatch());
    }

    match spec.field {
        Field::Date => packet.rtc.date = value.as_str().ok_or_else(mismatch)?.to_string(),
        Field::Time => packet.rtc.time = value.as_str().ok_or_else(mismatch)?.to_string(),
        _ => {
            let group = packet.group_mut(spec.group).ok_or_else(mismatch)?;
            group.insert(spec.key, Reading::new(value, spec.unit));
        }
    }

    Ok(())
}
