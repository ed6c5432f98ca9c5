/// CSV rendering of packets for the local log
use crate::models::SensorPacket;
use crate::packet::encode;
use crate::schema::csv_header;

/// One CSV line per packet, columns in wire order
#[derive(Debug, Clone, PartialEq)]
pub struct LogRecord {
    line: String,
}

impl LogRecord {
    /// Fields are written as-is; they never contain commas
    pub fn from_packet(packet: &SensorPacket) -> Self {
        let line = encode(packet)
            .fields()
            .iter()
            .map(|field| field.to_string())
            .collect::<Vec<_>>()
            .join(",");
        LogRecord { line }
    }

    pub fn header() -> String {
        csv_header()
    }

    pub fn as_str(&self) -> &str {
        &self.line
    }
}
