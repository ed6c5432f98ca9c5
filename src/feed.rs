/// Line-oriented packet feed shared with display clients
use std::io::{self, Write};

use log::warn;

use crate::models::SensorPacket;

/// Write `packet` as one line of canonical JSON
pub fn write_packet_line<W: Write>(writer: &mut W, packet: &SensorPacket) -> io::Result<()> {
    serde_json::to_writer(&mut *writer, packet)?;
    writer.write_all(b"\n")?;
    writer.flush()
}

/// Parse one feed line. Lines that do not start with `{` (boot banners,
/// debug prints) are ignored.
pub fn parse_packet_line(line: &str) -> Option<SensorPacket> {
    let line = line.trim();
    if !line.starts_with('{') {
        return None;
    }

    match SensorPacket::from_json(line) {
        Ok(packet) => Some(packet),
        Err(e) => {
            warn!("Skipping malformed packet line: {}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Group, Reading};

    fn packet() -> SensorPacket {
        let mut packet = SensorPacket::default();
        packet.rtc.date = "2025/02/12".into();
        packet.rtc.time = "09:55:29".into();
        packet.mq9.insert("LPG", Reading::new(42.0, "ppm"));
        packet.dust_sensor.insert("health_level", Reading::new("Good", ""));
        packet
    }

    #[test]
    fn written_line_parses_back() {
        let mut out = Vec::new();
        write_packet_line(&mut out, &packet()).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.ends_with('\n'));
        assert_eq!(text.lines().count(), 1);
        assert_eq!(parse_packet_line(&text), Some(packet()));
    }

    #[test]
    fn non_json_lines_are_ignored() {
        assert_eq!(parse_packet_line("ets Jun  8 2016 00:22:57"), None);
        assert_eq!(parse_packet_line(""), None);
        assert_eq!(parse_packet_line("[1,2,3]"), None);
    }

    #[test]
    fn malformed_json_is_dropped() {
        assert_eq!(parse_packet_line("{\"rtc\": "), None);
    }

    #[test]
    fn leading_whitespace_is_tolerated() {
        let line = format!("  {}\r\n", packet().to_json().unwrap());
        let parsed = parse_packet_line(&line).unwrap();
        assert_eq!(
            parsed.reading(Group::Mq9, "LPG"),
            Some(&Reading::new(42.0, "ppm"))
        );
    }
}
