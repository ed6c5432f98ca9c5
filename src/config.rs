use std::env;
use std::error::Error;
use std::fmt::Display;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::sensors::gas::{DEFAULT_R0_MQ135, DEFAULT_R0_MQ9};

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:0";
const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:4210";
const DEFAULT_LOG_DIR: &str = "sd";
const DEFAULT_TICK_PERIOD_MS: u64 = 1000;
const DEFAULT_CALIBRATION_SAMPLES: u32 = 60;
const DEFAULT_CALIBRATION_PERIOD_MS: u64 = 1000;

/// Settings of the sensor node
#[derive(Debug, Clone)]
pub struct NodeConfig {
    pub peer_addr: Option<SocketAddr>,
    pub bind_addr: SocketAddr,
    pub log_dir: PathBuf,
    pub mq9_r0: f64,
    pub mq135_r0: f64,
    pub tick_period: Duration,
    /// Hours east of UTC used to set the RTC at startup; `None` leaves it alone
    pub rtc_sync_offset_hours: Option<i8>,
}

impl NodeConfig {
    pub fn new() -> Result<Self, Box<dyn Error>> {
        // Load environment variables
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary variable source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, Box<dyn Error>> {
        let bind_addr = match parse_var(&lookup, "BIND_ADDR")? {
            Some(addr) => addr,
            None => DEFAULT_BIND_ADDR.parse()?,
        };

        let mq9_r0 = parse_var(&lookup, "MQ9_R0")?.unwrap_or(DEFAULT_R0_MQ9);
        let mq135_r0 = parse_var(&lookup, "MQ135_R0")?.unwrap_or(DEFAULT_R0_MQ135);
        for (key, r0) in [("MQ9_R0", mq9_r0), ("MQ135_R0", mq135_r0)] {
            if !(r0.is_finite() && r0 > 0.0) {
                return Err(format!("{} must be a positive number, got {}", key, r0).into());
            }
        }

        let tick_ms = parse_var(&lookup, "TICK_PERIOD_MS")?.unwrap_or(DEFAULT_TICK_PERIOD_MS);
        if tick_ms == 0 {
            return Err("TICK_PERIOD_MS must be greater than zero".into());
        }

        let rtc_sync_offset_hours: Option<i8> = parse_var(&lookup, "RTC_SYNC_UTC_OFFSET_HOURS")?;
        if let Some(offset) = rtc_sync_offset_hours {
            if !(-12..=14).contains(&offset) {
                return Err(format!("RTC_SYNC_UTC_OFFSET_HOURS out of range: {}", offset).into());
            }
        }

        Ok(NodeConfig {
            peer_addr: parse_var(&lookup, "PEER_ADDR")?,
            bind_addr,
            log_dir: lookup("LOG_DIR")
                .filter(|dir| !dir.trim().is_empty())
                .map_or_else(|| PathBuf::from(DEFAULT_LOG_DIR), PathBuf::from),
            mq9_r0,
            mq135_r0,
            tick_period: Duration::from_millis(tick_ms),
            rtc_sync_offset_hours,
        })
    }
}

/// Settings of the receiving node
#[derive(Debug, Clone)]
pub struct ReceiverConfig {
    pub listen_addr: SocketAddr,
}

impl ReceiverConfig {
    pub fn new() -> Result<Self, Box<dyn Error>> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, Box<dyn Error>> {
        let listen_addr = match parse_var(&lookup, "LISTEN_ADDR")? {
            Some(addr) => addr,
            None => DEFAULT_LISTEN_ADDR.parse()?,
        };
        Ok(ReceiverConfig { listen_addr })
    }
}

/// Settings of the clean-air baseline run
#[derive(Debug, Clone)]
pub struct CalibrationConfig {
    pub samples: u32,
    pub period: Duration,
}

impl CalibrationConfig {
    pub fn new() -> Result<Self, Box<dyn Error>> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, Box<dyn Error>> {
        let samples =
            parse_var(&lookup, "CALIBRATION_SAMPLES")?.unwrap_or(DEFAULT_CALIBRATION_SAMPLES);
        if samples == 0 {
            return Err("CALIBRATION_SAMPLES must be greater than zero".into());
        }
        let period_ms =
            parse_var(&lookup, "CALIBRATION_PERIOD_MS")?.unwrap_or(DEFAULT_CALIBRATION_PERIOD_MS);

        Ok(CalibrationConfig {
            samples,
            period: Duration::from_millis(period_ms),
        })
    }
}

/// Parse `key` if it is set and not blank
fn parse_var<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<Option<T>, Box<dyn Error>>
where
    T: FromStr,
    T::Err: Display,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| format!("invalid {} `{}`: {}", key, raw, e).into()),
        _ => Ok(None),
    }
}
