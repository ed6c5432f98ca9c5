//! Sensor telemetry pipeline for an air-quality node.
//!
//! The sender samples gas, UV, dust, BME280 and RTC readers once per tick,
//! assembles a canonical packet, logs it to CSV, and transmits a compact
//! positional record to a receiver that rebuilds the canonical packet.

pub mod acquisition;
pub mod config;
pub mod error;
pub mod feed;
pub mod models;
pub mod packet;
pub mod receiver;
pub mod schema;
pub mod sensors;
pub mod storage;
pub mod transport;
pub mod utils;
