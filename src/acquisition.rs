/// Fixed-period sampling loop of the sensor node
use std::io::{self, Write};
use std::net::SocketAddr;
use std::time::Duration;

use log::{debug, error, info, warn};
use tokio::time::sleep;

use crate::feed::write_packet_line;
use crate::models::SensorPacket;
use crate::packet::{assemble, encode};
use crate::sensors::{
    Bme280Reading, Bme280Sensor, DustReading, DustSensor, GasModel, GasReading, GasSensor,
    PlatformHandle, RtcClock, RtcDateTime, UvReading, UvSensor,
};
use crate::storage::{StorageLogger, WriteOutcome};
use crate::transport::{SendStatus, Transport};

/// One tick's raw readings, before assembly
#[derive(Debug, Clone)]
pub struct Readings {
    pub rtc: RtcDateTime,
    pub mq9: GasReading,
    pub mq135: GasReading,
    pub uv: UvReading,
    pub bme: Bme280Reading,
    pub dust: DustReading,
}

impl Readings {
    pub fn packet(&self) -> SensorPacket {
        assemble(&self.rtc, &self.mq9, &self.mq135, &self.uv, &self.bme, &self.dust)
    }
}

/// Every reader of the node, built once at startup
pub struct SensorSuite {
    rtc: RtcClock,
    mq9: GasSensor,
    mq135: GasSensor,
    uv: UvSensor,
    bme: Bme280Sensor,
    dust: DustSensor,
}

impl SensorSuite {
    pub fn new(platform: PlatformHandle, mq9_r0: f64, mq135_r0: f64) -> Self {
        SensorSuite {
            rtc: RtcClock::new(platform.clone()),
            mq9: GasSensor::new(platform.clone(), GasModel::Mq9, mq9_r0),
            mq135: GasSensor::new(platform.clone(), GasModel::Mq135, mq135_r0),
            uv: UvSensor::new(platform.clone()),
            bme: Bme280Sensor::new(platform.clone()),
            dust: DustSensor::new(platform),
        }
    }

    pub fn rtc_mut(&mut self) -> &mut RtcClock {
        &mut self.rtc
    }

    /// Sample every reader. Faulty readers contribute zeroed values.
    pub fn read_all(&mut self) -> Readings {
        Readings {
            rtc: self.rtc.read(),
            mq9: self.mq9.read(),
            mq135: self.mq135.read(),
            uv: self.uv.read(),
            bme: self.bme.read(),
            dust: self.dust.read(),
        }
    }
}

/// What happened during one tick
#[derive(Debug, Clone)]
pub struct TickReport {
    pub packet: SensorPacket,
    pub storage: WriteOutcome,
    /// Destination of the transmitted record, if one was sent
    pub sent: Option<SocketAddr>,
}

pub struct AcquisitionLoop {
    suite: SensorSuite,
    storage: StorageLogger,
    transport: Transport,
    period: Duration,
    feed: Box<dyn Write + Send>,
    log_started: bool,
    humidity_warned: bool,
}

impl AcquisitionLoop {
    /// `storage` should already have been through `init()`
    pub fn new(
        suite: SensorSuite,
        storage: StorageLogger,
        transport: Transport,
        period: Duration,
    ) -> Self {
        AcquisitionLoop {
            suite,
            storage,
            transport,
            period,
            feed: Box::new(io::stdout()),
            log_started: false,
            humidity_warned: false,
        }
    }

    /// Emit packets to `feed` instead of stdout
    pub fn with_feed(mut self, feed: impl Write + Send + 'static) -> Self {
        self.feed = Box::new(feed);
        self
    }

    pub fn storage(&self) -> &StorageLogger {
        &self.storage
    }

    /// Run one complete tick: read, assemble, emit, log, encode, send.
    ///
    /// Every step absorbs its own failure so a later step always runs.
    pub async fn tick(&mut self) -> TickReport {
        // Sample
        let readings = self.suite.read_all();
        if readings.bme.humidity.is_simulated() {
            if !self.humidity_warned {
                warn!("No humidity sensor found, humidity values are simulated");
                self.humidity_warned = true;
            }
            debug!("Humidity {:.2} is simulated", readings.bme.humidity.value());
        }
        let packet = readings.packet();

        // Emit
        if let Err(e) = write_packet_line(&mut self.feed, &packet) {
            error!("Failed to emit packet: {}", e);
        }

        // Store locally before touching the radio
        if !self.log_started {
            self.storage.create_log(&readings.rtc);
            self.log_started = true;
        }
        let storage = self.storage.append(&packet);

        // Transmit
        let record = encode(&packet);
        let sent = match self.transport.send(&record, None).await {
            Ok(SendStatus::Sent(peer)) => {
                debug!("Sent record to {}", peer);
                Some(peer)
            }
            Ok(SendStatus::NoPeer) => None,
            Err(e) => {
                warn!("Transmission failed: {}", e);
                None
            }
        };

        TickReport {
            packet,
            storage,
            sent,
        }
    }

    /// Tick forever at the configured period. Drift is not corrected.
    pub async fn run(&mut self) {
        info!("Starting acquisition every {} ms", self.period.as_millis());
        if self.transport.peers().is_empty() {
            warn!("No peer registered, packets will not be transmitted");
        }

        loop {
            let report = self.tick().await;
            debug!(
                "Tick {} {}: storage {:?}, sent to {:?}",
                report.packet.rtc.date, report.packet.rtc.time, report.storage, report.sent
            );
            sleep(self.period).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Group, Reading, Scalar};
    use crate::sensors::{AdcChannel, SimulatedPlatform};
    use crate::storage::StorageState;

    fn suite(platform: SimulatedPlatform) -> SensorSuite {
        SensorSuite::new(PlatformHandle::new(platform), 0.49, 5.29)
    }

    async fn node(platform: SimulatedPlatform) -> AcquisitionLoop {
        let transport = Transport::bind("127.0.0.1:0".parse().unwrap()).await.unwrap();
        let mut storage = StorageLogger::new(std::env::temp_dir().join(format!(
            "airnode-acq-missing-{}",
            std::process::id()
        )));
        storage.init();
        AcquisitionLoop::new(suite(platform), storage, transport, Duration::from_millis(1))
            .with_feed(io::sink())
    }

    #[test]
    fn readings_assemble_into_full_packet() {
        let mut suite = suite(SimulatedPlatform::fixed(1000));
        let packet = suite.read_all().packet();

        assert_eq!(packet.mq9.len(), 3);
        assert_eq!(packet.mq135.len(), 6);
        assert_eq!(packet.bme280.get("temperature"), Some(&Reading::new(20.0, "°C")));
        assert_eq!(
            packet.reading(Group::UvSensor, "raw_adc").unwrap().value,
            Scalar::Number(1000.0)
        );
    }

    #[test]
    fn faulty_channel_reads_as_zero() {
        let mut suite = suite(SimulatedPlatform::fixed(1000).with_adc_fault(AdcChannel::Mq9));
        let packet = suite.read_all().packet();

        for (_, reading) in packet.mq9.iter() {
            assert_eq!(reading.value, Scalar::Number(0.0));
        }
        assert_ne!(
            packet.reading(Group::UvSensor, "voltage").unwrap().value,
            Scalar::Number(0.0)
        );
    }

    #[tokio::test]
    async fn tick_survives_missing_storage_and_peer() {
        let mut node = node(SimulatedPlatform::fixed(1200)).await;
        assert_eq!(node.storage().state(), StorageState::Unavailable);

        let first = node.tick().await;
        let second = node.tick().await;
        assert_eq!(first.storage, WriteOutcome::Skipped);
        assert_eq!(second.storage, WriteOutcome::Skipped);
        assert!(first.sent.is_none());
        assert!(!second.packet.rtc.date.is_empty());
    }

    #[tokio::test]
    async fn humidity_is_marked_simulated_without_sensor() {
        let mut node = node(SimulatedPlatform::fixed(1200)).await;
        let report = node.tick().await;

        let humidity = report
            .packet
            .reading(Group::Bme280, "humidity")
            .and_then(|r| r.value.as_f64())
            .unwrap();
        assert!((23.0..=26.0).contains(&humidity));
        assert!(node.humidity_warned);
    }
}
