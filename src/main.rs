use log::{error, info, warn};
use time::OffsetDateTime;

use airnode_telemetry::acquisition::{AcquisitionLoop, SensorSuite};
use airnode_telemetry::config::NodeConfig;
use airnode_telemetry::sensors::{PlatformHandle, SimulatedPlatform};
use airnode_telemetry::storage::StorageLogger;
use airnode_telemetry::transport::Transport;
use airnode_telemetry::utils::format_datetime;

async fn build_node(config: NodeConfig) -> Result<AcquisitionLoop, Box<dyn std::error::Error>> {
    let platform = PlatformHandle::new(SimulatedPlatform::new());
    let mut suite = SensorSuite::new(platform, config.mq9_r0, config.mq135_r0);

    // Set the clock before the first tick names the log file
    if let Some(offset) = config.rtc_sync_offset_hours {
        if let Err(e) = suite.rtc_mut().sync_from(OffsetDateTime::now_utc(), offset) {
            warn!("RTC sync failed, keeping current time: {}", e);
        }
    }

    let mut storage = StorageLogger::new(&config.log_dir);
    storage.init();

    let mut transport = Transport::bind(config.bind_addr).await?;
    if let Some(peer) = config.peer_addr {
        transport.add_peer(peer);
        info!("Transmitting to {}", peer);
    }

    Ok(AcquisitionLoop::new(suite, storage, transport, config.tick_period))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .format_timestamp_secs()
        .init();

    // Load configuration
    let config = match NodeConfig::new() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return Err(e);
        }
    };

    info!(
        "Sensor node starting at {}",
        format_datetime(&OffsetDateTime::now_utc())
    );
    let mut node = build_node(config).await?;

    // Handle Ctrl+C gracefully
    let (tx, mut rx) = tokio::sync::oneshot::channel();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                let _ = tx.send(());
            }
            Err(e) => error!("Failed to listen for Ctrl+C: {}", e),
        }
    });

    // Run acquisition until shutdown signal
    tokio::select! {
        _ = node.run() => {
            error!("Acquisition loop stopped unexpectedly");
        }
        Ok(()) = &mut rx => {
            info!("Program terminated by user. Exiting gracefully.");
        }
    }

    Ok(())
}
