use log::{error, info};

use airnode_telemetry::config::CalibrationConfig;
use airnode_telemetry::sensors::gas::calibrate_baseline;
use airnode_telemetry::sensors::{PlatformHandle, SimulatedPlatform};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .format_timestamp_secs()
        .init();

    let config = match CalibrationConfig::new() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return Err(e);
        }
    };

    let platform = PlatformHandle::new(SimulatedPlatform::new());
    info!(
        "Measuring clean-air baseline: {} samples every {} ms",
        config.samples,
        config.period.as_millis()
    );

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

    tokio::select! {
        baseline = calibrate_baseline(&platform, config.samples, config.period) => {
            // Ready to paste into .env
            println!("MQ9_R0={:.3}", baseline.mq9);
            println!("MQ135_R0={:.3}", baseline.mq135);
            info!("Baseline measured over {} samples", baseline.samples);
        }
        Ok(()) = &mut rx => {
            info!("Calibration cancelled by user.");
        }
    }

    Ok(())
}
