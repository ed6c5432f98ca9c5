use log::{error, info};

use airnode_telemetry::config::ReceiverConfig;
use airnode_telemetry::receiver::ReceiverNode;
use airnode_telemetry::transport::Transport;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .format_timestamp_secs()
        .init();

    let config = match ReceiverConfig::new() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return Err(e);
        }
    };

    let transport = match Transport::bind(config.listen_addr).await {
        Ok(transport) => transport,
        Err(e) => {
            error!("Failed to bind {}: {}", config.listen_addr, e);
            return Err(e.into());
        }
    };
    let mut node = ReceiverNode::new(transport);

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
        _ = node.run() => {
            error!("Receive loop stopped unexpectedly");
        }
        Ok(()) = &mut rx => {
            info!("Receiver terminated by user. Exiting gracefully.");
        }
    }

    Ok(())
}
