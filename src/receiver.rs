/// Receiving node: rebuilds canonical packets from incoming compact records
use std::io::{self, Write};
use std::time::Duration;

use log::{error, info, warn};
use tokio::time::sleep;

use crate::feed::write_packet_line;
use crate::models::SensorPacket;
use crate::packet::decode;
use crate::transport::Transport;

/// Pause after a socket error so a persistent fault does not spin the loop
const RECEIVE_BACKOFF: Duration = Duration::from_millis(100);

pub struct ReceiverNode {
    transport: Transport,
    feed: Box<dyn Write + Send>,
}

impl ReceiverNode {
    pub fn new(transport: Transport) -> Self {
        ReceiverNode {
            transport,
            feed: Box::new(io::stdout()),
        }
    }

    pub fn with_feed(mut self, feed: impl Write + Send + 'static) -> Self {
        self.feed = Box::new(feed);
        self
    }

    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    /// Wait for one datagram and emit the packet it carries.
    ///
    /// Returns `None` when the datagram was dropped (bad payload, schema
    /// mismatch or socket error).
    pub async fn receive_one(&mut self) -> Option<SensorPacket> {
        let (sender, record) = match self.transport.receive().await {
            Ok(received) => received,
            Err(e) => {
                error!("Receive failed: {}", e);
                sleep(RECEIVE_BACKOFF).await;
                return None;
            }
        };

        let packet = match decode(&record?) {
            Ok(packet) => packet,
            Err(e) => {
                warn!("Dropping packet from {}: {}", sender, e);
                return None;
            }
        };

        info!(
            "Packet from {} stamped {} {}",
            sender, packet.rtc.date, packet.rtc.time
        );
        if let Err(e) = write_packet_line(&mut self.feed, &packet) {
            error!("Failed to emit packet: {}", e);
        }
        Some(packet)
    }

    /// Receive until the process is stopped
    pub async fn run(&mut self) {
        match self.transport.local_addr() {
            Ok(addr) => info!("Listening for sensor packets on {}", addr),
            Err(e) => warn!("Listening on unknown address: {}", e),
        }
        loop {
            self.receive_one().await;
        }
    }
}
