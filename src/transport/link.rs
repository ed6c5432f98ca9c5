/// Datagram link between the sensor node and its receiver
use std::net::SocketAddr;

use log::{debug, warn};
use tokio::net::UdpSocket;

use crate::error::TransportError;
use crate::packet::CompactRecord;

/// Largest payload a single radio frame can carry
pub const MAX_PAYLOAD: usize = 250;

const RECV_BUFFER_SIZE: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendStatus {
    Sent(SocketAddr),
    /// No peer registered, nothing was transmitted
    NoPeer,
}

#[derive(Debug)]
pub struct Transport {
    socket: UdpSocket,
    peers: Vec<SocketAddr>,
}

impl Transport {
    pub async fn bind(addr: SocketAddr) -> Result<Self, TransportError> {
        let socket = UdpSocket::bind(addr).await?;
        debug!("Transport bound to {}", socket.local_addr()?);
        Ok(Transport {
            socket,
            peers: Vec::new(),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, TransportError> {
        Ok(self.socket.local_addr()?)
    }

    /// Register a destination. Returns false if it was already known.
    pub fn add_peer(&mut self, peer: SocketAddr) -> bool {
        if self.peers.contains(&peer) {
            return false;
        }
        self.peers.push(peer);
        true
    }

    pub fn peers(&self) -> &[SocketAddr] {
        &self.peers
    }

    /// Send `record` as one datagram
    ///
    /// # Arguments
    /// * `record` - Compact record to transmit
    /// * `peer` - Explicit destination, or `None` for the first registered peer
    ///
    /// # Returns
    /// `SendStatus::NoPeer` when there is nowhere to send, otherwise the destination
    pub async fn send(
        &self,
        record: &CompactRecord,
        peer: Option<SocketAddr>,
    ) -> Result<SendStatus, TransportError> {
        let Some(peer) = peer.or_else(|| self.peers.first().copied()) else {
            debug!("No peer registered, dropping record");
            return Ok(SendStatus::NoPeer);
        };

        let payload = record.to_json()?;
        if payload.len() > MAX_PAYLOAD {
            return Err(TransportError::PayloadTooLarge(payload.len(), MAX_PAYLOAD));
        }

        self.socket.send_to(&payload, peer).await?;
        Ok(SendStatus::Sent(peer))
    }

    /// Wait for the next datagram
    ///
    /// An undecodable payload yields `(sender, None)` so the caller can keep
    /// receiving. Only socket failures are returned as errors.
    pub async fn receive(&self) -> Result<(SocketAddr, Option<CompactRecord>), TransportError> {
        let mut buf = [0u8; RECV_BUFFER_SIZE];
        let (len, sender) = self.socket.recv_from(&mut buf).await?;

        match CompactRecord::from_json(&buf[..len]) {
            Ok(record) => Ok((sender, Some(record))),
            Err(e) => {
                warn!("Undecodable payload ({} bytes) from {}: {}", len, sender, e);
                Ok((sender, None))
            }
        }
    }
}
