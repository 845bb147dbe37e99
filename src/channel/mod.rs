//! The datagram channel between ground station and satellite.
//!
//! A channel has exactly one peer that all datagrams are sent to, and a fixed receive timeout.
//!  It does not care who replies: a received datagram is reported together with its sender,
//!  but it is not checked against the peer address.

pub mod lossy;
pub mod udp;

use std::net::SocketAddr;
use async_trait::async_trait;
use bytes::Bytes;
#[cfg(test)] use mockall::automock;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Datagram {
    /// At most `max_size` bytes of the received datagram
    pub payload: Bytes,
    pub sender: SocketAddr,
    /// true if the datagram was longer than `max_size`, i.e. `payload` is incomplete
    pub truncated: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reception {
    Datagram(Datagram),
    /// no datagram arrived within the channel's receive timeout
    TimedOut,
}

/// This is an abstraction for the socket I/O, introduced to facilitate replacing the network
///  in tests and to allow decorating it (see [lossy::LossyChannel])
#[cfg_attr(test, automock)]
#[async_trait]
pub trait DatagramChannel: Send + Sync + 'static {
    /// The address that all datagrams are sent to
    fn peer_addr(&self) -> SocketAddr;

    async fn send(&self, datagram: &[u8]) -> anyhow::Result<()>;

    /// Waits for the next datagram from any sender for up to the channel's receive timeout.
    ///  Errors are socket failures other than the timeout.
    async fn receive(&self, max_size: usize) -> anyhow::Result<Reception>;
}
