use std::net::SocketAddr;
use std::time::Duration;
use anyhow::bail;

/// Default satellite endpoint: port 4444 on the local machine
pub const DEFAULT_SATELLITE_HOST: &str = "localhost";
pub const DEFAULT_SATELLITE_PORT: u16 = 4444;

#[derive(Debug, Clone)]
pub struct GroundStationConfig {
    /// All requests go to this address. Replies are accepted from any address.
    pub satellite_addr: SocketAddr,

    /// Deadline for a single attempt, i.e. for receiving a reply after a request was sent
    pub receive_timeout: Duration,

    /// Total number of times a request is sent before the exchange gives up. The default of 5
    ///  attempts at 600ms each amounts to 3 seconds per unanswered request.
    pub max_attempts: u32,

    /// Size of the receive buffer. Replies longer than this are truncated, and truncated
    ///  replies are never decoded.
    pub max_datagram_size: usize,
}

impl GroundStationConfig {
    pub fn new(satellite_addr: SocketAddr) -> GroundStationConfig {
        GroundStationConfig {
            satellite_addr,
            receive_timeout: Duration::from_millis(600),
            max_attempts: 5,
            max_datagram_size: 50,
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.max_attempts == 0 {
            bail!("at least one attempt is required per request");
        }
        if self.receive_timeout.is_zero() {
            bail!("receive timeout must be positive");
        }
        if self.max_datagram_size == 0 {
            bail!("max datagram size must be positive");
        }
        Ok(())
    }

    /// Upper bound for the time an unanswered request blocks the caller
    pub fn total_timeout(&self) -> Duration {
        self.receive_timeout * self.max_attempts
    }
}
