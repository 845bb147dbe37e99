use std::cmp::min;
use std::net::SocketAddr;
use std::time::Duration;
use async_trait::async_trait;
use bytes::Bytes;
use tokio::net::UdpSocket;
use tokio::time::timeout;
use tracing::{debug, info, trace};
use crate::channel::{Datagram, DatagramChannel, Reception};

/// [DatagramChannel] on top of a UDP socket bound to an ephemeral local port. The socket is
///  closed when the channel is dropped.
pub struct UdpChannel {
    socket: UdpSocket,
    peer_addr: SocketAddr,
    receive_timeout: Duration,
}

impl UdpChannel {
    pub async fn bind(peer_addr: SocketAddr, receive_timeout: Duration) -> anyhow::Result<UdpChannel> {
        let local_addr: SocketAddr = if peer_addr.is_ipv4() {
            "0.0.0.0:0".parse()?
        }
        else {
            "[::]:0".parse()?
        };

        let socket = UdpSocket::bind(local_addr).await?;
        info!("UDP socket bound to {:?}, sending traffic to satellite at {:?}", socket.local_addr()?, peer_addr);

        Ok(UdpChannel {
            socket,
            peer_addr,
            receive_timeout,
        })
    }

    pub fn local_addr(&self) -> anyhow::Result<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }

    pub fn receive_timeout(&self) -> Duration {
        self.receive_timeout
    }
}

#[async_trait]
impl DatagramChannel for UdpChannel {
    fn peer_addr(&self) -> SocketAddr {
        self.peer_addr
    }

    async fn send(&self, datagram: &[u8]) -> anyhow::Result<()> {
        trace!("UDP socket: sending {} bytes to {:?}", datagram.len(), self.peer_addr);
        self.socket.send_to(datagram, self.peer_addr).await?;
        Ok(())
    }

    async fn receive(&self, max_size: usize) -> anyhow::Result<Reception> {
        // one spare byte to detect datagrams that do not fit
        let mut buf = vec![0u8; max_size + 1];

        match timeout(self.receive_timeout, self.socket.recv_from(&mut buf)).await {
            Err(_) => {
                debug!("no datagram within {:?}", self.receive_timeout);
                Ok(Reception::TimedOut)
            }
            Ok(Err(e)) => Err(e.into()),
            Ok(Ok((num_read, sender))) => {
                trace!("received {} bytes from {:?}", num_read, sender);
                let truncated = num_read > max_size;
                buf.truncate(min(num_read, max_size));
                Ok(Reception::Datagram(Datagram {
                    payload: Bytes::from(buf),
                    sender,
                    truncated,
                }))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    async fn satellite() -> UdpSocket {
        UdpSocket::bind("127.0.0.1:0").await.unwrap()
    }

    #[tokio::test]
    async fn test_send_goes_to_peer() {
        let satellite = satellite().await;
        let channel = UdpChannel::bind(satellite.local_addr().unwrap(), Duration::from_millis(200)).await.unwrap();
        assert_eq!(channel.peer_addr(), satellite.local_addr().unwrap());

        channel.send(&[1, 2, 3]).await.unwrap();

        let mut buf = [0u8; 16];
        let (len, _) = satellite.recv_from(&mut buf).await.unwrap();
        assert_eq!(&buf[..len], &[1, 2, 3]);
    }

    #[rstest]
    #[case::empty(0, 50, false)]
    #[case::small(8, 50, false)]
    #[case::exact_fit(50, 50, false)]
    #[case::one_too_many(51, 50, true)]
    #[case::much_too_big(200, 50, true)]
    #[tokio::test]
    async fn test_receive(#[case] reply_len: usize, #[case] max_size: usize, #[case] expected_truncated: bool) {
        let satellite = satellite().await;
        let channel = UdpChannel::bind(satellite.local_addr().unwrap(), Duration::from_secs(5)).await.unwrap();

        let reply = (0..reply_len).map(|i| i as u8).collect::<Vec<_>>();
        satellite.send_to(&reply, ("127.0.0.1", channel.local_addr().unwrap().port())).await.unwrap();

        match channel.receive(max_size).await.unwrap() {
            Reception::Datagram(datagram) => {
                assert_eq!(datagram.truncated, expected_truncated);
                assert_eq!(datagram.payload.as_ref(), &reply[..min(reply_len, max_size)]);
                assert_eq!(datagram.sender, satellite.local_addr().unwrap());
            }
            Reception::TimedOut => panic!("expected a datagram"),
        }
    }

    #[tokio::test]
    async fn test_receive_times_out() {
        let satellite = satellite().await;
        let channel = UdpChannel::bind(satellite.local_addr().unwrap(), Duration::from_millis(50)).await.unwrap();

        let started = tokio::time::Instant::now();
        assert_eq!(channel.receive(50).await.unwrap(), Reception::TimedOut);
        assert!(started.elapsed() >= Duration::from_millis(50));
    }

    #[tokio::test]
    async fn test_receive_accepts_any_sender() {
        let satellite = satellite().await;
        let stranger = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let channel = UdpChannel::bind(satellite.local_addr().unwrap(), Duration::from_secs(5)).await.unwrap();

        stranger.send_to(&[9], ("127.0.0.1", channel.local_addr().unwrap().port())).await.unwrap();

        match channel.receive(50).await.unwrap() {
            Reception::Datagram(datagram) => assert_eq!(datagram.sender, stranger.local_addr().unwrap()),
            Reception::TimedOut => panic!("expected a datagram"),
        }
    }
}
