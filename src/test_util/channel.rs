use std::collections::VecDeque;
use std::net::SocketAddr;
use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::RwLock;
use crate::channel::{Datagram, DatagramChannel, Reception};

/// What a [ScriptedChannel] reports for one call to `receive`
#[derive(Debug, Clone)]
pub enum ScriptedReception {
    /// The attempt times out
    Lost,
    /// A datagram from the channel's peer
    Reply(Vec<u8>),
    /// A datagram from some other address
    ReplyFrom(SocketAddr, Vec<u8>),
}

/// A [DatagramChannel] that records everything sent through it and plays back a fixed script
///  of receptions, one per `receive` call. When the script is exhausted, every further attempt
///  times out.
///
/// Replies longer than the requested maximum size are truncated and flagged, like a real
///  socket would do.
#[derive(Debug)]
pub struct ScriptedChannel {
    peer_addr: SocketAddr,
    script: RwLock<VecDeque<ScriptedReception>>,
    sent: RwLock<Vec<Vec<u8>>>,
    num_receive_calls: RwLock<usize>,
}

impl ScriptedChannel {
    pub fn new(peer_addr: SocketAddr, script: Vec<ScriptedReception>) -> ScriptedChannel {
        ScriptedChannel {
            peer_addr,
            script: RwLock::new(script.into()),
            sent: Default::default(),
            num_receive_calls: Default::default(),
        }
    }

    /// A channel whose peer never answers
    pub fn silent(peer_addr: SocketAddr) -> ScriptedChannel {
        Self::new(peer_addr, vec![])
    }

    pub async fn push(&self, reception: ScriptedReception) {
        self.script.write().await
            .push_back(reception);
    }

    pub async fn sent_datagrams(&self) -> Vec<Vec<u8>> {
        self.sent.read().await
            .clone()
    }

    pub async fn num_sent(&self) -> usize {
        self.sent.read().await
            .len()
    }

    pub async fn num_receive_calls(&self) -> usize {
        *self.num_receive_calls.read().await
    }

    pub async fn clear_sent(&self) {
        self.sent.write().await
            .clear();
    }
}

#[async_trait]
impl DatagramChannel for ScriptedChannel {
    fn peer_addr(&self) -> SocketAddr {
        self.peer_addr
    }

    async fn send(&self, datagram: &[u8]) -> anyhow::Result<()> {
        self.sent.write().await
            .push(datagram.to_vec());
        Ok(())
    }

    async fn receive(&self, max_size: usize) -> anyhow::Result<Reception> {
        *self.num_receive_calls.write().await += 1;

        let next = self.script.write().await
            .pop_front();

        let (sender, mut payload) = match next {
            None | Some(ScriptedReception::Lost) => return Ok(Reception::TimedOut),
            Some(ScriptedReception::Reply(payload)) => (self.peer_addr, payload),
            Some(ScriptedReception::ReplyFrom(sender, payload)) => (sender, payload),
        };

        let truncated = payload.len() > max_size;
        payload.truncate(max_size);
        Ok(Reception::Datagram(Datagram {
            payload: Bytes::from(payload),
            sender,
            truncated,
        }))
    }
}
