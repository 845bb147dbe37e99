use std::sync::Arc;
use anyhow::bail;
use bytes::BytesMut;
use tracing::{debug, info, span, warn, Instrument, Level};
use crate::channel::udp::UdpChannel;
use crate::channel::{Datagram, DatagramChannel, Reception};
use crate::config::GroundStationConfig;
use crate::protocol::message_id::{MessageId, MessageIdAllocator};
use crate::protocol::request::{Command, Request};
use crate::protocol::response::Response;

/// Terminal state of a single exchange, i.e. of one command with all of its retries
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ExchangeOutcome {
    Delivered(Response),
    /// No reply arrived in any of the attempts
    TimedOut,
    /// A reply arrived, but it did not fit the receive buffer or did not decode as the reply to
    ///  the request's kind. This ends the exchange without further retries.
    Malformed,
}

/// ReliableExchange turns a command into a request and tries to get the satellite's reply to
///  it over an unreliable channel: It sends the request and waits for a reply, re-sending the
///  same request (same id, same bytes) every time the wait times out, up to a configured number
///  of attempts.
///
/// Only a single request is in flight at any given time (`execute` requires exclusive access),
///  and whatever datagram arrives next is taken to be the reply to it. There is no id in the
///  reply that could be checked.
pub struct ReliableExchange {
    config: Arc<GroundStationConfig>,
    channel: Arc<dyn DatagramChannel>,
    message_ids: MessageIdAllocator,
}

impl ReliableExchange {
    /// Creates an exchange talking UDP to the configured satellite address
    pub async fn connect(config: Arc<GroundStationConfig>) -> anyhow::Result<ReliableExchange> {
        config.validate()?;
        let channel = UdpChannel::bind(config.satellite_addr, config.receive_timeout).await?;
        Self::new(config, Arc::new(channel))
    }

    pub fn new(config: Arc<GroundStationConfig>, channel: Arc<dyn DatagramChannel>) -> anyhow::Result<ReliableExchange> {
        config.validate()?;

        Ok(ReliableExchange {
            config,
            channel,
            message_ids: MessageIdAllocator::new(),
        })
    }

    pub fn config(&self) -> &GroundStationConfig {
        &self.config
    }

    /// The id that the next request will be sent with
    pub fn next_message_id(&self) -> Option<MessageId> {
        self.message_ids.peek_next_id()
    }

    /// Runs a single exchange for the command. Timeouts and undecodable replies are regular
    ///  outcomes, errors are reserved for failures of the underlying socket (which end the
    ///  exchange right away), for running out of message ids, and for [Command::Quit] which
    ///  is the caller's business and never goes on the wire.
    pub async fn execute(&mut self, command: &Command) -> anyhow::Result<ExchangeOutcome> {
        let Some(body) = command.request_body() else {
            bail!("{:?} is not a request and must be handled by the caller", command);
        };

        let request = Request::new(self.message_ids.next_id()?, body);

        let mut buf = BytesMut::with_capacity(Request::MAX_SERIALIZED_LEN);
        request.ser(&mut buf);

        let span = span!(Level::INFO, "exchange", id = %request.id, kind = ?request.kind());
        self.do_execute(&request, &buf)
            .instrument(span)
            .await
    }

    async fn do_execute(&self, request: &Request, datagram: &[u8]) -> anyhow::Result<ExchangeOutcome> {
        let mut attempt_count = 0;

        loop {
            if attempt_count > 0 {
                info!("{} timeout(s) encountered, re-attempting to send", attempt_count);
            }

            self.channel.send(datagram).await?;
            debug!("request (id {}) sent to satellite, waiting for response", request.id);

            match self.channel.receive(self.config.max_datagram_size).await? {
                Reception::Datagram(reply) => {
                    return Ok(self.on_reply(request, reply));
                }
                Reception::TimedOut => {
                    attempt_count += 1;
                    debug!("attempt {} of {} timed out", attempt_count, self.config.max_attempts);

                    if attempt_count >= self.config.max_attempts {
                        warn!("satellite never replied after {} send attempts, giving up", attempt_count);
                        return Ok(ExchangeOutcome::TimedOut);
                    }
                }
            }
        }
    }

    fn on_reply(&self, request: &Request, reply: Datagram) -> ExchangeOutcome {
        if reply.sender != self.channel.peer_addr() {
            warn!("reply came from {:?} rather than the satellite at {:?} - accepting it anyway", reply.sender, self.channel.peer_addr());
        }

        if reply.truncated {
            warn!("reply exceeds the maximum datagram size of {} bytes and was truncated", self.config.max_datagram_size);
            return ExchangeOutcome::Malformed;
        }

        let mut parse_buf: &[u8] = reply.payload.as_ref();
        match Response::deser(request.kind(), &mut parse_buf) {
            Ok(response) => {
                debug!("received {:?}", response);
                ExchangeOutcome::Delivered(response)
            }
            Err(e) => {
                warn!("received unparseable reply {:?}: {}", reply.payload.as_ref(), e);
                ExchangeOutcome::Malformed
            }
        }
    }
}
