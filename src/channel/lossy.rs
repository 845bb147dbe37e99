use std::marker::PhantomData;
use std::net::SocketAddr;
use std::sync::Arc;
use async_trait::async_trait;
use tracing::debug;
use crate::channel::{DatagramChannel, Reception};
use crate::util::random::{Random, RngRandom};

/// Wraps a [DatagramChannel], dropping datagrams at random in both directions. This simulates
///  a lossy network for exercising the retry logic against a real satellite.
///
/// A dropped request is silently not sent, so the following receive runs into the timeout. A
///  dropped reply is reported as [Reception::TimedOut].
pub struct LossyChannel<R: Random = RngRandom> {
    inner: Arc<dyn DatagramChannel>,
    /// probability between 0.0 and 1.0
    request_loss: f64,
    /// probability between 0.0 and 1.0
    reply_loss: f64,
    _random: PhantomData<fn() -> R>,
}

impl LossyChannel {
    pub fn new(inner: Arc<dyn DatagramChannel>, request_loss: f64, reply_loss: f64) -> anyhow::Result<LossyChannel> {
        Self::new_with_random(inner, request_loss, reply_loss)
    }
}

impl<R: Random> LossyChannel<R> {
    pub fn new_with_random(inner: Arc<dyn DatagramChannel>, request_loss: f64, reply_loss: f64) -> anyhow::Result<LossyChannel<R>> {
        for rate in [request_loss, reply_loss] {
            if !(0.0..=1.0).contains(&rate) {
                anyhow::bail!("loss rate must be between 0.0 and 1.0, was {}", rate);
            }
        }

        Ok(LossyChannel {
            inner,
            request_loss,
            reply_loss,
            _random: PhantomData,
        })
    }

    fn should_drop(rate: f64) -> bool {
        rate > 0.0 && R::gen_f64_range(0.0..1.0) < rate
    }
}

#[async_trait]
impl<R: Random + 'static> DatagramChannel for LossyChannel<R> {
    fn peer_addr(&self) -> SocketAddr {
        self.inner.peer_addr()
    }

    async fn send(&self, datagram: &[u8]) -> anyhow::Result<()> {
        if Self::should_drop(self.request_loss) {
            debug!("simulated loss: dropping outgoing datagram");
            return Ok(());
        }
        self.inner.send(datagram).await
    }

    async fn receive(&self, max_size: usize) -> anyhow::Result<Reception> {
        match self.inner.receive(max_size).await? {
            Reception::Datagram(_) if Self::should_drop(self.reply_loss) => {
                debug!("simulated loss: dropping incoming datagram");
                Ok(Reception::TimedOut)
            }
            other => Ok(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::{Datagram, MockDatagramChannel};
    use crate::util::random::{MockRandom, MOCK_RANDOM_MUTEX};
    use bytes::Bytes;
    use rstest::rstest;

    fn peer() -> SocketAddr {
        SocketAddr::from(([127, 0, 0, 1], 4444))
    }

    fn datagram() -> Reception {
        Reception::Datagram(Datagram {
            payload: Bytes::from_static(&[1, 2, 3]),
            sender: peer(),
            truncated: false,
        })
    }

    #[rstest]
    #[case::below_rate(0.5, 0.49, false)]
    #[case::at_rate(0.5, 0.5, true)]
    #[case::above_rate(0.5, 0.9, true)]
    #[case::always(1.0, 0.999, false)]
    fn test_send(#[case] loss: f64, #[case] random: f64, #[case] expected_sent: bool) {
        let _lock = MOCK_RANDOM_MUTEX.lock();

        let rt = tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();
        rt.block_on(async move {
            let ctx = MockRandom::gen_f64_range_context();
            ctx.expect()
                .returning(move |_| random);

            let mut inner = MockDatagramChannel::new();
            inner.expect_send()
                .times(if expected_sent { 1 } else { 0 })
                .returning(|_| Ok(()));

            let channel = LossyChannel::<MockRandom>::new_with_random(Arc::new(inner), loss, 0.0).unwrap();
            channel.send(&[1, 2, 3]).await.unwrap();
        });
    }

    #[rstest]
    #[case::kept(0.3, 0.3, false)]
    #[case::dropped(0.3, 0.29, true)]
    fn test_receive(#[case] loss: f64, #[case] random: f64, #[case] expected_dropped: bool) {
        let _lock = MOCK_RANDOM_MUTEX.lock();

        let rt = tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();
        rt.block_on(async move {
            let ctx = MockRandom::gen_f64_range_context();
            ctx.expect()
                .returning(move |_| random);

            let mut inner = MockDatagramChannel::new();
            inner.expect_receive()
                .times(1)
                .returning(|_| Ok(datagram()));

            let channel = LossyChannel::<MockRandom>::new_with_random(Arc::new(inner), 0.0, loss).unwrap();
            let expected = if expected_dropped { Reception::TimedOut } else { datagram() };
            assert_eq!(channel.receive(50).await.unwrap(), expected);
        });
    }

    #[tokio::test]
    async fn test_no_loss_passes_through() {
        let mut inner = MockDatagramChannel::new();
        inner.expect_send()
            .times(1)
            .returning(|_| Ok(()));
        inner.expect_receive()
            .times(1)
            .returning(|_| Ok(Reception::TimedOut));
        inner.expect_peer_addr()
            .return_const(peer());

        let channel = LossyChannel::new(Arc::new(inner), 0.0, 0.0).unwrap();
        channel.send(&[1]).await.unwrap();
        assert_eq!(channel.receive(50).await.unwrap(), Reception::TimedOut);
        assert_eq!(channel.peer_addr(), peer());
    }

    #[rstest]
    #[case::negative(-0.1, 0.0)]
    #[case::too_big(0.0, 1.5)]
    #[case::nan(f64::NAN, 0.0)]
    fn test_invalid_rates(#[case] request_loss: f64, #[case] reply_loss: f64) {
        assert!(LossyChannel::new(Arc::new(MockDatagramChannel::new()), request_loss, reply_loss).is_err());
    }
}
