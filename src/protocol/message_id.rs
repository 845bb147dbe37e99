use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicU64, Ordering};
use anyhow::anyhow;

/// Identifies one request on the wire. All retries of a request share its id.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct MessageId(u32);

impl Display for MessageId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl MessageId {
    pub const ZERO: MessageId = MessageId(0);

    pub fn from_raw(value: u32) -> Self {
        Self(value)
    }

    pub fn to_raw(&self) -> u32 {
        self.0
    }
}

/// Hands out message ids for one engine instance: 0, 1, 2, ... in call order.
///
/// The counter advances on every call, no matter what happens to the request the id is used
///  for. Ids are never wrapped: once `u32::MAX` was handed out, the allocator is exhausted and
///  refuses to produce more ids rather than reusing one.
#[derive(Debug, Default)]
pub struct MessageIdAllocator {
    next: AtomicU64,
}

impl MessageIdAllocator {
    pub fn new() -> MessageIdAllocator {
        Default::default()
    }

    #[cfg(test)]
    pub fn starting_at(first: u64) -> MessageIdAllocator {
        MessageIdAllocator {
            next: AtomicU64::new(first),
        }
    }

    pub fn next_id(&self) -> anyhow::Result<MessageId> {
        let raw = self.next.fetch_add(1, Ordering::AcqRel);
        u32::try_from(raw)
            .map(MessageId)
            .map_err(|_| anyhow!("message id space is exhausted"))
    }

    /// The id that the next call to [MessageIdAllocator::next_id] will return, if any
    pub fn peek_next_id(&self) -> Option<MessageId> {
        u32::try_from(self.next.load(Ordering::Acquire)).ok()
            .map(MessageId)
    }
}
