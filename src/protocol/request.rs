use anyhow::bail;
use bytes::{Buf, BufMut, BytesMut};
use num_enum::{IntoPrimitive, TryFromPrimitive};
use crate::protocol::message_id::MessageId;

/// What the caller asks the engine to do. [Command::Quit] ends the caller's session and never
///  reaches the wire.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    LocationQuery,
    TimeQuery,
    MoveCommand {
        thrust_angle: f64,
        thrust_duration: f64,
    },
    Quit,
}

impl Command {
    /// The request body for this command, or `None` for [Command::Quit]
    pub fn request_body(&self) -> Option<RequestBody> {
        match *self {
            Command::LocationQuery => Some(RequestBody::Location),
            Command::TimeQuery => Some(RequestBody::Time),
            Command::MoveCommand { thrust_angle, thrust_duration } => Some(RequestBody::Move { thrust_angle, thrust_duration }),
            Command::Quit => None,
        }
    }
}

/// Wire tag of a request. The shape of the reply is implied by it.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum RequestKind {
    Location = 0,
    Time = 1,
    Move = 2,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RequestBody {
    Location,
    Time,
    Move {
        thrust_angle: f64,
        thrust_duration: f64,
    },
}

impl RequestBody {
    pub fn kind(&self) -> RequestKind {
        match self {
            RequestBody::Location => RequestKind::Location,
            RequestBody::Time => RequestKind::Time,
            RequestBody::Move { .. } => RequestKind::Move,
        }
    }
}

/// A request as it goes on the wire (all numbers big endian):
///
/// ```ascii
/// 0: message id (u32)
/// 4: request kind (u8): 0 = LOCATION, 1 = TIME, 2 = MOVE
/// 5: thrust angle (f64) - MOVE only
/// 13: thrust duration (f64) - MOVE only
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Request {
    pub id: MessageId,
    pub body: RequestBody,
}

impl Request {
    pub const HEADER_LEN: usize = size_of::<u32>() + size_of::<u8>();
    pub const MAX_SERIALIZED_LEN: usize = Self::HEADER_LEN + 2 * size_of::<f64>();

    pub fn new(id: MessageId, body: RequestBody) -> Request {
        Request { id, body }
    }

    pub fn kind(&self) -> RequestKind {
        self.body.kind()
    }

    pub fn ser(&self, buf: &mut BytesMut) {
        buf.put_u32(self.id.to_raw());
        buf.put_u8(self.kind().into());
        if let RequestBody::Move { thrust_angle, thrust_duration } = self.body {
            buf.put_f64(thrust_angle);
            buf.put_f64(thrust_duration);
        }
    }

    pub fn deser(buf: &mut impl Buf) -> anyhow::Result<Request> {
        let id = MessageId::from_raw(buf.try_get_u32()?);
        let body = match RequestKind::try_from(buf.try_get_u8()?)? {
            RequestKind::Location => RequestBody::Location,
            RequestKind::Time => RequestBody::Time,
            RequestKind::Move => {
                let thrust_angle = buf.try_get_f64()?;
                let thrust_duration = buf.try_get_f64()?;
                RequestBody::Move { thrust_angle, thrust_duration }
            }
        };

        if buf.has_remaining() {
            bail!("{} trailing bytes after request", buf.remaining());
        }
        Ok(Request { id, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::location(Request::new(MessageId::ZERO, RequestBody::Location), vec![0,0,0,0, 0])]
    #[case::time(Request::new(MessageId::from_raw(258), RequestBody::Time), vec![0,0,1,2, 1])]
    #[case::mov(Request::new(MessageId::from_raw(7), RequestBody::Move { thrust_angle: 45.0, thrust_duration: 2.5 }),
        vec![0,0,0,7, 2, 0x40,0x46,0x80,0,0,0,0,0, 0x40,0x04,0,0,0,0,0,0])]
    fn test_ser(#[case] request: Request, #[case] expected: Vec<u8>) {
        let mut buf = BytesMut::new();
        request.ser(&mut buf);
        assert_eq!(buf.as_ref(), expected.as_slice());

        let mut b: &[u8] = &buf;
        let deser = Request::deser(&mut b).unwrap();
        assert!(b.is_empty());
        assert_eq!(deser, request);
    }

    #[rstest]
    #[case::empty(vec![])]
    #[case::short_id(vec![0,0,1])]
    #[case::missing_kind(vec![0,0,0,1])]
    #[case::unknown_kind(vec![0,0,0,1, 3])]
    #[case::move_without_params(vec![0,0,0,1, 2])]
    #[case::move_half_params(vec![0,0,0,1, 2, 0x40,0x46,0,0,0,0,0,0])]
    #[case::trailing(vec![0,0,0,1, 1, 9])]
    fn test_deser_invalid(#[case] bytes: Vec<u8>) {
        let mut b: &[u8] = &bytes;
        assert!(Request::deser(&mut b).is_err());
    }

    #[test]
    fn test_max_serialized_len() {
        let mut buf = BytesMut::new();
        Request::new(MessageId::from_raw(u32::MAX), RequestBody::Move { thrust_angle: -1.0, thrust_duration: f64::MAX })
            .ser(&mut buf);
        assert_eq!(buf.len(), Request::MAX_SERIALIZED_LEN);
    }

    #[rstest]
    #[case::location(Command::LocationQuery, Some(RequestKind::Location))]
    #[case::time(Command::TimeQuery, Some(RequestKind::Time))]
    #[case::mov(Command::MoveCommand { thrust_angle: 1.0, thrust_duration: 2.0 }, Some(RequestKind::Move))]
    #[case::quit(Command::Quit, None)]
    fn test_command_request_body(#[case] command: Command, #[case] expected: Option<RequestKind>) {
        assert_eq!(command.request_body().map(|b| b.kind()), expected);
    }

    #[test]
    fn test_request_kind_tags() {
        assert_eq!(u8::from(RequestKind::Location), 0);
        assert_eq!(u8::from(RequestKind::Time), 1);
        assert_eq!(u8::from(RequestKind::Move), 2);
        assert!(RequestKind::try_from(3u8).is_err());
    }
}
