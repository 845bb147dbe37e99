use anyhow::bail;
use bytes::{Buf, BufMut, BytesMut};
use crate::protocol::request::RequestKind;

/// Satellite position in degrees
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocationResponse {
    pub latitude: f64,
    pub longitude: f64,
}
impl LocationResponse {
    pub const SERIALIZED_LEN: usize = 2 * size_of::<f64>();

    pub fn ser(&self, buf: &mut BytesMut) {
        buf.put_f64(self.latitude);
        buf.put_f64(self.longitude);
    }

    pub fn deser(buf: &mut impl Buf) -> anyhow::Result<LocationResponse> {
        let latitude = buf.try_get_f64()?;
        let longitude = buf.try_get_f64()?;
        Ok(LocationResponse { latitude, longitude })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeResponse {
    pub current_time_unix_ms: i64,
}
impl TimeResponse {
    pub const SERIALIZED_LEN: usize = size_of::<i64>();

    pub fn ser(&self, buf: &mut BytesMut) {
        buf.put_i64(self.current_time_unix_ms);
    }

    pub fn deser(buf: &mut impl Buf) -> anyhow::Result<TimeResponse> {
        Ok(TimeResponse {
            current_time_unix_ms: buf.try_get_i64()?,
        })
    }
}

/// NB: `updated_location` is only meaningful if `success` is true
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoveResponse {
    pub success: bool,
    pub updated_location: LocationResponse,
}
impl MoveResponse {
    pub const SERIALIZED_LEN: usize = size_of::<u8>() + LocationResponse::SERIALIZED_LEN;

    pub fn ser(&self, buf: &mut BytesMut) {
        buf.put_u8(if self.success { 1 } else { 0 });
        self.updated_location.ser(buf);
    }

    pub fn deser(buf: &mut impl Buf) -> anyhow::Result<MoveResponse> {
        let success = match buf.try_get_u8()? {
            0 => false,
            1 => true,
            other => bail!("invalid success flag {}", other),
        };
        let updated_location = LocationResponse::deser(buf)?;
        Ok(MoveResponse { success, updated_location })
    }
}

/// A satellite reply. Replies carry no tag on the wire: their shape follows from the kind of
///  request that was sent, so decoding needs that kind.
///
/// ```ascii
/// LOCATION: latitude (f64) | longitude (f64)                            16 bytes
/// TIME:     current time, millis since epoch (i64)                       8 bytes
/// MOVE:     success (u8, 0/1) | latitude (f64) | longitude (f64)        17 bytes
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Response {
    Location(LocationResponse),
    Time(TimeResponse),
    Move(MoveResponse),
}

impl Response {
    pub fn kind(&self) -> RequestKind {
        match self {
            Response::Location(_) => RequestKind::Location,
            Response::Time(_) => RequestKind::Time,
            Response::Move(_) => RequestKind::Move,
        }
    }

    pub fn serialized_len(kind: RequestKind) -> usize {
        match kind {
            RequestKind::Location => LocationResponse::SERIALIZED_LEN,
            RequestKind::Time => TimeResponse::SERIALIZED_LEN,
            RequestKind::Move => MoveResponse::SERIALIZED_LEN,
        }
    }

    pub fn ser(&self, buf: &mut BytesMut) {
        match self {
            Response::Location(data) => data.ser(buf),
            Response::Time(data) => data.ser(buf),
            Response::Move(data) => data.ser(buf),
        }
    }

    /// Parses the reply to a request of the given kind. The buffer must contain exactly one
    ///  reply, trailing bytes are an error.
    pub fn deser(kind: RequestKind, buf: &mut impl Buf) -> anyhow::Result<Response> {
        if buf.remaining() != Self::serialized_len(kind) {
            bail!("{:?} response must be {} bytes long, was {}", kind, Self::serialized_len(kind), buf.remaining());
        }

        let result = match kind {
            RequestKind::Location => Response::Location(LocationResponse::deser(buf)?),
            RequestKind::Time => Response::Time(TimeResponse::deser(buf)?),
            RequestKind::Move => Response::Move(MoveResponse::deser(buf)?),
        };
        Ok(result)
    }
}
