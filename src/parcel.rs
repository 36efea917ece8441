// ABOUTME: RIL parcel wire format: outbound framing and inbound body layout
// ABOUTME: One parcel is one discrete framed message on the modem channel

use crate::codec::PduError;
use crate::datatypes::SmsMessage;
use bytes::{Buf, BufMut, Bytes, BytesMut};
use thiserror::Error;

/// Maximum allowed parcel size, preventing unbounded buffering when a
/// misbehaving peer declares an absurd length.
pub const MAX_PARCEL_SIZE: usize = 65536; // 64KB

/// Size of the type/token words that follow the length prefix outbound.
pub const FRAME_HEADER_SIZE: usize = 8;

/// Whether a parcel is a request/indication or a solicited response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParcelKind {
    Request,
    Response,
}

/// One framed message on the RIL channel.
#[derive(Debug, Clone, PartialEq)]
pub struct Parcel {
    pub kind: ParcelKind,
    /// Request type code. Zero on a freshly reassembled response until the
    /// transport re-tags it from the matching outstanding request.
    pub type_code: u32,
    /// Correlation token. Zero on unsolicited parcels, which have none.
    pub token: u32,
    pub payload: Bytes,
}

impl Parcel {
    pub fn request(type_code: u32, token: u32, payload: Bytes) -> Parcel {
        Parcel {
            kind: ParcelKind::Request,
            type_code,
            token,
            payload,
        }
    }

    /// Interpret one reassembled body.
    ///
    /// The body leads with a kind word: zero marks a solicited response and
    /// the second word is the request token; anything else is an unsolicited
    /// indication and the second word is its type code.
    pub fn from_body(body: Bytes) -> Result<Parcel, TransportError> {
        if body.len() < FRAME_HEADER_SIZE {
            return Err(TransportError::TruncatedParcel(body.len()));
        }
        let mut buf = body;
        let kind_word = buf.get_u32();
        let second = buf.get_u32();
        if kind_word == 0 {
            Ok(Parcel {
                kind: ParcelKind::Response,
                type_code: 0,
                token: second,
                payload: buf,
            })
        } else {
            Ok(Parcel {
                kind: ParcelKind::Request,
                type_code: second,
                token: 0,
                payload: buf,
            })
        }
    }

    /// Frame this parcel for the wire:
    /// `length | type | token | payload`, all header words u32 big-endian,
    /// with `length = 8 + payload length`.
    pub fn encode_frame(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(4 + FRAME_HEADER_SIZE + self.payload.len());
        buf.put_u32((FRAME_HEADER_SIZE + self.payload.len()) as u32);
        buf.put_u32(self.type_code);
        buf.put_u32(self.token);
        buf.put_slice(&self.payload);
        buf.freeze()
    }
}

/// One decoded parcel payload handed to callbacks.
///
/// A closed set of message kinds: the decoder registered for a type code
/// produces one of these, and a type code with no decoder (or a decoder
/// that failed) forwards the raw bytes.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Raw(Bytes),
    Sms(SmsMessage),
    Text(String),
}

/// Transport-level errors. These are fatal for the connection: the owner
/// must tear the connection down and fail anything still outstanding.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("oversized parcel: declared length {declared} exceeds maximum {max}")]
    OversizedParcel { declared: usize, max: usize },

    #[error("truncated parcel: {0}-byte body cannot hold the kind and id words")]
    TruncatedParcel(usize),

    #[error("protocol desync: response token {0} matches no outstanding request")]
    UnknownToken(u32),

    #[error("parcel decode error: {0}")]
    Pdu(#[from] PduError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
