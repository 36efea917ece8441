pub mod codec;
pub mod connection;
pub mod datatypes;
pub mod parcel;
pub mod pdu;
pub mod transport;


// Re-export the codec primitives for direct access
pub use codec::{PduError, PduReader, PduWriter};

// Re-export the domain types that most callers need
pub use datatypes::{
    Address, Encoding, MessageBody, MessageTiming, RequestType, SmsMessage, SmsTimestamp,
};

// Re-export the transport surface
pub use parcel::{MAX_PARCEL_SIZE, Parcel, ParcelKind, Payload, TransportError};
pub use pdu::{SubmitPdu, parse_message};
pub use transport::{ByteSink, CallbackId, FrameQueue, Reassembler, RilTransport};

/// Error returned by callback handlers and other outer-layer functions.
///
/// The hot paths (PDU parsing, parcel reassembly) define their own error
/// enums (`PduError`, `TransportError`) because those errors are hit and
/// handled during normal execution, e.g. when a malformed PDU arrives from
/// the modem. At the callback boundary a boxed `std::error::Error` is
/// sufficient: the transport only logs it and moves on.
pub type Error = Box<dyn std::error::Error + Send + Sync>;

/// A specialized `Result` type for RIL operations.
///
/// # Examples
///
/// Parsing an SMS-DELIVER PDU received from the modem:
///
/// ```rust
/// use ril::{MessageBody, MessageTiming, parse_message};
///
/// let pdu = "0004068121436500006210512103544005E8329BFD06";
/// let msg = parse_message(pdu).unwrap();
///
/// assert_eq!(msg.address.to_string(), "123456");
/// assert_eq!(msg.body, MessageBody::Text("hello".to_string()));
/// match msg.timing {
///     MessageTiming::Timestamp(ts) => assert_eq!(ts.tz_offset_minutes, 60),
///     _ => panic!("SMS-DELIVER carries a service-center timestamp"),
/// }
/// ```
///
/// Building an SMS-SUBMIT PDU for sending:
///
/// ```rust
/// use ril::SubmitPdu;
///
/// let pdu = SubmitPdu::new("+447911123456", "hello").to_hex().unwrap();
/// assert_eq!(pdu, "0001000C91449711214365000005E8329BFD06");
/// ```
pub type Result<T> = std::result::Result<T, Error>;
