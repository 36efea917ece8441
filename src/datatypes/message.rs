use crate::datatypes::{Address, Encoding, SmsTimestamp};

/// Decoded user data of a short message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageBody {
    /// GSM 7-bit default alphabet text.
    Text(String),
    /// The DCS requested an alphabet this prototype does not decode;
    /// every other field of the message is still valid.
    Unsupported(Encoding),
}

/// The time-related field of a message, which differs by message type:
/// SMS-DELIVER carries a service-center timestamp, SMS-SUBMIT optionally
/// carries a relative validity period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageTiming {
    Timestamp(SmsTimestamp),
    ValidityPeriod(u8),
    None,
}

/// One parsed short message, either direction.
///
/// Constructed by [`crate::pdu::parse_message`] and consumed read-only by
/// the telephony layer; nothing mutates it after parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmsMessage {
    /// Service center address, when the PDU carries one.
    pub smsc: Option<Address>,
    /// Sender for SMS-DELIVER, destination for SMS-SUBMIT.
    pub address: Address,
    /// TP-Protocol-Identifier, passed through uninterpreted.
    pub protocol_identifier: u8,
    /// The raw TP-DCS octet as received.
    pub data_coding_scheme: u8,
    pub body: MessageBody,
    pub timing: MessageTiming,
    /// TP-Message-Reference; present only on SMS-SUBMIT.
    pub message_reference: Option<u8>,
}

impl SmsMessage {
    /// The decoded text, when the alphabet was supported.
    pub fn text(&self) -> Option<&str> {
        match &self.body {
            MessageBody::Text(text) => Some(text),
            MessageBody::Unsupported(_) => None,
        }
    }
}
