mod address;
pub mod alphabet;
mod data_coding;
mod message;
mod request_type;
mod timestamp;

pub use address::{Address, NumberingPlan, TypeOfNumber};
pub use alphabet::{GSM_7BIT_DEFAULT_ALPHABET, MAX_SEPTETS, char_to_septet, pack, unpack};
pub use data_coding::Encoding;
pub use message::{MessageBody, MessageTiming, SmsMessage};
pub use request_type::RequestType;
pub use timestamp::SmsTimestamp;

pub(crate) use address::{read_sender_address, read_smsc_address, write_address};
