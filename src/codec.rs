// GSM PDU codec primitives - separates the octet cursor from the domain models
//
// A PDU travels over the RIL channel as a string of hex-encoded octets.
// `PduReader` walks that string one octet at a time with bounds checking on
// every read; `PduWriter` builds the outbound string. The higher-level field
// parsers in `pdu` and `datatypes` are written against these two types and
// never index the raw text themselves.

use thiserror::Error;

/// PDU codec errors with field context for debugging.
///
/// All of these are local to the single PDU being processed: a failed parse
/// never poisons the transport or any subsequently supplied PDU.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PduError {
    #[error("truncated PDU: read past the end of the octet stream")]
    Truncated,

    #[error("invalid hex digit {0:?} in PDU text")]
    InvalidHexDigit(char),

    #[error("PDU payload is not hex text")]
    NotHexText,

    #[error("invalid BCD nibble {0:#x} in address digits")]
    InvalidBcdNibble(u8),

    #[error("invalid address length: {0} digits")]
    InvalidAddressLength(usize),

    #[error("address digit {0:?} is not a decimal digit")]
    InvalidAddressDigit(char),

    #[error("user data too long: {0} septets (max 160)")]
    UserDataTooLong(usize),

    #[error("character {0:?} has no code in the GSM 7-bit default alphabet")]
    UnmappableCharacter(char),
}

/// Cursor over the hex text of one PDU.
///
/// Every accessor consumes whole octets (two hex digits) and returns
/// `PduError::Truncated` instead of running past the end.
#[derive(Debug)]
pub struct PduReader<'a> {
    text: &'a [u8],
    pos: usize,
}

impl<'a> PduReader<'a> {
    pub fn new(pdu: &'a str) -> PduReader<'a> {
        PduReader {
            text: pdu.as_bytes(),
            pos: 0,
        }
    }

    /// Number of whole octets left in the stream.
    pub fn remaining(&self) -> usize {
        (self.text.len() - self.pos) / 2
    }

    fn read_nibble(&mut self) -> Result<u8, PduError> {
        let Some(&ch) = self.text.get(self.pos) else {
            return Err(PduError::Truncated);
        };
        self.pos += 1;
        match ch {
            b'0'..=b'9' => Ok(ch - b'0'),
            b'A'..=b'F' => Ok(ch - b'A' + 10),
            b'a'..=b'f' => Ok(ch - b'a' + 10),
            _ => Err(PduError::InvalidHexDigit(ch as char)),
        }
    }

    /// Read one hex-encoded octet (two nibbles).
    pub fn read_octet(&mut self) -> Result<u8, PduError> {
        Ok(self.read_nibble()? << 4 | self.read_nibble()?)
    }

    /// Read one swapped-nibble BCD octet and return its decimal value.
    ///
    /// The wire puts the units digit in the high nibble and the tens digit in
    /// the low nibble, so decimal 26 travels as `62`.
    pub fn read_swapped_bcd_octet(&mut self) -> Result<u8, PduError> {
        Ok(octet_to_bcd(self.read_octet()?))
    }
}

/// Decimal value of a swapped-nibble BCD octet.
///
/// Nibbles outside the 0-9 range count as zero, matching what deployed modem
/// firmware emits for padded fields.
pub(crate) fn octet_to_bcd(octet: u8) -> u8 {
    let units = octet >> 4;
    let tens = octet & 0x0f;
    let units = if units <= 9 { units } else { 0 };
    let tens = if tens <= 9 { tens } else { 0 };
    tens * 10 + units
}

/// Builder for the hex text of one outbound PDU.
#[derive(Debug, Default)]
pub struct PduWriter {
    out: String,
}

const HEX_DIGITS: &[u8; 16] = b"0123456789ABCDEF";

impl PduWriter {
    pub fn new() -> PduWriter {
        PduWriter::default()
    }

    /// Append one octet as two uppercase hex digits.
    pub fn write_octet(&mut self, octet: u8) {
        self.out.push(HEX_DIGITS[(octet >> 4) as usize] as char);
        self.out.push(HEX_DIGITS[(octet & 0x0f) as usize] as char);
    }

    /// Number of whole octets written so far.
    pub fn len_octets(&self) -> usize {
        self.out.len() / 2
    }

    pub fn finish(self) -> String {
        self.out
    }
}
