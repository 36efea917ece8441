// ABOUTME: Phone number addresses with type-of-address classification
// ABOUTME: Implements swapped-nibble BCD digit coding per 3GPP TS 23.040

use crate::codec::{PduError, PduReader, PduWriter};
use num_enum::TryFromPrimitive;
use std::fmt;

/// Type of Number, the high bits of the type-of-address octet.
#[derive(TryFromPrimitive)]
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TypeOfNumber {
    Unknown = 0b000,
    International = 0b001,
    National = 0b010,
    NetworkSpecific = 0b011,
    SubscriberNumber = 0b100,
    Alphanumeric = 0b101,
    Abbreviated = 0b110,
}

/// Numbering Plan Identification, the low nibble of the type-of-address octet.
#[derive(TryFromPrimitive)]
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum NumberingPlan {
    Unknown = 0b0000,
    Isdn = 0b0001,
    Data = 0b0011,
    Telex = 0b0100,
    National = 0b1000,
    Private = 0b1001,
    Ermes = 0b1010,
}

/// Assemble a type-of-address octet. Bit 7 is always set on the wire.
fn type_of_address(ton: TypeOfNumber, npi: NumberingPlan) -> u8 {
    0x80 | (ton as u8) << 4 | npi as u8
}

fn type_of_number(toa: u8) -> TypeOfNumber {
    TypeOfNumber::try_from((toa >> 4) & 0x07).unwrap_or(TypeOfNumber::Unknown)
}

/// A phone number as it appears in a PDU address field.
///
/// `digits` holds the logical digit string: possibly odd-length, without any
/// padding. The trailing `F` filler nibble that pads an odd digit count out
/// to a whole octet is injected on encode and stripped on decode; it is
/// never part of the logical length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Address {
    pub digits: String,
    pub international: bool,
}

impl Address {
    /// Build an address from user input. A leading `+` marks the number as
    /// international and is not stored in the digit string.
    pub fn new(number: &str) -> Address {
        match number.strip_prefix('+') {
            Some(rest) => Address {
                digits: rest.to_string(),
                international: true,
            },
            None => Address {
                digits: number.to_string(),
                international: false,
            },
        }
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.international {
            write!(f, "+{}", self.digits)
        } else {
            write!(f, "{}", self.digits)
        }
    }
}

/// Read `pairs` swapped-nibble BCD octets into a digit string.
///
/// Within each octet the low nibble is the earlier digit. A filler nibble
/// (`F`) in the high position is skipped; any other non-decimal nibble is a
/// parse error.
fn read_swapped_digits(reader: &mut PduReader, pairs: usize) -> Result<String, PduError> {
    let mut digits = String::with_capacity(pairs * 2);
    for _ in 0..pairs {
        let octet = reader.read_octet()?;
        push_digit(&mut digits, octet & 0x0f)?;
        let high = octet >> 4;
        if high == 0x0f {
            continue;
        }
        push_digit(&mut digits, high)?;
    }
    Ok(digits)
}

fn push_digit(out: &mut String, nibble: u8) -> Result<(), PduError> {
    if nibble > 9 {
        return Err(PduError::InvalidBcdNibble(nibble));
    }
    out.push(char::from(b'0' + nibble));
    Ok(())
}

/// Parse the sender/destination address field: one digit-count octet, one
/// type-of-address octet, then the BCD digit pairs. An odd digit count rounds
/// up by one for pair reading; the padding nibble is implicit.
pub(crate) fn read_sender_address(reader: &mut PduReader) -> Result<Address, PduError> {
    let digit_count = reader.read_octet()? as usize;
    if digit_count == 0 {
        return Err(PduError::InvalidAddressLength(0));
    }
    let toa = reader.read_octet()?;
    let mut digits = read_swapped_digits(reader, digit_count.div_ceil(2))?;
    digits.truncate(digit_count);
    if digits.is_empty() {
        return Err(PduError::InvalidAddressLength(0));
    }
    Ok(Address {
        digits,
        international: type_of_number(toa) == TypeOfNumber::International,
    })
}

/// Parse the SMSC address given its already-consumed length octet, which for
/// the SMSC counts octets (type-of-address plus BCD pairs), not digits.
pub(crate) fn read_smsc_address(
    reader: &mut PduReader,
    octet_count: usize,
) -> Result<Address, PduError> {
    let toa = reader.read_octet()?;
    let digits = read_swapped_digits(reader, octet_count - 1)?;
    Ok(Address {
        digits,
        international: type_of_number(toa) == TypeOfNumber::International,
    })
}

/// Serialize an address field.
///
/// The length octet counts digits for a sender/destination address but whole
/// octets (type-of-address included) for an SMSC address.
pub(crate) fn write_address(
    writer: &mut PduWriter,
    address: &Address,
    smsc: bool,
) -> Result<(), PduError> {
    let ton = if address.international {
        TypeOfNumber::International
    } else {
        TypeOfNumber::Unknown
    };
    if smsc {
        let length = 1 + address.digits.len().div_ceil(2);
        writer.write_octet(length as u8);
    } else {
        writer.write_octet(address.digits.len() as u8);
    }
    writer.write_octet(type_of_address(ton, NumberingPlan::Isdn));
    write_swapped_digits(writer, &address.digits)
}

fn write_swapped_digits(writer: &mut PduWriter, digits: &str) -> Result<(), PduError> {
    let mut nibbles = Vec::with_capacity(digits.len() + 1);
    for ch in digits.chars() {
        let digit = ch.to_digit(10).ok_or(PduError::InvalidAddressDigit(ch))? as u8;
        nibbles.push(digit);
    }
    if nibbles.len() % 2 != 0 {
        nibbles.push(0x0f);
    }
    for pair in nibbles.chunks_exact(2) {
        writer.write_octet(pair[1] << 4 | pair[0]);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(address: &Address, smsc: bool) -> String {
        let mut writer = PduWriter::new();
        write_address(&mut writer, address, smsc).unwrap();
        writer.finish()
    }

    #[test]
    fn domestic_address_round_trip() {
        let encoded = encode(&Address::new("123456"), false);
        assert_eq!(encoded, "0681214365");

        let mut reader = PduReader::new(&encoded);
        let decoded = read_sender_address(&mut reader).unwrap();
        assert_eq!(decoded.to_string(), "123456");
        assert!(!decoded.international);
    }

    #[test]
    fn international_address_round_trip() {
        let encoded = encode(&Address::new("+447911123456"), false);
        assert_eq!(encoded, "0C91449711214365");

        let mut reader = PduReader::new(&encoded);
        let decoded = read_sender_address(&mut reader).unwrap();
        assert_eq!(decoded.to_string(), "+447911123456");
    }

    #[test]
    fn odd_length_address_pads_with_filler() {
        let encoded = encode(&Address::new("12345"), false);
        assert_eq!(encoded, "05812143F5");

        // The filler nibble is stripped on decode, not counted.
        let mut reader = PduReader::new(&encoded);
        let decoded = read_sender_address(&mut reader).unwrap();
        assert_eq!(decoded.digits, "12345");
    }

    #[test]
    fn smsc_length_counts_octets() {
        let encoded = encode(&Address::new("+447911123456"), true);
        assert_eq!(encoded, "0791449711214365");

        let mut reader = PduReader::new(&encoded);
        let octet_count = reader.read_octet().unwrap() as usize;
        let decoded = read_smsc_address(&mut reader, octet_count).unwrap();
        assert_eq!(decoded.to_string(), "+447911123456");
    }

    #[test]
    fn zero_length_address_is_rejected() {
        let mut reader = PduReader::new("0081");
        assert_eq!(
            read_sender_address(&mut reader),
            Err(PduError::InvalidAddressLength(0))
        );
    }

    #[test]
    fn non_decimal_address_digit_is_rejected() {
        let mut writer = PduWriter::new();
        let result = write_address(&mut writer, &Address::new("12a4"), false);
        assert_eq!(result, Err(PduError::InvalidAddressDigit('a')));
    }

    #[test]
    fn truncated_address_is_a_parse_error() {
        // Length promises 6 digits but only one BCD octet follows.
        let mut reader = PduReader::new("068121");
        assert_eq!(read_sender_address(&mut reader), Err(PduError::Truncated));
    }
}
