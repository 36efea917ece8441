// ABOUTME: TP-Data-Coding-Scheme resolution to a character encoding width
// ABOUTME: Reproduces the TS 23.038 coding-group bit tests exactly

/// Character encoding width selected by the TP-DCS octet.
///
/// Only the GSM 7-bit default alphabet is decoded; 8-bit data and UCS-2 are
/// recognized so the rest of the PDU still parses, but their user data is
/// surfaced as unsupported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Gsm7,
    Octet,
    Ucs2,
}

impl Encoding {
    /// Resolve a TP-DCS octet to an encoding width.
    ///
    /// Coding group `00xx`: bits 3..2 select 8-bit (`01`) or UCS-2 (`10`).
    /// Coding group `11xx`: bits 5..4 select UCS-2 (`10`); in the
    /// message-class group (`11`) bit 2 selects 8-bit data over 7-bit.
    /// Everything else falls back to the 7-bit default alphabet.
    pub fn resolve(dcs: u8) -> Encoding {
        match dcs & 0xc0 {
            0x00 => match dcs & 0x0c {
                0x04 => Encoding::Octet,
                0x08 => Encoding::Ucs2,
                _ => Encoding::Gsm7,
            },
            0xc0 => match dcs & 0x30 {
                0x20 => Encoding::Ucs2,
                0x30 if dcs & 0x04 != 0 => Encoding::Octet,
                _ => Encoding::Gsm7,
            },
            _ => Encoding::Gsm7,
        }
    }

    /// The encoding bits contributed to an outbound TP-DCS octet.
    pub(crate) fn dcs_bits(self) -> u8 {
        match self {
            Encoding::Gsm7 => 0x00,
            Encoding::Octet => 0xf4,
            Encoding::Ucs2 => 0x08,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_dcs_is_seven_bit() {
        assert_eq!(Encoding::resolve(0x00), Encoding::Gsm7);
    }

    #[test]
    fn general_group_selects_wider_encodings() {
        assert_eq!(Encoding::resolve(0x04), Encoding::Octet);
        assert_eq!(Encoding::resolve(0x08), Encoding::Ucs2);
    }

    #[test]
    fn message_class_group_selects_eight_bit_via_bit_two() {
        assert_eq!(Encoding::resolve(0xf4), Encoding::Octet);
        assert_eq!(Encoding::resolve(0xf0), Encoding::Gsm7);
    }

    #[test]
    fn message_class_bytes_stay_seven_bit() {
        for dcs in [0xf1, 0xf2, 0xf3] {
            assert_eq!(Encoding::resolve(dcs), Encoding::Gsm7);
        }
    }

    #[test]
    fn data_coding_group_selects_ucs2() {
        assert_eq!(Encoding::resolve(0xe0), Encoding::Ucs2);
    }

    #[test]
    fn reserved_groups_fall_back_to_seven_bit() {
        assert_eq!(Encoding::resolve(0x40), Encoding::Gsm7);
        assert_eq!(Encoding::resolve(0x80), Encoding::Gsm7);
    }
}
