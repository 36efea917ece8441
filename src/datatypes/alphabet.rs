// ABOUTME: GSM 7-bit default alphabet and septet packing per 3GPP TS 23.038
// ABOUTME: Packs/unpacks 7-bit character codes across 8-bit octet boundaries

use crate::codec::PduError;

/// Protocol maximum for 7-bit user data: 140 octets carry 160 septets.
pub const MAX_SEPTETS: usize = 160;

/// The GSM 7-bit default alphabet, indexed by septet value.
///
/// Position 0x1B is the escape code to the extension table; extension
/// decoding is not implemented, so it maps to the euro sign the way most
/// handsets render a bare escape.
pub const GSM_7BIT_DEFAULT_ALPHABET: [char; 128] = [
    '@', '£', '$', '¥', 'è', 'é', 'ù', 'ì', 'ò', 'Ç', '\n', 'Ø', 'ø', '\r', 'Å', 'å', //
    'Δ', '_', 'Φ', 'Γ', 'Λ', 'Ω', 'Π', 'Ψ', 'Σ', 'Θ', 'Ξ', '€', 'Æ', 'æ', 'ß', 'É', //
    ' ', '!', '"', '#', '¤', '%', '&', '\'', '(', ')', '*', '+', ',', '-', '.', '/', //
    '0', '1', '2', '3', '4', '5', '6', '7', '8', '9', ':', ';', '<', '=', '>', '?', //
    '¡', 'A', 'B', 'C', 'D', 'E', 'F', 'G', 'H', 'I', 'J', 'K', 'L', 'M', 'N', 'O', //
    'P', 'Q', 'R', 'S', 'T', 'U', 'V', 'W', 'X', 'Y', 'Z', 'Ä', 'Ö', 'Ñ', 'Ü', '§', //
    '¿', 'a', 'b', 'c', 'd', 'e', 'f', 'g', 'h', 'i', 'j', 'k', 'l', 'm', 'n', 'o', //
    'p', 'q', 'r', 's', 't', 'u', 'v', 'w', 'x', 'y', 'z', 'ä', 'ö', 'ñ', 'ü', 'à', //
];

fn septet_to_char(septet: u8) -> char {
    GSM_7BIT_DEFAULT_ALPHABET[(septet & 0x7f) as usize]
}

/// Look up the 7-bit code for a character, or `None` when the character is
/// not in the default alphabet.
pub fn char_to_septet(c: char) -> Option<u8> {
    GSM_7BIT_DEFAULT_ALPHABET
        .iter()
        .position(|&entry| entry == c)
        .map(|index| index as u8)
}

/// Unpack `septet_count` characters from packed octets.
///
/// Each octet contributes `7 - (i % 7)` fresh bits to the current septet;
/// the remainder is carried into the next one, and every seventh octet the
/// carry alone forms a whole extra septet. Trailing pad bits beyond the
/// declared count are discarded.
pub fn unpack(octets: &[u8], septet_count: usize) -> String {
    let mut out = String::with_capacity(septet_count);
    let mut left_over = 0u8;
    for (i, &octet) in octets.iter().enumerate() {
        let shift = (i % 7) as u32;
        let septet_mask = 0xffu8 >> (shift + 1);
        let septet = ((octet & septet_mask) << shift) | left_over;
        out.push(septet_to_char(septet));
        left_over = (octet & !septet_mask) >> (7 - shift);
        if shift == 6 {
            out.push(septet_to_char(left_over));
            left_over = 0;
        }
    }
    if out.chars().count() > septet_count {
        out = out.chars().take(septet_count).collect();
    }
    out
}

/// Pack a string into septets carried low-bit-first across octets, the exact
/// inverse of [`unpack`]. A character outside the default alphabet is an
/// error, never silently dropped.
pub fn pack(text: &str) -> Result<Vec<u8>, PduError> {
    let mut out = Vec::with_capacity(text.len() * 7 / 8 + 1);
    let mut acc: u16 = 0;
    let mut bits = 0u32;
    for c in text.chars() {
        let septet = char_to_septet(c).ok_or(PduError::UnmappableCharacter(c))?;
        acc |= u16::from(septet) << bits;
        bits += 7;
        while bits >= 8 {
            out.push((acc & 0xff) as u8);
            acc >>= 8;
            bits -= 8;
        }
    }
    if bits > 0 {
        out.push((acc & 0xff) as u8);
    }
    Ok(out)
}

/// Number of octets occupied by `septet_count` packed septets.
pub(crate) fn packed_len(septet_count: usize) -> usize {
    (septet_count * 7).div_ceil(8)
}
