//! Alpha identifiers (record names) in SIM text encodings
//!
//! A record name is either the unpacked GSM 7-bit default alphabet, padded
//! with `0xFF`, or one of the three UCS2 forms tagged by the first byte:
//!
//! - `0x80`: big-endian UCS2 code units until `0xFFFF`
//! - `0x81`: length, 8-bit base pointer (bits 15..7), then one byte per char
//! - `0x82`: length, 16-bit base, then one byte per char
//!
//! In the two compact forms a byte with the top bit set is an offset from the
//! base; any other byte is a GSM default alphabet character.

use crate::error::{Error, Result};

const ESCAPE: u8 = 0x1B;
const PADDING: u8 = 0xFF;

#[rustfmt::skip]
const GSM_DEFAULT: [char; 128] = [
    '@', '£', '$', '¥', 'è', 'é', 'ù', 'ì', 'ò', 'Ç', '\n', 'Ø', 'ø', '\r', 'Å', 'å',
    'Δ', '_', 'Φ', 'Γ', 'Λ', 'Ω', 'Π', 'Ψ', 'Σ', 'Θ', 'Ξ', '\u{A0}', 'Æ', 'æ', 'ß', 'É',
    ' ', '!', '"', '#', '¤', '%', '&', '\'', '(', ')', '*', '+', ',', '-', '.', '/',
    '0', '1', '2', '3', '4', '5', '6', '7', '8', '9', ':', ';', '<', '=', '>', '?',
    '¡', 'A', 'B', 'C', 'D', 'E', 'F', 'G', 'H', 'I', 'J', 'K', 'L', 'M', 'N', 'O',
    'P', 'Q', 'R', 'S', 'T', 'U', 'V', 'W', 'X', 'Y', 'Z', 'Ä', 'Ö', 'Ñ', 'Ü', '§',
    '¿', 'a', 'b', 'c', 'd', 'e', 'f', 'g', 'h', 'i', 'j', 'k', 'l', 'm', 'n', 'o',
    'p', 'q', 'r', 's', 't', 'u', 'v', 'w', 'x', 'y', 'z', 'ä', 'ö', 'ñ', 'ü', 'à',
];

const GSM_EXTENSION: [(u8, char); 10] = [
    (0x0A, '\u{0C}'),
    (0x14, '^'),
    (0x28, '{'),
    (0x29, '}'),
    (0x2F, '\\'),
    (0x3C, '['),
    (0x3D, '~'),
    (0x3E, ']'),
    (0x40, '|'),
    (0x65, '€'),
];

fn gsm_char(byte: u8) -> char {
    GSM_DEFAULT[(byte & 0x7F) as usize]
}

fn gsm_extension_char(byte: u8) -> char {
    GSM_EXTENSION
        .iter()
        .find(|(code, _)| *code == byte)
        .map_or_else(|| gsm_char(byte), |&(_, c)| c)
}

/// Decode an alpha identifier to text
///
/// Trailing padding is dropped; an all-padding identifier decodes to an empty
/// string.
pub fn decode(data: &[u8]) -> Result<String> {
    match data.first() {
        None | Some(&PADDING) => Ok(String::new()),
        Some(0x80) => Ok(decode_ucs2(&data[1..])),
        Some(0x81) => {
            Error::ensure_len(data.len(), 3)?;
            let base = u16::from(data[2]) << 7;
            decode_compact(data[1], base, &data[3..])
        }
        Some(0x82) => {
            Error::ensure_len(data.len(), 4)?;
            let base = u16::from_be_bytes([data[2], data[3]]);
            decode_compact(data[1], base, &data[4..])
        }
        Some(_) => Ok(decode_gsm(data)),
    }
}

/// Decode unpacked GSM 7-bit default alphabet up to the first `0xFF`
pub fn decode_gsm(data: &[u8]) -> String {
    let mut out = String::with_capacity(data.len());
    let mut bytes = data.iter().copied().take_while(|&b| b != PADDING);
    while let Some(byte) = bytes.next() {
        if byte == ESCAPE {
            match bytes.next() {
                Some(ext) => out.push(gsm_extension_char(ext)),
                None => break,
            }
        } else {
            out.push(gsm_char(byte));
        }
    }
    out
}

fn decode_ucs2(data: &[u8]) -> String {
    let units = data
        .chunks_exact(2)
        .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
        .take_while(|&unit| unit != 0xFFFF);

    char::decode_utf16(units)
        .map(|c| c.unwrap_or(char::REPLACEMENT_CHARACTER))
        .collect()
}

fn decode_compact(count: u8, base: u16, data: &[u8]) -> Result<String> {
    let count = count as usize;
    if count > data.len() {
        return Err(Error::InvalidLength {
            expected: count,
            actual: data.len(),
        });
    }

    Ok(data[..count]
        .iter()
        .map(|&byte| {
            if byte & 0x80 != 0 {
                char::from_u32(u32::from(base) + u32::from(byte & 0x7F))
                    .unwrap_or(char::REPLACEMENT_CHARACTER)
            } else {
                gsm_char(byte)
            }
        })
        .collect())
}

/// Encode text to unpacked GSM 7-bit default alphabet
///
/// Fails if a character has no representation in the default alphabet or its
/// extension table.
pub fn encode_gsm(text: &str) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(text.len());
    for c in text.chars() {
        if let Some(pos) = GSM_DEFAULT.iter().position(|&d| d == c && d != '\u{A0}') {
            out.push(pos as u8);
        } else if let Some(&(code, _)) = GSM_EXTENSION.iter().find(|(_, d)| *d == c) {
            out.extend_from_slice(&[ESCAPE, code]);
        } else {
            return Err(Error::Unsupported("character outside GSM default alphabet"));
        }
    }
    Ok(out)
}
