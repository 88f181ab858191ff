//! Swapped-nibble BCD as used for dialling numbers and the ICCID
//!
//! Each byte carries two digits, low nibble first. `0xF` pads an odd digit
//! count and terminates the number.

const DIGITS: &[u8; 15] = b"0123456789*#abc";

/// Decode swapped-nibble BCD, stopping at the first `0xF` nibble
pub fn decode(data: &[u8]) -> String {
    let mut out = String::with_capacity(data.len() * 2);
    for &byte in data {
        for nibble in [byte & 0x0F, byte >> 4] {
            match DIGITS.get(nibble as usize) {
                Some(&c) => out.push(c as char),
                None => return out,
            }
        }
    }
    out
}

/// Encode dialling digits to swapped-nibble BCD, padding the last byte with `0xF`
///
/// Returns `None` if a character has no BCD representation.
pub fn encode(digits: &str) -> Option<Vec<u8>> {
    let nibbles = digits
        .bytes()
        .map(|c| DIGITS.iter().position(|&d| d == c.to_ascii_lowercase()))
        .collect::<Option<Vec<_>>>()?;

    Some(
        nibbles
            .chunks(2)
            .map(|pair| {
                let low = pair[0] as u8;
                let high = pair.get(1).map_or(0x0F, |&n| n as u8);
                (high << 4) | low
            })
            .collect(),
    )
}
