//! Language preference resolution from EFli and EFpl
//!
//! EFpl always holds two-letter ISO 639 codes. EFli holds either the same
//! pair format (USIM) or single-byte cell broadcast language codes (legacy
//! SIM); the format is detected from the content.

/// Cell broadcast data coding scheme language codes
const CBS_LANGUAGES: [(u8, &str); 20] = [
    (0, "de"),
    (1, "en"),
    (2, "it"),
    (3, "fr"),
    (4, "es"),
    (5, "nl"),
    (6, "sv"),
    (7, "da"),
    (8, "pt"),
    (9, "fi"),
    (10, "no"),
    (11, "el"),
    (12, "tr"),
    (13, "hu"),
    (14, "pl"),
    (32, "cs"),
    (33, "he"),
    (34, "ar"),
    (35, "ru"),
    (36, "is"),
];

const UNUSED: [u8; 2] = [0xFF, 0xFF];

/// Whether `data` is a list of two-letter codes (unused `FFFF` slots allowed)
pub fn is_pair_format(data: &[u8]) -> bool {
    data.len() % 2 == 0
        && data
            .chunks_exact(2)
            .filter(|pair| *pair != UNUSED)
            .all(|pair| pair.iter().all(u8::is_ascii_alphabetic))
}

/// Decode a list of two-letter codes, lowercased
///
/// Pairs containing a byte above `0x7F` (including `FFFF` padding) are
/// skipped.
pub fn parse_pairs(data: &[u8]) -> Vec<String> {
    data.chunks_exact(2)
        .filter(|pair| pair.iter().all(|&b| b <= 0x7F))
        .map(|pair| {
            pair.iter()
                .map(|&b| char::from(b.to_ascii_lowercase()))
                .collect()
        })
        .collect()
}

/// Decode a list of cell broadcast language codes, skipping unknown ones
pub fn parse_cbs(data: &[u8]) -> Vec<String> {
    data.iter()
        .filter_map(|code| {
            CBS_LANGUAGES
                .iter()
                .find(|(c, _)| c == code)
                .map(|(_, lang)| (*lang).to_string())
        })
        .collect()
}

fn append_unique(out: &mut Vec<String>, langs: Vec<String>) {
    for lang in langs {
        if !out.contains(&lang) {
            out.push(lang);
        }
    }
}

/// Merge EFli and EFpl into an ordered, duplicate-free preference list
///
/// `None` stands for a file that could not be read.
pub fn resolve(li: Option<&[u8]>, pl: Option<&[u8]>) -> Vec<String> {
    let pl_langs = pl
        .filter(|data| data.len() >= 2)
        .map(parse_pairs)
        .unwrap_or_default();

    let mut out = Vec::new();
    match li.filter(|data| !data.is_empty()) {
        None => append_unique(&mut out, pl_langs),
        Some(li) if is_pair_format(li) => {
            if !li.starts_with(&UNUSED) {
                append_unique(&mut out, parse_pairs(li));
            }
            append_unique(&mut out, pl_langs);
        }
        Some(li) => {
            append_unique(&mut out, pl_langs);
            append_unique(&mut out, parse_cbs(li));
        }
    }
    out
}
