//! Phone numbers as stored on the card

use std::fmt;
use std::str::FromStr;

use derive_more::{Display, From};

use crate::error::Error;

/// Longest dialling string accepted from the control plane
pub const MAX_NUMBER_LENGTH: usize = 20;

/// Type-of-number / numbering-plan byte
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, From)]
#[display("{_0}")]
pub struct NumberType(pub u8);

impl NumberType {
    /// International number, ISDN numbering plan
    pub const INTERNATIONAL: Self = Self(145);
    /// Unknown type, ISDN numbering plan
    pub const UNKNOWN: Self = Self(129);

    /// Whether the number is in international format
    pub const fn is_international(&self) -> bool {
        self.0 == Self::INTERNATIONAL.0
    }
}

/// A dialling number and its type
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PhoneNumber {
    /// Digits without any leading `+`
    pub number: String,
    /// Type-of-number byte
    pub number_type: NumberType,
}

impl PhoneNumber {
    /// Create a phone number from bare digits and a type
    pub fn new(number: impl Into<String>, number_type: NumberType) -> Self {
        Self {
            number: number.into(),
            number_type,
        }
    }

    /// Whether `s` is a dialling string the card can store
    ///
    /// An optional leading `+` followed by 1 to 20 of `0-9`, `*` and `#`.
    pub fn is_valid(s: &str) -> bool {
        let digits = s.strip_prefix('+').unwrap_or(s);
        !digits.is_empty()
            && digits.len() <= MAX_NUMBER_LENGTH
            && digits
                .bytes()
                .all(|c| c.is_ascii_digit() || c == b'*' || c == b'#')
    }
}

impl fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.number_type.is_international() {
            f.write_str("+")?;
        }
        f.write_str(&self.number)
    }
}

impl FromStr for PhoneNumber {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if !Self::is_valid(s) {
            return Err(Error::InvalidData("phone number format"));
        }

        Ok(match s.strip_prefix('+') {
            Some(digits) => Self::new(digits, NumberType::INTERNATIONAL),
            None => Self::new(s, NumberType::UNKNOWN),
        })
    }
}
