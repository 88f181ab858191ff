//! Abbreviated dialling number record layout
//!
//! Shared by the subscriber number (EFmsisdn), service dialling number (EFsdn)
//! and dialling number files. A record of length `X + 14` holds:
//!
//! | bytes        | content                         |
//! |--------------|---------------------------------|
//! | `0..X`       | alpha identifier                |
//! | `X`          | length of BCD number + TON/NPI  |
//! | `X+1`        | TON/NPI                         |
//! | `X+2..X+12`  | BCD number                      |
//! | `X+12`       | capability/configuration id     |
//! | `X+13`       | extension record id             |

use tracing::debug;

use crate::alpha;
use crate::bcd;
use crate::error::{Error, Result};
use crate::number::{NumberType, PhoneNumber};

/// Fixed part of every record
pub const FIXED_LENGTH: usize = 14;

/// Bytes reserved for the BCD number
pub const NUMBER_BYTES: usize = 10;

/// Longest value of the length byte (TON/NPI plus ten BCD bytes)
const MAX_NUMBER_LENGTH: u8 = NUMBER_BYTES as u8 + 1;

/// A decoded dialling number record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdnRecord {
    /// Alpha identifier, empty when the record has none
    pub alpha: String,
    /// The number
    pub number: PhoneNumber,
}

impl AdnRecord {
    /// Parse a record
    ///
    /// Fails for records shorter than the fixed part and for empty slots.
    pub fn parse(record: &[u8]) -> Result<Self> {
        Error::ensure_len(record.len(), FIXED_LENGTH)?;

        let alpha_len = record.len() - FIXED_LENGTH;
        let number_len = record[alpha_len];
        let ton_npi = record[alpha_len + 1];

        if number_len > MAX_NUMBER_LENGTH || ton_npi == 0xFF {
            return Err(Error::InvalidData("empty or malformed dialling number"));
        }

        let start = alpha_len + 2;
        let end = start + usize::from(number_len.saturating_sub(1));
        let number = bcd::decode(&record[start..end]);

        let alpha = alpha::decode(&record[..alpha_len]).unwrap_or_else(|e| {
            debug!(error = %e, alpha = ?hex::encode(&record[..alpha_len]), "Undecodable alpha identifier");
            String::new()
        });

        Ok(Self {
            alpha,
            number: PhoneNumber::new(number, NumberType(ton_npi)),
        })
    }

    /// Encode a number (and optional name) into a record of `record_len` bytes
    ///
    /// A name longer than the alpha area is truncated.
    pub fn build(number: &PhoneNumber, alpha: Option<&str>, record_len: usize) -> Result<Vec<u8>> {
        Error::ensure_len(record_len, FIXED_LENGTH)?;

        let digits = bcd::encode(&number.number)
            .ok_or(Error::InvalidData("number has non-BCD characters"))?;
        if digits.len() > NUMBER_BYTES {
            return Err(Error::InvalidData("number too long"));
        }

        let alpha_len = record_len - FIXED_LENGTH;
        let mut record = vec![0xFF; record_len];

        if let Some(text) = alpha {
            let encoded = alpha::encode_gsm(text)?;
            let n = encoded.len().min(alpha_len);
            record[..n].copy_from_slice(&encoded[..n]);
        }

        record[alpha_len] = digits.len() as u8 + 1;
        record[alpha_len + 1] = number.number_type.0;
        record[alpha_len + 2..alpha_len + 2 + digits.len()].copy_from_slice(&digits);

        Ok(record)
    }

    /// A cleared record slot of `record_len` bytes
    pub fn empty(record_len: usize) -> Vec<u8> {
        let mut record = vec![0xFF; record_len];
        if let Some(len_byte) = record_len
            .checked_sub(FIXED_LENGTH)
            .and_then(|i| record.get_mut(i))
        {
            *len_byte = 1;
        }
        record
    }
}
