//! Elementary file identifiers and the fixed-layout files read during bring-up

use bytes::Bytes;
use derive_more::{Display, From};

use crate::bcd;
use crate::error::{Error, Result};

/// Elementary file identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, From)]
#[display("{_0:04X}")]
pub struct FileId(pub u16);

impl FileId {
    /// ICC identification
    pub const ICCID: Self = Self(0x2FE2);
    /// Extended language preference
    pub const PL: Self = Self(0x2F05);
    /// Language indication
    pub const LI: Self = Self(0x6F05);
    /// CPHS information
    pub const CPHS_INFO: Self = Self(0x6F16);
    /// SIM service table (GSM) / USIM service table (UMTS)
    pub const SST: Self = Self(0x6F38);
    /// USIM service table, same identifier as EFsst
    pub const UST: Self = Self(0x6F38);
    /// Abbreviated dialling numbers
    pub const ADN: Self = Self(0x6F3A);
    /// Fixed dialling numbers
    pub const FDN: Self = Self(0x6F3B);
    /// Subscriber numbers
    pub const MSISDN: Self = Self(0x6F40);
    /// Service dialling numbers
    pub const SDN: Self = Self(0x6F49);
    /// Barred dialling numbers
    pub const BDN: Self = Self(0x6F4D);
    /// Enabled services table
    pub const EST: Self = Self(0x6F56);
    /// Administrative data
    pub const AD: Self = Self(0x6FAD);
    /// Phase identification
    pub const PHASE: Self = Self(0x6FAE);
    /// Image descriptors
    pub const IMG: Self = Self(0x4F20);
}

/// Structure of an elementary file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileStructure {
    /// Single byte string
    Transparent,
    /// Fixed-length records
    Fixed,
    /// Fixed-length records accessed cyclically
    Cyclic,
}

/// File status byte
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, From)]
pub struct FileStatus(pub u8);

impl FileStatus {
    const VALID: u8 = 0x01;

    /// Whether the file is not invalidated
    pub const fn is_valid(&self) -> bool {
        self.0 & Self::VALID != 0
    }
}

/// Card phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display)]
pub enum Phase {
    /// Phase 1 SIM
    #[display("1G")]
    Phase1G,
    /// Phase 2 SIM
    #[display("2G")]
    Phase2G,
    /// Phase 2+ SIM
    #[display("2G+")]
    Phase2GPlus,
    /// USIM
    #[display("3G")]
    Phase3G,
    /// Not yet determined
    #[default]
    #[display("unknown")]
    Unknown,
}

impl Phase {
    /// Decode EFphase
    ///
    /// Returns `None` when the content is not a known phase; callers treat
    /// that as a USIM.
    pub fn parse(data: &[u8]) -> Option<Self> {
        match data {
            [0] => Some(Self::Phase1G),
            [2] => Some(Self::Phase2G),
            [3] => Some(Self::Phase2GPlus),
            _ => None,
        }
    }

    /// Whether this is a USIM
    pub const fn is_usim(&self) -> bool {
        matches!(self, Self::Phase3G)
    }
}

/// CPHS phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display)]
pub enum CphsPhase {
    /// No CPHS support
    #[default]
    #[display("none")]
    None,
    /// CPHS phase 1
    #[display("1G")]
    Phase1G,
    /// CPHS phase 2
    #[display("2G")]
    Phase2G,
}

/// Decoded CPHS information file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CphsInformation {
    /// CPHS phase
    pub phase: CphsPhase,
    /// Two-byte CPHS service table
    pub service_table: [u8; 2],
}

impl CphsInformation {
    /// Decode the CPHS information file
    pub fn parse(data: &[u8]) -> Result<Self> {
        Error::ensure_len(data.len(), 3)?;
        let phase = match data[0] {
            1 => CphsPhase::Phase1G,
            p if p >= 2 => CphsPhase::Phase2G,
            _ => CphsPhase::None,
        };
        Ok(Self {
            phase,
            service_table: [data[1], data[2]],
        })
    }
}

/// Length of the MCC within an IMSI
pub const MCC_LENGTH: usize = 3;

/// Extract the MNC length from EFad
///
/// Only the values 2 and 3 are meaningful; anything else yields `None`.
pub fn parse_mnc_length(data: &[u8]) -> Option<usize> {
    match data.get(3)? & 0x0F {
        n @ (2 | 3) => Some(usize::from(n)),
        _ => None,
    }
}

/// Decode the ICCID from EFiccid
pub fn parse_iccid(data: &Bytes) -> Result<String> {
    Error::ensure_len(data.len(), 10)?;
    Ok(bcd::decode(&data[..10]))
}

/// Split an IMSI into MCC and MNC
///
/// Returns `None` when the IMSI is too short for the given MNC length.
pub fn split_imsi(imsi: &str, mnc_length: usize) -> Option<(String, String)> {
    let mcc = imsi.get(..MCC_LENGTH)?;
    let mnc = imsi.get(MCC_LENGTH..MCC_LENGTH + mnc_length)?;
    Some((mcc.to_string(), mnc.to_string()))
}
