//! Service table interpretation
//!
//! The SIM service table (EFsst) spends two bits per service: allocated and
//! activated. The USIM service table (EFust) and enabled services table
//! (EFest) spend one bit per service. Services are numbered from 1, bits are
//! packed least significant first. A service beyond the end of the table is
//! neither available nor active.

use bytes::Bytes;
use derive_more::{Deref, From};

/// Services of the SIM service table used here
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SimService {
    /// Abbreviated dialling numbers
    Adn = 2,
    /// Fixed dialling numbers
    Fdn = 3,
    /// Short message storage
    Sms = 4,
    /// Subscriber numbers
    Msisdn = 9,
    /// Service provider name
    Spn = 17,
    /// Service dialling numbers
    Sdn = 18,
    /// Barred dialling numbers
    Bdn = 31,
    /// Image (icon) files
    Img = 39,
}

/// Services of the USIM service table used here
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum UsimService {
    /// Fixed dialling numbers
    Fdn = 2,
    /// Service dialling numbers
    Sdn = 4,
    /// Barred dialling numbers
    Bdn = 6,
    /// Short message storage
    Sms = 10,
    /// Service provider name
    Spn = 19,
    /// Subscriber numbers
    Msisdn = 21,
    /// Image (icon) files
    Img = 22,
    /// Enabled services table
    Est = 35,
}

/// Services of the enabled services table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum EnabledService {
    /// Fixed dialling numbers
    Fdn = 1,
    /// Barred dialling numbers
    Bdn = 2,
    /// Access point name control list
    Acl = 3,
}

fn bit(table: &[u8], service: u8) -> bool {
    let Some(index) = usize::from(service).checked_sub(1) else {
        return false;
    };
    table
        .get(index / 8)
        .is_some_and(|byte| (byte >> (index % 8)) & 1 == 1)
}

/// Contents of EFsst
#[derive(Debug, Clone, Default, PartialEq, Eq, Deref, From)]
pub struct SimServiceTable(Bytes);

impl SimServiceTable {
    fn bits(&self, service: SimService) -> Option<u8> {
        let index = service as usize - 1;
        self.0
            .get(index / 4)
            .map(|byte| (byte >> ((index % 4) * 2)) & 0b11)
    }

    /// Whether the service is allocated
    pub fn is_available(&self, service: SimService) -> bool {
        self.bits(service).is_some_and(|b| b & 0b01 != 0)
    }

    /// Whether the service is activated
    pub fn is_active(&self, service: SimService) -> bool {
        self.bits(service).is_some_and(|b| b & 0b10 != 0)
    }
}

/// Contents of EFust
#[derive(Debug, Clone, Default, PartialEq, Eq, Deref, From)]
pub struct UsimServiceTable(Bytes);

impl UsimServiceTable {
    /// Whether the service is available
    pub fn is_available(&self, service: UsimService) -> bool {
        bit(&self.0, service as u8)
    }
}

/// Contents of EFest
#[derive(Debug, Clone, Default, PartialEq, Eq, Deref, From)]
pub struct EnabledServiceTable(Bytes);

impl EnabledServiceTable {
    /// Whether the service is enabled
    pub fn is_active(&self, service: EnabledService) -> bool {
        bit(&self.0, service as u8)
    }
}
