//! Core types and decoders for SIM/USIM identity modules
//!
//! This crate holds everything about a SIM card that can be expressed without
//! talking to the card:
//!
//! - Password (PIN/PUK) classification and format policy
//! - Elementary file identifiers and the small fixed-layout files read during
//!   bring-up (phase, administrative data, CPHS information, ICCID)
//! - Service table interpretation for SIM, USIM and enabled-services tables
//! - Phone number records in abbreviated dialling number layout
//! - Language preference resolution
//! - Image descriptors and XPM rendering for card icons
//!
//! Nothing here performs I/O; the session layer feeds raw file contents in and
//! gets typed values out.
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![forbid(unsafe_code)]
#![warn(missing_docs, rustdoc::missing_crate_level_docs)]

// Re-export bytes for convenience
pub use bytes::{Bytes, BytesMut};

pub mod adn;
pub mod alpha;
pub mod bcd;
pub mod error;
pub mod files;
pub mod image;
pub mod language;
pub mod number;
pub mod password;
pub mod service;

pub use adn::AdnRecord;
pub use error::{Error, Result};
pub use files::{CphsInformation, CphsPhase, FileId, FileStructure, Phase};
pub use image::{ImageDescriptor, ImageScheme};
pub use number::{NumberType, PhoneNumber};
pub use password::{PasswordKind, ValidationError};
pub use service::{
    EnabledService, EnabledServiceTable, SimService, SimServiceTable, UsimService,
    UsimServiceTable,
};

/// Prelude module containing commonly used traits and types
pub mod prelude {
    pub use crate::{Bytes, BytesMut, Error, Result};

    // Files
    pub use crate::files::{self, CphsInformation, CphsPhase, FileId, FileStructure, Phase};

    // Records
    pub use crate::adn::AdnRecord;
    pub use crate::number::{NumberType, PhoneNumber};

    // Services
    pub use crate::service::{
        EnabledService, EnabledServiceTable, SimService, SimServiceTable, UsimService,
        UsimServiceTable,
    };

    // Passwords
    pub use crate::password::{PasswordKind, ValidationError};

    // Icons
    pub use crate::image::{ImageDescriptor, ImageScheme};
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    #[test]
    fn test_reexports() {
        let kind: PasswordKind = "phnet-puk".parse().unwrap();
        assert!(kind.is_puk());
        assert_eq!(kind.puk_for(), Some(PasswordKind::PhNetPin));

        let record = AdnRecord::parse(&hex!("0681214365F7FFFFFFFFFFFFFF")).ok();
        assert!(record.is_none());

        let table = SimServiceTable::from(Bytes::copy_from_slice(&hex!("3000")));
        assert!(table.is_active(SimService::Fdn));
    }
}
