//! Card-derived session data

use std::collections::{BTreeSet, HashMap};

use nexum_sim_core::files;
use nexum_sim_core::{
    CphsInformation, ImageDescriptor, PasswordKind, Phase, PhoneNumber, SimServiceTable,
    UsimServiceTable,
};

use crate::driver::RetryTable;
use crate::event::ServiceNumber;

/// Record geometry of the subscriber number file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RecordLayout {
    pub(crate) record_length: usize,
    pub(crate) records: usize,
}

/// Everything read from the card; reset to default when it is removed
#[derive(Debug, Default)]
pub(crate) struct CardData {
    pub(crate) iccid: Option<String>,
    pub(crate) imsi: Option<String>,
    pub(crate) mcc: Option<String>,
    pub(crate) mnc: Option<String>,
    pub(crate) mnc_length: Option<usize>,

    pub(crate) phase: Phase,
    pub(crate) cphs: Option<CphsInformation>,
    pub(crate) sst: Option<SimServiceTable>,
    pub(crate) ust: Option<UsimServiceTable>,

    pub(crate) fixed_dialing: bool,
    pub(crate) barred_dialing: bool,

    pub(crate) own_numbers: Vec<PhoneNumber>,
    pub(crate) msisdn_layout: Option<RecordLayout>,
    pub(crate) service_numbers: Vec<ServiceNumber>,
    pub(crate) sdn_ready: bool,

    pub(crate) languages: Vec<String>,

    pub(crate) pin_type: PasswordKind,
    pub(crate) locked_pins: BTreeSet<PasswordKind>,
    pub(crate) retries: RetryTable,
    pub(crate) after_pin_started: bool,

    pub(crate) efimg: Option<Vec<Option<ImageDescriptor>>>,
    pub(crate) icons: HashMap<u8, String>,
}

impl CardData {
    /// Derive MCC and MNC once both the IMSI and the MNC length are known
    ///
    /// Returns the pair when it was derived by this call.
    pub(crate) fn derive_mcc_mnc(&mut self) -> Option<(String, String)> {
        if self.mcc.is_some() {
            return None;
        }
        let (mcc, mnc) = files::split_imsi(self.imsi.as_deref()?, self.mnc_length?)?;
        self.mcc = Some(mcc.clone());
        self.mnc = Some(mnc.clone());
        Some((mcc, mnc))
    }

    pub(crate) fn locked_pins(&self) -> Vec<PasswordKind> {
        self.locked_pins.iter().copied().collect()
    }
}
