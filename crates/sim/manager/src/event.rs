//! Session state and change notifications

use derive_more::Display;
use nexum_sim_core::{PasswordKind, PhoneNumber};

use crate::driver::RetryTable;

/// Session state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display)]
pub enum SimState {
    /// No card inserted
    #[default]
    #[display("not present")]
    NotPresent,
    /// Card inserted, bring-up in progress
    #[display("inserted")]
    Inserted,
    /// Bring-up complete, subscriber identity known
    #[display("ready")]
    Ready,
}

/// A named service dialling number
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceNumber {
    /// Name shown to the user
    pub name: String,
    /// The number
    pub number: PhoneNumber,
}

/// A property whose value changed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Property {
    /// Card presence
    Present(bool),
    /// ICCID
    CardIdentifier(String),
    /// IMSI
    SubscriberIdentity(String),
    /// Mobile country code
    MobileCountryCode(String),
    /// Mobile network code
    MobileNetworkCode(String),
    /// Fixed dialling restriction in force
    FixedDialing(bool),
    /// Barred dialling restriction in force
    BarredDialing(bool),
    /// Subscriber numbers
    SubscriberNumbers(Vec<PhoneNumber>),
    /// Service dialling numbers
    ServiceNumbers(Vec<ServiceNumber>),
    /// Preferred languages, most preferred first
    PreferredLanguages(Vec<String>),
    /// Password the card requires
    PinRequired(PasswordKind),
    /// Passwords currently enabled
    LockedPins(Vec<PasswordKind>),
    /// Remaining password attempts
    Retries(RetryTable),
}

/// Notification sent to subscribers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimEvent {
    /// Session state moved
    StateChanged(SimState),
    /// A property changed
    PropertyChanged(Property),
}

/// Snapshot of everything the control plane exposes
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SimProperties {
    /// Card presence
    pub present: bool,
    /// ICCID
    pub card_identifier: Option<String>,
    /// IMSI
    pub subscriber_identity: Option<String>,
    /// Mobile country code
    pub mobile_country_code: Option<String>,
    /// Mobile network code
    pub mobile_network_code: Option<String>,
    /// Fixed dialling restriction in force
    pub fixed_dialing: bool,
    /// Barred dialling restriction in force
    pub barred_dialing: bool,
    /// Subscriber numbers
    pub subscriber_numbers: Vec<PhoneNumber>,
    /// Service dialling numbers, empty until read
    pub service_numbers: Vec<ServiceNumber>,
    /// Preferred languages
    pub preferred_languages: Vec<String>,
    /// Password the card requires
    pub pin_required: PasswordKind,
    /// Passwords currently enabled
    pub locked_pins: Vec<PasswordKind>,
    /// Remaining password attempts
    pub retries: RetryTable,
}
