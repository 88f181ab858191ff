//! Card driver interface
//!
//! A driver performs the operations that need the modem rather than plain
//! file access: IMSI retrieval and password handling. Every operation is
//! optional; a driver advertises what it implements through
//! [`SimDriver::capabilities`] and the session rejects requests for anything
//! else without calling the driver.

use std::collections::BTreeMap;
use std::fmt;

use async_trait::async_trait;
use nexum_sim_core::PasswordKind;

use crate::error::TransportError;

/// Remaining attempts per password kind; a missing kind means unknown
pub type RetryTable = BTreeMap<PasswordKind, u8>;

/// Optional driver operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// Read the IMSI
    ReadImsi = 0x01,
    /// Query which password the card requires
    QueryPasswordState = 0x02,
    /// Query remaining password attempts
    QueryRetries = 0x04,
    /// Send the required password
    SendPassword = 0x08,
    /// Change a password
    ChangePassword = 0x10,
    /// Enable or disable a password
    Lock = 0x20,
    /// Reset a password with its PUK
    ResetPassword = 0x40,
}

impl Capability {
    const ALL: [Self; 7] = [
        Self::ReadImsi,
        Self::QueryPasswordState,
        Self::QueryRetries,
        Self::SendPassword,
        Self::ChangePassword,
        Self::Lock,
        Self::ResetPassword,
    ];

    const fn name(&self) -> &'static str {
        match self {
            Self::ReadImsi => "IMSI",
            Self::QueryPasswordState => "Password State",
            Self::QueryRetries => "Retries",
            Self::SendPassword => "Send Password",
            Self::ChangePassword => "Change Password",
            Self::Lock => "Lock",
            Self::ResetPassword => "Reset Password",
        }
    }
}

/// Capabilities flags container
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Capabilities(u8);

impl fmt::Display for Capabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<_> = Capability::ALL
            .iter()
            .filter(|cap| self.has_capability(**cap))
            .map(Capability::name)
            .collect();
        write!(f, "{}", names.join(", "))
    }
}

impl Capabilities {
    /// Build a set from a list of capabilities
    pub fn new(capabilities: &[Capability]) -> Self {
        Self(capabilities.iter().fold(0, |flags, &cap| flags | cap as u8))
    }

    /// Every capability
    pub fn all() -> Self {
        Self::new(&Capability::ALL)
    }

    /// Whether the capability is present
    pub const fn has_capability(&self, capability: Capability) -> bool {
        self.0 & capability as u8 != 0
    }

    /// The set without one capability
    pub const fn without(self, capability: Capability) -> Self {
        Self(self.0 & !(capability as u8))
    }
}

impl From<u8> for Capabilities {
    fn from(value: u8) -> Self {
        Self(value)
    }
}

/// Modem-side SIM operations
///
/// Default implementations report [`TransportError::NotSupported`]; the
/// session only calls operations listed in `capabilities`.
#[async_trait(?Send)]
pub trait SimDriver: fmt::Debug {
    /// Driver name, for logging
    fn name(&self) -> &str;

    /// Operations this driver implements
    fn capabilities(&self) -> Capabilities;

    /// Read the subscriber identity
    async fn read_imsi(&self) -> Result<String, TransportError> {
        Err(TransportError::NotSupported)
    }

    /// Which password the card currently requires
    async fn query_password_state(&self) -> Result<PasswordKind, TransportError> {
        Err(TransportError::NotSupported)
    }

    /// Remaining attempts per password kind
    async fn query_retries(&self) -> Result<RetryTable, TransportError> {
        Err(TransportError::NotSupported)
    }

    /// Send the currently required password
    async fn send_password(&self, _password: &str) -> Result<(), TransportError> {
        Err(TransportError::NotSupported)
    }

    /// Change a password
    async fn change_password(
        &self,
        _kind: PasswordKind,
        _old: &str,
        _new: &str,
    ) -> Result<(), TransportError> {
        Err(TransportError::NotSupported)
    }

    /// Enable (`enable == true`) or disable a password
    async fn lock(
        &self,
        _kind: PasswordKind,
        _enable: bool,
        _password: &str,
    ) -> Result<(), TransportError> {
        Err(TransportError::NotSupported)
    }

    /// Unblock the required PUK and set a new PIN
    async fn reset_password(&self, _puk: &str, _new_pin: &str) -> Result<(), TransportError> {
        Err(TransportError::NotSupported)
    }
}
