//! Error types for SIM sessions and their collaborators

use nexum_sim_core::{FileId, ValidationError};

/// Result type for session requests
pub type Result<T> = std::result::Result<T, SimError>;

/// Errors reported by the file client or the card driver
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// The collaborator does not implement this operation
    #[error("Operation not supported")]
    NotSupported,

    /// Failed to reach the card
    #[error("Failed to connect to card")]
    Connection,

    /// Failed to exchange data with the card
    #[error("Failed to transmit data")]
    Transmission,

    /// The file does not exist on the card
    #[error("File {0} not found")]
    NotFound(FileId),

    /// A read was requested with a zero length
    #[error("Invalid read length")]
    InvalidLength,

    /// The card answered with an error status word
    #[error("Status word error: {0:#06X}")]
    StatusWord(u16),

    /// Other error with message
    #[error("{0}")]
    Other(String),
}

impl TransportError {
    /// Create a new status word error from individual bytes
    pub const fn status_word_bytes(sw1: u8, sw2: u8) -> Self {
        Self::StatusWord(((sw1 as u16) << 8) | (sw2 as u16))
    }

    /// Create a general other error
    pub fn other<S: Into<String>>(message: S) -> Self {
        Self::Other(message.into())
    }
}

/// Errors returned to the control plane by session requests
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SimError {
    /// Another request is still outstanding
    #[error("Operation already in progress")]
    Busy,

    /// The driver or card lacks the capability
    #[error("Not implemented")]
    NotImplemented,

    /// No card is inserted
    #[error("No SIM card present")]
    NotPresent,

    /// A password or password kind was rejected before reaching the card
    #[error("Invalid format: {0}")]
    InvalidFormat(#[from] ValidationError),

    /// Request arguments are out of range
    #[error("Invalid arguments: {0}")]
    InvalidArgs(&'static str),

    /// The card holds nothing the request could act on
    #[error("Not available")]
    Unavailable,

    /// No registered driver accepted the modem
    #[error("No driver for {0}")]
    NoDriver(String),

    /// The driver or card reported a failure
    #[error("Operation failed: {0}")]
    Failed(#[from] TransportError),

    /// Card data could not be decoded
    #[error("Operation failed: {0}")]
    Malformed(#[from] nexum_sim_core::Error),
}

impl SimError {
    /// Whether the request reached the card and failed there
    ///
    /// Both transport failures and undecodable card data count.
    pub const fn is_failure(&self) -> bool {
        matches!(self, Self::Failed(_) | Self::Malformed(_))
    }
}
