//! Password (PIN/PUK) classification and format policy
//!
//! Kinds are identified on the control plane by their canonical names
//! (`"pin"`, `"phnet-puk"`, ...). Validation only checks format; whether a
//! password is correct is decided by the card.

use std::fmt;
use std::str::FromStr;

/// Error type for password format failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// The password is not within the length bounds of its kind
    #[error("Password has incorrect length: expected {min}..={max}, got {actual}")]
    IncorrectLength {
        /// Minimum length
        min: usize,
        /// Maximum length
        max: usize,
        /// Actual length
        actual: usize,
    },

    /// The password contains something other than decimal digits
    #[error("Password contains invalid characters")]
    InvalidCharacters,

    /// The kind is not accepted by the request
    #[error("Password kind {0} not accepted here")]
    NotAPassword(PasswordKind),
}

/// Name did not match any known password kind
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown password kind: {0}")]
pub struct UnknownPasswordKind(pub String);

/// Password kinds a card may require or report
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum PasswordKind {
    /// No password required
    #[default]
    None,
    /// SIM PIN
    Pin,
    /// SIM PIN2
    Pin2,
    /// Phone-to-SIM personalisation PIN
    PhSimPin,
    /// Phone-to-very-first-SIM personalisation PIN
    PhFSimPin,
    /// Network personalisation PIN
    PhNetPin,
    /// Network subset personalisation PIN
    PhNetSubPin,
    /// Service provider personalisation PIN
    PhSpPin,
    /// Corporate personalisation PIN
    PhCorpPin,
    /// SIM PUK
    Puk,
    /// SIM PUK2
    Puk2,
    /// Phone-to-very-first-SIM personalisation PUK
    PhFSimPuk,
    /// Network personalisation PUK
    PhNetPuk,
    /// Network subset personalisation PUK
    PhNetSubPuk,
    /// Service provider personalisation PUK
    PhSpPuk,
    /// Corporate personalisation PUK
    PhCorpPuk,
}

impl PasswordKind {
    /// Every kind, in canonical order
    pub const ALL: [Self; 16] = [
        Self::None,
        Self::Pin,
        Self::Pin2,
        Self::PhSimPin,
        Self::PhFSimPin,
        Self::PhNetPin,
        Self::PhNetSubPin,
        Self::PhSpPin,
        Self::PhCorpPin,
        Self::Puk,
        Self::Puk2,
        Self::PhFSimPuk,
        Self::PhNetPuk,
        Self::PhNetSubPuk,
        Self::PhSpPuk,
        Self::PhCorpPuk,
    ];

    /// Canonical control-plane name
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Pin => "pin",
            Self::Pin2 => "pin2",
            Self::PhSimPin => "phsim-pin",
            Self::PhFSimPin => "phfsim-pin",
            Self::PhNetPin => "phnet-pin",
            Self::PhNetSubPin => "phnetsub-pin",
            Self::PhSpPin => "phsp-pin",
            Self::PhCorpPin => "phcorp-pin",
            Self::Puk => "puk",
            Self::Puk2 => "puk2",
            Self::PhFSimPuk => "phfsim-puk",
            Self::PhNetPuk => "phnet-puk",
            Self::PhNetSubPuk => "phnetsub-puk",
            Self::PhSpPuk => "phsp-puk",
            Self::PhCorpPuk => "phcorp-puk",
        }
    }

    /// Whether this is one of the PIN-class kinds
    pub const fn is_pin(&self) -> bool {
        matches!(
            self,
            Self::Pin
                | Self::Pin2
                | Self::PhSimPin
                | Self::PhFSimPin
                | Self::PhNetPin
                | Self::PhNetSubPin
                | Self::PhSpPin
                | Self::PhCorpPin
        )
    }

    /// Whether this is one of the PUK-class kinds
    pub const fn is_puk(&self) -> bool {
        matches!(
            self,
            Self::Puk
                | Self::Puk2
                | Self::PhFSimPuk
                | Self::PhNetPuk
                | Self::PhNetSubPuk
                | Self::PhSpPuk
                | Self::PhCorpPuk
        )
    }

    /// The PIN kind a PUK kind unblocks
    ///
    /// Returns `None` for anything that is not a PUK.
    pub const fn puk_for(&self) -> Option<Self> {
        match self {
            Self::Puk => Some(Self::Pin),
            Self::Puk2 => Some(Self::Pin2),
            Self::PhFSimPuk => Some(Self::PhFSimPin),
            Self::PhNetPuk => Some(Self::PhNetPin),
            Self::PhNetSubPuk => Some(Self::PhNetSubPin),
            Self::PhSpPuk => Some(Self::PhSpPin),
            Self::PhCorpPuk => Some(Self::PhCorpPin),
            _ => None,
        }
    }

    /// The kind that ends up locked when the card asks for this one
    ///
    /// A PUK request means the matching PIN is blocked.
    pub fn locked_kind(&self) -> Self {
        self.puk_for().unwrap_or(*self)
    }

    /// Inclusive length bounds for passwords of this kind
    pub const fn length_bounds(&self) -> (usize, usize) {
        match self {
            Self::None => (0, 8),
            Self::Pin | Self::Pin2 => (4, 8),
            _ if self.is_puk() => (8, 8),
            _ => (4, 16),
        }
    }

    /// Check the format of a password for this kind
    pub fn check(&self, password: &str) -> Result<(), ValidationError> {
        if password.is_empty() {
            let (min, max) = self.length_bounds();
            return Err(ValidationError::IncorrectLength {
                min: min.max(1),
                max,
                actual: 0,
            });
        }

        if !password.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ValidationError::InvalidCharacters);
        }

        let (min, max) = self.length_bounds();
        let actual = password.len();
        if actual < min || actual > max {
            return Err(ValidationError::IncorrectLength { min, max, actual });
        }

        Ok(())
    }

    /// Whether a password has a valid format for this kind
    pub fn validate(&self, password: &str) -> bool {
        self.check(password).is_ok()
    }
}

/// Validate a network personalisation lock password (exactly four digits)
pub fn validate_network_pin(password: &str) -> bool {
    password.len() == 4 && password.bytes().all(|b| b.is_ascii_digit())
}

impl fmt::Display for PasswordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PasswordKind {
    type Err = UnknownPasswordKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| UnknownPasswordKind(s.to_string()))
    }
}
