//! Single outstanding external request

use std::cell::Cell;

use derive_more::Display;
use tracing::trace;

use crate::error::{Result, SimError};

/// Externally initiated operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum RequestKind {
    /// Enter the required password
    #[display("enter-pin")]
    EnterPin,
    /// Unblock with a PUK
    #[display("reset-pin")]
    ResetPin,
    /// Change a password
    #[display("change-pin")]
    ChangePin,
    /// Enable a password
    #[display("lock-pin")]
    LockPin,
    /// Disable a password
    #[display("unlock-pin")]
    UnlockPin,
    /// Overwrite subscriber numbers
    #[display("set-subscriber-numbers")]
    SetSubscriberNumbers,
    /// Fetch an icon
    #[display("get-icon")]
    GetIcon,
}

/// Holds the pending slot; frees it on drop
#[derive(Debug)]
pub(crate) struct PendingGuard<'a> {
    slot: &'a Cell<Option<RequestKind>>,
}

impl<'a> PendingGuard<'a> {
    pub(crate) fn acquire(slot: &'a Cell<Option<RequestKind>>, kind: RequestKind) -> Result<Self> {
        if let Some(current) = slot.get() {
            trace!(%current, requested = %kind, "Rejecting request, another is pending");
            return Err(SimError::Busy);
        }
        slot.set(Some(kind));
        Ok(Self { slot })
    }
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.slot.set(None);
    }
}
