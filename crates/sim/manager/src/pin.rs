//! Password requests
//!
//! Each request validates its arguments before touching the driver. The card
//! decides whether a password is correct; whatever it answers, retry counters
//! and the required password kind are re-queried afterwards.

use nexum_sim_core::{PasswordKind, ValidationError};
use tracing::{debug, info};

use crate::driver::Capability;
use crate::error::{Result, SimError};
use crate::event::Property;
use crate::pending::RequestKind;
use crate::sim::Sim;

impl Sim {
    /// Enter the password the card currently requires
    pub async fn enter_pin(&self, kind: PasswordKind, pin: &str) -> Result<()> {
        self.require(Capability::SendPassword)?;
        let _guard = self.begin(RequestKind::EnterPin)?;
        self.require_present()?;
        self.require_pending_kind(kind)?;
        kind.check(pin)?;

        let epoch = self.epoch();
        let result = self.inner.driver.send_password(pin).await;
        debug!(%kind, ok = result.is_ok(), "Password entered");

        self.check_pin_state_at(epoch).await;
        Ok(result?)
    }

    /// Unblock with the PUK the card currently requires and set a new PIN
    pub async fn reset_pin(&self, puk_kind: PasswordKind, puk: &str, new_pin: &str) -> Result<()> {
        self.require(Capability::ResetPassword)?;
        let _guard = self.begin(RequestKind::ResetPin)?;
        self.require_present()?;
        self.require_pending_kind(puk_kind)?;
        let pin_kind = puk_kind
            .puk_for()
            .ok_or(ValidationError::NotAPassword(puk_kind))?;
        puk_kind.check(puk)?;
        pin_kind.check(new_pin)?;

        let epoch = self.epoch();
        let result = self.inner.driver.reset_password(puk, new_pin).await;
        debug!(%puk_kind, ok = result.is_ok(), "PUK entered");

        self.check_pin_state_at(epoch).await;
        Ok(result?)
    }

    /// Change a PIN-class password
    pub async fn change_pin(&self, kind: PasswordKind, old: &str, new: &str) -> Result<()> {
        self.require(Capability::ChangePassword)?;
        let _guard = self.begin(RequestKind::ChangePin)?;
        self.require_present()?;
        if !kind.is_pin() {
            return Err(ValidationError::NotAPassword(kind).into());
        }
        kind.check(old)?;
        kind.check(new)?;

        if old == new {
            return Ok(());
        }

        let epoch = self.epoch();
        let result = self.inner.driver.change_password(kind, old, new).await;
        debug!(%kind, ok = result.is_ok(), "Password changed");

        self.refresh_retries_at(epoch).await;
        Ok(result?)
    }

    /// Enable a password
    pub async fn lock_pin(&self, kind: PasswordKind, pin: &str) -> Result<()> {
        self.set_pin_lock(RequestKind::LockPin, kind, true, pin).await
    }

    /// Disable a password
    pub async fn unlock_pin(&self, kind: PasswordKind, pin: &str) -> Result<()> {
        self.set_pin_lock(RequestKind::UnlockPin, kind, false, pin).await
    }

    async fn set_pin_lock(
        &self,
        request: RequestKind,
        kind: PasswordKind,
        enable: bool,
        pin: &str,
    ) -> Result<()> {
        self.require(Capability::Lock)?;
        let _guard = self.begin(request)?;
        self.require_present()?;
        if !kind.is_pin() || kind == PasswordKind::Pin2 {
            return Err(ValidationError::NotAPassword(kind).into());
        }
        kind.check(pin)?;

        let epoch = self.epoch();
        let result = self.inner.driver.lock(kind, enable, pin).await;

        if result.is_ok() && self.is_current(epoch) {
            info!(%kind, enable, "Password lock changed");
            let locked = {
                let mut data = self.data_mut();
                if enable {
                    data.locked_pins.insert(kind);
                } else {
                    data.locked_pins.remove(&kind);
                }
                data.locked_pins()
            };
            self.emit(Property::LockedPins(locked));
        }

        self.refresh_retries_at(epoch).await;
        Ok(result?)
    }

    fn require_pending_kind(&self, kind: PasswordKind) -> Result<()> {
        if kind == PasswordKind::None || kind != self.data().pin_type {
            return Err(SimError::InvalidFormat(ValidationError::NotAPassword(kind)));
        }
        Ok(())
    }
}
