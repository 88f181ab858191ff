//! SIM session handle

use std::cell::{Cell, Ref, RefCell, RefMut};
use std::fmt;
use std::rc::Rc;

use nexum_sim_core::{CphsPhase, Phase, SimService, UsimService};
use tokio::sync::{broadcast, watch};
use tracing::{debug, info, trace};

use crate::bringup::Step;
use crate::config::SimConfig;
use crate::driver::{Capability, SimDriver};
use crate::error::{Result, SimError};
use crate::event::{Property, SimEvent, SimProperties, SimState};
use crate::files::SimFiles;
use crate::pending::{PendingGuard, RequestKind};
use crate::state::CardData;

pub(crate) struct Inner {
    pub(crate) driver: Rc<dyn SimDriver>,
    pub(crate) files: Rc<dyn SimFiles>,
    pub(crate) config: SimConfig,
    state: Cell<SimState>,
    epoch: watch::Sender<u64>,
    detached: Cell<bool>,
    data: RefCell<CardData>,
    pending: Cell<Option<RequestKind>>,
    events: broadcast::Sender<SimEvent>,
}

/// A SIM session for one modem
///
/// The handle is cheap to clone and `!Send`. Bring-up and background reads run
/// as [`tokio::task::spawn_local`] tasks, so [`Sim::inserted_notify`] must be
/// called from within a [`tokio::task::LocalSet`].
#[derive(Clone)]
pub struct Sim {
    pub(crate) inner: Rc<Inner>,
}

impl fmt::Debug for Sim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sim")
            .field("driver", &self.inner.driver.name())
            .field("state", &self.inner.state.get())
            .field("epoch", &self.epoch())
            .field("pending", &self.inner.pending.get())
            .finish_non_exhaustive()
    }
}

impl Sim {
    /// Create a session for a modem, with no card present
    pub fn create(driver: Rc<dyn SimDriver>, files: Rc<dyn SimFiles>, config: SimConfig) -> Self {
        let (events, _) = broadcast::channel(config.event_capacity.max(1));
        debug!(driver = driver.name(), capabilities = %driver.capabilities(), "Creating SIM session");
        Self {
            inner: Rc::new(Inner {
                driver,
                files,
                config,
                state: Cell::new(SimState::NotPresent),
                epoch: watch::Sender::new(0),
                detached: Cell::new(false),
                data: RefCell::new(CardData::default()),
                pending: Cell::new(None),
                events,
            }),
        }
    }

    /// Current session state
    pub fn state(&self) -> SimState {
        self.inner.state.get()
    }

    /// Subscribe to state and property changes
    pub fn subscribe(&self) -> broadcast::Receiver<SimEvent> {
        self.inner.events.subscribe()
    }

    /// The external request currently in flight, if any
    pub fn pending_request(&self) -> Option<RequestKind> {
        self.inner.pending.get()
    }

    /// Report card insertion or removal
    ///
    /// Insertion starts bring-up; removal clears everything read from the
    /// card. Reports that do not change presence are ignored.
    pub fn inserted_notify(&self, inserted: bool) {
        if self.inner.detached.get() {
            trace!(inserted, "Ignoring presence change on detached session");
            return;
        }

        match (self.state(), inserted) {
            (SimState::NotPresent, true) => {
                info!("SIM card inserted");
                self.bump_epoch();
                self.emit(Property::Present(true));
                self.set_state(SimState::Inserted);
                self.start_bringup();
            }
            (SimState::Inserted | SimState::Ready, false) => {
                info!("SIM card removed");
                self.bump_epoch();
                *self.data_mut() = CardData::default();
                self.emit(Property::Present(false));
                self.set_state(SimState::NotPresent);
            }
            (state, inserted) => {
                trace!(%state, inserted, "Ignoring redundant presence change");
            }
        }
    }

    /// Tear the session down when the modem goes away
    ///
    /// Completions still in flight are discarded and further presence
    /// reports are ignored.
    pub fn detach(&self) {
        debug!("Detaching SIM session");
        self.inner.detached.set(true);
        self.bump_epoch();
        *self.data_mut() = CardData::default();
        self.inner.state.set(SimState::NotPresent);
    }

    /// Snapshot of the exposed properties
    pub fn properties(&self) -> SimProperties {
        let data = self.data();
        SimProperties {
            present: self.state() != SimState::NotPresent,
            card_identifier: data.iccid.clone(),
            subscriber_identity: data.imsi.clone(),
            mobile_country_code: data.mcc.clone(),
            mobile_network_code: data.mnc.clone(),
            fixed_dialing: data.fixed_dialing,
            barred_dialing: data.barred_dialing,
            subscriber_numbers: data.own_numbers.clone(),
            service_numbers: if data.sdn_ready {
                data.service_numbers.clone()
            } else {
                Vec::new()
            },
            preferred_languages: data.languages.clone(),
            pin_required: data.pin_type,
            locked_pins: data.locked_pins(),
            retries: data.retries.clone(),
        }
    }

    /// ICCID, once read
    pub fn iccid(&self) -> Option<String> {
        self.data().iccid.clone()
    }

    /// IMSI, once read
    pub fn imsi(&self) -> Option<String> {
        self.data().imsi.clone()
    }

    /// Mobile country code, once derivable
    pub fn mcc(&self) -> Option<String> {
        self.data().mcc.clone()
    }

    /// Mobile network code, once derivable
    pub fn mnc(&self) -> Option<String> {
        self.data().mnc.clone()
    }

    /// Card phase
    pub fn phase(&self) -> Phase {
        self.data().phase
    }

    /// CPHS phase
    pub fn cphs_phase(&self) -> CphsPhase {
        self.data()
            .cphs
            .as_ref()
            .map_or(CphsPhase::None, |cphs| cphs.phase)
    }

    /// CPHS service table, if the card has CPHS information
    pub fn cphs_service_table(&self) -> Option<[u8; 2]> {
        self.data().cphs.as_ref().map(|cphs| cphs.service_table)
    }

    /// Whether a service is offered by the card
    ///
    /// USIMs are asked through their service table; SIMs must have the
    /// service activated.
    pub fn service_available(&self, usim: UsimService, sim: SimService) -> bool {
        let data = self.data();
        if let Some(ust) = &data.ust {
            ust.is_available(usim)
        } else if let Some(sst) = &data.sst {
            sst.is_active(sim)
        } else {
            false
        }
    }

    pub(crate) fn data(&self) -> Ref<'_, CardData> {
        self.inner.data.borrow()
    }

    pub(crate) fn data_mut(&self) -> RefMut<'_, CardData> {
        self.inner.data.borrow_mut()
    }

    pub(crate) fn epoch(&self) -> u64 {
        *self.inner.epoch.borrow()
    }

    /// Follow epoch changes, for tasks that must end with their card
    pub(crate) fn epochs(&self) -> watch::Receiver<u64> {
        self.inner.epoch.subscribe()
    }

    /// Whether work issued at `epoch` may still touch session state
    pub(crate) fn is_current(&self, epoch: u64) -> bool {
        !self.inner.detached.get() && self.epoch() == epoch
    }

    fn bump_epoch(&self) {
        self.inner
            .epoch
            .send_modify(|epoch| *epoch = epoch.wrapping_add(1));
    }

    pub(crate) fn set_state(&self, state: SimState) {
        if self.inner.state.replace(state) == state {
            return;
        }
        debug!(%state, "SIM state changed");
        self.send(SimEvent::StateChanged(state));
        if state == SimState::Ready {
            self.on_ready();
        }
    }

    pub(crate) fn emit(&self, property: Property) {
        self.send(SimEvent::PropertyChanged(property));
    }

    fn send(&self, event: SimEvent) {
        trace!(?event, "Emitting SIM event");
        // No subscribers is fine
        let _ = self.inner.events.send(event);
    }

    pub(crate) fn has_capability(&self, capability: Capability) -> bool {
        self.inner.driver.capabilities().has_capability(capability)
    }

    pub(crate) fn require(&self, capability: Capability) -> Result<()> {
        if self.has_capability(capability) {
            Ok(())
        } else {
            Err(SimError::NotImplemented)
        }
    }

    pub(crate) fn require_present(&self) -> Result<()> {
        if self.state() == SimState::NotPresent {
            Err(SimError::NotPresent)
        } else {
            Ok(())
        }
    }

    pub(crate) fn begin(&self, kind: RequestKind) -> Result<PendingGuard<'_>> {
        PendingGuard::acquire(&self.inner.pending, kind)
    }

    /// Issue the reads that follow card insertion
    fn start_bringup(&self) {
        self.spawn_step(Step::Iccid);
        self.spawn_step(Step::Languages);
    }
}
