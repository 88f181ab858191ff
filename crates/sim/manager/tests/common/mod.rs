//! Shared fixtures: an in-memory card and a scripted driver

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::rc::Rc;

use async_trait::async_trait;
use bytes::Bytes;
use hex_literal::hex;
use nexum_sim::prelude::*;
use nexum_sim::sim_core::AdnRecord;
use nexum_sim::sim_core::files::FileStatus;
use tokio::sync::{Notify, mpsc};

pub(crate) const IMSI: &str = "244051234567890";
pub(crate) const ICCID: &str = "89014103211118510720";
pub(crate) const MSISDN_RECORD_LENGTH: usize = 18;

/// Install a test subscriber once; honours `RUST_LOG`
pub(crate) fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Run a future on a `LocalSet` so sessions can spawn their tasks
pub(crate) async fn run_local<F: Future>(future: F) -> F::Output {
    init_tracing();
    tokio::task::LocalSet::new().run_until(future).await
}

/// Let spawned tasks run until nothing is left to do
pub(crate) async fn settle() {
    for _ in 0..64 {
        tokio::task::yield_now().await;
    }
}

/// Drain every event received so far
pub(crate) fn drain(events: &mut tokio::sync::broadcast::Receiver<SimEvent>) -> Vec<SimEvent> {
    let mut received = Vec::new();
    while let Ok(event) = events.try_recv() {
        received.push(event);
    }
    received
}

/// Property changes among `events`
pub(crate) fn properties(events: &[SimEvent]) -> Vec<Property> {
    events
        .iter()
        .filter_map(|event| match event {
            SimEvent::PropertyChanged(property) => Some(property.clone()),
            SimEvent::StateChanged(_) => None,
        })
        .collect()
}

/// Encode subscriber number records for a file of `slots` records
pub(crate) fn msisdn_records(numbers: &[&str], slots: usize) -> Bytes {
    let mut data = Vec::new();
    for slot in 0..slots {
        match numbers.get(slot) {
            Some(n) => data.extend(
                AdnRecord::build(&n.parse().unwrap(), None, MSISDN_RECORD_LENGTH).unwrap(),
            ),
            None => data.extend(AdnRecord::empty(MSISDN_RECORD_LENGTH)),
        }
    }
    Bytes::from(data)
}

#[derive(Debug, Default)]
struct CardState {
    files: HashMap<FileId, FileData>,
    info: HashMap<FileId, FileInfo>,
    gates: HashMap<FileId, Rc<Notify>>,
    failing_records: HashSet<usize>,
    unplugged: bool,
    watchers: Vec<(FileId, mpsc::UnboundedSender<()>)>,
    reads: Vec<FileId>,
    byte_reads: Vec<(FileId, u16, usize)>,
    writes: Vec<(FileId, usize, Vec<u8>)>,
}

/// In-memory elementary files
#[derive(Debug, Default)]
pub(crate) struct MockCard {
    state: RefCell<CardState>,
}

impl MockCard {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Store a transparent file
    pub(crate) fn set_transparent(&self, id: FileId, data: &[u8]) {
        self.state
            .borrow_mut()
            .files
            .insert(id, FileData::transparent(Bytes::copy_from_slice(data)));
    }

    /// Store a record-based file
    pub(crate) fn set_records(&self, id: FileId, data: impl Into<Bytes>, record_length: usize) {
        self.state
            .borrow_mut()
            .files
            .insert(id, FileData::records(data, record_length));
    }

    pub(crate) fn remove(&self, id: FileId) {
        self.state.borrow_mut().files.remove(&id);
    }

    pub(crate) fn set_status(&self, id: FileId, status: u8) {
        self.state.borrow_mut().info.insert(
            id,
            FileInfo {
                status: FileStatus(status),
                ..Default::default()
            },
        );
    }

    /// Hold reads of `id` until the returned handle is notified
    pub(crate) fn gate(&self, id: FileId) -> Rc<Notify> {
        let notify = Rc::new(Notify::new());
        self.state.borrow_mut().gates.insert(id, notify.clone());
        notify
    }

    /// Make writes to record `record` fail
    pub(crate) fn fail_record(&self, record: usize) {
        self.state.borrow_mut().failing_records.insert(record);
    }

    /// Make every later read and write fail as if the reader went away
    pub(crate) fn unplug(&self) {
        self.state.borrow_mut().unplugged = true;
    }

    /// Watches of `id` whose session still listens
    pub(crate) fn live_watches(&self, id: FileId) -> usize {
        self.state
            .borrow()
            .watchers
            .iter()
            .filter(|(w, sender)| *w == id && !sender.is_closed())
            .count()
    }

    /// Signal a change of `id` to every watcher
    pub(crate) fn touch(&self, id: FileId) {
        for (_, sender) in self.state.borrow().watchers.iter().filter(|(w, _)| *w == id) {
            let _ = sender.send(());
        }
    }

    pub(crate) fn reads(&self, id: FileId) -> usize {
        self.state.borrow().reads.iter().filter(|r| **r == id).count()
    }

    pub(crate) fn byte_reads(&self) -> Vec<(FileId, u16, usize)> {
        self.state.borrow().byte_reads.clone()
    }

    pub(crate) fn writes(&self) -> Vec<(FileId, usize, Vec<u8>)> {
        self.state.borrow().writes.clone()
    }
}

#[async_trait(?Send)]
impl SimFiles for MockCard {
    async fn do_read(
        &self,
        id: FileId,
        _structure: FileStructure,
    ) -> Result<FileData, TransportError> {
        let gate = {
            let mut state = self.state.borrow_mut();
            state.reads.push(id);
            if state.unplugged {
                return Err(TransportError::Connection);
            }
            state.gates.get(&id).cloned()
        };
        if let Some(gate) = gate {
            gate.notified().await;
        }
        self.state
            .borrow()
            .files
            .get(&id)
            .cloned()
            .ok_or(TransportError::NotFound(id))
    }

    async fn do_read_bytes(
        &self,
        id: FileId,
        offset: u16,
        length: usize,
    ) -> Result<Bytes, TransportError> {
        let mut state = self.state.borrow_mut();
        state.byte_reads.push((id, offset, length));
        if state.unplugged {
            return Err(TransportError::Connection);
        }
        let file = state.files.get(&id).ok_or(TransportError::NotFound(id))?;
        let start = usize::from(offset);
        file.data
            .get(start..start + length)
            .map(Bytes::copy_from_slice)
            .ok_or(TransportError::status_word_bytes(0x6B, 0x00))
    }

    async fn do_write(
        &self,
        id: FileId,
        _structure: FileStructure,
        record: usize,
        data: &[u8],
    ) -> Result<(), TransportError> {
        let mut state = self.state.borrow_mut();
        state.writes.push((id, record, data.to_vec()));
        if state.unplugged {
            return Err(TransportError::Connection);
        }
        if state.failing_records.contains(&record) {
            return Err(TransportError::status_word_bytes(0x65, 0x81));
        }

        let file = state.files.get_mut(&id).ok_or(TransportError::NotFound(id))?;
        let start = (record - 1) * file.record_length;
        let mut contents = file.data.to_vec();
        contents[start..start + data.len()].copy_from_slice(data);
        file.data = Bytes::from(contents);
        Ok(())
    }

    async fn read_info(
        &self,
        id: FileId,
        _structure: FileStructure,
    ) -> Result<FileInfo, TransportError> {
        self.state
            .borrow()
            .info
            .get(&id)
            .copied()
            .ok_or(TransportError::NotFound(id))
    }

    fn watch(&self, id: FileId) -> FileWatch {
        let (sender, watch) = FileWatch::channel();
        self.state.borrow_mut().watchers.push((id, sender));
        watch
    }
}

#[derive(Debug)]
struct DriverState {
    imsi: Option<String>,
    required: PasswordKind,
    pin: String,
    puk: String,
    retries: RetryTable,
    fail_state_query: bool,
    calls: Vec<&'static str>,
}

/// Scripted modem driver
#[derive(Debug)]
pub(crate) struct MockDriver {
    capabilities: Capabilities,
    state: RefCell<DriverState>,
}

impl MockDriver {
    pub(crate) fn new(capabilities: Capabilities) -> Self {
        Self {
            capabilities,
            state: RefCell::new(DriverState {
                imsi: Some(IMSI.to_string()),
                required: PasswordKind::None,
                pin: "1234".to_string(),
                puk: "12345678".to_string(),
                retries: RetryTable::from([(PasswordKind::Pin, 3), (PasswordKind::Puk, 10)]),
                fail_state_query: false,
                calls: Vec::new(),
            }),
        }
    }

    /// Driver with every capability
    pub(crate) fn full() -> Self {
        Self::new(Capabilities::all())
    }

    pub(crate) fn require(&self, kind: PasswordKind) {
        self.state.borrow_mut().required = kind;
    }

    pub(crate) fn set_imsi(&self, imsi: Option<&str>) {
        self.state.borrow_mut().imsi = imsi.map(str::to_string);
    }

    pub(crate) fn fail_state_query(&self) {
        self.state.borrow_mut().fail_state_query = true;
    }

    pub(crate) fn calls(&self) -> Vec<&'static str> {
        self.state.borrow().calls.clone()
    }

    pub(crate) fn count(&self, call: &str) -> usize {
        self.state.borrow().calls.iter().filter(|c| **c == call).count()
    }

    fn log(&self, call: &'static str) {
        self.state.borrow_mut().calls.push(call);
    }

    fn wrong_password(&self, kind: PasswordKind) -> TransportError {
        let mut state = self.state.borrow_mut();
        let left = state.retries.entry(kind).or_insert(0);
        *left = left.saturating_sub(1);
        if kind == PasswordKind::Pin && *left == 0 {
            state.required = PasswordKind::Puk;
        }
        TransportError::status_word_bytes(0x63, 0xC0)
    }
}

#[async_trait(?Send)]
impl SimDriver for MockDriver {
    fn name(&self) -> &str {
        "mock"
    }

    fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    async fn read_imsi(&self) -> Result<String, TransportError> {
        self.log("read_imsi");
        self.state
            .borrow()
            .imsi
            .clone()
            .ok_or_else(|| TransportError::other("IMSI not available"))
    }

    async fn query_password_state(&self) -> Result<PasswordKind, TransportError> {
        self.log("query_password_state");
        let state = self.state.borrow();
        if state.fail_state_query {
            return Err(TransportError::Transmission);
        }
        Ok(state.required)
    }

    async fn query_retries(&self) -> Result<RetryTable, TransportError> {
        self.log("query_retries");
        Ok(self.state.borrow().retries.clone())
    }

    async fn send_password(&self, password: &str) -> Result<(), TransportError> {
        self.log("send_password");
        let (required, correct) = {
            let state = self.state.borrow();
            (state.required, state.pin == password)
        };
        if !correct {
            return Err(self.wrong_password(required));
        }
        let mut state = self.state.borrow_mut();
        state.required = PasswordKind::None;
        state.retries.insert(required, 3);
        Ok(())
    }

    async fn change_password(
        &self,
        _kind: PasswordKind,
        old: &str,
        new: &str,
    ) -> Result<(), TransportError> {
        self.log("change_password");
        if self.state.borrow().pin != old {
            return Err(self.wrong_password(PasswordKind::Pin));
        }
        self.state.borrow_mut().pin = new.to_string();
        Ok(())
    }

    async fn lock(
        &self,
        kind: PasswordKind,
        _enable: bool,
        password: &str,
    ) -> Result<(), TransportError> {
        self.log("lock");
        if self.state.borrow().pin != password {
            return Err(self.wrong_password(kind));
        }
        Ok(())
    }

    async fn reset_password(&self, puk: &str, new_pin: &str) -> Result<(), TransportError> {
        self.log("reset_password");
        if self.state.borrow().puk != puk {
            return Err(self.wrong_password(PasswordKind::Puk));
        }
        let mut state = self.state.borrow_mut();
        state.pin = new_pin.to_string();
        state.required = PasswordKind::None;
        state.retries.insert(PasswordKind::Pin, 3);
        Ok(())
    }
}

/// Files common to both card types
fn base_card() -> MockCard {
    let card = MockCard::new();
    card.set_transparent(FileId::ICCID, &hex!("98101430121181157002"));
    card.set_transparent(FileId::LI, &hex!("656E 6669 FFFF"));
    card.set_transparent(FileId::PL, &hex!("6465"));
    card.set_transparent(FileId::AD, &hex!("00 0000 02"));
    card.set_records(
        FileId::MSISDN,
        msisdn_records(&["+358401234567"], 2),
        MSISDN_RECORD_LENGTH,
    );
    card
}

/// A phase 2 SIM without dialling restrictions
pub(crate) fn sim_card() -> MockCard {
    let card = base_card();
    card.set_transparent(FileId::PHASE, &hex!("02"));
    // ADN activated, FDN and BDN not allocated
    card.set_transparent(FileId::SST, &hex!("0F03"));
    card
}

/// A USIM without dialling restrictions
pub(crate) fn usim_card() -> MockCard {
    let card = base_card();
    // SDN and SMS only
    card.set_transparent(FileId::UST, &hex!("0802"));
    card
}

/// Create a session over the given collaborators
pub(crate) fn session(driver: &Rc<MockDriver>, card: &Rc<MockCard>) -> Sim {
    session_with(driver, card, SimConfig::default())
}

pub(crate) fn session_with(
    driver: &Rc<MockDriver>,
    card: &Rc<MockCard>,
    config: SimConfig,
) -> Sim {
    Sim::create(driver.clone(), card.clone(), config)
}
