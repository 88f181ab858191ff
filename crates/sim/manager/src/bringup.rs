//! Card bring-up state machine
//!
//! Every read of the sequence is a [`Step`]. A step is performed as an async
//! task and yields an [`Outcome`]; outcomes pass a single epoch checkpoint and
//! are then fed to `Sim::advance`, which updates card data and decides
//! which steps come next. Steps without a data dependency are spawned
//! together and complete in any order.
//!
//! ```text
//! insert ──┬─ ICCID
//!          └─ EFli + EFpl ── languages ── PIN state ──(none)──┬─ EFphase ── EFsst/EFust ── ... ── IMSI ── Ready
//!                                                             ├─ EFad
//!                                                             └─ CPHS information
//! ```

use nexum_sim_core::files as ef;
use nexum_sim_core::{
    CphsInformation, EnabledService, EnabledServiceTable, FileId, FileStructure, PasswordKind,
    Phase, SimService, SimServiceTable, UsimService, UsimServiceTable, language,
};
use tracing::{debug, error, info, trace, warn};

use crate::driver::{Capability, RetryTable};
use crate::error::TransportError;
use crate::event::{Property, SimState};
use crate::files::{FileData, FileInfo};
use crate::sim::Sim;

type FileResult = Result<FileData, TransportError>;

/// One asynchronous operation of the bring-up sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Step {
    Iccid,
    Languages,
    PinCheck,
    Retries,
    Phase,
    AdministrativeData,
    CphsInformation,
    Sst,
    Ust,
    Est,
    AdnStatus,
    BdnStatus,
    Imsi,
    OwnNumbers,
    ServiceNumbers,
    ImageDescriptors,
}

/// Completion of a [`Step`]
#[derive(Debug)]
pub(crate) enum Outcome {
    Iccid(FileResult),
    Languages { li: FileResult, pl: FileResult },
    PinCheck(Result<PasswordKind, TransportError>),
    Retries(Result<RetryTable, TransportError>),
    Phase(FileResult),
    AdministrativeData(FileResult),
    CphsInformation(FileResult),
    Sst(FileResult),
    Ust(FileResult),
    Est(FileResult),
    AdnStatus(Result<FileInfo, TransportError>),
    BdnStatus(Result<FileInfo, TransportError>),
    Imsi(Result<String, TransportError>),
    OwnNumbers(FileResult),
    ServiceNumbers(FileResult),
    ImageDescriptors(FileResult),
}

impl Sim {
    /// Run a step in the background
    pub(crate) fn spawn_step(&self, step: Step) {
        let sim = self.clone();
        let epoch = self.epoch();
        tokio::task::spawn_local(async move {
            sim.run_step_at(step, epoch).await;
        });
    }

    /// Run a step; its outcome is dropped unless `epoch` is still current
    pub(crate) async fn run_step_at(&self, step: Step, epoch: u64) {
        if !self.is_current(epoch) {
            return;
        }
        let outcome = self.perform(step).await;
        if !self.is_current(epoch) {
            trace!(?step, epoch, "Dropping stale completion");
            return;
        }
        self.advance(outcome);
    }

    async fn perform(&self, step: Step) -> Outcome {
        use FileStructure::{Fixed, Transparent};

        let files = &self.inner.files;
        let driver = &self.inner.driver;

        match step {
            Step::Iccid => Outcome::Iccid(files.read(FileId::ICCID, Transparent).await),
            Step::Languages => {
                let (li, pl) = tokio::join!(
                    files.read(FileId::LI, Transparent),
                    files.read(FileId::PL, Transparent)
                );
                Outcome::Languages { li, pl }
            }
            Step::PinCheck => Outcome::PinCheck(driver.query_password_state().await),
            Step::Retries => Outcome::Retries(driver.query_retries().await),
            Step::Phase => Outcome::Phase(files.read(FileId::PHASE, Transparent).await),
            Step::AdministrativeData => {
                Outcome::AdministrativeData(files.read(FileId::AD, Transparent).await)
            }
            Step::CphsInformation => {
                Outcome::CphsInformation(files.read(FileId::CPHS_INFO, Transparent).await)
            }
            Step::Sst => Outcome::Sst(files.read(FileId::SST, Transparent).await),
            Step::Ust => Outcome::Ust(files.read(FileId::UST, Transparent).await),
            Step::Est => Outcome::Est(files.read(FileId::EST, Transparent).await),
            Step::AdnStatus => Outcome::AdnStatus(files.read_info(FileId::ADN, Fixed).await),
            Step::BdnStatus => Outcome::BdnStatus(files.read_info(FileId::BDN, Fixed).await),
            Step::Imsi => Outcome::Imsi(driver.read_imsi().await),
            Step::OwnNumbers => Outcome::OwnNumbers(files.read(FileId::MSISDN, Fixed).await),
            Step::ServiceNumbers => Outcome::ServiceNumbers(files.read(FileId::SDN, Fixed).await),
            Step::ImageDescriptors => {
                Outcome::ImageDescriptors(files.read(FileId::IMG, Fixed).await)
            }
        }
    }

    /// Apply a completed step and issue whatever depends on it
    pub(crate) fn advance(&self, outcome: Outcome) {
        match outcome {
            Outcome::Iccid(result) => self.on_iccid(result),
            Outcome::Languages { li, pl } => self.on_languages(li, pl),
            Outcome::PinCheck(result) => self.on_pin_state(result),
            Outcome::Retries(result) => self.on_retries(result),
            Outcome::Phase(result) => self.on_phase(result),
            Outcome::AdministrativeData(result) => self.on_administrative_data(result),
            Outcome::CphsInformation(result) => self.on_cphs_information(result),
            Outcome::Sst(result) => self.on_sst(result),
            Outcome::Ust(result) => self.on_ust(result),
            Outcome::Est(result) => self.on_est(result),
            Outcome::AdnStatus(result) => self.on_adn_status(result),
            Outcome::BdnStatus(result) => self.on_bdn_status(result),
            Outcome::Imsi(result) => self.on_imsi(result),
            Outcome::OwnNumbers(result) => self.on_own_numbers(result),
            Outcome::ServiceNumbers(result) => self.on_service_numbers(result),
            Outcome::ImageDescriptors(result) => self.on_image_descriptors(result),
        }
    }

    fn on_iccid(&self, result: FileResult) {
        let file = match result {
            Ok(file) => file,
            Err(e) => {
                warn!(error = %e, "Unable to read ICCID");
                return;
            }
        };
        let iccid = match ef::parse_iccid(&file.data) {
            Ok(iccid) => iccid,
            Err(e) => {
                warn!(error = %e, data = ?hex::encode(&file.data), "Malformed ICCID");
                return;
            }
        };

        debug!(%iccid, "Read ICCID");
        self.data_mut().iccid = Some(iccid.clone());
        self.emit(Property::CardIdentifier(iccid));
    }

    fn on_languages(&self, li: FileResult, pl: FileResult) {
        let li = li.ok().map(|file| file.data);
        let pl = pl.ok().map(|file| file.data);
        let languages = language::resolve(li.as_deref(), pl.as_deref());
        debug!(?languages, "Resolved preferred languages");

        if !languages.is_empty() {
            self.data_mut().languages = languages.clone();
            self.emit(Property::PreferredLanguages(languages));
        }

        self.check_pin_state();
    }

    /// Ask the driver which password the card requires, in the background
    pub(crate) fn check_pin_state(&self) {
        if self.has_capability(Capability::QueryPasswordState) {
            self.spawn_step(Step::PinCheck);
        } else {
            self.after_pin();
        }
    }

    /// Ask the driver which password the card requires and apply the answer
    pub(crate) async fn check_pin_state_at(&self, epoch: u64) {
        if self.has_capability(Capability::QueryPasswordState) {
            self.run_step_at(Step::PinCheck, epoch).await;
        } else if self.is_current(epoch) {
            self.after_pin();
        }
    }

    fn on_pin_state(&self, result: Result<PasswordKind, TransportError>) {
        let kind = match result {
            Ok(kind) => kind,
            Err(e) => {
                error!(error = %e, "Querying PIN authentication state failed");
                return;
            }
        };

        let changed = {
            let mut data = self.data_mut();
            if data.pin_type == kind {
                None
            } else {
                data.pin_type = kind;
                if kind != PasswordKind::None {
                    data.locked_pins.insert(kind.locked_kind());
                }
                Some(data.locked_pins())
            }
        };

        if let Some(locked) = changed {
            debug!(%kind, "Required password changed");
            if kind != PasswordKind::None {
                self.emit(Property::LockedPins(locked));
            }
            self.emit(Property::PinRequired(kind));
        }

        self.refresh_retries();

        if kind == PasswordKind::None {
            self.after_pin();
        }
    }

    /// Query retry counters in the background
    pub(crate) fn refresh_retries(&self) {
        if self.has_capability(Capability::QueryRetries) {
            self.spawn_step(Step::Retries);
        }
    }

    /// Query retry counters and apply them before returning
    pub(crate) async fn refresh_retries_at(&self, epoch: u64) {
        if self.has_capability(Capability::QueryRetries) {
            self.run_step_at(Step::Retries, epoch).await;
        }
    }

    fn on_retries(&self, result: Result<RetryTable, TransportError>) {
        let retries = match result {
            Ok(retries) => retries,
            Err(e) => {
                debug!(error = %e, "Querying remaining PIN retries failed");
                return;
            }
        };

        {
            let mut data = self.data_mut();
            if data.retries == retries {
                return;
            }
            data.retries = retries.clone();
        }
        self.emit(Property::Retries(retries));
    }

    fn after_pin(&self) {
        if self.state() != SimState::Inserted {
            return;
        }
        {
            let mut data = self.data_mut();
            if data.after_pin_started {
                return;
            }
            data.after_pin_started = true;
        }

        self.spawn_step(Step::Phase);
        self.spawn_step(Step::AdministrativeData);
        if self.inner.config.read_cphs_information {
            self.spawn_step(Step::CphsInformation);
        }
    }

    fn on_phase(&self, result: FileResult) {
        let phase = result.ok().and_then(|file| Phase::parse(&file.data));
        match phase {
            Some(phase) => {
                debug!(%phase, "SIM phase");
                self.data_mut().phase = phase;
                self.spawn_step(Step::Sst);
            }
            None => {
                debug!("EFphase absent or not a SIM phase, assuming USIM");
                self.data_mut().phase = Phase::Phase3G;
                self.spawn_step(Step::Ust);
            }
        }
    }

    fn on_administrative_data(&self, result: FileResult) {
        let Ok(file) = result else {
            return;
        };
        let Some(mnc_length) = ef::parse_mnc_length(&file.data) else {
            debug!(data = ?hex::encode(&file.data), "EFad carries no usable MNC length");
            return;
        };

        self.data_mut().mnc_length = Some(mnc_length);
        self.publish_mcc_mnc();
    }

    fn on_cphs_information(&self, result: FileResult) {
        let cphs = result
            .ok()
            .and_then(|file| CphsInformation::parse(&file.data).ok());
        if let Some(cphs) = &cphs {
            debug!(phase = %cphs.phase, "CPHS information");
        }
        self.data_mut().cphs = cphs;
    }

    fn publish_mcc_mnc(&self) {
        let derived = self.data_mut().derive_mcc_mnc();
        if let Some((mcc, mnc)) = derived {
            debug!(%mcc, %mnc, "Derived network codes");
            self.emit(Property::MobileCountryCode(mcc));
            self.emit(Property::MobileNetworkCode(mnc));
        }
    }

    fn on_sst(&self, result: FileResult) {
        let table = match result {
            Ok(file) if file.len() >= 2 => SimServiceTable::from(file.data),
            Ok(_) => {
                error!("EFsst shall contain at least two bytes");
                self.retrieve_imsi();
                return;
            }
            Err(_) => {
                self.retrieve_imsi();
                return;
            }
        };

        let fdn = table.is_active(SimService::Fdn);
        self.data_mut().sst = Some(table);

        if fdn {
            self.spawn_step(Step::AdnStatus);
        } else {
            self.check_bdn_status();
        }
    }

    fn check_bdn_status(&self) {
        let bdn = self
            .data()
            .sst
            .as_ref()
            .is_some_and(|sst| sst.is_active(SimService::Bdn));

        if bdn {
            self.spawn_step(Step::BdnStatus);
        } else {
            self.finish_restriction_checks();
        }
    }

    fn on_adn_status(&self, result: Result<FileInfo, TransportError>) {
        if let Ok(info) = result {
            if !info.status.is_valid() {
                self.enable_fixed_dialing();
            }
        }
        self.check_bdn_status();
    }

    fn on_bdn_status(&self, result: Result<FileInfo, TransportError>) {
        if let Ok(info) = result {
            if info.status.is_valid() {
                self.enable_barred_dialing();
            }
        }
        self.finish_restriction_checks();
    }

    fn on_ust(&self, result: FileResult) {
        let table = match result {
            Ok(file) if !file.is_empty() => UsimServiceTable::from(file.data),
            Ok(_) => {
                error!("EFust shall contain at least one byte");
                self.retrieve_imsi();
                return;
            }
            Err(_) => {
                self.retrieve_imsi();
                return;
            }
        };

        let needs_est = [UsimService::Est, UsimService::Fdn, UsimService::Bdn]
            .into_iter()
            .any(|service| table.is_available(service));
        self.data_mut().ust = Some(table);

        if needs_est {
            self.spawn_step(Step::Est);
        } else {
            self.retrieve_imsi();
        }
    }

    fn on_est(&self, result: FileResult) {
        match result {
            Ok(file) if !file.is_empty() => {
                let est = EnabledServiceTable::from(file.data);
                let (fdn, bdn) = {
                    let data = self.data();
                    let available = |s: UsimService| {
                        data.ust.as_ref().is_some_and(|ust| ust.is_available(s))
                    };
                    (
                        available(UsimService::Fdn) && est.is_active(EnabledService::Fdn),
                        available(UsimService::Bdn) && est.is_active(EnabledService::Bdn),
                    )
                };
                if fdn {
                    self.enable_fixed_dialing();
                }
                if bdn {
                    self.enable_barred_dialing();
                }
            }
            Ok(_) => error!("EFest shall contain at least one byte"),
            Err(_) => {}
        }

        self.finish_restriction_checks();
    }

    fn enable_fixed_dialing(&self) {
        let mut data = self.data_mut();
        if data.fixed_dialing {
            return;
        }
        data.fixed_dialing = true;
        drop(data);
        info!("Fixed dialing is enabled");
        self.emit(Property::FixedDialing(true));
    }

    fn enable_barred_dialing(&self) {
        let mut data = self.data_mut();
        if data.barred_dialing {
            return;
        }
        data.barred_dialing = true;
        drop(data);
        info!("Barred dialing is enabled");
        self.emit(Property::BarredDialing(true));
    }

    fn finish_restriction_checks(&self) {
        let restricted = {
            let data = self.data();
            data.fixed_dialing || data.barred_dialing
        };
        if restricted {
            info!("Dialing restrictions in force, halting initialization");
        } else {
            self.retrieve_imsi();
        }
    }

    fn retrieve_imsi(&self) {
        if self.has_capability(Capability::ReadImsi) {
            self.spawn_step(Step::Imsi);
        } else {
            error!("IMSI retrieval not implemented, only emergency calls will be available");
        }
    }

    fn on_imsi(&self, result: Result<String, TransportError>) {
        let imsi = match result {
            Ok(imsi) => imsi,
            Err(e) => {
                error!(error = %e, "Unable to read IMSI, emergency calls only");
                return;
            }
        };

        debug!("Read IMSI");
        self.data_mut().imsi = Some(imsi.clone());
        self.emit(Property::SubscriberIdentity(imsi));
        self.publish_mcc_mnc();
        self.set_state(SimState::Ready);
    }

    /// Reads issued once the card is ready
    pub(crate) fn on_ready(&self) {
        self.spawn_step(Step::OwnNumbers);
        self.spawn_step(Step::ServiceNumbers);
        self.spawn_step(Step::ImageDescriptors);
        if self.inner.config.watch_subscriber_numbers {
            self.watch_subscriber_numbers();
        }
    }
}
