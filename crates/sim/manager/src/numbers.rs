//! Subscriber numbers and the service dialling directory

use std::collections::HashSet;

use futures::future::join_all;
use nexum_sim_core::{AdnRecord, FileId, FileStructure, PhoneNumber, adn};
use tracing::{debug, error, trace, warn};

use crate::bringup::Step;
use crate::error::{Result, SimError, TransportError};
use crate::event::{Property, ServiceNumber};
use crate::files::FileData;
use crate::pending::RequestKind;
use crate::sim::Sim;
use crate::state::RecordLayout;

impl Sim {
    /// Overwrite the subscriber numbers stored on the card
    ///
    /// Every record of EFmsisdn is written: the given numbers in order, then
    /// empty records for the remaining slots. All writes are issued even if
    /// one fails, and nothing is rolled back. The cached list is re-read from
    /// the card afterwards.
    pub async fn set_subscriber_numbers(&self, numbers: &[String]) -> Result<()> {
        let _guard = self.begin(RequestKind::SetSubscriberNumbers)?;
        self.require_present()?;

        let layout = self
            .data()
            .msisdn_layout
            .filter(|layout| layout.records > 0)
            .ok_or(SimError::Unavailable)?;

        let numbers = numbers
            .iter()
            .map(|n| n.parse::<PhoneNumber>())
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|_| SimError::InvalidArgs("invalid subscriber number"))?;
        if numbers.len() > layout.records {
            return Err(SimError::InvalidArgs("more numbers than the card can store"));
        }

        let records = (0..layout.records)
            .map(|slot| match numbers.get(slot) {
                Some(number) => AdnRecord::build(number, None, layout.record_length),
                None => Ok(AdnRecord::empty(layout.record_length)),
            })
            .collect::<std::result::Result<Vec<_>, _>>()?;

        debug!(numbers = numbers.len(), slots = records.len(), "Writing subscriber numbers");
        let epoch = self.epoch();
        let files = self.inner.files.clone();
        let results = join_all(records.iter().enumerate().map(|(slot, record)| {
            files.write(FileId::MSISDN, FileStructure::Fixed, slot + 1, record)
        }))
        .await;

        self.run_step_at(Step::OwnNumbers, epoch).await;

        match results.into_iter().find_map(|r| r.err()) {
            Some(e) => {
                warn!(error = %e, "Writing subscriber numbers failed");
                Err(e.into())
            }
            None => Ok(()),
        }
    }

    pub(crate) fn on_own_numbers(&self, result: std::result::Result<FileData, TransportError>) {
        let numbers = match result {
            Ok(file) if file.record_length < adn::FIXED_LENGTH => {
                debug!(record_length = file.record_length, "EFmsisdn records too short");
                return;
            }
            Ok(file) => {
                self.data_mut().msisdn_layout = Some(RecordLayout {
                    record_length: file.record_length,
                    records: file.record_count(),
                });
                file.iter_records()
                    .filter_map(|(index, record)| match AdnRecord::parse(record) {
                        Ok(record) => Some(record.number),
                        Err(e) => {
                            trace!(index, error = %e, "Skipping subscriber number record");
                            None
                        }
                    })
                    .collect()
            }
            Err(_) => Vec::new(),
        };

        {
            let mut data = self.data_mut();
            if data.own_numbers == numbers {
                return;
            }
            data.own_numbers = numbers.clone();
        }
        self.emit(Property::SubscriberNumbers(numbers));
    }

    pub(crate) fn on_service_numbers(&self, result: std::result::Result<FileData, TransportError>) {
        let Ok(file) = result else {
            return;
        };
        if file.record_length < adn::FIXED_LENGTH {
            debug!(record_length = file.record_length, "EFsdn records too short");
            return;
        }

        let mut seen = HashSet::new();
        let mut service_numbers = Vec::new();
        for (index, record) in file.iter_records() {
            let Ok(AdnRecord { alpha, number }) = AdnRecord::parse(record) else {
                continue;
            };
            let name = if alpha.is_empty() {
                number.to_string()
            } else {
                alpha
            };
            if !seen.insert(name.clone()) {
                error!(index, %name, "Duplicate service number identifier, dropping record");
                continue;
            }
            service_numbers.push(ServiceNumber { name, number });
        }

        if service_numbers.is_empty() {
            return;
        }

        debug!(count = service_numbers.len(), "Read service dialling numbers");
        {
            let mut data = self.data_mut();
            data.service_numbers = service_numbers.clone();
            data.sdn_ready = true;
        }
        self.emit(Property::ServiceNumbers(service_numbers));
    }

    /// Re-read EFmsisdn whenever the file client reports a change
    pub(crate) fn watch_subscriber_numbers(&self) {
        let sim = self.clone();
        let epoch = self.epoch();
        let mut watch = self.inner.files.watch(FileId::MSISDN);
        let mut epochs = self.epochs();
        tokio::task::spawn_local(async move {
            loop {
                tokio::select! {
                    changed = watch.changed() => {
                        if !changed || !sim.is_current(epoch) {
                            break;
                        }
                        debug!("EFmsisdn changed, refreshing subscriber numbers");
                        sim.run_step_at(Step::OwnNumbers, epoch).await;
                    }
                    // Removal and detach both move the epoch on
                    _ = epochs.wait_for(|current| *current != epoch) => break,
                }
            }
            trace!(epoch, "Subscriber number watch finished");
        });
    }
}
