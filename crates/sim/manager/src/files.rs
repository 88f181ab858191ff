//! Elementary file client
//!
//! The session never talks to the card directly. It reads and writes
//! elementary files through a [`SimFiles`] implementation, which owns caching,
//! record iteration and change notification.

use std::fmt;

use async_trait::async_trait;
use bytes::Bytes;
use nexum_sim_core::files::FileStatus;
use nexum_sim_core::{FileId, FileStructure};
use tokio::sync::mpsc;
use tracing::{debug, trace};

use crate::error::TransportError;

/// Contents of an elementary file
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FileData {
    /// Raw file contents, all records concatenated
    pub data: Bytes,
    /// Record length; equals the data length for transparent files
    pub record_length: usize,
}

impl FileData {
    /// Contents of a transparent file
    pub fn transparent(data: impl Into<Bytes>) -> Self {
        let data = data.into();
        let record_length = data.len();
        Self {
            data,
            record_length,
        }
    }

    /// Contents of a record-based file
    pub fn records(data: impl Into<Bytes>, record_length: usize) -> Self {
        Self {
            data: data.into(),
            record_length,
        }
    }

    /// Number of complete records
    pub fn record_count(&self) -> usize {
        self.data.len().checked_div(self.record_length).unwrap_or(0)
    }

    /// Iterate over the records, numbered from 1
    pub fn iter_records(&self) -> impl Iterator<Item = (usize, &[u8])> {
        self.data
            .chunks_exact(self.record_length.max(1))
            .enumerate()
            .map(|(i, record)| (i + 1, record))
    }

    /// Length of the contents
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the file is empty
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Status information of an elementary file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FileInfo {
    /// File status byte
    pub status: FileStatus,
    /// Total file length
    pub total_length: usize,
    /// Record length, zero for transparent files
    pub record_length: usize,
}

/// Change notifications for one elementary file
#[derive(Debug)]
pub struct FileWatch {
    receiver: mpsc::UnboundedReceiver<()>,
}

impl FileWatch {
    /// Create a watch and the sender that signals changes to it
    pub fn channel() -> (mpsc::UnboundedSender<()>, Self) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (sender, Self { receiver })
    }

    /// A watch that never fires
    pub fn never() -> Self {
        Self::channel().1
    }

    /// Wait for the next change
    ///
    /// Returns `false` once the file client stops reporting changes.
    pub async fn changed(&mut self) -> bool {
        self.receiver.recv().await.is_some()
    }
}

/// Read/write access to elementary files
///
/// Implementors provide the `do_*` methods; the provided wrappers add tracing
/// and argument checks.
#[async_trait(?Send)]
pub trait SimFiles: fmt::Debug {
    /// Read a whole file
    async fn read(&self, id: FileId, structure: FileStructure) -> Result<FileData, TransportError> {
        trace!(file = %id, ?structure, "Reading file");
        let result = self.do_read(id, structure).await;
        match &result {
            Ok(file) => {
                trace!(file = %id, data = ?hex::encode(&file.data), record_length = file.record_length, "Read file");
            }
            Err(e) => {
                debug!(file = %id, error = ?e, "File read failed");
            }
        }
        result
    }

    /// Internal implementation of `read`
    async fn do_read(&self, id: FileId, structure: FileStructure)
    -> Result<FileData, TransportError>;

    /// Read `length` bytes of a transparent file starting at `offset`
    async fn read_bytes(
        &self,
        id: FileId,
        offset: u16,
        length: usize,
    ) -> Result<Bytes, TransportError> {
        if length == 0 {
            return Err(TransportError::InvalidLength);
        }
        trace!(file = %id, offset, length, "Reading bytes");
        let result = self.do_read_bytes(id, offset, length).await;
        if let Err(e) = &result {
            debug!(file = %id, error = ?e, "Byte read failed");
        }
        result
    }

    /// Internal implementation of `read_bytes`
    async fn do_read_bytes(
        &self,
        id: FileId,
        offset: u16,
        length: usize,
    ) -> Result<Bytes, TransportError>;

    /// Write one record (or the whole body of a transparent file)
    async fn write(
        &self,
        id: FileId,
        structure: FileStructure,
        record: usize,
        data: &[u8],
    ) -> Result<(), TransportError> {
        trace!(file = %id, record, data = ?hex::encode(data), "Writing record");
        let result = self.do_write(id, structure, record, data).await;
        if let Err(e) = &result {
            debug!(file = %id, record, error = ?e, "Write failed");
        }
        result
    }

    /// Internal implementation of `write`
    async fn do_write(
        &self,
        id: FileId,
        structure: FileStructure,
        record: usize,
        data: &[u8],
    ) -> Result<(), TransportError>;

    /// Read status information of a file
    async fn read_info(
        &self,
        id: FileId,
        structure: FileStructure,
    ) -> Result<FileInfo, TransportError>;

    /// Subscribe to changes of a file
    fn watch(&self, _id: FileId) -> FileWatch {
        FileWatch::never()
    }
}
