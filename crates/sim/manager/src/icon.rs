//! Icon retrieval

use bytes::Bytes;
use nexum_sim_core::error::ResultExt;
use nexum_sim_core::image::{self, ColourHeader};
use nexum_sim_core::{Error as DecodeError, ImageDescriptor, ImageScheme};
use tracing::{debug, warn};

use crate::error::{Result, SimError, TransportError};
use crate::files::FileData;
use crate::pending::RequestKind;
use crate::sim::Sim;

impl Sim {
    /// Fetch icon `index` (1-based) rendered as XPM text
    pub async fn get_icon(&self, index: u8) -> Result<String> {
        if index == 0 {
            return Err(SimError::InvalidArgs("icon identifiers start at 1"));
        }
        let _guard = self.begin(RequestKind::GetIcon)?;

        let descriptor = {
            let data = self.data();
            let Some(descriptors) = &data.efimg else {
                return Err(SimError::NotImplemented);
            };
            if let Some(xpm) = data.icons.get(&index) {
                debug!(index, "Returning cached icon");
                return Ok(xpm.clone());
            }
            descriptors
                .get(usize::from(index) - 1)
                .copied()
                .flatten()
                .ok_or(DecodeError::InvalidData("no image descriptor for icon"))?
        };

        let epoch = self.epoch();
        let xpm = self.render_icon(&descriptor).await.inspect_err(|e| {
            warn!(index, error = %e, "Icon retrieval failed");
        })?;

        if self.inner.config.cache_icons && self.is_current(epoch) {
            self.data_mut().icons.insert(index, xpm.clone());
        }
        Ok(xpm)
    }

    async fn render_icon(&self, descriptor: &ImageDescriptor) -> Result<String> {
        let files = &self.inner.files;
        let image = files
            .read_bytes(
                descriptor.file_id,
                descriptor.offset,
                usize::from(descriptor.length),
            )
            .await?;

        let clut = match descriptor.scheme {
            ImageScheme::Basic => Bytes::new(),
            ImageScheme::Colour | ImageScheme::ColourTransparency => {
                let header = ColourHeader::parse(&image).context("colour image header")?;
                files
                    .read_bytes(descriptor.file_id, header.clut_offset, header.clut_length())
                    .await?
            }
        };

        Ok(image::render_xpm(descriptor.scheme, &image, &clut)
            .context(format!("icon in {}", descriptor.file_id))?)
    }

    pub(crate) fn on_image_descriptors(
        &self,
        result: std::result::Result<FileData, TransportError>,
    ) {
        let Ok(file) = result else {
            return;
        };
        let rl = file.record_length;
        if rl < image::DESCRIPTOR_LENGTH + 1 || !matches!(rl % image::DESCRIPTOR_LENGTH, 1 | 2) {
            warn!(record_length = rl, "Unexpected EFimg record length");
            return;
        }

        let descriptors: Vec<_> = file
            .iter_records()
            .map(|(_, record)| ImageDescriptor::parse_record(record).ok())
            .collect();
        debug!(count = descriptors.len(), "Read image descriptors");
        self.data_mut().efimg = Some(descriptors);
    }
}
