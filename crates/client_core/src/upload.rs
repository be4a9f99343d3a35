//! Upload Manager: per-slot file selection, validation, optimistic preview
//! and reference-URL bookkeeping.
//!
//! An upload runs in three steps so the network part can happen elsewhere:
//! [`UploadManager::begin_upload`] validates and previews, the caller
//! performs the transfer, and [`UploadManager::complete_upload`] applies the
//! result. Every begin bumps the slot generation, and completions carrying an
//! older generation are dropped, so only the newest upload can ever set the
//! slot's reference URL.

use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use shared::domain::SlotKind;
use tracing::{debug, info, warn};

use crate::{
    config::ClientSettings,
    error::TryOnError,
    notify::{NotificationCenter, ProgressIndicator},
    types::{ImageFile, UploadProgress},
};

pub const NOT_AN_IMAGE_MESSAGE: &str = "Please upload an image file";

/// Local copy of the selected file, shown before the upload finishes.
#[derive(Debug, Clone)]
pub struct Preview {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Arc<[u8]>,
}

impl Preview {
    pub fn data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, STANDARD.encode(&self.bytes))
    }
}

#[derive(Debug, Clone, Default)]
pub struct ImageSlot {
    preview: Option<Preview>,
    reference_url: Option<String>,
    generation: u64,
    progress: Option<ProgressIndicator>,
}

impl ImageSlot {
    pub fn preview(&self) -> Option<&Preview> {
        self.preview.as_ref()
    }

    pub fn preview_data_uri(&self) -> Option<String> {
        self.preview.as_ref().map(Preview::data_uri)
    }

    pub fn reference_url(&self) -> Option<&str> {
        self.reference_url.as_deref()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// `Some` while an upload for the current generation is outstanding.
    pub fn progress(&self) -> Option<ProgressIndicator> {
        self.progress
    }

    pub fn is_uploading(&self) -> bool {
        self.progress.is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.preview.is_none() && self.reference_url.is_none()
    }

    fn clear(&mut self) {
        self.preview = None;
        self.reference_url = None;
        self.progress = None;
    }
}

/// The person and garment cells owned by the top-level session.
#[derive(Debug, Clone, Default)]
pub struct ImageSlots {
    person: ImageSlot,
    garment: ImageSlot,
}

impl ImageSlots {
    pub fn get(&self, kind: SlotKind) -> &ImageSlot {
        match kind {
            SlotKind::Person => &self.person,
            SlotKind::Garment => &self.garment,
        }
    }

    fn get_mut(&mut self, kind: SlotKind) -> &mut ImageSlot {
        match kind {
            SlotKind::Person => &mut self.person,
            SlotKind::Garment => &mut self.garment,
        }
    }

    /// Both slots hold a server reference URL.
    pub fn is_ready(&self) -> bool {
        self.reference_urls().is_some()
    }

    /// `(person, garment)` reference URLs when both are present.
    pub fn reference_urls(&self) -> Option<(&str, &str)> {
        match (self.person.reference_url(), self.garment.reference_url()) {
            (Some(person), Some(garment)) if !person.is_empty() && !garment.is_empty() => {
                Some((person, garment))
            }
            _ => None,
        }
    }
}

/// Identifies one upload attempt for one slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UploadTicket {
    pub slot: SlotKind,
    pub generation: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadCompletion {
    Stored { url: String },
    Failed(TryOnError),
    /// A newer selection or a reset superseded this upload.
    Stale,
}

#[derive(Debug, Clone)]
pub struct UploadManager {
    max_upload_bytes: u64,
}

impl UploadManager {
    pub fn new(max_upload_bytes: u64) -> Self {
        Self { max_upload_bytes }
    }

    pub fn from_settings(settings: &ClientSettings) -> Self {
        Self::new(settings.max_upload_bytes)
    }

    /// Returns the MIME type that will be sent with the file.
    pub fn validate(&self, file: &ImageFile) -> Result<String, TryOnError> {
        let mime = file
            .effective_mime()
            .filter(|mime| mime.to_ascii_lowercase().starts_with("image/"))
            .ok_or_else(|| TryOnError::Validation(NOT_AN_IMAGE_MESSAGE.to_string()))?;
        if file.is_empty() {
            return Err(TryOnError::Validation(format!("{} is empty", file.name)));
        }
        if file.len() > self.max_upload_bytes {
            return Err(TryOnError::Validation(format!(
                "{} is larger than the {} byte upload limit",
                file.name, self.max_upload_bytes
            )));
        }
        Ok(mime)
    }

    /// Validates `file`, shows its preview in `slot` and invalidates the
    /// slot's previous reference URL. On validation failure nothing changes.
    pub fn begin_upload(
        &self,
        slots: &mut ImageSlots,
        slot: SlotKind,
        file: &ImageFile,
        notices: &mut NotificationCenter,
    ) -> Result<UploadTicket, TryOnError> {
        let mime_type = match self.validate(file) {
            Ok(mime) => mime,
            Err(err) => {
                warn!(%slot, file = %file.name, error = %err, "rejected file selection");
                notices.error(err.detail().to_string());
                return Err(err);
            }
        };

        let cell = slots.get_mut(slot);
        cell.generation += 1;
        cell.preview = Some(Preview {
            file_name: file.name.clone(),
            mime_type,
            bytes: Arc::clone(&file.bytes),
        });
        cell.reference_url = None;
        cell.progress = Some(ProgressIndicator::Indeterminate);

        let ticket = UploadTicket {
            slot,
            generation: cell.generation,
        };
        debug!(%slot, generation = ticket.generation, bytes = file.len(), "upload started");
        Ok(ticket)
    }

    /// Returns false when the ticket is stale.
    pub fn record_progress(
        &self,
        slots: &mut ImageSlots,
        ticket: UploadTicket,
        progress: UploadProgress,
    ) -> bool {
        let cell = slots.get_mut(ticket.slot);
        if cell.generation != ticket.generation || cell.progress.is_none() {
            return false;
        }
        cell.progress = Some(progress.into());
        true
    }

    pub fn complete_upload(
        &self,
        slots: &mut ImageSlots,
        ticket: UploadTicket,
        result: Result<String, TryOnError>,
        notices: &mut NotificationCenter,
    ) -> UploadCompletion {
        let cell = slots.get_mut(ticket.slot);
        if cell.generation != ticket.generation {
            debug!(
                slot = %ticket.slot,
                generation = ticket.generation,
                current = cell.generation,
                "dropping stale upload completion"
            );
            return UploadCompletion::Stale;
        }

        match result {
            Ok(url) => {
                info!(slot = %ticket.slot, %url, "image uploaded");
                cell.reference_url = Some(url.clone());
                cell.progress = None;
                notices.success("Image uploaded successfully");
                UploadCompletion::Stored { url }
            }
            Err(err) => {
                warn!(slot = %ticket.slot, error = %err, "image upload failed");
                cell.clear();
                notices.error(format!("Upload failed: {}", err.detail()));
                UploadCompletion::Failed(err)
            }
        }
    }

    /// Clears `slot` and orphans any upload still running for it.
    pub fn reset(&self, slots: &mut ImageSlots, slot: SlotKind) {
        let cell = slots.get_mut(slot);
        cell.generation += 1;
        cell.clear();
        debug!(%slot, generation = cell.generation, "slot reset");
    }
}

#[cfg(test)]
#[path = "tests/upload_tests.rs"]
mod tests;
