use shared::{
    domain::{GarmentType, SlotKind},
    protocol::{TryOnOutcome, TryOnRequest},
};

use crate::{
    config::ClientSettings,
    controller::{ControllerEvent, ResultPanel, TryOnController, TryOnState},
    error::TryOnError,
    notify::NotificationCenter,
    transport::TryOnService,
    types::{ImageFile, UploadProgress},
    upload::{ImageSlots, UploadCompletion, UploadManager, UploadTicket},
};

/// Top-level owner of the two image slots, the controller and the
/// notification queue. Handlers get it by `&mut`; nothing here is shared.
#[derive(Debug)]
pub struct TryOnSession {
    pub slots: ImageSlots,
    pub controller: TryOnController,
    pub notifications: NotificationCenter,
    uploads: UploadManager,
    garment_type: GarmentType,
}

impl TryOnSession {
    pub fn new(settings: &ClientSettings) -> Self {
        Self {
            slots: ImageSlots::default(),
            controller: TryOnController::new(),
            notifications: NotificationCenter::new(settings.notification_ttl()),
            uploads: UploadManager::from_settings(settings),
            garment_type: settings.default_garment_type,
        }
    }

    pub fn garment_type(&self) -> GarmentType {
        self.garment_type
    }

    pub fn set_garment_type(&mut self, garment_type: GarmentType) {
        self.garment_type = garment_type;
    }

    pub fn can_try_on(&self) -> bool {
        self.controller.trigger_enabled(&self.slots)
    }

    pub fn result_panel(&self) -> ResultPanel<'_> {
        self.controller.result_panel()
    }

    pub fn select_file(
        &mut self,
        slot: SlotKind,
        file: &ImageFile,
    ) -> Result<UploadTicket, TryOnError> {
        self.uploads
            .begin_upload(&mut self.slots, slot, file, &mut self.notifications)
    }

    pub fn upload_progress(&mut self, ticket: UploadTicket, progress: UploadProgress) -> bool {
        self.uploads.record_progress(&mut self.slots, ticket, progress)
    }

    pub fn finish_upload(
        &mut self,
        ticket: UploadTicket,
        result: Result<String, TryOnError>,
    ) -> UploadCompletion {
        self.uploads
            .complete_upload(&mut self.slots, ticket, result, &mut self.notifications)
    }

    pub fn reset_slot(&mut self, slot: SlotKind) {
        self.uploads.reset(&mut self.slots, slot);
    }

    /// Builds the request from the stored reference URLs and enters `Submitting`.
    pub fn begin_try_on(&mut self) -> Result<TryOnRequest, TryOnError> {
        let (person, garment) = self.slots.reference_urls().ok_or_else(|| {
            TryOnError::InvalidState("both images must finish uploading first".to_string())
        })?;
        let request = TryOnRequest {
            person_image_url: person.to_string(),
            garment_image_url: garment.to_string(),
            garment_type: self.garment_type,
        };
        self.controller
            .transition(ControllerEvent::Submit(request.clone()))?;
        Ok(request)
    }

    /// Resends the last submitted request verbatim, without re-uploading.
    pub fn retry(&mut self) -> Result<TryOnRequest, TryOnError> {
        let request = self.controller.last_request().cloned().ok_or_else(|| {
            TryOnError::InvalidState("nothing has been submitted yet".to_string())
        })?;
        self.controller
            .transition(ControllerEvent::Submit(request.clone()))?;
        Ok(request)
    }

    pub fn finish_try_on(
        &mut self,
        result: Result<TryOnOutcome, TryOnError>,
    ) -> Result<&TryOnState, TryOnError> {
        self.controller
            .transition(ControllerEvent::Completed(result))?;
        match self.controller.state() {
            TryOnState::Succeeded { .. } => {
                self.notifications.success("Try-on completed!");
            }
            TryOnState::SubmittedAsync { .. } => {
                self.notifications
                    .info("Try-on submitted, please wait for the result");
            }
            TryOnState::Failed { .. } => {
                self.notifications.error("Try-on failed, please retry");
            }
            TryOnState::Idle | TryOnState::Submitting { .. } => {}
        }
        Ok(self.controller.state())
    }

    pub fn dismiss_result(&mut self) -> Result<(), TryOnError> {
        self.controller.transition(ControllerEvent::Dismiss)?;
        Ok(())
    }

    /// Whole upload against `service`, without progress reporting.
    pub async fn submit_image<S>(
        &mut self,
        service: &S,
        slot: SlotKind,
        file: ImageFile,
    ) -> Result<String, TryOnError>
    where
        S: TryOnService + ?Sized,
    {
        let ticket = self.select_file(slot, &file)?;
        let result = service.upload_image(&file, None).await;
        match self.finish_upload(ticket, result) {
            UploadCompletion::Stored { url } => Ok(url),
            UploadCompletion::Failed(err) => Err(err),
            UploadCompletion::Stale => Err(TryOnError::InvalidState(
                "upload was superseded by a newer selection".to_string(),
            )),
        }
    }

    /// Whole try-on round trip against `service`.
    pub async fn run_try_on<S>(&mut self, service: &S) -> Result<&TryOnState, TryOnError>
    where
        S: TryOnService + ?Sized,
    {
        let request = self.begin_try_on()?;
        let result = service.submit_try_on(&request).await;
        self.finish_try_on(result)
    }
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
