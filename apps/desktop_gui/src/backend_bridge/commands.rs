//! Backend commands queued from UI to backend worker.

use client_core::{ImageFile, UploadTicket};
use shared::protocol::TryOnRequest;

pub enum BackendCommand {
    UploadImage {
        ticket: UploadTicket,
        file: ImageFile,
    },
    SubmitTryOn {
        request: TryOnRequest,
    },
    FetchResultImage {
        image_url: String,
    },
    CheckHealth,
}

impl BackendCommand {
    pub fn name(&self) -> &'static str {
        match self {
            Self::UploadImage { .. } => "upload_image",
            Self::SubmitTryOn { .. } => "submit_try_on",
            Self::FetchResultImage { .. } => "fetch_result_image",
            Self::CheckHealth => "check_health",
        }
    }
}
