use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use shared::protocol::{HealthReply, TryOnOutcome, TryOnRequest};

use crate::{
    error::TryOnError,
    transport::TryOnService,
    types::{ImageFile, ProgressCallback},
};

/// Scripted in-memory service that records every call it receives.
#[derive(Default)]
pub(crate) struct FakeService {
    uploads: Mutex<VecDeque<Result<String, TryOnError>>>,
    try_ons: Mutex<VecDeque<Result<TryOnOutcome, TryOnError>>>,
    pub(crate) uploaded_names: Arc<Mutex<Vec<String>>>,
    pub(crate) try_on_requests: Arc<Mutex<Vec<TryOnRequest>>>,
}

impl FakeService {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_upload(self, result: Result<String, TryOnError>) -> Self {
        self.uploads.lock().unwrap().push_back(result);
        self
    }

    pub(crate) fn with_try_on(self, result: Result<TryOnOutcome, TryOnError>) -> Self {
        self.try_ons.lock().unwrap().push_back(result);
        self
    }

    pub(crate) fn upload_count(&self) -> usize {
        self.uploaded_names.lock().unwrap().len()
    }

    pub(crate) fn requests(&self) -> Vec<TryOnRequest> {
        self.try_on_requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl TryOnService for FakeService {
    async fn upload_image(
        &self,
        file: &ImageFile,
        _progress: Option<ProgressCallback>,
    ) -> Result<String, TryOnError> {
        self.uploaded_names.lock().unwrap().push(file.name.clone());
        self.uploads
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(TryOnError::Upload("no scripted upload".to_string())))
    }

    async fn submit_try_on(&self, request: &TryOnRequest) -> Result<TryOnOutcome, TryOnError> {
        self.try_on_requests.lock().unwrap().push(request.clone());
        self.try_ons
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(TryOnError::Transport("no scripted try-on".to_string())))
    }

    async fn fetch_image(&self, _image_url: &str) -> Result<Vec<u8>, TryOnError> {
        Ok(Vec::new())
    }

    async fn check_health(&self) -> Result<HealthReply, TryOnError> {
        Ok(HealthReply {
            status: "ok".to_string(),
            message: None,
        })
    }
}

pub(crate) fn png(name: &str) -> ImageFile {
    ImageFile::new(name, None, vec![0x89, b'P', b'N', b'G', 1, 2, 3, 4])
}

pub(crate) fn text(name: &str) -> ImageFile {
    ImageFile::new(name, None, b"not an image".to_vec())
}
