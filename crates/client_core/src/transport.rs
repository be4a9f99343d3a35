use async_trait::async_trait;
use reqwest::{
    multipart::{Form, Part},
    Body, Client, StatusCode,
};
use shared::protocol::{
    HealthReply, TryOnOutcome, TryOnReply, TryOnRequest, UploadReply, HEALTH_PATH, TRY_ON_PATH,
    UPLOAD_FIELD, UPLOAD_PATH,
};
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

use crate::{
    config::ClientSettings,
    error::TryOnError,
    types::{ImageFile, ProgressCallback, UploadProgress},
};

/// The remote image-synthesis service as seen by the client.
#[async_trait]
pub trait TryOnService: Send + Sync {
    /// Uploads one image and returns its server reference URL.
    async fn upload_image(
        &self,
        file: &ImageFile,
        progress: Option<ProgressCallback>,
    ) -> Result<String, TryOnError>;
    async fn submit_try_on(&self, request: &TryOnRequest) -> Result<TryOnOutcome, TryOnError>;
    /// Downloads a result image; relative URLs resolve against the service base URL.
    async fn fetch_image(&self, image_url: &str) -> Result<Vec<u8>, TryOnError>;
    async fn check_health(&self) -> Result<HealthReply, TryOnError>;
}

/// Resolves `raw` against `base` unless it is already absolute.
pub fn resolve_url(base: &Url, raw: &str) -> Result<Url, TryOnError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(TryOnError::Protocol("empty image url".to_string()));
    }
    match Url::parse(raw) {
        Ok(url) => Ok(url),
        Err(url::ParseError::RelativeUrlWithoutBase) => base
            .join(raw)
            .map_err(|err| TryOnError::Protocol(format!("invalid image url '{raw}': {err}"))),
        Err(err) => Err(TryOnError::Protocol(format!(
            "invalid image url '{raw}': {err}"
        ))),
    }
}

pub struct HttpTryOnService {
    http: Client,
    base_url: Url,
    upload_timeout: Duration,
    tryon_timeout: Duration,
    upload_chunk_bytes: usize,
}

impl HttpTryOnService {
    pub fn new(settings: &ClientSettings) -> anyhow::Result<Self> {
        Ok(Self {
            http: Client::new(),
            base_url: settings.base_url()?,
            upload_timeout: settings.upload_timeout(),
            tryon_timeout: settings.tryon_timeout(),
            upload_chunk_bytes: settings.upload_chunk_bytes.max(1),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, TryOnError> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|err| TryOnError::Transport(format!("invalid endpoint {path}: {err}")))
    }

    /// Splits the file into chunks and reports progress as the HTTP client
    /// pulls each one into the request body.
    fn progress_body(&self, file: &ImageFile, progress: Option<ProgressCallback>) -> Body {
        let total = file.len();
        let chunks: Vec<Vec<u8>> = file
            .bytes
            .chunks(self.upload_chunk_bytes)
            .map(<[u8]>::to_vec)
            .collect();
        let mut sent = 0u64;
        let stream = futures::stream::iter(chunks.into_iter().map(move |chunk| {
            sent += chunk.len() as u64;
            if let Some(progress) = &progress {
                progress(UploadProgress { sent, total });
            }
            Ok::<_, std::io::Error>(chunk)
        }));
        Body::wrap_stream(stream)
    }
}

fn describe_status(status: StatusCode) -> String {
    format!("server responded with HTTP {status}")
}

#[async_trait]
impl TryOnService for HttpTryOnService {
    async fn upload_image(
        &self,
        file: &ImageFile,
        progress: Option<ProgressCallback>,
    ) -> Result<String, TryOnError> {
        let url = self.endpoint(UPLOAD_PATH)?;
        let mime = file
            .effective_mime()
            .unwrap_or_else(|| "application/octet-stream".to_string());
        let part = Part::stream_with_length(self.progress_body(file, progress), file.len())
            .file_name(file.name.clone())
            .mime_str(&mime)
            .map_err(|err| TryOnError::Upload(format!("invalid content type {mime}: {err}")))?;
        let form = Form::new().part(UPLOAD_FIELD, part);

        debug!(file = %file.name, bytes = file.len(), %url, "uploading image");
        let response = self
            .http
            .post(url)
            .timeout(self.upload_timeout)
            .multipart(form)
            .send()
            .await
            .map_err(|err| TryOnError::Upload(err.to_string()))?;
        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|err| TryOnError::Upload(err.to_string()))?;

        // The server reports failures as `{error}` bodies under any status code.
        match serde_json::from_slice::<UploadReply>(&body) {
            Ok(reply) => reply.into_reference_url().map_err(TryOnError::upload_reply),
            Err(err) => {
                warn!(%status, error = %err, "upload reply is not JSON");
                Err(TryOnError::Upload(describe_status(status)))
            }
        }
    }

    async fn submit_try_on(&self, request: &TryOnRequest) -> Result<TryOnOutcome, TryOnError> {
        let url = self.endpoint(TRY_ON_PATH)?;
        info!(
            garment_type = %request.garment_type,
            person = %request.person_image_url,
            garment = %request.garment_image_url,
            "submitting try-on"
        );
        let response = self
            .http
            .post(url)
            .timeout(self.tryon_timeout)
            .json(request)
            .send()
            .await
            .map_err(|err| TryOnError::Transport(err.to_string()))?;
        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|err| TryOnError::Transport(err.to_string()))?;

        let reply: TryOnReply = serde_json::from_slice(&body).map_err(|err| {
            warn!(%status, error = %err, "try-on reply is not JSON");
            TryOnError::Protocol(format!("{} with a non-JSON body", describe_status(status)))
        })?;
        if reply.status.is_none() {
            if let Some(error) = &reply.error {
                warn!(%status, %error, "try-on reply has no status");
            }
        }
        Ok(reply.into_outcome()?)
    }

    async fn fetch_image(&self, image_url: &str) -> Result<Vec<u8>, TryOnError> {
        let url = resolve_url(&self.base_url, image_url)?;
        let bytes = self
            .http
            .get(url)
            .timeout(self.upload_timeout)
            .send()
            .await
            .map_err(|err| TryOnError::Transport(err.to_string()))?
            .error_for_status()
            .map_err(|err| TryOnError::Transport(err.to_string()))?
            .bytes()
            .await
            .map_err(|err| TryOnError::Transport(err.to_string()))?;
        Ok(bytes.to_vec())
    }

    async fn check_health(&self) -> Result<HealthReply, TryOnError> {
        let url = self.endpoint(HEALTH_PATH)?;
        self.http
            .get(url)
            .timeout(Duration::from_secs(10))
            .send()
            .await
            .map_err(|err| TryOnError::Transport(err.to_string()))?
            .error_for_status()
            .map_err(|err| TryOnError::Transport(err.to_string()))?
            .json::<HealthReply>()
            .await
            .map_err(|err| TryOnError::Protocol(err.to_string()))
    }
}

#[cfg(test)]
#[path = "tests/transport_tests.rs"]
mod tests;
