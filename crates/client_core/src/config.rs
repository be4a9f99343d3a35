use std::{path::Path, time::Duration};

use anyhow::{bail, Context};
use serde::Deserialize;
use shared::domain::GarmentType;
use url::Url;

pub const ENV_PREFIX: &str = "TRYON";
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:5001";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ClientSettings {
    pub api_base_url: String,
    pub upload_timeout_secs: u64,
    /// The server blocks while it polls the synthesis job, so this is long.
    pub tryon_timeout_secs: u64,
    pub max_upload_bytes: u64,
    pub notification_ttl_ms: u64,
    pub default_garment_type: GarmentType,
    pub upload_chunk_bytes: usize,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.into(),
            upload_timeout_secs: 30,
            tryon_timeout_secs: 180,
            max_upload_bytes: 16 * 1024 * 1024,
            notification_ttl_ms: 3_000,
            default_garment_type: GarmentType::Top,
            upload_chunk_bytes: 64 * 1024,
        }
    }
}

impl ClientSettings {
    pub fn base_url(&self) -> anyhow::Result<Url> {
        let raw = self.api_base_url.trim();
        // Joining endpoint paths onto a base without a trailing slash drops its last segment.
        let normalized = if raw.ends_with('/') {
            raw.to_string()
        } else {
            format!("{raw}/")
        };
        let url = Url::parse(&normalized)
            .with_context(|| format!("invalid api_base_url '{}'", self.api_base_url))?;
        if !matches!(url.scheme(), "http" | "https") {
            bail!("api_base_url must use http or https, got '{}'", url.scheme());
        }
        Ok(url)
    }

    pub fn upload_timeout(&self) -> Duration {
        Duration::from_secs(self.upload_timeout_secs)
    }

    pub fn tryon_timeout(&self) -> Duration {
        Duration::from_secs(self.tryon_timeout_secs)
    }

    pub fn notification_ttl(&self) -> Duration {
        Duration::from_millis(self.notification_ttl_ms)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        self.base_url()?;
        if self.upload_timeout_secs == 0 || self.tryon_timeout_secs == 0 {
            bail!("request timeouts must be greater than zero");
        }
        if self.max_upload_bytes == 0 {
            bail!("max_upload_bytes must be greater than zero");
        }
        if self.upload_chunk_bytes == 0 {
            bail!("upload_chunk_bytes must be greater than zero");
        }
        Ok(())
    }
}

/// Defaults, then the optional settings file, then `TRYON__*` environment variables.
pub fn load_settings(path: Option<&Path>) -> anyhow::Result<ClientSettings> {
    load_settings_from(path, None)
}

/// Same as [`load_settings`], with an explicit environment map instead of the process environment.
pub fn load_settings_from(
    path: Option<&Path>,
    env: Option<config::Map<String, String>>,
) -> anyhow::Result<ClientSettings> {
    let mut builder = config::Config::builder();
    if let Some(path) = path {
        builder = builder.add_source(config::File::from(path).required(true));
    }
    builder = builder.add_source(
        config::Environment::with_prefix(ENV_PREFIX)
            .separator("__")
            .try_parsing(true)
            .source(env),
    );

    let settings: ClientSettings = builder
        .build()
        .context("failed to assemble client settings")?
        .try_deserialize()
        .context("failed to parse client settings")?;
    settings.validate()?;
    Ok(settings)
}
