use std::{fmt, path::Path, sync::Arc};

use crate::error::TryOnError;

/// An image picked or dropped by the user, read fully into memory.
#[derive(Clone)]
pub struct ImageFile {
    pub name: String,
    /// MIME type reported by the drop source, if any.
    pub mime_type: Option<String>,
    pub bytes: Arc<[u8]>,
}

impl ImageFile {
    pub fn new(name: impl Into<String>, mime_type: Option<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.filter(|mime| !mime.trim().is_empty()),
            bytes: bytes.into(),
        }
    }

    pub fn from_path(path: &Path) -> Result<Self, TryOnError> {
        let bytes = std::fs::read(path)
            .map_err(|err| TryOnError::Io(format!("failed to read {}: {err}", path.display())))?;
        let name = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("image")
            .to_string();
        Ok(Self::new(name, None, bytes))
    }

    /// Reported type first, then a guess from the file name.
    pub fn effective_mime(&self) -> Option<String> {
        self.mime_type.clone().or_else(|| {
            mime_guess::from_path(&self.name)
                .first_raw()
                .map(str::to_string)
        })
    }

    pub fn len(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl fmt::Debug for ImageFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageFile")
            .field("name", &self.name)
            .field("mime_type", &self.mime_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Bytes handed to the HTTP body so far.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadProgress {
    pub sent: u64,
    pub total: u64,
}

impl UploadProgress {
    pub fn fraction(&self) -> f32 {
        if self.total == 0 {
            return 1.0;
        }
        (self.sent as f64 / self.total as f64).clamp(0.0, 1.0) as f32
    }
}

pub type ProgressCallback = Arc<dyn Fn(UploadProgress) + Send + Sync>;
