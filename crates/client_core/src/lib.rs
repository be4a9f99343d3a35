//! Client side of the virtual try-on flow: image slots and their uploads,
//! the try-on state machine, notifications, and the HTTP service client.

pub mod config;
pub mod controller;
pub mod error;
pub mod notify;
mod session;
pub mod transport;
pub mod types;
pub mod upload;

#[cfg(test)]
pub(crate) mod testing;

pub use config::{load_settings, ClientSettings};
pub use controller::{ControllerEvent, ResultPanel, TryOnController, TryOnState};
pub use error::TryOnError;
pub use notify::{Notification, NotificationCenter, NotificationKind, ProgressIndicator};
pub use session::TryOnSession;
pub use transport::{resolve_url, HttpTryOnService, TryOnService};
pub use types::{ImageFile, ProgressCallback, UploadProgress};
pub use upload::{ImageSlot, ImageSlots, Preview, UploadCompletion, UploadManager, UploadTicket};
