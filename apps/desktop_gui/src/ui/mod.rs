//! UI layer for desktop GUI: app shell, slot and result panels, image helpers.

pub mod app;
pub mod images;

pub use app::{DesktopGuiApp, StartupConfig};
