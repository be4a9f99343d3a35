//! Wire and domain types shared between the try-on client library and the desktop app.

pub mod domain;
pub mod error;
pub mod protocol;
