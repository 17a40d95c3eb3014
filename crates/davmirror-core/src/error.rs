//! Error types for the mirroring engine.
//!
//! Only [`ConfigError`] and [`MirrorError`] stop a run. [`ListingError`] and
//! [`FetchError`] are logged by the mirror and counted in its report.
//! [`ConnectionError`] comes from the standalone connection check.

pub use crate::config::ConfigError;
pub use crate::dav::{ListingError, MultistatusError, TransportError};
pub use crate::fetch::FetchError;
pub use crate::mirror::{ConnectionError, MirrorError};
