//! Core types shared across the synchronization engine.
//!
//! This module provides the small closed vocabularies the controller speaks:
//!
//! - [`ModelKind`] is the `modelKey` discriminator of every record
//! - [`EventType`] is the `type` of an event record, open to unknown strings
//! - [`PercentInt`] and [`LedLevel`] are range-checked integers used by setters
//! - [`RecordingMode`] and [`VideoMode`] are camera settings values
//!
//! ## Usage Example
//!
//! ```rust
//! use nvrsync::types::{ModelKind, PercentInt};
//!
//! let kind: ModelKind = "camera".parse().unwrap();
//! assert_eq!(kind.collection_key(), Some("cameras"));
//!
//! assert!(PercentInt::new(42).is_ok());
//! assert!(PercentInt::new(142).is_err());
//! ```

mod constrained;
mod event_type;
mod model_kind;

pub use constrained::{LedLevel, PercentInt, RecordingMode, VideoMode};
pub(crate) use constrained::check_range;
pub use event_type::EventType;
pub use model_kind::ModelKind;

/// Maximum number of cameras a single controller supports.
pub const MAX_SUPPORTED_CAMERAS: usize = 256;

/// Default capacity of the recent-events history.
pub const MAX_EVENT_HISTORY_IN_STATE_MACHINE: usize = MAX_SUPPORTED_CAMERAS * 2;
