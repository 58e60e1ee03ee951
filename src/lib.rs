//! Type-safe Rust client for NVR controllers.
//!
//! nvrsync loads the controller's bootstrap into an in-memory snapshot and
//! keeps it current from the binary update websocket, notifying subscribers
//! with precise per-field deltas.
//!
//! # Features
//!
//! - **Live state**: every camera, light, sensor, chime and user record, kept in sync
//! - **Field deltas**: each notification carries exactly the fields that changed
//! - **Event linking**: motion, ring and smart detection events back-reference their camera
//! - **Supervised transport**: idle watchdog and automatic reconnect with bootstrap resync
//! - **Edits**: validated setters that send only the changed fields back over REST
//!
//! # Quick Start
//!
//! See `demos/watch_updates.rs` for a complete program.
//!
//! ```rust,no_run
//! use nvrsync::{ClientConfig, ModelKind, ProtectClient};
//! use nvrsync::types::PercentInt;
//!
//! #[tokio::main]
//! async fn main() -> nvrsync::Result<()> {
//!     let client = ProtectClient::connect(ClientConfig::from_path("nvr.yaml")?).await?;
//!
//!     let _subscription = client.subscribe(|change| {
//!         println!("{} {:?}: {:?}", change.kind, change.id, change.changed.keys().collect::<Vec<_>>());
//!     });
//!
//!     let mut draft = client.edit(ModelKind::Camera, "61b3f5c7033ea703e7000424")?;
//!     draft.set_mic_volume(PercentInt::new(42)?)?;
//!     client.save(&draft).await?;
//!     Ok(())
//! }
//! ```

// Core types and error handling
mod error;
pub mod registry;
#[cfg(any(test, feature = "benchmark"))]
pub mod test_utils;
pub mod types;
pub mod wire;

// State synchronization
pub mod store;
pub mod subscription;

// Transport and supervision
pub mod connection;
pub mod driver;
pub mod session;
pub mod sessions;
pub mod transport;
pub mod transports;

// User-facing API
pub mod client;
pub mod config;
pub mod draft;

// Core exports
pub use error::*;
pub use registry::{Record, Value};
pub use types::{EventType, ModelKind};

// State exports
pub use store::{ChangeAction, ChangeNotification, Snapshot};
pub use subscription::{Subscribers, Subscription, UpdateStream};

// Main API exports
pub use client::ProtectClient;
pub use config::ClientConfig;
pub use connection::{Connection, ConnectionState};
pub use draft::RecordDraft;
