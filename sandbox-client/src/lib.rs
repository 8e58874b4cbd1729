//! # sandbox-client
//!
//! Persistence, sharing, and the session context for the WESL sandbox.
//!
//! This is the library front ends use to keep a sandbox project durable and
//! shareable.
//!
//! ## Features
//!
//! - **Typed Stores**: per-key persistent cells seeded from the URL, the
//!   backend, or defaults, with write-back on every commit
//! - **Share Client**: publish and fetch snapshots over a pluggable transport
//!   (HTTP via reqwest, mock)
//! - **Session**: one explicit application context wiring the project, the
//!   stores, the history state machine, and the navigator together
//! - **Pure State Machines**: uses sandbox-core for side-effect-free logic
//!
//! ## Example
//!
//! ```ignore
//! use sandbox_client::{HttpTransport, MemoryBackend, MemoryNavigator, PageLocation, Session, SessionConfig};
//!
//! let transport = HttpTransport::new("https://share.example", Duration::from_secs(10))?;
//! let location = PageLocation::parse("/s/ab12")?;
//! let session = Session::open(
//!     SessionConfig::default(),
//!     transport,
//!     Arc::new(MemoryBackend::new()),
//!     MemoryNavigator::new(location.path()),
//!     &location,
//! )
//! .await;
//!
//! session.mutate(|p| p.set_source(0, "fn main() {}")).await?;
//! let handle = session.publish().await?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod location;
pub mod navigator;
pub mod session;
pub mod share;
pub mod store;
pub mod transport;

pub use location::{permalink, PageLocation};
pub use navigator::{MemoryNavigator, Navigator};
pub use session::{Navigation, Session, SessionConfig, DEFAULT_OUTPUT, FILES_KEY, LINKER_KEY};
pub use share::{ClientError, ShareClient, DATA_FIELD, SHARE_PATH};
pub use store::{FileBackend, MemoryBackend, Persisted, Seed, StorageBackend, TypedStore};
pub use transport::{
    HttpTransport, MockGate, MockTransport, PostedForm, ShareTransport, TransportError,
    TransportResponse,
};
