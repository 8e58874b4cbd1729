//! # sandbox-share
//!
//! Share service for the WESL sandbox.
//!
//! This crate implements a small HTTP service that:
//! - Accepts project envelopes posted as a `data` form field
//! - Stores each one under a content-addressed handle
//! - Serves them back by handle, unchanged
//!
//! ## Architecture
//!
//! ```text
//! sandbox-client ──┐                  ┌── sandbox-client
//!   POST /share    │      HTTP        │   GET /share/<handle>
//!                  ├─────────────────►│
//!              ┌───┴──────────────────┴───┐
//!              │      sandbox-share       │
//!              │  ┌────────────────────┐  │
//!              │  │  SQLite (shares)   │  │
//!              │  └────────────────────┘  │
//!              └──────────────────────────┘
//! ```
//!
//! Handles are the first 8 bytes of the BLAKE3 hash of the envelope, in hex,
//! so publishing the same project twice returns the same handle.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod http;
pub mod server;
pub mod storage;

pub use config::Config;
pub use error::{ApiError, ShareError, StorageError};
pub use http::build_router;
pub use server::{ShareMetrics, ShareServer};
pub use storage::{content_handle, ShareStorage, SqliteStorage, StoredShare};
