//! # sandbox-types
//!
//! Data model and wire shapes for the WESL sandbox persistence layer.
//!
//! This crate provides the foundational types used across all sandbox crates:
//! - [`SourceFile`], [`Linker`] - The project data model
//! - [`ShareHandle`] - Opaque token naming a published snapshot
//! - [`Envelope`], [`SalvagedEnvelope`] - The JSON shape exchanged with the
//!   share service and local storage
//! - [`SandboxError`] - Error types

#![warn(missing_docs)]
#![warn(clippy::all)]

mod envelope;
mod error;
mod files;
mod handle;
mod linker;

pub use envelope::{salvage_envelope, salvage_value, Envelope, SalvagedEnvelope};
pub use error::SandboxError;
pub use files::{salvage_files, SalvagedFiles, SourceFile};
pub use handle::ShareHandle;
pub use linker::Linker;
