//! # sandbox-core
//!
//! Pure logic for the WESL sandbox (no I/O, instant tests).
//!
//! This crate implements the algorithms and state machines behind sandbox
//! persistence and sharing without any network or disk I/O.
//!
//! ## Design Philosophy
//!
//! All modules in this crate are **pure**. Given the same input they produce
//! the same output, so:
//! - unit tests need no mocks and no async runtime
//! - untrusted input can be fuzzed directly with property tests
//! - state transitions can be reasoned about in isolation
//!
//! The actual I/O (storage, HTTP, navigation) is performed by
//! `sandbox-client`, which interprets the commits and actions produced here.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod codec;
pub mod history;
pub mod options;
pub mod project;
pub mod reconcile;

pub use codec::{decode, decode_json, encode, encode_json, MAX_DECODED_LEN};
pub use history::{Action, Event, HistoryState};
pub use options::{AlternateMangler, AlternateOptions, Mangler, OptionsRecord, PrimaryOptions};
pub use project::{default_files, Commit, CompileInput, Compiler, Project, ProjectError};
pub use reconcile::{parse_option_value, reconcile, reconcile_map};
