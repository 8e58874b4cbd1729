//! Storage layer for sandbox-share.
//!
//! Shares are immutable and content-addressed: publishing the same body twice
//! yields the same handle and stores one row.

mod sqlite;

pub use sqlite::SqliteStorage;

use crate::error::StorageError;
use async_trait::async_trait;

/// Number of BLAKE3 output bytes used for a handle.
pub const HANDLE_BYTES: usize = 8;

/// Handle for a share body: hex of the first [`HANDLE_BYTES`] bytes of its
/// BLAKE3 hash.
pub fn content_handle(body: &str) -> String {
    let hash = blake3::hash(body.as_bytes());
    hex::encode(&hash.as_bytes()[..HANDLE_BYTES])
}

/// A share as stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredShare {
    /// Content handle.
    pub handle: String,
    /// Envelope JSON exactly as published.
    pub body: String,
    /// Unix timestamp of the first publish.
    pub created_at: i64,
}

/// Trait for share storage backends.
#[async_trait]
pub trait ShareStorage: Send + Sync {
    /// Store `body` under `handle`.
    ///
    /// Returns `false` if the same body is already stored under `handle`.
    /// A different body under a taken handle is
    /// [`StorageError::HandleCollision`]; the stored body is never replaced.
    async fn put_share(&self, handle: &str, body: &str) -> Result<bool, StorageError>;

    /// Get a share by handle.
    async fn get_share(&self, handle: &str) -> Result<Option<StoredShare>, StorageError>;

    /// Number of stored shares.
    async fn count_shares(&self) -> Result<u64, StorageError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handle_is_sixteen_hex_digits() {
        let handle = content_handle(r#"{"files":[]}"#);
        assert_eq!(handle.len(), HANDLE_BYTES * 2);
        assert!(handle.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn handle_depends_only_on_content() {
        let a = content_handle(r#"{"files":[{"name":"a.wgsl","source":""}]}"#);
        let b = content_handle(r#"{"files":[{"name":"a.wgsl","source":""}]}"#);
        let c = content_handle(r#"{"files":[{"name":"b.wgsl","source":""}]}"#);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn handle_parses_on_the_client_side() {
        let handle = content_handle("anything");
        assert!(sandbox_types::ShareHandle::parse(&handle).is_ok());
    }
}
