//! Share handles.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::SandboxError;

/// Path prefix under which share handles appear in page locations.
const PATH_PREFIX: &str = "/s/";

/// An opaque server-issued token naming a published project snapshot.
///
/// Handles are non-empty ASCII hex so they can be embedded as a path segment
/// (`/s/<hex>`) without escaping.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ShareHandle(String);

impl ShareHandle {
    /// Validate and wrap a handle string.
    pub fn parse(value: &str) -> Result<Self, SandboxError> {
        if value.is_empty() || !value.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(SandboxError::InvalidHandle(value.to_string()));
        }
        Ok(Self(value.to_string()))
    }

    /// The raw token.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Navigation path that encodes this handle.
    pub fn to_path(&self) -> String {
        format!("{}{}", PATH_PREFIX, self.0)
    }

    /// Extract a handle from a path of the form `/s/<hex>` (trailing slash allowed).
    pub fn from_path(path: &str) -> Option<Self> {
        let rest = path.strip_prefix(PATH_PREFIX)?;
        let token = rest.strip_suffix('/').unwrap_or(rest);
        Self::parse(token).ok()
    }
}

impl TryFrom<String> for ShareHandle {
    type Error = SandboxError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ShareHandle> for String {
    fn from(handle: ShareHandle) -> Self {
        handle.0
    }
}

impl fmt::Display for ShareHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for ShareHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ShareHandle({})", self.0)
    }
}
