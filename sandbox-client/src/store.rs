//! Persistence backends and the typed store.
//!
//! A [`TypedStore`] is a persistent cell for one logical key (`files`,
//! `linker`, `options-<linker>`). It seeds its value once at open time and
//! writes the full value back on every commit. Backends deal in raw JSON
//! strings; shape checking happens in [`Persisted::from_foreign`].
//!
//! # Seeding order
//!
//! ```text
//! URL token (decodes and is usable) → backend value (parses and is usable) → initial
//! ```
//!
//! Read failures at any step fall through to the next one. Write failures are
//! reported once and the store then keeps working in memory only.

use sandbox_core::{codec, reconcile, AlternateOptions, PrimaryOptions};
use sandbox_types::{salvage_files, Linker, SandboxError, SourceFile};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::io::ErrorKind;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::location::PageLocation;

/// Key-value persistence for JSON strings.
pub trait StorageBackend: Send + Sync {
    /// Read the value stored under `key`, if any.
    fn load(&self, key: &str) -> Result<Option<String>, SandboxError>;

    /// Store `value` under `key`, replacing any previous value.
    fn save(&self, key: &str, value: &str) -> Result<(), SandboxError>;
}

/// In-memory backend.
///
/// Clones share state, so a test can keep a handle to inspect what was
/// written and to inject failures.
#[derive(Debug, Default, Clone)]
pub struct MemoryBackend {
    inner: Arc<Mutex<MemoryBackendInner>>,
}

#[derive(Debug, Default)]
struct MemoryBackendInner {
    values: HashMap<String, String>,
    writes: Vec<String>,
    fail_reads: bool,
    fail_writes: bool,
}

impl MemoryBackend {
    /// Create an empty backend.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryBackendInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Make every read fail until turned off.
    pub fn fail_reads(&self, fail: bool) {
        self.lock().fail_reads = fail;
    }

    /// Make every write fail until turned off.
    pub fn fail_writes(&self, fail: bool) {
        self.lock().fail_writes = fail;
    }

    /// Raw value under `key`.
    pub fn get(&self, key: &str) -> Option<String> {
        self.lock().values.get(key).cloned()
    }

    /// Put a raw value, bypassing failure injection.
    pub fn insert(&self, key: &str, value: &str) {
        self.lock()
            .values
            .insert(key.to_string(), value.to_string());
    }

    /// Keys of successful writes, in order.
    pub fn writes(&self) -> Vec<String> {
        self.lock().writes.clone()
    }

    /// Number of successful writes to `key`.
    pub fn write_count(&self, key: &str) -> usize {
        self.lock().writes.iter().filter(|k| *k == key).count()
    }
}

impl StorageBackend for MemoryBackend {
    fn load(&self, key: &str) -> Result<Option<String>, SandboxError> {
        let inner = self.lock();
        if inner.fail_reads {
            return Err(SandboxError::BackendUnavailable("reads disabled".into()));
        }
        Ok(inner.values.get(key).cloned())
    }

    fn save(&self, key: &str, value: &str) -> Result<(), SandboxError> {
        let mut inner = self.lock();
        if inner.fail_writes {
            return Err(SandboxError::BackendUnavailable("quota exceeded".into()));
        }
        inner.values.insert(key.to_string(), value.to_string());
        inner.writes.push(key.to_string());
        Ok(())
    }
}

/// One `<key>.json` file per key under a directory.
#[derive(Debug, Clone)]
pub struct FileBackend {
    dir: PathBuf,
}

impl FileBackend {
    /// Use `dir`, creating it if needed.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, SandboxError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|e| {
            SandboxError::BackendUnavailable(format!("create {}: {}", dir.display(), e))
        })?;
        Ok(Self { dir })
    }

    /// Directory holding the files.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl StorageBackend for FileBackend {
    fn load(&self, key: &str) -> Result<Option<String>, SandboxError> {
        match std::fs::read_to_string(self.path(key)) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(SandboxError::BackendUnavailable(format!("read {}: {}", key, e))),
        }
    }

    fn save(&self, key: &str, value: &str) -> Result<(), SandboxError> {
        let path = self.path(key);
        std::fs::write(&path, value)
            .map_err(|e| SandboxError::BackendUnavailable(format!("write {}: {}", key, e)))?;
        set_file_permissions_0600(&path)
    }
}

/// Set file permissions to 0600 (owner read/write only) on Unix.
/// No-op on non-Unix platforms.
fn set_file_permissions_0600(path: &Path) -> Result<(), SandboxError> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
            .map_err(|e| SandboxError::BackendUnavailable(format!("chmod: {}", e)))?;
    }
    #[cfg(not(unix))]
    {
        let _ = path;
    }
    Ok(())
}

/// A value that can live in a [`TypedStore`].
pub trait Persisted: Serialize + Clone + Send + 'static {
    /// Recover a value from untrusted JSON, using `initial` as the schema.
    ///
    /// Returns `None` when nothing usable is left.
    fn from_foreign(initial: &Self, value: Value) -> Option<Self>;
}

impl Persisted for Vec<SourceFile> {
    fn from_foreign(_initial: &Self, value: Value) -> Option<Self> {
        let salvaged = salvage_files(&value);
        if salvaged.dropped > 0 {
            tracing::debug!(dropped = salvaged.dropped, "dropped malformed file entries");
        }
        (!salvaged.files.is_empty()).then_some(salvaged.files)
    }
}

impl Persisted for Linker {
    fn from_foreign(_initial: &Self, value: Value) -> Option<Self> {
        value.as_str().and_then(Linker::parse)
    }
}

impl Persisted for PrimaryOptions {
    fn from_foreign(initial: &Self, value: Value) -> Option<Self> {
        Some(reconcile(initial, &value))
    }
}

impl Persisted for AlternateOptions {
    fn from_foreign(initial: &Self, value: Value) -> Option<Self> {
        Some(reconcile(initial, &value))
    }
}

/// Where a store's initial value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Seed {
    /// A URL query token.
    Url,
    /// The persistence backend.
    Backend,
    /// The built-in initial value.
    Initial,
}

/// Persistent cell for one key.
pub struct TypedStore<T: Persisted> {
    key: String,
    backend: Arc<dyn StorageBackend>,
    degraded: bool,
    _value: PhantomData<fn() -> T>,
}

impl<T: Persisted> fmt::Debug for TypedStore<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypedStore")
            .field("key", &self.key)
            .field("degraded", &self.degraded)
            .finish()
    }
}

impl<T: Persisted> TypedStore<T> {
    /// Open the store for `key` and compute its seed value.
    pub fn open(
        key: impl Into<String>,
        initial: T,
        location: &PageLocation,
        backend: Arc<dyn StorageBackend>,
    ) -> (Self, T, Seed) {
        let key = key.into();
        let (value, seed) = seed_value(&key, initial, location, backend.as_ref());
        tracing::debug!(key = %key, ?seed, "store opened");

        let store = Self {
            key,
            backend,
            degraded: false,
            _value: PhantomData,
        };
        (store, value, seed)
    }

    /// The storage key.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// True while the backend is rejecting writes.
    pub fn is_degraded(&self) -> bool {
        self.degraded
    }

    /// Write the full value back.
    ///
    /// Every call reaches the backend, so the last value written wins once
    /// the backend recovers. Reporting a failure to the user is the caller's
    /// job.
    pub fn write(&mut self, value: &T) -> Result<(), SandboxError> {
        let result = serde_json::to_string(value)
            .map_err(|e| SandboxError::BackendUnavailable(format!("serialize: {}", e)))
            .and_then(|raw| self.backend.save(&self.key, &raw));

        match &result {
            Err(e) if !self.degraded => {
                tracing::warn!(key = %self.key, error = %e, "write-back failed, keeping state in memory");
                self.degraded = true;
            }
            Err(e) => tracing::debug!(key = %self.key, error = %e, "write-back still failing"),
            Ok(()) if self.degraded => {
                tracing::info!(key = %self.key, "write-back recovered");
                self.degraded = false;
            }
            Ok(()) => {}
        }
        result
    }
}

fn seed_value<T: Persisted>(
    key: &str,
    initial: T,
    location: &PageLocation,
    backend: &dyn StorageBackend,
) -> (T, Seed) {
    if let Some(token) = location.token(key) {
        match codec::decode_json(token) {
            Ok(value) => match T::from_foreign(&initial, value) {
                Some(value) => return (value, Seed::Url),
                None => tracing::debug!(key, "URL value has no usable content"),
            },
            Err(e) => tracing::warn!(key, error = %e, "ignoring URL token"),
        }
    }

    match backend.load(key) {
        Ok(Some(raw)) => match serde_json::from_str::<Value>(&raw) {
            Ok(value) => {
                if let Some(value) = T::from_foreign(&initial, value) {
                    return (value, Seed::Backend);
                }
                tracing::debug!(key, "stored value has no usable content");
            }
            Err(e) => tracing::warn!(key, error = %e, "ignoring unparseable stored value"),
        },
        Ok(None) => {}
        Err(e) => tracing::warn!(key, error = %e, "storage read failed"),
    }

    (initial, Seed::Initial)
}
