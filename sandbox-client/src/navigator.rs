//! Navigation stack abstraction.

use std::sync::{Arc, Mutex, MutexGuard};

/// The host's navigation history.
///
/// `push` and `replace` are instructions from the session; moving back and
/// forward is the user's doing and is reported to the session separately.
pub trait Navigator: Send + Sync {
    /// Add an entry after the current one, discarding any forward entries.
    fn push(&self, path: &str);

    /// Overwrite the current entry.
    fn replace(&self, path: &str);

    /// Path of the current entry.
    fn current(&self) -> String;
}

/// In-memory back/forward stack.
#[derive(Debug, Clone)]
pub struct MemoryNavigator {
    inner: Arc<Mutex<NavigatorInner>>,
}

#[derive(Debug)]
struct NavigatorInner {
    entries: Vec<String>,
    index: usize,
}

impl MemoryNavigator {
    /// Start with a single entry.
    pub fn new(initial: &str) -> Self {
        Self {
            inner: Arc::new(Mutex::new(NavigatorInner {
                entries: vec![initial.to_string()],
                index: 0,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, NavigatorInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Step back. Returns the new current path, or `None` at the start.
    pub fn back(&self) -> Option<String> {
        let mut inner = self.lock();
        if inner.index == 0 {
            return None;
        }
        inner.index -= 1;
        Some(inner.entries[inner.index].clone())
    }

    /// Step forward. Returns the new current path, or `None` at the end.
    pub fn forward(&self) -> Option<String> {
        let mut inner = self.lock();
        if inner.index + 1 >= inner.entries.len() {
            return None;
        }
        inner.index += 1;
        Some(inner.entries[inner.index].clone())
    }

    /// All entries, oldest first.
    pub fn entries(&self) -> Vec<String> {
        self.lock().entries.clone()
    }
}

impl Default for MemoryNavigator {
    fn default() -> Self {
        Self::new("/")
    }
}

impl Navigator for MemoryNavigator {
    fn push(&self, path: &str) {
        let mut inner = self.lock();
        let keep = inner.index + 1;
        inner.entries.truncate(keep);
        inner.entries.push(path.to_string());
        inner.index = inner.entries.len() - 1;
    }

    fn replace(&self, path: &str) {
        let mut inner = self.lock();
        let index = inner.index;
        inner.entries[index] = path.to_string();
    }

    fn current(&self) -> String {
        let inner = self.lock();
        inner.entries[inner.index].clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_back_forward() {
        let nav = MemoryNavigator::default();
        nav.push("/s/ab12");
        nav.push("/s/cd34");

        assert_eq!(nav.current(), "/s/cd34");
        assert_eq!(nav.back(), Some("/s/ab12".into()));
        assert_eq!(nav.back(), Some("/".into()));
        assert_eq!(nav.back(), None);
        assert_eq!(nav.forward(), Some("/s/ab12".into()));
    }

    #[test]
    fn push_discards_forward_entries() {
        let nav = MemoryNavigator::default();
        nav.push("/s/ab12");
        nav.back();
        nav.push("/s/cd34");

        assert_eq!(nav.entries(), vec!["/".to_string(), "/s/cd34".to_string()]);
        assert_eq!(nav.forward(), None);
    }

    #[test]
    fn replace_overwrites_current() {
        let nav = MemoryNavigator::default();
        nav.push("/s/ab12");
        nav.replace("/");

        assert_eq!(nav.entries(), vec!["/".to_string(), "/".to_string()]);
        assert_eq!(nav.current(), "/");
    }
}
