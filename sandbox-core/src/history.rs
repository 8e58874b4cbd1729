//! Navigation history state machine.
//!
//! This module provides a pure, side-effect-free state machine that keeps the
//! navigation stack and the "active share handle" flag consistent. It takes
//! events as input and produces a new state plus a list of actions to execute.
//!
//! The actual navigation (pushing entries, fetching shares) is performed by
//! the client session, not by this module.

use sandbox_types::ShareHandle;

/// Path of the navigation entry that carries no handle.
pub const ROOT_PATH: &str = "/";

/// History state - NO I/O, just state transitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryState {
    /// The live project is not known to match any published snapshot.
    NoActiveHandle,
    /// The live project matches the snapshot named by this handle.
    ActiveHandle(ShareHandle),
}

impl HistoryState {
    /// Create a new state machine with no active handle.
    pub fn new() -> Self {
        Self::NoActiveHandle
    }

    /// Process an event and return the new state plus actions to execute.
    pub fn on_event(self, event: Event) -> (Self, Vec<Action>) {
        match (self, event) {
            // A publish always starts a fresh entry, even over an active one.
            (_, Event::PublishSucceeded { handle }) => {
                let path = handle.to_path();
                (Self::ActiveHandle(handle), vec![Action::PushEntry { path }])
            }

            // First local write-back after a handle exists.
            (Self::ActiveHandle(_), Event::LocalCommit) => (
                Self::NoActiveHandle,
                vec![Action::ReplaceEntry {
                    path: ROOT_PATH.to_string(),
                }],
            ),
            (Self::NoActiveHandle, Event::LocalCommit) => (Self::NoActiveHandle, vec![]),

            (_, Event::Navigated { handle: Some(handle) }) => (
                Self::ActiveHandle(handle.clone()),
                vec![Action::Fetch { handle }],
            ),
            (_, Event::Navigated { handle: None }) => (Self::NoActiveHandle, vec![]),
        }
    }

    /// The active handle, if any.
    pub fn active_handle(&self) -> Option<&ShareHandle> {
        match self {
            Self::ActiveHandle(handle) => Some(handle),
            Self::NoActiveHandle => None,
        }
    }

    /// Check if a handle is active.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::ActiveHandle(_))
    }
}

impl Default for HistoryState {
    fn default() -> Self {
        Self::new()
    }
}

/// Events that drive the history state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// The share service issued a handle for a publish.
    PublishSucceeded {
        /// The issued handle.
        handle: ShareHandle,
    },
    /// A local mutation was written back.
    LocalCommit,
    /// The user navigated (back/forward or explicit load).
    Navigated {
        /// Handle encoded in the destination path, if any.
        handle: Option<ShareHandle>,
    },
}

/// Actions to be executed by the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Push a new navigation entry.
    PushEntry {
        /// Path of the new entry.
        path: String,
    },
    /// Replace the current navigation entry.
    ReplaceEntry {
        /// Path of the replacement entry.
        path: String,
    },
    /// Fetch a published snapshot and load it.
    Fetch {
        /// Handle to fetch.
        handle: ShareHandle,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handle(s: &str) -> ShareHandle {
        ShareHandle::parse(s).unwrap()
    }

    #[test]
    fn starts_without_handle() {
        let state = HistoryState::new();
        assert!(!state.is_active());
        assert_eq!(state.active_handle(), None);
    }

    #[test]
    fn publish_pushes_handle_path() {
        let (state, actions) = HistoryState::new().on_event(Event::PublishSucceeded {
            handle: handle("ab12"),
        });

        assert_eq!(state, HistoryState::ActiveHandle(handle("ab12")));
        assert_eq!(
            actions,
            vec![Action::PushEntry {
                path: "/s/ab12".into()
            }]
        );
    }

    #[test]
    fn second_publish_pushes_again() {
        let state = HistoryState::ActiveHandle(handle("ab12"));
        let (state, actions) = state.on_event(Event::PublishSucceeded {
            handle: handle("cd34"),
        });

        assert_eq!(state.active_handle(), Some(&handle("cd34")));
        assert!(matches!(&actions[..], [Action::PushEntry { path }] if path == "/s/cd34"));
    }

    #[test]
    fn first_commit_after_publish_replaces_entry_once() {
        let state = HistoryState::ActiveHandle(handle("ab12"));

        let (state, actions) = state.on_event(Event::LocalCommit);
        assert_eq!(state, HistoryState::NoActiveHandle);
        assert_eq!(actions, vec![Action::ReplaceEntry { path: "/".into() }]);

        // Subsequent keystrokes cause no history churn.
        let (state, actions) = state.on_event(Event::LocalCommit);
        assert_eq!(state, HistoryState::NoActiveHandle);
        assert!(actions.is_empty());
    }

    #[test]
    fn navigate_to_handle_fetches() {
        let (state, actions) = HistoryState::new().on_event(Event::Navigated {
            handle: Some(handle("ab12")),
        });

        assert!(state.is_active());
        assert_eq!(
            actions,
            vec![Action::Fetch {
                handle: handle("ab12")
            }]
        );
    }

    #[test]
    fn navigate_to_plain_path_clears_without_action() {
        let state = HistoryState::ActiveHandle(handle("ab12"));
        let (state, actions) = state.on_event(Event::Navigated { handle: None });

        assert_eq!(state, HistoryState::NoActiveHandle);
        assert!(actions.is_empty());
    }

    #[test]
    fn replaced_path_never_encodes_old_handle() {
        let (state, _) = HistoryState::new().on_event(Event::PublishSucceeded {
            handle: handle("ab12"),
        });
        let (_, actions) = state.on_event(Event::LocalCommit);

        for action in actions {
            if let Action::ReplaceEntry { path } = action {
                assert!(!path.contains("ab12"));
                assert_eq!(ShareHandle::from_path(&path), None);
            }
        }
    }
}
