//! Session - the application context for one sandbox.
//!
//! [`Session`] owns everything the sandbox needs at runtime: the project, the
//! four typed stores, the history state machine, the navigator, the share
//! client, and the output area. Callers pass it around by reference instead
//! of reaching for globals.
//!
//! # Architecture
//!
//! ```text
//! mutate(f) → Project → Commit ─┬→ TypedStore write-back (once per touched key)
//!                               └→ HistoryState (LocalCommit) → Navigator
//!
//! navigate(path) → HistoryState (Navigated) → ShareClient::fetch
//!                → Project::apply_loaded (if still the latest navigation)
//! ```
//!
//! # Concurrency
//!
//! State lives behind one async mutex that is never held across a network
//! round trip. Every navigation and every local edit takes a generation
//! number; a fetch result is applied only if nothing newer happened in the
//! meantime, so a load never overwrites an edit made while it was in flight.

use sandbox_core::{
    default_files, Action, AlternateOptions, Commit, Compiler, Event, HistoryState,
    PrimaryOptions, Project,
};
use sandbox_types::{Linker, SandboxError, ShareHandle, SourceFile};
use std::mem;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use url::Url;

use crate::location::{permalink, PageLocation};
use crate::navigator::Navigator;
use crate::share::{ClientError, ShareClient};
use crate::store::{StorageBackend, TypedStore};
use crate::transport::ShareTransport;

/// Storage key of the file list.
pub const FILES_KEY: &str = "files";

/// Storage key of the linker selection.
pub const LINKER_KEY: &str = "linker";

/// Text shown in the output area before anything ran.
pub const DEFAULT_OUTPUT: &str = "output goes here";

/// Configuration for a [`Session`].
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Files used when nothing is stored.
    pub initial_files: Vec<SourceFile>,
    /// Linker used when nothing is stored.
    pub initial_linker: Linker,
    /// Initial contents of the output area.
    pub initial_output: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            initial_files: default_files(),
            initial_linker: Linker::default(),
            initial_output: DEFAULT_OUTPUT.to_string(),
        }
    }
}

impl SessionConfig {
    /// Create a configuration with the default project.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the files used when nothing is stored.
    pub fn with_files(mut self, files: Vec<SourceFile>) -> Self {
        self.initial_files = files;
        self
    }

    /// Set the linker used when nothing is stored.
    pub fn with_linker(mut self, linker: Linker) -> Self {
        self.initial_linker = linker;
        self
    }

    /// Set the initial output text.
    pub fn with_output(mut self, output: &str) -> Self {
        self.initial_output = output.to_string();
        self
    }
}

/// Outcome of [`Session::navigate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    /// The snapshot behind this handle was loaded.
    Loaded(ShareHandle),
    /// The path carries no handle; the active handle was cleared.
    Cleared,
    /// A newer navigation started before the fetch finished; its result was dropped.
    Superseded,
}

struct Stores {
    files: TypedStore<Vec<SourceFile>>,
    linker: TypedStore<Linker>,
    primary: TypedStore<PrimaryOptions>,
    alternate: TypedStore<AlternateOptions>,
}

impl Stores {
    fn open(
        config: &SessionConfig,
        location: &PageLocation,
        backend: Arc<dyn StorageBackend>,
    ) -> (Self, Project) {
        let (files, files_value, _) = TypedStore::open(
            FILES_KEY,
            config.initial_files.clone(),
            location,
            Arc::clone(&backend),
        );
        let (linker, linker_value, _) = TypedStore::open(
            LINKER_KEY,
            config.initial_linker,
            location,
            Arc::clone(&backend),
        );
        let (primary, primary_value, _) = TypedStore::open(
            Linker::Primary.options_key(),
            PrimaryOptions::default(),
            location,
            Arc::clone(&backend),
        );
        let (alternate, alternate_value, _) = TypedStore::open(
            Linker::Alternate.options_key(),
            AlternateOptions::default(),
            location,
            backend,
        );

        let project = Project::from_parts(files_value, linker_value, primary_value, alternate_value);
        let stores = Self {
            files,
            linker,
            primary,
            alternate,
        };
        (stores, project)
    }

    /// Write every touched key once. Returns the first failure.
    fn persist(&mut self, project: &Project, commit: Commit) -> Option<SandboxError> {
        let results = [
            commit
                .files
                .then(|| self.files.write(&project.files().to_vec())),
            commit.linker.then(|| self.linker.write(&project.linker())),
            commit
                .primary
                .then(|| self.primary.write(project.primary_options())),
            commit
                .alternate
                .then(|| self.alternate.write(project.alternate_options())),
        ];
        results.into_iter().flatten().find_map(Result::err)
    }
}

struct SessionState {
    project: Project,
    stores: Stores,
    history: HistoryState,
    output: String,
    storage_reported: bool,
}

impl SessionState {
    fn step(&mut self, event: Event) -> Vec<Action> {
        let (next, actions) = mem::take(&mut self.history).on_event(event);
        self.history = next;
        actions
    }

    fn write_back(&mut self, commit: Commit) {
        if commit.is_empty() {
            return;
        }
        if let Some(e) = self.stores.persist(&self.project, commit) {
            if !self.storage_reported {
                self.output = format!("storage unavailable: {}", e);
                self.storage_reported = true;
            }
        }
    }
}

/// The sandbox application context.
pub struct Session<T: ShareTransport, N: Navigator> {
    state: Mutex<SessionState>,
    generation: AtomicU64,
    share: ShareClient<T>,
    navigator: N,
}

impl<T: ShareTransport, N: Navigator> Session<T, N> {
    /// Seed every store from `location` and the backend, then load the share
    /// named by the location's path, if any.
    pub async fn open(
        config: SessionConfig,
        transport: T,
        backend: Arc<dyn StorageBackend>,
        navigator: N,
        location: &PageLocation,
    ) -> Self {
        let (stores, project) = Stores::open(&config, location, backend);
        let session = Self {
            state: Mutex::new(SessionState {
                project,
                stores,
                history: HistoryState::new(),
                output: config.initial_output,
                storage_reported: false,
            }),
            generation: AtomicU64::new(0),
            share: ShareClient::new(transport),
            navigator,
        };

        if location.handle().is_some() {
            if let Err(e) = session.navigate(location.path()).await {
                tracing::warn!(path = location.path(), error = %e, "initial share load failed");
            }
        }
        session
    }

    /// Apply a local edit.
    ///
    /// Whatever `f` touches is written back once per key, and the first
    /// write-back after a publish drops the handle from the navigation entry.
    /// A fetch still in flight is superseded.
    pub async fn mutate<R>(&self, f: impl FnOnce(&mut Project) -> R) -> R {
        let mut state = self.state.lock().await;
        let result = f(&mut state.project);

        let commit = state.project.take_commit();
        if !commit.is_empty() {
            self.generation.fetch_add(1, Ordering::SeqCst);
            state.write_back(commit);
            let actions = state.step(Event::LocalCommit);
            self.apply(actions);
        }
        result
    }

    /// Publish the project as it is right now.
    ///
    /// Edits made while the request is in flight are not included, but the
    /// handle is still recorded; the next edit clears it again. A failure is
    /// written to the output area and changes nothing else.
    pub async fn publish(&self) -> Result<ShareHandle, ClientError> {
        let envelope = self.state.lock().await.project.to_envelope();
        let result = self.share.publish(&envelope).await;

        let mut state = self.state.lock().await;
        match result {
            Ok(handle) => {
                let actions = state.step(Event::PublishSucceeded {
                    handle: handle.clone(),
                });
                self.apply(actions);
                Ok(handle)
            }
            Err(e) => {
                state.output = match e.status() {
                    Some(status) => format!("share failed: {}", status),
                    None => format!("share failed: {}", e),
                };
                Err(e)
            }
        }
    }

    /// React to the user moving to `path` (back/forward or an opened link).
    ///
    /// A handle-bearing path fetches the share and replaces the project with
    /// it; the loaded state is persisted but does not count as a local edit.
    /// Only the most recent navigation ever applies its result, and only if
    /// no local edit happened while it was fetching.
    pub async fn navigate(&self, path: &str) -> Result<Navigation, ClientError> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let handle = PageLocation::parse(path)
            .ok()
            .and_then(|location| location.handle().cloned());

        let actions = self.state.lock().await.step(Event::Navigated { handle });
        let Some(handle) = actions.into_iter().find_map(|action| match action {
            Action::Fetch { handle } => Some(handle),
            _ => None,
        }) else {
            return Ok(Navigation::Cleared);
        };

        let fetched = self.share.fetch(&handle).await;

        let mut state = self.state.lock().await;
        if self.generation.load(Ordering::SeqCst) != generation {
            tracing::debug!(handle = %handle, "discarding superseded fetch");
            return Ok(Navigation::Superseded);
        }

        match fetched {
            Ok(loaded) => {
                state.project.apply_loaded(loaded);
                let commit = state.project.take_commit();
                state.write_back(commit);
                tracing::info!(handle = %handle, "loaded share");
                Ok(Navigation::Loaded(handle))
            }
            Err(e) => {
                state.step(Event::Navigated { handle: None });
                state.output = format!("load failed: {}", e);
                Err(e)
            }
        }
    }

    /// Push `path` onto the navigator and navigate to it.
    pub async fn visit(&self, path: &str) -> Result<Navigation, ClientError> {
        self.navigator.push(path);
        self.navigate(path).await
    }

    /// Compile the project and show the result in the output area.
    pub async fn run<C: Compiler + ?Sized>(&self, compiler: &C) -> Result<String, String> {
        let mut state = self.state.lock().await;
        let input = state.project.compile_input();
        let result = compiler.compile(&input);
        state.output = match &result {
            Ok(output) => output.clone(),
            Err(diagnostic) => diagnostic.clone(),
        };
        result
    }

    /// URL that reproduces the live project.
    pub async fn permalink(&self, base: &Url) -> Result<Url, serde_json::Error> {
        let state = self.state.lock().await;
        permalink(base, &state.project)
    }

    /// A copy of the project.
    pub async fn snapshot(&self) -> Project {
        self.state.lock().await.project.clone()
    }

    /// Contents of the output area.
    pub async fn output(&self) -> String {
        self.state.lock().await.output.clone()
    }

    /// The active share handle, if the project still matches one.
    pub async fn active_handle(&self) -> Option<ShareHandle> {
        self.state.lock().await.history.active_handle().cloned()
    }

    /// The navigator.
    pub fn navigator(&self) -> &N {
        &self.navigator
    }

    fn apply(&self, actions: Vec<Action>) {
        for action in actions {
            match action {
                Action::PushEntry { path } => self.navigator.push(&path),
                Action::ReplaceEntry { path } => self.navigator.replace(&path),
                Action::Fetch { handle } => {
                    tracing::debug!(handle = %handle, "fetch requested outside navigation, ignored")
                }
            }
        }
    }
}
