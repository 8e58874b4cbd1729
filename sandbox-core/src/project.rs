//! The in-memory project model.
//!
//! [`Project`] is the single source of truth for the ordered file list, the
//! active linker, and both linker option records. Stores and the history
//! state machine only observe it: every mutation records what it touched in
//! a pending [`Commit`], and the owner drains that with
//! [`Project::take_commit`] once per logical update.
//!
//! Invariants held after every operation:
//! - the file list is never empty;
//! - file names are non-empty and unique;
//! - the current selection indexes an existing file.

use sandbox_types::{Envelope, Linker, SalvagedEnvelope, SourceFile};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::mem;
use thiserror::Error;

use crate::options::{AlternateOptions, OptionsRecord, PrimaryOptions};
use crate::reconcile::{parse_option_value, reconcile};

/// Name of the file reinserted when the last file is removed.
pub const FALLBACK_FILE_NAME: &str = "main.wgsl";

const DEFAULT_MAIN_SOURCE: &str = "import util/my_fn;\nfn main() -> u32 {\n    return my_fn();\n}\n";
const DEFAULT_UTIL_SOURCE: &str = "fn my_fn() -> u32 { return 42; }";

/// The files a fresh project starts with.
pub fn default_files() -> Vec<SourceFile> {
    vec![
        SourceFile::new("main.wgsl", DEFAULT_MAIN_SOURCE),
        SourceFile::new("util.wgsl", DEFAULT_UTIL_SOURCE),
    ]
}

/// Errors from project edits. None of them leave the project modified.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProjectError {
    /// A file name was empty.
    #[error("file name must not be empty")]
    EmptyName,

    /// A file with this name already exists.
    #[error("a file named {0:?} already exists")]
    DuplicateName(String),

    /// No file at the given position.
    #[error("no file at index {0}")]
    NoSuchIndex(usize),

    /// No file with the given name.
    #[error("no file named {0:?}")]
    NoSuchFile(String),

    /// The linker's schema has no such option.
    #[error("linker {linker} has no option {key:?}")]
    UnknownOption {
        /// Linker whose schema was consulted.
        linker: Linker,
        /// Requested option name.
        key: String,
    },

    /// The value does not fit the option's type.
    #[error("option {key:?} does not accept {value:?}")]
    RejectedValue {
        /// Option name.
        key: String,
        /// Raw value as typed.
        value: String,
    },
}

/// Which persisted parts of the project a mutation touched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Commit {
    /// The file list changed.
    pub files: bool,
    /// The linker selection changed.
    pub linker: bool,
    /// The primary options record changed.
    pub primary: bool,
    /// The alternate options record changed.
    pub alternate: bool,
}

impl Commit {
    /// True when nothing was touched.
    pub fn is_empty(&self) -> bool {
        !(self.files || self.linker || self.primary || self.alternate)
    }

    /// Whether the options record of `linker` was touched.
    pub fn options(&self, linker: Linker) -> bool {
        match linker {
            Linker::Primary => self.primary,
            Linker::Alternate => self.alternate,
        }
    }

    fn mark_options(&mut self, linker: Linker) {
        match linker {
            Linker::Primary => self.primary = true,
            Linker::Alternate => self.alternate = true,
        }
    }
}

/// Payload handed to the external compiler.
///
/// Serializes as `{ "linker": ..., "files": { name: source }, ...options }`
/// where the options are the active linker's record, flattened.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompileInput {
    /// Linker to compile with.
    pub linker: Linker,
    /// File contents by name.
    pub files: BTreeMap<String, String>,
    /// Active linker options.
    #[serde(flatten)]
    pub options: Map<String, Value>,
}

/// The external compiler.
///
/// Returns the compiled output, or a displayable diagnostic.
pub trait Compiler {
    /// Compile a project.
    fn compile(&self, input: &CompileInput) -> Result<String, String>;
}

/// Files, linker selection, and option records of one sandbox.
#[derive(Debug, Clone, PartialEq)]
pub struct Project {
    files: Vec<SourceFile>,
    linker: Linker,
    primary: PrimaryOptions,
    alternate: AlternateOptions,
    current: usize,
    pending: Commit,
}

impl Project {
    /// Create a project with the default files and options.
    pub fn new() -> Self {
        Self::from_parts(
            default_files(),
            Linker::default(),
            PrimaryOptions::default(),
            AlternateOptions::default(),
        )
    }

    /// Assemble a project from seeded values. Records no commit.
    pub fn from_parts(
        files: Vec<SourceFile>,
        linker: Linker,
        primary: PrimaryOptions,
        alternate: AlternateOptions,
    ) -> Self {
        Self {
            files: non_empty(files),
            linker,
            primary,
            alternate,
            current: 0,
            pending: Commit::default(),
        }
    }

    /// All files in order.
    pub fn files(&self) -> &[SourceFile] {
        &self.files
    }

    /// Look up a file by name.
    pub fn file(&self, name: &str) -> Option<&SourceFile> {
        self.files.iter().find(|f| f.name == name)
    }

    /// Position of a file by name.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.files.iter().position(|f| f.name == name)
    }

    /// Index of the selected file.
    pub fn current_index(&self) -> usize {
        self.current
    }

    /// The selected file.
    pub fn current_file(&self) -> &SourceFile {
        &self.files[self.current]
    }

    /// Select a file by index. Selection is not persisted.
    pub fn select(&mut self, index: usize) -> Result<(), ProjectError> {
        self.check_index(index)?;
        self.current = index;
        Ok(())
    }

    /// Select a file by name.
    pub fn select_name(&mut self, name: &str) -> Result<(), ProjectError> {
        let index = self
            .position(name)
            .ok_or_else(|| ProjectError::NoSuchFile(name.to_string()))?;
        self.current = index;
        Ok(())
    }

    /// Append a file and select it. Returns its index.
    pub fn add_file(
        &mut self,
        name: impl Into<String>,
        source: impl Into<String>,
    ) -> Result<usize, ProjectError> {
        let name = name.into();
        self.check_new_name(&name)?;

        self.files.push(SourceFile::new(name, source));
        self.current = self.files.len() - 1;
        self.pending.files = true;
        Ok(self.current)
    }

    /// Append an empty file under the first free `untitled-N.wgsl` name and
    /// select it. Returns its index.
    pub fn new_file(&mut self) -> usize {
        let name = (1..)
            .map(|n| format!("untitled-{}.wgsl", n))
            .find(|name| self.file(name).is_none())
            .unwrap_or_default();

        self.files.push(SourceFile::new(name, ""));
        self.current = self.files.len() - 1;
        self.pending.files = true;
        self.current
    }

    /// Rename the file at `index`.
    pub fn rename_file(&mut self, index: usize, name: impl Into<String>) -> Result<(), ProjectError> {
        self.check_index(index)?;
        let name = name.into();
        if self.files[index].name == name {
            return Ok(());
        }
        self.check_new_name(&name)?;

        self.files[index].name = name;
        self.pending.files = true;
        Ok(())
    }

    /// Replace the source of the file at `index`.
    pub fn set_source(&mut self, index: usize, source: impl Into<String>) -> Result<(), ProjectError> {
        self.check_index(index)?;
        let source = source.into();
        if self.files[index].source == source {
            return Ok(());
        }

        self.files[index].source = source;
        self.pending.files = true;
        Ok(())
    }

    /// Remove the file at `index` and return it.
    ///
    /// Removing the last file reinserts an empty [`FALLBACK_FILE_NAME`]. The
    /// selection stays on the same file where possible, otherwise moves to
    /// the nearest remaining one.
    pub fn remove_file(&mut self, index: usize) -> Result<SourceFile, ProjectError> {
        self.check_index(index)?;

        let removed = self.files.remove(index);
        if self.files.is_empty() {
            self.files.push(SourceFile::new(FALLBACK_FILE_NAME, ""));
        }
        if self.current > index {
            self.current -= 1;
        }
        self.current = self.current.min(self.files.len() - 1);

        self.pending.files = true;
        Ok(removed)
    }

    /// The active linker.
    pub fn linker(&self) -> Linker {
        self.linker
    }

    /// Switch the active linker.
    pub fn set_linker(&mut self, linker: Linker) {
        if self.linker != linker {
            self.linker = linker;
            self.pending.linker = true;
        }
    }

    /// Options of the in-process linker.
    pub fn primary_options(&self) -> &PrimaryOptions {
        &self.primary
    }

    /// Options of the external linker.
    pub fn alternate_options(&self) -> &AlternateOptions {
        &self.alternate
    }

    /// Edit the primary options in place.
    pub fn update_primary(&mut self, f: impl FnOnce(&mut PrimaryOptions)) {
        let mut next = self.primary.clone();
        f(&mut next);
        if next != self.primary {
            self.primary = next;
            self.pending.primary = true;
        }
    }

    /// Edit the alternate options in place.
    pub fn update_alternate(&mut self, f: impl FnOnce(&mut AlternateOptions)) {
        let mut next = self.alternate.clone();
        f(&mut next);
        if next != self.alternate {
            self.alternate = next;
            self.pending.alternate = true;
        }
    }

    /// Set one option of `linker` from a user-typed value.
    ///
    /// The value is read as a JSON literal when it parses as one, otherwise
    /// as a string, and goes through the same reconciliation as loaded data.
    pub fn set_option(&mut self, linker: Linker, key: &str, raw: &str) -> Result<(), ProjectError> {
        match linker {
            Linker::Primary => {
                let next = assign_option(&self.primary, key, raw)?;
                self.update_primary(|options| *options = next);
            }
            Linker::Alternate => {
                let next = assign_option(&self.alternate, key, raw)?;
                self.update_alternate(|options| *options = next);
            }
        }
        Ok(())
    }

    /// Options record of `linker` as JSON.
    pub fn options_value(&self, linker: Linker) -> Value {
        match linker {
            Linker::Primary => to_object(&self.primary),
            Linker::Alternate => to_object(&self.alternate),
        }
    }

    /// Options record of the active linker as JSON.
    pub fn active_options_value(&self) -> Value {
        self.options_value(self.linker)
    }

    /// Snapshot the project as a publishable envelope.
    pub fn to_envelope(&self) -> Envelope {
        Envelope::new(self.files.clone(), self.linker, self.active_options_value())
    }

    /// Replace the project with a loaded snapshot in one assignment.
    ///
    /// The linker is switched only when the snapshot names a known one. Its
    /// options are reconciled against the record of the resolved linker; the
    /// other record is left alone.
    pub fn apply_loaded(&mut self, loaded: SalvagedEnvelope) {
        let linker = loaded.linker.unwrap_or(self.linker);

        let mut primary = self.primary.clone();
        let mut alternate = self.alternate.clone();
        if let Some(options) = &loaded.options {
            match linker {
                Linker::Primary => primary = reconcile(&primary, options),
                Linker::Alternate => alternate = reconcile(&alternate, options),
            }
        }

        let mut pending = self.pending;
        pending.files |= loaded.files != self.files;
        pending.linker |= linker != self.linker;
        pending.primary |= primary != self.primary;
        pending.alternate |= alternate != self.alternate;

        *self = Self {
            files: non_empty(loaded.files),
            linker,
            primary,
            alternate,
            current: 0,
            pending,
        };
    }

    /// Drain what was touched since the last call.
    pub fn take_commit(&mut self) -> Commit {
        mem::take(&mut self.pending)
    }

    /// Shape the compiler payload for the active linker.
    pub fn compile_input(&self) -> CompileInput {
        let options = match self.active_options_value() {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        CompileInput {
            linker: self.linker,
            files: self
                .files
                .iter()
                .map(|f| (f.name.clone(), f.source.clone()))
                .collect(),
            options,
        }
    }

    fn check_index(&self, index: usize) -> Result<(), ProjectError> {
        if index < self.files.len() {
            Ok(())
        } else {
            Err(ProjectError::NoSuchIndex(index))
        }
    }

    fn check_new_name(&self, name: &str) -> Result<(), ProjectError> {
        if name.is_empty() {
            return Err(ProjectError::EmptyName);
        }
        if self.file(name).is_some() {
            return Err(ProjectError::DuplicateName(name.to_string()));
        }
        Ok(())
    }
}

impl Default for Project {
    fn default() -> Self {
        Self::new()
    }
}

fn non_empty(files: Vec<SourceFile>) -> Vec<SourceFile> {
    if files.is_empty() {
        vec![SourceFile::new(FALLBACK_FILE_NAME, "")]
    } else {
        files
    }
}

fn to_object<T: Serialize>(record: &T) -> Value {
    serde_json::to_value(record).unwrap_or_else(|_| Value::Object(Map::new()))
}

/// Apply one user-typed option value through the reconciler.
///
/// The literal reading is tried first, then the plain string, so `root=true`
/// still names a file called `true`.
fn assign_option<T: OptionsRecord>(current: &T, key: &str, raw: &str) -> Result<T, ProjectError> {
    let fields = to_object(current);
    if fields.get(key).is_none() {
        return Err(ProjectError::UnknownOption {
            linker: T::LINKER,
            key: key.to_string(),
        });
    }

    for candidate in [parse_option_value(raw), Value::String(raw.to_string())] {
        let mut foreign = Map::new();
        foreign.insert(key.to_string(), candidate.clone());

        let next = reconcile(current, &Value::Object(foreign));
        if to_object(&next).get(key) == Some(&candidate) {
            return Ok(next);
        }
    }

    Err(ProjectError::RejectedValue {
        key: key.to_string(),
        value: raw.to_string(),
    })
}
