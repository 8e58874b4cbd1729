//! Source files and salvage of untrusted file lists.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;

/// A named source file in the project.
///
/// Names are non-empty and unique within a project. Ordering is meaningful:
/// it drives tab position and the default root file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceFile {
    /// File name, e.g. `main.wgsl`.
    pub name: String,
    /// File contents.
    pub source: String,
}

impl SourceFile {
    /// Create a new source file.
    pub fn new(name: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
        }
    }
}

/// Result of filtering an untrusted file list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SalvagedFiles {
    /// Entries that had the right shape, in their original order.
    pub files: Vec<SourceFile>,
    /// Number of entries that were discarded.
    pub dropped: usize,
}

/// Keep only well-shaped entries of an untrusted file list.
///
/// An entry survives if it is an object with a non-empty string `name` and a
/// string `source`. Later duplicates of a name are dropped so the uniqueness
/// invariant holds. Extra keys on an entry are ignored. A value that is not an
/// array yields nothing.
pub fn salvage_files(value: &Value) -> SalvagedFiles {
    let Some(entries) = value.as_array() else {
        return SalvagedFiles::default();
    };

    let mut seen = HashSet::new();
    let mut salvaged = SalvagedFiles::default();

    for entry in entries {
        let name = entry.get("name").and_then(Value::as_str);
        let source = entry.get("source").and_then(Value::as_str);

        match (name, source) {
            (Some(name), Some(source)) if !name.is_empty() && seen.insert(name.to_string()) => {
                salvaged.files.push(SourceFile::new(name, source));
            }
            _ => salvaged.dropped += 1,
        }
    }

    salvaged
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn keeps_well_shaped_entries_in_order() {
        let value = json!([
            {"name": "a.wgsl", "source": "fn a() {}"},
            {"name": "b.wgsl", "source": ""},
        ]);
        let salvaged = salvage_files(&value);

        assert_eq!(salvaged.dropped, 0);
        assert_eq!(
            salvaged.files,
            vec![SourceFile::new("a.wgsl", "fn a() {}"), SourceFile::new("b.wgsl", "")]
        );
    }

    #[test]
    fn drops_entry_missing_source() {
        let value = json!([{"name": "a.wgsl"}, {"name": "b.wgsl", "source": "x"}]);
        let salvaged = salvage_files(&value);

        assert_eq!(salvaged.files, vec![SourceFile::new("b.wgsl", "x")]);
        assert_eq!(salvaged.dropped, 1);
    }

    #[test]
    fn drops_wrong_types_and_empty_names() {
        let value = json!([
            {"name": 3, "source": "x"},
            {"name": "", "source": "x"},
            {"name": "ok.wgsl", "source": ["not", "a", "string"]},
            "main.wgsl",
            null,
        ]);
        let salvaged = salvage_files(&value);

        assert!(salvaged.files.is_empty());
        assert_eq!(salvaged.dropped, 5);
    }

    #[test]
    fn duplicate_names_keep_first() {
        let value = json!([
            {"name": "a.wgsl", "source": "first"},
            {"name": "a.wgsl", "source": "second"},
        ]);
        let salvaged = salvage_files(&value);

        assert_eq!(salvaged.files, vec![SourceFile::new("a.wgsl", "first")]);
        assert_eq!(salvaged.dropped, 1);
    }

    #[test]
    fn non_array_yields_nothing() {
        assert_eq!(salvage_files(&json!({"name": "a"})), SalvagedFiles::default());
        assert_eq!(salvage_files(&json!(null)), SalvagedFiles::default());
    }

    #[test]
    fn extra_keys_are_ignored() {
        let value = json!([{"name": "a.wgsl", "source": "x", "pinned": true}]);
        assert_eq!(salvage_files(&value).files, vec![SourceFile::new("a.wgsl", "x")]);
    }
}
