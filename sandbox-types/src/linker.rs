//! Linker selection.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The linker backend a project is compiled with.
///
/// Each linker has its own options schema; the active one is persisted and
/// sent to the compiler.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Linker {
    /// The in-process WESL linker.
    #[default]
    Primary,
    /// The external linker.
    Alternate,
}

impl Linker {
    /// Every known linker, in display order.
    pub const ALL: [Linker; 2] = [Linker::Primary, Linker::Alternate];

    /// Parse a wire identifier. Unknown identifiers yield `None`.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "primary" => Some(Linker::Primary),
            "alternate" => Some(Linker::Alternate),
            _ => None,
        }
    }

    /// Wire identifier of this linker.
    pub fn as_str(&self) -> &'static str {
        match self {
            Linker::Primary => "primary",
            Linker::Alternate => "alternate",
        }
    }

    /// Local storage key holding this linker's options record.
    pub fn options_key(&self) -> &'static str {
        match self {
            Linker::Primary => "options-primary",
            Linker::Alternate => "options-alternate",
        }
    }
}

impl fmt::Display for Linker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Linker {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Linker::parse(s).ok_or_else(|| format!("unknown linker: {s} (expected primary or alternate)"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linker_roundtrip() {
        for linker in Linker::ALL {
            assert_eq!(Linker::parse(linker.as_str()), Some(linker));
        }
    }

    #[test]
    fn unknown_linker_is_none() {
        assert_eq!(Linker::parse(""), None);
        assert_eq!(Linker::parse("Primary"), None);
        assert_eq!(Linker::parse("wesl-js"), None);
    }

    #[test]
    fn serde_uses_wire_identifiers() {
        assert_eq!(serde_json::to_string(&Linker::Alternate).unwrap(), "\"alternate\"");
        let parsed: Linker = serde_json::from_str("\"primary\"").unwrap();
        assert_eq!(parsed, Linker::Primary);
    }

    #[test]
    fn options_keys_are_distinct() {
        assert_eq!(Linker::Primary.options_key(), "options-primary");
        assert_eq!(Linker::Alternate.options_key(), "options-alternate");
    }

    #[test]
    fn from_str_reports_unknown() {
        let err = "gcc".parse::<Linker>().unwrap_err();
        assert!(err.contains("gcc"));
    }
}
