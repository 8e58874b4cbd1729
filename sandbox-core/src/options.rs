//! Linker option schemas.
//!
//! Each linker has one flat options record whose field names, primitive
//! types, and defaults are fixed here. Records loaded from outside the
//! process never reach these types directly; they pass through
//! [`crate::reconcile`] first.

use sandbox_types::Linker;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::fmt::Debug;

/// A typed, flat options record belonging to one linker.
pub trait OptionsRecord:
    Serialize + DeserializeOwned + Clone + Default + PartialEq + Debug + Send + Sync + 'static
{
    /// The linker this schema belongs to.
    const LINKER: Linker;
}

/// Name mangling scheme of the in-process linker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mangler {
    /// Escape path separators into the identifier.
    #[default]
    Escape,
    /// Append a hash of the module path.
    Hash,
    /// Leave identifiers untouched.
    None,
}

/// Options of the in-process WESL linker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrimaryOptions {
    /// Root module the compilation starts from.
    pub root: String,
    /// Name mangling scheme.
    pub mangler: Mangler,
    /// Resolve `import` statements.
    pub imports: bool,
    /// Evaluate conditional compilation attributes.
    pub condcomp: bool,
    /// Strip declarations unreachable from the entry points.
    pub strip: bool,
    /// Lower WESL extensions to plain WGSL.
    pub lower: bool,
    /// Validate the linked output.
    pub validate: bool,
    /// Constant expression to evaluate against the output; empty for none.
    pub eval: String,
}

impl Default for PrimaryOptions {
    fn default() -> Self {
        Self {
            root: "main.wgsl".to_string(),
            mangler: Mangler::Escape,
            imports: true,
            condcomp: true,
            strip: false,
            lower: false,
            validate: true,
            eval: String::new(),
        }
    }
}

impl OptionsRecord for PrimaryOptions {
    const LINKER: Linker = Linker::Primary;
}

/// Name mangling scheme of the external linker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlternateMangler {
    /// Join path segments with underscores.
    #[default]
    Underscore,
    /// Leave identifiers untouched.
    None,
}

/// Options of the external linker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlternateOptions {
    /// Root module the compilation starts from.
    pub root: String,
    /// Name mangling scheme.
    pub mangler: AlternateMangler,
    /// Evaluate `@if` conditions.
    pub conditions: bool,
    /// Validate the linked output.
    pub validate: bool,
}

impl Default for AlternateOptions {
    fn default() -> Self {
        Self {
            root: "main.wgsl".to_string(),
            mangler: AlternateMangler::Underscore,
            conditions: true,
            validate: true,
        }
    }
}

impl OptionsRecord for AlternateOptions {
    const LINKER: Linker = Linker::Alternate;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    #[test]
    fn primary_defaults_serialize_flat() {
        let value = serde_json::to_value(PrimaryOptions::default()).unwrap();
        assert_eq!(
            value,
            json!({
                "root": "main.wgsl",
                "mangler": "escape",
                "imports": true,
                "condcomp": true,
                "strip": false,
                "lower": false,
                "validate": true,
                "eval": "",
            })
        );
    }

    #[test]
    fn every_field_is_primitive() {
        for value in [
            serde_json::to_value(PrimaryOptions::default()).unwrap(),
            serde_json::to_value(AlternateOptions::default()).unwrap(),
        ] {
            let object = value.as_object().unwrap();
            assert!(object
                .values()
                .all(|v| matches!(v, Value::Bool(_) | Value::String(_))));
        }
    }

    #[test]
    fn linkers_are_associated() {
        assert_eq!(PrimaryOptions::LINKER, Linker::Primary);
        assert_eq!(AlternateOptions::LINKER, Linker::Alternate);
    }

    #[test]
    fn unknown_mangler_does_not_deserialize() {
        let result: Result<PrimaryOptions, _> = serde_json::from_value(json!({"mangler": "rot13"}));
        assert!(result.is_err());
    }
}
