//! Envelope - the JSON shape exchanged with the share service and local storage.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{salvage_files, Linker, SandboxError, SourceFile};

/// A project snapshot as it is published.
///
/// `options` holds the active linker's record. It is untyped on the wire and
/// only trusted after reconciliation against a live record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Project files in order.
    pub files: Vec<SourceFile>,
    /// Active linker.
    pub linker: Linker,
    /// Options for the active linker.
    pub options: Value,
}

impl Envelope {
    /// Create a new envelope.
    pub fn new(files: Vec<SourceFile>, linker: Linker, options: Value) -> Self {
        Self {
            files,
            linker,
            options,
        }
    }

    /// Serialize to a JSON string.
    pub fn to_json(&self) -> Result<String, SandboxError> {
        serde_json::to_string(self).map_err(|e| SandboxError::MalformedEnvelope(e.to_string()))
    }
}

/// What could be recovered from an untrusted envelope.
///
/// Produced by [`salvage_envelope`]. `linker` is `None` when absent or not a
/// recognized identifier; `options` is `None` when absent or not an object.
#[derive(Debug, Clone, PartialEq)]
pub struct SalvagedEnvelope {
    /// Well-shaped files, in order. Never empty.
    pub files: Vec<SourceFile>,
    /// Recognized linker selection, if any.
    pub linker: Option<Linker>,
    /// Raw options object, still untrusted.
    pub options: Option<Value>,
    /// Number of file entries discarded during salvage.
    pub dropped: usize,
}

/// Parse and salvage an envelope from a JSON body.
///
/// Fails with [`SandboxError::MalformedEnvelope`] when the body is not JSON.
/// See [`salvage_value`] for the shape rules.
pub fn salvage_envelope(body: &str) -> Result<SalvagedEnvelope, SandboxError> {
    let value: Value = serde_json::from_str(body)
        .map_err(|e| SandboxError::MalformedEnvelope(format!("json parse: {}", e)))?;
    salvage_value(value)
}

/// Salvage an already-parsed envelope.
///
/// The value must be an object with a `files` array. Malformed file entries
/// are dropped rather than failing the load, but at least one entry must
/// survive.
pub fn salvage_value(value: Value) -> Result<SalvagedEnvelope, SandboxError> {
    let Value::Object(mut object) = value else {
        return Err(SandboxError::MalformedEnvelope(
            "envelope is not an object".into(),
        ));
    };

    let files = match object.get("files") {
        Some(files @ Value::Array(_)) => salvage_files(files),
        _ => {
            return Err(SandboxError::MalformedEnvelope(
                "missing files array".into(),
            ))
        }
    };

    if files.files.is_empty() {
        return Err(SandboxError::MalformedEnvelope(format!(
            "no usable files ({} dropped)",
            files.dropped
        )));
    }

    let linker = object
        .get("linker")
        .and_then(Value::as_str)
        .and_then(Linker::parse);

    let options = match object.remove("options") {
        Some(options @ Value::Object(_)) => Some(options),
        _ => None,
    };

    Ok(SalvagedEnvelope {
        files: files.files,
        linker,
        options,
        dropped: files.dropped,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn envelope_json_shape() {
        let envelope = Envelope::new(
            vec![SourceFile::new("main.wgsl", "fn f(){}")],
            Linker::Primary,
            json!({"strip": false}),
        );

        let value: Value = serde_json::from_str(&envelope.to_json().unwrap()).unwrap();
        assert_eq!(
            value,
            json!({
                "files": [{"name": "main.wgsl", "source": "fn f(){}"}],
                "linker": "primary",
                "options": {"strip": false},
            })
        );
    }

    #[test]
    fn salvage_roundtrips_a_published_envelope() {
        let envelope = Envelope::new(
            vec![SourceFile::new("main.wgsl", "fn f(){}")],
            Linker::Alternate,
            json!({"validate": true}),
        );
        let salvaged = salvage_envelope(&envelope.to_json().unwrap()).unwrap();

        assert_eq!(salvaged.files, envelope.files);
        assert_eq!(salvaged.linker, Some(Linker::Alternate));
        assert_eq!(salvaged.options, Some(json!({"validate": true})));
        assert_eq!(salvaged.dropped, 0);
    }

    #[test]
    fn salvage_drops_malformed_entries() {
        let body = r#"{"files": [{"name":"a.wgsl"}, {"name":"b.wgsl", "source":"x"}]}"#;
        let salvaged = salvage_envelope(body).unwrap();

        assert_eq!(salvaged.files, vec![SourceFile::new("b.wgsl", "x")]);
        assert_eq!(salvaged.dropped, 1);
        assert_eq!(salvaged.linker, None);
        assert_eq!(salvaged.options, None);
    }

    #[test]
    fn not_json_is_malformed() {
        let result = salvage_envelope("<html>502</html>");
        assert!(matches!(result, Err(SandboxError::MalformedEnvelope(_))));
    }

    #[test]
    fn missing_files_is_malformed() {
        assert!(matches!(
            salvage_envelope(r#"{"linker":"primary"}"#),
            Err(SandboxError::MalformedEnvelope(_))
        ));
        assert!(matches!(
            salvage_envelope(r#"{"files":{"name":"a"}}"#),
            Err(SandboxError::MalformedEnvelope(_))
        ));
        assert!(matches!(
            salvage_envelope("[]"),
            Err(SandboxError::MalformedEnvelope(_))
        ));
    }

    #[test]
    fn nothing_recoverable_is_malformed() {
        let result = salvage_envelope(r#"{"files":[{"name":"a.wgsl"}]}"#);
        assert!(matches!(result, Err(SandboxError::MalformedEnvelope(_))));
    }

    #[test]
    fn unknown_linker_is_dropped() {
        let body = r#"{"files":[{"name":"a","source":""}],"linker":"gcc","options":{}}"#;
        let salvaged = salvage_envelope(body).unwrap();
        assert_eq!(salvaged.linker, None);
        assert_eq!(salvaged.options, Some(json!({})));
    }

    #[test]
    fn non_object_options_are_dropped() {
        let body = r#"{"files":[{"name":"a","source":""}],"options":[1,2]}"#;
        assert_eq!(salvage_envelope(body).unwrap().options, None);
    }
}
