//! URL token codec.
//!
//! Reversible transform between a text payload and a token that can be
//! embedded in a URL path or query component:
//!
//! ```text
//! text → UTF-8 → gzip → base64 (URL-safe alphabet, padded) → token
//! ```
//!
//! Decoding accepts both the URL-safe and the standard base64 alphabet, with or
//! without padding, so tokens produced by older links still load. Any failure
//! is reported as [`SandboxError::MalformedToken`]; callers treat it as "no
//! usable payload".

use base64::{
    alphabet,
    engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
    Engine,
};
use flate2::{read::GzDecoder, write::GzEncoder, Compression};
use sandbox_types::SandboxError;
use serde::Serialize;
use serde_json::Value;
use std::io::{Read, Write};

/// Upper bound on the decompressed size of a token (8 MiB).
pub const MAX_DECODED_LEN: usize = 8 * 1024 * 1024;

const TOKEN_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(true)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Encode text as a URL-safe token.
pub fn encode(text: &str) -> String {
    let mut encoder = GzEncoder::new(Vec::with_capacity(text.len() / 2 + 32), Compression::best());
    // Writing into a Vec cannot fail.
    let compressed = encoder
        .write_all(text.as_bytes())
        .and_then(|()| encoder.finish())
        .unwrap_or_default();
    TOKEN_ENGINE.encode(compressed)
}

/// Decode a token produced by [`encode`].
pub fn decode(token: &str) -> Result<String, SandboxError> {
    let token = token.trim();
    if token.is_empty() {
        return Err(SandboxError::MalformedToken("empty token".into()));
    }

    let normalized: String = token
        .chars()
        .map(|c| match c {
            '+' => '-',
            '/' => '_',
            c => c,
        })
        .collect();

    let compressed = TOKEN_ENGINE
        .decode(normalized.as_bytes())
        .map_err(|e| SandboxError::MalformedToken(format!("base64 decode: {}", e)))?;

    let mut bytes = Vec::new();
    GzDecoder::new(compressed.as_slice())
        .take(MAX_DECODED_LEN as u64 + 1)
        .read_to_end(&mut bytes)
        .map_err(|e| SandboxError::MalformedToken(format!("decompress: {}", e)))?;

    if bytes.len() > MAX_DECODED_LEN {
        return Err(SandboxError::MalformedToken(format!(
            "payload exceeds {} bytes",
            MAX_DECODED_LEN
        )));
    }

    String::from_utf8(bytes)
        .map_err(|e| SandboxError::MalformedToken(format!("utf-8: {}", e)))
}

/// Serialize a value as JSON and encode it as a token.
pub fn encode_json<T: Serialize + ?Sized>(value: &T) -> Result<String, serde_json::Error> {
    Ok(encode(&serde_json::to_string(value)?))
}

/// Decode a token and parse its payload as untyped JSON.
///
/// The result is untrusted; run it through a salvage or reconcile step
/// before it reaches the project.
pub fn decode_json(token: &str) -> Result<Value, SandboxError> {
    let text = decode(token)?;
    serde_json::from_str(&text)
        .map_err(|e| SandboxError::MalformedToken(format!("json parse: {}", e)))
}
