//! Decode a link token.

use anyhow::{Context as _, Result};
use sandbox_core::codec;

/// Print the payload of a codec token, pretty-printed when it is JSON.
pub fn run(token: &str) -> Result<()> {
    println!("{}", render(token)?);
    Ok(())
}

fn render(token: &str) -> Result<String> {
    let text = codec::decode(token).context("Not a valid token")?;
    match serde_json::from_str::<serde_json::Value>(&text) {
        Ok(value) => Ok(serde_json::to_string_pretty(&value)?),
        Err(_) => Ok(text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn json_payload_is_pretty_printed() {
        let token = codec::encode_json(&json!({"strip": true})).unwrap();
        assert_eq!(render(&token).unwrap(), "{\n  \"strip\": true\n}");
    }

    #[test]
    fn plain_text_is_printed_as_is() {
        let token = codec::encode("fn main() {}");
        assert_eq!(render(&token).unwrap(), "fn main() {}");
    }

    #[test]
    fn garbage_is_an_error() {
        assert!(render("!!not a token!!").is_err());
    }
}
