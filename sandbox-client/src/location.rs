//! Page location parsing and permalinks.
//!
//! A page location carries two kinds of state:
//! - per-key query parameters holding codec tokens (`?files=<token>`), read
//!   once when stores open;
//! - an optional share handle as the path `/s/<hex>`.

use sandbox_core::{codec, Project};
use sandbox_types::ShareHandle;
use std::collections::HashMap;
use url::Url;

const LOCAL_ORIGIN: &str = "http://localhost";

/// A parsed page URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageLocation {
    path: String,
    params: HashMap<String, String>,
    handle: Option<ShareHandle>,
}

impl PageLocation {
    /// Parse an absolute URL or an origin-relative path (`/s/ab12?x=1`).
    ///
    /// Query values are percent-decoded exactly once. When a key repeats,
    /// the first occurrence wins.
    pub fn parse(input: &str) -> Result<Self, url::ParseError> {
        let url = if input.starts_with('/') {
            Url::parse(&format!("{}{}", LOCAL_ORIGIN, input))?
        } else {
            Url::parse(input)?
        };
        Ok(Self::from_url(&url))
    }

    /// Build from an already parsed URL.
    pub fn from_url(url: &Url) -> Self {
        let mut params = HashMap::new();
        for (key, value) in url.query_pairs().into_owned() {
            params.entry(key).or_insert(value);
        }

        Self {
            path: url.path().to_string(),
            handle: ShareHandle::from_path(url.path()),
            params,
        }
    }

    /// The site root, with no tokens and no handle.
    pub fn root() -> Self {
        Self {
            path: "/".to_string(),
            params: HashMap::new(),
            handle: None,
        }
    }

    /// Path component.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Share handle encoded in the path, if any.
    pub fn handle(&self) -> Option<&ShareHandle> {
        self.handle.as_ref()
    }

    /// Codec token for a store key, if present and non-empty.
    pub fn token(&self, key: &str) -> Option<&str> {
        self.params
            .get(key)
            .map(String::as_str)
            .filter(|t| !t.is_empty())
    }
}

/// Build a URL that reproduces the live project when opened.
///
/// Embeds `files`, `linker` and the active `options-<linker>` record as codec
/// tokens, the same keys stores read at open time. Any query, fragment or
/// share handle path already on `base` is dropped.
pub fn permalink(base: &Url, project: &Project) -> Result<Url, serde_json::Error> {
    let linker = project.linker();
    let files = codec::encode_json(project.files())?;
    let linker_token = codec::encode_json(&linker)?;
    let options = codec::encode_json(&project.active_options_value())?;

    let mut url = base.clone();
    if ShareHandle::from_path(url.path()).is_some() {
        url.set_path("/");
    }
    url.set_query(None);
    url.set_fragment(None);
    url.query_pairs_mut()
        .append_pair("files", &files)
        .append_pair("linker", &linker_token)
        .append_pair(linker.options_key(), &options);
    Ok(url)
}
