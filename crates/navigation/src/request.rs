//! Navigation targets and per-transition requests.

use std::collections::BTreeMap;

use percent_encoding::{AsciiSet, CONTROLS, percent_decode_str, utf8_percent_encode};
use serde::{Deserialize, Serialize};
use url::form_urlencoded;

use gatehouse_auth::RouteMeta;

/// Where a navigation should land (`path?query#hash`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub path: String,
    #[serde(default)]
    pub query: BTreeMap<String, String>,
    #[serde(default)]
    pub hash: Option<String>,
    /// Replace the current history entry instead of pushing a new one.
    #[serde(default)]
    pub replace: bool,
}

impl Location {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    /// Parse `path?key=value&...#hash`.
    pub fn parse(raw: &str) -> Self {
        let (rest, hash) = match raw.split_once('#') {
            Some((rest, hash)) => (rest, Some(decode(hash))),
            None => (raw, None),
        };
        let (path, query) = match rest.split_once('?') {
            Some((path, query)) => (path, parse_query(query)),
            None => (rest, BTreeMap::new()),
        };
        Self {
            path: decode(path),
            query,
            hash,
            replace: false,
        }
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }

    pub fn replacing(mut self) -> Self {
        self.replace = true;
        self
    }

    /// Render as `path?query#hash`. Slashes stay readable in query values.
    pub fn href(&self) -> String {
        let mut out = encode(&self.path, PATH);
        if !self.query.is_empty() {
            out.push('?');
            let pairs: Vec<String> = self
                .query
                .iter()
                .map(|(k, v)| format!("{}={}", encode(k, QUERY), encode(v, QUERY)))
                .collect();
            out.push_str(&pairs.join("&"));
        }
        if let Some(hash) = &self.hash {
            out.push('#');
            out.push_str(&encode(hash, FRAGMENT));
        }
        out
    }
}

impl From<&str> for Location {
    fn from(value: &str) -> Self {
        Self::parse(value)
    }
}

impl core::fmt::Display for Location {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.href())
    }
}

fn parse_query(raw: &str) -> BTreeMap<String, String> {
    form_urlencoded::parse(raw.as_bytes())
        .into_owned()
        .collect()
}

// Query components: delimiters and `+` escaped, `/` kept readable.
const QUERY: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'&')
    .add(b'+')
    .add(b'<')
    .add(b'=')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

const PATH: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

const FRAGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'`');

fn encode(raw: &str, set: &'static AsciiSet) -> String {
    utf8_percent_encode(raw, set).to_string()
}

/// Percent-decoding only: `+` is literal outside form-encoded queries.
fn decode(raw: &str) -> String {
    percent_decode_str(raw).decode_utf8_lossy().into_owned()
}

/// One route transition, as seen by the guard.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NavigationRequest {
    pub path: String,
    /// Path of the route being left (empty on the first navigation).
    pub from: String,
    pub query: BTreeMap<String, String>,
    pub params: BTreeMap<String, String>,
    pub hash: Option<String>,
    /// Meta of the matched route; default (non-public) when nothing matched.
    pub meta: RouteMeta,
    pub replace: bool,
}

impl NavigationRequest {
    pub fn to(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    pub fn from_location(location: Location, from: impl Into<String>) -> Self {
        Self {
            path: location.path,
            from: from.into(),
            query: location.query,
            params: BTreeMap::new(),
            hash: location.hash,
            meta: RouteMeta::default(),
            replace: location.replace,
        }
    }

    pub fn with_meta(mut self, meta: RouteMeta) -> Self {
        self.meta = meta;
        self
    }

    pub fn with_params(mut self, params: BTreeMap<String, String>) -> Self {
        self.params = params;
        self
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }

    pub fn public(mut self) -> Self {
        self.meta.public = true;
        self
    }

    pub fn replacing(mut self) -> Self {
        self.replace = true;
        self
    }

    /// The target of this request as a location.
    pub fn location(&self) -> Location {
        Location {
            path: self.path.clone(),
            query: self.query.clone(),
            hash: self.hash.clone(),
            replace: self.replace,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn href_keeps_slashes_in_redirect_values() {
        let loc = Location::new("/login").with_query("redirect", "/reports");
        assert_eq!(loc.href(), "/login?redirect=/reports");
    }

    #[test]
    fn href_escapes_query_delimiters() {
        let loc = Location::new("/search").with_query("q", "a&b=c d");
        assert_eq!(loc.href(), "/search?q=a%26b%3Dc%20d");
        assert_eq!(Location::parse(&loc.href()), loc);
    }

    #[test]
    fn parse_splits_path_query_and_hash() {
        let loc = Location::parse("/login?redirect=%2Freports&x#top");
        assert_eq!(loc.path, "/login");
        assert_eq!(loc.query.get("redirect").map(String::as_str), Some("/reports"));
        assert_eq!(loc.query.get("x").map(String::as_str), Some(""));
        assert_eq!(loc.hash.as_deref(), Some("top"));
    }

    #[test]
    fn plus_is_literal_in_paths_but_a_space_in_queries() {
        let loc = Location::parse("/tags/c++?q=a+b&lang=c%2B%2B");
        assert_eq!(loc.path, "/tags/c++");
        assert_eq!(loc.query.get("q").map(String::as_str), Some("a b"));
        assert_eq!(loc.query.get("lang").map(String::as_str), Some("c++"));
        assert_eq!(loc.href(), "/tags/c++?lang=c%2B%2B&q=a%20b");
        assert_eq!(Location::parse(&loc.href()), loc);
    }

    #[test]
    fn href_escapes_unsafe_path_and_hash_characters() {
        let mut loc = Location::new("/docs/a b");
        loc.hash = Some("sec tion".to_string());
        assert_eq!(loc.href(), "/docs/a%20b#sec%20tion");
        assert_eq!(Location::parse(&loc.href()), loc);
    }

    #[test]
    fn parse_tolerates_truncated_escape() {
        let loc = Location::parse("/a?b=100%");
        assert_eq!(loc.query.get("b").map(String::as_str), Some("100%"));
    }

    #[test]
    fn request_round_trips_through_location() {
        let req = NavigationRequest::to("/reports")
            .with_query("page", "2")
            .replacing();
        let loc = req.location();
        assert!(loc.replace);
        let again = NavigationRequest::from_location(loc, "/");
        assert_eq!(again.path, "/reports");
        assert_eq!(again.from, "/");
        assert_eq!(again.query, req.query);
        assert!(again.replace);
    }
}
