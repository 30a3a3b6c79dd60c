//! Per-invocation views of a request and response
//!
//! Snapshots are taken by the interceptor before the request is handed to
//! the downstream handler and after the response comes back. They are owned
//! by a single invocation and never shared.

use http::header::{CONTENT_LENGTH, CONTENT_TYPE, HOST};
use http::{HeaderMap, Method, StatusCode};
use std::fmt;

/// Insertion-ordered map; re-inserting a key keeps its position and
/// replaces its value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMap<V> {
    entries: Vec<(String, V)>,
}

impl<V> FieldMap<V> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Insert or replace; returns the previous value
    pub fn insert(&mut self, key: impl Into<String>, value: V) -> Option<V> {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => Some(std::mem::replace(existing, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    /// Exact-key lookup
    pub fn get(&self, key: &str) -> Option<&V> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Exact-key mutable lookup
    pub fn get_mut(&mut self, key: &str) -> Option<&mut V> {
        self.entries
            .iter_mut()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<V> Default for FieldMap<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Into<String>, V> FromIterator<(K, V)> for FieldMap<V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

impl fmt::Display for FieldMap<String> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (k, v)) in self.entries.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}={}", k, v)?;
        }
        write!(f, "}}")
    }
}

impl fmt::Display for FieldMap<Vec<String>> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (k, values)) in self.entries.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}=[{}]", k, values.join(", "))?;
        }
        write!(f, "}}")
    }
}

/// Header names to their last observed value
///
/// Duplicate header names collapse to the most recent value. Names come from
/// `http::HeaderMap` and are therefore lowercase.
pub type Headers = FieldMap<String>;

/// Query parameter names to all of their values, in order
pub type QueryParams = FieldMap<Vec<String>>;

/// Client identity supplied by the host server
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientInfo {
    /// Remote peer address
    pub remote_addr: Option<String>,
    /// Authenticated principal name
    pub principal: Option<String>,
    /// Session identifier
    pub session_id: Option<String>,
}

impl ClientInfo {
    pub fn with_remote_addr(mut self, addr: impl Into<String>) -> Self {
        self.remote_addr = Some(addr.into());
        self
    }

    pub fn with_principal(mut self, principal: impl Into<String>) -> Self {
        self.principal = Some(principal.into());
        self
    }

    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }
}

/// Request metadata captured before the downstream handler runs
#[derive(Debug, Clone)]
pub struct RequestSnapshot {
    pub method: Method,
    pub path: String,
    pub url: String,
    pub headers: Headers,
    pub query_params: QueryParams,
    pub content_type: Option<String>,
    pub character_encoding: Option<String>,
    /// `-1` when unknown
    pub content_length: i64,
    pub client: ClientInfo,
}

impl RequestSnapshot {
    /// Snapshot the head of a request
    pub fn from_parts(parts: &http::request::Parts, client: ClientInfo) -> Self {
        let path = parts.uri.path().to_string();
        let url = match (parts.uri.host(), header_value(&parts.headers, HOST.as_str())) {
            (Some(_), _) => {
                let scheme = parts.uri.scheme_str().unwrap_or("http");
                let authority = parts.uri.authority().map(|a| a.as_str()).unwrap_or_default();
                format!("{}://{}{}", scheme, authority, path)
            }
            (None, Some(host)) => format!("http://{}{}", host, path),
            (None, None) => path.clone(),
        };

        let query_params = parts
            .uri
            .query()
            .map(parse_query)
            .unwrap_or_default();

        let content_type = header_value(&parts.headers, CONTENT_TYPE.as_str());
        let character_encoding = content_type.as_deref().and_then(charset);
        let content_length = header_value(&parts.headers, CONTENT_LENGTH.as_str())
            .and_then(|v| v.trim().parse::<i64>().ok())
            .unwrap_or(-1);

        Self {
            method: parts.method.clone(),
            path,
            url,
            headers: collect_headers(&parts.headers),
            query_params,
            content_type,
            character_encoding,
            content_length,
            client,
        }
    }
}

/// Response metadata captured after the downstream handler returns
#[derive(Debug, Clone)]
pub struct ResponseSnapshot {
    pub status: StatusCode,
    pub headers: Headers,
    pub content_type: Option<String>,
    pub character_encoding: Option<String>,
}

impl ResponseSnapshot {
    /// Snapshot the head of a response
    pub fn from_parts(parts: &http::response::Parts) -> Self {
        let content_type = header_value(&parts.headers, CONTENT_TYPE.as_str());
        let character_encoding = content_type.as_deref().and_then(charset);
        Self {
            status: parts.status,
            headers: collect_headers(&parts.headers),
            content_type,
            character_encoding,
        }
    }
}

/// Collapse a header map to name → last value
pub fn collect_headers(headers: &HeaderMap) -> Headers {
    let mut collected = Headers::new();
    for (name, value) in headers {
        collected.insert(name.as_str(), String::from_utf8_lossy(value.as_bytes()).into_owned());
    }
    collected
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
}

/// Decode a query string into a multi-map
pub fn parse_query(query: &str) -> QueryParams {
    let mut params = QueryParams::new();
    for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
        match params.get_mut(&key) {
            Some(values) => values.push(value.into_owned()),
            None => {
                params.insert(key.into_owned(), vec![value.into_owned()]);
            }
        }
    }
    params
}

/// Extract the `charset` parameter of a content type
pub fn charset(content_type: &str) -> Option<String> {
    content_type.split(';').skip(1).find_map(|param| {
        let (name, value) = param.split_once('=')?;
        if name.trim().eq_ignore_ascii_case("charset") {
            Some(value.trim().trim_matches('"').to_string())
        } else {
            None
        }
    })
}
