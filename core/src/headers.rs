//! Header validation and application.

use std::collections::HashMap;

use http::header::{HeaderMap, HeaderName, HeaderValue};
use serde::{Deserialize, Serialize};

use crate::error::HeaderError;

/// How header values are written onto the outgoing request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeaderValuePolicy {
    /// Values are sent as given. Values with control characters are rejected.
    #[default]
    Raw,
    /// Values are percent-encoded; everything but `A-Z a-z 0-9 - _ . ~` is
    /// escaped.
    QueryEscape,
}

impl HeaderValuePolicy {
    pub fn encode(self, value: &str) -> Result<HeaderValue, http::header::InvalidHeaderValue> {
        match self {
            HeaderValuePolicy::Raw => HeaderValue::from_str(value),
            HeaderValuePolicy::QueryEscape => HeaderValue::from_str(&urlencoding::encode(value)),
        }
    }
}

fn is_blank(s: &str) -> bool {
    s.trim().is_empty()
}

/// Validate every entry and append it to `target`.
///
/// Nothing is appended unless every entry is valid.
pub fn apply_headers(
    target: &mut HeaderMap,
    headers: &HashMap<String, String>,
    policy: HeaderValuePolicy,
) -> Result<(), HeaderError> {
    let mut staged = Vec::with_capacity(headers.len());
    for (key, value) in headers {
        if is_blank(key) || is_blank(value) {
            return Err(HeaderError::Blank {
                key: key.clone(),
                value: value.clone(),
            });
        }
        let name = HeaderName::from_bytes(key.as_bytes()).map_err(|source| HeaderError::Name {
            name: key.clone(),
            source,
        })?;
        let value = policy.encode(value).map_err(|source| HeaderError::Value {
            name: key.clone(),
            source,
        })?;
        staged.push((name, value));
    }
    for (name, value) in staged {
        target.append(name, value);
    }
    Ok(())
}
