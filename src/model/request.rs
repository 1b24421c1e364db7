//! Request descriptors and the defaulting rules applied before dispatch

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Header map as written in the configuration file
///
/// Values are kept as raw JSON so a non-string value can be rejected with a
/// typed error at dispatch time instead of failing the whole file.
pub type Headers = serde_json::Map<String, Value>;

/// Protocol tag used when a request omits `protocol`
pub const DEFAULT_PROTOCOL: &str = "HTTP";

/// A single call in a pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RequestDescriptor {
    /// HTTP method (default: GET)
    pub method: String,
    /// Path appended to the base URL (default: "/")
    pub endpoint: String,
    /// JSON body; `null` when absent
    pub body: Value,
    /// Request-specific headers
    pub headers: Option<Headers>,
    /// Overrides the active environment's base URL; required for WS
    pub base_url: Option<String>,
    /// "HTTP" or "WS"
    pub protocol: String,
    /// WS read deadline in seconds
    pub timeout: Option<u64>,
    /// Expected status code, 0 means "use the method convention"
    pub expected_status_code: u16,
    /// Accepted for compatibility with existing files; not compared
    pub expected_body: Option<Value>,
}

impl Default for RequestDescriptor {
    fn default() -> Self {
        Self {
            method: String::new(),
            endpoint: String::new(),
            body: Value::Null,
            headers: None,
            base_url: None,
            protocol: DEFAULT_PROTOCOL.to_string(),
            timeout: None,
            expected_status_code: 0,
            expected_body: None,
        }
    }
}

impl RequestDescriptor {
    /// Fill method, endpoint, protocol and expected status defaults
    pub fn with_defaults(mut self) -> Self {
        if self.method.is_empty() {
            self.method = "GET".to_string();
        }
        if self.endpoint.is_empty() {
            self.endpoint = "/".to_string();
        }
        if self.protocol.is_empty() {
            self.protocol = DEFAULT_PROTOCOL.to_string();
        }
        if self.expected_status_code == 0 {
            self.expected_status_code = conventional_status(&self.method);
        }
        self
    }

    /// Method to put on the wire, GET when unset
    pub fn effective_method(&self) -> &str {
        if self.method.is_empty() {
            "GET"
        } else {
            &self.method
        }
    }

    /// Base URL override, ignoring empty strings
    pub fn base_url_override(&self) -> Option<&str> {
        self.base_url.as_deref().filter(|url| !url.is_empty())
    }
}

/// Status code a call is expected to return when none is configured
pub fn conventional_status(method: &str) -> u16 {
    if method == "POST" {
        201
    } else {
        200
    }
}

/// Advisory comparison of an actual status against the expectation
///
/// An explicit code must match exactly. Without one, POST accepts 200 or
/// 201 and every other method accepts 200.
pub fn status_matches(expected: u16, method: &str, status: u16) -> bool {
    match expected {
        0 if method == "POST" => status == 200 || status == 201,
        0 => status == 200,
        code => status == code,
    }
}

/// Merge pipeline-wide headers with a step's own headers
///
/// Step headers win on key collision.
pub fn merge_headers(global: Option<&Headers>, local: Option<&Headers>) -> Option<Headers> {
    match (global, local) {
        (None, None) => None,
        (global, local) => {
            let mut merged = global.cloned().unwrap_or_default();
            if let Some(local) = local {
                for (key, value) in local {
                    merged.insert(key.clone(), value.clone());
                }
            }
            Some(merged)
        }
    }
}
