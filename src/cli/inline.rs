//! Single-request mode
//!
//! Builds a request descriptor and runtime state from command-line values
//! instead of a configuration file.

use reqwest::Url;
use serde_json::Value;

use crate::common::{Error, Result};
use crate::model::{Headers, RequestDescriptor, RuntimeState};
use crate::transport::Protocol;

/// Command-line values for one request
#[derive(Debug, Clone)]
pub struct InlineRequest {
    pub url: String,
    pub method: String,
    pub body: Option<String>,
    pub headers: Option<String>,
    pub protocol: String,
    pub timeout: u64,
    pub token: Option<String>,
    pub status_code: u16,
}

impl InlineRequest {
    /// Split the URL and build what the dispatcher needs
    pub fn build(&self) -> Result<(RequestDescriptor, RuntimeState)> {
        let protocol: Protocol = self.protocol.parse()?;

        let mut headers = self
            .headers
            .as_deref()
            .map(parse_header_list)
            .unwrap_or_default();
        if let Some(token) = &self.token {
            headers.insert(
                "Authorization".to_string(),
                Value::String(format!("Bearer {}", token)),
            );
        }

        let (base_url, endpoint, body) = match protocol {
            Protocol::Http => {
                let (base, endpoint) = split_url(&self.url)?;
                let body = match &self.body {
                    None => Value::Null,
                    Some(raw) => serde_json::from_str(raw).unwrap_or(Value::String(raw.clone())),
                };
                (base, endpoint, body)
            }
            Protocol::Ws => (
                self.url.clone(),
                String::new(),
                Value::String(self.body.clone().unwrap_or_default()),
            ),
        };

        let request = RequestDescriptor {
            method: self.method.to_ascii_uppercase(),
            endpoint,
            body,
            headers: (!headers.is_empty()).then_some(headers),
            base_url: Some(base_url.clone()),
            protocol: self.protocol.to_ascii_uppercase(),
            timeout: Some(self.timeout),
            expected_status_code: self.status_code,
            expected_body: None,
        }
        .with_defaults();

        let state = RuntimeState {
            active_base_url: base_url,
            token: self.token.clone().unwrap_or_default(),
            ..Default::default()
        };

        Ok((request, state))
    }
}

/// Parse `Key:Value,Other:Value`; entries without a colon are skipped
pub fn parse_header_list(raw: &str) -> Headers {
    raw.split(',')
        .filter_map(|pair| pair.split_once(':'))
        .map(|(key, value)| (key.trim(), value.trim()))
        .filter(|(key, _)| !key.is_empty())
        .map(|(key, value)| (key.to_string(), Value::String(value.to_string())))
        .collect()
}

/// Split a full URL into origin and path (with query)
fn split_url(raw: &str) -> Result<(String, String)> {
    let url = Url::parse(raw).map_err(|e| Error::invalid_url(raw, e))?;
    if url.host_str().is_none() {
        return Err(Error::invalid_url(raw, "missing host"));
    }

    let mut endpoint = url.path().to_string();
    if let Some(query) = url.query() {
        endpoint.push('?');
        endpoint.push_str(query);
    }

    Ok((url.origin().ascii_serialization(), endpoint))
}
