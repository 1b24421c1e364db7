//! HTTP transport

use std::time::Instant;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Method};
use serde_json::Value;

use super::ApiResponse;
use crate::common::{Error, Result};
use crate::model::{RequestDescriptor, RuntimeState};
use crate::report::{HttpExchange, Reporter};

pub(super) async fn execute(
    client: &Client,
    state: &RuntimeState,
    request: &RequestDescriptor,
    reporter: &dyn Reporter,
) -> Result<ApiResponse> {
    let started = Instant::now();

    let base = request
        .base_url_override()
        .unwrap_or(state.active_base_url.as_str());
    let url = format!("{}{}", base, request.endpoint);

    let method_name = request.effective_method();
    let method = Method::from_bytes(method_name.as_bytes())
        .map_err(|_| Error::InvalidMethod(method_name.to_string()))?;

    let mut builder = client
        .request(method, &url)
        .headers(build_headers(&state.token, request)?);
    if let Some(body) = encode_body(&request.body)? {
        builder = builder.body(body);
    }

    let response = builder.send().await?;
    let status = response.status().as_u16();
    let bytes = response.bytes().await?;
    let body = parse_body(&bytes)?;
    let elapsed = started.elapsed();

    tracing::debug!(%url, status, ?elapsed, "HTTP call finished");
    reporter.http_exchange(&HttpExchange {
        request,
        url: &url,
        status,
        elapsed,
    });

    Ok(ApiResponse { status, body })
}

/// Authorization first, then request headers, which may overwrite it
fn build_headers(token: &str, request: &RequestDescriptor) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();

    let bearer = HeaderValue::from_str(&format!("bearer {}", token))
        .map_err(|e| Error::invalid_header(AUTHORIZATION.as_str(), e))?;
    headers.insert(AUTHORIZATION, bearer);

    if !request.body.is_null() {
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    }

    if let Some(custom) = &request.headers {
        for (name, value) in custom {
            let Value::String(value) = value else {
                return Err(Error::invalid_header(name, "value must be a string"));
            };
            let header_name =
                HeaderName::from_bytes(name.as_bytes()).map_err(|e| Error::invalid_header(name, e))?;
            let header_value =
                HeaderValue::from_str(value).map_err(|e| Error::invalid_header(name, e))?;
            headers.insert(header_name, header_value);
        }
    }

    Ok(headers)
}

/// An absent body is sent as an empty payload
fn encode_body(body: &Value) -> Result<Option<Vec<u8>>> {
    match body {
        Value::Null => Ok(None),
        body => Ok(Some(serde_json::to_vec(body)?)),
    }
}

/// Parse a response as schemaless JSON; an empty body is not JSON either
fn parse_body(bytes: &[u8]) -> Result<Value> {
    serde_json::from_slice(bytes).map_err(Error::InvalidResponseBody)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request_with_headers(headers: Value) -> RequestDescriptor {
        let Value::Object(map) = headers else {
            panic!("Expected object");
        };
        RequestDescriptor {
            headers: Some(map),
            ..Default::default()
        }
    }

    #[test]
    fn test_authorization_is_always_set() {
        let headers = build_headers("abc123", &RequestDescriptor::default()).unwrap();
        assert_eq!(headers[AUTHORIZATION], "bearer abc123");
        assert!(headers.get(CONTENT_TYPE).is_none());
    }

    #[test]
    fn test_request_headers_override_authorization() {
        let request = request_with_headers(json!({
            "Authorization": "Basic Zm9vOmJhcg==",
            "X-Trace": "7"
        }));
        let headers = build_headers("abc123", &request).unwrap();
        assert_eq!(headers[AUTHORIZATION], "Basic Zm9vOmJhcg==");
        assert_eq!(headers["x-trace"], "7");
    }

    #[test]
    fn test_non_string_header_is_rejected() {
        let request = request_with_headers(json!({"X-Count": 3}));
        match build_headers("", &request) {
            Err(Error::InvalidHeader { name, .. }) => assert_eq!(name, "X-Count"),
            other => panic!("Expected InvalidHeader, got {:?}", other),
        }
    }

    #[test]
    fn test_json_body_sets_content_type() {
        let request = RequestDescriptor {
            body: json!({"email": "a@b.c"}),
            ..Default::default()
        };
        let headers = build_headers("", &request).unwrap();
        assert_eq!(headers[CONTENT_TYPE], "application/json");
        assert_eq!(
            encode_body(&request.body).unwrap().unwrap(),
            br#"{"email":"a@b.c"}"#.to_vec()
        );
    }

    #[test]
    fn test_null_body_is_empty_payload() {
        assert!(encode_body(&Value::Null).unwrap().is_none());
    }

    #[test]
    fn test_parse_body() {
        assert_eq!(parse_body(br#"{"a":[1,2]}"#).unwrap()["a"][1], 2);
        assert_eq!(parse_body(b" null\n").unwrap(), Value::Null);
        assert!(matches!(parse_body(b""), Err(Error::InvalidResponseBody(_))));
        assert!(matches!(
            parse_body(b" \n"),
            Err(Error::InvalidResponseBody(_))
        ));
        assert!(matches!(
            parse_body(b"<html>"),
            Err(Error::InvalidResponseBody(_))
        ));
    }
}
