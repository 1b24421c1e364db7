//! Transport dispatch
//!
//! Every request descriptor carries a protocol tag. [`TransportDispatcher`]
//! maps the tag onto the closed set of [`Protocol`] variants and runs the
//! matching transport. Unknown tags are rejected before anything touches
//! the network.

mod http;
mod ws;

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::common::{Error, Result};
use crate::model::{RequestDescriptor, RuntimeState};
use crate::report::Reporter;

/// Normalized result of one call
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

impl ApiResponse {
    /// Acknowledgement returned once a WebSocket exchange has finished
    pub fn websocket_closed() -> Self {
        Self {
            status: 200,
            body: json!({"message": "successfully closed the connection to websocket"}),
        }
    }
}

/// Supported wire protocols
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    Http,
    Ws,
}

impl FromStr for Protocol {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        if s.is_empty() || s.eq_ignore_ascii_case("HTTP") {
            Ok(Protocol::Http)
        } else if s.eq_ignore_ascii_case("WS") {
            Ok(Protocol::Ws)
        } else {
            Err(Error::UnknownProtocol(s.to_string()))
        }
    }
}

/// Executes a request descriptor against the network
#[async_trait]
pub trait Dispatch: Send + Sync {
    async fn execute(&self, state: &RuntimeState, request: &RequestDescriptor)
        -> Result<ApiResponse>;
}

/// Production dispatcher over HTTP and WebSocket
pub struct TransportDispatcher {
    client: reqwest::Client,
    reporter: Arc<dyn Reporter>,
    ws_timeout: Duration,
}

impl TransportDispatcher {
    /// Create a dispatcher; `ws_timeout` applies to WS requests without `timeout`
    pub fn new(reporter: Arc<dyn Reporter>, ws_timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            reporter,
            ws_timeout,
        }
    }
}

#[async_trait]
impl Dispatch for TransportDispatcher {
    async fn execute(
        &self,
        state: &RuntimeState,
        request: &RequestDescriptor,
    ) -> Result<ApiResponse> {
        let protocol: Protocol = request.protocol.parse()?;
        tracing::debug!(?protocol, endpoint = %request.endpoint, "Dispatching request");

        match protocol {
            Protocol::Http => {
                http::execute(&self.client, state, request, self.reporter.as_ref()).await
            }
            Protocol::Ws => ws::execute(request, self.ws_timeout, self.reporter.as_ref()).await,
        }
    }
}
