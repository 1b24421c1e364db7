//! WebSocket transport
//!
//! Sends the request body as one text frame, then prints whatever the peer
//! sends until the read deadline passes or the peer closes. The returned
//! response is a closure acknowledgement, never the remote payload.

use std::time::Duration;

use futures_util::{SinkExt, Stream, StreamExt};
use serde_json::Value;
use tokio::time::{timeout_at, Instant};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::error::ProtocolError;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::{self, Message};

use super::ApiResponse;
use crate::common::{Error, Result};
use crate::model::RequestDescriptor;
use crate::report::{Reporter, WsDirection};

pub(super) async fn execute(
    request: &RequestDescriptor,
    default_timeout: Duration,
    reporter: &dyn Reporter,
) -> Result<ApiResponse> {
    let url = request
        .base_url_override()
        .ok_or(Error::MissingWebSocketUrl)?;
    let text = match &request.body {
        Value::String(text) => text.clone(),
        other => {
            return Err(Error::InvalidBody(format!(
                "WebSocket body must be a string, got {}",
                other
            )))
        }
    };

    let (mut socket, _) = connect_async(url).await?;
    tracing::debug!(%url, "WebSocket connected");

    socket.send(Message::Text(text.clone())).await?;
    reporter.websocket_message(WsDirection::Sent, &text);

    let timeout = request
        .timeout
        .map(Duration::from_secs)
        .unwrap_or(default_timeout);
    let outcome = read_until_closed(&mut socket, read_deadline(timeout), reporter).await;

    // The peer may already have completed the closing handshake
    let _ = socket.close(None).await;

    outcome.map(|()| ApiResponse::websocket_closed())
}

/// Longest read window honoured; larger timeouts are clamped to it
const MAX_READ_WINDOW: Duration = Duration::from_secs(60 * 60 * 24 * 365);

fn read_deadline(timeout: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(timeout.min(MAX_READ_WINDOW))
        .unwrap_or(now)
}

/// Report incoming frames until the deadline or a close
async fn read_until_closed<S>(socket: &mut S, deadline: Instant, reporter: &dyn Reporter) -> Result<()>
where
    S: Stream<Item = std::result::Result<Message, tungstenite::Error>> + Unpin,
{
    loop {
        let frame = match timeout_at(deadline, socket.next()).await {
            Err(_) => {
                tracing::debug!("WebSocket read deadline reached");
                return Ok(());
            }
            Ok(None) => return Ok(()),
            Ok(Some(frame)) => frame,
        };

        match frame {
            Ok(Message::Text(text)) => reporter.websocket_message(WsDirection::Received, &text),
            Ok(Message::Binary(data)) => {
                reporter.websocket_message(WsDirection::Received, &String::from_utf8_lossy(&data))
            }
            Ok(Message::Close(frame)) => return check_close(frame),
            Ok(_) => {}
            Err(tungstenite::Error::ConnectionClosed)
            | Err(tungstenite::Error::AlreadyClosed)
            | Err(tungstenite::Error::Protocol(ProtocolError::ResetWithoutClosingHandshake)) => {
                return Ok(())
            }
            Err(e) => return Err(e.into()),
        }
    }
}

/// Normal, going-away and abnormal closures end the exchange quietly
fn check_close(frame: Option<CloseFrame<'_>>) -> Result<()> {
    let Some(frame) = frame else {
        return Ok(());
    };
    match frame.code {
        CloseCode::Normal | CloseCode::Away | CloseCode::Abnormal => Ok(()),
        code => Err(Error::UnexpectedClose {
            code: code.into(),
            reason: frame.reason.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::borrow::Cow;
    use std::sync::Mutex;

    use crate::report::HttpExchange;

    #[derive(Default)]
    struct Recorder {
        received: Mutex<Vec<String>>,
    }

    impl Reporter for Recorder {
        fn http_exchange(&self, _exchange: &HttpExchange<'_>) {}

        fn websocket_message(&self, direction: WsDirection, text: &str) {
            if direction == WsDirection::Received {
                self.received.lock().unwrap().push(text.to_string());
            }
        }
    }

    fn close(code: CloseCode) -> Message {
        Message::Close(Some(CloseFrame {
            code,
            reason: Cow::Borrowed("bye"),
        }))
    }

    fn far_deadline() -> Instant {
        Instant::now() + Duration::from_secs(60)
    }

    #[tokio::test]
    async fn test_reads_until_normal_close() {
        let reporter = Recorder::default();
        let mut frames = futures_util::stream::iter(vec![
            Ok(Message::Text("one".into())),
            Ok(Message::Ping(vec![])),
            Ok(Message::Text("two".into())),
            Ok(close(CloseCode::Normal)),
            Ok(Message::Text("never read".into())),
        ]);

        read_until_closed(&mut frames, far_deadline(), &reporter)
            .await
            .unwrap();
        assert_eq!(*reporter.received.lock().unwrap(), vec!["one", "two"]);
    }

    #[tokio::test]
    async fn test_unexpected_close_is_an_error() {
        let reporter = Recorder::default();
        let mut frames = futures_util::stream::iter(vec![Ok(close(CloseCode::Error))]);

        match read_until_closed(&mut frames, far_deadline(), &reporter).await {
            Err(Error::UnexpectedClose { code, reason }) => {
                assert_eq!(code, 1011);
                assert_eq!(reason, "bye");
            }
            other => panic!("Expected UnexpectedClose, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_reset_without_handshake_ends_quietly() {
        let reporter = Recorder::default();
        let mut frames = futures_util::stream::iter(vec![Err(tungstenite::Error::Protocol(
            ProtocolError::ResetWithoutClosingHandshake,
        ))]);

        assert!(read_until_closed(&mut frames, far_deadline(), &reporter)
            .await
            .is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_ends_silent_stream() {
        let reporter = Recorder::default();
        let mut frames =
            futures_util::stream::pending::<std::result::Result<Message, tungstenite::Error>>();

        let started = Instant::now();
        read_until_closed(&mut frames, started + Duration::from_secs(1), &reporter)
            .await
            .unwrap();
        assert!(started.elapsed() >= Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_huge_timeout_is_clamped() {
        let started = Instant::now();
        let deadline = read_deadline(Duration::from_secs(u64::MAX));
        assert_eq!(deadline, started + MAX_READ_WINDOW);

        let deadline = read_deadline(Duration::from_secs(5));
        assert_eq!(deadline, started + Duration::from_secs(5));
    }

    #[test]
    fn test_missing_close_frame_is_normal() {
        assert!(check_close(None).is_ok());
        assert!(check_close(Some(CloseFrame {
            code: CloseCode::Away,
            reason: Cow::Borrowed(""),
        }))
        .is_ok());
    }

    #[tokio::test]
    async fn test_ws_requires_url_and_string_body() {
        let reporter = Recorder::default();

        let request = RequestDescriptor {
            protocol: "WS".into(),
            body: Value::String("hi".into()),
            ..Default::default()
        };
        assert!(matches!(
            execute(&request, Duration::from_secs(1), &reporter).await,
            Err(Error::MissingWebSocketUrl)
        ));

        let request = RequestDescriptor {
            protocol: "WS".into(),
            base_url: Some("ws://127.0.0.1:1".into()),
            body: serde_json::json!({"op": "subscribe"}),
            ..Default::default()
        };
        assert!(matches!(
            execute(&request, Duration::from_secs(1), &reporter).await,
            Err(Error::InvalidBody(_))
        ));
    }
}
