// Mastodon user stream — a persistent WebSocket subscription.
//
// Frames arrive as `{"stream": [...], "event": "...", "payload": "..."}`
// where `payload` is a JSON document encoded as a string. Only
// `notification` events are surfaced; everything else is skipped. A
// malformed frame is logged and skipped — only a remote close ends the
// stream. No timeout is placed on the connection.

use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, warn};

use super::models::NotificationEvent;
use crate::error::SourceError;

/// One decoded streaming frame, before payload extraction.
#[derive(Debug, Deserialize)]
struct Frame {
    event: String,
    #[serde(default)]
    payload: Option<String>,
}

/// An open user-stream subscription.
pub struct UserStream {
    socket: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl UserStream {
    /// The next notification from the stream.
    ///
    /// Returns `Ok(None)` when the remote closes the connection. Frames
    /// that are not notifications, and frames that fail to parse, are
    /// skipped without ending the stream.
    pub async fn next(&mut self) -> Result<Option<NotificationEvent>, SourceError> {
        while let Some(message) = self.socket.next().await {
            match message? {
                Message::Text(text) => match decode_frame(&text) {
                    Ok(Some(event)) => return Ok(Some(event)),
                    Ok(None) => continue,
                    Err(e) => {
                        warn!(error = %e, "Skipping malformed stream frame");
                        continue;
                    }
                },
                Message::Ping(data) => {
                    self.socket.send(Message::Pong(data)).await?;
                }
                Message::Close(_) => {
                    debug!("Stream closed by remote");
                    return Ok(None);
                }
                _ => continue,
            }
        }

        Ok(None)
    }
}

/// Open the user stream for the given instance and token.
pub(crate) async fn connect(
    base_url: &str,
    access_token: &str,
) -> Result<UserStream, SourceError> {
    let ws_base = if let Some(rest) = base_url.strip_prefix("https://") {
        format!("wss://{rest}")
    } else if let Some(rest) = base_url.strip_prefix("http://") {
        format!("ws://{rest}")
    } else {
        format!("wss://{base_url}")
    };

    let url = format!("{ws_base}/api/v1/streaming?access_token={access_token}&stream=user");

    debug!("Opening user stream");
    let (socket, _response) = connect_async(&url).await?;

    Ok(UserStream { socket })
}

/// Decode one text frame into a notification, if it is one.
///
/// Non-notification events yield `Ok(None)`. A frame whose envelope or
/// payload fails to parse yields the parse error for the caller to log.
pub fn decode_frame(text: &str) -> Result<Option<NotificationEvent>, serde_json::Error> {
    let frame: Frame = serde_json::from_str(text)?;

    if frame.event != "notification" {
        return Ok(None);
    }

    let payload = match frame.payload {
        Some(payload) => payload,
        None => return Ok(None),
    };

    Ok(Some(serde_json::from_str(&payload)?))
}
