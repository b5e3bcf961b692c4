//! WebSocket connection handler
//!
//! Performs the protocol upgrade for one TCP connection, extracts the join
//! parameters from the upgrade request, and runs the session's reader and
//! writer tasks until the connection ends.
//!
//! Join parameters (`room`, `username`) travel as query parameters on the
//! upgrade request; a request missing either one is rejected during the
//! handshake and never reaches the Hub.

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::http::StatusCode;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, info};

use crate::error::AppError;
use crate::frame::{InboundFrame, OutboundFrame};
use crate::hub::HubEvent;
use crate::session::{Session, MAILBOX_CAPACITY};
use crate::types::{ClientId, RoomId};

/// Which upgrade-request origins are accepted
///
/// The permissive default matches the behavior existing clients rely on;
/// deployments fronting untrusted browsers can pin an allow list.
#[derive(Debug, Clone, Default)]
pub enum OriginPolicy {
    /// Accept any Origin header, or none at all
    #[default]
    AllowAny,
    /// Require an Origin header matching one of these values exactly
    AllowedOrigins(Vec<String>),
}

impl OriginPolicy {
    /// Check an Origin header value (None when the header is absent)
    fn allows(&self, origin: Option<&str>) -> bool {
        match self {
            Self::AllowAny => true,
            Self::AllowedOrigins(allowed) => match origin {
                Some(origin) => allowed.iter().any(|a| a == origin),
                None => false,
            },
        }
    }
}

/// Per-connection adapter configuration
#[derive(Debug, Clone, Default)]
pub struct ConnectionConfig {
    pub origin_policy: OriginPolicy,
}

/// Join parameters carried on the upgrade request
#[derive(Debug, Clone, PartialEq, Eq)]
struct JoinParams {
    room: RoomId,
    username: String,
}

/// Parse `room` and `username` from a query string
///
/// Both are required and must be non-empty.
fn parse_join_params(query: &str) -> Option<JoinParams> {
    let mut room = None;
    let mut username = None;
    for pair in query.split('&') {
        let mut parts = pair.splitn(2, '=');
        let key = parts.next().unwrap_or("");
        let value = parts.next().unwrap_or("");
        match key {
            "room" => room = Some(value.to_string()),
            "username" => username = Some(value.to_string()),
            _ => {}
        }
    }
    let room = room.filter(|r| !r.is_empty())?;
    let username = username.filter(|u| !u.is_empty())?;
    Some(JoinParams {
        room: RoomId::new(room),
        username,
    })
}

/// Build an HTTP error response for a rejected handshake
fn reject(status: StatusCode, body: &str) -> ErrorResponse {
    let mut response = ErrorResponse::new(Some(body.to_string()));
    *response.status_mut() = status;
    response
}

/// Handle a new TCP connection
///
/// Upgrades to WebSocket, registers a session with the Hub, and drives the
/// reader and writer tasks to completion. Each task emits `Unregister`
/// when it terminates; the Hub absorbs the duplicate.
pub async fn handle_connection(
    stream: TcpStream,
    events: mpsc::Sender<HubEvent>,
    config: ConnectionConfig,
) -> Result<(), AppError> {
    let peer_addr = stream
        .peer_addr()
        .map(|a| a.to_string())
        .unwrap_or_else(|_| "unknown".to_string());

    debug!("New TCP connection from {}", peer_addr);

    // WebSocket handshake; join parameters and origin are checked here so
    // a bad request is refused before any session state exists
    let mut params: Option<JoinParams> = None;
    let mut handshake_error: Option<AppError> = None;
    let callback = |request: &Request, response: Response| {
        let origin = request
            .headers()
            .get("Origin")
            .and_then(|v| v.to_str().ok());
        if !config.origin_policy.allows(origin) {
            handshake_error = Some(AppError::OriginRejected(
                origin.unwrap_or("<none>").to_string(),
            ));
            return Err(reject(StatusCode::FORBIDDEN, "Origin not allowed"));
        }
        match request.uri().query().and_then(parse_join_params) {
            Some(p) => {
                params = Some(p);
                Ok(response)
            }
            None => {
                handshake_error = Some(AppError::MissingJoinParams);
                Err(reject(StatusCode::BAD_REQUEST, "room and username required"))
            }
        }
    };

    let ws_stream = match tokio_tungstenite::accept_hdr_async(stream, callback).await {
        Ok(ws_stream) => ws_stream,
        Err(e) => return Err(handshake_error.unwrap_or(AppError::WebSocket(e))),
    };
    let params = params.ok_or(AppError::MissingJoinParams)?;
    let (mut ws_sender, mut ws_receiver) = ws_stream.split();

    let client_id = ClientId::new();
    info!(
        client = %client_id,
        username = %params.username,
        room = %params.room,
        peer = %peer_addr,
        "client connected"
    );

    // Outbound mailbox drained by the writer task
    let (mailbox_tx, mut mailbox_rx) = mpsc::channel::<OutboundFrame>(MAILBOX_CAPACITY);

    let session = Session::new(client_id, params.username, params.room, mailbox_tx);
    if events
        .send(HubEvent::Register { session })
        .await
        .is_err()
    {
        error!("Failed to register client {} - hub closed", client_id);
        return Err(AppError::ChannelSend);
    }

    // Reader task: inbound frames -> Hub events
    let events_read = events.clone();
    let read_task = tokio::spawn(async move {
        while let Some(msg_result) = ws_receiver.next().await {
            match msg_result {
                Ok(Message::Text(text)) => {
                    let event = match InboundFrame::parse(&text) {
                        InboundFrame::Typing(is_typing) => HubEvent::TypingChanged {
                            client_id,
                            is_typing,
                        },
                        InboundFrame::Chat(body) => HubEvent::Broadcast { client_id, body },
                    };
                    if events_read.send(event).await.is_err() {
                        debug!("Hub closed, ending read task for {}", client_id);
                        break;
                    }
                }
                Ok(Message::Close(_)) => {
                    debug!("Client {} sent close frame", client_id);
                    break;
                }
                Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {
                    // Pong is handled automatically by tungstenite
                }
                Ok(_) => {
                    // Binary frames are not part of the protocol - ignore
                }
                Err(e) => {
                    error!("WebSocket read error for {}: {}", client_id, e);
                    break;
                }
            }
        }
        let _ = events_read
            .send(HubEvent::Unregister { client_id })
            .await;
        debug!("Read task ended for {}", client_id);
    });

    // Writer task: mailbox -> socket; mailbox closure is the shutdown signal
    let events_write = events.clone();
    let write_task = tokio::spawn(async move {
        while let Some(frame) = mailbox_rx.recv().await {
            if ws_sender
                .send(Message::Text(frame.encode().into()))
                .await
                .is_err()
            {
                debug!("WebSocket send failed, ending write task for {}", client_id);
                break;
            }
        }
        let _ = ws_sender.close().await;
        let _ = events_write
            .send(HubEvent::Unregister { client_id })
            .await;
        debug!("Write task ended for {}", client_id);
    });

    let _ = tokio::join!(read_task, write_task);

    info!(client = %client_id, "client disconnected");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_join_params() {
        let params = parse_join_params("room=r1&username=alice").unwrap();
        assert_eq!(params.room, RoomId::new("r1"));
        assert_eq!(params.username, "alice");

        // Order and extra parameters don't matter
        let params = parse_join_params("username=bob&x=1&room=lobby").unwrap();
        assert_eq!(params.room, RoomId::new("lobby"));
        assert_eq!(params.username, "bob");
    }

    #[test]
    fn test_parse_join_params_missing_or_empty() {
        assert!(parse_join_params("").is_none());
        assert!(parse_join_params("room=r1").is_none());
        assert!(parse_join_params("username=alice").is_none());
        assert!(parse_join_params("room=&username=alice").is_none());
        assert!(parse_join_params("room=r1&username=").is_none());
    }

    #[test]
    fn test_origin_policy() {
        assert!(OriginPolicy::AllowAny.allows(None));
        assert!(OriginPolicy::AllowAny.allows(Some("http://evil.example")));

        let pinned = OriginPolicy::AllowedOrigins(vec!["http://localhost:8080".to_string()]);
        assert!(pinned.allows(Some("http://localhost:8080")));
        assert!(!pinned.allows(Some("http://evil.example")));
        assert!(!pinned.allows(None));
    }
}
