//! WebSocket upgrade handler

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    response::{IntoResponse, Response},
};
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::app::AppState;
use crate::arena::Direction;
use crate::http::auth::authorize_role;
use crate::relay::{MoveEvent, RelayChannel, RelayError, Subscription};
use crate::util::rate_limit::ConnectionRateLimiter;
use crate::util::time::unix_millis;
use crate::ws::protocol::{error_code, ClientMsg, Role, ServerMsg};

/// Query parameters for WebSocket connection
#[derive(Debug, Deserialize)]
pub struct WsQuery {
    /// Requested role; viewer when absent
    #[serde(default)]
    pub role: Role,
    /// Signed role token, required for admin when a secret is configured
    pub token: Option<String>,
}

/// Outbound send failures
#[derive(Debug, thiserror::Error)]
enum SendError {
    #[error("serialize: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("socket: {0}")]
    Socket(#[from] axum::Error),
}

/// WebSocket upgrade handler
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(query): Query<WsQuery>,
    State(state): State<AppState>,
) -> Response {
    let secret = state.config.admin_token_secret.as_deref();
    match authorize_role(query.role, query.token.as_deref(), secret) {
        Ok(role) => {
            debug!(%role, "WebSocket upgrade");
            ws.on_upgrade(move |socket| handle_socket(socket, role, state))
        }
        Err(e) => {
            warn!(requested = %query.role, error = %e, "WebSocket role check failed");
            e.into_response()
        }
    }
}

/// Handle the upgraded WebSocket connection
async fn handle_socket(socket: WebSocket, role: Role, state: AppState) {
    let conn_id = Uuid::new_v4();
    info!(conn_id = %conn_id, %role, "New WebSocket connection");

    state.connections.insert(conn_id, role);
    // Subscribe before the welcome so nothing published after it is missed
    let subscription = state.relay.subscribe(conn_id);

    let (mut ws_sink, ws_stream) = socket.split();

    let welcome = ServerMsg::Welcome {
        conn_id,
        role,
        server_time: unix_millis(),
    };

    if let Err(e) = send_msg(&mut ws_sink, &welcome).await {
        error!(conn_id = %conn_id, error = %e, "Failed to send welcome");
    } else {
        run_session(conn_id, role, &state.relay, ws_sink, ws_stream, subscription).await;
    }

    state.connections.remove(&conn_id);
    info!(conn_id = %conn_id, "WebSocket connection closed");
}

/// Run the WebSocket session with read/write split
async fn run_session(
    conn_id: Uuid,
    role: Role,
    relay: &RelayChannel,
    mut ws_sink: SplitSink<WebSocket, Message>,
    mut ws_stream: SplitStream<WebSocket>,
    mut subscription: Subscription,
) {
    let rate_limiter = ConnectionRateLimiter::new();
    let (reply_tx, mut reply_rx) = mpsc::channel::<ServerMsg>(16);

    // Writer task: relay fan-out and direct replies -> WebSocket
    let writer_handle = tokio::spawn(async move {
        loop {
            let msg = tokio::select! {
                event = subscription.recv() => match event {
                    Some(event) => ServerMsg::from(event),
                    None => {
                        debug!(conn_id = %conn_id, "Relay channel closed");
                        break;
                    }
                },
                reply = reply_rx.recv() => match reply {
                    Some(msg) => msg,
                    None => break,
                },
            };

            if let Err(e) = send_msg(&mut ws_sink, &msg).await {
                debug!(conn_id = %conn_id, error = %e, "WebSocket send failed");
                break;
            }
        }
    });

    // Reader loop: WebSocket -> relay
    while let Some(result) = ws_stream.next().await {
        match result {
            Ok(Message::Text(text)) => {
                if let Some(reply) = handle_client_text(&text, conn_id, role, relay, &rate_limiter) {
                    if reply_tx.send(reply).await.is_err() {
                        debug!(conn_id = %conn_id, "Writer gone");
                        break;
                    }
                }
            }
            Ok(Message::Binary(_)) => {
                warn!(conn_id = %conn_id, "Received binary message, ignoring");
            }
            Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {}
            Ok(Message::Close(_)) => {
                info!(conn_id = %conn_id, "Client initiated close");
                break;
            }
            Err(e) => {
                error!(conn_id = %conn_id, error = %e, "WebSocket error");
                break;
            }
        }
    }

    // Dropping the writer drops its subscription, which unsubscribes
    writer_handle.abort();
    let _ = writer_handle.await;
}

/// Handle one text frame; returns a reply for this connection only, if any.
///
/// Bad input never ends the session.
pub(crate) fn handle_client_text(
    text: &str,
    conn_id: Uuid,
    role: Role,
    relay: &RelayChannel,
    rate_limiter: &ConnectionRateLimiter,
) -> Option<ServerMsg> {
    let msg = match serde_json::from_str::<ClientMsg>(text) {
        Ok(msg) => msg,
        Err(e) => {
            warn!(conn_id = %conn_id, error = %e, "Failed to parse client message");
            return Some(ServerMsg::error(error_code::BAD_MESSAGE, e.to_string()));
        }
    };

    match msg {
        ClientMsg::Ping { t } => Some(ServerMsg::Pong { t }),
        ClientMsg::MoveBall { data } => {
            if role != Role::Admin {
                warn!(conn_id = %conn_id, "Viewer attempted to publish a move");
                return Some(ServerMsg::error(error_code::FORBIDDEN, "viewers cannot move the ball"));
            }

            if !rate_limiter.check_move() {
                warn!(conn_id = %conn_id, "Rate limited move message");
                return Some(ServerMsg::error(error_code::RATE_LIMITED, "too many moves, slow down"));
            }

            let direction = match data.parse::<Direction>() {
                Ok(direction) => direction,
                Err(e) => {
                    warn!(conn_id = %conn_id, error = %e, "Rejected move");
                    return Some(ServerMsg::error(error_code::UNKNOWN_DIRECTION, e.to_string()));
                }
            };

            match relay.publish(MoveEvent {
                direction,
                origin: conn_id,
            }) {
                Ok(delivered) => {
                    info!(conn_id = %conn_id, %direction, delivered, "Move published");
                    None
                }
                Err(e @ RelayError::ChannelUnavailable) => {
                    warn!(conn_id = %conn_id, %direction, "Publish on closed relay");
                    Some(ServerMsg::error(error_code::CHANNEL_UNAVAILABLE, e.to_string()))
                }
            }
        }
    }
}

/// Send a message over WebSocket
async fn send_msg(
    sink: &mut SplitSink<WebSocket, Message>,
    msg: &ServerMsg,
) -> Result<(), SendError> {
    let json = serde_json::to_string(msg)?;
    sink.send(Message::Text(json)).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::ViewState;

    fn error_code_of(msg: Option<ServerMsg>) -> Option<String> {
        match msg {
            Some(ServerMsg::Error { code, .. }) => Some(code),
            _ => None,
        }
    }

    #[test]
    fn admin_move_reaches_viewers() {
        let relay = RelayChannel::default();
        let limiter = ConnectionRateLimiter::new();
        let admin = Uuid::new_v4();
        let _admin_sub = relay.subscribe(admin);
        let viewer_id = Uuid::new_v4();
        let mut viewer_sub = relay.subscribe(viewer_id);
        let mut viewer = ViewState::viewer(viewer_id);

        let reply = handle_client_text(
            r#"{"event":"moveBall","data":"left1"}"#,
            admin,
            Role::Admin,
            &relay,
            &limiter,
        );
        assert!(reply.is_none());

        let event = viewer_sub.try_recv().expect("fanned out");
        assert_eq!(event.origin, admin);
        viewer.apply_remote(event.origin, event.direction);
        assert_eq!(viewer.last_direction(), Some(Direction::Left1));
    }

    #[test]
    fn unknown_direction_is_rejected_without_side_effects() {
        let relay = RelayChannel::default();
        let limiter = ConnectionRateLimiter::new();
        let admin = Uuid::new_v4();
        let mut viewer_sub = relay.subscribe(Uuid::new_v4());

        let reply = handle_client_text(
            r#"{"event":"moveBall","data":"diagonal1"}"#,
            admin,
            Role::Admin,
            &relay,
            &limiter,
        );
        assert_eq!(error_code_of(reply).as_deref(), Some(error_code::UNKNOWN_DIRECTION));
        assert!(viewer_sub.try_recv().is_none());
        assert!(relay.is_open());
    }

    #[test]
    fn viewer_cannot_publish() {
        let relay = RelayChannel::default();
        let limiter = ConnectionRateLimiter::new();
        let viewer = Uuid::new_v4();
        let mut sub = relay.subscribe(viewer);

        let reply = handle_client_text(
            r#"{"event":"moveBall","data":"up1"}"#,
            viewer,
            Role::Viewer,
            &relay,
            &limiter,
        );
        assert_eq!(error_code_of(reply).as_deref(), Some(error_code::FORBIDDEN));
        assert!(sub.try_recv().is_none());
    }

    #[test]
    fn publish_on_closed_relay_is_reported() {
        let relay = RelayChannel::default();
        let limiter = ConnectionRateLimiter::new();

        let reply = handle_client_text(
            r#"{"event":"moveBall","data":"up1"}"#,
            Uuid::new_v4(),
            Role::Admin,
            &relay,
            &limiter,
        );
        assert_eq!(error_code_of(reply).as_deref(), Some(error_code::CHANNEL_UNAVAILABLE));
    }

    #[test]
    fn garbage_and_ping() {
        let relay = RelayChannel::default();
        let limiter = ConnectionRateLimiter::new();
        let id = Uuid::new_v4();

        let reply = handle_client_text("{nope", id, Role::Admin, &relay, &limiter);
        assert_eq!(error_code_of(reply).as_deref(), Some(error_code::BAD_MESSAGE));

        let reply = handle_client_text(r#"{"event":"ping","t":42}"#, id, Role::Viewer, &relay, &limiter);
        assert_eq!(reply, Some(ServerMsg::Pong { t: 42 }));
    }

    #[test]
    fn excess_moves_are_refused_with_a_reply() {
        let relay = RelayChannel::default();
        let limiter = ConnectionRateLimiter::with_rate(2);
        let admin = Uuid::new_v4();
        let mut sub = relay.subscribe(Uuid::new_v4());

        let replies: Vec<Option<String>> = (0..5)
            .map(|_| {
                error_code_of(handle_client_text(
                    r#"{"event":"moveBall","data":"up2"}"#,
                    admin,
                    Role::Admin,
                    &relay,
                    &limiter,
                ))
            })
            .collect();
        assert_eq!(&replies[..2], &[None, None]);
        for reply in &replies[2..] {
            assert_eq!(reply.as_deref(), Some(error_code::RATE_LIMITED));
        }

        let mut received = 0;
        while sub.try_recv().is_some() {
            received += 1;
        }
        assert_eq!(received, 2);
    }

    #[test]
    fn refused_move_does_not_leave_admin_and_viewer_apart() {
        let relay = RelayChannel::default();
        let limiter = ConnectionRateLimiter::with_rate(1);
        let admin_id = Uuid::new_v4();
        let viewer_id = Uuid::new_v4();
        let mut admin_sub = relay.subscribe(admin_id);
        let mut viewer_sub = relay.subscribe(viewer_id);
        let mut admin = ViewState::admin(admin_id);
        let mut viewer = ViewState::viewer(viewer_id);

        let mut replies = Vec::new();
        for (direction, wire) in [(Direction::Up1, "up1"), (Direction::Down2, "down2")] {
            admin.press(direction).unwrap();
            let frame = format!(r#"{{"event":"moveBall","data":"{wire}"}}"#);
            replies.push(handle_client_text(&frame, admin_id, Role::Admin, &relay, &limiter));
        }
        assert!(replies[0].is_none());
        assert_eq!(error_code_of(replies[1].clone()).as_deref(), Some(error_code::RATE_LIMITED));

        // Refusal overtakes the echo of the accepted move
        admin.reject_press();
        while let Some(event) = admin_sub.try_recv() {
            admin.apply_remote(event.origin, event.direction);
        }
        while let Some(event) = viewer_sub.try_recv() {
            viewer.apply_remote(event.origin, event.direction);
        }

        assert_eq!(viewer.last_direction(), Some(Direction::Up1));
        assert_eq!(admin.label(), viewer.label());
    }
}
