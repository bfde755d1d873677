//! Headless display session
//!
//! Runs the arena simulation locally, mirrors admin moves into the
//! "Current Move" view, and (as admin) turns stdin lines into presses.

use std::fmt;

use futures::{Sink, SinkExt, StreamExt};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{broadcast, mpsc, watch};
use tokio::time::{interval, MissedTickBehavior};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::bus::MoveBus;
use super::ClientError;
use crate::arena::targets::{ARENA_HEIGHT, ARENA_WIDTH};
use crate::arena::{ArcadeWorld, Direction, ReactionLoop};
use crate::config::ClientConfig;
use crate::util::time::{tick_delta, tick_duration, SIMULATION_TPS};
use crate::view::{Connectivity, ViewState};
use crate::ws::protocol::{error_code, ClientMsg, Role, ServerMsg};

/// Apply one server frame to the view; returns whether the label changed
pub fn handle_server_text(view: &mut ViewState, text: &str) -> Result<bool, ClientError> {
    match serde_json::from_str::<ServerMsg>(text)? {
        ServerMsg::Welcome { conn_id, role, .. } => {
            info!(conn_id = %conn_id, %role, "Joined relay");
            view.set_conn_id(conn_id);
            Ok(false)
        }
        ServerMsg::UpdateMove { data, origin } => {
            let before = view.last_direction();
            match view.apply_wire(origin, &data) {
                Ok(_) => {
                    // A delivery means the relay channel is carrying moves again
                    let reopened = view.connectivity() == Connectivity::Disconnected;
                    if reopened {
                        view.set_connectivity(Connectivity::Connected);
                    }
                    Ok(reopened || view.last_direction() != before)
                }
                Err(e) => {
                    warn!(origin = %origin, error = %e, "Ignoring relayed move");
                    Ok(false)
                }
            }
        }
        ServerMsg::Error { code, message } => {
            warn!(%code, %message, "Relay reported an error");
            let before = view.last_direction();
            match code.as_str() {
                error_code::CHANNEL_UNAVAILABLE => {
                    view.reject_press();
                    view.set_connectivity(Connectivity::Disconnected);
                    Ok(true)
                }
                error_code::RATE_LIMITED | error_code::UNKNOWN_DIRECTION | error_code::FORBIDDEN => {
                    view.reject_press();
                    Ok(view.last_direction() != before)
                }
                _ => Ok(false),
            }
        }
        ServerMsg::Pong { t } => {
            debug!(t, "Pong");
            Ok(false)
        }
    }
}

/// Connect to the relay and run until interrupted
pub async fn run(config: ClientConfig) -> Result<(), ClientError> {
    let url = config.connect_url();
    info!(relay = %config.relay_url, role = %config.role, "Connecting");
    let (ws, _) = connect_async(url.as_str()).await?;
    let (sink, mut stream) = ws.split();

    let rng = match config.arena_seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_entropy(),
    };
    let mut arena = ReactionLoop::new(ArcadeWorld::new(ARENA_WIDTH, ARENA_HEIGHT), rng)?;
    let mut view = ViewState::new(config.role, Uuid::nil());
    let is_admin = view.role() == Role::Admin;

    let bus = MoveBus::new(16);
    let mut physics_moves = bus.subscribe();
    let (link_tx, mut link_rx) = watch::channel(Connectivity::Connected);
    let writer = tokio::spawn(publish_moves(sink, bus.subscribe(), link_tx));

    let (press_tx, mut press_rx) = mpsc::channel::<String>(16);
    if is_admin {
        tokio::spawn(read_presses(press_tx));
        info!("Type a direction (up1, up2, down1, down2, left1, left2, right1, right2) and press enter");
    } else {
        drop(press_tx);
    }

    let mut ticker = interval(tick_duration());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut ticks: u64 = 0;
    let mut relay_open = true;
    let mut presses_open = is_admin;
    let mut link_open = true;

    render(&view);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                arena.step(tick_delta())?;
                ticks += 1;
                if ticks % SIMULATION_TPS as u64 == 0 {
                    let p = arena.position()?;
                    let v = arena.velocity()?;
                    debug!(x = p.x, y = p.y, vx = v.vx, vy = v.vy, rebounds = arena.rebounds(), "Ball");
                }
            }

            line = press_rx.recv(), if presses_open => match line {
                Some(line) => {
                    if press_line(&mut view, &bus, &line).is_some() {
                        render(&view);
                    }
                }
                None => {
                    info!("Input closed");
                    presses_open = false;
                }
            },

            pressed = physics_moves.recv() => match pressed {
                Ok(direction) => {
                    arena.apply_direction(direction)?;
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!(skipped = n, "Physics handler lagged");
                }
                Err(broadcast::error::RecvError::Closed) => {}
            },

            frame = stream.next(), if relay_open => match frame {
                Some(Ok(Message::Text(text))) => match handle_server_text(&mut view, &text) {
                    Ok(true) => render(&view),
                    Ok(false) => {}
                    Err(e) => warn!(error = %e, "Bad frame from relay"),
                },
                Some(Ok(Message::Close(_))) | None => {
                    relay_open = false;
                    mark_disconnected(&mut view);
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    warn!(error = %e, "Relay connection error");
                    relay_open = false;
                    mark_disconnected(&mut view);
                }
            },

            changed = link_rx.changed(), if link_open => match changed {
                Ok(()) => {
                    if *link_rx.borrow() == Connectivity::Disconnected {
                        mark_disconnected(&mut view);
                    }
                }
                Err(_) => link_open = false,
            },

            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                break;
            }
        }
    }

    writer.abort();
    Ok(())
}

fn render(view: &ViewState) {
    info!(conn_id = %view.conn_id(), "{}", view.label());
}

fn mark_disconnected(view: &mut ViewState) {
    if view.connectivity() != Connectivity::Disconnected {
        view.set_connectivity(Connectivity::Disconnected);
        render(view);
    }
}

/// Apply one input line as a press: the label first, then a single emit
/// that both the physics handler and the publisher consume
fn press_line(view: &mut ViewState, bus: &MoveBus, line: &str) -> Option<Direction> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    let direction = match line.parse::<Direction>() {
        Ok(direction) => direction,
        Err(e) => {
            warn!(error = %e, "Ignoring press");
            return None;
        }
    };
    if let Err(e) = view.press(direction) {
        warn!(%direction, error = %e, "Ignoring press");
        return None;
    }

    let consumers = bus.emit(direction);
    debug!(%direction, consumers, "Press emitted");
    Some(direction)
}

/// Network publisher: forwards every press to the relay.
///
/// The first failed send flips `link_tx` to `Disconnected`; later presses
/// are logged as not published.
async fn publish_moves<S>(
    mut sink: S,
    mut moves: broadcast::Receiver<Direction>,
    link_tx: watch::Sender<Connectivity>,
) where
    S: Sink<Message> + Unpin,
    S::Error: fmt::Display,
{
    let mut connected = true;

    loop {
        let direction = match moves.recv().await {
            Ok(direction) => direction,
            Err(broadcast::error::RecvError::Lagged(n)) => {
                warn!(skipped = n, "Publisher lagged");
                continue;
            }
            Err(broadcast::error::RecvError::Closed) => break,
        };

        if !connected {
            warn!(%direction, error = %ClientError::ChannelUnavailable, "Move not published");
            continue;
        }

        let frame = match move_frame(direction) {
            Ok(frame) => frame,
            Err(e) => {
                warn!(%direction, error = %e, "Move not published");
                continue;
            }
        };

        if let Err(e) = sink.send(frame).await {
            warn!(%direction, error = %e, "Move not published");
            connected = false;
            if link_tx.send(Connectivity::Disconnected).is_err() {
                debug!("Connectivity watcher gone, session already ended");
            }
        }
    }
}

fn move_frame(direction: Direction) -> Result<Message, ClientError> {
    let msg = ClientMsg::MoveBall {
        data: direction.to_string(),
    };
    Ok(Message::Text(serde_json::to_string(&msg)?))
}

async fn read_presses(tx: mpsc::Sender<String>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        if tx.send(line).await.is_err() {
            break;
        }
    }
}
