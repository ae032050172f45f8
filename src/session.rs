//! Per-connection WebSocket handler (`spec.md` §4.6). Accepts the
//! upgrade, enforces admission control, expects an identification frame,
//! then dispatches parsed frames onto the room's command channel and
//! relays the hub's outbound events back to the socket. Grounded in the
//! teacher's `hosting::casino::bridge` (`src/hosting/casino.rs`): a
//! `tokio::select!` loop bridging a WebSocket stream to channel
//! endpoints, generalized from one fixed client slot to many identified
//! participant sockets plus an admin socket, with heartbeats and a
//! first-frame identification handshake layered on top.

use std::sync::Arc;
use std::time::Instant;

use actix_web::{HttpRequest, HttpResponse, web};
use futures::StreamExt;
use serde_json::{Value, json};
use tokio::sync::mpsc;

use crate::admission::AdmissionDecision;
use crate::auth::Crypto;
use crate::clock::Clock;
use crate::config::Config;
use crate::hub::CloseReason;
use crate::lobby::{Lobby, Room};
use crate::model::ParticipantId;
use crate::room::Command;

enum Identity {
    Unidentified,
    Admin(ParticipantId),
    Participant(ParticipantId),
}

/// Entry point wired to the `GET /ws/{code}` route in [`crate::server`].
pub async fn handle(
    req: HttpRequest,
    body: web::Payload,
    lobby: web::Data<Lobby>,
    crypto: web::Data<Crypto>,
    clock: web::Data<Arc<dyn Clock>>,
    config: web::Data<Config>,
    code: web::Path<String>,
) -> actix_web::Result<HttpResponse> {
    let code = code.into_inner();
    let is_admin_socket = req
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .and_then(|token| crypto.verify(token).ok())
        .map(|claims| claims.is_admin())
        .unwrap_or(false);

    let room = lobby
        .get_or_create(&code)
        .await
        .map_err(|_| actix_web::error::ErrorNotFound("quiz not found"))?;

    match room.admission.try_accept(clock.now_ms()) {
        AdmissionDecision::Accept => {}
        AdmissionDecision::CapacityExceeded | AdmissionDecision::RateLimited => {
            return Ok(HttpResponse::TooManyRequests().body("room is not accepting connections"));
        }
    }
    room.socket_connected();

    let (response, session, stream) = actix_ws::handle(&req, body)?;
    let lobby = lobby.into_inner();
    let clock: Arc<dyn Clock> = Arc::clone(&clock);
    let heartbeat_interval = config.heartbeat_interval;
    let heartbeat_timeout = config.heartbeat_timeout;

    actix_web::rt::spawn(async move {
        run(session, stream, &room, is_admin_socket, clock.as_ref(), heartbeat_interval, heartbeat_timeout).await;
        room.admission.release();
        if room.socket_disconnected() {
            lobby.remove(&code).await;
        }
    });

    Ok(response)
}

async fn run(
    mut session: actix_ws::Session,
    mut stream: actix_ws::MessageStream,
    room: &Room,
    is_admin_socket: bool,
    clock: &dyn Clock,
    heartbeat_interval: std::time::Duration,
    heartbeat_timeout: std::time::Duration,
) {
    let (text_tx, mut text_rx) = mpsc::unbounded_channel::<String>();
    let (control_tx, mut control_rx) = mpsc::unbounded_channel::<CloseReason>();

    let mut identity = Identity::Unidentified;
    let mut heartbeat = tokio::time::interval(heartbeat_interval);
    let mut last_seen = Instant::now();

    'bridge: loop {
        tokio::select! {
            biased;

            reason = control_rx.recv() => {
                let reason = reason.unwrap_or(CloseReason::QuizEnded);
                let frame = json!({ "type": "closed", "code": reason.code() });
                if let Ok(text) = serde_json::to_string(&frame) {
                    let _ = session.text(text).await;
                }
                let _ = session.close(None).await;
                break 'bridge;
            }

            outgoing = text_rx.recv() => {
                match outgoing {
                    Some(text) if session.text(text).await.is_ok() => {}
                    _ => break 'bridge,
                }
            }

            _ = heartbeat.tick() => {
                if last_seen.elapsed() >= heartbeat_timeout {
                    break 'bridge;
                }
                if session.ping(b"").await.is_err() {
                    break 'bridge;
                }
            }

            incoming = stream.next() => {
                match incoming {
                    Some(Ok(actix_ws::Message::Text(text))) => {
                        last_seen = Instant::now();
                        handle_frame(
                            &text,
                            room,
                            is_admin_socket,
                            &mut identity,
                            &text_tx,
                            &control_tx,
                            clock,
                        ).await;
                    }
                    Some(Ok(actix_ws::Message::Ping(bytes))) => {
                        last_seen = Instant::now();
                        if session.pong(&bytes).await.is_err() { break 'bridge; }
                    }
                    Some(Ok(actix_ws::Message::Pong(_))) => { last_seen = Instant::now(); }
                    Some(Ok(actix_ws::Message::Close(_))) | None => break 'bridge,
                    Some(Err(_)) => break 'bridge,
                    _ => continue,
                }
            }
        }
    }

    match identity {
        Identity::Participant(id) => {
            room.hub.unregister(id);
            let _ = room.commands.send(Command::Disconnected { participant_id: id, was_admin: false });
        }
        Identity::Admin(id) => {
            room.hub.unregister(id);
            let _ = room.commands.send(Command::Disconnected { participant_id: id, was_admin: true });
        }
        Identity::Unidentified => {}
    }
    let _ = session.close(None).await;
}

/// Dispatches one parsed text frame per the inbound tag table in
/// `spec.md` §4.6. Unknown tags are ignored; admin tags arriving before
/// the `admin_joined` handshake, or from a non-admin socket, are dropped.
async fn handle_frame(
    raw: &str,
    room: &Room,
    is_admin_socket: bool,
    identity: &mut Identity,
    text_tx: &mpsc::UnboundedSender<String>,
    control_tx: &mpsc::UnboundedSender<CloseReason>,
    clock: &dyn Clock,
) {
    let Ok(frame) = serde_json::from_str::<Value>(raw) else { return };
    let Some(tag) = frame.get("type").and_then(Value::as_str) else { return };
    let is_admin = matches!(identity, Identity::Admin(_));

    match tag {
        "admin_joined" if is_admin_socket => {
            let id = ParticipantId::default();
            *identity = Identity::Admin(id);
            room.hub.register(id, text_tx.clone(), control_tx.clone());
            let (reply_tx, reply_rx) = tokio::sync::oneshot::channel();
            if room.commands.send(Command::AdminJoined { reply: reply_tx }).is_ok() {
                if let Ok(participants) = reply_rx.await {
                    send(text_tx, "all_participants", json!({ "participants": participants }));
                }
            }
        }
        "participant_joined" => {
            let Some(id) = frame
                .get("participantId")
                .and_then(Value::as_str)
                .and_then(|s| s.parse::<uuid::Uuid>().ok())
            else {
                return;
            };
            let id = ParticipantId::from(id);
            let display_name = frame.get("displayName").and_then(Value::as_str).unwrap_or_default().to_string();
            let avatar_seed = frame.get("avatarSeed").and_then(Value::as_str).unwrap_or_default().to_string();

            *identity = Identity::Participant(id);
            room.hub.register(id, text_tx.clone(), control_tx.clone());

            let (reply_tx, reply_rx) = tokio::sync::oneshot::channel();
            let sent = room.commands.send(Command::ParticipantJoined {
                id,
                display_name,
                avatar_seed,
                reply: reply_tx,
            });
            if sent.is_ok() {
                if let Ok(Ok(payload)) = reply_rx.await {
                    if let Ok(value) = serde_json::to_value(&payload) {
                        send(text_tx, "sync_state", value);
                    }
                }
            }
        }
        "request_state_sync" => {
            let participant_id = match identity {
                Identity::Participant(id) => Some(*id),
                _ => None,
            };
            let (reply_tx, reply_rx) = tokio::sync::oneshot::channel();
            if room.commands.send(Command::RequestStateSync { participant_id, reply: reply_tx }).is_ok() {
                if let Ok(payload) = reply_rx.await {
                    if let Ok(value) = serde_json::to_value(&payload) {
                        send(text_tx, "sync_state", value);
                    }
                }
            }
        }
        "quiz_starting" if is_admin => {
            let _ = room.commands.send(Command::QuizStarting);
        }
        "show_answer" if is_admin => {
            let _ = room.commands.send(Command::ShowAnswer);
        }
        "show_leaderboard" if is_admin => {
            let _ = room.commands.send(Command::ShowLeaderboard);
        }
        "next_question" if is_admin => {
            let _ = room.commands.send(Command::NextQuestion);
        }
        "auto_submit" => {
            if let Identity::Participant(id) = identity {
                let time_taken_seconds = frame.get("timeTakenSeconds").and_then(Value::as_f64).unwrap_or(0.0);
                let _ = room.commands.send(Command::AutoSubmit { participant_id: *id, time_taken_seconds });
            }
        }
        "reaction" => {
            if let Identity::Participant(id) = identity {
                if let Some(emoji) = frame.get("emoji").and_then(Value::as_str) {
                    let (reply_tx, _reply_rx) = tokio::sync::oneshot::channel();
                    let _ = room.commands.send(Command::Reaction {
                        participant_id: *id,
                        emoji: emoji.to_string(),
                        reply: reply_tx,
                    });
                }
            }
        }
        "kick_player" if is_admin => {
            if let Some(id) = frame
                .get("participantId")
                .and_then(Value::as_str)
                .and_then(|s| s.parse::<uuid::Uuid>().ok())
            {
                let _ = room.commands.send(Command::KickPlayer { participant_id: ParticipantId::from(id) });
            }
        }
        "ping" => {
            let client_time = frame.get("t").or_else(|| frame.get("clientTime")).cloned();
            send(text_tx, "pong", json!({ "t": client_time, "serverTime": clock.now_ms() }));
        }
        _ => {}
    }
}

fn send(text_tx: &mpsc::UnboundedSender<String>, tag: &'static str, payload: Value) {
    let event = crate::hub::Event::new(tag, payload);
    if let Ok(text) = serde_json::to_string(&event) {
        let _ = text_tx.send(text);
    }
}
