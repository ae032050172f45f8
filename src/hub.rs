//! Per-room broadcast fan-out (`spec.md` §4.5). One hub per room, created
//! on first connection and torn down when the last socket leaves. Mirrors
//! the teacher's `casino.rs::bridge` `tokio::select!` multiplexing shape,
//! generalized from a single poker table to many named sockets per room
//! plus a coalescing batch window.

use std::collections::HashMap;
use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::time::{Instant, Sleep, interval_at, sleep};

use crate::model::ParticipantId;

/// Outbound socket tags that MUST flush unbatched, per `spec.md` §4.5.
const PRIORITY_TAGS: &[&str] = &[
    "quiz_starting",
    "next_question",
    "show_answer",
    "show_leaderboard",
    "show_podium",
    "sync_state",
    "question_time_sync",
    "participant_kicked",
    "quiz_ended",
];

const BATCH_WINDOW: Duration = Duration::from_millis(10);
const SWEEP_INTERVAL: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Serialize)]
pub struct Event {
    #[serde(rename = "type")]
    pub tag: &'static str,
    #[serde(flatten)]
    pub payload: Value,
}

impl Event {
    pub fn new(tag: &'static str, payload: Value) -> Self {
        Self { tag, payload }
    }

    fn is_priority(&self) -> bool {
        PRIORITY_TAGS.contains(&self.tag)
    }
}

/// Close codes, per `spec.md` §6 "Close codes".
#[derive(Debug, Clone, Copy)]
pub enum CloseReason {
    Replaced,
    QuizEnded,
    Capacity,
    Kicked,
}

impl CloseReason {
    pub fn code(self) -> u16 {
        match self {
            CloseReason::Replaced => 1000,
            CloseReason::QuizEnded => 1008,
            CloseReason::Capacity => 1013,
            CloseReason::Kicked => 4001,
        }
    }
}

struct Socket {
    text: UnboundedSender<String>,
    control: UnboundedSender<CloseReason>,
}

pub enum HubCommand {
    Broadcast(Event),
    Unicast(ParticipantId, Event),
    /// Registers a socket's outbound channels; displaces any prior socket
    /// for the same participant id (`spec.md` §4.6 "replaced").
    Register {
        id: ParticipantId,
        text: UnboundedSender<String>,
        control: UnboundedSender<CloseReason>,
    },
    Unregister(ParticipantId),
    Close(ParticipantId, CloseReason),
}

/// Handle the room controller and sessions hold to talk to the hub task.
#[derive(Clone)]
pub struct HubHandle {
    tx: UnboundedSender<HubCommand>,
}

impl HubHandle {
    pub fn broadcast(&self, event: Event) {
        let _ = self.tx.send(HubCommand::Broadcast(event));
    }

    pub fn unicast(&self, id: ParticipantId, event: Event) {
        let _ = self.tx.send(HubCommand::Unicast(id, event));
    }

    pub fn register(&self, id: ParticipantId, text: UnboundedSender<String>, control: UnboundedSender<CloseReason>) {
        let _ = self.tx.send(HubCommand::Register { id, text, control });
    }

    pub fn unregister(&self, id: ParticipantId) {
        let _ = self.tx.send(HubCommand::Unregister(id));
    }

    pub fn close(&self, id: ParticipantId, reason: CloseReason) {
        let _ = self.tx.send(HubCommand::Close(id, reason));
    }
}

pub fn spawn() -> HubHandle {
    let (tx, rx) = mpsc::unbounded_channel();
    tokio::spawn(run(rx));
    HubHandle { tx }
}

/// `Sleep` is `!Unpin`; a batch window is only ever armed while `pending`
/// is non-empty, so this is `Box::pin`ned lazily rather than kept as a
/// permanently-alive timer like `sweep`.
async fn run(mut rx: UnboundedReceiver<HubCommand>) {
    let mut sockets: HashMap<ParticipantId, Socket> = HashMap::new();
    let mut pending: Vec<Value> = Vec::new();
    let mut batch_timer: Option<std::pin::Pin<Box<Sleep>>> = None;
    let mut sweep = interval_at(Instant::now() + SWEEP_INTERVAL, SWEEP_INTERVAL);

    loop {
        tokio::select! {
            biased;

            command = rx.recv() => {
                match command {
                    Some(HubCommand::Register { id, text, control }) => {
                        if let Some(previous) = sockets.insert(id, Socket { text, control }) {
                            let _ = previous.control.send(CloseReason::Replaced);
                        }
                    }
                    Some(HubCommand::Unregister(id)) => {
                        sockets.remove(&id);
                    }
                    Some(HubCommand::Close(id, reason)) => {
                        if let Some(socket) = sockets.remove(&id) {
                            let _ = socket.control.send(reason);
                        }
                    }
                    Some(HubCommand::Unicast(id, event)) => {
                        send_to(&mut sockets, id, &event);
                    }
                    Some(HubCommand::Broadcast(event)) => {
                        if event.is_priority() {
                            flush_pending(&mut sockets, &mut pending);
                            batch_timer = None;
                            broadcast_one(&mut sockets, &event);
                        } else {
                            pending.push(serde_json::to_value(&event).unwrap_or(Value::Null));
                            if batch_timer.is_none() {
                                batch_timer = Some(Box::pin(sleep(BATCH_WINDOW)));
                            }
                        }
                    }
                    None => break,
                }
            }

            _ = async { batch_timer.as_mut().unwrap().as_mut().await }, if batch_timer.is_some() => {
                flush_pending(&mut sockets, &mut pending);
                batch_timer = None;
            }

            _ = sweep.tick() => {
                sockets.retain(|_, socket| !socket.text.is_closed());
            }
        }
    }
}

fn send_to(sockets: &mut HashMap<ParticipantId, Socket>, id: ParticipantId, event: &Event) {
    let Some(socket) = sockets.get(&id) else { return };
    let Ok(text) = serde_json::to_string(event) else { return };
    if socket.text.send(text).is_err() {
        log::warn!("dead socket for participant {id}, removing without retry");
        sockets.remove(&id);
    }
}

fn broadcast_one(sockets: &mut HashMap<ParticipantId, Socket>, event: &Event) {
    let Ok(text) = serde_json::to_string(event) else { return };
    sockets.retain(|id, socket| {
        if socket.text.send(text.clone()).is_err() {
            log::warn!("dead socket for participant {id}, removing without retry");
            false
        } else {
            true
        }
    });
}

fn flush_pending(sockets: &mut HashMap<ParticipantId, Socket>, pending: &mut Vec<Value>) {
    if pending.is_empty() {
        return;
    }
    let batch = serde_json::json!({ "type": "batch", "messages": pending });
    let Ok(text) = serde_json::to_string(&batch) else {
        pending.clear();
        return;
    };
    sockets.retain(|id, socket| {
        if socket.text.send(text.clone()).is_err() {
            log::warn!("dead socket for participant {id}, removing without retry");
            false
        } else {
            true
        }
    });
    pending.clear();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn priority_event_reaches_registered_socket() {
        let hub = spawn();
        let (text_tx, mut text_rx) = mpsc::unbounded_channel();
        let (control_tx, _control_rx) = mpsc::unbounded_channel();
        let id = ParticipantId::default();
        hub.register(id, text_tx, control_tx);
        hub.broadcast(Event::new("quiz_starting", serde_json::json!({"a": 1})));
        let received = tokio::time::timeout(Duration::from_millis(200), text_rx.recv())
            .await
            .expect("message received")
            .expect("channel open");
        assert!(received.contains("quiz_starting"));
    }

    #[tokio::test]
    async fn registering_same_id_closes_previous_socket_as_replaced() {
        let hub = spawn();
        let (text_tx1, _text_rx1) = mpsc::unbounded_channel();
        let (control_tx1, mut control_rx1) = mpsc::unbounded_channel();
        let (text_tx2, _text_rx2) = mpsc::unbounded_channel();
        let (control_tx2, _control_rx2) = mpsc::unbounded_channel();
        let id = ParticipantId::default();
        hub.register(id, text_tx1, control_tx1);
        hub.register(id, text_tx2, control_tx2);
        let reason = tokio::time::timeout(Duration::from_millis(200), control_rx1.recv())
            .await
            .expect("closed")
            .expect("channel open");
        assert_eq!(reason.code(), 1000);
    }
}
