//! Commands accepted on a room's serialized channel (`spec.md` §4.6
//! inbound tags plus the HTTP operations that share the same controller
//! logic per §2 "Data flow").

use std::collections::BTreeSet;

use tokio::sync::oneshot;

use crate::error::ErrorKind;
use crate::model::ParticipantId;
use crate::sync::StateSyncPayload;

#[derive(Debug)]
pub struct SubmitAnswerOutcome {
    pub correct: bool,
    pub base: u32,
    pub time_bonus: u32,
    pub streak_bonus: u32,
    pub total: u32,
    pub correct_answer: Option<serde_json::Value>,
    pub ignored: bool,
}

pub enum Command {
    AdminJoined {
        reply: oneshot::Sender<Vec<crate::room::state::ParticipantSnapshot>>,
    },
    ParticipantJoined {
        id: ParticipantId,
        display_name: String,
        avatar_seed: String,
        reply: oneshot::Sender<Result<StateSyncPayload, ErrorKind>>,
    },
    /// Fire-and-forget roster registration from `POST /join` (`spec.md`
    /// §3 invariant I1): seeds `RoomState` for a participant who may never
    /// open a websocket before submitting answers over HTTP.
    RegisterParticipant {
        id: ParticipantId,
        display_name: String,
        avatar_seed: String,
    },
    RequestStateSync {
        participant_id: Option<ParticipantId>,
        reply: oneshot::Sender<StateSyncPayload>,
    },
    QuizStarting,
    ShowAnswer,
    ShowLeaderboard,
    NextQuestion,
    SubmitAnswer {
        participant_id: ParticipantId,
        selected: BTreeSet<usize>,
        time_taken_seconds: f64,
        reply: oneshot::Sender<Result<SubmitAnswerOutcome, ErrorKind>>,
    },
    AutoSubmit {
        participant_id: ParticipantId,
        time_taken_seconds: f64,
    },
    Reaction {
        participant_id: ParticipantId,
        emoji: String,
        reply: oneshot::Sender<bool>,
    },
    KickPlayer {
        participant_id: ParticipantId,
    },
    UpdateAvatar {
        participant_id: ParticipantId,
        avatar_seed: String,
        reply: oneshot::Sender<Result<(), ErrorKind>>,
    },
    Disconnected {
        participant_id: ParticipantId,
        was_admin: bool,
    },
    QuizEnded,
    /// Admin `PATCH /admin/quiz/{code}/status` to `active`/`inactive`; the
    /// `ended` case goes through [`Command::QuizEnded`] instead, since
    /// that transition also tears the room down.
    QuizStatusChanged {
        status: &'static str,
    },
}
