//! Shared state-sync payload builder (`spec.md` §4.8), used by both the
//! `request_state_sync` socket tag and the `GET /quiz/{code}/state` HTTP
//! handler so the two entrypoints can never drift — the same "shared
//! logic behind two entrypoints" shape the teacher uses for `casino.rs`'s
//! `start`/`close`/`bridge` functions shared across multiple HTTP routes.

use serde::Serialize;
use serde_json::Value;

use crate::model::Question;
use crate::room::phase::Phase;
use crate::room::state::RoomState;

#[derive(Debug, Clone, Serialize)]
pub struct StateSyncPayload {
    pub phase: Phase,
    pub current_question: u32,
    pub question_number: u32,
    pub total_questions: u32,
    pub show_answers: bool,
    pub server_time: i64,
    pub question_start_time: i64,
    pub time_limit: u32,
    pub time_remaining: f64,
    pub answered_count: usize,
    pub total_participants: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_leaderboard: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_final: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_podium: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub participant_score: Option<u32>,
}

pub fn build(state: &RoomState, questions: &[Question], now_ms: i64, participant_score: Option<u32>) -> StateSyncPayload {
    let phase = state.phase();
    let question = if phase.is_question_context() {
        questions
            .get(state.current_question() as usize)
            .map(|q| serde_json::to_value(q.sanitized()).unwrap_or(Value::Null))
    } else {
        None
    };

    let (redirect_leaderboard, is_final, redirect_podium) = match phase {
        Phase::Leaderboard => (Some(true), Some(false), None),
        Phase::FinalLeaderboard => (Some(true), Some(true), None),
        Phase::Podium => (None, None, Some(true)),
        _ => (None, None, None),
    };

    StateSyncPayload {
        phase,
        current_question: state.current_question(),
        question_number: state.current_question() + 1,
        total_questions: state.total_questions(),
        show_answers: state.show_answers(),
        server_time: now_ms,
        question_start_time: state.question_start_ms(),
        time_limit: state.time_limit_seconds(),
        time_remaining: state.time_remaining_seconds(now_ms),
        answered_count: state.answered_count(),
        total_participants: state.total_participants(),
        question,
        redirect_leaderboard,
        is_final,
        redirect_podium,
        participant_score,
    }
}
