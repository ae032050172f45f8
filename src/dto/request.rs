//! Inbound HTTP request bodies (`spec.md` §6 "HTTP surface"). Kept
//! separate from the durable [`crate::model`] types since wire shapes and
//! storage shapes are allowed to diverge (e.g. a question is submitted
//! without an `index`, which the server assigns).

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::model::{CorrectAnswer, Points};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionInput {
    pub prompt: String,
    pub options: Vec<String>,
    pub correct_answer: CorrectAnswer,
    pub time_limit_seconds: u32,
    pub points: Points,
    pub media_ref: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateQuizRequest {
    pub title: String,
    pub description: String,
    pub duration_seconds: u32,
    #[serde(default)]
    pub attempt_cap: Option<u32>,
    #[serde(default)]
    pub shuffle_questions: bool,
    #[serde(default)]
    pub show_correct_answers: bool,
    #[serde(default)]
    pub start_window: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_window: Option<DateTime<Utc>>,
    pub questions: Vec<QuestionInput>,
}

#[derive(Debug, Deserialize)]
pub struct QuizListQuery {
    pub status: Option<String>,
    #[serde(default)]
    pub limit: Option<i64>,
    #[serde(default)]
    pub skip: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusQuery {
    pub status: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinRequest {
    pub quiz_code: String,
    pub display_name: String,
    pub avatar_seed: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantQuery {
    pub participant_id: Option<uuid::Uuid>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAvatarRequest {
    pub quiz_code: String,
    pub avatar_seed: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitAnswerRequest {
    pub quiz_code: String,
    pub participant_id: uuid::Uuid,
    pub selected_options: Vec<usize>,
    pub time_taken_seconds: f64,
}
