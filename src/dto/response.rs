//! Outbound HTTP response bodies (`spec.md` §6 "HTTP surface").

use serde::{Deserialize, Serialize};

use crate::model::{Participant, Quiz, QuizId};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateQuizResponse {
    pub code: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinResponse {
    pub participant_id: uuid::Uuid,
    pub quiz_code: String,
    pub display_name: String,
    pub avatar_seed: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitAnswerResponse {
    pub correct: bool,
    pub base_points: u32,
    pub time_bonus: u32,
    pub streak_bonus: u32,
    pub points: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correct_answer: Option<serde_json::Value>,
    pub ignored: bool,
}

/// Cached whole (`spec.md` §4.2 `leaderboard:{code}`, 5s TTL), so it also
/// needs `Deserialize` for the cache's serde round-trip.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub rank: u32,
    pub participant_id: uuid::Uuid,
    pub display_name: String,
    pub avatar_seed: String,
    pub score: u32,
    pub total_time_seconds: f64,
}

/// Assigns dense-with-ties ranks per `spec.md` (B5): "1,1,3" not "1,2,3".
pub fn rank_leaderboard(mut participants: Vec<Participant>) -> Vec<LeaderboardEntry> {
    participants.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then(round2(a.total_time_seconds).total_cmp(&round2(b.total_time_seconds)))
    });

    let mut entries = Vec::with_capacity(participants.len());
    let mut rank = 1u32;
    let mut previous: Option<(u32, f64)> = None;
    for (position, participant) in participants.into_iter().enumerate() {
        let key = (participant.score, round2(participant.total_time_seconds));
        if let Some(previous_key) = previous {
            if previous_key != key {
                rank = position as u32 + 1;
            }
        }
        previous = Some(key);
        entries.push(LeaderboardEntry {
            rank,
            participant_id: participant.id.inner(),
            display_name: participant.display_name,
            avatar_seed: participant.avatar_seed,
            score: participant.score,
            total_time_seconds: participant.total_time_seconds,
        });
    }
    entries
}

fn round2(seconds: f64) -> f64 {
    (seconds * 100.0).round() / 100.0
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSyncResponse {
    pub server_time: i64,
    pub timestamp: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizDetail {
    #[serde(flatten)]
    pub quiz: Quiz,
    pub questions: Vec<crate::model::Question>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizSummary {
    pub id: QuizId,
    pub code: String,
    pub title: String,
    pub status: crate::model::QuizStatus,
    pub question_count: u32,
    pub participant_count: u32,
}

impl From<&Quiz> for QuizSummary {
    fn from(quiz: &Quiz) -> Self {
        Self {
            id: quiz.id,
            code: quiz.code.clone(),
            title: quiz.title.clone(),
            status: quiz.status,
            question_count: quiz.question_count,
            participant_count: quiz.participant_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use crate::model::ParticipantId;

    fn participant(score: u32, total_time: f64) -> Participant {
        Participant {
            id: ParticipantId::default(),
            quiz_code: "ABCDEF".into(),
            display_name: "p".into(),
            avatar_seed: uuid::Uuid::new_v4().to_string(),
            joined_at: Utc::now(),
            score,
            total_time_seconds: total_time,
            answers: Vec::new(),
            last_active_at: Utc::now(),
            attempt_number: 1,
            completed_at: None,
        }
    }

    #[test]
    fn b5_ties_share_rank_and_next_distinct_pair_jumps_by_tie_count() {
        let entries = rank_leaderboard(vec![
            participant(100, 5.0),
            participant(100, 5.0),
            participant(50, 2.0),
        ]);
        let ranks: Vec<u32> = entries.iter().map(|e| e.rank).collect();
        assert_eq!(ranks, vec![1, 1, 3]);
    }
}
