//! Durable participant record (`spec.md` §3 "Participant", "Answer
//! record"). Owned during a live room by the controller's in-memory
//! roster; the store holds the durable copy (`spec.md` §3 "Ownership").

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::{Unique, ID};
use crate::scoring::ScoreBreakdown;

pub struct ParticipantMarker;
pub type ParticipantId = ID<ParticipantMarker>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerRecord {
    pub question_index: u32,
    pub selected_options: Vec<usize>,
    pub correct: bool,
    pub time_taken_seconds: f64,
    pub points: u32,
    pub breakdown: ScoreBreakdown,
    pub submitted_at: DateTime<Utc>,
}

impl AnswerRecord {
    /// Auto-submit sentinel for a timed-out question: marks-answered with
    /// no score, per `spec.md` §9 Open Question 3.
    pub fn auto_submitted(question_index: u32, time_taken_seconds: f64, submitted_at: DateTime<Utc>) -> Self {
        Self {
            question_index,
            selected_options: Vec::new(),
            correct: false,
            time_taken_seconds,
            points: 0,
            breakdown: ScoreBreakdown::default(),
            submitted_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Participant {
    pub id: ParticipantId,
    pub quiz_code: String,
    pub display_name: String,
    pub avatar_seed: String,
    pub joined_at: DateTime<Utc>,
    pub score: u32,
    pub total_time_seconds: f64,
    pub answers: Vec<AnswerRecord>,
    pub last_active_at: DateTime<Utc>,
    pub attempt_number: u32,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Unique for Participant {
    fn id(&self) -> ParticipantId {
        self.id
    }
}

impl Participant {
    /// Trims and validates a display name per `spec.md` §3 (1-50 chars
    /// after trimming).
    pub fn normalize_display_name(raw: &str) -> Option<String> {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.chars().count() > 50 {
            None
        } else {
            Some(trimmed.to_string())
        }
    }

    /// `spec.md` invariant I5: at most one record per question index.
    pub fn has_answered(&self, question_index: u32) -> bool {
        self.answers.iter().any(|a| a.question_index == question_index)
    }

    pub fn record_answer(&mut self, record: AnswerRecord) {
        self.score += record.points;
        self.total_time_seconds += record.time_taken_seconds;
        self.answers.push(record);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_name_trims_and_rejects_blank() {
        assert_eq!(Participant::normalize_display_name("  Ada  "), Some("Ada".into()));
        assert_eq!(Participant::normalize_display_name("   "), None);
    }

    #[test]
    fn display_name_rejects_over_fifty_chars() {
        let long = "a".repeat(51);
        assert_eq!(Participant::normalize_display_name(&long), None);
    }
}
