//! Durable quiz record (`spec.md` §3 "Quiz").

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::id::{Unique, ID};

/// Alphabet excludes visually ambiguous glyphs, per `spec.md` §3: no `O`,
/// `0`, `I`, `1`.
const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
const CODE_LENGTH: usize = 6;

/// Bounds durable participants per quiz; independent of the per-room
/// socket cap in `spec.md` §4.9.
pub const MAX_PARTICIPANTS: u32 = 1000;

pub struct QuizMarker;
pub type QuizId = ID<QuizMarker>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuizStatus {
    Active,
    Inactive,
    Ended,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quiz {
    pub id: QuizId,
    pub code: String,
    pub title: String,
    pub description: String,
    pub duration_seconds: u32,
    pub status: QuizStatus,
    pub created_at: DateTime<Utc>,
    pub question_count: u32,
    pub participant_count: u32,
    pub attempt_cap: u32,
    pub shuffle_questions: bool,
    pub show_correct_answers: bool,
    pub start_window: Option<DateTime<Utc>>,
    pub end_window: Option<DateTime<Utc>>,
    pub last_played_at: Option<DateTime<Utc>>,
}

impl Unique for Quiz {
    fn id(&self) -> QuizId {
        self.id
    }
}

/// Draws a random 6-character code from the restricted alphabet. Collision
/// retry against the store is the caller's responsibility (`spec.md` §7
/// kind 4 treats exhausted retries as a conflict).
pub fn generate_code() -> String {
    let mut rng = rand::rng();
    (0..CODE_LENGTH)
        .map(|_| {
            let idx = rng.random_range(0..CODE_ALPHABET.len());
            CODE_ALPHABET[idx] as char
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_code_has_expected_length_and_alphabet() {
        let code = generate_code();
        assert_eq!(code.len(), CODE_LENGTH);
        assert!(code.chars().all(|c| CODE_ALPHABET.contains(&(c as u8))));
        assert!(!code.contains(['O', '0', 'I', '1']));
    }
}
