//! Room lifecycle phase (`spec.md` §4.7 "Lifecycle phases").

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    Lobby,
    Question,
    AnswerReveal,
    Leaderboard,
    FinalLeaderboard,
    Podium,
    Ended,
}

impl Phase {
    /// `submit-answer` accepts silently under these phases, per `spec.md`
    /// §4.7 "Edge cases".
    pub fn accepts_answers_ignored(self) -> bool {
        matches!(self, Phase::Ended | Phase::Podium)
    }

    pub fn is_question_context(self) -> bool {
        matches!(self, Phase::Question | Phase::AnswerReveal)
    }
}
