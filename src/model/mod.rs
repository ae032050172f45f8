//! Durable data model: quiz, question, participant, answer record, and the
//! phantom-typed identifiers tying them together.

pub mod id;
pub mod participant;
pub mod question;
pub mod quiz;

pub use id::{Unique, ID};
pub use participant::{AnswerRecord, Participant, ParticipantId, ParticipantMarker};
pub use question::{CorrectAnswer, Points, Question, SanitizedQuestion};
pub use quiz::{generate_code, Quiz, QuizId, QuizMarker, QuizStatus, MAX_PARTICIPANTS};
