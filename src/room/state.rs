//! Opaque, single-owner room record (`spec.md` §4.4, §9 "Dynamic
//! `room_state` dictionaries → typed record with accessors"). Every field
//! enumerated in `spec.md` §3 "Room state" is represented; nothing is
//! exposed except the accessor vocabulary the controller needs. Never
//! read or written outside the owning controller's task.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::model::ParticipantId;
use crate::room::phase::Phase;

#[derive(Debug, Clone, Serialize)]
pub struct ParticipantSnapshot {
    pub id: ParticipantId,
    pub display_name: String,
    pub avatar_seed: String,
    pub score: u32,
}

#[derive(Debug)]
pub struct RoomState {
    phase: Phase,
    current_question: u32,
    total_questions: u32,
    time_limit_seconds: u32,
    question_start_ms: i64,
    participants: HashMap<ParticipantId, ParticipantSnapshot>,
    answered: HashSet<ParticipantId>,
    /// question index -> option index -> count.
    tally: HashMap<u32, HashMap<usize, u32>>,
    show_answers: bool,
    admin_connected: bool,
    last_reaction_ms: HashMap<ParticipantId, i64>,
}

impl RoomState {
    pub fn new(total_questions: u32) -> Self {
        Self {
            phase: Phase::Lobby,
            current_question: 0,
            total_questions,
            time_limit_seconds: 0,
            question_start_ms: 0,
            participants: HashMap::new(),
            answered: HashSet::new(),
            tally: HashMap::new(),
            show_answers: false,
            admin_connected: false,
            last_reaction_ms: HashMap::new(),
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn set_phase(&mut self, phase: Phase) {
        self.phase = phase;
    }

    pub fn current_question(&self) -> u32 {
        self.current_question
    }

    pub fn total_questions(&self) -> u32 {
        self.total_questions
    }

    pub fn is_last_question(&self) -> bool {
        self.current_question + 1 >= self.total_questions
    }

    pub fn time_limit_seconds(&self) -> u32 {
        self.time_limit_seconds
    }

    pub fn question_start_ms(&self) -> i64 {
        self.question_start_ms
    }

    /// Resets the answered set and records the question-start timestamp,
    /// per `spec.md` §4.4.
    pub fn set_question(&mut self, index: u32, time_limit_seconds: u32, now_ms: i64) {
        self.current_question = index;
        self.time_limit_seconds = time_limit_seconds;
        self.question_start_ms = now_ms;
        self.answered.clear();
        self.tally.remove(&index);
    }

    pub fn deadline_ms(&self) -> i64 {
        self.question_start_ms + (self.time_limit_seconds as i64) * 1000
    }

    /// `spec.md` §4.4: zero outside QUESTION phase.
    pub fn time_remaining_seconds(&self, now_ms: i64) -> f64 {
        if self.phase != Phase::Question {
            return 0.0;
        }
        let remaining = self.time_limit_seconds as f64 - (now_ms - self.question_start_ms) as f64 / 1000.0;
        remaining.max(0.0)
    }

    pub fn mark_answered(&mut self, id: ParticipantId) -> bool {
        self.answered.insert(id)
    }

    pub fn has_answered(&self, id: ParticipantId) -> bool {
        self.answered.contains(&id)
    }

    pub fn clear_answered(&mut self) {
        self.answered.clear();
    }

    pub fn answered_count(&self) -> usize {
        self.answered.len()
    }

    pub fn total_participants(&self) -> usize {
        self.participants.len()
    }

    /// Arrival position among this question's submissions so far, 0-based,
    /// per `spec.md` §4.3.
    pub fn arrival_position(&self) -> u32 {
        self.answered.len() as u32
    }

    pub fn record_tally(&mut self, question_index: u32, option: usize) {
        *self
            .tally
            .entry(question_index)
            .or_default()
            .entry(option)
            .or_insert(0) += 1;
    }

    pub fn tally_for(&self, question_index: u32) -> HashMap<usize, u32> {
        self.tally.get(&question_index).cloned().unwrap_or_default()
    }

    pub fn add_participant(&mut self, snapshot: ParticipantSnapshot) {
        self.participants.insert(snapshot.id, snapshot);
    }

    pub fn remove_participant(&mut self, id: ParticipantId) {
        self.participants.remove(&id);
        self.answered.remove(&id);
        self.last_reaction_ms.remove(&id);
    }

    pub fn participants(&self) -> impl Iterator<Item = &ParticipantSnapshot> {
        self.participants.values()
    }

    pub fn has_participant(&self, id: ParticipantId) -> bool {
        self.participants.contains_key(&id)
    }

    pub fn update_score(&mut self, id: ParticipantId, score: u32) {
        if let Some(snapshot) = self.participants.get_mut(&id) {
            snapshot.score = score;
        }
    }

    /// `spec.md` §3 invariant I6: avatar seeds are unique within a room.
    pub fn avatar_seed_taken(&self, seed: &str, excluding: ParticipantId) -> bool {
        self.participants
            .values()
            .any(|p| p.id != excluding && p.avatar_seed == seed)
    }

    /// Returns `false` (and leaves the snapshot untouched) if the
    /// participant is not in the room, so the caller can tell a no-op
    /// apart from a genuine update.
    pub fn set_avatar_seed(&mut self, id: ParticipantId, seed: String) -> bool {
        match self.participants.get_mut(&id) {
            Some(snapshot) => {
                snapshot.avatar_seed = seed;
                true
            }
            None => false,
        }
    }

    pub fn show_answers(&self) -> bool {
        self.show_answers
    }

    pub fn set_show_answers(&mut self, value: bool) {
        self.show_answers = value;
    }

    pub fn set_admin_connected(&mut self, value: bool) {
        self.admin_connected = value;
    }

    pub fn admin_connected(&self) -> bool {
        self.admin_connected
    }

    /// Rate-limits reactions to at least 2 s apart per participant,
    /// per `spec.md` §4.6.
    pub fn allow_reaction(&mut self, id: ParticipantId, now_ms: i64) -> bool {
        match self.last_reaction_ms.get(&id) {
            Some(&last) if now_ms - last < 2_000 => false,
            _ => {
                self.last_reaction_ms.insert(id, now_ms);
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_question_resets_answered_set() {
        let mut state = RoomState::new(3);
        let id = ParticipantId::default();
        state.mark_answered(id);
        state.set_question(1, 30, 1_000);
        assert_eq!(state.answered_count(), 0);
        assert_eq!(state.current_question(), 1);
        assert_eq!(state.question_start_ms(), 1_000);
    }

    #[test]
    fn time_remaining_is_zero_outside_question_phase() {
        let mut state = RoomState::new(1);
        state.set_question(0, 30, 0);
        state.set_phase(Phase::AnswerReveal);
        assert_eq!(state.time_remaining_seconds(10_000), 0.0);
    }

    #[test]
    fn time_remaining_counts_down_in_question_phase() {
        let mut state = RoomState::new(1);
        state.set_question(0, 30, 0);
        state.set_phase(Phase::Question);
        assert!((state.time_remaining_seconds(12_000) - 18.0).abs() < 0.01);
    }

    #[test]
    fn is_last_question_detects_final_index() {
        let mut state = RoomState::new(3);
        state.set_question(2, 30, 0);
        assert!(state.is_last_question());
    }

    #[test]
    fn i6_avatar_seed_taken_ignores_the_holder_itself() {
        let mut state = RoomState::new(1);
        let a = ParticipantId::default();
        let b = ParticipantId::default();
        state.add_participant(ParticipantSnapshot {
            id: a,
            display_name: "Ada".into(),
            avatar_seed: "fox".into(),
            score: 0,
        });
        assert!(!state.avatar_seed_taken("fox", a));
        assert!(state.avatar_seed_taken("fox", b));
    }

    #[test]
    fn set_avatar_seed_updates_existing_snapshot_only() {
        let mut state = RoomState::new(1);
        let a = ParticipantId::default();
        state.add_participant(ParticipantSnapshot {
            id: a,
            display_name: "Ada".into(),
            avatar_seed: "fox".into(),
            score: 0,
        });
        assert!(state.set_avatar_seed(a, "owl".into()));
        assert!(!state.set_avatar_seed(ParticipantId::default(), "owl".into()));
    }
}
