//! FIFO command-channel state machine (`spec.md` §4.7), the sole mutator
//! of a room's [`RoomState`]. Grounded in `src/gameroom/room.rs::run` (the
//! single owning-task event loop consuming one channel).

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use deadpool_postgres::Pool;
use serde_json::json;
use tokio::sync::mpsc;

use crate::cache::SharedCache;
use crate::clock::Clock;
use crate::db;
use crate::error::ErrorKind;
use crate::hub::{self, CloseReason, Event, HubHandle};
use crate::model::{AnswerRecord, Participant, ParticipantId, Question, Quiz, QuizStatus};
use crate::room::command::{Command, SubmitAnswerOutcome};
use crate::room::phase::Phase;
use crate::room::state::{ParticipantSnapshot, RoomState};
use crate::scoring::{self};
use crate::sync;

/// Emoji allow-list for `reaction`, per `spec.md` §4.6 "closed allow-list".
const ALLOWED_REACTIONS: &[&str] = &["👍", "❤️", "😂", "😮", "🎉", "👏"];

pub struct RoomController {
    code: String,
    pool: Pool,
    cache: SharedCache,
    clock: Arc<dyn Clock>,
    hub: HubHandle,
    quiz: Quiz,
    questions: Vec<Question>,
    state: RoomState,
    rx: mpsc::UnboundedReceiver<Command>,
}

pub type CommandSender = mpsc::UnboundedSender<Command>;

/// Spawns the controller's owning task. Returns the command sender sockets
/// and HTTP handlers use, and the hub handle for socket registration.
pub fn spawn(
    code: String,
    pool: Pool,
    cache: SharedCache,
    clock: Arc<dyn Clock>,
    quiz: Quiz,
    questions: Vec<Question>,
    participants: Vec<Participant>,
) -> (CommandSender, HubHandle) {
    let hub = hub::spawn();
    let total_questions = questions.len() as u32;
    let (tx, rx) = mpsc::unbounded_channel();
    let mut state = RoomState::new(total_questions);
    for participant in participants {
        state.add_participant(ParticipantSnapshot {
            id: participant.id,
            display_name: participant.display_name,
            avatar_seed: participant.avatar_seed,
            score: participant.score,
        });
    }
    let controller = RoomController {
        code,
        pool,
        cache,
        clock,
        hub: hub.clone(),
        quiz,
        questions,
        state,
        rx,
    };
    tokio::spawn(controller.run());
    (tx, hub)
}

impl RoomController {
    async fn run(mut self) {
        while let Some(command) = self.rx.recv().await {
            self.handle(command).await;
        }
        log::info!("room {} controller exiting, channel closed", self.code);
    }

    async fn handle(&mut self, command: Command) {
        match command {
            Command::AdminJoined { reply } => {
                self.state.set_admin_connected(true);
                let snapshot = self.state.participants().cloned().collect();
                let _ = reply.send(snapshot);
            }
            Command::ParticipantJoined {
                id,
                display_name,
                avatar_seed,
                reply,
            } => {
                if !self.state.has_participant(id) {
                    self.state.add_participant(ParticipantSnapshot {
                        id,
                        display_name: display_name.clone(),
                        avatar_seed: avatar_seed.clone(),
                        score: 0,
                    });
                    self.hub.broadcast(Event::new(
                        "participant_joined",
                        json!({ "participant": { "id": id, "name": display_name, "avatarSeed": avatar_seed } }),
                    ));
                }
                let now = self.clock.now_ms();
                let payload = sync::build(&self.state, &self.questions, now, None);
                let _ = reply.send(Ok(payload));
            }
            Command::RegisterParticipant {
                id,
                display_name,
                avatar_seed,
            } => {
                if !self.state.has_participant(id) {
                    self.state.add_participant(ParticipantSnapshot {
                        id,
                        display_name,
                        avatar_seed,
                        score: 0,
                    });
                }
            }
            Command::RequestStateSync { participant_id, reply } => {
                let now = self.clock.now_ms();
                let score = participant_id.and_then(|id| {
                    self.state.participants().find(|p| p.id == id).map(|p| p.score)
                });
                let payload = sync::build(&self.state, &self.questions, now, score);
                let _ = reply.send(payload);
            }
            Command::QuizStarting => self.start_countdown().await,
            Command::ShowAnswer => self.show_answer(),
            Command::ShowLeaderboard => self.show_leaderboard(),
            Command::NextQuestion => self.next_question(),
            Command::SubmitAnswer {
                participant_id,
                selected,
                time_taken_seconds,
                reply,
            } => {
                let outcome = self.submit_answer(participant_id, selected, time_taken_seconds).await;
                let _ = reply.send(outcome);
            }
            Command::AutoSubmit {
                participant_id,
                time_taken_seconds,
            } => self.auto_submit(participant_id, time_taken_seconds).await,
            Command::Reaction {
                participant_id,
                emoji,
                reply,
            } => {
                let allowed = self.reaction(participant_id, &emoji);
                let _ = reply.send(allowed);
            }
            Command::KickPlayer { participant_id } => self.kick(participant_id).await,
            Command::UpdateAvatar { participant_id, avatar_seed, reply } => {
                let outcome = self.update_avatar(participant_id, avatar_seed).await;
                let _ = reply.send(outcome);
            }
            Command::Disconnected { participant_id, was_admin } => {
                if was_admin {
                    self.state.set_admin_connected(false);
                }
                let _ = participant_id;
            }
            Command::QuizEnded => self.end_quiz().await,
            Command::QuizStatusChanged { status } => {
                self.quiz.status = match status {
                    "active" => QuizStatus::Active,
                    _ => QuizStatus::Inactive,
                };
                self.hub
                    .broadcast(Event::new("quiz_status_changed", json!({ "status": status })));
            }
        }
    }

    async fn start_countdown(&mut self) {
        let total = self.state.total_questions();
        let now = self.clock.now_ms();
        self.hub.broadcast(Event::new(
            "countdown_start",
            json!({ "countdown": 5, "total_questions": total, "server_time": now }),
        ));
        for remaining in (1..=4).rev() {
            tokio::time::sleep(Duration::from_secs(1)).await;
            self.hub
                .broadcast(Event::new("countdown_tick", json!({ "countdown": remaining })));
        }
        tokio::time::sleep(Duration::from_secs(1)).await;

        let now = self.clock.now_ms();
        let Some(question) = self.questions.first() else {
            log::warn!("room {} has no questions, cannot start", self.code);
            return;
        };
        self.state.set_question(0, question.time_limit_seconds, now);
        self.state.set_phase(Phase::Question);
        self.hub.broadcast(Event::new(
            "quiz_starting",
            json!({
                "question": question.sanitized(),
                "question_number": 1,
                "current_question": 0,
                "total_questions": total,
                "time_limit": question.time_limit_seconds,
                "server_time": now,
                "question_start_time": now,
            }),
        ));
    }

    fn show_answer(&mut self) {
        self.state.set_phase(Phase::AnswerReveal);
        self.state.set_show_answers(true);
        self.hub
            .broadcast(Event::new("show_answer", json!({ "phase": "ANSWER_REVEAL" })));
    }

    fn show_leaderboard(&mut self) {
        let is_final = self.state.is_last_question();
        self.state
            .set_phase(if is_final { Phase::FinalLeaderboard } else { Phase::Leaderboard });
        self.hub.broadcast(Event::new(
            "show_leaderboard",
            json!({
                "is_final": is_final,
                "current_question": self.state.current_question(),
                "total_questions": self.state.total_questions(),
            }),
        ));
    }

    fn next_question(&mut self) {
        if self.state.is_last_question() {
            self.state.set_phase(Phase::Podium);
            self.hub.broadcast(Event::new("show_podium", json!({})));
            return;
        }
        let next_index = self.state.current_question() + 1;
        let now = self.clock.now_ms();
        let Some(question) = self.questions.get(next_index as usize) else {
            self.state.set_phase(Phase::Podium);
            self.hub.broadcast(Event::new("show_podium", json!({})));
            return;
        };
        self.state.set_question(next_index, question.time_limit_seconds, now);
        self.state.set_phase(Phase::Question);
        self.state.set_show_answers(false);
        self.hub.broadcast(Event::new(
            "next_question",
            json!({
                "question": question.sanitized(),
                "question_number": next_index + 1,
                "current_question": next_index,
                "total_questions": self.state.total_questions(),
                "time_limit": question.time_limit_seconds,
                "server_time": now,
                "question_start_time": now,
            }),
        ));
    }

    /// `spec.md` §4.7 "Answer submission" and §9 Open Question 1.
    async fn submit_answer(
        &mut self,
        participant_id: ParticipantId,
        selected: std::collections::BTreeSet<usize>,
        time_taken_seconds: f64,
    ) -> Result<SubmitAnswerOutcome, ErrorKind> {
        let phase = self.state.phase();

        if phase.accepts_answers_ignored() {
            return Ok(SubmitAnswerOutcome {
                correct: false,
                base: 0,
                time_bonus: 0,
                streak_bonus: 0,
                total: 0,
                correct_answer: None,
                ignored: true,
            });
        }
        match phase {
            Phase::Question | Phase::AnswerReveal => {
                if self.state.has_answered(participant_id) {
                    return Err(ErrorKind::Conflict("already answered".into()));
                }
            }
            _ => return Err(ErrorKind::Conflict("quiz is not accepting answers right now".into())),
        }

        let question_index = self.state.current_question();
        let question = self
            .questions
            .get(question_index as usize)
            .ok_or_else(|| ErrorKind::NotFound("question not found".into()))?
            .clone();

        let client = db::client(&self.pool).await?;
        let mut participant = db::participants::get(&client, participant_id)
            .await?
            .ok_or_else(|| ErrorKind::Forbidden("unknown participant".into()))?;

        if participant.has_answered(question_index) {
            return Err(ErrorKind::Conflict("already answered".into()));
        }

        let correct = question.correct_answer.matches(&selected);
        let position = self.state.arrival_position();
        let streak = scoring::tail_streak(
            &participant.answers.iter().map(|a| a.correct).collect::<Vec<_>>(),
        );
        let breakdown = scoring::score(
            question.points,
            correct,
            time_taken_seconds,
            streak,
            position,
            question.time_limit_seconds as f64,
        );

        let record = AnswerRecord {
            question_index,
            selected_options: selected.iter().copied().collect(),
            correct,
            time_taken_seconds,
            points: breakdown.total,
            breakdown,
            submitted_at: Utc::now(),
        };
        let mark_completed = participant.answers.len() + 1 >= self.state.total_questions() as usize;
        db::participants::record_answer(&client, participant_id, &record, mark_completed).await?;

        // `spec.md` invariant I1: a participant who joined and submitted
        // entirely over HTTP may never have passed through the socket
        // `participant_joined` handshake that normally seeds the roster.
        if !self.state.has_participant(participant_id) {
            self.state.add_participant(ParticipantSnapshot {
                id: participant_id,
                display_name: participant.display_name.clone(),
                avatar_seed: participant.avatar_seed.clone(),
                score: participant.score,
            });
        }
        self.state.mark_answered(participant_id);
        for option in &record.selected_options {
            self.state.record_tally(question_index, *option);
        }
        self.state
            .update_score(participant_id, participant.score + record.points);
        let breakdown = record.breakdown;
        participant.record_answer(record);

        self.hub.broadcast(Event::new(
            "answer_count",
            json!({
                "answeredCount": self.state.answered_count(),
                "totalParticipants": self.state.total_participants(),
            }),
        ));
        self.hub.broadcast(Event::new(
            "answer_stats",
            json!({
                "questionIndex": question_index,
                "stats": self.state.tally_for(question_index),
            }),
        ));

        let correct_answer = if self.quiz.show_correct_answers {
            Some(serde_json::to_value(&question.correct_answer).unwrap_or(serde_json::Value::Null))
        } else {
            None
        };

        Ok(SubmitAnswerOutcome {
            correct,
            base: breakdown.base,
            time_bonus: breakdown.time_bonus,
            streak_bonus: breakdown.streak_bonus,
            total: breakdown.total,
            correct_answer,
            ignored: false,
        })
    }

    /// `spec.md` §9 Open Question 3: marks-answered, never scores.
    async fn auto_submit(&mut self, participant_id: ParticipantId, time_taken_seconds: f64) {
        if self.state.has_answered(participant_id) {
            return;
        }
        let question_index = self.state.current_question();
        let record = AnswerRecord::auto_submitted(question_index, time_taken_seconds, Utc::now());
        match db::client(&self.pool).await {
            Ok(client) => {
                if let Err(err) = db::participants::record_answer(&client, participant_id, &record, false).await {
                    log::warn!("auto-submit persistence failed for {participant_id}: {err}");
                }
            }
            Err(err) => log::warn!("auto-submit could not reach store for {participant_id}: {err}"),
        }
        self.state.mark_answered(participant_id);
        self.hub.broadcast(Event::new(
            "answer_count",
            json!({
                "answeredCount": self.state.answered_count(),
                "totalParticipants": self.state.total_participants(),
            }),
        ));
    }

    fn reaction(&mut self, participant_id: ParticipantId, emoji: &str) -> bool {
        let now = self.clock.now_ms();
        let allowed = ALLOWED_REACTIONS.contains(&emoji) && self.state.allow_reaction(participant_id, now);
        if allowed {
            let id = participant_id.inner().to_string();
            let short: String = id.chars().take(8).collect();
            self.hub
                .broadcast(Event::new("reaction", json!({ "emoji": emoji, "userId": short })));
        }
        allowed
    }

    async fn kick(&mut self, participant_id: ParticipantId) {
        let name = self
            .state
            .participants()
            .find(|p| p.id == participant_id)
            .map(|p| p.display_name.clone())
            .unwrap_or_default();

        match db::client(&self.pool).await {
            Ok(client) => {
                if let Err(err) = db::participants::delete(&client, participant_id).await {
                    log::warn!("kick: failed to delete participant {participant_id}: {err}");
                }
                if let Err(err) = db::quizzes::increment_participant_count(&client, &self.code, -1).await {
                    log::warn!("kick: failed to decrement participant count: {err}");
                }
            }
            Err(err) => log::warn!("kick: store unreachable: {err}"),
        }
        self.cache.invalidate(&self.code).await;

        self.state.remove_participant(participant_id);
        self.hub.broadcast(Event::new(
            "participant_kicked",
            json!({ "participantId": participant_id, "name": name }),
        ));
        self.hub.close(participant_id, CloseReason::Kicked);
    }

    /// `spec.md` §7 kind 4 "avatar change after lobby" and §3 invariant
    /// I6 (seed unique within the room). Rejected once the quiz has left
    /// `LOBBY` so that in-flight answer broadcasts never reference a
    /// stale avatar.
    async fn update_avatar(&mut self, participant_id: ParticipantId, avatar_seed: String) -> Result<(), ErrorKind> {
        if self.state.phase() != Phase::Lobby {
            return Err(ErrorKind::Conflict("cannot change avatar after the quiz has started".into()));
        }
        if !self.state.has_participant(participant_id) {
            return Err(ErrorKind::Forbidden("unknown participant".into()));
        }
        if self.state.avatar_seed_taken(&avatar_seed, participant_id) {
            return Err(ErrorKind::Conflict("avatar already taken in this quiz".into()));
        }

        let client = db::client(&self.pool).await?;
        db::participants::update_avatar_seed(&client, participant_id, &avatar_seed).await?;

        self.state.set_avatar_seed(participant_id, avatar_seed.clone());
        self.hub.broadcast(Event::new(
            "avatar_updated",
            json!({ "participantId": participant_id, "avatarSeed": avatar_seed }),
        ));
        Ok(())
    }

    async fn end_quiz(&mut self) {
        self.state.set_phase(Phase::Ended);
        match db::client(&self.pool).await {
            Ok(client) => {
                if let Err(err) = db::quizzes::set_status(&client, &self.code, QuizStatus::Ended).await {
                    log::warn!("failed to persist ended status for {}: {err}", self.code);
                }
            }
            Err(err) => log::warn!("store unreachable while ending {}: {err}", self.code),
        }
        self.quiz.status = QuizStatus::Ended;
        self.cache.invalidate(&self.code).await;
        self.hub
            .broadcast(Event::new("quiz_ended", json!({ "message": "This quiz has ended" })));
        for participant in self.state.participants().map(|p| p.id).collect::<Vec<_>>() {
            self.hub.close(participant, CloseReason::QuizEnded);
        }
    }
}
