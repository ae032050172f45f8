//! Participant-facing HTTP handlers (`spec.md` §6): join, question list,
//! answer submission, leaderboard, state-sync, and time calibration.
//! `submit-answer` and `state` route through the same room-controller
//! logic a socket frame would (`spec.md` §2 "HTTP endpoints for
//! join/answer/state bypass C6 but route through the same C7 logic").

use std::collections::BTreeSet;
use std::sync::Arc;

use actix_web::{HttpResponse, web};
use chrono::Utc;
use tokio::sync::oneshot;

use crate::auth::MaybeAuth;
use crate::cache::SharedCache;
use crate::clock::Clock;
use crate::db;
use crate::dto::request::{JoinRequest, ParticipantQuery, SubmitAnswerRequest, UpdateAvatarRequest};
use crate::dto::response::{JoinResponse, SubmitAnswerResponse, TimeSyncResponse, rank_leaderboard};
use crate::error::{ErrorKind, Result};
use crate::lobby::Lobby;
use crate::model::{self, Participant, ParticipantId};
use crate::room::Command;

pub async fn join(
    pool: web::Data<deadpool_postgres::Pool>,
    lobby: web::Data<Lobby>,
    body: web::Json<JoinRequest>,
) -> Result<HttpResponse> {
    let body = body.into_inner();
    let display_name = Participant::normalize_display_name(&body.display_name)
        .ok_or_else(|| ErrorKind::Validation("displayName must be 1-50 characters after trimming".into()))?;
    if body.avatar_seed.trim().is_empty() {
        return Err(ErrorKind::Validation("avatarSeed must not be blank".into()));
    }

    let client = db::client(&pool).await?;
    let quiz = db::quizzes::get_by_code(&client, &body.quiz_code)
        .await?
        .ok_or_else(|| ErrorKind::NotFound(format!("quiz {} not found", body.quiz_code)))?;
    if quiz.status == model::QuizStatus::Ended {
        return Err(ErrorKind::Conflict("this quiz has ended".into()));
    }
    // `spec.md` kind 4 (per-quiz attempt cap, 400 Conflict) and kind 5
    // (process-wide participant cap, 429 Capacity) are independent limits;
    // a quiz whose `attempt_cap` defaults to `MAX_PARTICIPANTS` must still
    // report the 429 once the process-wide cap binds.
    if quiz.participant_count >= quiz.attempt_cap {
        return Err(ErrorKind::Conflict("max attempts reached".into()));
    }
    if quiz.participant_count >= model::MAX_PARTICIPANTS {
        return Err(ErrorKind::Capacity("max participants exceeded".into()));
    }
    if db::participants::avatar_seed_taken(&client, &body.quiz_code, &body.avatar_seed).await? {
        return Err(ErrorKind::Conflict("avatar already taken in this quiz".into()));
    }

    let now = Utc::now();
    let participant = Participant {
        id: ParticipantId::default(),
        quiz_code: body.quiz_code.clone(),
        display_name: display_name.clone(),
        avatar_seed: body.avatar_seed.clone(),
        joined_at: now,
        score: 0,
        total_time_seconds: 0.0,
        answers: Vec::new(),
        last_active_at: now,
        attempt_number: 1,
        completed_at: None,
    };
    db::participants::create(&client, &participant).await?;
    db::quizzes::increment_participant_count(&client, &body.quiz_code, 1).await?;

    // `spec.md` invariant I1: register into the live room's roster so a
    // participant who never opens a websocket still counts toward
    // `total_participants()` before their first answer submission.
    if let Ok(room) = lobby.get_or_create(&body.quiz_code).await {
        let _ = room.commands.send(Command::RegisterParticipant {
            id: participant.id,
            display_name: participant.display_name.clone(),
            avatar_seed: participant.avatar_seed.clone(),
        });
    }

    Ok(HttpResponse::Ok().json(JoinResponse {
        participant_id: participant.id.inner(),
        quiz_code: participant.quiz_code,
        display_name: participant.display_name,
        avatar_seed: participant.avatar_seed,
    }))
}

/// Strips `correctAnswer` for non-admin callers; storage order is
/// authoritative and never per-caller shuffled (`spec.md` §6).
pub async fn questions(
    pool: web::Data<deadpool_postgres::Pool>,
    cache: web::Data<SharedCache>,
    auth: MaybeAuth,
    code: web::Path<String>,
) -> Result<HttpResponse> {
    let code = code.into_inner();
    let client = db::client(&pool).await?;
    let list = match cache.get_questions::<Vec<crate::model::Question>>(&code).await {
        Some(cached) => cached,
        None => {
            let fetched = db::questions::list(&client, &code).await?;
            cache.put_questions(&code, &fetched).await;
            fetched
        }
    };

    if auth.claims().is_some() {
        Ok(HttpResponse::Ok().json(list))
    } else {
        let sanitized: Vec<_> = list.iter().map(|q| q.sanitized()).collect();
        Ok(HttpResponse::Ok().json(sanitized))
    }
}

/// `spec.md` §4.7 "Answer submission": shares the controller's FIFO
/// command channel with the socket `auto_submit`/reveal path so both
/// entrypoints observe and mutate the same `RoomState`.
pub async fn submit_answer(
    lobby: web::Data<Lobby>,
    body: web::Json<SubmitAnswerRequest>,
) -> Result<HttpResponse> {
    let body = body.into_inner();
    let room = lobby.get_or_create(&body.quiz_code).await?;

    let (reply_tx, reply_rx) = oneshot::channel();
    room.commands
        .send(Command::SubmitAnswer {
            participant_id: ParticipantId::from(body.participant_id),
            selected: body.selected_options.into_iter().collect::<BTreeSet<_>>(),
            time_taken_seconds: body.time_taken_seconds,
            reply: reply_tx,
        })
        .map_err(|_| ErrorKind::internal(anyhow::anyhow!("room controller channel closed")))?;

    let outcome = reply_rx
        .await
        .map_err(|_| ErrorKind::internal(anyhow::anyhow!("room controller dropped the reply")))??;

    Ok(HttpResponse::Ok().json(SubmitAnswerResponse {
        correct: outcome.correct,
        base_points: outcome.base,
        time_bonus: outcome.time_bonus,
        streak_bonus: outcome.streak_bonus,
        points: outcome.total,
        correct_answer: outcome.correct_answer,
        ignored: outcome.ignored,
    }))
}

/// `spec.md` §7 kind 4 "avatar change after lobby": rejected by the room
/// controller once the quiz has left `LOBBY`, not validated here.
pub async fn update_avatar(
    lobby: web::Data<Lobby>,
    participant_id: web::Path<uuid::Uuid>,
    body: web::Json<UpdateAvatarRequest>,
) -> Result<HttpResponse> {
    let body = body.into_inner();
    if body.avatar_seed.trim().is_empty() {
        return Err(ErrorKind::Validation("avatarSeed must not be blank".into()));
    }
    let room = lobby.get_or_create(&body.quiz_code).await?;

    let (reply_tx, reply_rx) = oneshot::channel();
    room.commands
        .send(Command::UpdateAvatar {
            participant_id: ParticipantId::from(participant_id.into_inner()),
            avatar_seed: body.avatar_seed,
            reply: reply_tx,
        })
        .map_err(|_| ErrorKind::internal(anyhow::anyhow!("room controller channel closed")))?;
    reply_rx
        .await
        .map_err(|_| ErrorKind::internal(anyhow::anyhow!("room controller dropped the reply")))??;

    Ok(HttpResponse::Ok().json(serde_json::json!({ "ok": true })))
}

pub async fn leaderboard(
    pool: web::Data<deadpool_postgres::Pool>,
    cache: web::Data<SharedCache>,
    code: web::Path<String>,
) -> Result<HttpResponse> {
    let code = code.into_inner();
    if let Some(cached) = cache
        .get_leaderboard::<Vec<crate::dto::response::LeaderboardEntry>>(&code)
        .await
    {
        return Ok(HttpResponse::Ok().json(cached));
    }

    let client = db::client(&pool).await?;
    let participants = db::participants::leaderboard(&client, &code).await?;
    let entries = rank_leaderboard(participants);
    cache.put_leaderboard(&code, &entries).await;
    Ok(HttpResponse::Ok().json(entries))
}

/// `spec.md` §4.8: identical payload whether reached via this pull
/// endpoint or the `request_state_sync` socket frame.
pub async fn state(
    lobby: web::Data<Lobby>,
    code: web::Path<String>,
    query: web::Query<ParticipantQuery>,
) -> Result<HttpResponse> {
    let room = lobby.get_or_create(&code).await?;
    let (reply_tx, reply_rx) = oneshot::channel();
    room.commands
        .send(Command::RequestStateSync {
            participant_id: query.participant_id.map(ParticipantId::from),
            reply: reply_tx,
        })
        .map_err(|_| ErrorKind::internal(anyhow::anyhow!("room controller channel closed")))?;
    let payload = reply_rx
        .await
        .map_err(|_| ErrorKind::internal(anyhow::anyhow!("room controller dropped the reply")))?;
    Ok(HttpResponse::Ok().json(payload))
}

pub async fn time_sync(clock: web::Data<Arc<dyn Clock>>) -> HttpResponse {
    let now = clock.now_ms();
    HttpResponse::Ok().json(TimeSyncResponse {
        server_time: now,
        timestamp: now,
    })
}

/// `spec.md` §7 kind 7: "store unreachable: propagate as 500, health
/// endpoint reports degraded". A dependency failure here never escalates
/// past a 503; it only changes what this handler reports.
pub async fn health(pool: web::Data<deadpool_postgres::Pool>) -> HttpResponse {
    match db::client(&pool).await {
        Ok(_) => HttpResponse::Ok().json(serde_json::json!({ "status": "ok" })),
        Err(err) => {
            log::warn!("health check: store unreachable: {err}");
            HttpResponse::ServiceUnavailable().json(serde_json::json!({ "status": "degraded" }))
        }
    }
}
