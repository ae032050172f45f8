//! Admin-gated CRUD and login handlers (`spec.md` §6, "out of core scope"
//! per §1 but required for a runnable service — see `SPEC_FULL.md`).

use actix_web::{HttpResponse, web};
use chrono::Utc;

use crate::auth::{Auth, Crypto};
use crate::cache::SharedCache;
use crate::clock::Clock;
use crate::config::Config;
use crate::db;
use crate::dto::request::{CreateQuizRequest, QuizListQuery, StatusQuery};
use crate::dto::response::{CreateQuizResponse, QuizDetail, QuizSummary};
use crate::error::{ErrorKind, Result};
use crate::lobby::Lobby;
use crate::model::{self, Question, Quiz, QuizId, QuizStatus};
use crate::room::Command;

pub async fn login(
    pool: web::Data<deadpool_postgres::Pool>,
    crypto: web::Data<Crypto>,
    clock: web::Data<std::sync::Arc<dyn Clock>>,
    config: web::Data<Config>,
    body: web::Json<crate::auth::dto::LoginRequest>,
) -> Result<HttpResponse> {
    let client = db::client(&pool).await?;
    let matched = if body.username == config.admin_username {
        db::admins::verify(&client, &body.username, &body.password).await?
    } else {
        false
    };
    if !matched {
        return Err(ErrorKind::Forbidden("invalid credentials".into()));
    }
    let token = crypto
        .issue(&body.username, clock.now_ms())
        .map_err(ErrorKind::internal)?;
    Ok(HttpResponse::Ok().json(crate::auth::dto::LoginResponse { token }))
}

/// Validates `correctAnswer` bounds at creation time, per `spec.md` §9
/// "Represent as a tagged variant ... validate that every index is
/// within option bounds at creation".
pub async fn create_quiz(
    pool: web::Data<deadpool_postgres::Pool>,
    _auth: Auth,
    body: web::Json<CreateQuizRequest>,
) -> Result<HttpResponse> {
    let body = body.into_inner();
    if body.questions.is_empty() {
        return Err(ErrorKind::Validation("quiz must have at least one question".into()));
    }
    for (index, q) in body.questions.iter().enumerate() {
        if q.options.len() < 2 {
            return Err(ErrorKind::Validation(format!("question {index} needs at least 2 options")));
        }
        if !q.correct_answer.validate(q.options.len()) {
            return Err(ErrorKind::Validation(format!(
                "question {index} has a correctAnswer index out of bounds"
            )));
        }
    }

    let client = db::client(&pool).await?;

    let mut code = model::generate_code();
    for _ in 0..5 {
        if db::quizzes::get_by_code(&client, &code).await?.is_none() {
            break;
        }
        code = model::generate_code();
    }
    if db::quizzes::get_by_code(&client, &code).await?.is_some() {
        return Err(ErrorKind::Conflict("could not allocate a unique quiz code".into()));
    }

    let quiz = Quiz {
        id: QuizId::default(),
        code: code.clone(),
        title: body.title,
        description: body.description,
        duration_seconds: body.duration_seconds,
        status: QuizStatus::Inactive,
        created_at: Utc::now(),
        question_count: body.questions.len() as u32,
        participant_count: 0,
        attempt_cap: body.attempt_cap.unwrap_or(model::MAX_PARTICIPANTS),
        shuffle_questions: body.shuffle_questions,
        show_correct_answers: body.show_correct_answers,
        start_window: body.start_window,
        end_window: body.end_window,
        last_played_at: None,
    };
    db::quizzes::create(&client, &quiz).await?;

    let questions: Vec<Question> = body
        .questions
        .into_iter()
        .enumerate()
        .map(|(index, q)| Question {
            index: index as u32,
            prompt: q.prompt,
            options: q.options,
            correct_answer: q.correct_answer,
            time_limit_seconds: q.time_limit_seconds,
            points: q.points,
            media_ref: q.media_ref,
        })
        .collect();
    db::questions::create_many(&client, &code, &questions).await?;

    Ok(HttpResponse::Ok().json(CreateQuizResponse { code }))
}

pub async fn list_quizzes(
    pool: web::Data<deadpool_postgres::Pool>,
    _auth: Auth,
    query: web::Query<QuizListQuery>,
) -> Result<HttpResponse> {
    let status = match query.status.as_deref() {
        Some("active") => Some(QuizStatus::Active),
        Some("inactive") => Some(QuizStatus::Inactive),
        Some("ended") => Some(QuizStatus::Ended),
        Some(other) => return Err(ErrorKind::Validation(format!("unknown status filter: {other}"))),
        None => None,
    };
    let limit = query.limit.unwrap_or(100).clamp(1, 500);
    let skip = query.skip.unwrap_or(0).max(0);

    let client = db::client(&pool).await?;
    let quizzes = db::quizzes::list(&client, status, limit, skip).await?;
    let summaries: Vec<QuizSummary> = quizzes.iter().map(QuizSummary::from).collect();
    Ok(HttpResponse::Ok().json(summaries))
}

pub async fn get_quiz(
    pool: web::Data<deadpool_postgres::Pool>,
    _auth: Auth,
    code: web::Path<String>,
) -> Result<HttpResponse> {
    let client = db::client(&pool).await?;
    let quiz = db::quizzes::get_by_code(&client, &code)
        .await?
        .ok_or_else(|| ErrorKind::NotFound(format!("quiz {} not found", *code)))?;
    let questions = db::questions::list(&client, &code).await?;
    Ok(HttpResponse::Ok().json(QuizDetail { quiz, questions }))
}

pub async fn set_status(
    pool: web::Data<deadpool_postgres::Pool>,
    cache: web::Data<SharedCache>,
    lobby: web::Data<Lobby>,
    _auth: Auth,
    code: web::Path<String>,
    query: web::Query<StatusQuery>,
) -> Result<HttpResponse> {
    let status = match query.status.as_str() {
        "active" => QuizStatus::Active,
        "inactive" => QuizStatus::Inactive,
        "ended" => QuizStatus::Ended,
        other => return Err(ErrorKind::Validation(format!("unknown status: {other}"))),
    };

    let client = db::client(&pool).await?;
    db::quizzes::get_by_code(&client, &code)
        .await?
        .ok_or_else(|| ErrorKind::NotFound(format!("quiz {} not found", *code)))?;
    db::quizzes::set_status(&client, &code, status).await?;
    cache.invalidate(&code).await;

    if let Some(room) = lobby.get(&code).await {
        if status == QuizStatus::Ended {
            let _ = room.commands.send(Command::QuizEnded);
        } else {
            let label = if status == QuizStatus::Active { "active" } else { "inactive" };
            let _ = room.commands.send(Command::QuizStatusChanged { status: label });
        }
    }

    Ok(HttpResponse::Ok().json(serde_json::json!({ "status": query.status })))
}

pub async fn delete_quiz(
    pool: web::Data<deadpool_postgres::Pool>,
    cache: web::Data<SharedCache>,
    lobby: web::Data<Lobby>,
    _auth: Auth,
    code: web::Path<String>,
) -> Result<HttpResponse> {
    let client = db::client(&pool).await?;
    db::quizzes::get_by_code(&client, &code)
        .await?
        .ok_or_else(|| ErrorKind::NotFound(format!("quiz {} not found", *code)))?;

    if let Some(room) = lobby.get(&code).await {
        let _ = room.commands.send(Command::QuizEnded);
    }

    db::participants::delete_for_quiz(&client, &code).await?;
    db::questions::delete_for_quiz(&client, &code).await?;
    db::quizzes::delete(&client, &code).await?;
    cache.invalidate(&code).await;

    Ok(HttpResponse::NoContent().finish())
}
