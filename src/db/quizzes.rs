//! Quiz repository, in the teacher's `impl HistoryRepository for
//! Arc<Client>` shape (`crates/rbp-gameroom/src/repository.rs`), adapted
//! to a pooled client.

use chrono::{DateTime, Utc};
use deadpool_postgres::Client;

use crate::db::schema::QUIZZES;
use crate::error::ErrorKind;
use crate::model::{Quiz, QuizId, QuizStatus};

fn status_str(status: QuizStatus) -> &'static str {
    match status {
        QuizStatus::Active => "active",
        QuizStatus::Inactive => "inactive",
        QuizStatus::Ended => "ended",
    }
}

fn parse_status(raw: &str) -> QuizStatus {
    match raw {
        "active" => QuizStatus::Active,
        "ended" => QuizStatus::Ended,
        _ => QuizStatus::Inactive,
    }
}

fn from_row(row: &tokio_postgres::Row) -> Quiz {
    Quiz {
        id: QuizId::from(row.get::<_, uuid::Uuid>("id")),
        code: row.get("code"),
        title: row.get("title"),
        description: row.get("description"),
        duration_seconds: row.get::<_, i32>("duration_seconds") as u32,
        status: parse_status(row.get("status")),
        created_at: row.get("created_at"),
        question_count: row.get::<_, i32>("question_count") as u32,
        participant_count: row.get::<_, i32>("participant_count") as u32,
        attempt_cap: row.get::<_, i32>("attempt_cap") as u32,
        shuffle_questions: row.get("shuffle_questions"),
        show_correct_answers: row.get("show_correct"),
        start_window: row.get("start_window"),
        end_window: row.get("end_window"),
        last_played_at: row.get("last_played_at"),
    }
}

pub async fn create(client: &Client, quiz: &Quiz) -> Result<(), ErrorKind> {
    client
        .execute(
            const_format::concatcp!(
                "INSERT INTO ",
                QUIZZES,
                " (id, code, title, description, duration_seconds, status, created_at,
                   question_count, participant_count, attempt_cap, shuffle_questions,
                   show_correct, start_window, end_window, last_played_at)
                 VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12,$13,$14,$15)"
            ),
            &[
                &quiz.id.inner(),
                &quiz.code,
                &quiz.title,
                &quiz.description,
                &(quiz.duration_seconds as i32),
                &status_str(quiz.status),
                &quiz.created_at,
                &(quiz.question_count as i32),
                &(quiz.participant_count as i32),
                &(quiz.attempt_cap as i32),
                &quiz.shuffle_questions,
                &quiz.show_correct_answers,
                &quiz.start_window,
                &quiz.end_window,
                &quiz.last_played_at,
            ],
        )
        .await?;
    Ok(())
}

pub async fn get_by_code(client: &Client, code: &str) -> Result<Option<Quiz>, ErrorKind> {
    let row = client
        .query_opt(
            const_format::concatcp!("SELECT * FROM ", QUIZZES, " WHERE code = $1"),
            &[&code],
        )
        .await?;
    Ok(row.as_ref().map(from_row))
}

pub async fn list(client: &Client, status: Option<QuizStatus>, limit: i64, skip: i64) -> Result<Vec<Quiz>, ErrorKind> {
    let rows = match status {
        Some(status) => {
            client
                .query(
                    const_format::concatcp!(
                        "SELECT * FROM ",
                        QUIZZES,
                        " WHERE status = $1 ORDER BY created_at DESC LIMIT $2 OFFSET $3"
                    ),
                    &[&status_str(status), &limit, &skip],
                )
                .await?
        }
        None => {
            client
                .query(
                    const_format::concatcp!(
                        "SELECT * FROM ",
                        QUIZZES,
                        " ORDER BY created_at DESC LIMIT $1 OFFSET $2"
                    ),
                    &[&limit, &skip],
                )
                .await?
        }
    };
    Ok(rows.iter().map(from_row).collect())
}

pub async fn set_status(client: &Client, code: &str, status: QuizStatus) -> Result<(), ErrorKind> {
    client
        .execute(
            const_format::concatcp!("UPDATE ", QUIZZES, " SET status = $1 WHERE code = $2"),
            &[&status_str(status), &code],
        )
        .await?;
    Ok(())
}

pub async fn set_last_played(client: &Client, code: &str, when: DateTime<Utc>) -> Result<(), ErrorKind> {
    client
        .execute(
            const_format::concatcp!("UPDATE ", QUIZZES, " SET last_played_at = $1 WHERE code = $2"),
            &[&when, &code],
        )
        .await?;
    Ok(())
}

pub async fn increment_participant_count(client: &Client, code: &str, delta: i32) -> Result<(), ErrorKind> {
    client
        .execute(
            const_format::concatcp!(
                "UPDATE ",
                QUIZZES,
                " SET participant_count = participant_count + $1 WHERE code = $2"
            ),
            &[&delta, &code],
        )
        .await?;
    Ok(())
}

pub async fn delete(client: &Client, code: &str) -> Result<(), ErrorKind> {
    client
        .execute(
            const_format::concatcp!("DELETE FROM ", QUIZZES, " WHERE code = $1"),
            &[&code],
        )
        .await?;
    Ok(())
}
