//! Question repository; compound primary key `(quiz_code, index)` is
//! authoritative order, per `spec.md` §3 "Question".

use deadpool_postgres::Client;

use crate::db::schema::QUESTIONS;
use crate::error::ErrorKind;
use crate::model::Question;

fn from_row(row: &tokio_postgres::Row) -> Result<Question, ErrorKind> {
    let options: serde_json::Value = row.get("options");
    let correct_answer: serde_json::Value = row.get("correct_answer");
    let points: serde_json::Value = row.get("points");
    Ok(Question {
        index: row.get::<_, i32>("index") as u32,
        prompt: row.get("prompt"),
        options: serde_json::from_value(options).map_err(|e| ErrorKind::internal(e))?,
        correct_answer: serde_json::from_value(correct_answer).map_err(|e| ErrorKind::internal(e))?,
        time_limit_seconds: row.get::<_, i32>("time_limit_seconds") as u32,
        points: serde_json::from_value(points).map_err(|e| ErrorKind::internal(e))?,
        media_ref: row.get("media_ref"),
    })
}

pub async fn create_many(client: &Client, quiz_code: &str, questions: &[Question]) -> Result<(), ErrorKind> {
    for question in questions {
        client
            .execute(
                const_format::concatcp!(
                    "INSERT INTO ",
                    QUESTIONS,
                    " (quiz_code, index, prompt, options, correct_answer, time_limit_seconds, points, media_ref)
                     VALUES ($1,$2,$3,$4,$5,$6,$7,$8)"
                ),
                &[
                    &quiz_code,
                    &(question.index as i32),
                    &question.prompt,
                    &serde_json::to_value(&question.options).map_err(|e| ErrorKind::internal(e))?,
                    &serde_json::to_value(&question.correct_answer).map_err(|e| ErrorKind::internal(e))?,
                    &(question.time_limit_seconds as i32),
                    &serde_json::to_value(question.points).map_err(|e| ErrorKind::internal(e))?,
                    &question.media_ref,
                ],
            )
            .await?;
    }
    Ok(())
}

/// Storage-index order is authoritative; never per-caller shuffled
/// (`spec.md` §6 "`GET /quiz/{code}/questions`").
pub async fn list(client: &Client, quiz_code: &str) -> Result<Vec<Question>, ErrorKind> {
    let rows = client
        .query(
            const_format::concatcp!(
                "SELECT * FROM ",
                QUESTIONS,
                " WHERE quiz_code = $1 ORDER BY index ASC"
            ),
            &[&quiz_code],
        )
        .await?;
    rows.iter().map(from_row).collect()
}

pub async fn delete_for_quiz(client: &Client, quiz_code: &str) -> Result<(), ErrorKind> {
    client
        .execute(
            const_format::concatcp!("DELETE FROM ", QUESTIONS, " WHERE quiz_code = $1"),
            &[&quiz_code],
        )
        .await?;
    Ok(())
}
