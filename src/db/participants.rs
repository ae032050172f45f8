//! Participant repository. Durable fields (`score`, `answers`) are owned
//! by the store; transient fields live only in `RoomState`
//! (`spec.md` §3 "Ownership").

use deadpool_postgres::Client;

use crate::db::schema::PARTICIPANTS;
use crate::error::ErrorKind;
use crate::model::{AnswerRecord, Participant, ParticipantId};

fn from_row(row: &tokio_postgres::Row) -> Result<Participant, ErrorKind> {
    let answers: serde_json::Value = row.get("answers");
    Ok(Participant {
        id: ParticipantId::from(row.get::<_, uuid::Uuid>("id")),
        quiz_code: row.get("quiz_code"),
        display_name: row.get("display_name"),
        avatar_seed: row.get("avatar_seed"),
        joined_at: row.get("joined_at"),
        score: row.get::<_, i32>("score") as u32,
        total_time_seconds: row.get("total_time_seconds"),
        answers: serde_json::from_value(answers).map_err(|e| ErrorKind::internal(e))?,
        last_active_at: row.get("last_active_at"),
        attempt_number: row.get::<_, i32>("attempt_number") as u32,
        completed_at: row.get("completed_at"),
    })
}

pub async fn create(client: &Client, participant: &Participant) -> Result<(), ErrorKind> {
    client
        .execute(
            const_format::concatcp!(
                "INSERT INTO ",
                PARTICIPANTS,
                " (id, quiz_code, display_name, avatar_seed, joined_at, score, total_time_seconds,
                   answers, last_active_at, attempt_number, completed_at)
                 VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11)"
            ),
            &[
                &participant.id.inner(),
                &participant.quiz_code,
                &participant.display_name,
                &participant.avatar_seed,
                &participant.joined_at,
                &(participant.score as i32),
                &participant.total_time_seconds,
                &serde_json::to_value(&participant.answers).map_err(|e| ErrorKind::internal(e))?,
                &participant.last_active_at,
                &(participant.attempt_number as i32),
                &participant.completed_at,
            ],
        )
        .await?;
    Ok(())
}

/// Full durable roster for a quiz code, used to seed `RoomState` when an
/// admin socket connects before any participant socket has (`spec.md`
/// §4.6 "`admin_joined`: ... preload participants from store").
pub async fn list_for_quiz(client: &Client, quiz_code: &str) -> Result<Vec<Participant>, ErrorKind> {
    let rows = client
        .query(
            const_format::concatcp!("SELECT * FROM ", PARTICIPANTS, " WHERE quiz_code = $1"),
            &[&quiz_code],
        )
        .await?;
    rows.iter().map(from_row).collect()
}

pub async fn get(client: &Client, id: ParticipantId) -> Result<Option<Participant>, ErrorKind> {
    let row = client
        .query_opt(
            const_format::concatcp!("SELECT * FROM ", PARTICIPANTS, " WHERE id = $1"),
            &[&id.inner()],
        )
        .await?;
    row.as_ref().map(from_row).transpose()
}

pub async fn avatar_seed_taken(client: &Client, quiz_code: &str, avatar_seed: &str) -> Result<bool, ErrorKind> {
    let row = client
        .query_opt(
            const_format::concatcp!(
                "SELECT 1 FROM ",
                PARTICIPANTS,
                " WHERE quiz_code = $1 AND avatar_seed = $2"
            ),
            &[&quiz_code, &avatar_seed],
        )
        .await?;
    Ok(row.is_some())
}

/// Atomic `$inc score,totalTime` plus the append of one answer record,
/// per `spec.md` §4.7 step 5.
pub async fn record_answer(
    client: &Client,
    id: ParticipantId,
    record: &AnswerRecord,
    mark_completed: bool,
) -> Result<(), ErrorKind> {
    let completed_clause = if mark_completed {
        ", completed_at = now()"
    } else {
        ""
    };
    let sql = format!(
        "UPDATE {PARTICIPANTS} SET score = score + $1, total_time_seconds = total_time_seconds + $2,
         answers = answers || $3::jsonb, last_active_at = now(){completed_clause} WHERE id = $4"
    );
    client
        .execute(
            sql.as_str(),
            &[
                &(record.points as i32),
                &record.time_taken_seconds,
                &serde_json::to_value(std::slice::from_ref(record)).map_err(|e| ErrorKind::internal(e))?,
                &id.inner(),
            ],
        )
        .await?;
    Ok(())
}

/// `spec.md` §7 kind 4 "avatar change after lobby": the room controller
/// gates this on `Phase::Lobby` before the write ever reaches the store.
pub async fn update_avatar_seed(client: &Client, id: ParticipantId, avatar_seed: &str) -> Result<(), ErrorKind> {
    client
        .execute(
            const_format::concatcp!("UPDATE ", PARTICIPANTS, " SET avatar_seed = $1 WHERE id = $2"),
            &[&avatar_seed, &id.inner()],
        )
        .await?;
    Ok(())
}

pub async fn leaderboard(client: &Client, quiz_code: &str) -> Result<Vec<Participant>, ErrorKind> {
    let rows = client
        .query(
            const_format::concatcp!(
                "SELECT * FROM ",
                PARTICIPANTS,
                " WHERE quiz_code = $1 ORDER BY score DESC, total_time_seconds ASC"
            ),
            &[&quiz_code],
        )
        .await?;
    rows.iter().map(from_row).collect()
}

pub async fn delete(client: &Client, id: ParticipantId) -> Result<(), ErrorKind> {
    client
        .execute(
            const_format::concatcp!("DELETE FROM ", PARTICIPANTS, " WHERE id = $1"),
            &[&id.inner()],
        )
        .await?;
    Ok(())
}

pub async fn delete_for_quiz(client: &Client, quiz_code: &str) -> Result<(), ErrorKind> {
    client
        .execute(
            const_format::concatcp!("DELETE FROM ", PARTICIPANTS, " WHERE quiz_code = $1"),
            &[&quiz_code],
        )
        .await?;
    Ok(())
}
