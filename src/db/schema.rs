//! DDL for the four persisted tables (`spec.md` §6 "Persisted state
//! layout"), in the teacher's `Schema` trait shape
//! (`crates/database/src/traits.rs`), trimmed to the parts this service
//! actually uses: table name and `CREATE TABLE`/`CREATE INDEX` DDL. The
//! teacher's `copy`/`freeze`/`columns` methods exist for bulk-loading a
//! static training corpus once; this service only ever does row-at-a-time
//! inserts and updates, so they have no counterpart here.

pub const QUIZZES: &str = "quizzes";
pub const QUESTIONS: &str = "questions";
pub const PARTICIPANTS: &str = "participants";
pub const ADMINISTRATORS: &str = "administrators";

pub trait Schema {
    fn name() -> &'static str;
    fn creates() -> &'static str;
    fn indices() -> &'static str;
}

pub struct QuizTable;
impl Schema for QuizTable {
    fn name() -> &'static str {
        QUIZZES
    }
    fn creates() -> &'static str {
        const_format::concatcp!(
            "CREATE TABLE IF NOT EXISTS ",
            QUIZZES,
            " (
                id                  UUID PRIMARY KEY,
                code                TEXT NOT NULL,
                title               TEXT NOT NULL,
                description         TEXT NOT NULL,
                duration_seconds    INTEGER NOT NULL,
                status              TEXT NOT NULL,
                created_at          TIMESTAMPTZ NOT NULL,
                question_count      INTEGER NOT NULL,
                participant_count   INTEGER NOT NULL,
                attempt_cap         INTEGER NOT NULL,
                shuffle_questions   BOOLEAN NOT NULL,
                show_correct        BOOLEAN NOT NULL,
                start_window        TIMESTAMPTZ,
                end_window          TIMESTAMPTZ,
                last_played_at      TIMESTAMPTZ
            );"
        )
    }
    fn indices() -> &'static str {
        const_format::concatcp!(
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_",
            QUIZZES,
            "_code ON ",
            QUIZZES,
            " (code);
            CREATE INDEX IF NOT EXISTS idx_",
            QUIZZES,
            "_status ON ",
            QUIZZES,
            " (status);"
        )
    }
}

pub struct QuestionTable;
impl Schema for QuestionTable {
    fn name() -> &'static str {
        QUESTIONS
    }
    fn creates() -> &'static str {
        const_format::concatcp!(
            "CREATE TABLE IF NOT EXISTS ",
            QUESTIONS,
            " (
                quiz_code           TEXT NOT NULL,
                index               INTEGER NOT NULL,
                prompt              TEXT NOT NULL,
                options             JSONB NOT NULL,
                correct_answer      JSONB NOT NULL,
                time_limit_seconds  INTEGER NOT NULL,
                points              JSONB NOT NULL,
                media_ref           TEXT,
                PRIMARY KEY (quiz_code, index)
            );"
        )
    }
    fn indices() -> &'static str {
        const_format::concatcp!(
            "CREATE INDEX IF NOT EXISTS idx_",
            QUESTIONS,
            "_quiz_index ON ",
            QUESTIONS,
            " (quiz_code, index);"
        )
    }
}

pub struct ParticipantTable;
impl Schema for ParticipantTable {
    fn name() -> &'static str {
        PARTICIPANTS
    }
    fn creates() -> &'static str {
        const_format::concatcp!(
            "CREATE TABLE IF NOT EXISTS ",
            PARTICIPANTS,
            " (
                id                  UUID PRIMARY KEY,
                quiz_code           TEXT NOT NULL,
                display_name        TEXT NOT NULL,
                avatar_seed         TEXT NOT NULL,
                joined_at           TIMESTAMPTZ NOT NULL,
                score               INTEGER NOT NULL,
                total_time_seconds  DOUBLE PRECISION NOT NULL,
                answers             JSONB NOT NULL,
                last_active_at      TIMESTAMPTZ NOT NULL,
                attempt_number      INTEGER NOT NULL,
                completed_at        TIMESTAMPTZ
            );"
        )
    }
    fn indices() -> &'static str {
        const_format::concatcp!(
            "CREATE INDEX IF NOT EXISTS idx_",
            PARTICIPANTS,
            "_id_quiz ON ",
            PARTICIPANTS,
            " (id, quiz_code);
            CREATE INDEX IF NOT EXISTS idx_",
            PARTICIPANTS,
            "_quiz ON ",
            PARTICIPANTS,
            " (quiz_code);
            CREATE INDEX IF NOT EXISTS idx_",
            PARTICIPANTS,
            "_leaderboard ON ",
            PARTICIPANTS,
            " (quiz_code, score DESC);"
        )
    }
}

pub struct AdministratorTable;
impl Schema for AdministratorTable {
    fn name() -> &'static str {
        ADMINISTRATORS
    }
    fn creates() -> &'static str {
        const_format::concatcp!(
            "CREATE TABLE IF NOT EXISTS ",
            ADMINISTRATORS,
            " (
                username        TEXT PRIMARY KEY,
                password_sha256 TEXT NOT NULL
            );"
        )
    }
    fn indices() -> &'static str {
        const_format::concatcp!(
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_",
            ADMINISTRATORS,
            "_username ON ",
            ADMINISTRATORS,
            " (username);"
        )
    }
}

/// Runs `creates()`/`indices()` for every table. Called once at startup;
/// a failure here is fatal (`spec.md` §7 kind 7).
pub async fn migrate(client: &tokio_postgres::Client) -> Result<(), tokio_postgres::Error> {
    client.batch_execute(QuizTable::creates()).await?;
    client.batch_execute(QuizTable::indices()).await?;
    client.batch_execute(QuestionTable::creates()).await?;
    client.batch_execute(QuestionTable::indices()).await?;
    client.batch_execute(ParticipantTable::creates()).await?;
    client.batch_execute(ParticipantTable::indices()).await?;
    client.batch_execute(AdministratorTable::creates()).await?;
    client.batch_execute(AdministratorTable::indices()).await?;
    Ok(())
}
