//! Administrator credential repository. Passwords stored as SHA-256 hex
//! of the configured password, per `spec.md` §6 "Persisted state layout".

use deadpool_postgres::Client;
use sha2::{Digest, Sha256};

use crate::db::schema::ADMINISTRATORS;
use crate::error::ErrorKind;

pub fn hash_password(password: &str) -> String {
    let digest = Sha256::digest(password.as_bytes());
    hex::encode(digest)
}

/// Idempotent seed of the single operator-configured administrator
/// account, run at startup.
pub async fn ensure_seeded(client: &Client, username: &str, password: &str) -> Result<(), ErrorKind> {
    client
        .execute(
            const_format::concatcp!(
                "INSERT INTO ",
                ADMINISTRATORS,
                " (username, password_sha256) VALUES ($1, $2)
                 ON CONFLICT (username) DO UPDATE SET password_sha256 = EXCLUDED.password_sha256"
            ),
            &[&username, &hash_password(password)],
        )
        .await?;
    Ok(())
}

pub async fn verify(client: &Client, username: &str, password: &str) -> Result<bool, ErrorKind> {
    let row = client
        .query_opt(
            const_format::concatcp!(
                "SELECT password_sha256 FROM ",
                ADMINISTRATORS,
                " WHERE username = $1"
            ),
            &[&username],
        )
        .await?;
    Ok(match row {
        Some(row) => {
            let stored: String = row.get("password_sha256");
            stored == hash_password(password)
        }
        None => false,
    })
}
