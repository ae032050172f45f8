//! Wire shapes for the login endpoint, in the teacher's `dto.rs` shape
//! (`crates/auth/src/dto.rs`).

use serde::{Deserialize, Serialize};

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub token: String,
}
