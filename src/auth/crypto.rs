//! JWT issuance/verification, adapted from `crates/auth/src/crypto.rs`.
//! Tokens are stateless bearer tokens with an expiry claim only — no
//! revocation table, since this service's administrators are a small
//! operator-seeded set with no session-management surface in `spec.md`.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub role: String,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn is_admin(&self) -> bool {
        self.role == "admin"
    }
}

pub struct Crypto {
    encoding: jsonwebtoken::EncodingKey,
    decoding: jsonwebtoken::DecodingKey,
    ttl_seconds: i64,
}

impl Crypto {
    pub fn new(secret: &[u8], ttl_seconds: i64) -> Self {
        Self {
            encoding: jsonwebtoken::EncodingKey::from_secret(secret),
            decoding: jsonwebtoken::DecodingKey::from_secret(secret),
            ttl_seconds,
        }
    }

    pub fn issue(&self, username: &str, now_ms: i64) -> Result<String, jsonwebtoken::errors::Error> {
        let now = now_ms / 1000;
        let claims = Claims {
            sub: username.to_string(),
            role: "admin".to_string(),
            iat: now,
            exp: now + self.ttl_seconds,
        };
        jsonwebtoken::encode(&jsonwebtoken::Header::default(), &claims, &self.encoding)
    }

    pub fn verify(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        jsonwebtoken::decode::<Claims>(token, &self.decoding, &jsonwebtoken::Validation::default())
            .map(|data| data.claims)
    }
}
