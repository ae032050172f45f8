//! Error taxonomy (`spec.md` §7) and the single adapter that renders it to
//! HTTP. Socket-side handlers match on `ErrorKind` directly and never let
//! it escape as a framework error — see `spec.md` §7 "Propagation policy".

use actix_web::HttpResponse;
use actix_web::ResponseError;
use actix_web::http::StatusCode;
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum ErrorKind {
    /// Malformed request or domain-rule violation.
    #[error("{0}")]
    Validation(String),

    /// Unknown code/participant/question.
    #[error("{0}")]
    NotFound(String),

    /// Missing/invalid token, mismatched role, stale or kicked participant.
    #[error("{0}")]
    Forbidden(String),

    /// Quiz ended, duplicate answer, avatar change after lobby, max
    /// attempts reached, code-collision after retries.
    #[error("{0}")]
    Conflict(String),

    /// Room full, connection-rate exceeded, max participants exceeded.
    #[error("{0}")]
    Capacity(String),

    /// Document store unreachable or returned an unexpected error.
    #[error("dependency failure: {0}")]
    Dependency(String),

    /// Unexpected internal failure; never crashes the process.
    #[error("internal error")]
    Internal(#[source] anyhow::Error),
}

impl ErrorKind {
    pub fn internal(err: impl Into<anyhow::Error>) -> Self {
        let err = err.into();
        log::error!("internal error: {err:#}");
        Self::Internal(err)
    }
}

impl From<deadpool_postgres::PoolError> for ErrorKind {
    fn from(err: deadpool_postgres::PoolError) -> Self {
        ErrorKind::Dependency(err.to_string())
    }
}

impl From<tokio_postgres::Error> for ErrorKind {
    fn from(err: tokio_postgres::Error) -> Self {
        ErrorKind::Dependency(err.to_string())
    }
}

impl ResponseError for ErrorKind {
    fn status_code(&self) -> StatusCode {
        match self {
            ErrorKind::Validation(_) => StatusCode::BAD_REQUEST,
            ErrorKind::NotFound(_) => StatusCode::NOT_FOUND,
            ErrorKind::Forbidden(_) => StatusCode::FORBIDDEN,
            ErrorKind::Conflict(_) => StatusCode::BAD_REQUEST,
            ErrorKind::Capacity(_) => StatusCode::TOO_MANY_REQUESTS,
            ErrorKind::Dependency(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ErrorKind::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let detail = match self {
            ErrorKind::Internal(_) | ErrorKind::Dependency(_) => "internal server error".into(),
            other => other.to_string(),
        };
        HttpResponse::build(self.status_code()).json(json!({ "detail": detail }))
    }
}

pub type Result<T> = std::result::Result<T, ErrorKind>;
