//! Postgres-backed persistence: DDL, pooling, and per-table repository
//! functions. Grounded in `crates/database` (`Schema` trait shape) and
//! `crates/rbp-gameroom/src/repository.rs` (repository-over-client
//! pattern), adapted to a pooled client (`spec.md` §5).

pub mod admins;
pub mod participants;
pub mod pool;
pub mod questions;
pub mod quizzes;
pub mod schema;

pub use pool::{client, connect};
