//! HTTP handlers (`spec.md` §6 "HTTP surface"), one function per route in
//! the teacher's `src/hosting/server.rs` wiring style. Split into
//! `admin` (quiz CRUD + login, gated by [`crate::auth::Auth`]) and `play`
//! (join/submit-answer/state-sync/leaderboard/time-sync, the paths that
//! share logic with the socket session via [`crate::room`] and
//! [`crate::sync`]).

pub mod admin;
pub mod play;
