//! QuizArena — real-time multiplayer quiz room runtime.
//!
//! An authoritative coordinator that drives many concurrent quiz rooms
//! through a shared state machine, pushes synchronized question/reveal/
//! leaderboard transitions over WebSocket, scores answers with time- and
//! streak-sensitive bonuses, and survives client reconnection through a
//! pull-based state-sync endpoint.
//!
//! ## Modules
//!
//! - [`clock`] — monotonic time source, injectable for tests
//! - [`cache`] — two-tier TTL cache over the document store
//! - [`scoring`] — pure scoring engine
//! - [`model`] — durable data model (quiz, question, participant, answer)
//! - [`room`] — per-room state machine and controller
//! - [`hub`] — per-room broadcast fan-out
//! - [`session`] — per-connection WebSocket handler
//! - [`sync`] — shared reconnect/state-sync payload builder
//! - [`admission`] — per-room connection caps and accept-rate limiting
//! - [`lobby`] — process-wide registry of live rooms
//! - [`db`] — Postgres-backed persistence
//! - [`dto`] — HTTP request/response wire shapes
//! - [`auth`] — bearer token issuance and verification
//! - [`http`] — HTTP handlers
//! - [`config`] — environment-driven configuration
//! - [`error`] — error taxonomy and HTTP rendering

pub mod admission;
pub mod auth;
pub mod cache;
pub mod clock;
pub mod config;
pub mod db;
pub mod dto;
pub mod error;
pub mod hub;
pub mod http;
pub mod lobby;
pub mod model;
pub mod room;
pub mod scoring;
pub mod server;
pub mod session;
pub mod sync;

/// Register a Ctrl+C handler that exits immediately, and initialize
/// combined terminal + rotating file logging. Call once at process start.
pub fn log() {
    std::fs::create_dir_all("logs").expect("create logs directory");
    let config = simplelog::ConfigBuilder::new()
        .set_location_level(log::LevelFilter::Off)
        .set_target_level(log::LevelFilter::Off)
        .set_thread_level(log::LevelFilter::Off)
        .build();
    let time = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("time moves slow")
        .as_secs();
    let file = simplelog::WriteLogger::new(
        log::LevelFilter::Debug,
        config.clone(),
        std::fs::File::create(format!("logs/{}.log", time)).expect("create log file"),
    );
    let term = simplelog::TermLogger::new(
        log::LevelFilter::Info,
        config.clone(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    );
    simplelog::CombinedLogger::init(vec![term, file]).expect("initialize logger");
}

/// Register a hard Ctrl+C handler for immediate, non-graceful termination.
pub fn kys() {
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.unwrap();
        println!();
        log::warn!("violent interrupt received, exiting immediately");
        std::process::exit(0);
    });
}
