//! QuizArena server binary, in the teacher's `bin/backend/src/main.rs`
//! shape: init logging, install the hard Ctrl+C handler, run.

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    quizarena::log();
    quizarena::kys();
    let config = quizarena::config::Config::from_env()?;
    quizarena::server::Server::run(config).await
}
