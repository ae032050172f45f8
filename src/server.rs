//! Top-level HTTP/WebSocket server wiring, in the teacher's
//! `hosting::Server::run` shape (`src/hosting/server.rs`): one `HttpServer`
//! closure building an `App` with shared state and a flat route table,
//! generalized from three routes to the full surface in `spec.md` §6.

use std::sync::Arc;

use actix_cors::Cors;
use actix_web::middleware::Logger;
use actix_web::{App, HttpServer, web};

use crate::auth::Crypto;
use crate::cache::{Cache, SharedCache};
use crate::clock::Clock;
use crate::config::{Config, CorsOrigins};
use crate::lobby::Lobby;
use crate::{db, http, session};

pub struct Server;

impl Server {
    pub async fn run(config: Config) -> anyhow::Result<()> {
        let pool = db::connect(&config).await?;
        {
            let client = db::client(&pool).await?;
            db::admins::ensure_seeded(&client, &config.admin_username, &config.admin_password).await?;
        }

        let cache: SharedCache = Arc::new(Cache::new(config.redis_url.as_deref()).await);
        let clock: Arc<dyn Clock> = Arc::new(crate::clock::SystemClock);
        let crypto = web::Data::new(Crypto::new(config.jwt_secret.as_bytes(), config.jwt_ttl_seconds));
        let lobby = web::Data::new(Lobby::new(
            pool.clone(),
            cache.clone(),
            clock.clone(),
            config.room_connection_cap,
            config.room_accept_rate_per_second,
        ));
        let pool_data = web::Data::new(pool);
        let cache_data = web::Data::new(cache);
        let clock_data = web::Data::new(clock);
        let config_data = web::Data::new(config.clone());
        let bind_addr = config.bind_addr.clone();

        log::info!("quizarena listening on {bind_addr}");
        HttpServer::new(move || {
            let cors = match &config.cors_origins {
                CorsOrigins::Any => Cors::default().allow_any_origin().allow_any_method().allow_any_header(),
                CorsOrigins::List(origins) => {
                    let mut cors = Cors::default()
                        .allow_any_method()
                        .allow_any_header()
                        .supports_credentials();
                    for origin in origins {
                        cors = cors.allowed_origin(origin);
                    }
                    cors
                }
            };

            App::new()
                .wrap(Logger::new("%r %s %Ts"))
                .wrap(cors)
                .app_data(pool_data.clone())
                .app_data(cache_data.clone())
                .app_data(clock_data.clone())
                .app_data(config_data.clone())
                .app_data(crypto.clone())
                .app_data(lobby.clone())
                .route("/admin/login", web::post().to(http::admin::login))
                .route("/admin/quiz", web::post().to(http::admin::create_quiz))
                .route("/admin/quizzes", web::get().to(http::admin::list_quizzes))
                .route("/admin/quiz/{code}", web::get().to(http::admin::get_quiz))
                .route("/admin/quiz/{code}/status", web::patch().to(http::admin::set_status))
                .route("/admin/quiz/{code}", web::delete().to(http::admin::delete_quiz))
                .route("/join", web::post().to(http::play::join))
                .route("/participant/{participantId}/avatar", web::patch().to(http::play::update_avatar))
                .route("/quiz/{code}/questions", web::get().to(http::play::questions))
                .route("/submit-answer", web::post().to(http::play::submit_answer))
                .route("/leaderboard/{code}", web::get().to(http::play::leaderboard))
                .route("/quiz/{code}/state", web::get().to(http::play::state))
                .route("/time-sync", web::get().to(http::play::time_sync))
                .route("/health", web::get().to(http::play::health))
                .route("/ws/{code}", web::get().to(session::handle))
        })
        .bind(&bind_addr)?
        .run()
        .await?;
        Ok(())
    }
}
