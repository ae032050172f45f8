//! Bounded Postgres connection pool (`spec.md` §5 "Shared resources":
//! target min 20 / max 200). The teacher connects a single
//! `Arc<tokio_postgres::Client>` (`src/lib.rs::db`, built for one offline
//! batch job); this service fronts many concurrent short requests, so a
//! pool replaces the bare client.

use deadpool_postgres::{Manager, ManagerConfig, Pool, RecyclingMethod};
use tokio_postgres::NoTls;

use crate::config::Config;
use crate::error::ErrorKind;

pub async fn connect(config: &Config) -> anyhow::Result<Pool> {
    let pg_config: tokio_postgres::Config = config.database_url.parse()?;
    let manager = Manager::from_config(
        pg_config,
        NoTls,
        ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        },
    );
    let pool = Pool::builder(manager)
        .max_size(config.database_pool_max)
        .build()?;

    // Warm the floor of the pool and fail fast if the store is unreachable
    // at startup, per spec.md §7 kind 7 ("a startup-time failure of the
    // document store is fatal").
    let warmup = std::cmp::max(config.database_pool_min, 1);
    let mut clients = Vec::with_capacity(warmup);
    for _ in 0..warmup {
        clients.push(pool.get().await?);
    }
    drop(clients);

    let client = pool.get().await?;
    super::schema::migrate(&client).await?;

    Ok(pool)
}

pub async fn client(pool: &Pool) -> Result<deadpool_postgres::Client, ErrorKind> {
    pool.get().await.map_err(ErrorKind::from)
}
