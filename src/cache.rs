//! Two-tier TTL cache in front of the document store (`spec.md` §4.2).
//!
//! External (`redis`) is consulted first, then the process-local `moka`
//! tier, then the store. Writes populate both tiers; mutation invalidates
//! all three keys for a code. A cache-store failure is swallowed and
//! treated as a miss — the caller always falls through to the document
//! store rather than blocking or erroring.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache as LocalCache;
use serde::Serialize;
use serde::de::DeserializeOwned;

const QUIZ_TTL: Duration = Duration::from_secs(30);
const QUESTIONS_TTL: Duration = Duration::from_secs(30);
const LEADERBOARD_TTL: Duration = Duration::from_secs(5);

fn quiz_key(code: &str) -> String {
    format!("quiz:{code}")
}

fn questions_key(code: &str) -> String {
    format!("questions:{code}")
}

fn leaderboard_key(code: &str) -> String {
    format!("leaderboard:{code}")
}

/// One `moka` tier per TTL class, since `moka::future::Cache` bakes its
/// TTL into construction rather than accepting it per-entry.
pub struct Cache {
    quiz_local: LocalCache<String, String>,
    questions_local: LocalCache<String, String>,
    leaderboard_local: LocalCache<String, String>,
    redis: Option<redis::aio::ConnectionManager>,
}

impl Cache {
    pub async fn new(redis_url: Option<&str>) -> Self {
        let redis = match redis_url {
            Some(url) => match redis::Client::open(url) {
                Ok(client) => match client.get_connection_manager().await {
                    Ok(manager) => Some(manager),
                    Err(err) => {
                        log::warn!("redis unreachable at startup, degrading to local cache: {err}");
                        None
                    }
                },
                Err(err) => {
                    log::warn!("invalid redis url, degrading to local cache: {err}");
                    None
                }
            },
            None => None,
        };
        Self {
            quiz_local: LocalCache::builder().time_to_live(QUIZ_TTL).build(),
            questions_local: LocalCache::builder().time_to_live(QUESTIONS_TTL).build(),
            leaderboard_local: LocalCache::builder().time_to_live(LEADERBOARD_TTL).build(),
            redis,
        }
    }

    pub async fn get_quiz<T: DeserializeOwned>(&self, code: &str) -> Option<T> {
        self.get(&quiz_key(code), &self.quiz_local).await
    }

    pub async fn put_quiz<T: Serialize>(&self, code: &str, value: &T) {
        self.put(&quiz_key(code), value, &self.quiz_local, QUIZ_TTL)
            .await;
    }

    pub async fn get_questions<T: DeserializeOwned>(&self, code: &str) -> Option<T> {
        self.get(&questions_key(code), &self.questions_local).await
    }

    pub async fn put_questions<T: Serialize>(&self, code: &str, value: &T) {
        self.put(
            &questions_key(code),
            value,
            &self.questions_local,
            QUESTIONS_TTL,
        )
        .await;
    }

    pub async fn get_leaderboard<T: DeserializeOwned>(&self, code: &str) -> Option<T> {
        self.get(&leaderboard_key(code), &self.leaderboard_local)
            .await
    }

    pub async fn put_leaderboard<T: Serialize>(&self, code: &str, value: &T) {
        self.put(
            &leaderboard_key(code),
            value,
            &self.leaderboard_local,
            LEADERBOARD_TTL,
        )
        .await;
    }

    /// Removes all three keys for a code. Called on any mutation or
    /// deletion of the quiz (`spec.md` §4.2 "Invalidation").
    pub async fn invalidate(&self, code: &str) {
        self.quiz_local.invalidate(&quiz_key(code)).await;
        self.questions_local.invalidate(&questions_key(code)).await;
        self.leaderboard_local
            .invalidate(&leaderboard_key(code))
            .await;
        if let Some(redis) = self.redis.clone() {
            let mut redis = redis;
            let keys = [quiz_key(code), questions_key(code), leaderboard_key(code)];
            if let Err(err) = redis::cmd("DEL")
                .arg(&keys)
                .query_async::<_, ()>(&mut redis)
                .await
            {
                log::warn!("redis invalidation failed for {code}, local tier still cleared: {err}");
            }
        }
    }

    async fn get<T: DeserializeOwned>(&self, key: &str, local: &LocalCache<String, String>) -> Option<T> {
        if let Some(redis) = self.redis.clone() {
            let mut redis = redis;
            match redis::cmd("GET").arg(key).query_async::<_, Option<String>>(&mut redis).await {
                Ok(Some(raw)) => {
                    if let Ok(value) = serde_json::from_str(&raw) {
                        return Some(value);
                    }
                }
                Ok(None) => {}
                Err(err) => log::warn!("redis GET {key} failed, falling back: {err}"),
            }
        }
        let raw = local.get(key).await?;
        serde_json::from_str(&raw).ok()
    }

    async fn put<T: Serialize>(
        &self,
        key: &str,
        value: &T,
        local: &LocalCache<String, String>,
        ttl: Duration,
    ) {
        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(_) => return,
        };
        local.insert(key.to_string(), raw.clone()).await;
        if let Some(redis) = self.redis.clone() {
            let mut redis = redis;
            let seconds = ttl.as_secs().max(1) as usize;
            if let Err(err) = redis::cmd("SETEX")
                .arg(key)
                .arg(seconds)
                .arg(&raw)
                .query_async::<_, ()>(&mut redis)
                .await
            {
                log::warn!("redis SETEX {key} failed, local tier still populated: {err}");
            }
        }
    }
}

pub type SharedCache = Arc<Cache>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Serialize, Deserialize, PartialEq, Debug)]
    struct Probe {
        n: u32,
    }

    #[tokio::test]
    async fn writes_through_local_tier_without_redis() {
        let cache = Cache::new(None).await;
        cache.put_quiz("ABC123", &Probe { n: 7 }).await;
        let got: Option<Probe> = cache.get_quiz("ABC123").await;
        assert_eq!(got, Some(Probe { n: 7 }));
    }

    #[tokio::test]
    async fn invalidate_clears_local_tier() {
        let cache = Cache::new(None).await;
        cache.put_leaderboard("ABC123", &Probe { n: 1 }).await;
        cache.invalidate("ABC123").await;
        let got: Option<Probe> = cache.get_leaderboard("ABC123").await;
        assert_eq!(got, None);
    }
}
