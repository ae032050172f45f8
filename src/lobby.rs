//! Process-wide registry of live rooms (`spec.md` §2 data-flow diagram
//! and §4.7 "Last socket leaves"). At most one [`room::RoomController`]
//! runs per quiz code at a time (`spec.md` §3 invariant), created lazily
//! on first access — whether that access is a socket connecting or an
//! HTTP handler needing the shared controller logic — and torn down when
//! the last socket disconnects. Grounded in the teacher's
//! `hosting::Casino` (`src/hosting/casino.rs`): a `RwLock`-guarded map of
//! room handles, generalized from a numeric `RoomId` to a quiz code and
//! from a single-client handle to `(CommandSender, HubHandle)`.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use deadpool_postgres::Pool;
use tokio::sync::RwLock;

use crate::admission::AdmissionControl;
use crate::cache::SharedCache;
use crate::clock::Clock;
use crate::db;
use crate::error::ErrorKind;
use crate::model::{Question, Quiz};
use crate::room::{self, CommandSender};

/// Everything a socket session or HTTP handler needs to talk to one live
/// room. Cheaply `Clone`: every field is itself a handle.
#[derive(Clone)]
pub struct Room {
    pub commands: CommandSender,
    pub hub: crate::hub::HubHandle,
    pub admission: Arc<AdmissionControl>,
    sockets: Arc<AtomicUsize>,
}

impl Room {
    pub fn socket_connected(&self) {
        self.sockets.fetch_add(1, Ordering::SeqCst);
    }

    /// Returns `true` when this was the last live socket, meaning the
    /// caller should remove the room from the registry.
    pub fn socket_disconnected(&self) -> bool {
        self.sockets.fetch_sub(1, Ordering::SeqCst) == 1
    }
}

pub struct Lobby {
    rooms: RwLock<HashMap<String, Room>>,
    pool: Pool,
    cache: SharedCache,
    clock: Arc<dyn Clock>,
    room_connection_cap: usize,
    room_accept_rate_per_second: usize,
}

impl Lobby {
    pub fn new(
        pool: Pool,
        cache: SharedCache,
        clock: Arc<dyn Clock>,
        room_connection_cap: usize,
        room_accept_rate_per_second: usize,
    ) -> Self {
        Self {
            rooms: RwLock::new(HashMap::new()),
            pool,
            cache,
            clock,
            room_connection_cap,
            room_accept_rate_per_second,
        }
    }

    pub async fn get(&self, code: &str) -> Option<Room> {
        self.rooms.read().await.get(code).cloned()
    }

    /// Loads the quiz and its question list (cache-first, `spec.md`
    /// §4.2) and spawns a controller if none is running for this code.
    pub async fn get_or_create(&self, code: &str) -> Result<Room, ErrorKind> {
        if let Some(room) = self.get(code).await {
            return Ok(room);
        }

        let mut rooms = self.rooms.write().await;
        if let Some(room) = rooms.get(code) {
            return Ok(room.clone());
        }

        let (quiz, questions) = self.load(code).await?;
        let client = db::client(&self.pool).await?;
        let participants = db::participants::list_for_quiz(&client, code).await?;
        let (commands, hub) = room::controller::spawn(
            code.to_string(),
            self.pool.clone(),
            self.cache.clone(),
            self.clock.clone(),
            quiz,
            questions,
            participants,
        );
        let room = Room {
            commands,
            hub,
            admission: Arc::new(AdmissionControl::new(
                self.room_connection_cap,
                self.room_accept_rate_per_second,
            )),
            sockets: Arc::new(AtomicUsize::new(0)),
        };
        rooms.insert(code.to_string(), room.clone());
        Ok(room)
    }

    async fn load(&self, code: &str) -> Result<(Quiz, Vec<Question>), ErrorKind> {
        if let (Some(quiz), Some(questions)) = (
            self.cache.get_quiz::<Quiz>(code).await,
            self.cache.get_questions::<Vec<Question>>(code).await,
        ) {
            return Ok((quiz, questions));
        }

        let client = db::client(&self.pool).await?;
        let quiz = db::quizzes::get_by_code(&client, code)
            .await?
            .ok_or_else(|| ErrorKind::NotFound(format!("quiz {code} not found")))?;
        let questions = db::questions::list(&client, code).await?;
        self.cache.put_quiz(code, &quiz).await;
        self.cache.put_questions(code, &questions).await;
        Ok((quiz, questions))
    }

    /// Removes a room from the registry. Dropping the last `CommandSender`
    /// and `HubHandle` closes their channels, which ends the controller
    /// and hub tasks once any in-flight commands drain (`spec.md` §4.7).
    pub async fn remove(&self, code: &str) {
        self.rooms.write().await.remove(code);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn socket_disconnected_reports_true_only_on_last_leave() {
        let room = Room {
            commands: tokio::sync::mpsc::unbounded_channel().0,
            hub: crate::hub::spawn(),
            admission: Arc::new(AdmissionControl::new(10, 10)),
            sockets: Arc::new(AtomicUsize::new(0)),
        };
        room.socket_connected();
        room.socket_connected();
        assert!(!room.socket_disconnected());
        assert!(room.socket_disconnected());
    }
}
