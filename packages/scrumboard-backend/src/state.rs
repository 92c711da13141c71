/// Shared application state passed to axum handlers.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use scrumboard_core::board::Board;
use scrumboard_core::error::BoardError;
use scrumboard_core::events::BoardChangeEvent;
use scrumboard_core::service::InMemoryStoryService;
use scrumboard_core::storage::KeyValueStore;
use scrumboard_core::types::BoardId;
use tokio::sync::{broadcast, OwnedMutexGuard};

/// Per-board async mutex. Board-mutating requests hold it for their whole
/// read-reconcile-write cycle so two drops on one board never interleave.
#[derive(Default)]
pub struct BoardLocks {
    locks: Mutex<HashMap<BoardId, Arc<tokio::sync::Mutex<()>>>>,
}

impl BoardLocks {
    pub async fn lock(&self, board_id: BoardId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
            locks.entry(board_id).or_default().clone()
        };
        lock.lock_owned().await
    }
}

#[derive(Clone)]
pub struct AppState {
    pub stories: Arc<InMemoryStoryService>,
    pub kv: Arc<dyn KeyValueStore>,
    pub event_tx: broadcast::Sender<BoardChangeEvent>,
    pub board_locks: Arc<BoardLocks>,
    pub port: u16,
    pub bind_address: String,
}

impl AppState {
    pub fn new(
        stories: Arc<InMemoryStoryService>,
        kv: Arc<dyn KeyValueStore>,
        port: u16,
        bind_address: String,
    ) -> Self {
        let (event_tx, _) = broadcast::channel(256);
        Self {
            stories,
            kv,
            event_tx,
            board_locks: Arc::new(BoardLocks::default()),
            port,
            bind_address,
        }
    }

    /// Open a board view over the shared story service and column store.
    pub async fn open_board(&self, board_id: BoardId) -> Result<Board<InMemoryStoryService>, BoardError> {
        Board::open(board_id, self.stories.clone(), self.kv.clone()).await
    }

    /// Broadcast a change. Having no subscribers is fine.
    pub fn notify(&self, event: BoardChangeEvent) {
        let _ = self.event_tx.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_board_lock_serializes_one_board_only() {
        let locks = Arc::new(BoardLocks::default());
        let held = locks.lock(1).await;

        let waiting = tokio::time::timeout(Duration::from_millis(50), locks.lock(1)).await;
        assert!(waiting.is_err(), "second lock on board 1 must wait");

        let other = tokio::time::timeout(Duration::from_millis(50), locks.lock(2)).await;
        assert!(other.is_ok(), "board 2 is independent");

        let contender = tokio::spawn({
            let locks = locks.clone();
            async move {
                let _guard = locks.lock(1).await;
            }
        });
        drop(held);
        tokio::time::timeout(Duration::from_secs(1), contender)
            .await
            .expect("lock released")
            .unwrap();
    }
}
