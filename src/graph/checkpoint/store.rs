// SPDX-License-Identifier: MIT

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::backend::{CheckpointBackend, MemoryBackend};
use crate::graph::state::{StateSchema, WorkflowState};
use crate::kit::error::CheckpointError;

/// Durable snapshot of a session's state between runs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionCheckpoint {
    pub session_id: String,
    pub state: BTreeMap<String, Value>,
    pub last_updated: DateTime<Utc>,
}

impl SessionCheckpoint {
    pub fn new(session_id: &str, state: &WorkflowState) -> Self {
        Self {
            session_id: session_id.to_string(),
            state: state.fields().clone(),
            last_updated: Utc::now(),
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>, CheckpointError> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn decode(session_id: &str, bytes: &[u8]) -> Result<Self, CheckpointError> {
        serde_json::from_slice(bytes).map_err(|source| CheckpointError::Corrupt {
            session_id: session_id.to_string(),
            source,
        })
    }

    /// Rehydrate under a graph's schema
    pub fn to_state(&self, schema: Arc<StateSchema>) -> WorkflowState {
        let mut state = WorkflowState::new(schema);
        state.restore(self.state.clone());
        state
    }
}

/// Session-keyed checkpoint store with per-session mutual exclusion
///
/// Cloning is cheap; clones share the backend and the lock table.
#[derive(Clone)]
pub struct CheckpointStore {
    backend: Arc<dyn CheckpointBackend>,
    locks: Arc<Mutex<HashMap<String, Arc<Mutex<()>>>>>,
}

impl CheckpointStore {
    pub fn new(backend: Arc<dyn CheckpointBackend>) -> Self {
        Self {
            backend,
            locks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryBackend::new()))
    }

    /// Exclusive access to one session until the guard drops
    pub async fn session(&self, session_id: &str) -> SessionGuard {
        let lock = {
            let mut locks = self.locks.lock().await;
            // Entries referenced only by the table belong to finished runs
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            locks
                .entry(session_id.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        let guard = lock.lock_owned().await;
        SessionGuard {
            backend: self.backend.clone(),
            session_id: session_id.to_string(),
            _guard: guard,
        }
    }

    pub async fn get(&self, session_id: &str) -> Result<Option<SessionCheckpoint>, CheckpointError> {
        self.session(session_id).await.load().await
    }

    pub async fn put(
        &self,
        session_id: &str,
        state: &WorkflowState,
    ) -> Result<SessionCheckpoint, CheckpointError> {
        self.session(session_id).await.save(state).await
    }

    /// Delete a session's checkpoint; returns whether one existed
    pub async fn evict(&self, session_id: &str) -> Result<bool, CheckpointError> {
        let removed = self.session(session_id).await.delete().await?;
        self.release(session_id).await;
        if removed {
            log::info!("Evicted checkpoint for session '{}'", session_id);
        }
        Ok(removed)
    }

    /// Drop a session's lock entry unless a run still holds or awaits it
    async fn release(&self, session_id: &str) {
        let mut locks = self.locks.lock().await;
        if locks
            .get(session_id)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            locks.remove(session_id);
        }
    }
}

/// Held for the duration of a run; other runs on the same session wait
pub struct SessionGuard {
    backend: Arc<dyn CheckpointBackend>,
    session_id: String,
    _guard: OwnedMutexGuard<()>,
}

impl SessionGuard {
    pub async fn load(&self) -> Result<Option<SessionCheckpoint>, CheckpointError> {
        match self.backend.get(&self.session_id).await? {
            Some(bytes) => SessionCheckpoint::decode(&self.session_id, &bytes).map(Some),
            None => Ok(None),
        }
    }

    pub async fn save(&self, state: &WorkflowState) -> Result<SessionCheckpoint, CheckpointError> {
        let checkpoint = SessionCheckpoint::new(&self.session_id, state);
        self.backend
            .put(&self.session_id, checkpoint.encode()?)
            .await?;
        log::debug!(
            "Checkpointed session '{}' ({} fields)",
            self.session_id,
            checkpoint.state.len()
        );
        Ok(checkpoint)
    }

    async fn delete(&self) -> Result<bool, CheckpointError> {
        self.backend.delete(&self.session_id).await
    }
}
