//! Round registry: owns every live round and its resolution timer.
//!
//! Each round lives behind its own `RwLock` inside an `Arc`'d handle, so
//! rounds never block one another and whole-registry copies are never made.
//! The deferred resolution task is held on the handle, which ties the timer
//! to the round's lifetime: evicting the round aborts the timer.

use crate::config::RoundConfig;
use crate::errors::{EngineError, EngineResult};
use crate::resolution::{self, RoundOutcome};
use crate::round::{now_ms, Round};
use crate::wallet::WalletLedger;
use dashmap::DashMap;
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;
use tokio::task::JoinHandle;

/// A live round plus its (at most one) scheduled resolution task
#[derive(Debug)]
pub struct RoundHandle {
    pub state: RwLock<Round>,
    timer: Mutex<Option<JoinHandle<()>>>,
}

impl RoundHandle {
    fn new(round: Round) -> Self {
        Self {
            state: RwLock::new(round),
            timer: Mutex::new(None),
        }
    }

    /// Abort the pending resolution task, if any
    fn cancel_timer(&self) {
        if let Some(task) = self.timer.lock().unwrap().take() {
            task.abort();
        }
    }
}

/// Single source of truth for which rounds exist
pub struct RoundRegistry {
    rounds: DashMap<String, Arc<RoundHandle>>,
}

impl RoundRegistry {
    pub fn new() -> Self {
        Self {
            rounds: DashMap::new(),
        }
    }

    /// Create a round in `waiting` state and return its id.
    ///
    /// The map insert is the serialization point: each call yields exactly
    /// one round under a fresh id, so two callers can never race one id.
    pub fn create(&self, created_by: &str, config: RoundConfig) -> EngineResult<String> {
        let round = Round::new(created_by, config)?;
        let round_id = round.id.clone();
        self.rounds
            .insert(round_id.clone(), Arc::new(RoundHandle::new(round)));
        Ok(round_id)
    }

    pub fn get(&self, round_id: &str) -> EngineResult<Arc<RoundHandle>> {
        self.rounds
            .get(round_id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| EngineError::RoundNotFound(round_id.to_string()))
    }

    /// Start a round and schedule its single deferred resolution.
    pub fn start(&self, round_id: &str, wallet: Arc<WalletLedger>) -> EngineResult<()> {
        let handle = self.get(round_id)?;

        let duration_secs = {
            let mut round = handle.state.write().unwrap();
            round.start(now_ms())?;
            round.config.duration_secs
        };

        let timer_handle = handle.clone();
        let timer_round_id = round_id.to_string();
        let task = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(duration_secs)).await;
            let mut round = timer_handle.state.write().unwrap();
            if let Err(err) = resolution::resolve(&mut round, &wallet) {
                tracing::warn!(round_id = %timer_round_id, %err, "Timer-driven resolution failed");
            }
        });
        *handle.timer.lock().unwrap() = Some(task);
        Ok(())
    }

    /// Manually trigger resolution; idempotent against the timer.
    pub fn resolve_now(&self, round_id: &str, wallet: &WalletLedger) -> EngineResult<RoundOutcome> {
        let handle = self.get(round_id)?;
        let mut round = handle.state.write().unwrap();
        resolution::resolve(&mut round, wallet)
    }

    /// Evict a round, aborting any pending resolution timer.
    pub fn remove(&self, round_id: &str) -> bool {
        match self.rounds.remove(round_id) {
            Some((_, handle)) => {
                handle.cancel_timer();
                tracing::info!(round_id = %round_id, "Round evicted");
                true
            }
            None => false,
        }
    }

    pub fn round_ids(&self) -> Vec<String> {
        self.rounds.iter().map(|e| e.key().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.rounds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rounds.is_empty()
    }
}

impl Default for RoundRegistry {
    fn default() -> Self {
        Self::new()
    }
}
