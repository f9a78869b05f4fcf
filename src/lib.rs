//! Betster round engine
//!
//! In-memory engine for a number-guessing betting game: rounds move through
//! `waiting -> active -> completed`, wagers are validated against per-user
//! balances, and resolution ranks numbers by popularity (least chosen wins)
//! and pays a prize pool net of tax and house fee. Everything is
//! process-resident; the rendering layer is an external collaborator that
//! only calls the operations on [`BetsterEngine`].

use std::sync::Arc;

pub mod config;
pub mod errors;
pub mod ledger;
pub mod registry;
pub mod resolution;
pub mod round;
pub mod synthetic;
pub mod wallet;

pub use config::{PayoutTier, RoundConfig};
pub use errors::{EngineError, EngineResult};
pub use ledger::Bet;
pub use resolution::{NumberStat, RoundOutcome, TierAward};
pub use round::{RoundStatus, RoundView, TimeRemaining};
pub use wallet::User;

/// Public entry point for the round engine.
///
/// Owns the wallet ledger (balances shared across rounds) and the round
/// registry (one independently locked record per round).
pub struct BetsterEngine {
    wallet: Arc<wallet::WalletLedger>,
    registry: registry::RoundRegistry,
}

impl BetsterEngine {
    pub fn new() -> Self {
        Self {
            wallet: Arc::new(wallet::WalletLedger::new()),
            registry: registry::RoundRegistry::new(),
        }
    }

    pub fn with_starting_balance(starting_balance: u64) -> Self {
        Self {
            wallet: Arc::new(wallet::WalletLedger::with_starting_balance(starting_balance)),
            registry: registry::RoundRegistry::new(),
        }
    }

    /// Create a session account with the starting balance
    pub fn register_user(&self, display_name: impl Into<String>) -> User {
        self.wallet.register(display_name)
    }

    pub fn balance_of(&self, user_id: &str) -> Option<u64> {
        self.wallet.balance_of(user_id)
    }

    /// Create a round in `waiting` state and return its id
    pub fn create_round(&self, created_by: &str, config: RoundConfig) -> EngineResult<String> {
        self.registry.create(created_by, config)
    }

    pub fn join_round(&self, round_id: &str, user_id: &str) -> EngineResult<()> {
        let handle = self.registry.get(round_id)?;
        handle.state.write().unwrap().join(user_id);
        Ok(())
    }

    pub fn leave_round(&self, round_id: &str, user_id: &str) -> EngineResult<()> {
        let handle = self.registry.get(round_id)?;
        handle.state.write().unwrap().leave(user_id);
        Ok(())
    }

    /// Start the round and schedule its single timer-driven resolution
    pub fn start_round(&self, round_id: &str) -> EngineResult<()> {
        self.registry.start(round_id, self.wallet.clone())
    }

    /// Validate and record a wager against the caller's balance
    pub fn place_bet(
        &self,
        round_id: &str,
        user_id: &str,
        number: u32,
        amount: u64,
    ) -> EngineResult<Bet> {
        let handle = self.registry.get(round_id)?;
        let mut round = handle.state.write().unwrap();
        round.place_bet(&self.wallet, user_id, number, amount)
    }

    /// Snapshot of a round for display
    pub fn get_round(&self, round_id: &str) -> EngineResult<RoundView> {
        let handle = self.registry.get(round_id)?;
        let round = handle.state.read().unwrap();
        Ok(round.view(round::now_ms()))
    }

    /// Manually trigger resolution; idempotent against the scheduled timer
    pub fn resolve_round(&self, round_id: &str) -> EngineResult<RoundOutcome> {
        self.registry.resolve_now(round_id, &self.wallet)
    }

    /// Demo/test hook: add synthetic participants, then synthetic bets
    pub fn inject_synthetic_load(
        &self,
        round_id: &str,
        participant_count: usize,
        bet_count: usize,
    ) -> EngineResult<usize> {
        let handle = self.registry.get(round_id)?;
        if participant_count > 0 {
            synthetic::inject_participants(&handle, participant_count)?;
        }
        if bet_count > 0 {
            synthetic::inject_bets(&handle, bet_count)
        } else {
            Ok(0)
        }
    }

    /// Evict a round and abort its pending timer
    pub fn remove_round(&self, round_id: &str) -> bool {
        self.registry.remove(round_id)
    }

    pub fn round_ids(&self) -> Vec<String> {
        self.registry.round_ids()
    }
}

impl Default for BetsterEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_join_bet_flow() {
        let engine = BetsterEngine::new();
        let alice = engine.register_user("Alice");
        let bob = engine.register_user("Bob");

        let round_id = engine
            .create_round(&alice.id, RoundConfig::default())
            .unwrap();
        engine.join_round(&round_id, &bob.id).unwrap();
        engine.start_round(&round_id).unwrap();

        engine.place_bet(&round_id, &bob.id, 7, 300).unwrap();
        assert_eq!(engine.balance_of(&bob.id), Some(9_700));

        let view = engine.get_round(&round_id).unwrap();
        assert_eq!(view.status, RoundStatus::Active);
        assert_eq!(view.participant_count, 2);
        assert_eq!(view.bet_count, 1);
        assert_eq!(view.total_pool, 300);
        assert!(matches!(view.time_remaining, TimeRemaining::Remaining(_)));
    }

    #[tokio::test]
    async fn test_unknown_round_is_not_found() {
        let engine = BetsterEngine::new();
        let user = engine.register_user("Alice");
        assert!(matches!(
            engine.place_bet("missing", &user.id, 1, 100),
            Err(EngineError::RoundNotFound(_))
        ));
        assert!(matches!(
            engine.get_round("missing"),
            Err(EngineError::RoundNotFound(_))
        ));
        assert!(matches!(
            engine.start_round("missing"),
            Err(EngineError::RoundNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_view_shows_outcome_only_when_completed() {
        let engine = BetsterEngine::new();
        let alice = engine.register_user("Alice");
        let round_id = engine
            .create_round(&alice.id, RoundConfig::default())
            .unwrap();
        engine.start_round(&round_id).unwrap();
        engine.place_bet(&round_id, &alice.id, 3, 100).unwrap();

        assert!(engine.get_round(&round_id).unwrap().outcome.is_none());

        engine.resolve_round(&round_id).unwrap();
        let view = engine.get_round(&round_id).unwrap();
        assert_eq!(view.status, RoundStatus::Completed);
        let outcome = view.outcome.expect("completed round exposes its outcome");
        assert_eq!(outcome.ranking.len(), 1);
        assert_eq!(view.time_remaining, TimeRemaining::Ended);
    }

    #[tokio::test]
    async fn test_synthetic_load_through_facade() {
        let engine = BetsterEngine::new();
        let host = engine.register_user("Host");
        let round_id = engine
            .create_round(&host.id, RoundConfig::large_domain("Big Room"))
            .unwrap();
        engine.start_round(&round_id).unwrap();

        let recorded = engine.inject_synthetic_load(&round_id, 100, 500).unwrap();
        assert_eq!(recorded, 500);

        let view = engine.get_round(&round_id).unwrap();
        assert_eq!(view.participant_count, 101);
        assert_eq!(view.bet_count, 500);
    }
}
