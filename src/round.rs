//! A single betting round: lifecycle state machine and wager validation.
//!
//! Status only ever moves `waiting -> active -> completed`. Bets are accepted
//! while `active`; the move to `completed` happens exclusively in the
//! resolution engine, together with the winning ranking, under one write
//! lock.

use crate::config::RoundConfig;
use crate::errors::{EngineError, EngineResult};
use crate::ledger::{Bet, BetLedger};
use crate::resolution::RoundOutcome;
use crate::synthetic::SyntheticPlayer;
use crate::wallet::WalletLedger;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use uuid::Uuid;

/// Milliseconds since the Unix epoch
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Lifecycle state of a round
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RoundStatus {
    Waiting,
    Active,
    Completed,
}

impl fmt::Display for RoundStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoundStatus::Waiting => write!(f, "waiting"),
            RoundStatus::Active => write!(f, "active"),
            RoundStatus::Completed => write!(f, "completed"),
        }
    }
}

/// Result of the pure `time_remaining` query.
///
/// `Ended` means the clock ran out; the round may still read `active` until
/// the deferred resolution runs, and callers should display it as over.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase", tag = "state", content = "secs")]
pub enum TimeRemaining {
    NotStarted,
    Remaining(u64),
    Ended,
}

/// One betting round and all of its state
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Round {
    pub id: String,
    pub created_by: String,
    pub created_at: i64,
    pub status: RoundStatus,
    pub config: RoundConfig,
    pub participants: HashSet<String>,
    /// Synthetic players injected into this round; they have no wallet.
    /// Persisted once so renders and resolution see the same records.
    pub synthetic_players: Vec<SyntheticPlayer>,
    pub ledger: BetLedger,
    /// Set when the round starts: ms timestamp at which betting closes
    pub end_time: Option<i64>,
    /// Set by the resolution engine, atomically with `status = Completed`
    pub outcome: Option<RoundOutcome>,
}

impl Round {
    /// Create a round in `waiting` state. The creator joins automatically.
    pub fn new(created_by: impl Into<String>, config: RoundConfig) -> EngineResult<Self> {
        config.validate()?;
        let created_by = created_by.into();
        let mut participants = HashSet::new();
        participants.insert(created_by.clone());

        let round = Self {
            id: Uuid::new_v4().to_string(),
            created_by,
            created_at: now_ms(),
            status: RoundStatus::Waiting,
            config,
            participants,
            synthetic_players: Vec::new(),
            ledger: BetLedger::new(),
            end_time: None,
            outcome: None,
        };
        tracing::info!(round_id = %round.id, name = %round.config.name, "Created round");
        Ok(round)
    }

    /// Add a participant. Idempotent: re-joining is a no-op.
    pub fn join(&mut self, user_id: impl Into<String>) {
        self.participants.insert(user_id.into());
    }

    /// Remove a participant. Already-recorded bets stand.
    pub fn leave(&mut self, user_id: &str) {
        self.participants.remove(user_id);
    }

    pub fn is_participant(&self, user_id: &str) -> bool {
        self.participants.contains(user_id)
    }

    pub fn is_synthetic(&self, user_id: &str) -> bool {
        self.synthetic_players.iter().any(|p| p.id == user_id)
    }

    /// Transition `waiting -> active` and fix the betting deadline.
    ///
    /// Any other starting state is an error, and a failed start leaves
    /// `end_time` untouched.
    pub fn start(&mut self, now: i64) -> EngineResult<()> {
        if self.status != RoundStatus::Waiting {
            return Err(EngineError::InvalidTransition { from: self.status });
        }
        self.status = RoundStatus::Active;
        self.end_time = Some(now + (self.config.duration_secs as i64) * 1000);
        tracing::info!(
            round_id = %self.id,
            duration_secs = self.config.duration_secs,
            "Round started"
        );
        Ok(())
    }

    /// Pure query of the round clock; never mutates state.
    pub fn time_remaining(&self, now: i64) -> TimeRemaining {
        match (self.status, self.end_time) {
            (RoundStatus::Waiting, _) | (_, None) => TimeRemaining::NotStarted,
            (RoundStatus::Completed, _) => TimeRemaining::Ended,
            (RoundStatus::Active, Some(end)) => {
                let left_ms = end - now;
                if left_ms <= 0 {
                    TimeRemaining::Ended
                } else {
                    // Round up so a round never shows 0s while still open.
                    TimeRemaining::Remaining(((left_ms + 999) / 1000) as u64)
                }
            }
        }
    }

    /// Validate and record a wager, debiting the bettor's wallet.
    ///
    /// The debit and the ledger append are one unit: callers hold this
    /// round's write lock, the debit is the only fallible step, and the
    /// append cannot fail after it.
    pub fn place_bet(
        &mut self,
        wallet: &WalletLedger,
        user_id: &str,
        number: u32,
        amount: u64,
    ) -> EngineResult<Bet> {
        self.check_wager(user_id, number, amount)?;
        wallet.debit(user_id, amount)?;
        Ok(self.append_bet(user_id, number, amount))
    }

    /// Record a synthetic wager: same validation, no wallet behind it.
    pub fn place_synthetic_bet(
        &mut self,
        user_id: &str,
        number: u32,
        amount: u64,
    ) -> EngineResult<Bet> {
        self.check_wager(user_id, number, amount)?;
        Ok(self.append_bet(user_id, number, amount))
    }

    fn check_wager(&self, user_id: &str, number: u32, amount: u64) -> EngineResult<()> {
        if self.status != RoundStatus::Active {
            return Err(EngineError::RoundNotActive);
        }
        if !self.is_participant(user_id) {
            return Err(EngineError::NotParticipant);
        }
        if number > self.config.number_domain_max {
            return Err(EngineError::InvalidNumber {
                number,
                max: self.config.number_domain_max,
            });
        }
        if amount < self.config.min_bet || amount > self.config.max_bet {
            return Err(EngineError::InvalidAmount {
                amount,
                min: self.config.min_bet,
                max: self.config.max_bet,
            });
        }
        Ok(())
    }

    fn append_bet(&mut self, user_id: &str, number: u32, amount: u64) -> Bet {
        let bet = Bet {
            user_id: user_id.to_string(),
            round_id: self.id.clone(),
            number,
            amount,
            timestamp: now_ms(),
        };
        self.ledger.record(bet.clone());
        tracing::debug!(
            round_id = %self.id,
            user_id = %user_id,
            number,
            amount,
            "Bet recorded"
        );
        bet
    }

    /// Install the resolution outcome and close the round.
    ///
    /// Called by the resolution engine while holding the round write lock,
    /// so `outcome` and `Completed` become visible together.
    pub(crate) fn complete(&mut self, outcome: RoundOutcome) -> EngineResult<()> {
        if self.status != RoundStatus::Active {
            return Err(EngineError::InvalidTransition { from: self.status });
        }
        self.outcome = Some(outcome);
        self.status = RoundStatus::Completed;
        Ok(())
    }

    /// Snapshot of the round for the rendering collaborator
    pub fn view(&self, now: i64) -> RoundView {
        RoundView {
            id: self.id.clone(),
            name: self.config.name.clone(),
            created_by: self.created_by.clone(),
            status: self.status,
            min_bet: self.config.min_bet,
            max_bet: self.config.max_bet,
            number_domain_max: self.config.number_domain_max,
            participant_count: self.participants.len(),
            bet_count: self.ledger.len(),
            total_pool: self.ledger.total_pool(),
            time_remaining: self.time_remaining(now),
            outcome: self.outcome.clone(),
        }
    }
}

/// Read-only projection of a round, safe to hand to the UI layer
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RoundView {
    pub id: String,
    pub name: String,
    pub created_by: String,
    pub status: RoundStatus,
    pub min_bet: u64,
    pub max_bet: u64,
    pub number_domain_max: u32,
    pub participant_count: usize,
    pub bet_count: usize,
    pub total_pool: u64,
    pub time_remaining: TimeRemaining,
    pub outcome: Option<RoundOutcome>,
}
