//! Wallet ledger: one balance per registered user.
//!
//! Balances are whole currency units and are only ever mutated through
//! `debit`/`credit`. The `DashMap` entry lock serializes operations per user
//! while leaving different users free to proceed in parallel, so a debit can
//! never be lost to a concurrent credit and no balance ever goes negative.

use crate::errors::{EngineError, EngineResult};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Default balance granted to a freshly registered user
pub const DEFAULT_STARTING_BALANCE: u64 = 10_000;

/// A registered player account
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub display_name: String,
    pub balance: u64,
}

/// Thread-safe ledger of user balances
pub struct WalletLedger {
    balances: DashMap<String, u64>,
    starting_balance: u64,
}

impl WalletLedger {
    pub fn new() -> Self {
        Self::with_starting_balance(DEFAULT_STARTING_BALANCE)
    }

    pub fn with_starting_balance(starting_balance: u64) -> Self {
        Self {
            balances: DashMap::new(),
            starting_balance,
        }
    }

    /// Create an account with the configured starting balance
    pub fn register(&self, display_name: impl Into<String>) -> User {
        let user = User {
            id: Uuid::new_v4().to_string(),
            display_name: display_name.into(),
            balance: self.starting_balance,
        };
        self.balances.insert(user.id.clone(), user.balance);
        tracing::debug!(user_id = %user.id, balance = user.balance, "Registered user");
        user
    }

    /// Atomically withdraw `amount`, failing if the balance would go negative.
    ///
    /// Returns the new balance. Unknown accounts are treated as a zero
    /// balance, so synthetic players can never be debited either.
    pub fn debit(&self, user_id: &str, amount: u64) -> EngineResult<u64> {
        match self.balances.get_mut(user_id) {
            Some(mut balance) => {
                if *balance < amount {
                    return Err(EngineError::InsufficientBalance {
                        balance: *balance,
                        required: amount,
                    });
                }
                *balance -= amount;
                Ok(*balance)
            }
            None => Err(EngineError::InsufficientBalance {
                balance: 0,
                required: amount,
            }),
        }
    }

    /// Atomically deposit `amount` into an existing account.
    ///
    /// Returns the new balance, or `None` when no such account exists —
    /// callers crediting winners use this to skip synthetic players.
    pub fn credit(&self, user_id: &str, amount: u64) -> Option<u64> {
        let mut balance = self.balances.get_mut(user_id)?;
        *balance += amount;
        Some(*balance)
    }

    /// Snapshot read of a user's balance
    pub fn balance_of(&self, user_id: &str) -> Option<u64> {
        self.balances.get(user_id).map(|b| *b)
    }

    /// Number of registered accounts
    pub fn account_count(&self) -> usize {
        self.balances.len()
    }
}

impl Default for WalletLedger {
    fn default() -> Self {
        Self::new()
    }
}
