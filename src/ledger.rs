//! Per-round append-only record of accepted wagers.

use serde::{Deserialize, Serialize};

/// One accepted wager. Immutable once recorded.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Bet {
    pub user_id: String,
    pub round_id: String,
    pub number: u32,
    pub amount: u64,
    /// Milliseconds since the Unix epoch
    pub timestamp: i64,
}

/// Append-only bet ledger for a single round.
///
/// Validation and the wallet debit happen in `Round::place_bet`; by the time
/// a bet reaches `record` it is final.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct BetLedger {
    bets: Vec<Bet>,
}

impl BetLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an accepted bet. Bets are never mutated or removed.
    pub fn record(&mut self, bet: Bet) -> &Bet {
        self.bets.push(bet);
        self.bets.last().expect("ledger cannot be empty after push")
    }

    pub fn bets(&self) -> &[Bet] {
        &self.bets
    }

    pub fn len(&self) -> usize {
        self.bets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bets.is_empty()
    }

    /// Sum of all wagered amounts in this round
    pub fn total_pool(&self) -> u64 {
        self.bets.iter().map(|b| b.amount).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bet(user: &str, number: u32, amount: u64) -> Bet {
        Bet {
            user_id: user.to_string(),
            round_id: "round-1".to_string(),
            number,
            amount,
            timestamp: 0,
        }
    }

    #[test]
    fn test_record_appends_in_order() {
        let mut ledger = BetLedger::new();
        ledger.record(bet("a", 3, 100));
        ledger.record(bet("b", 7, 200));

        assert_eq!(ledger.len(), 2);
        assert_eq!(ledger.bets()[0].user_id, "a");
        assert_eq!(ledger.bets()[1].number, 7);
    }

    #[test]
    fn test_total_pool() {
        let mut ledger = BetLedger::new();
        assert_eq!(ledger.total_pool(), 0);
        ledger.record(bet("a", 3, 100));
        ledger.record(bet("b", 7, 250));
        assert_eq!(ledger.total_pool(), 350);
    }
}
