//! Round configuration with validation and defaults.

use crate::errors::{EngineError, EngineResult};
use serde::{Deserialize, Serialize};

/// Tax withheld from the total pool before distribution (GST), in percent.
pub const TAX_PERCENT: u8 = 28;

/// House fee taken from the total pool before distribution, in percent.
pub const HOUSE_PERCENT: u8 = 10;

/// Small-grid number domain (numbers 0..=15)
pub const SMALL_DOMAIN_MAX: u32 = 15;

/// Large-grid number domain (numbers 0..=200)
pub const LARGE_DOMAIN_MAX: u32 = 200;

/// One payout tier: a popularity rank and its share of the distributable pool
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct PayoutTier {
    pub rank: usize,
    pub share_percent: u8,
}

impl PayoutTier {
    pub fn new(rank: usize, share_percent: u8) -> Self {
        Self {
            rank,
            share_percent,
        }
    }
}

/// Three-tier schedule used by the "bluff" round variant: 50/25/15
pub fn three_tier_schedule() -> Vec<PayoutTier> {
    vec![
        PayoutTier::new(0, 50),
        PayoutTier::new(1, 25),
        PayoutTier::new(2, 15),
    ]
}

/// Single-winner schedule: 90% of the distributable pool to rank 0
pub fn single_winner_schedule() -> Vec<PayoutTier> {
    vec![PayoutTier::new(0, 90)]
}

/// Configuration for one betting round
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RoundConfig {
    pub name: String,
    pub min_bet: u64,
    pub max_bet: u64,
    pub duration_secs: u64,
    /// Bets may pick any number in 0..=number_domain_max
    pub number_domain_max: u32,
    pub payout_schedule: Vec<PayoutTier>,
    pub tax_percent: u8,
    pub house_percent: u8,
}

impl Default for RoundConfig {
    fn default() -> Self {
        Self {
            name: "Quick Pick Game".to_string(),
            min_bet: 100,
            max_bet: 1000,
            duration_secs: 60,
            number_domain_max: SMALL_DOMAIN_MAX,
            payout_schedule: three_tier_schedule(),
            tax_percent: TAX_PERCENT,
            house_percent: HOUSE_PERCENT,
        }
    }
}

impl RoundConfig {
    /// Large-domain variant used for high-population rounds
    pub fn large_domain(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            number_domain_max: LARGE_DOMAIN_MAX,
            ..Self::default()
        }
    }

    /// Single-winner variant
    pub fn single_winner(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            payout_schedule: single_winner_schedule(),
            ..Self::default()
        }
    }

    /// Validate invariants before a round is created
    pub fn validate(&self) -> EngineResult<()> {
        if self.min_bet >= self.max_bet {
            return Err(EngineError::InvalidConfig(format!(
                "min_bet {} must be less than max_bet {}",
                self.min_bet, self.max_bet
            )));
        }
        if self.duration_secs < 1 {
            return Err(EngineError::InvalidConfig(
                "duration_secs must be at least 1".to_string(),
            ));
        }
        if self.number_domain_max < 1 {
            return Err(EngineError::InvalidConfig(
                "number domain must contain at least two numbers".to_string(),
            ));
        }
        if self.payout_schedule.is_empty() {
            return Err(EngineError::InvalidConfig(
                "payout schedule cannot be empty".to_string(),
            ));
        }
        let total_share: u32 = self
            .payout_schedule
            .iter()
            .map(|t| t.share_percent as u32)
            .sum();
        if total_share > 100 {
            return Err(EngineError::InvalidConfig(format!(
                "payout shares sum to {}%, cannot exceed 100%",
                total_share
            )));
        }
        Ok(())
    }

    /// Fraction of the total pool left after tax and house fee
    pub fn distributable_fraction(&self) -> f64 {
        (1.0 - self.tax_percent as f64 / 100.0) * (1.0 - self.house_percent as f64 / 100.0)
    }
}
