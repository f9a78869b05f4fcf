//! Round resolution: popularity ranking, payout computation, winner credits.
//!
//! The least-chosen number wins. Ranking sorts ascending by selection count,
//! tie-broken by ascending number, so resolution is deterministic given the
//! recorded bets.

use crate::config::PayoutTier;
use crate::errors::{EngineError, EngineResult};
use crate::ledger::Bet;
use crate::round::{Round, RoundStatus};
use crate::wallet::WalletLedger;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One entry of the winning ranking: a number and how often it was chosen
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct NumberStat {
    pub number: u32,
    pub count: usize,
}

/// Payout record for one tier of the schedule
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct TierAward {
    pub rank: usize,
    pub number: u32,
    pub share_percent: u8,
    /// Exact tier prize; each qualifying bet is credited its floor.
    pub prize: f64,
    /// Bets credited at this tier
    pub paid_bets: usize,
    /// Winning bets owned by synthetic players, which hold no wallet
    pub skipped_synthetic: usize,
}

/// Everything the resolution produced, stored on the round once completed
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct RoundOutcome {
    pub ranking: Vec<NumberStat>,
    pub total_pool: u64,
    pub distributable: f64,
    pub awards: Vec<TierAward>,
}

/// Rank every number that received at least one bet.
///
/// Ascending by count, ties broken by ascending number.
pub fn rank_by_popularity(bets: &[Bet]) -> Vec<NumberStat> {
    let mut frequency: HashMap<u32, usize> = HashMap::new();
    for bet in bets {
        *frequency.entry(bet.number).or_insert(0) += 1;
    }

    let mut ranking: Vec<NumberStat> = frequency
        .into_iter()
        .map(|(number, count)| NumberStat { number, count })
        .collect();
    ranking.sort_by(|a, b| a.count.cmp(&b.count).then(a.number.cmp(&b.number)));
    ranking
}

/// Compute the outcome for a round's recorded bets without crediting anyone.
pub fn compute_outcome(round: &Round) -> RoundOutcome {
    let ranking = rank_by_popularity(round.ledger.bets());
    let total_pool = round.ledger.total_pool();
    let distributable = total_pool as f64 * round.config.distributable_fraction();

    let awards = round
        .config
        .payout_schedule
        .iter()
        .filter_map(|tier| award_for_tier(round, &ranking, distributable, tier))
        .collect();

    RoundOutcome {
        ranking,
        total_pool,
        distributable,
        awards,
    }
}

fn award_for_tier(
    round: &Round,
    ranking: &[NumberStat],
    distributable: f64,
    tier: &PayoutTier,
) -> Option<TierAward> {
    // Fewer distinct numbers than tiers: lower tiers simply go unpaid.
    let stat = ranking.get(tier.rank)?;
    let prize = distributable * tier.share_percent as f64 / 100.0;

    let mut paid_bets = 0;
    let mut skipped_synthetic = 0;
    for bet in round.ledger.bets() {
        if bet.number != stat.number {
            continue;
        }
        if round.is_synthetic(&bet.user_id) {
            skipped_synthetic += 1;
        } else {
            paid_bets += 1;
        }
    }

    Some(TierAward {
        rank: tier.rank,
        number: stat.number,
        share_percent: tier.share_percent,
        prize,
        paid_bets,
        skipped_synthetic,
    })
}

/// Resolve a round in place: compute the outcome, credit winners, complete.
///
/// Idempotent: a `Completed` round returns its stored outcome without paying
/// anyone again. Callers must hold the round's write lock, which makes the
/// manual-trigger-races-timer case safe: the loser observes `Completed`.
pub fn resolve(round: &mut Round, wallet: &WalletLedger) -> EngineResult<RoundOutcome> {
    match round.status {
        RoundStatus::Completed => {
            tracing::debug!(round_id = %round.id, "Resolution re-triggered on completed round");
            return round
                .outcome
                .clone()
                .ok_or(EngineError::InvalidTransition {
                    from: RoundStatus::Completed,
                });
        }
        RoundStatus::Waiting => {
            return Err(EngineError::InvalidTransition {
                from: RoundStatus::Waiting,
            })
        }
        RoundStatus::Active => {}
    }

    let outcome = compute_outcome(round);
    credit_winners(round, wallet, &outcome);
    round.complete(outcome.clone())?;

    tracing::info!(
        round_id = %round.id,
        total_pool = outcome.total_pool,
        distributable = outcome.distributable,
        tiers_paid = outcome.awards.len(),
        "Round resolved"
    );
    Ok(outcome)
}

fn credit_winners(round: &Round, wallet: &WalletLedger, outcome: &RoundOutcome) {
    for award in &outcome.awards {
        let credit = award.prize as u64;
        for bet in round.ledger.bets() {
            if bet.number != award.number {
                continue;
            }
            match wallet.credit(&bet.user_id, credit) {
                Some(balance) => {
                    tracing::debug!(
                        round_id = %round.id,
                        user_id = %bet.user_id,
                        rank = award.rank,
                        credit,
                        balance,
                        "Credited winner"
                    );
                }
                // Skip and keep crediting the rest either way, so the
                // round never sticks in `active`.
                None if round.is_synthetic(&bet.user_id) => {
                    tracing::debug!(
                        round_id = %round.id,
                        user_id = %bet.user_id,
                        rank = award.rank,
                        "Skipped credit for synthetic winner"
                    );
                }
                None => {
                    tracing::warn!(
                        round_id = %round.id,
                        user_id = %bet.user_id,
                        rank = award.rank,
                        credit,
                        "Credit failed for winner without an account"
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RoundConfig;
    use crate::round::now_ms;

    fn bet(user: &str, number: u32) -> Bet {
        Bet {
            user_id: user.to_string(),
            round_id: "round-1".to_string(),
            number,
            amount: 100,
            timestamp: 0,
        }
    }

    #[test]
    fn test_ranking_ascending_count() {
        let bets = vec![bet("a", 7), bet("b", 7), bet("c", 11), bet("d", 3)];
        let ranking = rank_by_popularity(&bets);
        assert_eq!(
            ranking,
            vec![
                NumberStat { number: 3, count: 1 },
                NumberStat {
                    number: 11,
                    count: 1
                },
                NumberStat { number: 7, count: 2 },
            ]
        );
    }

    #[test]
    fn test_tie_break_is_ascending_number() {
        let bets = vec![bet("a", 9), bet("b", 2), bet("c", 5)];
        let ranking = rank_by_popularity(&bets);
        let numbers: Vec<u32> = ranking.iter().map(|s| s.number).collect();
        assert_eq!(numbers, vec![2, 5, 9]);
    }

    #[test]
    fn test_empty_round_has_empty_ranking() {
        assert!(rank_by_popularity(&[]).is_empty());
    }

    #[test]
    fn test_worked_payout_scenario() {
        // Four bets of 100: one each on 3 and 11, two on 7.
        let wallet = WalletLedger::new();
        let host = wallet.register("host");
        let (u3, u7a, u7b, u11) = (
            wallet.register("u3"),
            wallet.register("u7a"),
            wallet.register("u7b"),
            wallet.register("u11"),
        );

        let mut round = Round::new(&host.id, RoundConfig::default()).unwrap();
        for user in [&u3, &u7a, &u7b, &u11] {
            round.join(user.id.clone());
        }
        round.start(now_ms()).unwrap();

        round.place_bet(&wallet, &u3.id, 3, 100).unwrap();
        round.place_bet(&wallet, &u7a.id, 7, 100).unwrap();
        round.place_bet(&wallet, &u7b.id, 7, 100).unwrap();
        round.place_bet(&wallet, &u11.id, 11, 100).unwrap();

        let outcome = resolve(&mut round, &wallet).unwrap();

        assert_eq!(outcome.total_pool, 400);
        assert!((outcome.distributable - 259.2).abs() < 1e-9);
        let numbers: Vec<u32> = outcome.ranking.iter().map(|s| s.number).collect();
        assert_eq!(numbers, vec![3, 11, 7]);

        // 50/25/15 tiers over 259.2
        assert!((outcome.awards[0].prize - 129.6).abs() < 1e-9);
        assert_eq!(outcome.awards[0].number, 3);
        assert!((outcome.awards[1].prize - 64.8).abs() < 1e-9);
        assert_eq!(outcome.awards[1].number, 11);
        assert!((outcome.awards[2].prize - 38.88).abs() < 1e-9);
        assert_eq!(outcome.awards[2].number, 7);

        // Credits floor the exact prize: 10_000 - 100 + 129 etc.
        assert_eq!(wallet.balance_of(&u3.id), Some(10_029));
        assert_eq!(wallet.balance_of(&u11.id), Some(9_964));
        // Both bettors on 7 receive the full tier prize.
        assert_eq!(wallet.balance_of(&u7a.id), Some(9_938));
        assert_eq!(wallet.balance_of(&u7b.id), Some(9_938));
    }

    #[test]
    fn test_payout_conservation_bound() {
        let wallet = WalletLedger::new();
        let host = wallet.register("host");
        let mut round = Round::new(&host.id, RoundConfig::default()).unwrap();
        let mut users = Vec::new();
        for i in 0..10 {
            let user = wallet.register(format!("player-{}", i));
            round.join(user.id.clone());
            users.push(user);
        }
        round.start(now_ms()).unwrap();
        // Distinct numbers, so every tier pays exactly one bet.
        for (i, user) in users.iter().enumerate() {
            round.place_bet(&wallet, &user.id, i as u32, 500).unwrap();
        }

        let before: u64 = users.iter().map(|u| wallet.balance_of(&u.id).unwrap()).sum();
        let outcome = resolve(&mut round, &wallet).unwrap();
        let after: u64 = users.iter().map(|u| wallet.balance_of(&u.id).unwrap()).sum();

        let credited = after - before;
        let bound = outcome.total_pool as f64 * 0.72 * 0.9;
        assert!((credited as f64) <= bound + 1e-9);
    }

    #[test]
    fn test_fewer_numbers_than_tiers_leaves_tiers_unpaid() {
        let wallet = WalletLedger::new();
        let user = wallet.register("solo");
        let mut round = Round::new(&user.id, RoundConfig::default()).unwrap();
        round.start(now_ms()).unwrap();
        round.place_bet(&wallet, &user.id, 5, 100).unwrap();

        let outcome = resolve(&mut round, &wallet).unwrap();
        assert_eq!(outcome.ranking.len(), 1);
        // Only rank 0 can pay; ranks 1 and 2 have no number.
        assert_eq!(outcome.awards.len(), 1);

        let credited = wallet.balance_of(&user.id).unwrap() + 100 - 10_000;
        assert!((credited as f64) < outcome.total_pool as f64 * 0.72 * 0.9);
    }

    #[test]
    fn test_resolution_is_idempotent() {
        let wallet = WalletLedger::new();
        let user = wallet.register("solo");
        let mut round = Round::new(&user.id, RoundConfig::default()).unwrap();
        round.start(now_ms()).unwrap();
        round.place_bet(&wallet, &user.id, 5, 100).unwrap();

        let first = resolve(&mut round, &wallet).unwrap();
        let balance_after_first = wallet.balance_of(&user.id);

        let second = resolve(&mut round, &wallet).unwrap();
        assert_eq!(first, second);
        // No second credit happened.
        assert_eq!(wallet.balance_of(&user.id), balance_after_first);
    }

    #[test]
    fn test_resolving_waiting_round_fails() {
        let wallet = WalletLedger::new();
        let user = wallet.register("solo");
        let mut round = Round::new(&user.id, RoundConfig::default()).unwrap();

        let err = resolve(&mut round, &wallet).unwrap_err();
        assert_eq!(
            err,
            EngineError::InvalidTransition {
                from: RoundStatus::Waiting
            }
        );
    }

    #[test]
    fn test_synthetic_winner_is_skipped_not_errored() {
        let wallet = WalletLedger::new();
        let user = wallet.register("real");
        let mut round = Round::new(&user.id, RoundConfig::default()).unwrap();
        round.join("bot-1");
        round.synthetic_players.push(crate::synthetic::SyntheticPlayer {
            id: "bot-1".to_string(),
            display_name: "Alex Smith".to_string(),
        });
        round.start(now_ms()).unwrap();

        // Both pick the same winning number; only the real user gets paid.
        round.place_bet(&wallet, &user.id, 4, 100).unwrap();
        round.place_synthetic_bet("bot-1", 4, 100).unwrap();

        let outcome = resolve(&mut round, &wallet).unwrap();
        assert_eq!(outcome.awards[0].paid_bets, 1);
        assert_eq!(outcome.awards[0].skipped_synthetic, 1);
        assert_eq!(round.status, RoundStatus::Completed);
    }
}
