//! Synthetic load: demo participants and bets injected into a live round.
//!
//! Synthetic players go through the same join and validation paths as real
//! traffic, and their records are persisted on the round once, so resolution
//! stays deterministic no matter how often the round is rendered. They hold
//! no wallet: their bets debit nothing and their winnings are skipped.

use crate::errors::{EngineError, EngineResult};
use crate::registry::RoundHandle;
use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Display names given to synthetic players
const FAKE_NAMES: &[&str] = &[
    "Alex Smith",
    "Jordan Lee",
    "Taylor Kim",
    "Morgan Chen",
    "Casey Lopez",
    "Riley Brown",
    "Jamie Wilson",
    "Drew Garcia",
    "Quinn Davis",
    "Avery Martin",
];

/// A generated participant, persisted on its round
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SyntheticPlayer {
    pub id: String,
    pub display_name: String,
}

impl SyntheticPlayer {
    fn generate<R: Rng>(rng: &mut R) -> Self {
        Self {
            id: format!("synthetic-{}", Uuid::new_v4()),
            display_name: FAKE_NAMES[rng.gen_range(0..FAKE_NAMES.len())].to_string(),
        }
    }
}

/// Add `count` synthetic players to the round's participants.
///
/// Returns the ids that were added. Fails once the round has completed.
pub fn inject_participants(handle: &RoundHandle, count: usize) -> EngineResult<Vec<String>> {
    let mut rng = rand::thread_rng();
    let mut round = handle.state.write().unwrap();
    if round.status == crate::round::RoundStatus::Completed {
        return Err(EngineError::InvalidTransition { from: round.status });
    }

    let mut ids = Vec::with_capacity(count);
    for _ in 0..count {
        let player = SyntheticPlayer::generate(&mut rng);
        round.join(player.id.clone());
        ids.push(player.id.clone());
        round.synthetic_players.push(player);
    }
    tracing::info!(round_id = %round.id, count, "Injected synthetic participants");
    Ok(ids)
}

/// Record `count` synthetic bets into an active round.
///
/// Numbers and amounts are drawn uniformly from the round's valid domain and
/// bet limits, and every bet passes the same validation as real traffic.
/// When the round holds no synthetic players yet, `count` are injected first
/// so each bet has a participant owner.
pub fn inject_bets(handle: &RoundHandle, count: usize) -> EngineResult<usize> {
    let mut rng = rand::thread_rng();
    let mut round = handle.state.write().unwrap();
    if round.status != crate::round::RoundStatus::Active {
        return Err(EngineError::RoundNotActive);
    }

    if round.synthetic_players.is_empty() && count > 0 {
        for _ in 0..count {
            let player = SyntheticPlayer::generate(&mut rng);
            round.join(player.id.clone());
            round.synthetic_players.push(player);
        }
    }

    let domain_max = round.config.number_domain_max;
    let (min_bet, max_bet) = (round.config.min_bet, round.config.max_bet);

    let mut recorded = 0;
    for _ in 0..count {
        let owner = {
            let players = &round.synthetic_players;
            players[rng.gen_range(0..players.len())].id.clone()
        };
        let number = rng.gen_range(0..=domain_max);
        let amount = rng.gen_range(min_bet..=max_bet);
        round.place_synthetic_bet(&owner, number, amount)?;
        recorded += 1;
    }

    tracing::info!(round_id = %round.id, recorded, "Injected synthetic bets");
    Ok(recorded)
}
