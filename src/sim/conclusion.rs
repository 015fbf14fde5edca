//! Match conclusion: ELO, brackets and rewards

use serde::{Deserialize, Serialize};

use crate::catalog::Phase;
use crate::consts::{DEFAULT_MAX_HP, ELO_MAX, ELO_MIN};
use crate::round_i32;

/// ELO K-factor
pub const K_FACTOR: f32 = 24.0;

pub const WIN_COINS: f32 = 80.0;
pub const LOSS_COINS: f32 = 35.0;
pub const WIN_XP: u32 = 90;
pub const LOSS_XP: u32 = 45;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    Win,
    Loss,
}

impl Outcome {
    /// Terminal check: a win needs the enemy down and the player standing
    pub fn from_hp(player_hp: i32, enemy_hp: i32) -> Option<Outcome> {
        if player_hp > 0 && enemy_hp > 0 {
            return None;
        }
        if enemy_hp <= 0 && player_hp > 0 {
            Some(Outcome::Win)
        } else {
            Some(Outcome::Loss)
        }
    }

    pub fn score(&self) -> f32 {
        match self {
            Outcome::Win => 1.0,
            Outcome::Loss => 0.0,
        }
    }
}

/// ELO tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Bracket {
    Bronze,
    Silver,
    Gold,
    Platinum,
    Diamond,
    Master,
}

impl Bracket {
    pub fn for_elo(elo: i32) -> Self {
        match elo {
            i32::MIN..=899 => Bracket::Bronze,
            900..=1099 => Bracket::Silver,
            1100..=1299 => Bracket::Gold,
            1300..=1499 => Bracket::Platinum,
            1500..=1699 => Bracket::Diamond,
            _ => Bracket::Master,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Bracket::Bronze => "Bronze",
            Bracket::Silver => "Silver",
            Bracket::Gold => "Gold",
            Bracket::Platinum => "Platinum",
            Bracket::Diamond => "Diamond",
            Bracket::Master => "Master",
        }
    }

    pub fn reward_mul(&self) -> f32 {
        match self {
            Bracket::Bronze => 0.9,
            Bracket::Silver => 1.0,
            Bracket::Gold => 1.15,
            Bracket::Platinum => 1.3,
            Bracket::Diamond => 1.45,
            Bracket::Master => 1.6,
        }
    }

    pub fn enemy_hp_mul(&self) -> f32 {
        match self {
            Bracket::Bronze => 0.95,
            Bracket::Silver => 1.0,
            Bracket::Gold => 1.06,
            Bracket::Platinum => 1.12,
            Bracket::Diamond => 1.18,
            Bracket::Master => 1.25,
        }
    }

    /// Phase of every creature in the AI loadout
    pub fn enemy_phase(&self) -> Phase {
        match self {
            Bracket::Bronze | Bracket::Silver => 2,
            Bracket::Gold | Bracket::Platinum => 3,
            Bracket::Diamond | Bracket::Master => 4,
        }
    }

    pub fn enemy_max_hp(&self) -> i32 {
        round_i32(DEFAULT_MAX_HP as f32 * self.enemy_hp_mul())
    }
}

pub fn expected_score(elo: i32, opponent: i32) -> f32 {
    1.0 / (1.0 + 10f32.powf((opponent - elo) as f32 / 400.0))
}

/// Everything the results screen needs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultPayload {
    pub outcome: Outcome,
    pub coins: u32,
    pub xp: u32,
    pub elo_before: i32,
    pub elo_after: i32,
    pub elo_delta: i32,
}

/// Compute rewards and the new rating. The AI has no rating of its own, so
/// the player is rated against their own pre-match ELO.
pub fn settle(outcome: Outcome, elo_before: i32) -> ResultPayload {
    let expected = expected_score(elo_before, elo_before);
    let elo_delta = round_i32(K_FACTOR * (outcome.score() - expected));
    let elo_after = (elo_before + elo_delta).clamp(ELO_MIN, ELO_MAX);

    let bracket = Bracket::for_elo(elo_before);
    let base = match outcome {
        Outcome::Win => WIN_COINS,
        Outcome::Loss => LOSS_COINS,
    };
    let coins = round_i32(base * bracket.reward_mul()).max(0) as u32;
    let xp = match outcome {
        Outcome::Win => WIN_XP,
        Outcome::Loss => LOSS_XP,
    };

    ResultPayload {
        outcome,
        coins,
        xp,
        elo_before,
        elo_after,
        elo_delta,
    }
}
