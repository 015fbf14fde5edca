//! Energy and charge economy
//!
//! Match events feed per-slot energy (capped by the slot creature's phase),
//! heal the player, or chip the enemy directly. Energy buys charge levels.

use serde::{Deserialize, Serialize};

use super::board::MatchEvent;
use crate::catalog::{MAX_PHASE, Phase};
use crate::consts::{BOARD_COLORS, CHARGE_THRESHOLDS, SLOTS};
use crate::round_i32;

/// Hold durations (ms) that reach charge levels 1..4
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChargeTuning {
    pub t1: f64,
    pub t2: f64,
    pub t3: f64,
    pub t4: f64,
}

impl Default for ChargeTuning {
    fn default() -> Self {
        Self {
            t1: 0.0,
            t2: 300.0,
            t3: 650.0,
            t4: 1000.0,
        }
    }
}

/// Charge level reached by holding a slot for `held_ms`
pub fn hold_ms_to_level(held_ms: f64, tuning: &ChargeTuning) -> u8 {
    if held_ms >= tuning.t4 {
        4
    } else if held_ms >= tuning.t3 {
        3
    } else if held_ms >= tuning.t2 {
        2
    } else {
        1
    }
}

/// Slot fed by a gem, `None` for the heal and damage gems
pub fn gem_slot(gem: u8) -> Option<usize> {
    match gem % BOARD_COLORS {
        0 => Some(1),
        2 => Some(3),
        4 => Some(0),
        5 => Some(2),
        _ => None,
    }
}

pub const HEAL_GEM: u8 = 1;
pub const DAMAGE_GEM: u8 = 3;

/// Energy gained for a run of `count` gems
pub fn gain_for(count: usize) -> f32 {
    let count = count.max(3);
    6.0 + ((count - 3) * 4).min(12) as f32
}

/// Energy required to cast at `level` (1..=4)
pub fn threshold(level: u8) -> f32 {
    match level {
        1..=4 => CHARGE_THRESHOLDS[(level - 1) as usize],
        _ => 0.0,
    }
}

/// Energy cap for a slot whose creature is at `phase` (0 = empty slot)
pub fn cap_for_phase(phase: Phase) -> f32 {
    match phase {
        0 => 0.0,
        p => CHARGE_THRESHOLDS[(p.min(MAX_PHASE) - 1) as usize],
    }
}

/// Highest charge level the energy pays for, 0 when below level 1
pub fn level_from_energy(energy: f32) -> u8 {
    CHARGE_THRESHOLDS
        .iter()
        .rposition(|&t| energy >= t)
        .map_or(0, |i| i as u8 + 1)
}

/// Player-side numbers a match batch needs
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchContext {
    pub player_max_hp: i32,
    pub enemy_max_hp: i32,
    pub water_affinity: f32,
    /// Per-slot energy cap
    pub caps: [f32; SLOTS],
}

/// Side effect of a match batch beyond energy
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MatchEffect {
    HealPlayer(i32),
    DamageEnemy(i32),
}

fn heal_amount(max_hp: i32, count: usize, water_affinity: f32) -> i32 {
    let pct = (0.02 + 0.01 * (count - 3) as f32).clamp(0.01, 0.05);
    let amt = round_i32(max_hp as f32 * pct);
    if amt <= 0 {
        return 0;
    }
    round_i32(amt as f32 * water_affinity)
}

fn damage_amount(max_hp: i32, count: usize) -> i32 {
    let pct = (0.015 + 0.01 * (count - 3) as f32).clamp(0.01, 0.04);
    round_i32(max_hp as f32 * pct)
}

/// Credit energy for a batch of match events and collect heal/damage effects.
///
/// Every slot ends the batch clamped to `[0, cap]`.
pub fn apply_matches(
    energy: &mut [f32; SLOTS],
    events: &[MatchEvent],
    ctx: &MatchContext,
) -> Vec<MatchEffect> {
    let mut effects = Vec::new();
    for ev in events {
        let gem = ev.gem % BOARD_COLORS;
        let count = ev.count.max(3);
        match gem {
            HEAL_GEM => {
                let amt = heal_amount(ctx.player_max_hp, count, ctx.water_affinity);
                if amt > 0 {
                    effects.push(MatchEffect::HealPlayer(amt));
                }
            }
            DAMAGE_GEM => {
                let amt = damage_amount(ctx.enemy_max_hp, count);
                if amt > 0 {
                    effects.push(MatchEffect::DamageEnemy(amt));
                }
            }
            _ => {
                if let Some(slot) = gem_slot(gem) {
                    energy[slot] = (energy[slot] + gain_for(count)).clamp(0.0, ctx.caps[slot]);
                }
            }
        }
    }
    reclamp(energy, &ctx.caps);
    effects
}

/// Clamp every slot into `[0, cap]`
pub fn reclamp(energy: &mut [f32; SLOTS], caps: &[f32; SLOTS]) {
    for (e, cap) in energy.iter_mut().zip(caps) {
        *e = if e.is_finite() { e.clamp(0.0, *cap) } else { 0.0 };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn ctx(caps: [f32; SLOTS]) -> MatchContext {
        MatchContext {
            player_max_hp: 1000,
            enemy_max_hp: 1000,
            water_affinity: 1.0,
            caps,
        }
    }

    #[test]
    fn test_hold_levels() {
        let t = ChargeTuning::default();
        assert_eq!(hold_ms_to_level(0.0, &t), 1);
        assert_eq!(hold_ms_to_level(299.0, &t), 1);
        assert_eq!(hold_ms_to_level(300.0, &t), 2);
        assert_eq!(hold_ms_to_level(700.0, &t), 3);
        assert_eq!(hold_ms_to_level(5000.0, &t), 4);
        assert_eq!(hold_ms_to_level(f64::NAN, &t), 1);
    }

    #[test]
    fn test_levels_and_caps() {
        assert_eq!(level_from_energy(9.9), 0);
        assert_eq!(level_from_energy(10.0), 1);
        assert_eq!(level_from_energy(29.0), 2);
        assert_eq!(level_from_energy(45.0), 4);
        assert_eq!(cap_for_phase(0), 0.0);
        assert_eq!(cap_for_phase(2), 20.0);
        assert_eq!(cap_for_phase(9), 45.0);
        assert_eq!(threshold(3), 30.0);
    }

    #[test]
    fn test_gains() {
        assert_eq!(gain_for(3), 6.0);
        assert_eq!(gain_for(4), 10.0);
        assert_eq!(gain_for(5), 14.0);
        assert_eq!(gain_for(9), 18.0);
        assert_eq!(gain_for(1), 6.0);
    }

    #[test]
    fn test_gem_mapping() {
        let mut energy = [0.0; SLOTS];
        let events = [
            MatchEvent { gem: 4, count: 3 },
            MatchEvent { gem: 0, count: 4 },
            MatchEvent { gem: 5, count: 3 },
            MatchEvent { gem: 2, count: 5 },
        ];
        let fx = apply_matches(&mut energy, &events, &ctx([45.0; SLOTS]));
        assert!(fx.is_empty());
        assert_eq!(energy, [6.0, 10.0, 6.0, 14.0]);
    }

    #[test]
    fn test_heal_and_damage_gems() {
        let mut energy = [0.0; SLOTS];
        let events = [
            MatchEvent { gem: 1, count: 3 },
            MatchEvent { gem: 3, count: 4 },
            MatchEvent { gem: 7, count: 9 },
        ];
        let mut c = ctx([45.0; SLOTS]);
        c.water_affinity = 1.5;
        let fx = apply_matches(&mut energy, &events, &c);
        assert_eq!(
            fx,
            vec![
                MatchEffect::HealPlayer(30),
                MatchEffect::DamageEnemy(25),
                // gem 7 wraps to 1, count 9 caps at 5%
                MatchEffect::HealPlayer(75),
            ]
        );
        assert_eq!(energy, [0.0; SLOTS]);
    }

    #[test]
    fn test_empty_slot_stays_empty() {
        let mut energy = [5.0, 5.0, 5.0, 50.0];
        apply_matches(
            &mut energy,
            &[MatchEvent { gem: 4, count: 5 }],
            &ctx([0.0, 10.0, 20.0, 45.0]),
        );
        assert_eq!(energy, [0.0, 5.0, 5.0, 45.0]);
    }

    proptest! {
        #[test]
        fn prop_energy_stays_within_caps(
            gems in proptest::collection::vec((0u8..12, 0usize..9), 0..40),
            phases in proptest::array::uniform4(0u8..5),
        ) {
            let caps = phases.map(cap_for_phase);
            let mut energy = [0.0; SLOTS];
            for chunk in gems.chunks(3) {
                let events: Vec<MatchEvent> = chunk
                    .iter()
                    .map(|&(gem, count)| MatchEvent { gem, count })
                    .collect();
                apply_matches(&mut energy, &events, &ctx(caps));
                for (e, cap) in energy.iter().zip(&caps) {
                    prop_assert!(*e >= 0.0 && *e <= *cap);
                }
            }
        }
    }
}
