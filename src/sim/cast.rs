//! Cast resolution
//!
//! Spends a slot's energy and turns the creature in it into combat effects.
//! Shield-bearers shield, healers heal their own side, everything else
//! applies its abilities to the opponent and fires a projectile.

use serde::{Deserialize, Serialize};

use super::ability::{ParsedAbility, StackingRule};
use super::economy::{cap_for_phase, threshold};
use super::element::Element;
use super::projectile::{Launch, Projectile};
use super::state::BattleState;
use super::status::{DotStacking, Side};
use crate::catalog::{CreatureDefinition, Phase};
use crate::consts::{AFFINITY_MAX, AFFINITY_MIN, ANTI_HEAL_DURATION_MS, SLOTS, WET_BONUS};
use crate::round_i32;

/// Share of a DoT's total that the direct hit represents
const DOT_BURST_SHARE: f32 = 0.7;

/// Who is casting and with what
#[derive(Debug, Clone, Copy)]
pub struct Caster<'a> {
    pub side: Side,
    pub slot: usize,
    pub creature: &'a CreatureDefinition,
    pub phase: Phase,
    /// Outgoing multiplier for the creature's element
    pub affinity: f32,
}

impl<'a> Caster<'a> {
    pub fn new(
        side: Side,
        slot: usize,
        creature: &'a CreatureDefinition,
        phase: Phase,
        affinity: f32,
    ) -> Self {
        let affinity = if affinity.is_finite() {
            affinity.clamp(AFFINITY_MIN, AFFINITY_MAX)
        } else {
            1.0
        };
        Self {
            side,
            slot,
            creature,
            phase,
            affinity,
        }
    }
}

/// What a cast did
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum CastEffect {
    Shield { hp: i32 },
    Heal { healed: i32, regens: u32, cleansed: u32 },
    Projectile { id: u32, power: i32 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CastOutcome {
    pub side: Side,
    pub slot: usize,
    pub creature_id: String,
    pub level: u8,
    pub spent: f32,
    pub effect: CastEffect,
}

/// Deduct the level's threshold and resolve. `None` when the level is 0 or
/// the slot cannot pay for it.
pub fn spend_and_cast(state: &mut BattleState, caster: &Caster, level: u8) -> Option<CastOutcome> {
    if level == 0 || caster.slot >= SLOTS {
        return None;
    }
    let cost = threshold(level);
    let cap = cap_for_phase(caster.phase);
    let energy = state.energy_mut(caster.side);
    if energy[caster.slot] < cost {
        return None;
    }
    energy[caster.slot] = (energy[caster.slot] - cost).clamp(0.0, cap);

    let effect = resolve(state, caster, level);
    log::debug!(
        "{} cast {} (slot {}) at level {}: {:?}",
        caster.side.as_str(),
        caster.creature.id,
        caster.slot,
        level,
        effect
    );
    Some(CastOutcome {
        side: caster.side,
        slot: caster.slot,
        creature_id: caster.creature.id.clone(),
        level,
        spent: cost,
        effect,
    })
}

/// Apply the creature's effects for a paid cast
pub fn resolve(state: &mut BattleState, caster: &Caster, level: u8) -> CastEffect {
    let def = caster.creature;
    if let Some(shield) = def.shield {
        let hp = (shield.base_hp + shield.growth_hp * (caster.phase.max(1) - 1) as f32)
            * caster.affinity;
        let now = state.now_ms;
        let status = state.status_mut(caster.side);
        status.apply_shield(round_i32(hp) as f32, shield.duration_ms, now);
        return CastEffect::Shield { hp: round_i32(hp) };
    }
    if def.is_healer() {
        return cast_heal(state, caster);
    }
    cast_offensive(state, caster, level)
}

fn cast_heal(state: &mut BattleState, caster: &Caster) -> CastEffect {
    let now = state.now_ms;
    let status = state.status_mut(caster.side);
    let max = status.max_hp as f32;
    let mut instant = 0;
    let mut regens = 0;
    let mut cleansed = 0;
    for ability in &caster.creature.abilities {
        match ability {
            ParsedAbility::HealInstant { pct_max } => {
                instant += round_i32(max * pct_max * caster.affinity);
            }
            ParsedAbility::Regen {
                seconds,
                pct_per_sec,
            } => {
                status.add_regen(max * pct_per_sec * caster.affinity, *seconds as f64 * 1000.0);
                regens += 1;
            }
            ParsedAbility::Cleanse { count } => {
                cleansed += status.cleanse(*count);
            }
            _ => {}
        }
    }
    let healed = if instant > 0 {
        status.heal(instant as f32, now)
    } else {
        0
    };
    CastEffect::Heal {
        healed,
        regens,
        cleansed,
    }
}

/// Drain up to `amount` energy, one point at a time round-robin over all
/// slots (the casting one included), then credit `amount` to `slot` up to
/// `cap`.
pub fn leech_energy(energy: &mut [f32; SLOTS], slot: usize, amount: u32, cap: f32) {
    let mut left = amount;
    for _ in 0..amount {
        let mut drained = false;
        for e in energy.iter_mut() {
            if left == 0 {
                break;
            }
            if *e > 0.0 {
                *e = (*e - 1.0).max(0.0);
                left -= 1;
                drained = true;
            }
        }
        if left == 0 || !drained {
            break;
        }
    }
    energy[slot] = (energy[slot] + amount as f32).clamp(0.0, cap);
}

fn cast_offensive(state: &mut BattleState, caster: &Caster, level: u8) -> CastEffect {
    let def = caster.creature;
    let now = state.now_ms;
    let target = caster.side.opposite();
    let base_direct = def.cast_damage(level, caster.phase);

    for ability in &def.abilities {
        match ability {
            ParsedAbility::Dot {
                tag,
                seconds,
                max_stacks,
                stacking,
            } => {
                let seconds = seconds.max(0.1);
                let total = round_i32(base_direct / DOT_BURST_SHARE).max(1) as f32;
                let dps = total / seconds * caster.affinity;
                let authored = DotStacking {
                    can_stack: *stacking == StackingRule::Stack,
                    max_stacks: *max_stacks,
                };
                state.status_mut(target).add_dot_with(
                    tag,
                    def.element,
                    dps,
                    seconds as f64 * 1000.0,
                    authored,
                );
            }
            ParsedAbility::Wet { seconds } => {
                state
                    .status_mut(target)
                    .set_wet(*seconds as f64 * 1000.0, now);
            }
            ParsedAbility::SlowProjectiles { pct, seconds } => {
                state
                    .status_mut(target)
                    .set_proj_slow(*pct, *seconds as f64 * 1000.0, now);
            }
            ParsedAbility::AntiHeal { pct } => {
                state
                    .status_mut(target)
                    .set_anti_heal(*pct, ANTI_HEAL_DURATION_MS, now);
            }
            ParsedAbility::AntiShield { pct } => {
                state.status_mut(target).set_anti_shield(*pct);
            }
            ParsedAbility::LeechEnergy { amount } => {
                let cap = cap_for_phase(caster.phase);
                leech_energy(state.energy_mut(caster.side), caster.slot, *amount, cap);
            }
            ParsedAbility::HealInstant { .. }
            | ParsedAbility::Regen { .. }
            | ParsedAbility::Cleanse { .. } => {}
        }
    }

    let mut power = round_i32(base_direct);
    if def.element == Element::Water && state.status(target).is_wet(now) {
        power = round_i32(power as f32 * WET_BONUS);
    }

    let (from, to) = state.geometry.path_for(caster.side);
    let id = state.next_entity_id();
    let projectile = Projectile::spawn(
        id,
        Launch {
            owner: caster.side,
            source_creature_id: def.id.clone(),
            element: def.element,
            power,
            from,
            to,
            sprite: def.sprite.clone(),
        },
        now,
    );
    let power = projectile.power;
    state.projectiles.push(projectile);
    CastEffect::Projectile { id, power }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::sim::ai::AiTuning;

    fn state() -> BattleState {
        BattleState::new(3, 1000, 1000, &AiTuning::default())
    }

    #[test]
    fn test_leech_round_robin() {
        let mut e = [3.0, 0.0, 1.0, 5.0];
        leech_energy(&mut e, 1, 4, 20.0);
        // round 1 takes from 0, 2, 3; round 2 from 0
        assert_eq!(e, [1.0, 4.0, 0.0, 4.0]);
    }

    #[test]
    fn test_leech_drains_the_casting_slot_too() {
        // A lone charged caster pays for its own credit
        let mut e = [0.0, 0.0, 5.0, 0.0];
        leech_energy(&mut e, 2, 4, 45.0);
        assert_eq!(e, [0.0, 0.0, 5.0, 0.0]);

        let mut e = [0.0, 8.0, 0.0, 0.0];
        leech_energy(&mut e, 1, 4, 10.0);
        assert_eq!(e, [0.0, 8.0, 0.0, 0.0]);
    }

    #[test]
    fn test_leech_clamps_to_cap() {
        let mut e = [9.0, 9.0, 0.0, 0.0];
        leech_energy(&mut e, 1, 2, 10.0);
        // one point from each, then +2 capped at 10
        assert_eq!(e, [8.0, 10.0, 0.0, 0.0]);
    }

    #[test]
    fn test_spend_requires_energy() {
        let catalog = Catalog::builtin().unwrap();
        let ember = catalog.get("emberling").unwrap();
        let mut s = state();
        s.energy[0] = 9.0;
        let caster = Caster::new(Side::Player, 0, ember, 2, 1.0);
        assert!(spend_and_cast(&mut s, &caster, 1).is_none());
        assert!(spend_and_cast(&mut s, &caster, 0).is_none());
        assert_eq!(s.energy[0], 9.0);
    }

    #[test]
    fn test_offensive_cast_applies_dot_and_fires() {
        let catalog = Catalog::builtin().unwrap();
        let ember = catalog.get("emberling").unwrap();
        let mut s = state();
        s.energy[0] = 15.0;
        let caster = Caster::new(Side::Player, 0, ember, 2, 1.0);
        let out = spend_and_cast(&mut s, &caster, 1).unwrap();
        assert_eq!(s.energy[0], 5.0);
        assert_eq!(out.spent, 10.0);
        let power = round_i32(ember.cast_damage(1, 2));
        assert!(matches!(out.effect, CastEffect::Projectile { power: p, .. } if p == power));
        assert_eq!(s.projectiles.len(), 1);
        assert_eq!(s.projectiles[0].owner, Side::Player);
        assert_eq!(s.enemy.dots.len(), 1);
        assert!(s.player.dots.is_empty());
    }

    #[test]
    fn test_authored_dot_stacks_on_earth() {
        let catalog = Catalog::from_json_str(
            r#"[{"id": "quake", "element": "earth", "rarity": "common",
                 "abilities": ["dot:tremor,4s,stack3"], "chargeDamage": {"1": 40}}]"#,
        )
        .unwrap();
        let quake = catalog.get("quake").unwrap();
        let mut s = state();
        let caster = Caster::new(Side::Player, 0, quake, 1, 1.0);
        for _ in 0..3 {
            s.energy[0] = 10.0;
            assert!(spend_and_cast(&mut s, &caster, 1).is_some());
        }
        assert_eq!(s.enemy.dots.len(), 1);
        assert_eq!(s.enemy.dots[0].stacks, 3);
        assert_eq!(s.enemy.dots[0].max_stacks, 3);
    }

    #[test]
    fn test_shield_cast() {
        let catalog = Catalog::builtin().unwrap();
        let guard = catalog.get("pebbleback").unwrap();
        let spec = guard.shield.unwrap();
        let mut s = state();
        s.energy[2] = 20.0;
        let caster = Caster::new(Side::Player, 2, guard, 3, 1.5);
        let out = spend_and_cast(&mut s, &caster, 2).unwrap();
        let expected = round_i32((spec.base_hp + spec.growth_hp * 2.0) * 1.5);
        assert_eq!(out.effect, CastEffect::Shield { hp: expected });
        assert_eq!(s.player.shield_hp, expected);
        assert!(s.projectiles.is_empty());
    }

    #[test]
    fn test_healer_self_cleanses() {
        let catalog = Catalog::builtin().unwrap();
        let dew = catalog.get("dewdrop").unwrap();
        let mut s = state();
        s.player.apply_damage(300.0, 0.0);
        s.player.add_dot("burn", Element::Fire, 10.0, 4000.0);
        s.enemy.add_dot("venom", Element::Poison, 10.0, 4000.0);
        s.energy[0] = 10.0;
        let caster = Caster::new(Side::Enemy, 0, dew, 1, 1.0);
        // casting from the enemy side touches only the enemy
        s.enemy_energy[0] = 10.0;
        let out = spend_and_cast(&mut s, &caster, 1).unwrap();
        match out.effect {
            CastEffect::Heal { cleansed, .. } => assert_eq!(cleansed, 1),
            other => panic!("unexpected {:?}", other),
        }
        assert!(s.enemy.dots.is_empty());
        assert_eq!(s.player.dots.len(), 1);
        assert_eq!(s.energy[0], 10.0);
        assert!(!s.enemy.regens.is_empty());
    }

    #[test]
    fn test_wet_water_bonus() {
        let catalog = Catalog::builtin().unwrap();
        let tide = catalog.get("tidepup").unwrap();
        let ember = catalog.get("emberling").unwrap();
        let mut s = state();
        s.energy = [10.0, 10.0, 0.0, 0.0];

        // abilities land before the hit, so the soaking cast is already boosted
        let first = spend_and_cast(&mut s, &Caster::new(Side::Player, 0, tide, 1, 1.0), 1).unwrap();
        let base = round_i32(tide.cast_damage(1, 1));
        assert_eq!(
            first.effect,
            CastEffect::Projectile {
                id: 1,
                power: round_i32(base as f32 * WET_BONUS)
            }
        );
        assert!(s.enemy.is_wet(s.now_ms));

        // only water benefits
        let second = spend_and_cast(&mut s, &Caster::new(Side::Player, 1, ember, 1, 1.0), 1).unwrap();
        assert_eq!(
            second.effect,
            CastEffect::Projectile {
                id: 2,
                power: round_i32(ember.cast_damage(1, 1))
            }
        );
    }

    #[test]
    fn test_affinity_clamped() {
        let catalog = Catalog::builtin().unwrap();
        let ember = catalog.get("emberling").unwrap();
        assert_eq!(Caster::new(Side::Player, 0, ember, 1, 9.0).affinity, AFFINITY_MAX);
        assert_eq!(Caster::new(Side::Player, 0, ember, 1, f32::NAN).affinity, 1.0);
    }
}
