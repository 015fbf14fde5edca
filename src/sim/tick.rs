//! Fixed timestep simulation tick
//!
//! Advances the battle by exactly one step. Board input and player casts
//! arrive between ticks; everything time-driven happens here.

use super::ai::{AiDecision, AiView};
use super::cast::{Caster, spend_and_cast};
use super::conclusion::Outcome;
use super::projectile::{
    Hit, apply_slow, filter_wall_hits, purge_invalid, resolve_mid_air_collisions,
    step_projectiles,
};
use super::state::BattleState;
use super::status::Side;
use crate::ports::CatalogProvider;
use crate::settings::Settings;

/// Advance the battle state by one fixed timestep.
///
/// `elo` is the player's pre-match rating, which scales AI income. Returns
/// the outcome on the tick either side drops to zero HP.
pub fn tick(
    state: &mut BattleState,
    catalog: &dyn CatalogProvider,
    settings: &Settings,
    elo: i32,
    dt_ms: f64,
) -> Option<Outcome> {
    // Don't tick if paused or over
    if state.paused || state.is_over() {
        return None;
    }

    state.now_ms += dt_ms;
    state.tick += 1;
    let now = state.now_ms;

    // Opponent
    if let Some(decision) = run_ai(state, settings, elo, dt_ms) {
        enemy_cast(state, catalog, settings, decision);
    }

    // Projectiles: slow, collide, wall, move, purge
    let player_slow = state.player.proj_slow_pct(now);
    let enemy_slow = state.enemy.proj_slow_pct(now);
    let mut projectiles = std::mem::take(&mut state.projectiles);
    apply_slow(&mut projectiles, player_slow, enemy_slow);
    let (projectiles, _) = resolve_mid_air_collisions(projectiles);
    let (projectiles, wall_hits) = filter_wall_hits(
        projectiles,
        state.geometry.player_hit_x,
        state.geometry.enemy_hit_x,
    );
    let (projectiles, arrivals) = step_projectiles(projectiles, dt_ms);
    state.projectiles = purge_invalid(projectiles);

    for hit in wall_hits.into_iter().chain(arrivals) {
        apply_hit(state, &hit);
    }

    // Timed effects
    state.player.tick_effects(dt_ms, now);
    state.enemy.tick_effects(dt_ms, now);

    Outcome::from_hp(state.player.hp, state.enemy.hp)
}

fn run_ai(state: &mut BattleState, settings: &Settings, elo: i32, dt_ms: f64) -> Option<AiDecision> {
    if state.enemy_loadout.iter().all(Option::is_none) {
        return None;
    }
    let caps = state.enemy_caps();
    let hp_fraction = state.enemy.hp_fraction();
    let now = state.now_ms;

    let (ai, energy, rng) = state.ai_parts();
    ai.update(
        AiView {
            now,
            dt_ms,
            hp_fraction,
            elo,
            energy,
            caps,
        },
        &settings.ai,
        rng,
    )
}

fn enemy_cast(
    state: &mut BattleState,
    catalog: &dyn CatalogProvider,
    settings: &Settings,
    decision: AiDecision,
) {
    let Some(id) = state.enemy_loadout[decision.slot].clone() else {
        return;
    };
    let Some(creature) = catalog.creature(&id) else {
        log::warn!("AI loadout references unknown creature `{}`", id);
        return;
    };
    let caster = Caster::new(Side::Enemy, decision.slot, creature, state.enemy_phase, 1.0);
    let level = decision.level.min(state.enemy_phase);
    if spend_and_cast(state, &caster, level).is_some() {
        let now = state.now_ms;
        let (ai, _, rng) = state.ai_parts();
        ai.on_cast(decision, now, &settings.ai, rng);
    }
}

fn apply_hit(state: &mut BattleState, hit: &Hit) {
    let now = state.now_ms;
    let report = state.status_mut(hit.target).apply_damage(hit.power as f32, now);
    log::debug!(
        "{} hit {} for {} ({} absorbed)",
        hit.source_creature_id,
        hit.target.as_str(),
        report.dealt,
        report.absorbed
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::sim::ai::AiTuning;
    use crate::sim::projectile::{Launch, Projectile};
    use crate::sim::element::Element;

    const DT: f64 = 1000.0 / 30.0;

    fn state() -> BattleState {
        BattleState::new(9, 1000, 1000, &AiTuning::default())
    }

    fn fire(state: &mut BattleState, side: Side, power: i32) {
        let (from, to) = state.geometry.path_for(side);
        let id = state.next_entity_id();
        state.projectiles.push(Projectile::spawn(
            id,
            Launch {
                owner: side,
                source_creature_id: "test".into(),
                element: Element::Fire,
                power,
                from,
                to,
                sprite: None,
            },
            state.now_ms,
        ));
    }

    #[test]
    fn test_paused_tick_is_noop() {
        let catalog = Catalog::builtin().unwrap();
        let mut s = state();
        s.paused = true;
        fire(&mut s, Side::Player, 10);
        let before = s.projectiles.clone();
        assert_eq!(tick(&mut s, &catalog, &Settings::default(), 1000, DT), None);
        assert_eq!(s.now_ms, 0.0);
        assert_eq!(s.tick, 0);
        assert_eq!(s.projectiles, before);
    }

    #[test]
    fn test_projectile_hits_once() {
        let catalog = Catalog::builtin().unwrap();
        let settings = Settings::default();
        let mut s = state();
        fire(&mut s, Side::Player, 100);
        for _ in 0..60 {
            tick(&mut s, &catalog, &settings, 1000, DT);
        }
        assert!(s.projectiles.is_empty());
        assert_eq!(s.enemy.hp, 900);
    }

    #[test]
    fn test_conclusion_on_lethal_hit() {
        let catalog = Catalog::builtin().unwrap();
        let settings = Settings::default();
        let mut s = state();
        fire(&mut s, Side::Player, 5000);
        let mut outcome = None;
        for _ in 0..60 {
            outcome = tick(&mut s, &catalog, &settings, 1000, DT);
            if outcome.is_some() {
                break;
            }
        }
        assert_eq!(outcome, Some(Outcome::Win));
    }

    #[test]
    fn test_dots_tick_on_sim_clock() {
        let catalog = Catalog::builtin().unwrap();
        let settings = Settings::default();
        let mut s = state();
        s.enemy.add_dot("burn", Element::Fire, 30.0, 990.0);
        for _ in 0..31 {
            tick(&mut s, &catalog, &settings, 1000, DT);
        }
        // 30 ticks of round(30 * 33.3 / 1000) = 1, then expired
        assert_eq!(s.enemy.hp, 970);
        assert!(s.enemy.dots.is_empty());
    }

    #[test]
    fn test_ai_fires_with_loadout() {
        let catalog = Catalog::builtin().unwrap();
        let settings = Settings::default();
        let mut s = state();
        s.enemy_phase = 4;
        s.enemy_loadout = [
            Some("emberling".into()),
            Some("tidepup".into()),
            Some("frostnib".into()),
            Some("venomoth".into()),
        ];
        let mut saw_enemy_projectile = false;
        for _ in 0..(30 * 40) {
            tick(&mut s, &catalog, &settings, 1000, DT);
            saw_enemy_projectile |= s.projectiles.iter().any(|p| p.owner == Side::Enemy);
            if s.is_over() || s.player.hp < 1000 {
                break;
            }
        }
        assert!(saw_enemy_projectile || s.player.hp < 1000);
        for (e, c) in s.enemy_energy.iter().zip(s.enemy_caps()) {
            assert!(*e >= 0.0 && *e <= c);
        }
    }
}
