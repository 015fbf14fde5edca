//! Battle state
//!
//! The aggregate root for one match. Everything a renderer needs to draw a
//! frame lives here and serializes as-is.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::Serialize;

use super::ai::{AiTuning, EnemyAi};
use super::conclusion::ResultPayload;
use super::economy::cap_for_phase;
use super::projectile::Projectile;
use super::status::{Side, SideStatus};
use crate::catalog::Phase;
use crate::consts::*;

/// Shot origins and impact lines, in arena pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ArenaGeometry {
    /// Enemy projectiles hit the player when they reach this x
    pub player_hit_x: f32,
    /// Player projectiles hit the enemy when they reach this x
    pub enemy_hit_x: f32,
    pub player_shot: Vec2,
    pub enemy_shot: Vec2,
}

impl Default for ArenaGeometry {
    fn default() -> Self {
        Self {
            player_hit_x: IMPACT_INSET,
            enemy_hit_x: ARENA_WIDTH - IMPACT_INSET,
            player_shot: Vec2::new(SHOT_INSET, (ARENA_HEIGHT * 0.75).round()),
            enemy_shot: Vec2::new(ARENA_WIDTH - SHOT_INSET, (ARENA_HEIGHT * 0.25).round()),
        }
    }
}

impl ArenaGeometry {
    pub fn set_impact_lines(&mut self, player_x: f32, enemy_x: f32) {
        if player_x.is_finite() {
            self.player_hit_x = player_x;
        }
        if enemy_x.is_finite() {
            self.enemy_hit_x = enemy_x;
        }
    }

    /// Non-finite values fall back to the defaults
    pub fn set_shot_origins(&mut self, player_x: f32, enemy_x: f32) {
        self.player_shot.x = if player_x.is_finite() { player_x } else { SHOT_INSET };
        self.enemy_shot.x = if enemy_x.is_finite() {
            enemy_x
        } else {
            ARENA_WIDTH - SHOT_INSET
        };
    }

    /// Non-finite values fall back to mid-height
    pub fn set_shot_heights(&mut self, player_y: f32, enemy_y: f32) {
        let mid = (ARENA_HEIGHT * 0.5).round();
        self.player_shot.y = if player_y.is_finite() { player_y } else { mid };
        self.enemy_shot.y = if enemy_y.is_finite() { enemy_y } else { mid };
    }

    /// Launch point and aim point for a projectile fired by `side`
    pub fn path_for(&self, side: Side) -> (Vec2, Vec2) {
        match side {
            Side::Player => (
                self.player_shot,
                Vec2::new(self.enemy_hit_x, self.enemy_shot.y),
            ),
            Side::Enemy => (
                self.enemy_shot,
                Vec2::new(self.player_hit_x, self.player_shot.y),
            ),
        }
    }
}

/// Complete battle state (deterministic, serializable for presentation)
#[derive(Debug, Clone, Serialize)]
pub struct BattleState {
    /// Match seed for reproducibility
    pub seed: u64,
    pub player: SideStatus,
    pub enemy: SideStatus,
    pub energy: [f32; SLOTS],
    pub enemy_energy: [f32; SLOTS],
    /// Live projectiles, in spawn order
    pub projectiles: Vec<Projectile>,
    pub geometry: ArenaGeometry,
    pub paused: bool,
    pub result: Option<ResultPayload>,
    /// Simulation clock in milliseconds
    pub now_ms: f64,
    /// Simulation tick counter
    pub tick: u64,
    pub enemy_loadout: [Option<String>; SLOTS],
    pub enemy_phase: Phase,
    pub ai: EnemyAi,
    #[serde(skip)]
    rng: Pcg32,
    /// Next entity ID
    next_id: u32,
}

impl BattleState {
    /// Fresh match state with both sides at full HP
    pub fn new(seed: u64, player_max_hp: i32, enemy_max_hp: i32, tuning: &AiTuning) -> Self {
        let mut rng = Pcg32::seed_from_u64(seed);
        let ai = EnemyAi::new(0.0, tuning, &mut rng);
        Self {
            seed,
            player: SideStatus::new(player_max_hp),
            enemy: SideStatus::new(enemy_max_hp),
            energy: [0.0; SLOTS],
            enemy_energy: [0.0; SLOTS],
            projectiles: Vec::new(),
            geometry: ArenaGeometry::default(),
            paused: false,
            result: None,
            now_ms: 0.0,
            tick: 0,
            enemy_loadout: Default::default(),
            enemy_phase: 1,
            ai,
            rng,
            next_id: 1,
        }
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn rng_mut(&mut self) -> &mut Pcg32 {
        &mut self.rng
    }

    /// The AI, its energy and the rng, borrowed together
    pub fn ai_parts(&mut self) -> (&mut EnemyAi, &mut [f32; SLOTS], &mut Pcg32) {
        (&mut self.ai, &mut self.enemy_energy, &mut self.rng)
    }

    pub fn status(&self, side: Side) -> &SideStatus {
        match side {
            Side::Player => &self.player,
            Side::Enemy => &self.enemy,
        }
    }

    pub fn status_mut(&mut self, side: Side) -> &mut SideStatus {
        match side {
            Side::Player => &mut self.player,
            Side::Enemy => &mut self.enemy,
        }
    }

    pub fn energy(&self, side: Side) -> &[f32; SLOTS] {
        match side {
            Side::Player => &self.energy,
            Side::Enemy => &self.enemy_energy,
        }
    }

    pub fn energy_mut(&mut self, side: Side) -> &mut [f32; SLOTS] {
        match side {
            Side::Player => &mut self.energy,
            Side::Enemy => &mut self.enemy_energy,
        }
    }

    pub fn hp_fraction(&self, side: Side) -> f32 {
        self.status(side).hp_fraction()
    }

    pub fn is_over(&self) -> bool {
        self.result.is_some()
    }

    /// Energy caps of the AI slots (0 for an empty slot)
    pub fn enemy_caps(&self) -> [f32; SLOTS] {
        let phase = self.enemy_phase;
        std::array::from_fn(|i| {
            if self.enemy_loadout[i].is_some() {
                cap_for_phase(phase)
            } else {
                0.0
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state() {
        let state = BattleState::new(42, 1100, 950, &AiTuning::default());
        assert_eq!(state.player.hp, 1100);
        assert_eq!(state.enemy.max_hp, 950);
        assert_eq!(state.hp_fraction(Side::Enemy), 1.0);
        assert!(!state.is_over());
        assert_eq!(state.enemy_caps(), [0.0; SLOTS]);
    }

    #[test]
    fn test_entity_ids() {
        let mut state = BattleState::new(1, 1000, 1000, &AiTuning::default());
        assert_eq!(state.next_entity_id(), 1);
        assert_eq!(state.next_entity_id(), 2);
    }

    #[test]
    fn test_geometry_fallbacks() {
        let mut g = ArenaGeometry::default();
        g.set_shot_origins(f32::NAN, 300.0);
        assert_eq!(g.player_shot.x, SHOT_INSET);
        assert_eq!(g.enemy_shot.x, 300.0);
        g.set_shot_heights(100.0, f32::INFINITY);
        assert_eq!(g.player_shot.y, 100.0);
        assert_eq!(g.enemy_shot.y, 380.0);
        g.set_impact_lines(f32::NAN, 350.0);
        assert_eq!(g.player_hit_x, IMPACT_INSET);
        assert_eq!(g.enemy_hit_x, 350.0);

        let (from, to) = g.path_for(Side::Enemy);
        assert_eq!(from, g.enemy_shot);
        assert_eq!(to, Vec2::new(IMPACT_INSET, 100.0));
    }

    #[test]
    fn test_enemy_caps_follow_loadout() {
        let mut state = BattleState::new(1, 1000, 1000, &AiTuning::default());
        state.enemy_phase = 3;
        state.enemy_loadout[1] = Some("tidepup".into());
        assert_eq!(state.enemy_caps(), [0.0, 30.0, 0.0, 0.0]);
    }
}
