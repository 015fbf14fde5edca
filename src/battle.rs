//! Battle orchestrator
//!
//! Owns one match: the simulation state, the board, the fixed-step scheduler
//! and the injected collaborators. Every input handler and every tick goes
//! through `&mut self`, so mutation is serialized by construction.

use std::sync::Arc;

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::consts::{DEFAULT_MAX_HP, SLOTS};
use crate::ports::{CatalogProvider, ProgressionProvider, RewardSink};
use crate::settings::{Settings, SimRate};
use crate::sim::board::{Board, MatchEvent, ResolveResult, swap_and_resolve_free};
use crate::sim::cast::{CastOutcome, Caster, spend_and_cast};
use crate::sim::conclusion::{Bracket, Outcome, settle};
use crate::sim::economy::{
    MatchContext, MatchEffect, apply_matches, cap_for_phase, hold_ms_to_level, level_from_energy,
};
use crate::sim::element::Element;
use crate::sim::scheduler::FixedStep;
use crate::sim::state::{ArenaGeometry, BattleState};
use crate::sim::status::{Side, SideStatus};
use crate::sim::tick::tick;

/// Mixed into the match seed so the board draws from its own stream
const BOARD_SEED_SALT: u64 = 0x9E37_79B9_7F4A_7C15;

/// Optional modifiers for a manual cast
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FireParams {
    /// How long the slot was held; caps the level by hold time
    pub held_ms: Option<f64>,
    /// Explicit level cap
    pub level: Option<u8>,
}

impl FireParams {
    pub fn held(ms: f64) -> Self {
        Self {
            held_ms: Some(ms),
            level: None,
        }
    }

    pub fn at_level(level: u8) -> Self {
        Self {
            held_ms: None,
            level: Some(level),
        }
    }
}

/// Everything a new match starts from
struct MatchSetup {
    state: BattleState,
    board: Board,
    board_rng: Pcg32,
    /// Player rating the match is played at
    elo: i32,
}

fn build_match(
    catalog: &dyn CatalogProvider,
    profile: &dyn ProgressionProvider,
    settings: &Settings,
    seed: u64,
    geometry: ArenaGeometry,
) -> MatchSetup {
    let elo = profile.elo_rating();
    let bracket = Bracket::for_elo(elo);

    let mut state = BattleState::new(seed, profile.max_hp(), bracket.enemy_max_hp(), &settings.ai);
    state.geometry = geometry;
    state.enemy_phase = bracket.enemy_phase();

    let mut ids: Vec<&str> = catalog.ids();
    ids.shuffle(state.rng_mut());
    for (slot, id) in state.enemy_loadout.iter_mut().zip(ids) {
        *slot = Some(id.to_string());
    }

    let mut board_rng = Pcg32::seed_from_u64(seed ^ BOARD_SEED_SALT);
    let board = Board::new(
        settings.board.width,
        settings.board.height,
        settings.board.colors,
        &mut board_rng,
    );

    log::info!(
        "Match start: seed {}, elo {} ({}), enemy {:?} at phase {}",
        seed,
        elo,
        bracket.name(),
        state.enemy_loadout,
        state.enemy_phase
    );
    MatchSetup {
        state,
        board,
        board_rng,
        elo,
    }
}

pub struct Battle<P: ProgressionProvider + RewardSink> {
    catalog: Arc<dyn CatalogProvider>,
    profile: P,
    settings: Settings,
    state: BattleState,
    board: Board,
    board_rng: Pcg32,
    scheduler: FixedStep,
    /// Player rating when the current match started
    elo_at_start: i32,
}

impl<P: ProgressionProvider + RewardSink> Battle<P> {
    pub fn new(catalog: Arc<dyn CatalogProvider>, profile: P, settings: Settings, seed: u64) -> Self {
        let setup = build_match(
            catalog.as_ref(),
            &profile,
            &settings,
            seed,
            ArenaGeometry::default(),
        );
        Self {
            scheduler: FixedStep::new(settings.sim_rate),
            catalog,
            profile,
            settings,
            state: setup.state,
            board: setup.board,
            board_rng: setup.board_rng,
            elo_at_start: setup.elo,
        }
    }

    /// Fresh state, board and AI loadout for `seed`; keeps the UI geometry
    fn setup_match(&mut self, seed: u64) {
        let setup = build_match(
            self.catalog.as_ref(),
            &self.profile,
            &self.settings,
            seed,
            self.state.geometry,
        );
        self.state = setup.state;
        self.board = setup.board;
        self.board_rng = setup.board_rng;
        self.elo_at_start = setup.elo;
    }

    pub fn state(&self) -> &BattleState {
        &self.state
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn profile(&self) -> &P {
        &self.profile
    }

    pub fn profile_mut(&mut self) -> &mut P {
        &mut self.profile
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn is_running(&self) -> bool {
        self.scheduler.is_running()
    }

    pub fn set_sim_rate(&mut self, rate: SimRate) {
        self.settings.sim_rate = rate;
        self.scheduler.set_rate(rate);
    }

    /// Phase of the creature in a player slot, 0 when empty or unowned
    fn slot_phase(&self, slot: usize) -> u8 {
        let loadout = self.profile.selected_loadout();
        loadout
            .get(slot)
            .and_then(|id| id.as_deref())
            .filter(|id| self.catalog.creature(id).is_some())
            .and_then(|id| self.profile.phase(id))
            .unwrap_or(0)
    }

    /// Per-slot energy caps for the player
    pub fn player_caps(&self) -> [f32; SLOTS] {
        std::array::from_fn(|i| cap_for_phase(self.slot_phase(i)))
    }

    // ===== Input surface =====

    /// Feed one resolution pass worth of match events into the economy
    pub fn on_matches(&mut self, events: &[MatchEvent]) {
        if self.state.is_over() {
            return;
        }
        let ctx = MatchContext {
            player_max_hp: self.state.player.max_hp,
            enemy_max_hp: self.state.enemy.max_hp,
            water_affinity: self.profile.affinity(Element::Water),
            caps: self.player_caps(),
        };
        let now = self.state.now_ms;
        for effect in apply_matches(&mut self.state.energy, events, &ctx) {
            match effect {
                MatchEffect::HealPlayer(amount) => {
                    self.state.player.heal(amount as f32, now);
                }
                MatchEffect::DamageEnemy(amount) => {
                    self.state.enemy.apply_damage(amount as f32, now);
                }
            }
        }
    }

    /// Swap two board cells and resolve the cascade, feeding every pass to
    /// the economy. Ignored while paused or after the match ended.
    pub fn swap(&mut self, a: (usize, usize), b: (usize, usize)) -> ResolveResult {
        if self.state.paused || self.state.is_over() {
            return ResolveResult::default();
        }
        let in_bounds = |(x, y): (usize, usize)| x < self.board.w && y < self.board.h;
        if !in_bounds(a) || !in_bounds(b) {
            return ResolveResult::default();
        }
        let mut passes: Vec<Vec<MatchEvent>> = Vec::new();
        let result = swap_and_resolve_free(&mut self.board, a, b, &mut self.board_rng, |events| {
            passes.push(events.to_vec())
        });
        for events in &passes {
            self.on_matches(events);
        }
        result
    }

    /// Manual cast from a player slot. `None` when nothing happened.
    pub fn fire_slot(&mut self, slot: usize, params: FireParams) -> Option<CastOutcome> {
        if self.state.paused || self.state.is_over() || slot >= SLOTS {
            return None;
        }
        let phase = self.slot_phase(slot);
        if phase == 0 {
            return None;
        }
        let id = self.profile.selected_loadout()[slot].clone()?;
        let catalog = Arc::clone(&self.catalog);
        let creature = catalog.creature(&id)?;

        let mut level = level_from_energy(self.state.energy[slot]).min(phase);
        if let Some(held) = params.held_ms {
            level = level.min(hold_ms_to_level(held, &self.settings.charge));
        }
        if let Some(cap) = params.level {
            level = level.min(cap);
        }
        if level == 0 {
            return None;
        }

        let affinity = self.profile.affinity(creature.element);
        let caster = Caster::new(Side::Player, slot, creature, phase, affinity);
        spend_and_cast(&mut self.state, &caster, level)
    }

    pub fn set_impact_lines(&mut self, player_x: f32, enemy_x: f32) {
        self.state.geometry.set_impact_lines(player_x, enemy_x);
    }

    pub fn set_shot_origins(&mut self, player_x: f32, enemy_x: f32) {
        self.state.geometry.set_shot_origins(player_x, enemy_x);
    }

    pub fn set_shot_heights(&mut self, player_y: f32, enemy_y: f32) {
        self.state.geometry.set_shot_heights(player_y, enemy_y);
    }

    /// Reset both sides to full HP with new maxima and clear player energy
    pub fn set_max_hp(&mut self, player_max: i32, enemy_max: i32) {
        let player_max = if player_max > 0 { player_max } else { DEFAULT_MAX_HP };
        let enemy_max = if enemy_max > 0 { enemy_max } else { DEFAULT_MAX_HP };
        self.state.player = SideStatus::new(player_max);
        self.state.enemy = SideStatus::new(enemy_max);
        self.state.energy = [0.0; SLOTS];
    }

    /// Start the loop; `now` is the frame clock in seconds. No-op if running.
    pub fn start(&mut self, now: f64) {
        if self.scheduler.is_running() || self.state.is_over() {
            return;
        }
        self.scheduler.start(now);
    }

    pub fn stop(&mut self) {
        self.scheduler.stop();
    }

    /// Throw the current match away and start a new one
    pub fn reset_match(&mut self, now: f64) {
        self.scheduler.stop();
        let seed = self.state.rng_mut().random::<u64>();
        self.setup_match(seed);
        self.scheduler.start(now);
    }

    pub fn open_pause(&mut self) {
        self.state.paused = true;
    }

    /// Unpause; a concluded match stays paused
    pub fn resume_game(&mut self) {
        if !self.state.is_over() {
            self.state.paused = false;
        }
    }

    /// Per-frame callback: run however many fixed steps the elapsed time
    /// covers. Returns the number of steps run.
    pub fn frame(&mut self, now: f64) -> u32 {
        let steps = self.scheduler.advance(now);
        let dt_ms = self.scheduler.step_ms();
        for i in 0..steps {
            let outcome = tick(
                &mut self.state,
                self.catalog.as_ref(),
                &self.settings,
                self.elo_at_start,
                dt_ms,
            );
            if let Some(outcome) = outcome {
                self.conclude(outcome);
                return i + 1;
            }
        }
        steps
    }

    /// Advance exactly one step regardless of the scheduler
    pub fn step(&mut self) -> Option<Outcome> {
        let dt_ms = self.scheduler.step_ms();
        let outcome = tick(
            &mut self.state,
            self.catalog.as_ref(),
            &self.settings,
            self.elo_at_start,
            dt_ms,
        )?;
        self.conclude(outcome);
        Some(outcome)
    }

    fn conclude(&mut self, outcome: Outcome) {
        if self.state.is_over() {
            return;
        }
        let result = settle(outcome, self.elo_at_start);
        self.profile.grant_coins(result.coins);
        self.profile.set_elo_rating(result.elo_after);
        self.profile.grant_xp(result.xp);

        self.scheduler.stop();
        self.state.paused = true;
        self.state.result = Some(result);
        log::info!(
            "Match over: {:?}, elo {} -> {} ({:+}), +{} coins, +{} xp",
            result.outcome,
            result.elo_before,
            result.elo_after,
            result.elo_delta,
            result.coins,
            result.xp
        );
    }
}
