//! Opponent AI
//!
//! A small mode machine on a random timer, continuous energy accrual into a
//! rotating focus slot, and a set of gates (reaction delay, global cast
//! interval, per-slot cooldown, random energy buffer, mode roll) in front of
//! every cast. Casts go through the same pipeline as the player's.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::economy::{level_from_energy, threshold};
use crate::consts::{ELO_DEFAULT, SLOTS};

/// Inclusive random range
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Span {
    pub min: f64,
    pub max: f64,
}

impl Span {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        if self.max > self.min {
            rng.random_range(self.min..=self.max)
        } else {
            self.min
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AiTuning {
    /// Energy per second before ELO scaling
    pub base_rate: f32,
    /// Share of accrual that goes to the focus slot
    pub focus_share: f32,
    pub jitter: Span,
    pub elo_mul_min: f32,
    pub elo_mul_max: f32,
    pub mode_secs: Span,
    pub focus_secs: Span,
    pub reaction_ms: Span,
    pub min_cast_interval_ms: f64,
    pub followup_chance: f64,
    pub followup_ms: Span,
    pub cooldown_base_ms: f64,
    /// Extra cooldown at level 4 over level 1
    pub cooldown_extra_ms: f64,
    pub energy_buffer_max: f32,
    /// HP fraction below which the AI panics
    pub panic_hp: f32,
}

impl Default for AiTuning {
    fn default() -> Self {
        Self {
            base_rate: 7.5,
            focus_share: 0.7,
            jitter: Span::new(0.8, 1.2),
            elo_mul_min: 0.85,
            elo_mul_max: 1.30,
            mode_secs: Span::new(2.2, 4.6),
            focus_secs: Span::new(2.2, 4.0),
            reaction_ms: Span::new(300.0, 700.0),
            min_cast_interval_ms: 950.0,
            followup_chance: 0.35,
            followup_ms: Span::new(700.0, 850.0),
            cooldown_base_ms: 800.0,
            cooldown_extra_ms: 1100.0,
            energy_buffer_max: 3.0,
            panic_hp: 0.25,
        }
    }
}

impl AiTuning {
    /// Accrual multiplier from the player's rating
    pub fn elo_multiplier(&self, elo: i32) -> f32 {
        let raw = 1.0 + (elo - ELO_DEFAULT) as f32 / 1000.0;
        raw.clamp(self.elo_mul_min, self.elo_mul_max)
    }

    /// Per-slot cooldown after casting at `level`
    pub fn cooldown_ms(&self, level: u8) -> f64 {
        let steps = level.clamp(1, 4) as f64 - 1.0;
        self.cooldown_base_ms + steps * self.cooldown_extra_ms / 3.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AiMode {
    BuildUp,
    Poke,
    Burst,
    Panic,
}

impl AiMode {
    pub const CALM: [AiMode; 3] = [AiMode::BuildUp, AiMode::Poke, AiMode::Burst];

    /// Chance to accept a cast at charge level 1..4
    pub fn fire_chance(&self, level: u8) -> f64 {
        let table = match self {
            AiMode::BuildUp => [0.0, 0.05, 0.25, 1.0],
            AiMode::Poke => [0.7, 0.6, 0.3, 0.5],
            AiMode::Burst => [0.0, 0.15, 1.0, 1.0],
            AiMode::Panic => [0.3, 0.85, 0.9, 0.95],
        };
        match level {
            1..=4 => table[(level - 1) as usize],
            _ => 0.0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AiMode::BuildUp => "build-up",
            AiMode::Poke => "poke",
            AiMode::Burst => "burst",
            AiMode::Panic => "panic",
        }
    }
}

/// A cast the AI has committed to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AiDecision {
    pub slot: usize,
    pub level: u8,
}

/// Inputs the AI reads each tick
#[derive(Debug)]
pub struct AiView<'a> {
    pub now: f64,
    pub dt_ms: f64,
    /// Own HP fraction
    pub hp_fraction: f32,
    /// Player rating, scales accrual
    pub elo: i32,
    pub energy: &'a mut [f32; SLOTS],
    pub caps: [f32; SLOTS],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnemyAi {
    pub mode: AiMode,
    pub mode_until: f64,
    pub focus_slot: usize,
    pub focus_until: f64,
    pub next_decision_at: f64,
    pub last_cast_at: Option<f64>,
    pub min_interval_ms: f64,
    pub slot_ready_at: [f64; SLOTS],
}

fn occupied(caps: &[f32; SLOTS]) -> Vec<usize> {
    (0..SLOTS).filter(|&i| caps[i] > 0.0).collect()
}

impl EnemyAi {
    pub fn new<R: Rng + ?Sized>(now: f64, tuning: &AiTuning, rng: &mut R) -> Self {
        Self {
            mode: AiMode::BuildUp,
            mode_until: now + tuning.mode_secs.sample(rng) * 1000.0,
            focus_slot: 0,
            focus_until: now,
            next_decision_at: now + tuning.reaction_ms.sample(rng),
            last_cast_at: None,
            min_interval_ms: tuning.min_cast_interval_ms,
            slot_ready_at: [now; SLOTS],
        }
    }

    fn set_mode<R: Rng + ?Sized>(&mut self, mode: AiMode, now: f64, tuning: &AiTuning, rng: &mut R) {
        if mode != self.mode {
            log::info!("AI mode {} -> {}", self.mode.as_str(), mode.as_str());
        }
        self.mode = mode;
        self.mode_until = now + tuning.mode_secs.sample(rng) * 1000.0;
    }

    /// Forced panic at low HP, otherwise re-roll the mode when its timer runs out
    pub fn update_mode<R: Rng + ?Sized>(
        &mut self,
        hp_fraction: f32,
        now: f64,
        tuning: &AiTuning,
        rng: &mut R,
    ) {
        let low = hp_fraction < tuning.panic_hp;
        if low && self.mode != AiMode::Panic {
            self.set_mode(AiMode::Panic, now, tuning, rng);
            return;
        }
        if now >= self.mode_until {
            let next = if low {
                AiMode::Panic
            } else {
                AiMode::CALM[rng.random_range(0..AiMode::CALM.len())]
            };
            self.set_mode(next, now, tuning, rng);
        }
    }

    /// Re-pick the focus slot when its timer lapses or it points at an empty slot
    pub fn update_focus<R: Rng + ?Sized>(
        &mut self,
        caps: &[f32; SLOTS],
        now: f64,
        tuning: &AiTuning,
        rng: &mut R,
    ) {
        let slots = occupied(caps);
        if slots.is_empty() {
            return;
        }
        if now >= self.focus_until || !slots.contains(&self.focus_slot) {
            self.focus_slot = slots[rng.random_range(0..slots.len())];
            self.focus_until = now + tuning.focus_secs.sample(rng) * 1000.0;
        }
    }

    /// Continuous energy income, mostly into the focus slot
    pub fn accrue<R: Rng + ?Sized>(
        &self,
        energy: &mut [f32; SLOTS],
        caps: &[f32; SLOTS],
        elo: i32,
        dt_ms: f64,
        tuning: &AiTuning,
        rng: &mut R,
    ) {
        if caps[self.focus_slot] <= 0.0 {
            return;
        }
        let amount = tuning.base_rate * tuning.elo_multiplier(elo) * (dt_ms / 1000.0) as f32;
        let focus_gain = amount * tuning.focus_share * tuning.jitter.sample(rng) as f32;
        let f = self.focus_slot;
        energy[f] = (energy[f] + focus_gain).clamp(0.0, caps[f]);

        let others: Vec<usize> = occupied(caps)
            .into_iter()
            .filter(|&i| i != self.focus_slot)
            .collect();
        if others.is_empty() {
            return;
        }
        let o = others[rng.random_range(0..others.len())];
        let other_gain = amount * (1.0 - tuning.focus_share) * tuning.jitter.sample(rng) as f32;
        energy[o] = (energy[o] + other_gain).clamp(0.0, caps[o]);
    }

    /// Focus slot first, then the rest by descending charge level
    pub fn candidates(&self, energy: &[f32; SLOTS], caps: &[f32; SLOTS]) -> Vec<usize> {
        let mut rest: Vec<usize> = occupied(caps)
            .into_iter()
            .filter(|&i| i != self.focus_slot)
            .collect();
        rest.sort_by(|&a, &b| {
            level_from_energy(energy[b])
                .cmp(&level_from_energy(energy[a]))
                .then(a.cmp(&b))
        });
        let mut order = Vec::with_capacity(SLOTS);
        if caps[self.focus_slot] > 0.0 {
            order.push(self.focus_slot);
        }
        order.extend(rest);
        order
    }

    /// Run the gates and pick a slot to fire, if any
    pub fn decide<R: Rng + ?Sized>(
        &mut self,
        energy: &[f32; SLOTS],
        caps: &[f32; SLOTS],
        now: f64,
        tuning: &AiTuning,
        rng: &mut R,
    ) -> Option<AiDecision> {
        if now < self.next_decision_at {
            return None;
        }
        self.next_decision_at = now + tuning.reaction_ms.sample(rng);

        if self
            .last_cast_at
            .is_some_and(|last| now - last < self.min_interval_ms)
        {
            return None;
        }

        for slot in self.candidates(energy, caps) {
            if now < self.slot_ready_at[slot] {
                continue;
            }
            let level = level_from_energy(energy[slot]);
            if level == 0 {
                continue;
            }
            let buffer = rng.random_range(0.0..=tuning.energy_buffer_max.max(0.0));
            let need = (threshold(level) + buffer).min(caps[slot]);
            if energy[slot] < need {
                continue;
            }
            if rng.random_bool(self.mode.fire_chance(level).clamp(0.0, 1.0)) {
                return Some(AiDecision { slot, level });
            }
        }
        None
    }

    /// Start cooldowns after a cast went through
    pub fn on_cast<R: Rng + ?Sized>(
        &mut self,
        decision: AiDecision,
        now: f64,
        tuning: &AiTuning,
        rng: &mut R,
    ) {
        self.last_cast_at = Some(now);
        self.min_interval_ms = if self.mode == AiMode::Burst
            && rng.random_bool(tuning.followup_chance.clamp(0.0, 1.0))
        {
            tuning.followup_ms.sample(rng)
        } else {
            tuning.min_cast_interval_ms
        };
        self.slot_ready_at[decision.slot] = now + tuning.cooldown_ms(decision.level);
    }

    /// One AI tick: mode, focus, accrual, then the decision gates
    pub fn update<R: Rng + ?Sized>(
        &mut self,
        view: AiView<'_>,
        tuning: &AiTuning,
        rng: &mut R,
    ) -> Option<AiDecision> {
        self.update_mode(view.hp_fraction, view.now, tuning, rng);
        self.update_focus(&view.caps, view.now, tuning, rng);
        self.accrue(view.energy, &view.caps, view.elo, view.dt_ms, tuning, rng);
        self.decide(view.energy, &view.caps, view.now, tuning, rng)
    }
}
