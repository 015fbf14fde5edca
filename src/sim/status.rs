//! Combatant status engine
//!
//! Per-side HP, shield and timed effects. Every timestamp is simulation time
//! in milliseconds; callers pass the current clock explicitly.

use serde::{Deserialize, Serialize};

use super::element::Element;
use crate::consts::{DEFAULT_ANTI_HEAL_CUT, MAX_EFFECT_PCT};
use crate::round_i32;

/// Which combatant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Player,
    Enemy,
}

impl Side {
    pub fn opposite(self) -> Side {
        match self {
            Side::Player => Side::Enemy,
            Side::Enemy => Side::Player,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Player => "player",
            Side::Enemy => "enemy",
        }
    }
}

/// A value that lapses at an absolute sim time
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimedFlag {
    pub until: f64,
    pub value: f32,
}

impl TimedFlag {
    pub fn is_active(&self, now: f64) -> bool {
        self.until > now
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DotEffect {
    pub tag: String,
    pub element: Element,
    /// Damage per second for a single stack
    pub dps: f32,
    pub remaining_ms: f64,
    pub stacks: u32,
    pub can_stack: bool,
    pub max_stacks: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegenEffect {
    pub hps: f32,
    pub remaining_ms: f64,
}

/// How an element's DoTs combine on re-application
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DotStacking {
    pub can_stack: bool,
    pub max_stacks: u32,
}

impl DotStacking {
    pub const REFRESH: DotStacking = DotStacking {
        can_stack: false,
        max_stacks: 1,
    };
}

pub fn stacking_rule(element: Element) -> DotStacking {
    match element {
        Element::Fire => DotStacking {
            can_stack: true,
            max_stacks: 2,
        },
        Element::Poison => DotStacking {
            can_stack: true,
            max_stacks: 3,
        },
        _ => DotStacking::REFRESH,
    }
}

/// Where a hit went
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DamageReport {
    pub absorbed: i32,
    pub dealt: i32,
}

/// Totals from one effect tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    pub dot_damage: i32,
    pub healed: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SideStatus {
    pub hp: i32,
    pub max_hp: i32,
    pub shield_hp: i32,
    pub shield_until: f64,
    /// Fraction of incoming damage that bypasses the shield
    pub anti_shield_pct: f32,
    pub anti_heal: Option<TimedFlag>,
    pub proj_slow: Option<TimedFlag>,
    pub wet: Option<TimedFlag>,
    pub dots: Vec<DotEffect>,
    pub regens: Vec<RegenEffect>,
}

impl SideStatus {
    /// Full HP, no effects
    pub fn new(max_hp: i32) -> Self {
        let max_hp = max_hp.max(1);
        Self {
            hp: max_hp,
            max_hp,
            shield_hp: 0,
            shield_until: 0.0,
            anti_shield_pct: 0.0,
            anti_heal: None,
            proj_slow: None,
            wet: None,
            dots: Vec::new(),
            regens: Vec::new(),
        }
    }

    pub fn hp_fraction(&self) -> f32 {
        self.hp as f32 / self.max_hp as f32
    }

    pub fn is_dead(&self) -> bool {
        self.hp <= 0
    }

    pub fn shield_active(&self, now: f64) -> bool {
        self.shield_hp > 0 && self.shield_until > now
    }

    fn set_hp(&mut self, hp: i32) {
        self.hp = hp.clamp(0, self.max_hp);
    }

    /// Damage through the shield, then HP
    pub fn apply_damage(&mut self, raw: f32, now: f64) -> DamageReport {
        let mut remain = round_i32(raw).max(0);
        let mut absorbed = 0;

        let eff = (1.0 - self.anti_shield_pct).clamp(0.0, 1.0);
        if self.shield_active(now) && eff > 0.0 {
            absorbed = self.shield_hp.min(round_i32(remain as f32 * eff));
            self.shield_hp -= absorbed;
            remain -= absorbed;
            if self.shield_hp <= 0 {
                self.shield_hp = 0;
                self.shield_until = 0.0;
            }
        }

        let before = self.hp;
        self.set_hp(self.hp - remain);
        DamageReport {
            absorbed,
            dealt: before - self.hp,
        }
    }

    /// Heal, cut by an active anti-heal. Returns HP actually restored.
    pub fn heal(&mut self, amount: f32, now: f64) -> i32 {
        let mut eff = round_i32(amount).max(0);
        if let Some(anti) = self.anti_heal.filter(|f| f.is_active(now)) {
            let cut = if anti.value.is_finite() {
                anti.value
            } else {
                DEFAULT_ANTI_HEAL_CUT
            };
            let cut = cut.clamp(0.0, MAX_EFFECT_PCT);
            eff = round_i32(eff as f32 * (1.0 - cut));
        }
        let before = self.hp;
        self.set_hp(self.hp + eff);
        self.hp - before
    }

    /// Raise the shield; a larger value overwrites, expiry always refreshes
    pub fn apply_shield(&mut self, hp: f32, duration_ms: f64, now: f64) {
        let until = now + duration_ms.max(0.0);
        let hp = round_i32(hp).max(0);
        if hp > self.shield_hp {
            self.shield_hp = hp;
        }
        self.shield_until = until;
    }

    /// Apply or re-apply a DoT keyed by `tag`, stacking per the element's rule
    /// Apply a DoT that follows its element's stacking rule
    pub fn add_dot(&mut self, tag: &str, element: Element, dps: f32, duration_ms: f64) {
        self.add_dot_with(tag, element, dps, duration_ms, DotStacking::REFRESH);
    }

    /// Apply a DoT whose ability carries its own stacking. Either the ability
    /// or the element rule can enable stacking; the higher cap wins.
    pub fn add_dot_with(
        &mut self,
        tag: &str,
        element: Element,
        dps: f32,
        duration_ms: f64,
        authored: DotStacking,
    ) {
        let rule = stacking_rule(element);
        let can_stack = authored.can_stack || rule.can_stack;
        let max_stacks = authored.max_stacks.max(rule.max_stacks).max(1);
        if let Some(ex) = self.dots.iter_mut().find(|d| d.tag == tag) {
            if can_stack {
                ex.stacks = (ex.stacks + 1).clamp(1, max_stacks);
                ex.remaining_ms = ex.remaining_ms.max(duration_ms);
            } else {
                ex.stacks = 1;
                ex.remaining_ms = duration_ms;
                ex.dps = dps;
            }
            return;
        }
        self.dots.push(DotEffect {
            tag: tag.to_string(),
            element,
            dps,
            remaining_ms: duration_ms,
            stacks: 1,
            can_stack,
            max_stacks,
        });
    }

    pub fn add_regen(&mut self, hps: f32, duration_ms: f64) {
        self.regens.push(RegenEffect {
            hps,
            remaining_ms: duration_ms,
        });
    }

    /// Remove up to `count` negative effects: newest DoTs first, then
    /// anti-heal, then projectile slow. Returns how many were removed.
    pub fn cleanse(&mut self, count: u32) -> u32 {
        let mut left = count;
        while left > 0 && self.dots.pop().is_some() {
            left -= 1;
        }
        if left > 0 && self.anti_heal.take().is_some() {
            left -= 1;
        }
        if left > 0 && self.proj_slow.take().is_some() {
            left -= 1;
        }
        count - left
    }

    pub fn set_wet(&mut self, duration_ms: f64, now: f64) {
        self.wet = Some(TimedFlag {
            until: now + duration_ms,
            value: 1.0,
        });
    }

    pub fn is_wet(&self, now: f64) -> bool {
        self.wet.is_some_and(|f| f.is_active(now))
    }

    pub fn set_proj_slow(&mut self, pct: f32, duration_ms: f64, now: f64) {
        self.proj_slow = Some(TimedFlag {
            until: now + duration_ms,
            value: pct.clamp(0.0, MAX_EFFECT_PCT),
        });
    }

    /// Current projectile slow fraction, 0 when none is active
    pub fn proj_slow_pct(&self, now: f64) -> f32 {
        self.proj_slow
            .filter(|f| f.is_active(now))
            .map_or(0.0, |f| f.value)
    }

    pub fn set_anti_heal(&mut self, pct: f32, duration_ms: f64, now: f64) {
        self.anti_heal = Some(TimedFlag {
            until: now + duration_ms,
            value: pct.clamp(0.0, MAX_EFFECT_PCT),
        });
    }

    pub fn set_anti_shield(&mut self, pct: f32) {
        self.anti_shield_pct = pct.clamp(0.0, MAX_EFFECT_PCT);
    }

    /// Advance DoTs and regens by `dt_ms` and clear anything that has lapsed
    pub fn tick_effects(&mut self, dt_ms: f64, now: f64) -> TickReport {
        let mut report = TickReport::default();

        let mut dots = std::mem::take(&mut self.dots);
        for d in &mut dots {
            let dmg = d.dps as f64 * d.stacks as f64 * dt_ms / 1000.0;
            if dmg > 0.0 {
                report.dot_damage += self.apply_damage(dmg as f32, now).dealt;
            }
            d.remaining_ms -= dt_ms;
        }
        dots.retain(|d| d.remaining_ms > 0.0);
        self.dots = dots;

        let mut regens = std::mem::take(&mut self.regens);
        for r in &mut regens {
            let h = r.hps as f64 * dt_ms / 1000.0;
            if h > 0.0 {
                report.healed += self.heal(h as f32, now);
            }
            r.remaining_ms -= dt_ms;
        }
        regens.retain(|r| r.remaining_ms > 0.0);
        self.regens = regens;

        if self.shield_until > 0.0 && self.shield_until <= now {
            self.shield_hp = 0;
            self.shield_until = 0.0;
        }
        let lapsed = |f: &Option<TimedFlag>| f.is_some_and(|f| !f.is_active(now));
        if lapsed(&self.proj_slow) {
            self.proj_slow = None;
        }
        if lapsed(&self.anti_heal) {
            self.anti_heal = None;
        }
        if lapsed(&self.wet) {
            self.wet = None;
        }

        report
    }
}
