//! Player progression and wallet
//!
//! In-memory implementation of the progression and reward ports. Serializable
//! so an outer layer can persist it however it likes.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::catalog::{MAX_PHASE, Phase};
use crate::consts::{AFFINITY_MAX, AFFINITY_MIN, DEFAULT_MAX_HP, ELO_DEFAULT, ELO_MAX, ELO_MIN, SLOTS};
use crate::ports::{ProgressionProvider, RewardSink};
use crate::sim::element::Element;

/// XP needed for level 1 -> 2
pub const XP_BASE: f32 = 100.0;
/// Growth of the XP requirement per level
pub const XP_GROWTH: f32 = 1.25;
/// Stat points granted per level gained
pub const POINTS_PER_LEVEL: u32 = 3;
/// Extra max HP per point allocated to HP
pub const HP_PER_POINT: i32 = 50;
/// Affinity gained per point allocated to an element
pub const AFFINITY_STEP: f32 = 0.02;

/// XP required to advance from `level` to the next
pub fn xp_to_next(level: u32) -> u32 {
    (XP_BASE * XP_GROWTH.powi(level.saturating_sub(1) as i32)).round() as u32
}

/// Outcome of an XP grant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelProgress {
    pub level: u32,
    pub xp: u32,
    pub to_next: u32,
    pub levels_gained: u32,
}

/// Soft-currency wallet
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Wallet {
    pub coins: u64,
    #[serde(default)]
    grants: Vec<String>,
}

impl Wallet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, n: u64) {
        self.coins = self.coins.saturating_add(n);
    }

    /// Spend `n` coins; false (and no change) if the balance is short
    pub fn spend(&mut self, n: u64) -> bool {
        if self.coins < n {
            return false;
        }
        self.coins -= n;
        true
    }

    pub fn has(&self, n: u64) -> bool {
        self.coins >= n
    }

    /// Grant `amount` once per `key`
    pub fn grant_once(&mut self, key: &str, amount: u64) {
        if self.grants.iter().any(|k| k == key) {
            return;
        }
        self.grants.push(key.to_string());
        self.add(amount);
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerProfile {
    pub elo: i32,
    pub level: u32,
    pub xp: u32,
    /// Unallocated stat points
    pub stat_points: u32,
    /// Points allocated to max HP
    pub hp_points: u32,
    pub affinity: HashMap<Element, f32>,
    /// Owned creatures and their phase
    pub owned: HashMap<String, Phase>,
    pub selected: [Option<String>; SLOTS],
    pub wallet: Wallet,
}

impl Default for PlayerProfile {
    fn default() -> Self {
        Self {
            elo: ELO_DEFAULT,
            level: 1,
            xp: 0,
            stat_points: 0,
            hp_points: 0,
            affinity: Element::ALL.iter().map(|e| (*e, 1.0)).collect(),
            owned: HashMap::new(),
            selected: Default::default(),
            wallet: Wallet::new(),
        }
    }
}

impl PlayerProfile {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take ownership of a creature at phase 1 (no-op if already owned)
    pub fn add_owned(&mut self, id: &str) {
        self.owned.entry(id.to_string()).or_insert(1);
    }

    pub fn is_owned(&self, id: &str) -> bool {
        self.owned.contains_key(id)
    }

    pub fn set_phase(&mut self, id: &str, phase: Phase) {
        self.owned.insert(id.to_string(), phase.clamp(1, MAX_PHASE));
    }

    /// Assign a creature to a slot (`None` clears it); out-of-range slots are ignored
    pub fn set_slot(&mut self, slot: usize, id: Option<&str>) {
        if let Some(s) = self.selected.get_mut(slot) {
            *s = id.map(str::to_string);
        }
    }

    /// Swap two slot assignments
    pub fn move_selected(&mut self, from: usize, to: usize) {
        if from == to || from >= SLOTS || to >= SLOTS {
            return;
        }
        self.selected.swap(from, to);
    }

    pub fn set_elo(&mut self, elo: i32) {
        self.elo = elo.clamp(ELO_MIN, ELO_MAX);
    }

    /// Add XP, rolling over as many levels as it covers
    pub fn add_xp(&mut self, amount: u32) -> LevelProgress {
        let mut xp = self.xp + amount;
        let mut gained = 0;
        let mut need = xp_to_next(self.level);
        while xp >= need {
            xp -= need;
            self.level += 1;
            gained += 1;
            need = xp_to_next(self.level);
        }
        self.xp = xp;
        self.stat_points += gained * POINTS_PER_LEVEL;
        if gained > 0 {
            log::info!("Reached level {} (+{} levels)", self.level, gained);
        }
        LevelProgress {
            level: self.level,
            xp,
            to_next: need,
            levels_gained: gained,
        }
    }

    /// Move up to `n` unallocated points into max HP
    pub fn allocate_hp_points(&mut self, n: u32) {
        let n = n.min(self.stat_points);
        self.hp_points += n;
        self.stat_points -= n;
    }

    /// Move up to `n` unallocated points into an element's affinity
    pub fn allocate_affinity_points(&mut self, element: Element, n: u32) {
        let n = n.min(self.stat_points);
        if n == 0 {
            return;
        }
        let current = self.affinity.get(&element).copied().unwrap_or(1.0);
        let next = (current + n as f32 * AFFINITY_STEP).clamp(AFFINITY_MIN, AFFINITY_MAX);
        self.affinity.insert(element, (next * 100.0).round() / 100.0);
        self.stat_points -= n;
    }
}

impl ProgressionProvider for PlayerProfile {
    fn selected_loadout(&self) -> [Option<String>; SLOTS] {
        self.selected.clone()
    }

    fn phase(&self, id: &str) -> Option<Phase> {
        self.owned.get(id).map(|p| (*p).clamp(1, MAX_PHASE))
    }

    fn affinity(&self, element: Element) -> f32 {
        self.affinity.get(&element).copied().unwrap_or(1.0)
    }

    fn max_hp(&self) -> i32 {
        DEFAULT_MAX_HP + self.hp_points as i32 * HP_PER_POINT
    }

    fn elo_rating(&self) -> i32 {
        self.elo
    }
}

impl RewardSink for PlayerProfile {
    fn grant_coins(&mut self, coins: u32) {
        self.wallet.add(coins as u64);
    }

    fn grant_xp(&mut self, xp: u32) {
        self.add_xp(xp);
    }

    fn set_elo_rating(&mut self, elo: i32) {
        self.set_elo(elo);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_xp_curve() {
        assert_eq!(xp_to_next(1), 100);
        assert_eq!(xp_to_next(2), 125);
        assert_eq!(xp_to_next(3), 156);
    }

    #[test]
    fn test_add_xp_rolls_over_levels() {
        let mut p = PlayerProfile::new();
        let progress = p.add_xp(240);
        assert_eq!(progress.levels_gained, 2);
        assert_eq!(p.level, 3);
        assert_eq!(p.xp, 15);
        assert_eq!(p.stat_points, 6);
        assert_eq!(progress.to_next, 156);
    }

    #[test]
    fn test_allocation() {
        let mut p = PlayerProfile::new();
        p.stat_points = 4;
        p.allocate_hp_points(2);
        assert_eq!(p.max_hp(), 1100);
        p.allocate_affinity_points(Element::Water, 5);
        assert_eq!(p.stat_points, 0);
        assert!((p.affinity(Element::Water) - 1.04).abs() < 1e-6);
        p.allocate_affinity_points(Element::Fire, 1);
        assert_eq!(p.affinity(Element::Fire), 1.0);
    }

    #[test]
    fn test_ownership_and_phase() {
        let mut p = PlayerProfile::new();
        assert_eq!(p.phase("emberling"), None);
        p.add_owned("emberling");
        assert_eq!(p.phase("emberling"), Some(1));
        p.set_phase("emberling", 9);
        assert_eq!(p.phase("emberling"), Some(4));
        p.add_owned("emberling");
        assert_eq!(p.phase("emberling"), Some(4));
    }

    #[test]
    fn test_slots() {
        let mut p = PlayerProfile::new();
        p.set_slot(0, Some("a"));
        p.set_slot(7, Some("b"));
        p.move_selected(0, 3);
        assert_eq!(p.selected_loadout(), [None, None, None, Some("a".to_string())]);
    }

    #[test]
    fn test_wallet() {
        let mut w = Wallet::new();
        w.add(50);
        assert!(!w.spend(60));
        assert!(w.spend(20));
        assert_eq!(w.coins, 30);
        w.grant_once("welcome", 100);
        w.grant_once("welcome", 100);
        assert_eq!(w.coins, 130);
    }

    #[test]
    fn test_rewards_clamp_elo() {
        let mut p = PlayerProfile::new();
        p.set_elo_rating(5000);
        assert_eq!(p.elo_rating(), ELO_MAX);
        p.grant_coins(80);
        assert_eq!(p.wallet.coins, 80);
    }
}
