//! Collaborator interfaces
//!
//! The battle core reads the catalog and player progression through these
//! traits and reports match rewards back through [`RewardSink`]. Everything
//! behind them (storage, store UI, wallets) lives outside the core.

use crate::catalog::{CreatureDefinition, Phase};
use crate::consts::SLOTS;
use crate::sim::element::Element;

/// Read-only creature lookup
pub trait CatalogProvider {
    fn creature(&self, id: &str) -> Option<&CreatureDefinition>;
    fn ids(&self) -> Vec<&str>;
}

/// Read-only view of the player's progression
pub trait ProgressionProvider {
    /// Creature ids assigned to the four slots
    fn selected_loadout(&self) -> [Option<String>; SLOTS];
    /// Owned phase of a creature, `None` when not owned
    fn phase(&self, id: &str) -> Option<Phase>;
    /// Outgoing magnitude multiplier for an element
    fn affinity(&self, element: Element) -> f32;
    fn max_hp(&self) -> i32;
    fn elo_rating(&self) -> i32;
}

/// Receives the match rewards, once per concluded match
pub trait RewardSink {
    fn grant_coins(&mut self, coins: u32);
    fn grant_xp(&mut self, xp: u32);
    fn set_elo_rating(&mut self, elo: i32);
}
