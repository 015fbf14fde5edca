//! Element Clash - battle simulation core for a match-3 elemental battler
//!
//! Core modules:
//! - `sim`: Deterministic simulation (board, economy, status, projectiles, AI)
//! - `catalog`: Read-only creature definitions loaded from static data
//! - `ports`: Collaborator interfaces the core reads from and reports to
//! - `profile`: In-memory player progression implementing the ports
//! - `battle`: Orchestrator owning the state and exposing the input surface
//! - `settings`: Data-driven tuning

pub mod battle;
pub mod catalog;
pub mod ports;
pub mod profile;
pub mod settings;
pub mod sim;

pub use battle::{Battle, FireParams};
pub use catalog::{Catalog, CatalogError, CreatureDefinition};
pub use ports::{CatalogProvider, ProgressionProvider, RewardSink};
pub use profile::{PlayerProfile, Wallet};
pub use settings::{Settings, SettingsError, SimRate};

/// Game configuration constants
pub mod consts {
    /// Maximum wall-clock seconds accepted from a single frame callback
    pub const MAX_FRAME_SECS: f64 = 0.25;

    /// Board defaults
    pub const BOARD_W: usize = 7;
    pub const BOARD_H: usize = 5;
    pub const BOARD_COLORS: u8 = 6;
    /// Fewest gem colors that still let a board come to rest
    pub const MIN_BOARD_COLORS: u8 = 3;
    /// Smallest board edge that leaves room for a swap
    pub const MIN_BOARD_SIDE: usize = 2;

    /// Loadout size (energy slots per side)
    pub const SLOTS: usize = 4;

    /// Energy required for charge levels 1..4 (also the per-phase cap)
    pub const CHARGE_THRESHOLDS: [f32; 4] = [10.0, 20.0, 30.0, 45.0];

    /// Default max HP for either side when nothing else is known
    pub const DEFAULT_MAX_HP: i32 = 1000;

    /// Arena geometry defaults (player on the left, enemy on the right)
    pub const ARENA_WIDTH: f32 = 420.0;
    pub const ARENA_HEIGHT: f32 = 760.0;
    pub const IMPACT_INSET: f32 = 60.0;
    pub const SHOT_INSET: f32 = 90.0;

    /// Projectile defaults
    pub const PROJECTILE_RADIUS: f32 = 12.0;
    pub const PROJECTILE_BASE_SPEED: f32 = 1.0;
    /// Travel rate at speed 1.0, in pixels per millisecond
    pub const PROJECTILE_PX_PER_MS: f32 = 0.6;
    pub const PROJECTILE_MIN_LIFETIME_MS: f64 = 350.0;
    pub const PROJECTILE_MAX_LIFETIME_MS: f64 = 1200.0;
    /// Speed never drops below this fraction of base, whatever the slow
    pub const PROJECTILE_MIN_SPEED: f32 = 0.1;

    /// Status effect caps
    pub const MAX_EFFECT_PCT: f32 = 0.9;
    pub const DEFAULT_ANTI_HEAL_CUT: f32 = 0.3;
    pub const ANTI_HEAL_DURATION_MS: f64 = 5000.0;
    /// Water damage bonus against a wet target
    pub const WET_BONUS: f32 = 1.25;

    /// Affinity clamp range
    pub const AFFINITY_MIN: f32 = 0.5;
    pub const AFFINITY_MAX: f32 = 2.5;

    /// ELO clamp range
    pub const ELO_MIN: i32 = 600;
    pub const ELO_MAX: i32 = 2400;
    pub const ELO_DEFAULT: i32 = 1000;
}

/// Round half away from zero and convert to `i32`, saturating on overflow.
#[inline]
pub fn round_i32(v: f32) -> i32 {
    if v.is_finite() { v.round() as i32 } else { 0 }
}

/// Cubic ease-in-out on `t` in [0, 1]
#[inline]
pub fn ease_in_out(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ease_endpoints() {
        assert_eq!(ease_in_out(0.0), 0.0);
        assert_eq!(ease_in_out(1.0), 1.0);
        assert!((ease_in_out(0.5) - 0.5).abs() < 1e-6);
        assert_eq!(ease_in_out(2.0), 1.0);
    }

    #[test]
    fn test_round_i32_non_finite() {
        assert_eq!(round_i32(f32::NAN), 0);
        assert_eq!(round_i32(2.5), 3);
        assert_eq!(round_i32(-2.5), -3);
    }
}
