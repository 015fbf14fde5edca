//! Deterministic simulation module
//!
//! All battle logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only, simulation clock only
//! - Seeded RNG only
//! - Stable iteration order (projectiles in spawn order)
//! - No rendering or platform dependencies

pub mod ability;
pub mod ai;
pub mod board;
pub mod cast;
pub mod conclusion;
pub mod economy;
pub mod element;
pub mod projectile;
pub mod scheduler;
pub mod state;
pub mod status;
pub mod tick;

pub use ability::{AbilityParseError, ParsedAbility, StackingRule, parse_abilities};
pub use ai::{AiDecision, AiMode, AiTuning, EnemyAi};
pub use board::{Board, MatchEvent, ResolveResult, ResolveStep, swap_and_resolve_free};
pub use cast::{CastEffect, CastOutcome, Caster};
pub use conclusion::{Bracket, Outcome, ResultPayload, settle};
pub use economy::{ChargeTuning, hold_ms_to_level};
pub use element::Element;
pub use projectile::{Hit, Projectile};
pub use scheduler::FixedStep;
pub use state::{ArenaGeometry, BattleState};
pub use status::{Side, SideStatus};
pub use tick::tick;
