//! Projectiles
//!
//! Each tick runs three by-value stages in a fixed order: mid-air collisions,
//! wall hits, then motion. Every stage hands back the survivors, so a
//! projectile that has already resolved can never resolve twice.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::element::{Element, compare};
use super::status::Side;
use crate::consts::*;
use crate::{ease_in_out, round_i32};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Projectile {
    pub id: u32,
    pub owner: Side,
    pub source_creature_id: String,
    /// Core projectile element (extended elements already aliased)
    pub element: Element,
    pub power: i32,
    pub speed: f32,
    pub speed_base: f32,
    pub radius: f32,
    pub pos: Vec2,
    pub start_pos: Vec2,
    pub target_pos: Vec2,
    pub born_at: f64,
    pub age_ms: f64,
    pub lifetime_ms: f64,
    pub sprite: Option<String>,
}

/// Everything needed to launch a projectile
#[derive(Debug, Clone)]
pub struct Launch {
    pub owner: Side,
    pub source_creature_id: String,
    pub element: Element,
    pub power: i32,
    pub from: Vec2,
    pub to: Vec2,
    pub sprite: Option<String>,
}

impl Projectile {
    pub fn spawn(id: u32, launch: Launch, now: f64) -> Self {
        let speed_base = PROJECTILE_BASE_SPEED;
        let distance = launch.from.distance(launch.to) as f64;
        let lifetime_ms = (distance / (PROJECTILE_PX_PER_MS * speed_base) as f64)
            .clamp(PROJECTILE_MIN_LIFETIME_MS, PROJECTILE_MAX_LIFETIME_MS);
        Self {
            id,
            owner: launch.owner,
            source_creature_id: launch.source_creature_id,
            element: launch.element.core(),
            power: launch.power.max(0),
            speed: speed_base,
            speed_base,
            radius: PROJECTILE_RADIUS,
            pos: launch.from,
            start_pos: launch.from,
            target_pos: launch.to,
            born_at: now,
            age_ms: 0.0,
            lifetime_ms,
            sprite: launch.sprite,
        }
    }

    /// Travel progress in [0, 1]
    pub fn progress(&self) -> f32 {
        if self.lifetime_ms <= 0.0 {
            return 1.0;
        }
        (self.age_ms / self.lifetime_ms).clamp(0.0, 1.0) as f32
    }

    fn is_valid(&self) -> bool {
        self.pos.is_finite()
            && self.start_pos.is_finite()
            && self.target_pos.is_finite()
            && self.radius.is_finite()
            && self.lifetime_ms.is_finite()
            && self.lifetime_ms > 0.0
    }
}

/// A projectile reaching its target
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hit {
    pub projectile_id: u32,
    pub target: Side,
    pub power: i32,
    pub element: Element,
    pub source_creature_id: String,
}

impl Hit {
    fn from_projectile(p: Projectile) -> Self {
        Self {
            projectile_id: p.id,
            target: p.owner.opposite(),
            power: p.power,
            element: p.element,
            source_creature_id: p.source_creature_id,
        }
    }
}

/// Outcome of two projectiles meeting mid-air
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Clash {
    /// `winner` survives at reduced power, `loser` is destroyed
    Won { winner: u32, loser: u32 },
    /// Both destroyed
    Tie { a: u32, b: u32 },
}

/// Rescale every projectile's speed from its base by its owner's slow
pub fn apply_slow(projectiles: &mut [Projectile], player_slow: f32, enemy_slow: f32) {
    for p in projectiles {
        let slow = match p.owner {
            Side::Player => player_slow,
            Side::Enemy => enemy_slow,
        };
        p.speed = (p.speed_base * (1.0 - slow)).max(PROJECTILE_MIN_SPEED);
    }
}

/// Stage 1: opposite-owner pairs that overlap fight it out by element
pub fn resolve_mid_air_collisions(mut projectiles: Vec<Projectile>) -> (Vec<Projectile>, Vec<Clash>) {
    let n = projectiles.len();
    let mut collided = vec![false; n];
    let mut destroyed = vec![false; n];
    let mut clashes = Vec::new();

    for i in 0..n {
        if collided[i] {
            continue;
        }
        for j in (i + 1)..n {
            if collided[j] || projectiles[i].owner == projectiles[j].owner {
                continue;
            }
            let (a, b) = (&projectiles[i], &projectiles[j]);
            if a.pos.distance(b.pos) > a.radius + b.radius {
                continue;
            }

            collided[i] = true;
            collided[j] = true;
            match compare(a.element.core(), b.element.core()) {
                1 => {
                    destroyed[j] = true;
                    clashes.push(Clash::Won {
                        winner: a.id,
                        loser: b.id,
                    });
                    let p = &mut projectiles[i];
                    p.power = round_i32(p.power as f32 * 0.5).max(1);
                }
                -1 => {
                    destroyed[i] = true;
                    clashes.push(Clash::Won {
                        winner: b.id,
                        loser: a.id,
                    });
                    let p = &mut projectiles[j];
                    p.power = round_i32(p.power as f32 * 0.5).max(1);
                }
                _ => {
                    destroyed[i] = true;
                    destroyed[j] = true;
                    clashes.push(Clash::Tie { a: a.id, b: b.id });
                }
            }
            break;
        }
    }

    for clash in &clashes {
        log::debug!("Mid-air clash: {:?}", clash);
    }

    let survivors = projectiles
        .into_iter()
        .zip(destroyed)
        .filter_map(|(p, dead)| (!dead).then_some(p))
        .collect();
    (survivors, clashes)
}

/// Stage 2: projectiles that crossed the opposing impact line
pub fn filter_wall_hits(
    projectiles: Vec<Projectile>,
    player_hit_x: f32,
    enemy_hit_x: f32,
) -> (Vec<Projectile>, Vec<Hit>) {
    let mut survivors = Vec::with_capacity(projectiles.len());
    let mut hits = Vec::new();
    for p in projectiles {
        let crossed = match p.owner {
            Side::Player => p.pos.x + p.radius >= enemy_hit_x,
            Side::Enemy => p.pos.x - p.radius <= player_hit_x,
        };
        if crossed {
            hits.push(Hit::from_projectile(p));
        } else {
            survivors.push(p);
        }
    }
    (survivors, hits)
}

/// Stage 3: advance along the eased path, hitting on arrival
pub fn step_projectiles(projectiles: Vec<Projectile>, dt_ms: f64) -> (Vec<Projectile>, Vec<Hit>) {
    let mut survivors = Vec::with_capacity(projectiles.len());
    let mut hits = Vec::new();
    for mut p in projectiles {
        let rate = if p.speed_base > 0.0 {
            (p.speed / p.speed_base) as f64
        } else {
            1.0
        };
        p.age_ms += dt_ms * rate;
        let t = p.progress();
        p.pos = p.start_pos + (p.target_pos - p.start_pos) * ease_in_out(t);

        if t >= 1.0 || p.pos.distance(p.target_pos) <= p.radius {
            hits.push(Hit::from_projectile(p));
        } else {
            survivors.push(p);
        }
    }
    (survivors, hits)
}

/// Drop projectiles carrying non-finite geometry
pub fn purge_invalid(projectiles: Vec<Projectile>) -> Vec<Projectile> {
    projectiles
        .into_iter()
        .filter(|p| {
            let ok = p.is_valid();
            if !ok {
                log::warn!("Purging invalid projectile {}", p.id);
            }
            ok
        })
        .collect()
}
