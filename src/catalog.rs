//! Creature catalog
//!
//! Loads creature rows from JSON, normalizes them (element names, roles,
//! charge-damage tables) and parses ability tags once. The catalog is
//! read-only after loading.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ports::CatalogProvider;
use crate::sim::ability::{ParsedAbility, parse_abilities};
use crate::sim::element::Element;

/// Built-in catalog shipped with the crate
const BUILTIN_JSON: &str = include_str!("../data/creatures.json");

/// Per-creature upgrade tier, 1..=4
pub type Phase = u8;

pub const MAX_PHASE: Phase = 4;

/// Stat multiplier per phase (index 0 = phase 1)
pub const PHASE_MUL: [f32; 4] = [1.0, 1.1, 1.22, 1.35];

/// Shield defaults when a row omits a field
pub const SHIELD_BASE_HP: f32 = 90.0;
pub const SHIELD_GROWTH_HP: f32 = 18.0;
pub const SHIELD_DURATION_MS: f64 = 8000.0;

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("failed to read catalog: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse catalog: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("catalog contains no usable creatures")]
    Empty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rarity {
    Common,
    Rare,
    Epic,
    Legendary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Attack,
    Defense,
    Support,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct StatBlock {
    pub hp: f32,
    pub atk: f32,
    pub def: f32,
    #[serde(default)]
    pub speed: f32,
}

/// Stats resolved for a specific phase
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PhaseStats {
    pub hp: i32,
    pub atk: i32,
    pub def: i32,
    pub speed: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShieldSpec {
    pub base_hp: f32,
    pub growth_hp: f32,
    pub duration_ms: f64,
}

/// Shield block as authored; every field optional
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawShield {
    base_hp: Option<f32>,
    growth_hp: Option<f32>,
    duration_ms: Option<f64>,
}

/// Catalog row as authored in JSON
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCreature {
    #[serde(default)]
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    element: String,
    rarity: Rarity,
    role: Option<Role>,
    sprite: Option<String>,
    #[serde(default)]
    base: StatBlock,
    #[serde(default)]
    growth: StatBlock,
    #[serde(default)]
    abilities: Vec<String>,
    #[serde(default)]
    charge_damage: BTreeMap<String, f32>,
    shield: Option<RawShield>,
}

/// Normalized, immutable creature entry
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreatureDefinition {
    pub id: String,
    pub name: String,
    pub element: Element,
    pub rarity: Rarity,
    pub role: Role,
    pub sprite: Option<String>,
    pub base: StatBlock,
    pub growth: StatBlock,
    /// Damage per charge level (index 0 = level 1)
    pub charge_damage: [Option<f32>; 4],
    pub ability_tags: Vec<String>,
    pub abilities: Vec<ParsedAbility>,
    pub shield: Option<ShieldSpec>,
}

fn infer_role(raw: &RawCreature) -> Role {
    let tags = raw.abilities.join("|").to_lowercase();
    if raw.shield.is_some() || tags.contains("shield") || tags.contains("skin") {
        Role::Defense
    } else if tags.contains("heal") || tags.contains("drain") || tags.contains("boost") {
        Role::Support
    } else {
        Role::Attack
    }
}

impl From<RawCreature> for CreatureDefinition {
    fn from(raw: RawCreature) -> Self {
        let role = raw.role.unwrap_or_else(|| infer_role(&raw));

        let element = Element::from_name(&raw.element).unwrap_or_else(|| {
            log::warn!(
                "{}: unknown element `{}`, defaulting to fire",
                raw.id,
                raw.element
            );
            Element::Fire
        });

        let mut charge_damage = [None; 4];
        for (level, slot) in charge_damage.iter_mut().enumerate() {
            let key = (level + 1).to_string();
            *slot = raw
                .charge_damage
                .get(&key)
                .copied()
                .filter(|v| v.is_finite());
        }

        let shield = raw.shield.as_ref().map(|s| ShieldSpec {
            base_hp: s.base_hp.unwrap_or(SHIELD_BASE_HP),
            growth_hp: s.growth_hp.unwrap_or(SHIELD_GROWTH_HP),
            duration_ms: s.duration_ms.unwrap_or(SHIELD_DURATION_MS),
        });

        let abilities = parse_abilities(&raw.id, &raw.abilities);

        Self {
            name: if raw.name.is_empty() {
                raw.id.clone()
            } else {
                raw.name
            },
            id: raw.id,
            element,
            rarity: raw.rarity,
            role,
            sprite: raw.sprite,
            base: raw.base,
            growth: raw.growth,
            charge_damage,
            ability_tags: raw.abilities,
            abilities,
            shield,
        }
    }
}

impl CreatureDefinition {
    /// Phase-scaled stats
    pub fn stats_for_phase(&self, phase: Phase) -> PhaseStats {
        let phase = phase.clamp(1, MAX_PHASE);
        let mul = PHASE_MUL[(phase - 1) as usize];
        let steps = (phase - 1) as f32;
        let lv = |b: f32, g: f32| (b + g * steps) * mul;
        PhaseStats {
            hp: lv(self.base.hp, self.growth.hp).round() as i32,
            atk: lv(self.base.atk, self.growth.atk).round() as i32,
            def: lv(self.base.def, self.growth.def).round() as i32,
            speed: (lv(self.base.speed, self.growth.speed) * 100.0).round() / 100.0,
        }
    }

    /// Unscaled attack at `phase`, used when no charge damage is authored
    pub fn atk_at_phase(&self, phase: Phase) -> f32 {
        self.base.atk + self.growth.atk * (phase.max(1) - 1) as f32
    }

    /// Authored damage for a charge level (1..=4)
    pub fn charge_damage(&self, level: u8) -> Option<f32> {
        match level {
            1..=4 => self.charge_damage[(level - 1) as usize],
            _ => None,
        }
    }

    /// Projectile damage for a cast, falling back to attack at phase
    pub fn cast_damage(&self, level: u8, phase: Phase) -> f32 {
        self.charge_damage(level)
            .unwrap_or_else(|| self.atk_at_phase(phase))
    }

    pub fn is_healer(&self) -> bool {
        self.abilities.iter().any(ParsedAbility::is_support)
    }
}

/// Read-only creature table keyed by id, in authored order
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    creatures: Vec<CreatureDefinition>,
    index: HashMap<String, usize>,
}

impl Catalog {
    /// The catalog bundled with the crate
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_json_str(BUILTIN_JSON)
    }

    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn from_json_str(json: &str) -> Result<Self, CatalogError> {
        let rows: Vec<RawCreature> = serde_json::from_str(json)?;
        let catalog = Self::from_definitions(rows.into_iter().map(CreatureDefinition::from));
        if catalog.creatures.is_empty() {
            return Err(CatalogError::Empty);
        }
        log::info!("Loaded {} creatures", catalog.creatures.len());
        Ok(catalog)
    }

    /// Build from already-normalized definitions; rows without an id and
    /// repeated ids are skipped.
    pub fn from_definitions<I>(defs: I) -> Self
    where
        I: IntoIterator<Item = CreatureDefinition>,
    {
        let mut catalog = Self::default();
        for def in defs {
            if def.id.is_empty() {
                log::warn!("Skipping creature without id ({})", def.name);
                continue;
            }
            if catalog.index.contains_key(&def.id) {
                log::warn!("Skipping duplicate creature id `{}`", def.id);
                continue;
            }
            catalog.index.insert(def.id.clone(), catalog.creatures.len());
            catalog.creatures.push(def);
        }
        catalog
    }

    pub fn get(&self, id: &str) -> Option<&CreatureDefinition> {
        self.index.get(id).map(|&i| &self.creatures[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &CreatureDefinition> {
        self.creatures.iter()
    }

    pub fn len(&self) -> usize {
        self.creatures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.creatures.is_empty()
    }
}

impl CatalogProvider for Catalog {
    fn creature(&self, id: &str) -> Option<&CreatureDefinition> {
        self.get(id)
    }

    fn ids(&self) -> Vec<&str> {
        self.creatures.iter().map(|c| c.id.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_catalog_loads() {
        let catalog = Catalog::builtin().unwrap();
        assert!(catalog.len() >= 10);
        let spark = catalog.get("sparkit").unwrap();
        assert_eq!(spark.element, Element::Energy);
        assert_eq!(spark.charge_damage(1), Some(58.0));
    }

    #[test]
    fn test_role_inference() {
        let catalog = Catalog::builtin().unwrap();
        assert_eq!(catalog.get("cinderguard").unwrap().role, Role::Defense);
        assert_eq!(catalog.get("mossling").unwrap().role, Role::Support);
        assert_eq!(catalog.get("stormhorn").unwrap().role, Role::Attack);
    }

    #[test]
    fn test_normalization_defaults() {
        let json = r#"[
            {"id": "x", "element": "plasma", "rarity": "rare",
             "base": {"hp": 100, "atk": 20, "def": 5},
             "growth": {"hp": 10, "atk": 4, "def": 1},
             "abilities": ["bogus", "wet:3s"],
             "chargeDamage": {"2": 40},
             "shield": {"baseHp": 50}}
        ]"#;
        let catalog = Catalog::from_json_str(json).unwrap();
        let x = catalog.get("x").unwrap();
        assert_eq!(x.element, Element::Fire);
        assert_eq!(x.name, "x");
        assert_eq!(x.abilities.len(), 1);
        assert_eq!(x.charge_damage, [None, Some(40.0), None, None]);
        assert_eq!(x.cast_damage(1, 3), 28.0);
        let shield = x.shield.unwrap();
        assert_eq!(shield.base_hp, 50.0);
        assert_eq!(shield.growth_hp, SHIELD_GROWTH_HP);
        assert_eq!(shield.duration_ms, SHIELD_DURATION_MS);
    }

    #[test]
    fn test_stats_for_phase() {
        let catalog = Catalog::builtin().unwrap();
        let ember = catalog.get("emberling").unwrap();
        let p1 = ember.stats_for_phase(1);
        assert_eq!(p1.hp, 420);
        assert_eq!(p1.atk, 62);
        // (62 + 9) * 1.1 = 78.1
        assert_eq!(ember.stats_for_phase(2).atk, 78);
    }

    #[test]
    fn test_duplicates_and_empty_ids_skipped() {
        let json = r#"[
            {"id": "a", "element": "water", "rarity": "common"},
            {"id": "a", "element": "fire", "rarity": "common"},
            {"element": "fire", "rarity": "common"}
        ]"#;
        let catalog = Catalog::from_json_str(json).unwrap();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.get("a").unwrap().element, Element::Water);
        assert!(matches!(
            Catalog::from_json_str("[]"),
            Err(CatalogError::Empty)
        ));
    }
}
