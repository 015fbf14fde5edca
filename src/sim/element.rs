//! Elemental advantage rules
//!
//! Eight elements form a fixed directed graph where every element beats
//! exactly two others. `compare` is antisymmetric by construction because it
//! is derived from the single `beats` relation.

use serde::{Deserialize, Serialize};

/// Damage multipliers for elemental match-ups
pub const ADVANTAGE: f32 = 1.25;
pub const DISADVANTAGE: f32 = 0.75;
pub const NEUTRAL: f32 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Element {
    Fire,
    Water,
    Earth,
    Energy,
    Air,
    Ice,
    Dark,
    Poison,
}

impl Element {
    pub const ALL: [Element; 8] = [
        Element::Fire,
        Element::Water,
        Element::Earth,
        Element::Energy,
        Element::Air,
        Element::Ice,
        Element::Dark,
        Element::Poison,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Element::Fire => "fire",
            Element::Water => "water",
            Element::Earth => "earth",
            Element::Energy => "energy",
            Element::Air => "air",
            Element::Ice => "ice",
            Element::Dark => "dark",
            Element::Poison => "poison",
        }
    }

    /// Parse an element name, case-insensitive, ignoring accents
    pub fn from_name(s: &str) -> Option<Self> {
        let folded: String = s
            .trim()
            .to_lowercase()
            .chars()
            .map(fold_accent)
            .collect();
        match folded.as_str() {
            "fire" => Some(Element::Fire),
            "water" => Some(Element::Water),
            "earth" => Some(Element::Earth),
            "energy" => Some(Element::Energy),
            "air" => Some(Element::Air),
            "ice" => Some(Element::Ice),
            "dark" => Some(Element::Dark),
            "poison" => Some(Element::Poison),
            _ => None,
        }
    }

    /// The two elements this one has advantage over
    pub fn beats(&self) -> [Element; 2] {
        use Element::*;
        match self {
            Fire => [Poison, Ice],
            Water => [Fire, Earth],
            Earth => [Fire, Energy],
            Energy => [Water, Dark],
            Air => [Earth, Poison],
            Ice => [Air, Earth],
            Dark => [Ice, Water],
            Poison => [Dark, Water],
        }
    }

    /// Core projectile element used for mid-air clashes.
    ///
    /// Ice plays as water, air as energy, dark and poison as earth.
    pub fn core(&self) -> Element {
        match self {
            Element::Ice => Element::Water,
            Element::Air => Element::Energy,
            Element::Dark | Element::Poison => Element::Earth,
            other => *other,
        }
    }
}

fn fold_accent(c: char) -> char {
    match c {
        'á' | 'à' | 'ä' | 'â' => 'a',
        'é' | 'è' | 'ë' | 'ê' => 'e',
        'í' | 'ì' | 'ï' | 'î' => 'i',
        'ó' | 'ò' | 'ö' | 'ô' => 'o',
        'ú' | 'ù' | 'ü' | 'û' => 'u',
        other => other,
    }
}

/// +1 if `a` beats `b`, -1 if `b` beats `a`, 0 otherwise
pub fn compare(a: Element, b: Element) -> i8 {
    if a == b {
        0
    } else if a.beats().contains(&b) {
        1
    } else if b.beats().contains(&a) {
        -1
    } else {
        0
    }
}

/// Damage multiplier for `attacker` hitting `defender`.
///
/// A lookup for presentation and tuning. Casts deal authored damage and
/// clashes use [`compare`], so combat never scales by it.
pub fn multiplier(attacker: Element, defender: Element) -> f32 {
    match compare(attacker, defender) {
        1 => ADVANTAGE,
        -1 => DISADVANTAGE,
        _ => NEUTRAL,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn any_element() -> impl Strategy<Value = Element> {
        (0usize..8).prop_map(|i| Element::ALL[i])
    }

    #[test]
    fn test_known_matchups() {
        assert_eq!(compare(Element::Water, Element::Fire), 1);
        assert_eq!(compare(Element::Fire, Element::Water), -1);
        assert_eq!(compare(Element::Fire, Element::Energy), 0);
        assert_eq!(multiplier(Element::Earth, Element::Energy), ADVANTAGE);
        assert_eq!(multiplier(Element::Energy, Element::Earth), DISADVANTAGE);
        assert_eq!(multiplier(Element::Ice, Element::Ice), NEUTRAL);
    }

    #[test]
    fn test_every_element_beats_two() {
        for e in Element::ALL {
            let wins = Element::ALL.iter().filter(|o| compare(e, **o) == 1).count();
            let losses = Element::ALL.iter().filter(|o| compare(e, **o) == -1).count();
            assert_eq!(wins, 2, "{:?}", e);
            assert_eq!(losses, 2, "{:?}", e);
        }
    }

    #[test]
    fn test_core_aliasing() {
        assert_eq!(Element::Ice.core(), Element::Water);
        assert_eq!(Element::Air.core(), Element::Energy);
        assert_eq!(Element::Dark.core(), Element::Earth);
        assert_eq!(Element::Poison.core(), Element::Earth);
        assert_eq!(Element::Fire.core(), Element::Fire);
    }

    #[test]
    fn test_from_name() {
        assert_eq!(Element::from_name("Énergy"), Some(Element::Energy));
        assert_eq!(Element::from_name(" WATER "), Some(Element::Water));
        assert_eq!(Element::from_name("plasma"), None);
    }

    proptest! {
        #[test]
        fn prop_compare_antisymmetric(a in any_element(), b in any_element()) {
            prop_assert_eq!(compare(a, b), -compare(b, a));
            prop_assert_eq!(compare(a, a), 0);
        }
    }
}
