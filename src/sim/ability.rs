//! Ability tag parser
//!
//! Catalog data authors abilities as short text tags such as
//! `"dot:burn,4s,stack2"` or `"heal:inst,8%max"`. They are parsed once when
//! the catalog loads into [`ParsedAbility`] values.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::consts::MAX_EFFECT_PCT;

/// How repeated applications of the same DoT combine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StackingRule {
    Stack,
    Refresh,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ParsedAbility {
    Dot {
        tag: String,
        seconds: f32,
        max_stacks: u32,
        stacking: StackingRule,
    },
    AntiShield {
        pct: f32,
    },
    HealInstant {
        pct_max: f32,
    },
    Regen {
        seconds: f32,
        pct_per_sec: f32,
    },
    Cleanse {
        count: u32,
    },
    Wet {
        seconds: f32,
    },
    SlowProjectiles {
        pct: f32,
        seconds: f32,
    },
    AntiHeal {
        pct: f32,
    },
    LeechEnergy {
        amount: u32,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AbilityParseError {
    #[error("unknown ability tag `{0}`")]
    Unknown(String),
}

impl ParsedAbility {
    /// Heal-type abilities make a creature a healer
    pub fn is_support(&self) -> bool {
        matches!(
            self,
            ParsedAbility::HealInstant { .. }
                | ParsedAbility::Regen { .. }
                | ParsedAbility::Cleanse { .. }
        )
    }
}

/// Parse the leading decimal number of `s` (after leading whitespace),
/// ignoring any trailing text.
fn number_prefix(s: &str) -> Option<f32> {
    let s = s.trim_start();
    let mut end = 0;
    let mut seen_digit = false;
    let mut seen_dot = false;
    for (i, c) in s.char_indices() {
        match c {
            '+' | '-' if i == 0 => {}
            '0'..='9' => seen_digit = true,
            '.' if !seen_dot => seen_dot = true,
            _ => break,
        }
        end = i + c.len_utf8();
    }
    if !seen_digit {
        return None;
    }
    s[..end].parse().ok()
}

/// Leading number, or `default` when missing or zero
fn number_or(s: &str, default: f32) -> f32 {
    match number_prefix(s) {
        Some(v) if v != 0.0 && v.is_finite() => v,
        _ => default,
    }
}

/// Leading integer, or `default` when missing or zero
fn int_or(s: &str, default: u32) -> u32 {
    match number_prefix(s) {
        Some(v) if v >= 1.0 => v.trunc() as u32,
        Some(v) if v < 0.0 => 1,
        _ => default,
    }
}

fn clamp_pct(v: f32, max: f32) -> f32 {
    v.clamp(0.0, max)
}

impl FromStr for ParsedAbility {
    type Err = AbilityParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let t = s.trim().to_lowercase();

        if let Some(rest) = t.strip_prefix("dot:") {
            let parts: Vec<&str> = rest.split(',').map(str::trim).collect();
            let tag = match parts.first() {
                Some(p) if !p.is_empty() => p.to_string(),
                _ => "dot".to_string(),
            };
            let seconds = parts
                .iter()
                .skip(1)
                .find(|p| p.ends_with('s') && !p.starts_with("stack"))
                .map(|p| number_or(p, 4.0))
                .unwrap_or(4.0);
            let stack = parts.iter().skip(1).find(|p| p.starts_with("stack"));
            let max_stacks = stack
                .map(|p| int_or(&p["stack".len()..], 1).max(1))
                .unwrap_or(1);
            let stacking = if stack.is_some() {
                StackingRule::Stack
            } else {
                StackingRule::Refresh
            };
            return Ok(ParsedAbility::Dot {
                tag,
                seconds,
                max_stacks,
                stacking,
            });
        }

        if let Some(rest) = t.strip_prefix("antishield:") {
            let pct = number_prefix(rest).unwrap_or(0.0) / 100.0;
            return Ok(ParsedAbility::AntiShield {
                pct: clamp_pct(pct, MAX_EFFECT_PCT),
            });
        }

        if t.starts_with("heal:inst") {
            let p = t.split(',').nth(1).unwrap_or("8%max");
            let pct = number_or(p, 8.0) / 100.0;
            return Ok(ParsedAbility::HealInstant {
                pct_max: clamp_pct(pct, 0.5),
            });
        }

        if let Some(rest) = t.strip_prefix("regen:") {
            let parts: Vec<&str> = rest.split(',').map(str::trim).collect();
            let seconds = number_or(parts.first().copied().unwrap_or("4s"), 4.0);
            let pct_per_sec = number_or(parts.get(1).copied().unwrap_or("2%/s"), 2.0) / 100.0;
            return Ok(ParsedAbility::Regen {
                seconds,
                pct_per_sec: clamp_pct(pct_per_sec, 0.1),
            });
        }

        if let Some(rest) = t.strip_prefix("cleanse:") {
            return Ok(ParsedAbility::Cleanse {
                count: int_or(rest, 1).max(1),
            });
        }

        if let Some(rest) = t.strip_prefix("wet:") {
            return Ok(ParsedAbility::Wet {
                seconds: number_or(rest, 4.0),
            });
        }

        let slow = t
            .strip_prefix("slow_proj:")
            .or_else(|| t.strip_prefix("projectile_slow_rival:"));
        if let Some(rest) = slow {
            let mut parts = rest.split(',').map(str::trim);
            let pct = number_or(parts.next().unwrap_or("10%"), 10.0) / 100.0;
            let seconds = number_or(parts.next().unwrap_or("2s"), 2.0);
            return Ok(ParsedAbility::SlowProjectiles {
                pct: clamp_pct(pct, MAX_EFFECT_PCT),
                seconds,
            });
        }

        if let Some(rest) = t.strip_prefix("antiheal:") {
            let pct = number_or(rest, 30.0) / 100.0;
            return Ok(ParsedAbility::AntiHeal {
                pct: clamp_pct(pct, MAX_EFFECT_PCT),
            });
        }

        if let Some(rest) = t.strip_prefix("leech_energy:") {
            return Ok(ParsedAbility::LeechEnergy {
                amount: int_or(rest, 4).max(1),
            });
        }

        Err(AbilityParseError::Unknown(s.to_string()))
    }
}

/// Parse a list of tags, dropping (and logging) the ones that don't parse
pub fn parse_abilities<S: AsRef<str>>(owner: &str, tags: &[S]) -> Vec<ParsedAbility> {
    tags.iter()
        .filter_map(|tag| match tag.as_ref().parse::<ParsedAbility>() {
            Ok(a) => Some(a),
            Err(e) => {
                log::debug!("{}: skipping ability: {}", owner, e);
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> ParsedAbility {
        s.parse().unwrap()
    }

    #[test]
    fn test_dot_with_stacks() {
        assert_eq!(
            parse("dot:burn,4s,stack2"),
            ParsedAbility::Dot {
                tag: "burn".into(),
                seconds: 4.0,
                max_stacks: 2,
                stacking: StackingRule::Stack,
            }
        );
    }

    #[test]
    fn test_dot_defaults_to_refresh() {
        assert_eq!(
            parse("DOT:chill,3.5s"),
            ParsedAbility::Dot {
                tag: "chill".into(),
                seconds: 3.5,
                max_stacks: 1,
                stacking: StackingRule::Refresh,
            }
        );
        match parse("dot:") {
            ParsedAbility::Dot { tag, seconds, .. } => {
                assert_eq!(tag, "dot");
                assert_eq!(seconds, 4.0);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_percentages_are_clamped() {
        assert_eq!(parse("antishield:95%"), ParsedAbility::AntiShield { pct: 0.9 });
        assert_eq!(parse("heal:inst,80%max"), ParsedAbility::HealInstant { pct_max: 0.5 });
        assert_eq!(parse("heal:inst"), ParsedAbility::HealInstant { pct_max: 0.08 });
        assert_eq!(
            parse("regen:5s,30%/s"),
            ParsedAbility::Regen {
                seconds: 5.0,
                pct_per_sec: 0.1
            }
        );
    }

    #[test]
    fn test_slow_aliases() {
        let expected = ParsedAbility::SlowProjectiles {
            pct: 0.25,
            seconds: 3.0,
        };
        assert_eq!(parse("slow_proj:25%,3s"), expected);
        assert_eq!(parse("projectile_slow_rival:25%,3s"), expected);
        assert_eq!(
            parse("slow_proj:"),
            ParsedAbility::SlowProjectiles {
                pct: 0.1,
                seconds: 2.0
            }
        );
    }

    #[test]
    fn test_simple_tags() {
        assert_eq!(parse("cleanse:2"), ParsedAbility::Cleanse { count: 2 });
        assert_eq!(parse("cleanse:x"), ParsedAbility::Cleanse { count: 1 });
        assert_eq!(parse("wet:6s"), ParsedAbility::Wet { seconds: 6.0 });
        assert_eq!(parse("antiheal:"), ParsedAbility::AntiHeal { pct: 0.3 });
        assert_eq!(parse("leech_energy:3"), ParsedAbility::LeechEnergy { amount: 3 });
        assert_eq!(parse("leech_energy:"), ParsedAbility::LeechEnergy { amount: 4 });
    }

    #[test]
    fn test_unknown_tags_are_dropped() {
        assert!("thorns:10".parse::<ParsedAbility>().is_err());
        let parsed = parse_abilities("test", &["thorns:10", "wet:2s"]);
        assert_eq!(parsed, vec![ParsedAbility::Wet { seconds: 2.0 }]);
    }
}
