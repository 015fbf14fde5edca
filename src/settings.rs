//! Battle settings and tuning
//!
//! Everything a designer may want to tweak without touching code. Loaded from
//! JSON; any omitted field keeps its default.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::{BOARD_COLORS, BOARD_H, BOARD_W, MIN_BOARD_COLORS, MIN_BOARD_SIDE};
use crate::sim::ai::AiTuning;
use crate::sim::economy::ChargeTuning;

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("failed to read settings: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse settings: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid settings: {0}")]
    Invalid(String),
}

/// Fixed simulation rate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SimRate {
    #[default]
    Hz30,
    Hz60,
}

impl SimRate {
    pub fn as_str(&self) -> &'static str {
        match self {
            SimRate::Hz30 => "30",
            SimRate::Hz60 => "60",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().trim_end_matches("hz") {
            "30" => Some(SimRate::Hz30),
            "60" => Some(SimRate::Hz60),
            _ => None,
        }
    }

    /// Length of one simulation step in seconds
    pub fn step_secs(&self) -> f64 {
        match self {
            SimRate::Hz30 => 1.0 / 30.0,
            SimRate::Hz60 => 1.0 / 60.0,
        }
    }
}

/// Board dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardConfig {
    pub width: usize,
    pub height: usize,
    pub colors: u8,
}

impl BoardConfig {
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.colors < MIN_BOARD_COLORS {
            return Err(SettingsError::Invalid(format!(
                "board.colors must be at least {}, got {}",
                MIN_BOARD_COLORS, self.colors
            )));
        }
        if self.width < MIN_BOARD_SIDE || self.height < MIN_BOARD_SIDE {
            return Err(SettingsError::Invalid(format!(
                "board must be at least {0}x{0}, got {1}x{2}",
                MIN_BOARD_SIDE, self.width, self.height
            )));
        }
        Ok(())
    }
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            width: BOARD_W,
            height: BOARD_H,
            colors: BOARD_COLORS,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub sim_rate: SimRate,
    pub board: BoardConfig,
    /// Hold duration thresholds for charge levels
    pub charge: ChargeTuning,
    /// Opponent behaviour
    pub ai: AiTuning,
}

impl Settings {
    pub fn from_json_str(json: &str) -> Result<Self, SettingsError> {
        let settings: Self = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        self.board.validate()
    }

    /// Load settings from a JSON file
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let json = std::fs::read_to_string(path)?;
        let settings = Self::from_json_str(&json)?;
        log::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Load settings, falling back to defaults when the file is missing or bad
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(settings) => settings,
            Err(e) => {
                log::info!("Using default settings ({})", e);
                Self::default()
            }
        }
    }

    pub fn to_json(&self) -> Result<String, SettingsError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sim_rate_parse() {
        assert_eq!(SimRate::from_str("60hz"), Some(SimRate::Hz60));
        assert_eq!(SimRate::from_str(" 30 "), Some(SimRate::Hz30));
        assert_eq!(SimRate::from_str("144"), None);
        assert!((SimRate::Hz60.step_secs() - 1.0 / 60.0).abs() < 1e-12);
    }

    #[test]
    fn test_degenerate_board_is_rejected() {
        for json in [
            r#"{"board": {"colors": 1}}"#,
            r#"{"board": {"colors": 2}}"#,
            r#"{"board": {"width": 0}}"#,
            r#"{"board": {"height": 1}}"#,
        ] {
            assert!(
                matches!(Settings::from_json_str(json), Err(SettingsError::Invalid(_))),
                "{json}"
            );
        }
        assert!(Settings::from_json_str(r#"{"board": {"colors": 3, "width": 2}}"#).is_ok());
        assert!(Settings::default().validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let s = Settings::from_json_str(r#"{"sim_rate": "Hz60", "board": {"width": 8}}"#).unwrap();
        assert_eq!(s.sim_rate, SimRate::Hz60);
        assert_eq!(s.board.width, 8);
        assert_eq!(s.board.height, BOARD_H);
        assert_eq!(s.charge, ChargeTuning::default());
        assert_eq!(s.ai, AiTuning::default());
    }

    #[test]
    fn test_round_trip() {
        let s = Settings::default();
        let json = s.to_json().unwrap();
        assert_eq!(Settings::from_json_str(&json).unwrap(), s);
    }

    #[test]
    fn test_bad_json_is_an_error() {
        assert!(matches!(
            Settings::from_json_str("{"),
            Err(SettingsError::Parse(_))
        ));
        let missing = Settings::load_or_default(Path::new("/nonexistent/settings.json"));
        assert_eq!(missing, Settings::default());
    }
}
