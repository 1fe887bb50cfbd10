//! User preferences that persist between runs.
//!
//! Every struct here uses `#[serde(default)]`, so decoding a partial or older
//! settings file fills in whatever is missing from the defaults.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Difficulty, GenerationParams, OwnerId, ReforgeAction};

pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Difficulty as picked in the UI; `All` is sent to the generator as medium.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DifficultyChoice {
    Easy,
    #[default]
    Medium,
    Hard,
    All,
}

impl DifficultyChoice {
    pub fn to_difficulty(self) -> Difficulty {
        match self {
            DifficultyChoice::Easy => Difficulty::Easy,
            DifficultyChoice::Medium | DifficultyChoice::All => Difficulty::Medium,
            DifficultyChoice::Hard => Difficulty::Hard,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct GenerationSettings {
    pub min_count: u32,
    pub difficulty: DifficultyChoice,
    pub custom_prompt: String,
    pub preview_mode: bool,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            min_count: 5,
            difficulty: DifficultyChoice::Medium,
            custom_prompt: String::new(),
            preview_mode: false,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ReforgeSettings {
    pub action: ReforgeAction,
    pub min_count: u32,
    pub difficulty: DifficultyChoice,
    pub use_selected_section: bool,
    pub preview_mode: bool,
}

impl Default for ReforgeSettings {
    fn default() -> Self {
        Self {
            action: ReforgeAction::AddMore,
            min_count: 3,
            difficulty: DifficultyChoice::Medium,
            use_selected_section: false,
            preview_mode: false,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Local identity that owns notes and sets.
    pub owner_id: OwnerId,
    pub model: String,
    pub timeout_secs: u64,
    pub params: GenerationParams,
    pub generation: GenerationSettings,
    pub reforge: ReforgeSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            owner_id: Uuid::new_v4(),
            model: DEFAULT_MODEL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            params: GenerationParams::default(),
            generation: GenerationSettings::default(),
            reforge: ReforgeSettings::default(),
        }
    }
}

impl Settings {
    /// Decode settings JSON, taking defaults for any missing field.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
