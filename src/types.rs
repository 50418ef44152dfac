// Strong typing over strings. Rarity tiers, characters, draw results and settings.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::GachaError;
use crate::timeline::TimelineConfig;

/// Wall-clock timestamp in milliseconds since the Unix epoch. Newtype for type safety.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub struct Timestamp(u64);

impl Timestamp {
    pub fn from_millis(ms: u64) -> Self {
        Timestamp(ms)
    }

    pub fn as_millis(&self) -> u64 {
        self.0
    }
}

/// Rarity tier, ordered from common to rare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Rarity {
    N,
    R,
    #[serde(rename = "SR")]
    Sr,
    #[serde(rename = "SSR")]
    Ssr,
}

impl Rarity {
    /// All tiers, commonest first.
    pub const ALL: [Rarity; 4] = [Rarity::N, Rarity::R, Rarity::Sr, Rarity::Ssr];

    /// Order used for the cumulative draw (rarest first).
    pub const DRAW_ORDER: [Rarity; 4] = [Rarity::Ssr, Rarity::Sr, Rarity::R, Rarity::N];

    pub fn label(&self) -> &'static str {
        match self {
            Rarity::N => "N",
            Rarity::R => "R",
            Rarity::Sr => "SR",
            Rarity::Ssr => "SSR",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            Rarity::N => "⚪",
            Rarity::R => "💎",
            Rarity::Sr => "✨",
            Rarity::Ssr => "🌈",
        }
    }

    /// CSS color for the glow behind the badge and name.
    pub fn glow_color(&self) -> &'static str {
        match self {
            Rarity::N => "rgba(255, 255, 255, 0.4)",
            Rarity::R => "rgba(59, 130, 246, 0.6)",
            Rarity::Sr => "rgba(255, 200, 0, 0.6)",
            Rarity::Ssr => "rgba(255, 215, 0, 0.8)",
        }
    }
}

impl fmt::Display for Rarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Rarity {
    type Err = GachaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Rarity::ALL
            .into_iter()
            .find(|r| r.label() == s)
            .ok_or_else(|| GachaError::InvalidConfig(format!("unknown rarity '{}'", s)))
    }
}

/// Display metadata for a tier, handed to the renderer as one blob.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RarityInfo {
    pub rarity: Rarity,
    pub label: String,
    pub emoji: String,
    pub glow_color: String,
}

impl From<Rarity> for RarityInfo {
    fn from(rarity: Rarity) -> Self {
        RarityInfo {
            rarity,
            label: rarity.label().to_string(),
            emoji: rarity.emoji().to_string(),
            glow_color: rarity.glow_color().to_string(),
        }
    }
}

/// Draw weights per tier. Must sum to 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RarityTable {
    #[serde(rename = "SSR", default = "default_ssr_rate")]
    pub ssr: f64,
    #[serde(rename = "SR", default = "default_sr_rate")]
    pub sr: f64,
    #[serde(rename = "R", default = "default_r_rate")]
    pub r: f64,
    #[serde(rename = "N", default = "default_n_rate")]
    pub n: f64,
}

const WEIGHT_TOLERANCE: f64 = 1e-6;

impl RarityTable {
    pub fn weight(&self, rarity: Rarity) -> f64 {
        match rarity {
            Rarity::Ssr => self.ssr,
            Rarity::Sr => self.sr,
            Rarity::R => self.r,
            Rarity::N => self.n,
        }
    }

    pub fn validate(&self) -> Result<(), GachaError> {
        let weights = [self.ssr, self.sr, self.r, self.n];
        let sum: f64 = weights.iter().sum();
        if weights.iter().any(|w| !w.is_finite() || *w < 0.0)
            || (sum - 1.0).abs() > WEIGHT_TOLERANCE
        {
            return Err(GachaError::InvalidWeights { sum });
        }
        Ok(())
    }
}

impl Default for RarityTable {
    fn default() -> Self {
        RarityTable {
            ssr: default_ssr_rate(),
            sr: default_sr_rate(),
            r: default_r_rate(),
            n: default_n_rate(),
        }
    }
}

fn default_ssr_rate() -> f64 {
    0.03
}

fn default_sr_rate() -> f64 {
    0.12
}

fn default_r_rate() -> f64 {
    0.35
}

fn default_n_rate() -> f64 {
    0.50
}

/// A drawable character. Immutable once drawn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Character {
    pub id: String,
    pub name: String,
    pub rarity: Rarity,
    /// Lines spoken in order.
    pub serifs: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Outcome of one pull. Discarded when the sequence completes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GachaResult {
    pub character: Character,
    pub timestamp: Timestamp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum GachaMode {
    #[default]
    Random,
    Custom,
}

/// User-authored override for the random draw.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomSettings {
    pub rarity: Rarity,
    pub name: String,
    pub serifs: Vec<String>,
}

impl CustomSettings {
    /// A non-blank name and at least one non-blank serif line.
    pub fn is_valid(&self) -> bool {
        !self.name.trim().is_empty() && self.serifs.iter().any(|s| !s.trim().is_empty())
    }

    /// Whether the user has touched the name or the serif lines.
    pub fn is_customized(&self) -> bool {
        let default = CustomSettings::default();
        self.name != default.name || self.serifs != default.serifs
    }
}

impl Default for CustomSettings {
    fn default() -> Self {
        CustomSettings {
            rarity: Rarity::Ssr,
            name: String::new(),
            serifs: vec![String::new()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct GachaSettings {
    pub mode: GachaMode,
    #[serde(rename = "customSettings")]
    pub custom: CustomSettings,
}

impl GachaSettings {
    /// Custom settings to draw with, if custom mode is on and the fields are valid.
    pub fn active_custom(&self) -> Option<&CustomSettings> {
        (self.mode == GachaMode::Custom && self.custom.is_valid()).then_some(&self.custom)
    }
}

/// What happens when the sequence reaches the result card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ResultEnding {
    /// Hold the result until an explicit retry or complete.
    #[default]
    Pause,
    /// Hold the result briefly, then fade out and complete.
    AutoAdvance,
}

/// Engine configuration passed from JS.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct EngineConfig {
    #[serde(default)]
    pub rarity_table: RarityTable,
    #[serde(default)]
    pub timeline: TimelineConfig,
    #[serde(default)]
    pub result_ending: ResultEnding,
    /// Fixed RNG seed for reproducible draws.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl EngineConfig {
    pub fn from_json(json: &str) -> Result<Self, GachaError> {
        let config: EngineConfig = serde_json::from_str(json)
            .map_err(|e| GachaError::InvalidConfig(e.to_string()))?;
        config.rarity_table.validate()?;
        Ok(config)
    }
}
