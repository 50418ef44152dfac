// Summon timeline: the closed phase set, per-phase durations and layer visibility.
// Tier-dependent timing (flash length, explosion) is table data, never inline branching.

use serde::{Deserialize, Serialize};

use crate::types::{Rarity, ResultEnding};

/// Animation phase. Declaration order is timeline order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnimationPhase {
    Idle,
    Shatter,
    Flash,
    Explosion,
    Effect,
    Serif,
    #[serde(rename = "rarity")]
    RarityBadge,
    #[serde(rename = "name")]
    NameReveal,
    #[serde(rename = "result")]
    ResultCard,
    Fadeout,
}

/// One value per rarity tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierTable<T> {
    #[serde(rename = "N")]
    pub n: T,
    #[serde(rename = "R")]
    pub r: T,
    #[serde(rename = "SR")]
    pub sr: T,
    #[serde(rename = "SSR")]
    pub ssr: T,
}

impl<T> TierTable<T> {
    pub fn get(&self, rarity: Rarity) -> &T {
        match rarity {
            Rarity::N => &self.n,
            Rarity::R => &self.r,
            Rarity::Sr => &self.sr,
            Rarity::Ssr => &self.ssr,
        }
    }
}

/// Phase durations in milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineConfig {
    #[serde(default = "default_shatter_ms")]
    pub shatter_ms: u32,
    #[serde(default = "default_flash_ms")]
    pub flash_ms: TierTable<u32>,
    /// `None` skips the explosion phase for that tier.
    #[serde(default = "default_explosion_ms")]
    pub explosion_ms: TierTable<Option<u32>>,
    #[serde(default = "default_effect_ms")]
    pub effect_ms: u32,
    /// Time each serif line stays on screen before the next one.
    #[serde(default = "default_serif_per_line_ms")]
    pub serif_per_line_ms: u32,
    /// Extra hold after the last serif line.
    #[serde(default = "default_serif_buffer_ms")]
    pub serif_buffer_ms: u32,
    #[serde(default = "default_rarity_ms")]
    pub rarity_ms: u32,
    #[serde(default = "default_name_ms")]
    pub name_ms: u32,
    /// Result hold on the auto-advance path.
    #[serde(default = "default_result_hold_ms")]
    pub result_hold_ms: u32,
    #[serde(default = "default_fadeout_ms")]
    pub fadeout_ms: u32,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        TimelineConfig {
            shatter_ms: default_shatter_ms(),
            flash_ms: default_flash_ms(),
            explosion_ms: default_explosion_ms(),
            effect_ms: default_effect_ms(),
            serif_per_line_ms: default_serif_per_line_ms(),
            serif_buffer_ms: default_serif_buffer_ms(),
            rarity_ms: default_rarity_ms(),
            name_ms: default_name_ms(),
            result_hold_ms: default_result_hold_ms(),
            fadeout_ms: default_fadeout_ms(),
        }
    }
}

fn default_shatter_ms() -> u32 {
    800
}

fn default_flash_ms() -> TierTable<u32> {
    TierTable {
        n: 100,
        r: 150,
        sr: 200,
        ssr: 300,
    }
}

fn default_explosion_ms() -> TierTable<Option<u32>> {
    TierTable {
        n: None,
        r: None,
        sr: None,
        ssr: Some(1500),
    }
}

fn default_effect_ms() -> u32 {
    1000
}

fn default_serif_per_line_ms() -> u32 {
    2500
}

fn default_serif_buffer_ms() -> u32 {
    500
}

fn default_rarity_ms() -> u32 {
    1200
}

fn default_name_ms() -> u32 {
    1500
}

fn default_result_hold_ms() -> u32 {
    2500
}

fn default_fadeout_ms() -> u32 {
    500
}

impl TimelineConfig {
    /// Total serif phase length: `per_line * count + buffer`, saturating at `u32::MAX`.
    pub fn serif_duration_ms(&self, serif_count: usize) -> u32 {
        let count = u32::try_from(serif_count).unwrap_or(u32::MAX);
        self.serif_per_line_ms
            .saturating_mul(count)
            .saturating_add(self.serif_buffer_ms)
    }
}

/// A planned phase. `duration_ms == None` holds until an external action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseStep {
    pub phase: AnimationPhase,
    pub duration_ms: Option<u32>,
}

impl PhaseStep {
    fn timed(phase: AnimationPhase, duration_ms: u32) -> Self {
        PhaseStep {
            phase,
            duration_ms: Some(duration_ms),
        }
    }
}

/// Plan the full timeline for one result.
pub fn plan(
    config: &TimelineConfig,
    rarity: Rarity,
    serif_count: usize,
    ending: ResultEnding,
) -> Vec<PhaseStep> {
    let mut steps = vec![
        PhaseStep::timed(AnimationPhase::Shatter, config.shatter_ms),
        PhaseStep::timed(AnimationPhase::Flash, *config.flash_ms.get(rarity)),
    ];

    if let Some(ms) = *config.explosion_ms.get(rarity) {
        steps.push(PhaseStep::timed(AnimationPhase::Explosion, ms));
    }

    steps.extend([
        PhaseStep::timed(AnimationPhase::Effect, config.effect_ms),
        PhaseStep::timed(AnimationPhase::Serif, config.serif_duration_ms(serif_count)),
        PhaseStep::timed(AnimationPhase::RarityBadge, config.rarity_ms),
        PhaseStep::timed(AnimationPhase::NameReveal, config.name_ms),
    ]);

    match ending {
        ResultEnding::Pause => steps.push(PhaseStep {
            phase: AnimationPhase::ResultCard,
            duration_ms: None,
        }),
        ResultEnding::AutoAdvance => steps.extend([
            PhaseStep::timed(AnimationPhase::ResultCard, config.result_hold_ms),
            PhaseStep::timed(AnimationPhase::Fadeout, config.fadeout_ms),
        ]),
    }

    steps
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EffectIntensity {
    #[default]
    Hidden,
    Full,
    /// Toned down behind the result card.
    Subdued,
}

/// Which presentational layers the renderer should mount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct LayerVisibility {
    pub shatter: bool,
    pub flash: bool,
    pub explosion: bool,
    pub effect: EffectIntensity,
    pub serif: bool,
    pub rarity_badge: bool,
    pub name: bool,
    pub result_actions: bool,
}

/// A layer introduced at `intro` stays up until the fadeout.
fn persists_from(phase: AnimationPhase, intro: AnimationPhase) -> bool {
    phase >= intro && phase != AnimationPhase::Fadeout
}

impl LayerVisibility {
    pub fn for_phase(phase: AnimationPhase, ending: ResultEnding) -> Self {
        let effect = if !persists_from(phase, AnimationPhase::Effect) {
            EffectIntensity::Hidden
        } else if phase == AnimationPhase::ResultCard {
            EffectIntensity::Subdued
        } else {
            EffectIntensity::Full
        };

        LayerVisibility {
            shatter: phase == AnimationPhase::Shatter,
            flash: phase == AnimationPhase::Flash,
            explosion: phase == AnimationPhase::Explosion,
            effect,
            serif: persists_from(phase, AnimationPhase::Serif),
            rarity_badge: persists_from(phase, AnimationPhase::RarityBadge),
            name: persists_from(phase, AnimationPhase::NameReveal),
            result_actions: phase == AnimationPhase::ResultCard && ending == ResultEnding::Pause,
        }
    }
}
