// Sound and speech cues. The sequencer talks to an injected `Cues` capability,
// never to a process-wide player.

use serde::{Deserialize, Serialize};

use crate::types::Rarity;

/// Named sound cue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "cue", content = "rarity", rename_all = "snake_case")]
pub enum SoundCue {
    Roll,
    RarityGet(Rarity),
    Cutin,
    SerifAppear,
}

impl SoundCue {
    /// Every cue the host should preload.
    pub const ALL: [SoundCue; 7] = [
        SoundCue::Roll,
        SoundCue::RarityGet(Rarity::Ssr),
        SoundCue::RarityGet(Rarity::Sr),
        SoundCue::RarityGet(Rarity::R),
        SoundCue::RarityGet(Rarity::N),
        SoundCue::Cutin,
        SoundCue::SerifAppear,
    ];

    pub fn asset_path(&self) -> &'static str {
        match self {
            SoundCue::Roll => "/sounds/gacha-roll.mp3",
            SoundCue::RarityGet(Rarity::Ssr) => "/sounds/ssr-get.mp3",
            SoundCue::RarityGet(Rarity::Sr) => "/sounds/sr-get.mp3",
            SoundCue::RarityGet(Rarity::R) => "/sounds/r-get.mp3",
            SoundCue::RarityGet(Rarity::N) => "/sounds/n-get.mp3",
            // No dedicated asset yet; shares the cutin sting.
            SoundCue::Cutin | SoundCue::SerifAppear => "/sounds/cutin.mp3",
        }
    }

    pub fn volume(&self) -> f32 {
        match self {
            SoundCue::Roll => 0.5,
            SoundCue::SerifAppear => 0.4,
            _ => 0.7,
        }
    }
}

/// Side-effect capability for sound and speech. Muted calls are no-ops.
pub trait Cues {
    fn play(&mut self, cue: SoundCue);
    fn speak(&mut self, text: &str);
    fn set_muted(&mut self, muted: bool);
}

/// Strip quote brackets before speaking. `None` if nothing is left to say.
pub fn speech_text(line: &str) -> Option<String> {
    let cleaned: String = line.chars().filter(|c| !matches!(c, '「' | '」')).collect();
    let trimmed = cleaned.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// A cue the host must carry out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CueEvent {
    Play {
        #[serde(flatten)]
        cue: SoundCue,
        asset: String,
        volume: f32,
    },
    Speak {
        text: String,
    },
}

/// Collects cues so they can be handed to JS in one batch.
#[derive(Debug, Default)]
pub struct CueBuffer {
    events: Vec<CueEvent>,
    muted: bool,
}

impl CueBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    pub fn events(&self) -> &[CueEvent] {
        &self.events
    }

    pub fn drain(&mut self) -> Vec<CueEvent> {
        std::mem::take(&mut self.events)
    }
}

impl Cues for CueBuffer {
    fn play(&mut self, cue: SoundCue) {
        if self.muted {
            return;
        }
        self.events.push(CueEvent::Play {
            cue,
            asset: cue.asset_path().to_string(),
            volume: cue.volume(),
        });
    }

    fn speak(&mut self, text: &str) {
        if self.muted {
            return;
        }
        self.events.push(CueEvent::Speak {
            text: text.to_string(),
        });
    }

    fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }
}
