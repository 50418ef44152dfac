// gacha_core: Gacha Camera Rust/WASM engine.
// All decisions live here; JS runs the timers, plays the cues and mounts the layers.

mod capture;
mod cues;
mod error;
mod roster;
mod selector;
mod sequencer;
mod settings;
mod share;
mod timeline;
mod types;

use serde::{Deserialize, Serialize};
use wasm_bindgen::prelude::*;

pub use capture::{
    CameraRequest, CaptureCommand, CaptureManager, FacingMode, MediaKind, SourceMode, StreamId,
};
pub use cues::{speech_text, CueBuffer, CueEvent, Cues, SoundCue};
pub use error::GachaError;
pub use roster::default_characters;
pub use selector::{
    characters_by_rarity, custom_character, determine_rarity, select_character, Gacha, PullOptions,
};
pub use sequencer::{Advance, RunToken, Sequencer, TimerRequest};
pub use settings::{
    BrowserStorage, KeyValueStorage, MemoryStorage, SettingsStore, FIRST_LAUNCH_KEY, STORAGE_KEY,
};
pub use share::ShareCard;
pub use timeline::{
    plan, AnimationPhase, EffectIntensity, LayerVisibility, PhaseStep, TierTable, TimelineConfig,
};
pub use types::*;

/// Initialize panic hook and console logging.
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();

    console_log::init_with_level(log::Level::Debug).ok();
    log::info!("gacha_core initialized");
}

/// Everything the host needs after a call: what to draw, what to play, when to call back.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameUpdate {
    pub phase: AnimationPhase,
    pub layers: LayerVisibility,
    pub is_playing: bool,
    pub result: Option<GachaResult>,
    pub rarity: Option<RarityInfo>,
    pub current_serif: Option<usize>,
    pub cues: Vec<CueEvent>,
    /// `None` when the call did not touch the timeline.
    pub advance: Option<Advance>,
}

/// Settings plus onboarding flags, as one blob for the settings UI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettingsView {
    pub settings: GachaSettings,
    pub is_custom_mode: bool,
    pub is_valid_custom_settings: bool,
    pub is_first_launch: bool,
    pub show_welcome: bool,
    pub show_coach_mark: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureView {
    pub mode: SourceMode,
    pub facing: FacingMode,
    pub is_ready: bool,
    pub error: Option<String>,
}

/// Share card plus the fallback intent URLs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShareView {
    #[serde(flatten)]
    pub card: ShareCard,
    pub x_url: String,
    pub line_url: String,
}

/// Main engine interface exposed to JavaScript.
/// Batch interface to minimize JS↔WASM crossings.
#[wasm_bindgen]
pub struct Engine {
    gacha: Gacha,
    sequencer: Sequencer<CueBuffer>,
    settings: SettingsStore,
    capture: CaptureManager,
}

impl Engine {
    pub fn with_storage(
        config: EngineConfig,
        storage: Box<dyn KeyValueStorage>,
    ) -> Result<Engine, GachaError> {
        Ok(Engine {
            gacha: Gacha::new(config.rarity_table, default_characters(), config.seed)?,
            sequencer: Sequencer::new(CueBuffer::new(), config.timeline, config.result_ending),
            settings: SettingsStore::load(storage),
            capture: CaptureManager::new(FacingMode::default()),
        })
    }

    pub fn settings_store(&self) -> &SettingsStore {
        &self.settings
    }

    pub fn settings_store_mut(&mut self) -> &mut SettingsStore {
        &mut self.settings
    }

    pub fn capture(&self) -> &CaptureManager {
        &self.capture
    }

    pub fn capture_mut(&mut self) -> &mut CaptureManager {
        &mut self.capture
    }

    /// Tap handler. Ignored while nothing is on screen or a sequence is playing.
    pub fn pull_at(&mut self, now: Timestamp) -> FrameUpdate {
        if !self.capture.is_ready() {
            log::debug!("Pull ignored: no capture source");
            return self.frame(None);
        }

        let options = PullOptions {
            custom: self.settings.active_custom(),
        };
        let Some(result) = self.gacha.pull(options, now).cloned() else {
            return self.frame(None);
        };

        let advance = self.sequencer.start(result);
        self.frame(Some(advance))
    }

    /// A host timer fired.
    pub fn advance(&mut self, token: RunToken) -> FrameUpdate {
        let advance = self.sequencer.on_timer(token);
        if advance == Advance::Completed {
            self.gacha.reset();
        }
        self.frame(Some(advance))
    }

    /// Leave the result card and pull again straight away.
    /// Reports `Completed` when the follow-up pull is ignored.
    pub fn retry_at(&mut self, now: Timestamp) -> FrameUpdate {
        if !self.sequencer.complete() {
            return self.frame(None);
        }
        self.gacha.reset();
        let mut update = self.pull_at(now);
        if update.advance.is_none() {
            update.advance = Some(Advance::Completed);
        }
        update
    }

    /// Leave the result card and return to idle.
    pub fn finish(&mut self) -> FrameUpdate {
        if !self.sequencer.complete() {
            return self.frame(None);
        }
        self.gacha.reset();
        self.frame(Some(Advance::Completed))
    }

    /// Abandon the active sequence. Pending timers become stale.
    pub fn abort(&mut self) -> FrameUpdate {
        self.sequencer.cancel();
        self.gacha.reset();
        self.frame(None)
    }

    pub fn frame_snapshot(&mut self) -> FrameUpdate {
        self.frame(None)
    }

    pub fn settings_view(&self) -> SettingsView {
        SettingsView {
            settings: self.settings.settings().clone(),
            is_custom_mode: self.settings.is_custom_mode(),
            is_valid_custom_settings: self.settings.is_valid_custom_settings(),
            is_first_launch: self.settings.is_first_launch(),
            show_welcome: self.settings.show_welcome(),
            show_coach_mark: self.settings.show_coach_mark(),
        }
    }

    pub fn capture_view(&self) -> CaptureView {
        CaptureView {
            mode: self.capture.mode(),
            facing: self.capture.facing(),
            is_ready: self.capture.is_ready(),
            error: self.capture.last_error().map(str::to_string),
        }
    }

    /// Share data for the result on screen.
    pub fn share_view(&self, page_url: &str) -> Result<Option<ShareView>, GachaError> {
        let Some(result) = self.sequencer.result() else {
            return Ok(None);
        };
        let card = ShareCard::for_result(result, page_url);
        Ok(Some(ShareView {
            x_url: card.x_intent_url()?,
            line_url: card.line_share_url()?,
            card,
        }))
    }

    fn frame(&mut self, advance: Option<Advance>) -> FrameUpdate {
        let result = self.sequencer.result().cloned();
        FrameUpdate {
            phase: self.sequencer.phase(),
            layers: self.sequencer.layers(),
            is_playing: self.gacha.is_playing(),
            rarity: result.as_ref().map(|r| r.character.rarity.into()),
            result,
            current_serif: self.sequencer.current_serif(),
            cues: self.sequencer.cues_mut().drain(),
            advance,
        }
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<String, JsValue> {
    serde_json::to_string(value)
        .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
}

fn to_js_error(err: GachaError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

fn millis(now_ms: f64) -> Timestamp {
    Timestamp::from_millis(now_ms.max(0.0) as u64)
}

#[wasm_bindgen]
impl Engine {
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: &str) -> Result<Engine, JsValue> {
        let config = EngineConfig::from_json(config_json).map_err(to_js_error)?;
        Engine::with_storage(config, Box::new(BrowserStorage)).map_err(to_js_error)
    }

    /// Pull at the current wall-clock time.
    pub fn tap(&mut self) -> Result<String, JsValue> {
        self.pull(js_sys::Date::now())
    }

    pub fn pull(&mut self, now_ms: f64) -> Result<String, JsValue> {
        let update = self.pull_at(millis(now_ms));
        to_json(&update)
    }

    pub fn on_timer(&mut self, token: u64) -> Result<String, JsValue> {
        let update = self.advance(RunToken::from_raw(token));
        to_json(&update)
    }

    pub fn retry(&mut self, now_ms: f64) -> Result<String, JsValue> {
        let update = self.retry_at(millis(now_ms));
        to_json(&update)
    }

    pub fn complete(&mut self) -> Result<String, JsValue> {
        let update = self.finish();
        to_json(&update)
    }

    pub fn cancel(&mut self) -> Result<String, JsValue> {
        let update = self.abort();
        to_json(&update)
    }

    pub fn snapshot(&mut self) -> Result<String, JsValue> {
        let update = self.frame_snapshot();
        to_json(&update)
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.sequencer.set_muted(muted);
    }

    pub fn is_muted(&self) -> bool {
        self.sequencer.cues().is_muted()
    }

    /// Sound assets to preload: `[{ cue, rarity?, asset, volume }]`.
    pub fn sound_catalog() -> Result<String, JsValue> {
        let catalog: Vec<CueEvent> = SoundCue::ALL
            .iter()
            .map(|cue| CueEvent::Play {
                cue: *cue,
                asset: cue.asset_path().to_string(),
                volume: cue.volume(),
            })
            .collect();
        to_json(&catalog)
    }

    /// Share data as JSON, or `null` when no result is on screen.
    pub fn share(&self, page_url: &str) -> Result<String, JsValue> {
        let view = self.share_view(page_url).map_err(to_js_error)?;
        to_json(&view)
    }

    /// Screen capture for sharing failed on the host side.
    pub fn report_export_failure(&self, message: &str) {
        log::warn!("Export failed: {}", message);
    }

    pub fn settings(&self) -> Result<String, JsValue> {
        to_json(&self.settings_view())
    }

    pub fn set_mode(&mut self, mode: &str) -> Result<String, JsValue> {
        let mode: GachaMode = serde_json::from_value(serde_json::Value::String(mode.to_string()))
            .map_err(|e| JsValue::from_str(&format!("Invalid mode: {}", e)))?;
        self.settings.set_mode(mode);
        self.settings()
    }

    pub fn set_rarity(&mut self, rarity: &str) -> Result<String, JsValue> {
        let rarity: Rarity = rarity.parse().map_err(to_js_error)?;
        self.settings.set_rarity(rarity);
        self.settings()
    }

    pub fn set_name(&mut self, name: &str) -> Result<String, JsValue> {
        self.settings.set_name(name);
        self.settings()
    }

    /// `serifs_json` is a JSON array of strings.
    pub fn set_serifs(&mut self, serifs_json: &str) -> Result<String, JsValue> {
        let serifs: Vec<String> = serde_json::from_str(serifs_json)
            .map_err(|e| JsValue::from_str(&format!("Invalid serifs: {}", e)))?;
        self.settings.set_serifs(serifs);
        self.settings()
    }

    pub fn complete_welcome(&mut self) -> Result<String, JsValue> {
        self.settings.complete_welcome();
        self.settings()
    }

    pub fn dismiss_coach_mark(&mut self) -> Result<String, JsValue> {
        self.settings.dismiss_coach_mark();
        self.settings()
    }

    pub fn complete_first_launch(&mut self) -> Result<String, JsValue> {
        self.settings.complete_first_launch();
        self.settings()
    }

    pub fn capture_state(&self) -> Result<String, JsValue> {
        to_json(&self.capture_view())
    }

    pub fn start_camera(&mut self) -> Result<String, JsValue> {
        to_json(&self.capture.start_camera())
    }

    pub fn camera_acquired(&mut self, request_id: u32, stream_id: u32) -> Result<String, JsValue> {
        to_json(&self.capture.camera_acquired(request_id, StreamId(stream_id)))
    }

    pub fn camera_failed(&mut self, request_id: u32, message: &str) -> Result<String, JsValue> {
        self.capture.camera_failed(request_id, message);
        self.capture_state()
    }

    pub fn switch_facing(&mut self) -> Result<String, JsValue> {
        to_json(&self.capture.switch_facing())
    }

    /// Rejected files come back as a revoke command; the reason is in `capture_state`.
    pub fn load_file(&mut self, url: &str, mime: &str) -> Result<String, JsValue> {
        to_json(&self.capture.load_file(url, mime))
    }

    pub fn switch_to_camera(&mut self) -> Result<String, JsValue> {
        to_json(&self.capture.switch_to_camera())
    }

    pub fn teardown(&mut self) -> Result<String, JsValue> {
        self.sequencer.cancel();
        self.gacha.reset();
        to_json(&self.capture.teardown())
    }
}
