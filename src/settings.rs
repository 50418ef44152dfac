// Settings store: gacha mode, custom character fields and onboarding flags.
// Persisted as JSON on every change. Malformed stored data is replaced by defaults.

use std::collections::HashMap;

use crate::error::GachaError;
use crate::types::*;

pub const STORAGE_KEY: &str = "gacha-camera-settings";
pub const FIRST_LAUNCH_KEY: &str = "gacha-camera-first-launch";

/// Durable string key/value storage.
pub trait KeyValueStorage {
    fn get(&self, key: &str) -> Result<Option<String>, GachaError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), GachaError>;
}

/// In-memory storage for tests and hosts without durable storage.
#[derive(Debug, Default, Clone)]
pub struct MemoryStorage {
    items: HashMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_item(mut self, key: &str, value: &str) -> Self {
        self.items.insert(key.to_string(), value.to_string());
        self
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, GachaError> {
        Ok(self.items.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), GachaError> {
        self.items.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// `window.localStorage`.
#[derive(Debug, Default, Clone, Copy)]
pub struct BrowserStorage;

impl BrowserStorage {
    fn storage() -> Result<web_sys::Storage, GachaError> {
        web_sys::window()
            .ok_or_else(|| GachaError::Storage("no window".to_string()))?
            .local_storage()
            .map_err(|e| GachaError::Storage(format!("{:?}", e)))?
            .ok_or_else(|| GachaError::Storage("localStorage unavailable".to_string()))
    }
}

impl KeyValueStorage for BrowserStorage {
    fn get(&self, key: &str) -> Result<Option<String>, GachaError> {
        Self::storage()?
            .get_item(key)
            .map_err(|e| GachaError::Storage(format!("{:?}", e)))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), GachaError> {
        Self::storage()?
            .set_item(key, value)
            .map_err(|e| GachaError::Storage(format!("{:?}", e)))
    }
}

fn parse_settings(raw: &str) -> Result<GachaSettings, GachaError> {
    Ok(serde_json::from_str(raw)?)
}

pub struct SettingsStore {
    storage: Box<dyn KeyValueStorage>,
    settings: GachaSettings,
    first_launch: bool,
    show_welcome: bool,
    show_coach_mark: bool,
}

impl SettingsStore {
    /// Load settings, falling back to defaults for anything missing or malformed.
    pub fn load(storage: Box<dyn KeyValueStorage>) -> Self {
        let settings = match storage.get(STORAGE_KEY) {
            Ok(Some(raw)) => parse_settings(&raw).unwrap_or_else(|err| {
                log::warn!("Discarding stored settings: {}", err);
                GachaSettings::default()
            }),
            Ok(None) => GachaSettings::default(),
            Err(err) => {
                log::warn!("Settings unreadable, using defaults: {}", err);
                GachaSettings::default()
            }
        };

        let first_launch = matches!(storage.get(FIRST_LAUNCH_KEY), Ok(None));
        let show_welcome = !settings.custom.is_customized();

        SettingsStore {
            storage,
            settings,
            first_launch,
            show_welcome,
            show_coach_mark: false,
        }
    }

    pub fn settings(&self) -> &GachaSettings {
        &self.settings
    }

    pub fn is_custom_mode(&self) -> bool {
        self.settings.mode == GachaMode::Custom
    }

    pub fn is_valid_custom_settings(&self) -> bool {
        self.settings.custom.is_valid()
    }

    /// Custom settings to substitute for the random draw, if enabled and valid.
    pub fn active_custom(&self) -> Option<&CustomSettings> {
        self.settings.active_custom()
    }

    pub fn set_mode(&mut self, mode: GachaMode) {
        self.update(|s| s.mode = mode);
    }

    pub fn set_rarity(&mut self, rarity: Rarity) {
        self.update(|s| s.custom.rarity = rarity);
    }

    pub fn set_name(&mut self, name: &str) {
        self.update(|s| s.custom.name = name.to_string());
    }

    pub fn set_serifs(&mut self, serifs: Vec<String>) {
        self.update(|s| s.custom.serifs = serifs);
    }

    pub fn is_first_launch(&self) -> bool {
        self.first_launch
    }

    pub fn complete_first_launch(&mut self) {
        if let Err(err) = self.storage.set(FIRST_LAUNCH_KEY, "done") {
            log::warn!("Could not record first launch: {}", err);
        }
        self.first_launch = false;
    }

    pub fn show_welcome(&self) -> bool {
        self.show_welcome
    }

    pub fn show_coach_mark(&self) -> bool {
        self.show_coach_mark
    }

    /// Close the welcome modal; point at the settings button if nothing was customised yet.
    pub fn complete_welcome(&mut self) {
        self.show_welcome = false;
        if !self.settings.custom.is_customized() {
            self.show_coach_mark = true;
        }
    }

    /// Hide the coach mark for this session only.
    pub fn dismiss_coach_mark(&mut self) {
        self.show_coach_mark = false;
    }

    fn update(&mut self, f: impl FnOnce(&mut GachaSettings)) {
        f(&mut self.settings);
        if let Err(err) = self.persist() {
            log::warn!("Could not persist settings: {}", err);
        }
    }

    fn persist(&mut self) -> Result<(), GachaError> {
        let json = serde_json::to_string(&self.settings)?;
        self.storage.set(STORAGE_KEY, &json)
    }
}
