//! Browser tests. Run with `wasm-pack test --headless --firefox`.
#![cfg(target_arch = "wasm32")]

use gacha_core::*;
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

#[wasm_bindgen_test]
fn browser_storage_round_trips() {
    let mut storage = BrowserStorage;
    storage.set("gacha-core-test", "value").unwrap();
    assert_eq!(
        storage.get("gacha-core-test").unwrap().as_deref(),
        Some("value")
    );
}

#[wasm_bindgen_test]
fn settings_survive_reload() {
    let mut store = SettingsStore::load(Box::new(BrowserStorage));
    store.set_mode(GachaMode::Custom);
    store.set_name("Browser");
    store.set_serifs(vec!["hello".to_string()]);

    let reloaded = SettingsStore::load(Box::new(BrowserStorage));
    assert_eq!(reloaded.settings().custom.name, "Browser");
    assert!(reloaded.active_custom().is_some());
}

#[wasm_bindgen_test]
fn engine_from_json_config() {
    let mut engine = Engine::new(r#"{"seed": 3, "result_ending": "auto_advance"}"#).unwrap();
    let commands = engine.start_camera().unwrap();
    assert!(commands.contains("request_camera"));

    let idle: serde_json::Value = serde_json::from_str(&engine.tap().unwrap()).unwrap();
    assert_eq!(idle["phase"], "idle");
}

#[wasm_bindgen_test]
fn invalid_weights_rejected() {
    let config = r#"{"rarity_table": {"SSR": 0.5, "SR": 0.5, "R": 0.5, "N": 0.5}}"#;
    assert!(Engine::new(config).is_err());
}
