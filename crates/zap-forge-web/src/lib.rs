//! `wasm-bindgen` exports that let a design-tool plugin run the collider
//! export in-process.
//!
//! ```ignore
//! import init, { forge_init, forge_export } from "./zap_forge_web.js";
//! await init();
//! forge_init("info");
//! const json = forge_export(sceneJson, JSON.stringify({ pixelsPerUnit: 32 }),
//!     (kind, message, done, total) => ui.post({ kind, message, done, total }));
//! ```

use wasm_bindgen::prelude::*;
use zap_forge::{export_document, ExportConfig, ExportEvent, ExportObserver, SceneTree};

/// Install the panic hook and console logger. `level` is a `log` level name
/// ("error", "warn", "info", "debug", "trace"); defaults to info.
#[wasm_bindgen]
pub fn forge_init(level: Option<String>) {
    console_error_panic_hook::set_once();
    let level = level
        .as_deref()
        .and_then(|name| name.parse::<log::Level>().ok())
        .unwrap_or(log::Level::Info);
    let _ = console_log::init_with_level(level);
    log::info!("zap-forge {}: initialized", env!("CARGO_PKG_VERSION"));
}

/// Export the scene dump to document JSON.
///
/// Every event is forwarded to `on_event(kind, message, done, total)`.
/// Run-fatal errors reject with the error message.
#[wasm_bindgen]
pub fn forge_export(
    scene_json: &str,
    config_json: Option<String>,
    on_event: Option<js_sys::Function>,
) -> Result<String, JsValue> {
    let mut observer = JsObserver { callback: on_event };

    let tree = SceneTree::from_json(scene_json).map_err(|e| observer.fail(e))?;
    let mut config = match config_json.as_deref().map(str::trim) {
        Some(json) if !json.is_empty() => ExportConfig::from_json(json).map_err(|e| observer.fail(e))?,
        _ => ExportConfig::default(),
    };
    if config.timestamp.is_none() {
        config.timestamp = Some(String::from(js_sys::Date::new_0().to_iso_string()));
    }

    let document = export_document(&tree, &config, &mut observer).map_err(|e| JsValue::from_str(&e.to_string()))?;
    document.to_json().map_err(|e| observer.fail(e))
}

#[wasm_bindgen]
pub fn forge_version() -> String {
    format!("{} (format {})", env!("CARGO_PKG_VERSION"), zap_forge::FORMAT_VERSION)
}

/// Forwards export events to an optional JS callback.
struct JsObserver {
    callback: Option<js_sys::Function>,
}

impl JsObserver {
    /// Report a failure that happened outside `export_document`.
    fn fail(&mut self, err: impl std::fmt::Display) -> JsValue {
        let message = err.to_string();
        log::error!("{}", message);
        self.on_event(&ExportEvent::Error(message.clone()));
        JsValue::from_str(&message)
    }
}

impl ExportObserver for JsObserver {
    fn on_event(&mut self, event: &ExportEvent) {
        let Some(callback) = &self.callback else { return };
        let (done, total) = match event {
            ExportEvent::Progress { done, total, .. } => (*done as f64, *total as f64),
            _ => (0.0, 0.0),
        };
        let args = js_sys::Array::new();
        args.push(&JsValue::from_str(event.kind()));
        args.push(&JsValue::from_str(&event.message()));
        args.push(&JsValue::from_f64(done));
        args.push(&JsValue::from_f64(total));
        // A throwing callback does not abort the export.
        if let Err(err) = callback.apply(&JsValue::NULL, &args) {
            log::warn!("progress callback threw: {:?}", err);
        }
    }
}
