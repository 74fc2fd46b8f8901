//! WASM bindings for document sessions and live flow
//!
//! Results cross the boundary as JSON strings so the JS side gets the same
//! camelCase shapes the Rust API serializes.

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

use crate::command::{CommandResult, DocumentSession};
use crate::config::EngineOptions;
use crate::flow::{LiveFlowController, MeasureStyle, NavKey, RenderSurface};
use crate::layout::PageSize;
use crate::persist::PersistedDocument;
use serde::Serialize;
use serde_json::Value;

/// Initialize panic hook for better error messages
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

fn to_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|err| {
        let failure = CommandResult::failure(format!("Serialization error: {err}"));
        serde_json::to_string(&failure).unwrap_or_default()
    })
}

fn engine_options(json: Option<String>) -> Result<EngineOptions, JsError> {
    match json {
        Some(json) => Ok(EngineOptions::from_json_str(&json)?),
        None => Ok(EngineOptions::default()),
    }
}

/// Convert a JS argument list into JSON values; a non-array is one argument
fn js_args(args: &JsValue) -> Result<Vec<Value>, String> {
    if args.is_undefined() || args.is_null() {
        return Ok(Vec::new());
    }
    let json: String = js_sys::JSON::stringify(args)
        .map_err(|_| "arguments are not serializable".to_string())?
        .into();
    let value: Value = serde_json::from_str(&json).map_err(|err| err.to_string())?;
    Ok(match value {
        Value::Array(values) => values,
        other => vec![other],
    })
}

/// WASM-exposed document session
#[wasm_bindgen]
pub struct WasmSession {
    session: DocumentSession,
    options: EngineOptions,
}

#[wasm_bindgen]
impl WasmSession {
    /// Open a document. `optionsJson` overrides any engine tunables.
    #[wasm_bindgen(constructor)]
    pub fn new(
        content: &str,
        page_size: Option<String>,
        font_size: Option<f32>,
        options_json: Option<String>,
    ) -> Result<WasmSession, JsError> {
        let options = engine_options(options_json)?;
        let page_size = match page_size {
            Some(key) => key.parse::<PageSize>().map_err(|key| {
                JsError::new(&format!("Unknown page size: {key}"))
            })?,
            None => options.layout.default_page_size,
        };
        if let Some(size) = font_size {
            if !options.layout.accepts_font_size(size) {
                return Err(JsError::new(&format!("Font size {size} is out of range")));
            }
        }
        Ok(Self {
            session: DocumentSession::new(content, page_size, font_size, options.layout.clone()),
            options,
        })
    }

    /// Reopen a document saved with `snapshot`. Tunables are not part of
    /// the snapshot, so pass the same `optionsJson` the session was opened with.
    #[wasm_bindgen(js_name = fromSnapshot)]
    pub fn from_snapshot(
        json: &str,
        options_json: Option<String>,
    ) -> Result<WasmSession, JsError> {
        let options = engine_options(options_json)?;
        let document = PersistedDocument::from_json(json)?;
        let session = DocumentSession::from_persisted(&document, options.layout.clone())?;
        Ok(Self { session, options })
    }

    /// Run a named command; `args` is an array of positional arguments.
    /// Always returns a serialized `CommandResult`.
    #[wasm_bindgen(js_name = executeCommand)]
    pub fn execute_command(&mut self, name: &str, args: &JsValue) -> String {
        let result = match js_args(args) {
            Ok(args) => self.session.execute_command(name, &args),
            Err(message) => CommandResult::failure(format!("Invalid arguments: {message}")),
        };
        to_json(&result)
    }

    /// Same as `executeCommand` with the arguments already encoded as JSON
    #[wasm_bindgen(js_name = executeCommandJson)]
    pub fn execute_command_json(&mut self, name: &str, args_json: &str) -> String {
        let result = match serde_json::from_str::<Vec<Value>>(args_json) {
            Ok(args) => self.session.execute_command(name, &args),
            Err(err) => CommandResult::failure(format!("Invalid arguments: {err}")),
        };
        to_json(&result)
    }

    /// Full document state as JSON
    #[wasm_bindgen(js_name = getState)]
    pub fn get_state(&self) -> String {
        to_json(self.session.state())
    }

    #[wasm_bindgen(js_name = getPageCount)]
    pub fn get_page_count(&self) -> usize {
        self.session.state().total_pages()
    }

    /// Content, page size and font size as JSON
    pub fn snapshot(&self) -> Result<String, JsError> {
        Ok(self.session.snapshot().to_json()?)
    }

    /// Start a live flow over the current pages
    #[wasm_bindgen(js_name = liveFlow)]
    pub fn live_flow(&self) -> WasmFlow {
        WasmFlow {
            flow: self.session.live_flow(self.options.flow.clone()),
        }
    }

    /// Fold a live flow back into this document
    pub fn reconcile(&mut self, flow: &WasmFlow) -> String {
        to_json(&self.session.reconcile(&flow.flow))
    }
}

/// Render surface backed by a JS host object.
///
/// The host must provide `heightOf(content, style)`; `attach(style)` and
/// `detach()` are called around each measurement pass when present.
pub struct JsSurface {
    host: JsValue,
    height_of: js_sys::Function,
    attach: Option<js_sys::Function>,
    detach: Option<js_sys::Function>,
    style: JsValue,
}

fn method(host: &JsValue, name: &str) -> Option<js_sys::Function> {
    js_sys::Reflect::get(host, &JsValue::from_str(name))
        .ok()
        .and_then(|f| f.dyn_into::<js_sys::Function>().ok())
}

impl JsSurface {
    pub fn new(host: &JsValue) -> Result<Self, JsError> {
        let height_of =
            method(host, "heightOf").ok_or_else(|| JsError::new("host has no heightOf function"))?;
        Ok(Self {
            host: host.clone(),
            height_of,
            attach: method(host, "attach"),
            detach: method(host, "detach"),
            style: JsValue::NULL,
        })
    }
}

impl RenderSurface for JsSurface {
    fn attach_probe(&mut self, style: &MeasureStyle) {
        self.style = serde_json::to_string(style)
            .ok()
            .and_then(|json| js_sys::JSON::parse(&json).ok())
            .unwrap_or(JsValue::NULL);
        if let Some(attach) = &self.attach {
            if attach.call1(&self.host, &self.style).is_err() {
                log::warn!("measurement host failed to attach");
            }
        }
    }

    fn probe_height(&mut self, content: &str) -> f32 {
        match self
            .height_of
            .call2(&self.host, &JsValue::from_str(content), &self.style)
        {
            Ok(height) => height.as_f64().unwrap_or(0.0) as f32,
            Err(_) => {
                log::warn!("heightOf threw; treating content as fitting");
                0.0
            }
        }
    }

    fn detach_probe(&mut self) {
        if let Some(detach) = &self.detach {
            if detach.call0(&self.host).is_err() {
                log::warn!("measurement host failed to detach");
            }
        }
        self.style = JsValue::NULL;
    }
}

/// WASM-exposed live flow over page surfaces.
///
/// Pages are addressed by 0-based index and offsets are grapheme counts.
#[wasm_bindgen]
pub struct WasmFlow {
    flow: LiveFlowController,
}

#[wasm_bindgen]
impl WasmFlow {
    #[wasm_bindgen(js_name = pageCount)]
    pub fn page_count(&self) -> usize {
        self.flow.len()
    }

    /// Page contents in order, as a JSON array of strings
    pub fn contents(&self) -> String {
        to_json(&self.flow.contents())
    }

    /// Replace one page's content after an edit in its surface
    #[wasm_bindgen(js_name = setContent)]
    pub fn set_content(&mut self, page_index: usize, content: &str) -> bool {
        match self.flow.surface_ids().get(page_index).copied() {
            Some(id) => self.flow.set_content(id, content),
            None => false,
        }
    }

    #[wasm_bindgen(js_name = setFocus)]
    pub fn set_focus(&mut self, page_index: usize, offset: usize) -> bool {
        match self.flow.surface_ids().get(page_index).copied() {
            Some(id) => self.flow.set_focus(id, offset),
            None => false,
        }
    }

    /// 0-based page holding the caret
    #[wasm_bindgen(js_name = focusPage)]
    pub fn focus_page(&self) -> Option<usize> {
        let focus = self.flow.focus()?;
        self.flow.page_number(focus.surface).map(|n| n - 1)
    }

    #[wasm_bindgen(js_name = focusOffset)]
    pub fn focus_offset(&self) -> Option<usize> {
        self.flow.focus().map(|focus| focus.active)
    }

    #[wasm_bindgen(js_name = typeText)]
    pub fn type_text(&mut self, text: &str) -> bool {
        self.flow.type_text(text)
    }

    #[wasm_bindgen(js_name = deleteBackward)]
    pub fn delete_backward(&mut self) -> bool {
        self.flow.delete_backward()
    }

    /// Handle `ArrowUp`, `ArrowDown` or `Tab`; true means the caret moved
    /// to another page and the default action should be suppressed.
    #[wasm_bindgen(js_name = handleKey)]
    pub fn handle_key(&mut self, key: &str) -> bool {
        let key = match key {
            "ArrowUp" => NavKey::ArrowUp,
            "ArrowDown" => NavKey::ArrowDown,
            "Tab" => NavKey::Tab,
            _ => return false,
        };
        self.flow.handle_key(key)
    }

    #[wasm_bindgen(js_name = hasPending)]
    pub fn has_pending(&self) -> bool {
        self.flow.has_pending()
    }

    /// Run due checks against `host`; returns whether any page changed
    pub fn tick(&mut self, host: &JsValue) -> Result<bool, JsError> {
        let mut surface = JsSurface::new(host)?;
        Ok(self.flow.tick(&mut surface).has_changes())
    }

    /// Run checks until nothing is pending; returns whether any page changed
    pub fn settle(&mut self, host: &JsValue) -> Result<bool, JsError> {
        let mut surface = JsSurface::new(host)?;
        Ok(self.flow.settle(&mut surface).has_changes())
    }
}
