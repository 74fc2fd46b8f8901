//! Browser-side checks for the WASM bindings

#![cfg(target_arch = "wasm32")]

use page_flow::{WasmFlow, WasmSession};
use serde_json::Value;
use wasm_bindgen::prelude::*;
use wasm_bindgen_test::*;

fn parse(json: &str) -> Value {
    serde_json::from_str(json).unwrap()
}

#[wasm_bindgen_test]
fn execute_command_returns_result_json() {
    let mut session = WasmSession::new("hello world", None, None, None).ok().expect("session");
    let args = js_sys::Array::of1(&JsValue::from_str(" again"));
    let result = parse(&session.execute_command("ADD_TEXT", &args));
    assert_eq!(result["success"], Value::Bool(true));
    assert_eq!(result["newState"]["content"], "hello world again");
}

#[wasm_bindgen_test]
fn failures_come_back_as_results() {
    let mut session = WasmSession::new("", Some("a4".to_string()), None, None)
        .ok()
        .expect("session");
    let result = parse(&session.execute_command_json("DELETE_PAGE", "[1]"));
    assert_eq!(result["success"], Value::Bool(false));

    let state = parse(&session.get_state());
    assert_eq!(state["engine"]["config"]["page"]["name"], "a4");
}

#[wasm_bindgen_test]
fn snapshot_reopens() {
    let session = WasmSession::new("persisted", Some("legal".to_string()), Some(10.0), None)
        .ok()
        .expect("session");
    let snapshot = session.snapshot().ok().expect("snapshot");
    let reopened = WasmSession::from_snapshot(&snapshot, None).ok().expect("reopen");
    assert_eq!(reopened.get_state(), session.get_state());
}

#[wasm_bindgen_test]
fn snapshot_reopens_with_options() {
    let options = r#"{"layout": {"lineHeight": 2.0}}"#.to_string();
    let session = WasmSession::new("tuned", None, None, Some(options.clone()))
        .ok()
        .expect("session");
    let snapshot = session.snapshot().ok().expect("snapshot");

    let reopened = WasmSession::from_snapshot(&snapshot, Some(options))
        .ok()
        .expect("reopen");
    assert_eq!(reopened.get_state(), session.get_state());
    let state = parse(&reopened.get_state());
    assert_eq!(state["engine"]["options"]["lineHeight"], 2.0);

    let defaults = WasmSession::from_snapshot(&snapshot, None).ok().expect("reopen");
    assert_ne!(defaults.get_state(), session.get_state());
}

fn linear_host() -> JsValue {
    let host = js_sys::Object::new();
    let height_of = js_sys::Function::new_with_args("content, style", "return content.length;");
    js_sys::Reflect::set(&host, &JsValue::from_str("heightOf"), &height_of).unwrap();
    host.into()
}

#[wasm_bindgen_test]
fn live_flow_settles_against_js_host() {
    let mut session = WasmSession::new("", None, None, None).ok().expect("session");
    let mut flow: WasmFlow = session.live_flow();
    let text = "lorem ".repeat(200);
    assert!(flow.set_content(0, &text));

    assert!(flow.settle(&linear_host()).ok().expect("settle"));
    assert_eq!(flow.page_count(), 2);

    let result = parse(&session.reconcile(&flow));
    assert_eq!(result["success"], Value::Bool(true));
    assert_eq!(result["newState"]["content"], text.as_str());
}
