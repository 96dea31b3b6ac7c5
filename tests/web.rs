//! Test suite for the Web and headless browsers.

#![cfg(target_arch = "wasm32")]

extern crate wasm_bindgen_test;
use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use battlefield_core::browser::WindowScheduler;
use battlefield_core::handshake::Scheduler;
use battlefield_core::interface::BattlefieldMap;
use battlefield_core::{generate_default_map, validate_map, MapEditorHandle, ScreenFlowHandle};
use wasm_bindgen::JsValue;
use wasm_bindgen_futures::JsFuture;
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

#[wasm_bindgen_test]
fn generates_default_map_in_browser() {
    let value = generate_default_map(None, None, Some(7));
    let map: BattlefieldMap = serde_wasm_bindgen::from_value(value).unwrap();
    assert_eq!(map.battlefield_type, "plains");
    assert_eq!(map.hex_data.len(), 12 * 10);
    assert!(map.validate().is_ok());
}

#[wasm_bindgen_test]
fn validate_map_reports_nothing_for_generated_map() {
    let value = generate_default_map(Some(4), Some(3), Some(1));
    let errors: Vec<String> = serde_wasm_bindgen::from_value(validate_map(value)).unwrap();
    assert!(errors.is_empty());
}

#[wasm_bindgen_test]
fn validate_map_reports_unparsable_input() {
    let errors: Vec<String> =
        serde_wasm_bindgen::from_value(validate_map(JsValue::from_str("not a map"))).unwrap();
    assert_eq!(errors.len(), 1);
}

#[wasm_bindgen_test]
fn mounts_and_tears_down_editor() {
    let document = web_sys::window().unwrap().document().unwrap();
    let container = document.create_element("div").unwrap();
    document.body().unwrap().append_child(&container).unwrap();

    let on_export = js_sys::Function::new_no_args("");
    let mut handle = MapEditorHandle::mount(container.clone(), JsValue::UNDEFINED, on_export).unwrap();
    assert_eq!(container.child_element_count(), 1);

    handle.use_default_map();
    let state = handle.state();
    let phase = js_sys::Reflect::get(&state, &JsValue::from_str("phase")).unwrap();
    assert_eq!(phase.as_string().as_deref(), Some("complete"));

    handle.teardown();
    assert_eq!(container.child_element_count(), 0);
}

async fn sleep(ms: i32) {
    let promise = js_sys::Promise::new(&mut |resolve, _| {
        web_sys::window()
            .unwrap()
            .set_timeout_with_callback_and_timeout_and_arguments_0(&resolve, ms)
            .unwrap();
    });
    JsFuture::from(promise).await.unwrap();
}

#[wasm_bindgen_test]
async fn fired_timers_are_released() {
    let scheduler = WindowScheduler::new().unwrap();
    let fired = Rc::new(Cell::new(0));
    for _ in 0..3 {
        let counter = fired.clone();
        scheduler.schedule(
            Duration::from_millis(0),
            Box::new(move || counter.set(counter.get() + 1)),
        );
    }
    scheduler.schedule(Duration::from_secs(60), Box::new(|| {}));
    assert_eq!(scheduler.pending_count(), 4);

    sleep(30).await;
    assert_eq!(fired.get(), 3);
    assert_eq!(scheduler.pending_count(), 1);
}

#[wasm_bindgen_test]
fn screen_flow_handle_navigates() {
    let seen = js_sys::Array::new();
    let on_navigate = js_sys::Function::new_with_args("screen", "this.push(screen)")
        .bind(&seen);
    let flow = ScreenFlowHandle::new(JsValue::UNDEFINED, on_navigate).unwrap();
    assert_eq!(flow.current(), "main");

    flow.navigate("map-editor").unwrap();
    assert!(flow.navigate("credits").is_err());
    assert_eq!(flow.current(), "map-editor");

    flow.skip_map_editor();
    assert_eq!(flow.current(), "war-summary");
    assert_eq!(flow.battlefield_summary().as_deref(), Some("plains (12x10)"));

    let names: Vec<String> = seen.iter().filter_map(|v| v.as_string()).collect();
    assert_eq!(names, vec!["map-editor", "war-summary"]);
}

#[wasm_bindgen_test]
async fn screen_flow_handle_advances_after_save() {
    let config = js_sys::JSON::parse(r#"{ "autoAdvanceMs": 10 }"#).unwrap();
    let flow = ScreenFlowHandle::new(config, js_sys::Function::new_no_args("")).unwrap();
    flow.navigate("map-editor").unwrap();
    flow.save_battlefield_map(generate_default_map(None, None, Some(3))).unwrap();
    assert_eq!(flow.current(), "map-editor");

    sleep(50).await;
    assert_eq!(flow.current(), "war-summary");
}
