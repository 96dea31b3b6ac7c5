use log::{error, info};
use serde::Serialize;
use wasm_bindgen::prelude::*;

pub mod config;
pub mod flow;
pub mod generator;
pub mod handshake;
pub mod interface;
pub mod map;
mod utils;

#[cfg(target_arch = "wasm32")]
mod bindings;
#[cfg(target_arch = "wasm32")]
pub mod browser;

#[cfg(target_arch = "wasm32")]
pub use crate::bindings::{MapEditorHandle, ScreenFlowHandle};

use crate::interface::{BattlefieldMap, DefaultMapGenerator};

static INIT: std::sync::Once = std::sync::Once::new();

fn initialize() {
    INIT.call_once(|| {
        utils::set_panic_hook();
        wasm_logger::init(wasm_logger::Config::default()); // ロガー初期化
        info!("Logger initialized");
    });
}

fn to_js<T: Serialize>(value: &T) -> JsValue {
    serde_wasm_bindgen::to_value(value).unwrap_or_else(|err| {
        error!("Failed to convert value for JS: {:?}", err);
        JsValue::NULL
    })
}

/// 外部ツールを使わずにデフォルトの戦場マップを生成する。
/// 省略された引数は 12x10 / ランダムなシードで補う。
#[wasm_bindgen(js_name = generateDefaultMap)]
pub fn generate_default_map(width: Option<u32>, height: Option<u32>, seed: Option<u64>) -> JsValue {
    initialize();

    let generator = match (width, height) {
        (None, None) => DefaultMapGenerator::default(),
        (w, h) => DefaultMapGenerator::new(
            w.unwrap_or(generator::DEFAULT_WIDTH),
            h.unwrap_or(generator::DEFAULT_HEIGHT),
        ),
    };
    let map = match seed {
        Some(seed) => generator.generate(seed),
        None => generator.generate_unseeded(),
    };
    info!("Generated default battlefield {}", map.summary());
    to_js(&map)
}

/// マップデータを検証し、見つかった問題を文字列の配列で返す。問題が無ければ空配列。
#[wasm_bindgen(js_name = validateMap)]
pub fn validate_map(map_val: JsValue) -> JsValue {
    initialize();

    let errors: Vec<String> = match serde_wasm_bindgen::from_value::<BattlefieldMap>(map_val) {
        Ok(map) => map.check_errors().iter().map(|e| e.to_string()).collect(),
        Err(err) => {
            error!("Failed to parse battlefield map: {:?}", err);
            vec![err.to_string()]
        }
    };
    to_js(&errors)
}
