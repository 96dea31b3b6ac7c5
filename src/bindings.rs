//! JS から操作するハンドル。wasm32 でのみビルドされる。
use std::cell::RefCell;
use std::rc::Rc;

use log::error;
use wasm_bindgen::prelude::*;

use crate::browser::{open_in_new_tab, EmbeddedFrame, WindowMessageSource, WindowScheduler};
use crate::config::BridgeConfig;
use crate::flow::{Screen, ScreenFlow};
use crate::handshake::MapEditor;
use crate::map::BattlefieldMap;
use crate::{initialize, to_js};

fn parse_config(config_val: JsValue) -> Result<BridgeConfig, JsValue> {
    if config_val.is_undefined() || config_val.is_null() {
        return Ok(BridgeConfig::default());
    }
    let config = serde_wasm_bindgen::from_value::<BridgeConfig>(config_val).map_err(|err| {
        error!("Failed to parse map editor config: {:?}", err);
        JsValue::from_str(&err.to_string())
    })?;
    config.canonicalize().map_err(|err| {
        error!("Invalid map editor config: {}", err);
        JsValue::from_str(&err.to_string())
    })
}

/// JS から操作するマップエディタ。`container` に生成ツールの iframe を差し込む。
#[wasm_bindgen]
pub struct MapEditorHandle {
    editor: Rc<MapEditor>,
    frame: Option<EmbeddedFrame>,
}

#[wasm_bindgen]
impl MapEditorHandle {
    pub fn mount(
        container: web_sys::Element,
        config_val: JsValue,
        on_export_map: js_sys::Function,
    ) -> Result<MapEditorHandle, JsValue> {
        initialize();

        let config = parse_config(config_val)?;
        let scheduler = Rc::new(WindowScheduler::new()?);
        let source = Rc::new(WindowMessageSource::new()?);
        let editor = MapEditor::mount(config.clone(), scheduler, source, move |map| {
            if let Err(err) = on_export_map.call1(&JsValue::NULL, &to_js(&map)) {
                error!("onExportMap threw: {:?}", err);
            }
        })
        .map_err(|err| JsValue::from_str(&err.to_string()))?;
        let editor = Rc::new(editor);
        let frame = EmbeddedFrame::attach(&container, &config, &editor)?;

        Ok(Self {
            editor,
            frame: Some(frame),
        })
    }

    #[wasm_bindgen(js_name = useDefaultMap)]
    pub fn use_default_map(&self) {
        self.editor.use_default_map();
    }

    #[wasm_bindgen(js_name = openExternal)]
    pub fn open_external(&self) -> Result<(), JsValue> {
        open_in_new_tab(&self.editor.open_external())
    }

    pub fn state(&self) -> JsValue {
        to_js(&self.editor.state())
    }

    /// iframe を外し、購読とタイマーを解除する。以降の操作は何も起こさない。
    pub fn teardown(&mut self) {
        self.frame.take();
        self.editor.teardown();
    }
}

fn notify(on_navigate: &js_sys::Function, screen: Screen) {
    if let Err(err) = on_navigate.call1(&JsValue::NULL, &JsValue::from_str(screen.as_str())) {
        error!("onNavigate threw: {:?}", err);
    }
}

/// ホスト画面の遷移。画面が変わるたびに `onNavigate(screenName)` を呼ぶ。
/// マップ保存後の war-summary への自動遷移も含む。
#[wasm_bindgen]
pub struct ScreenFlowHandle {
    flow: Rc<RefCell<ScreenFlow>>,
    scheduler: WindowScheduler,
    on_navigate: Rc<js_sys::Function>,
}

impl ScreenFlowHandle {
    /// 借用を手放してから遷移後の画面を通知する。
    fn apply(&self, f: impl FnOnce(&mut ScreenFlow)) {
        let screen = {
            let mut flow = self.flow.borrow_mut();
            f(&mut flow);
            flow.current()
        };
        notify(&self.on_navigate, screen);
    }
}

#[wasm_bindgen]
impl ScreenFlowHandle {
    #[wasm_bindgen(constructor)]
    pub fn new(config_val: JsValue, on_navigate: js_sys::Function) -> Result<ScreenFlowHandle, JsValue> {
        initialize();

        let config = parse_config(config_val)?;
        Ok(Self {
            flow: Rc::new(RefCell::new(ScreenFlow::new(&config))),
            scheduler: WindowScheduler::new()?,
            on_navigate: Rc::new(on_navigate),
        })
    }

    pub fn current(&self) -> String {
        self.flow.borrow().current().as_str().to_owned()
    }

    pub fn navigate(&self, name: &str) -> Result<(), JsValue> {
        let screen = name
            .parse::<Screen>()
            .map_err(|err| JsValue::from_str(&err.to_string()))?;
        self.apply(|flow| flow.navigate(screen));
        Ok(())
    }

    /// エクスポートされたマップを保存し、少し待ってから war-summary へ進む。
    #[wasm_bindgen(js_name = saveBattlefieldMap)]
    pub fn save_battlefield_map(&self, map_val: JsValue) -> Result<(), JsValue> {
        let map = serde_wasm_bindgen::from_value::<BattlefieldMap>(map_val).map_err(|err| {
            error!("Failed to parse battlefield map: {:?}", err);
            JsValue::from_str(&err.to_string())
        })?;
        map.validate()
            .map_err(|err| JsValue::from_str(&err.to_string()))?;

        let pending = self.flow.borrow_mut().save_battlefield_map(map);
        let on_navigate = Rc::clone(&self.on_navigate);
        pending.schedule_then(&self.scheduler, Rc::downgrade(&self.flow), move |screen| {
            notify(&on_navigate, screen)
        });
        Ok(())
    }

    #[wasm_bindgen(js_name = continueWithMap)]
    pub fn continue_with_map(&self) -> Result<(), JsValue> {
        let result = self.flow.borrow_mut().continue_with_map();
        result.map_err(|err| JsValue::from_str(&err.to_string()))?;
        notify(&self.on_navigate, Screen::WarSummary);
        Ok(())
    }

    #[wasm_bindgen(js_name = skipMapEditor)]
    pub fn skip_map_editor(&self) {
        self.apply(ScreenFlow::skip_map_editor);
    }

    #[wasm_bindgen(js_name = backFromMapEditor)]
    pub fn back_from_map_editor(&self) {
        self.apply(ScreenFlow::back_from_map_editor);
    }

    pub fn reset(&self) {
        self.apply(ScreenFlow::reset);
    }

    #[wasm_bindgen(js_name = battlefieldMap)]
    pub fn battlefield_map(&self) -> JsValue {
        match self.flow.borrow().battlefield_map() {
            Some(map) => to_js(map),
            None => JsValue::NULL,
        }
    }

    #[wasm_bindgen(js_name = battlefieldSummary)]
    pub fn battlefield_summary(&self) -> Option<String> {
        self.flow.borrow().battlefield_summary()
    }
}
