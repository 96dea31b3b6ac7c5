use std::rc::{Rc, Weak};

use log::error;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Element, HtmlIFrameElement};

use crate::config::BridgeConfig;
use crate::handshake::MapEditor;

const FRAME_TITLE: &str = "Battlefield Map Generator";

/// ホスト要素に差し込んだ生成ツールの iframe と、その `load` / `error` リスナー。
pub struct EmbeddedFrame {
    iframe: HtmlIFrameElement,
    on_load: Closure<dyn FnMut()>,
    on_error: Closure<dyn FnMut()>,
}

impl EmbeddedFrame {
    /// サンドボックス付きの iframe を作って `container` の末尾に追加する。
    pub fn attach(
        container: &Element,
        config: &BridgeConfig,
        editor: &Rc<MapEditor>,
    ) -> Result<Self, JsValue> {
        let document = container
            .owner_document()
            .ok_or_else(|| JsValue::from_str("container is not attached to a document"))?;
        let iframe: HtmlIFrameElement = document
            .create_element("iframe")?
            .dyn_into()
            .map_err(|_| JsValue::from_str("created element is not an iframe"))?;

        iframe.set_src(&config.generator_url);
        iframe.set_attribute("title", FRAME_TITLE)?;
        iframe.set_attribute("sandbox", &config.sandbox)?;
        iframe.set_attribute("allow", "fullscreen")?;
        iframe.set_attribute("style", "width: 100%; height: 100%; border: none")?;

        let on_load = frame_listener(Rc::downgrade(editor), MapEditor::frame_loaded);
        let on_error = frame_listener(Rc::downgrade(editor), MapEditor::frame_failed);
        iframe.add_event_listener_with_callback("load", on_load.as_ref().unchecked_ref())?;
        iframe.add_event_listener_with_callback("error", on_error.as_ref().unchecked_ref())?;

        container.append_child(&iframe)?;
        Ok(Self {
            iframe,
            on_load,
            on_error,
        })
    }
}

fn frame_listener(editor: Weak<MapEditor>, f: fn(&MapEditor)) -> Closure<dyn FnMut()> {
    Closure::<dyn FnMut()>::new(move || {
        if let Some(editor) = editor.upgrade() {
            f(&editor);
        }
    })
}

impl Drop for EmbeddedFrame {
    fn drop(&mut self) {
        let listeners = [("load", &self.on_load), ("error", &self.on_error)];
        for (event, listener) in listeners {
            if let Err(err) = self
                .iframe
                .remove_event_listener_with_callback(event, listener.as_ref().unchecked_ref())
            {
                error!("Failed to remove frame {event} listener: {:?}", err);
            }
        }
        self.iframe.remove();
    }
}
