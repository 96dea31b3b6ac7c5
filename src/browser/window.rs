use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;

use log::{debug, error};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{MessageEvent, Window};

use crate::handshake::{
    Envelope, MessageHandler, MessageSource, Scheduler, SubscriptionHandle, TimerHandle,
};

pub(crate) fn window() -> Result<Window, JsValue> {
    web_sys::window().ok_or_else(|| JsValue::from_str("no global `window` exists"))
}

/// `setTimeout` / `clearTimeout` によるタイマー。
/// 破棄時に未発火のタイマーをすべて取り消す。
///
/// 発火済みのクロージャは実行中に解放できないので、発火後に `fired` へ積み、
/// 次の予約・取り消しの時点でまとめて解放する。
pub struct WindowScheduler {
    window: Window,
    timers: RefCell<HashMap<i32, Closure<dyn FnMut()>>>,
    fired: Rc<RefCell<Vec<i32>>>,
}

impl WindowScheduler {
    pub fn new() -> Result<Self, JsValue> {
        Ok(Self {
            window: window()?,
            timers: RefCell::new(HashMap::new()),
            fired: Rc::new(RefCell::new(Vec::new())),
        })
    }

    /// まだ発火していないタイマーの数。
    pub fn pending_count(&self) -> usize {
        self.release_fired();
        self.timers.borrow().len()
    }

    fn release_fired(&self) {
        let fired = std::mem::take(&mut *self.fired.borrow_mut());
        if fired.is_empty() {
            return;
        }
        let mut timers = self.timers.borrow_mut();
        for id in fired {
            timers.remove(&id);
        }
    }
}

impl Scheduler for WindowScheduler {
    fn schedule(&self, delay: Duration, callback: Box<dyn FnOnce()>) -> Option<TimerHandle> {
        self.release_fired();

        // id は予約後に決まる
        let id_slot = Rc::new(Cell::new(None));
        let (slot, fired) = (Rc::clone(&id_slot), Rc::clone(&self.fired));
        let closure = Closure::once(move || {
            callback();
            if let Some(id) = slot.get() {
                fired.borrow_mut().push(id);
            }
        });
        let ms = i32::try_from(delay.as_millis()).unwrap_or(i32::MAX);
        match self
            .window
            .set_timeout_with_callback_and_timeout_and_arguments_0(
                closure.as_ref().unchecked_ref(),
                ms,
            ) {
            Ok(id) => {
                id_slot.set(Some(id));
                self.timers.borrow_mut().insert(id, closure);
                Some(TimerHandle(id as u32))
            }
            Err(err) => {
                error!("Failed to schedule timer: {:?}", err);
                None
            }
        }
    }

    fn cancel(&self, handle: TimerHandle) {
        self.release_fired();
        let id = handle.0 as i32;
        self.window.clear_timeout_with_handle(id);
        self.timers.borrow_mut().remove(&id);
    }
}

impl Drop for WindowScheduler {
    fn drop(&mut self) {
        for id in self.timers.get_mut().keys() {
            self.window.clear_timeout_with_handle(*id);
        }
    }
}

/// `window` の `message` イベントを購読する。
///
/// 実行中のクロージャを解放しないよう、解除したリスナーは次の購読か破棄まで保持する。
pub struct WindowMessageSource {
    window: Window,
    next_id: Cell<u32>,
    listeners: RefCell<HashMap<u32, Closure<dyn FnMut(MessageEvent)>>>,
    retired: RefCell<Vec<Closure<dyn FnMut(MessageEvent)>>>,
}

impl WindowMessageSource {
    pub fn new() -> Result<Self, JsValue> {
        Ok(Self {
            window: window()?,
            next_id: Cell::new(0),
            listeners: RefCell::new(HashMap::new()),
            retired: RefCell::new(Vec::new()),
        })
    }
}

impl MessageSource for WindowMessageSource {
    fn subscribe(&self, mut handler: MessageHandler) -> SubscriptionHandle {
        self.retired.borrow_mut().clear();

        let closure = Closure::<dyn FnMut(MessageEvent)>::new(move |event: MessageEvent| {
            let origin = event.origin();
            // 関数などを含む値は変換できないので null として渡す
            let data = serde_wasm_bindgen::from_value::<serde_json::Value>(event.data())
                .unwrap_or_else(|err| {
                    debug!("Message from {origin} is not plain data: {err}");
                    serde_json::Value::Null
                });
            handler(&Envelope::new(origin, data));
        });
        if let Err(err) = self
            .window
            .add_event_listener_with_callback("message", closure.as_ref().unchecked_ref())
        {
            error!("Failed to listen for messages: {:?}", err);
        }

        let handle = SubscriptionHandle(self.next_id.get());
        self.next_id.set(handle.0 + 1);
        self.listeners.borrow_mut().insert(handle.0, closure);
        handle
    }

    fn unsubscribe(&self, handle: SubscriptionHandle) {
        let Some(closure) = self.listeners.borrow_mut().remove(&handle.0) else {
            return;
        };
        if let Err(err) = self
            .window
            .remove_event_listener_with_callback("message", closure.as_ref().unchecked_ref())
        {
            error!("Failed to stop listening for messages: {:?}", err);
        }
        self.retired.borrow_mut().push(closure);
    }
}

impl Drop for WindowMessageSource {
    fn drop(&mut self) {
        for closure in self.listeners.get_mut().values() {
            if let Err(err) = self
                .window
                .remove_event_listener_with_callback("message", closure.as_ref().unchecked_ref())
            {
                error!("Failed to stop listening for messages: {:?}", err);
            }
        }
        // ハンドラの実行中に破棄されることがあるため、解除済みのクロージャは解放しない
        for closure in self.retired.get_mut().drain(..) {
            closure.forget();
        }
    }
}

/// 生成ツールを新しいタブで開く。メッセージの経路は作らない。
pub fn open_in_new_tab(url: &str) -> Result<(), JsValue> {
    window()?.open_with_url_and_target_and_features(url, "_blank", "noopener,noreferrer")?;
    Ok(())
}
