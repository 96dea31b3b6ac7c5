use std::cell::{Cell, RefCell};

use serde_json::Value;

use crate::handshake::Envelope;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionHandle(pub u32);

pub type MessageHandler = Box<dyn FnMut(&Envelope)>;

/// クロスオリジンメッセージの受信口。
/// ブラウザでは `window` の `message` イベント、テストではプロセス内のバスで実装する。
///
/// ハンドラの中から `unsubscribe` が呼ばれても壊れてはならない。
pub trait MessageSource {
    fn subscribe(&self, handler: MessageHandler) -> SubscriptionHandle;
    fn unsubscribe(&self, handle: SubscriptionHandle);
}

/// 届いた順にハンドラへ配送するだけの同期バス。
#[derive(Default)]
pub struct LocalMessageBus {
    next_id: Cell<u32>,
    handlers: RefCell<Vec<(SubscriptionHandle, MessageHandler)>>,
    // 配送中に解除されたハンドル
    removed: RefCell<Vec<SubscriptionHandle>>,
}

impl LocalMessageBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscriber_count(&self) -> usize {
        self.handlers.borrow().len()
    }

    /// `origin` から `data` が届いたものとして、購読中の全ハンドラに配送する。
    pub fn post(&self, origin: &str, data: Value) {
        let envelope = Envelope::new(origin, data);

        let mut handlers = std::mem::take(&mut *self.handlers.borrow_mut());
        for (handle, handler) in handlers.iter_mut() {
            if self.removed.borrow().contains(handle) {
                continue;
            }
            handler(&envelope);
        }

        let removed = std::mem::take(&mut *self.removed.borrow_mut());
        handlers.retain(|(handle, _)| !removed.contains(handle));
        let mut slot = self.handlers.borrow_mut();
        // 配送中に追加された購読は後ろに回す
        handlers.append(&mut slot);
        *slot = handlers;
    }
}

impl MessageSource for LocalMessageBus {
    fn subscribe(&self, handler: MessageHandler) -> SubscriptionHandle {
        let handle = SubscriptionHandle(self.next_id.get());
        self.next_id.set(handle.0 + 1);
        self.handlers.borrow_mut().push((handle, handler));
        handle
    }

    fn unsubscribe(&self, handle: SubscriptionHandle) {
        let mut handlers = self.handlers.borrow_mut();
        match handlers.iter().position(|(h, _)| *h == handle) {
            Some(index) => {
                handlers.remove(index);
            }
            None => self.removed.borrow_mut().push(handle),
        }
    }
}
