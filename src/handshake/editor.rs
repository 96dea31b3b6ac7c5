use std::cell::{Cell, RefCell};
use std::rc::Rc;

use log::info;

use crate::config::{BridgeConfig, ConfigError};
use crate::handshake::channel::{MessageSource, SubscriptionHandle};
use crate::handshake::scheduler::Scheduler;
use crate::handshake::session::Session;
use crate::handshake::state::HandshakeState;
use crate::map::BattlefieldMap;

/// マップエディタ1つ分の配線。
/// マウント時にメッセージを購読してタイムアウトを予約し、teardown (または drop) で両方を解除する。
///
/// コールバックはセッションを `Weak` で参照するので、破棄済みのエディタを延命させない。
/// エクスポートのコールバックの中からエディタを teardown してもよい。
pub struct MapEditor {
    session: Rc<RefCell<Session>>,
    source: Rc<dyn MessageSource>,
    subscription: Cell<Option<SubscriptionHandle>>,
}

impl MapEditor {
    pub fn mount(
        config: BridgeConfig,
        scheduler: Rc<dyn Scheduler>,
        source: Rc<dyn MessageSource>,
        on_export: impl FnOnce(BattlefieldMap) + 'static,
    ) -> Result<Self, ConfigError> {
        let config = config.canonicalize()?;
        let session = Rc::new(RefCell::new(Session::new(config, scheduler, on_export)));

        let weak = Rc::downgrade(&session);
        let subscription = source.subscribe(Box::new(move |envelope| {
            let Some(session) = weak.upgrade() else {
                return;
            };
            let export = session.borrow_mut().handle_envelope(envelope);
            if let Some(export) = export {
                export.deliver();
            }
        }));

        let weak = Rc::downgrade(&session);
        session.borrow_mut().mount(Box::new(move || {
            if let Some(session) = weak.upgrade() {
                session.borrow_mut().handle_timeout();
            }
        }));

        Ok(Self {
            session,
            source,
            subscription: Cell::new(Some(subscription)),
        })
    }

    pub fn state(&self) -> HandshakeState {
        self.session.borrow().state().clone()
    }

    pub fn revision(&self) -> u64 {
        self.session.borrow().revision()
    }

    pub fn is_mounted(&self) -> bool {
        !self.session.borrow().is_torn_down()
    }

    pub fn frame_loaded(&self) {
        self.session.borrow_mut().handle_frame_loaded();
    }

    pub fn frame_failed(&self) {
        self.session.borrow_mut().handle_frame_error();
    }

    pub fn use_default_map(&self) {
        let export = self.session.borrow_mut().use_default_map();
        if let Some(export) = export {
            export.deliver();
        }
    }

    /// 別タブで開く URL を返す。メッセージの経路は無いので、状態は ERROR のまま。
    pub fn open_external(&self) -> String {
        self.session.borrow().open_external().to_owned()
    }

    pub fn teardown(&self) {
        if let Some(subscription) = self.subscription.take() {
            self.source.unsubscribe(subscription);
            self.session.borrow_mut().teardown();
            info!("Map editor unmounted");
        }
    }
}

impl Drop for MapEditor {
    fn drop(&mut self) {
        self.teardown();
    }
}
