use std::rc::Rc;

use log::{debug, info, warn};
use serde_json::Value;

use crate::config::BridgeConfig;
use crate::generator::DefaultMapGenerator;
use crate::handshake::export::{Export, ExportBridge};
use crate::handshake::message::{decode_map, Envelope, InboundMessage};
use crate::handshake::scheduler::{Scheduler, TimerHandle};
use crate::handshake::state::{FallbackReason, HandshakeState, MapSource, Phase};
use crate::map::BattlefieldMap;

/// 1回のマップ作成セッションの状態機械。
///
/// ```text
/// INIT --(mount)--> LOADING --(IFRAME_LOADED)--> LOADING
/// LOADING --(timeout / frame error)--> ERROR
/// LOADING | ERROR --(MAP_GENERATION_COMPLETE / use default)--> COMPLETE
/// ```
///
/// 状態の更新はすべて `update` を通り、teardown 後は何も変更しない。
/// エクスポートが必要な操作は `Export` を返すので、呼び出し側はこの構造体の借用を
/// 手放してから `deliver` すること。
pub struct Session {
    config: BridgeConfig,
    generator: DefaultMapGenerator,
    state: HandshakeState,
    revision: u64,
    scheduler: Rc<dyn Scheduler>,
    timer: Option<TimerHandle>,
    export: ExportBridge,
    torn_down: bool,
}

impl Session {
    pub fn new(
        config: BridgeConfig,
        scheduler: Rc<dyn Scheduler>,
        on_export: impl FnOnce(BattlefieldMap) + 'static,
    ) -> Self {
        Self {
            generator: DefaultMapGenerator::from_config(&config),
            config,
            state: HandshakeState::default(),
            revision: 0,
            scheduler,
            timer: None,
            export: ExportBridge::new(on_export),
            torn_down: false,
        }
    }

    pub fn state(&self) -> &HandshakeState {
        &self.state
    }

    /// 状態が書き換えられた回数。
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn is_armed(&self) -> bool {
        self.timer.is_some()
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    fn update(&mut self, f: impl FnOnce(&mut HandshakeState)) {
        if self.torn_down {
            warn!("Ignoring state update after teardown");
            return;
        }
        f(&mut self.state);
        self.revision += 1;
        debug!("Handshake state #{}: {:?}", self.revision, self.state);
    }

    fn disarm(&mut self) {
        if let Some(handle) = self.timer.take() {
            self.scheduler.cancel(handle);
        }
    }

    // -- Load/Timeout Supervisor --

    /// ローディングを開始し、タイムアウトを予約する。
    /// `on_expire` は期限切れ時に `handle_timeout` を呼ぶコールバック。
    pub fn mount(&mut self, on_expire: Box<dyn FnOnce()>) {
        if self.torn_down || self.state.phase != Phase::Init {
            warn!("Session is already mounted, phase: {:?}", self.state.phase);
            return;
        }
        self.update(|s| {
            s.loading = true;
            s.phase = Phase::Loading;
        });
        let timeout = self.config.load_timeout();
        self.timer = self.scheduler.schedule(timeout, on_expire);
        if self.timer.is_none() {
            warn!("Could not arm the load timeout, the generator may hang in loading state");
        }
        info!(
            "Embedding map generator {} (timeout {:?})",
            self.config.generator_url, timeout
        );
    }

    pub fn handle_timeout(&mut self) {
        if self.torn_down || self.timer.take().is_none() {
            return;
        }
        if self.state.phase != Phase::Loading {
            return;
        }
        warn!(
            "Map generator did not respond within {:?}",
            self.config.load_timeout()
        );
        self.update(|s| {
            s.loading = false;
            s.error = true;
            s.error_message = HandshakeState::EMBED_BLOCKED_MESSAGE.to_owned();
            s.phase = Phase::Error;
        });
    }

    /// iframe の `load` イベント。
    pub fn handle_frame_loaded(&mut self) {
        if self.torn_down || self.state.complete {
            return;
        }
        self.disarm();
        self.update(|s| {
            s.loading = false;
            s.error = false;
            s.error_message.clear();
            s.phase = Phase::Loading;
        });
    }

    /// iframe の `error` イベント。
    pub fn handle_frame_error(&mut self) {
        if self.torn_down || self.state.complete {
            return;
        }
        self.disarm();
        warn!("Map generator frame failed to load");
        self.update(|s| {
            s.loading = false;
            s.error = true;
            s.error_message = HandshakeState::LOAD_FAILED_MESSAGE.to_owned();
            s.phase = Phase::Error;
        });
    }

    // -- Cross-Origin Message Listener --

    pub fn handle_envelope(&mut self, envelope: &Envelope) -> Option<Export> {
        if self.torn_down {
            return None;
        }
        // 中身を見る前にオリジンを照合する
        if envelope.origin != self.config.trusted_origin {
            debug!("Dropping message from untrusted origin {}", envelope.origin);
            return None;
        }
        let Some(message) = InboundMessage::classify(&envelope.data) else {
            debug!("Ignoring unrecognized message: {}", envelope.data);
            return None;
        };
        if self.state.complete {
            debug!("Session already complete, ignoring {:?}", message);
            return None;
        }

        self.disarm();
        match message {
            InboundMessage::IframeLoaded => {
                self.update(|s| s.loading = false);
                None
            }
            InboundMessage::MapGenerationComplete { map_data } => {
                let (map, source) = self.resolve_payload(map_data);
                self.complete(map, source)
            }
        }
    }

    fn resolve_payload(&self, map_data: Option<Value>) -> (BattlefieldMap, MapSource) {
        let reason = match map_data.map(decode_map) {
            Some(Ok(map)) => {
                info!("Received battlefield {} from generator", map.summary());
                return (map, MapSource::Generator);
            }
            Some(Err(err)) => {
                warn!("Malformed map payload, substituting default battlefield: {err}");
                FallbackReason::PayloadMalformed
            }
            None => {
                info!("Completion message carried no map data, substituting default battlefield");
                FallbackReason::PayloadAbsent
            }
        };
        (
            self.generator.generate_unseeded(),
            MapSource::Fallback { reason },
        )
    }

    // -- Export Bridge --

    /// 別タブで生成ツールを開くための URL。状態は変えない。
    pub fn open_external(&self) -> &str {
        info!("Opening map generator externally");
        &self.config.generator_url
    }

    /// ユーザーがデフォルトマップを選んだ。
    pub fn use_default_map(&mut self) -> Option<Export> {
        if self.torn_down {
            return None;
        }
        if self.export.is_spent() {
            warn!("Battlefield already exported, ignoring default map request");
            return None;
        }
        self.disarm();
        let map = self.generator.generate_unseeded();
        self.complete(
            map,
            MapSource::Fallback {
                reason: FallbackReason::UserChoseDefault,
            },
        )
    }

    fn complete(&mut self, map: BattlefieldMap, source: MapSource) -> Option<Export> {
        let Some(export) = self.export.take(map) else {
            warn!("Battlefield already exported, dropping second export");
            return None;
        };
        info!(
            "Battlefield design complete: {} ({:?})",
            export.map().summary(),
            source
        );
        self.update(|s| {
            s.loading = false;
            s.complete = true;
            s.phase = Phase::Complete;
            s.source = Some(source);
        });
        Some(export)
    }

    /// タイマーを取り消し、以降の更新をすべて無視するようにする。
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.disarm();
        self.torn_down = true;
        debug!("Map editor session torn down at revision {}", self.revision);
    }
}
