//! 画面遷移とマップの受け取りを担うホスト側の状態。
//! 表示中の画面は固定の名前の集合のいずれかでなければならない。
use std::cell::RefCell;
use std::rc::Weak;
use std::time::Duration;

use log::info;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::BridgeConfig;
use crate::generator::DefaultMapGenerator;
use crate::handshake::{Scheduler, TimerHandle};
use crate::map::BattlefieldMap;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Screen {
    #[default]
    Main,
    Story,
    TeamSetup,
    BuildTeams,
    MapEditor,
    WarSummary,
    SelectExperience,
}

impl Screen {
    pub const ALL: [Screen; 7] = [
        Screen::Main,
        Screen::Story,
        Screen::TeamSetup,
        Screen::BuildTeams,
        Screen::MapEditor,
        Screen::WarSummary,
        Screen::SelectExperience,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Screen::Main => "main",
            Screen::Story => "story",
            Screen::TeamSetup => "team-setup",
            Screen::BuildTeams => "build-teams",
            Screen::MapEditor => "map-editor",
            Screen::WarSummary => "war-summary",
            Screen::SelectExperience => "select-experience",
        }
    }
}

impl std::fmt::Display for Screen {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Screen {
    type Err = FlowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Screen::ALL
            .iter()
            .find(|screen| screen.as_str() == s)
            .copied()
            .ok_or_else(|| FlowError::UnknownScreen(s.to_owned()))
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FlowError {
    #[error("unknown screen: {0:?}")]
    UnknownScreen(String),

    #[error("no battlefield map has been saved yet")]
    NoBattlefieldMap,
}

/// 一定時間後に行う画面遷移。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingNavigation {
    pub to: Screen,
    pub after: Duration,
}

impl PendingNavigation {
    /// タイマーに載せる。`flow` が先に破棄されていれば何もしない。
    pub fn schedule(
        self,
        scheduler: &dyn Scheduler,
        flow: Weak<RefCell<ScreenFlow>>,
    ) -> Option<TimerHandle> {
        self.schedule_then(scheduler, flow, |_| {})
    }

    /// 遷移した後、`flow` の借用を手放してから `then` に遷移先を渡す。
    pub fn schedule_then(
        self,
        scheduler: &dyn Scheduler,
        flow: Weak<RefCell<ScreenFlow>>,
        then: impl FnOnce(Screen) + 'static,
    ) -> Option<TimerHandle> {
        scheduler.schedule(
            self.after,
            Box::new(move || {
                let Some(flow) = flow.upgrade() else {
                    return;
                };
                flow.borrow_mut().navigate(self.to);
                then(self.to);
            }),
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScreenFlow {
    current: Screen,
    battlefield_map: Option<BattlefieldMap>,
    auto_advance: Duration,
    generator: DefaultMapGenerator,
}

impl ScreenFlow {
    pub fn new(config: &BridgeConfig) -> Self {
        Self {
            current: Screen::default(),
            battlefield_map: None,
            auto_advance: config.auto_advance(),
            generator: DefaultMapGenerator::from_config(config),
        }
    }

    pub fn current(&self) -> Screen {
        self.current
    }

    pub fn battlefield_map(&self) -> Option<&BattlefieldMap> {
        self.battlefield_map.as_ref()
    }

    /// "plains (12x10)" のような表示用の要約。
    pub fn battlefield_summary(&self) -> Option<String> {
        self.battlefield_map.as_ref().map(|m| m.summary())
    }

    pub fn navigate(&mut self, to: Screen) {
        if self.current != to {
            info!("Screen {} -> {}", self.current, to);
        }
        self.current = to;
    }

    pub fn navigate_by_name(&mut self, name: &str) -> Result<(), FlowError> {
        let screen = name.parse()?;
        self.navigate(screen);
        Ok(())
    }

    /// エクスポートされたマップを保存する。
    /// 少し待ってから war-summary へ進むので、その遷移を返す。
    pub fn save_battlefield_map(&mut self, map: BattlefieldMap) -> PendingNavigation {
        info!("Battlefield ready: {}", map.summary());
        self.battlefield_map = Some(map);
        PendingNavigation {
            to: Screen::WarSummary,
            after: self.auto_advance,
        }
    }

    /// 保存済みのマップで先へ進む。
    pub fn continue_with_map(&mut self) -> Result<(), FlowError> {
        if self.battlefield_map.is_none() {
            return Err(FlowError::NoBattlefieldMap);
        }
        self.navigate(Screen::WarSummary);
        Ok(())
    }

    /// エディタを使わずにデフォルトマップで進む。
    pub fn skip_map_editor(&mut self) {
        let map = self.generator.generate_unseeded();
        info!("Using default battlefield map");
        self.battlefield_map = Some(map);
        self.navigate(Screen::WarSummary);
    }

    pub fn back_from_map_editor(&mut self) {
        self.navigate(Screen::BuildTeams);
    }

    /// 最初からやり直す。
    pub fn reset(&mut self) {
        self.current = Screen::default();
        self.battlefield_map = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handshake::{LocalMessageBus, ManualScheduler, MapEditor};
    use serde_json::json;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn test_screen_names() {
        for screen in Screen::ALL {
            assert_eq!(screen.to_string().parse::<Screen>(), Ok(screen));
            assert_eq!(
                serde_json::to_value(screen).unwrap(),
                json!(screen.as_str())
            );
        }
        assert_eq!(
            "war_summary".parse::<Screen>(),
            Err(FlowError::UnknownScreen("war_summary".to_owned()))
        );
    }

    #[test]
    fn test_navigate_by_name() {
        let mut flow = ScreenFlow::new(&BridgeConfig::default());
        flow.navigate_by_name("map-editor").unwrap();
        assert_eq!(flow.current(), Screen::MapEditor);
        assert!(flow.navigate_by_name("credits").is_err());
        assert_eq!(flow.current(), Screen::MapEditor);
    }

    #[test]
    fn test_continue_requires_map() {
        let mut flow = ScreenFlow::new(&BridgeConfig::default());
        flow.navigate(Screen::MapEditor);
        assert_eq!(flow.continue_with_map(), Err(FlowError::NoBattlefieldMap));
        assert_eq!(flow.current(), Screen::MapEditor);
    }

    #[test]
    fn test_skip_and_back() {
        let mut flow = ScreenFlow::new(&BridgeConfig::default());
        flow.navigate(Screen::MapEditor);
        flow.back_from_map_editor();
        assert_eq!(flow.current(), Screen::BuildTeams);

        flow.navigate(Screen::MapEditor);
        flow.skip_map_editor();
        assert_eq!(flow.current(), Screen::WarSummary);
        assert_eq!(flow.battlefield_summary().as_deref(), Some("plains (12x10)"));

        flow.reset();
        assert_eq!(flow.current(), Screen::Main);
        assert!(flow.battlefield_map().is_none());
    }

    #[test]
    fn test_scheduled_navigation_notifies_after_arrival() {
        let scheduler = ManualScheduler::new();
        let flow = Rc::new(RefCell::new(ScreenFlow::new(&BridgeConfig::default())));
        let arrived = Rc::new(RefCell::new(Vec::new()));

        let pending = flow
            .borrow_mut()
            .save_battlefield_map(DefaultMapGenerator::default().generate(9));
        let (observer, sink) = (Rc::downgrade(&flow), arrived.clone());
        pending.schedule_then(&scheduler, Rc::downgrade(&flow), move |screen| {
            let Some(flow) = observer.upgrade() else {
                return;
            };
            // 通知の時点で flow は借用されていない
            let current = flow.borrow().current();
            sink.borrow_mut().push((screen, current));
        });

        scheduler.advance(Duration::from_secs(2));
        assert_eq!(
            *arrived.borrow(),
            vec![(Screen::WarSummary, Screen::WarSummary)]
        );
    }

    #[test]
    fn test_scheduled_navigation_after_flow_dropped() {
        let scheduler = ManualScheduler::new();
        let flow = Rc::new(RefCell::new(ScreenFlow::new(&BridgeConfig::default())));
        let pending = flow
            .borrow_mut()
            .save_battlefield_map(DefaultMapGenerator::default().generate(9));
        let notified = Rc::new(Cell::new(false));
        let flag = notified.clone();
        pending.schedule_then(&scheduler, Rc::downgrade(&flow), move |_| flag.set(true));

        drop(flow);
        assert_eq!(scheduler.advance(Duration::from_secs(5)), 1);
        assert!(!notified.get());
    }

    #[test]
    fn test_export_advances_after_delay() {
        let config = BridgeConfig::default();
        let scheduler = Rc::new(ManualScheduler::new());
        let bus = Rc::new(LocalMessageBus::new());
        let flow = Rc::new(RefCell::new(ScreenFlow::new(&config)));
        flow.borrow_mut().navigate(Screen::MapEditor);

        let (host_flow, host_scheduler) = (Rc::downgrade(&flow), scheduler.clone());
        let _editor = MapEditor::mount(config, scheduler.clone(), bus.clone(), move |map| {
            let Some(flow) = host_flow.upgrade() else {
                return;
            };
            let pending = flow.borrow_mut().save_battlefield_map(map);
            pending.schedule(&*host_scheduler, Rc::downgrade(&flow));
        })
        .unwrap();

        bus.post(
            BridgeConfig::DEFAULT_ORIGIN,
            json!({ "type": "MAP_GENERATION_COMPLETE" }),
        );
        assert_eq!(flow.borrow().current(), Screen::MapEditor);
        assert!(flow.borrow().battlefield_map().is_some());

        scheduler.advance(Duration::from_millis(1_999));
        assert_eq!(flow.borrow().current(), Screen::MapEditor);
        scheduler.advance(Duration::from_millis(1));
        assert_eq!(flow.borrow().current(), Screen::WarSummary);
    }
}
