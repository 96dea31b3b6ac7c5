use crate::map::BattlefieldMap;

pub type ExportCallback = Box<dyn FnOnce(BattlefieldMap)>;

/// マップ作成からホスト画面への受け渡し口。一度使うと空になるラッチ。
pub struct ExportBridge {
    callback: Option<ExportCallback>,
}

impl ExportBridge {
    pub fn new(callback: impl FnOnce(BattlefieldMap) + 'static) -> Self {
        Self {
            callback: Some(Box::new(callback)),
        }
    }

    pub fn is_spent(&self) -> bool {
        self.callback.is_none()
    }

    /// コールバックを取り出す。二度目以降は None。
    /// 呼び出しは `Export::deliver` で行い、状態の借用を手放してから実行すること。
    pub fn take(&mut self, map: BattlefieldMap) -> Option<Export> {
        self.callback.take().map(|callback| Export { callback, map })
    }
}

impl std::fmt::Debug for ExportBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExportBridge")
            .field("spent", &self.is_spent())
            .finish()
    }
}

/// 配送待ちのエクスポート。
#[must_use = "the export callback only runs when the export is delivered"]
pub struct Export {
    callback: ExportCallback,
    map: BattlefieldMap,
}

impl Export {
    pub fn map(&self) -> &BattlefieldMap {
        &self.map
    }

    pub fn deliver(self) {
        (self.callback)(self.map)
    }
}
