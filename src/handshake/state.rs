use serde::{Deserialize, Serialize};

/// ハンドシェイクの進行段階。
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[default]
    Init,
    Loading,
    Error,
    Complete,
}

/// エクスポートされたマップの出どころ。
/// フォールバックで生成されたマップを、ツール由来のマップと区別するために使う。
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum MapSource {
    Generator,
    Fallback { reason: FallbackReason },
}

impl MapSource {
    pub fn is_degraded(&self) -> bool {
        matches!(self, MapSource::Fallback { .. })
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum FallbackReason {
    /// 完了通知に mapData が含まれていなかった
    PayloadAbsent,
    /// mapData が壊れていた
    PayloadMalformed,
    /// ユーザーがデフォルトマップを選んだ
    UserChoseDefault,
}

/// 埋め込みコンポーネントが持つ一時的な状態。永続化はしない。
/// マウント時に作られ、リスナー・タイマー・エクスポートのコールバックからのみ更新される。
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct HandshakeState {
    pub loading: bool,
    pub complete: bool,
    pub error: bool,
    pub error_message: String,
    pub phase: Phase,
    pub source: Option<MapSource>,
}

impl HandshakeState {
    pub const EMBED_BLOCKED_MESSAGE: &'static str =
        "The external map generator cannot be embedded. This is due to security restrictions.";
    pub const LOAD_FAILED_MESSAGE: &'static str = "Failed to load the external map generator.";

    /// ローディング表示を出すべきかどうか。
    pub fn shows_spinner(&self) -> bool {
        self.loading && !self.error
    }

    /// 代替手段 (デフォルトマップ / 別タブ) を提示すべきかどうか。
    pub fn shows_fallback_options(&self) -> bool {
        self.error && !self.complete
    }

    pub fn is_degraded(&self) -> bool {
        self.source.is_some_and(|s| s.is_degraded())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_format() {
        let state = HandshakeState {
            complete: true,
            phase: Phase::Complete,
            source: Some(MapSource::Fallback {
                reason: FallbackReason::PayloadMalformed,
            }),
            ..HandshakeState::default()
        };
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["errorMessage"], "");
        assert_eq!(json["phase"], "complete");
        assert_eq!(json["source"]["kind"], "fallback");
        assert_eq!(json["source"]["reason"], "payloadMalformed");
        assert!(state.is_degraded());
    }

    #[test]
    fn test_presentation_flags() {
        let loading = HandshakeState {
            loading: true,
            phase: Phase::Loading,
            ..HandshakeState::default()
        };
        assert!(loading.shows_spinner());
        assert!(!loading.shows_fallback_options());

        let failed = HandshakeState {
            error: true,
            phase: Phase::Error,
            ..HandshakeState::default()
        };
        assert!(!failed.shows_spinner());
        assert!(failed.shows_fallback_options());
    }
}
