//! 外部のマップ生成ツールを iframe に埋め込み、その完了を待つためのハンドシェイク。
//!
//! - `message`: クロスオリジンメッセージの分類とペイロードの復元
//! - `scheduler`: 読み込みタイムアウト用のタイマー
//! - `channel`: メッセージの受信口
//! - `export`: ホスト画面への一度きりの受け渡し
//! - `session`: 状態機械本体
//! - `editor`: 上記をつないでマウント/アンマウントする
mod channel;
mod editor;
mod export;
mod message;
mod scheduler;
mod session;
mod state;

pub use channel::{LocalMessageBus, MessageHandler, MessageSource, SubscriptionHandle};
pub use editor::MapEditor;
pub use export::{Export, ExportBridge, ExportCallback};
pub use message::{decode_map, Envelope, InboundMessage, PayloadError};
pub use scheduler::{ManualScheduler, Scheduler, TimerHandle};
pub use session::Session;
pub use state::{FallbackReason, HandshakeState, MapSource, Phase};
