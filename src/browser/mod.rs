//! ブラウザ上での実装。wasm32 でのみビルドされる。
mod frame;
mod window;

pub use frame::EmbeddedFrame;
pub use window::{open_in_new_tab, WindowMessageSource, WindowScheduler};
