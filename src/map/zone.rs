use serde::{Deserialize, Serialize};

use crate::map::HexPos;

/// 戦略的に重要な地点を表す構造体。
/// 複数のヘックスと、表示用の CSS カラー文字列を持つ。
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Zone {
    pub id: String,
    pub name: String,
    pub strategic_value: i32,
    pub hexes: Vec<HexPos>,
    pub color: String,
}
