use serde::{Deserialize, Serialize};

use crate::map::MapError;

/// ヘックスグリッド上の位置 (列, 行)。
/// ゾーンやオブジェクトでは `{ "col": .., "row": .. }` の形で送受信される。
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HexPos {
    pub col: u32,
    pub row: u32,
}

impl HexPos {
    pub fn new(col: u32, row: u32) -> Self {
        Self { col, row }
    }

    /// `width` x `height` のグリッドに収まっているかを判定する。
    pub fn is_within(&self, width: u32, height: u32) -> bool {
        self.col < width && self.row < height
    }

    /// グリッド内に収まるよう座標を丸める。
    pub fn clamped(&self, width: u32, height: u32) -> Self {
        Self {
            col: self.col.min(width.saturating_sub(1)),
            row: self.row.min(height.saturating_sub(1)),
        }
    }
}

impl std::fmt::Display for HexPos {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{},{}", self.col, self.row)
    }
}

impl std::str::FromStr for HexPos {
    type Err = MapError;

    /// `"col,row"` 形式の文字列を解釈する。
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (col, row) = s
            .split_once(',')
            .ok_or_else(|| MapError::BadCoord(s.to_owned()))?;
        let col = col
            .trim()
            .parse()
            .map_err(|_| MapError::BadCoord(s.to_owned()))?;
        let row = row
            .trim()
            .parse()
            .map_err(|_| MapError::BadCoord(s.to_owned()))?;
        Ok(Self { col, row })
    }
}

/// 地形の種類を表す列挙型。
/// 外部ツールとの互換性のため、シリアライズ時の表記は表示名そのまま。
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Terrain {
    Clear,
    #[serde(rename = "Forest (Light)")]
    ForestLight,
    #[serde(rename = "Hill (Steep/Ridge)")]
    HillSteep,
    Street,
    Room,
    Road,
}

impl std::fmt::Display for Terrain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Terrain::Clear => "Clear",
            Terrain::ForestLight => "Forest (Light)",
            Terrain::HillSteep => "Hill (Steep/Ridge)",
            Terrain::Street => "Street",
            Terrain::Room => "Room",
            Terrain::Road => "Road",
        };
        write!(f, "{}", s)
    }
}

/// ヘックス1マス分のデータ。
/// `coord` は `"col,row"` 形式の文字列として送受信される。
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct HexCell {
    #[serde(with = "coord_string")]
    pub coord: HexPos,
    pub terrain: Terrain,
    pub elevation: u8,
}

impl HexCell {
    pub const MIN_ELEVATION: u8 = 1;
    pub const MAX_ELEVATION: u8 = 3;

    pub fn new(coord: HexPos, terrain: Terrain, elevation: u8) -> Self {
        Self {
            coord,
            terrain,
            elevation,
        }
    }
}

mod coord_string {
    use super::HexPos;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(pos: &HexPos, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(pos)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<HexPos, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
