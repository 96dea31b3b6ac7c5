use serde::{Deserialize, Serialize};

mod hex;
pub use hex::{HexCell, HexPos, Terrain};

mod zone;
pub use zone::Zone;

mod object;
pub use object::{MapObject, ObjectCoordinates, ObjectKind};

mod validation;
pub use validation::MapError;

/// 戦場マップ全体を表す構造体。
/// 外部のマップ生成ツール、またはデフォルト生成器から得られる。
/// エクスポート後は不変として扱い、呼び出し元に値で渡す。
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct BattlefieldMap {
    pub battlefield_type: String,
    pub map_dimensions: MapDimensions,
    pub hex_data: Vec<HexCell>,
    pub strategic_zones: Vec<Zone>,
    pub objects: Vec<MapObject>,
}

impl BattlefieldMap {
    pub fn width(&self) -> u32 {
        self.map_dimensions.width
    }
    pub fn height(&self) -> u32 {
        self.map_dimensions.height
    }

    /// 指定座標のマスを取得する。
    pub fn cell(&self, pos: HexPos) -> Option<&HexCell> {
        self.hex_data.iter().find(|c| c.coord == pos)
    }

    /// "plains (12x10)" のような短い説明。
    pub fn summary(&self) -> String {
        format!(
            "{} ({}x{})",
            self.battlefield_type, self.map_dimensions.width, self.map_dimensions.height
        )
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapDimensions {
    pub width: u32,
    pub height: u32,
}

impl MapDimensions {
    /// 1辺あたりの最大マス数。これを超えるマップは生成も受け取りもしない。
    pub const MAX_SIDE: u32 = 256;

    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_within_limits(&self) -> bool {
        self.width <= Self::MAX_SIDE && self.height <= Self::MAX_SIDE
    }

    /// マスの総数。`usize` に収まらなければ None (wasm32 では 32bit)。
    pub fn cell_count(&self) -> Option<usize> {
        u64::from(self.width)
            .checked_mul(u64::from(self.height))
            .and_then(|n| usize::try_from(n).ok())
    }
}
