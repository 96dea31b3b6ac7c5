//! 外部マップ生成ツールが使えないときの代替マップを生成する。
//! グリッドの形とゾーン・オブジェクトの数は固定で、地形と標高だけがランダムに決まる。
//! 外部依存を持たないため、失敗することはない。
mod landmarks;

use itertools::iproduct;
use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::BridgeConfig;
use crate::map::{BattlefieldMap, HexCell, HexPos, MapDimensions, Terrain};

pub const DEFAULT_BATTLEFIELD_TYPE: &str = "plains";
pub const DEFAULT_WIDTH: u32 = 12;
pub const DEFAULT_HEIGHT: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DefaultMapGenerator {
    dimensions: MapDimensions,
}

impl Default for DefaultMapGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_WIDTH, DEFAULT_HEIGHT)
    }
}

impl DefaultMapGenerator {
    /// 各辺を 1..=`MapDimensions::MAX_SIDE` に丸める。
    pub fn new(width: u32, height: u32) -> Self {
        let side = |n: u32| n.clamp(1, MapDimensions::MAX_SIDE);
        Self {
            dimensions: MapDimensions::new(side(width), side(height)),
        }
    }

    pub fn from_config(config: &BridgeConfig) -> Self {
        Self::new(config.default_width, config.default_height)
    }

    pub fn dimensions(&self) -> MapDimensions {
        self.dimensions
    }

    /// シードを固定して生成する。同じシードからは同じマップが得られる。
    pub fn generate(&self, seed: u64) -> BattlefieldMap {
        let mut rng = StdRng::seed_from_u64(seed);
        self.generate_with(&mut rng)
    }

    /// スレッドローカルな乱数からシードを決めて生成する。
    /// 再現できるよう、使ったシードはログに残す。
    pub fn generate_unseeded(&self) -> BattlefieldMap {
        let seed = rand::rng().random::<u64>();
        debug!("Generating default battlefield with seed {seed}");
        self.generate(seed)
    }

    pub fn generate_with<R: Rng + ?Sized>(&self, rng: &mut R) -> BattlefieldMap {
        let MapDimensions { width, height } = self.dimensions;

        // 行優先で並べる
        let hex_data = iproduct!(0..height, 0..width)
            .map(|(row, col)| {
                HexCell::new(HexPos::new(col, row), roll_terrain(rng), roll_elevation(rng))
            })
            .collect();

        BattlefieldMap {
            battlefield_type: DEFAULT_BATTLEFIELD_TYPE.to_owned(),
            map_dimensions: self.dimensions,
            hex_data,
            strategic_zones: landmarks::zones(self.dimensions),
            objects: landmarks::objects(self.dimensions),
        }
    }
}

fn roll_terrain<R: Rng + ?Sized>(rng: &mut R) -> Terrain {
    let r = rng.random::<f64>();
    if r < 0.7 {
        Terrain::Clear // 70%
    } else if r < 0.9 {
        Terrain::ForestLight // 20%
    } else {
        Terrain::HillSteep // 10%
    }
}

fn roll_elevation<R: Rng + ?Sized>(rng: &mut R) -> u8 {
    rng.random_range(HexCell::MIN_ELEVATION..=HexCell::MAX_ELEVATION)
}
