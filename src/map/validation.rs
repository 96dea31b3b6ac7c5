use std::collections::HashSet;

use itertools::Itertools;
use thiserror::Error;

use crate::map::{BattlefieldMap, HexCell, MapDimensions};

/// マップデータの検証や座標の解釈に失敗したときのエラー。
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MapError {
    #[error("map dimensions must be positive, got {width}x{height}")]
    ZeroDimension { width: u32, height: u32 },

    #[error("map dimensions {width}x{height} exceed the {}x{} limit", MapDimensions::MAX_SIDE, MapDimensions::MAX_SIDE)]
    TooLarge { width: u32, height: u32 },

    #[error("expected {expected} hex cells, got {actual}")]
    HexCountMismatch { expected: usize, actual: usize },

    #[error("malformed hex coordinate: {0:?}")]
    BadCoord(String),

    #[error("hex {0} lies outside the map")]
    CoordOutOfBounds(String),

    #[error("hex {0} appears more than once")]
    DuplicateCoord(String),

    #[error("hex {coord} has elevation {elevation}, expected 1..=3")]
    ElevationOutOfRange { coord: String, elevation: u8 },

    #[error("zone id {0:?} is not unique")]
    DuplicateZoneId(String),

    #[error("zone {zone:?} references hex {hex} outside the map")]
    ZoneHexOutOfBounds { zone: String, hex: String },

    #[error("object id {0:?} is not unique")]
    DuplicateObjectId(String),

    #[error("object {object:?} is placed at {hex}, outside the map")]
    ObjectOutOfBounds { object: String, hex: String },
}

impl BattlefieldMap {
    /// マップデータの整合性を検証する。最初に見つかった違反を返す。
    pub fn validate(&self) -> Result<(), MapError> {
        self.check_errors().into_iter().next().map_or(Ok(()), Err)
    }

    /// 検出できた違反をすべて返す。JS 側へのエラー一覧表示に使う。
    pub fn check_errors(&self) -> Vec<MapError> {
        let width = self.map_dimensions.width;
        let height = self.map_dimensions.height;

        if width == 0 || height == 0 {
            return vec![MapError::ZeroDimension { width, height }];
        }

        let expected = match self.map_dimensions.cell_count() {
            Some(count) if self.map_dimensions.is_within_limits() => count,
            _ => return vec![MapError::TooLarge { width, height }],
        };

        let mut errors = Vec::new();

        if self.hex_data.len() != expected {
            errors.push(MapError::HexCountMismatch {
                expected,
                actual: self.hex_data.len(),
            });
        }

        let mut seen = HashSet::with_capacity(self.hex_data.len());
        for cell in self.hex_data.iter() {
            let coord = cell.coord.to_string();
            if !cell.coord.is_within(width, height) {
                errors.push(MapError::CoordOutOfBounds(coord.clone()));
            }
            if !seen.insert(cell.coord) {
                errors.push(MapError::DuplicateCoord(coord.clone()));
            }
            if !(HexCell::MIN_ELEVATION..=HexCell::MAX_ELEVATION).contains(&cell.elevation) {
                errors.push(MapError::ElevationOutOfRange {
                    coord,
                    elevation: cell.elevation,
                });
            }
        }

        errors.extend(
            self.strategic_zones
                .iter()
                .map(|z| &z.id)
                .duplicates()
                .map(|id| MapError::DuplicateZoneId(id.clone())),
        );
        for zone in self.strategic_zones.iter() {
            errors.extend(
                zone.hexes
                    .iter()
                    .filter(|h| !h.is_within(width, height))
                    .map(|h| MapError::ZoneHexOutOfBounds {
                        zone: zone.id.clone(),
                        hex: h.to_string(),
                    }),
            );
        }

        errors.extend(
            self.objects
                .iter()
                .map(|o| &o.id)
                .duplicates()
                .map(|id| MapError::DuplicateObjectId(id.clone())),
        );
        errors.extend(
            self.objects
                .iter()
                .filter(|o| !o.hex().is_within(width, height))
                .map(|o| MapError::ObjectOutOfBounds {
                    object: o.id.clone(),
                    hex: o.hex().to_string(),
                }),
        );

        errors
    }
}
