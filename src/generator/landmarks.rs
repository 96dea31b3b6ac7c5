use itertools::Itertools;

use crate::generator::{DEFAULT_HEIGHT, DEFAULT_WIDTH};
use crate::map::{HexPos, MapDimensions, MapObject, ObjectCoordinates, ObjectKind, Zone};

// 座標は 12x10 のグリッド上の値。他のサイズでは比率を保って配置する。
const ZONES: [(&str, &str, i32, (u32, u32), &str); 3] = [
    ("zone_1", "Alpha Point", 5, (3, 3), "#ff6b35"),
    ("zone_2", "Bravo Ridge", 7, (8, 6), "#2ed573"),
    ("zone_3", "Charlie Hill", 6, (5, 2), "#ffa502"),
];

const OBJECTS: [(&str, &str, ObjectKind, &str, (u32, u32)); 3] = [
    ("obj_1", "Command Post", ObjectKind::Military, "⚔️", (6, 5)),
    ("obj_2", "Supply Depot", ObjectKind::Building, "🏠", (2, 7)),
    ("obj_3", "Ancient Monument", ObjectKind::Landmark, "🏛️", (9, 3)),
];

fn scale(anchor: (u32, u32), dimensions: MapDimensions) -> HexPos {
    let scale_axis = |v: u32, size: u32, reference: u32| {
        (u64::from(v) * u64::from(size) / u64::from(reference)) as u32
    };
    let (col, row) = anchor;
    HexPos::new(
        scale_axis(col, dimensions.width, DEFAULT_WIDTH),
        scale_axis(row, dimensions.height, DEFAULT_HEIGHT),
    )
    .clamped(dimensions.width, dimensions.height)
}

/// アンカーとその右・下のマスでゾーンを作る。端ではグリッド内に丸め、重複は除く。
pub(super) fn zones(dimensions: MapDimensions) -> Vec<Zone> {
    let MapDimensions { width, height } = dimensions;
    ZONES
        .iter()
        .map(|&(id, name, strategic_value, anchor, color)| {
            let origin = scale(anchor, dimensions);
            let hexes = [(0, 0), (1, 0), (0, 1)]
                .iter()
                .map(|&(dc, dr)| HexPos::new(origin.col + dc, origin.row + dr).clamped(width, height))
                .unique()
                .collect();
            Zone {
                id: id.to_owned(),
                name: name.to_owned(),
                strategic_value,
                hexes,
                color: color.to_owned(),
            }
        })
        .collect()
}

pub(super) fn objects(dimensions: MapDimensions) -> Vec<MapObject> {
    OBJECTS
        .iter()
        .map(|&(id, name, kind, emoji, anchor)| MapObject {
            id: id.to_owned(),
            name: name.to_owned(),
            kind,
            emoji: emoji.to_owned(),
            coordinates: ObjectCoordinates {
                hex: scale(anchor, dimensions),
            },
        })
        .collect()
}
