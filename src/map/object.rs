use serde::{Deserialize, Serialize};

use crate::map::HexPos;

/// マップ上に配置される施設や目標物。
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct MapObject {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ObjectKind,
    pub emoji: String,
    pub coordinates: ObjectCoordinates,
}

impl MapObject {
    pub fn hex(&self) -> HexPos {
        self.coordinates.hex
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ObjectKind {
    Military,
    Building,
    Landmark,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ObjectCoordinates {
    pub hex: HexPos,
}
