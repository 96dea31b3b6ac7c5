//! JS 側とやり取りする型の置き場所。
//! ここにある型は serde でそのまま JS のオブジェクトに変換される。

pub use crate::config::BridgeConfig;
pub use crate::flow::Screen;
pub use crate::generator::DefaultMapGenerator;
pub use crate::handshake::{FallbackReason, HandshakeState, MapSource, Phase};
pub use crate::map::{
    BattlefieldMap, HexCell, HexPos, MapDimensions, MapObject, ObjectCoordinates, ObjectKind,
    Terrain, Zone,
};
