use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::map::{BattlefieldMap, MapError};

/// クロスオリジンで届いた生のメッセージ。
/// `origin` を照合するまで `data` の中身は解釈しない。
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    pub origin: String,
    pub data: Value,
}

impl Envelope {
    pub fn new(origin: impl Into<String>, data: Value) -> Self {
        Self {
            origin: origin.into(),
            data,
        }
    }
}

/// 生成ツールから届くメッセージの種類。
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InboundMessage {
    IframeLoaded,
    MapGenerationComplete {
        #[serde(rename = "mapData", default)]
        map_data: Option<Value>,
    },
}

impl InboundMessage {
    /// `type` が既知のものでなければ None。
    pub fn classify(data: &Value) -> Option<Self> {
        Self::deserialize(data).ok()
    }
}

#[derive(Error, Debug)]
pub enum PayloadError {
    #[error("map data does not match the battlefield schema: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("map data is inconsistent: {0}")]
    Invalid(#[from] MapError),
}

/// 完了通知の mapData を読み取り、検証まで済ませる。
pub fn decode_map(value: Value) -> Result<BattlefieldMap, PayloadError> {
    let map: BattlefieldMap = serde_json::from_value(value)?;
    map.validate()?;
    Ok(map)
}
