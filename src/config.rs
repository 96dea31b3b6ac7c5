use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::generator::{DEFAULT_HEIGHT, DEFAULT_WIDTH};
use crate::map::MapDimensions;

/// 埋め込みマップ生成ツールとのハンドシェイク設定。
/// フロントエンドからは camelCase の JS オブジェクトとして渡され、未指定の項目は既定値で補完される。
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct BridgeConfig {
    /// メッセージ送信元として信頼するオリジン。
    /// 検証時にブラウザの `event.origin` と同じ表記へ正規化し、以降は完全一致で照合する。
    pub trusted_origin: String,
    /// iframe に読み込む生成ツールの URL。オリジンは `trusted_origin` と一致しなければならない。
    pub generator_url: String,
    pub load_timeout_ms: u64,
    pub sandbox: String,
    pub default_width: u32,
    pub default_height: u32,
    /// マップ保存後に war-summary 画面へ進むまでの待ち時間。
    pub auto_advance_ms: u64,
}

impl BridgeConfig {
    pub const DEFAULT_ORIGIN: &'static str = "https://map-generator-1.vercel.app";
    pub const DEFAULT_LOAD_TIMEOUT_MS: u64 = 10_000;
    pub const DEFAULT_SANDBOX: &'static str = "allow-scripts allow-same-origin allow-forms";
    pub const DEFAULT_AUTO_ADVANCE_MS: u64 = 2_000;

    pub fn from_json(s: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(s)?;
        config.canonicalize()
    }

    pub fn load_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.load_timeout_ms)
    }

    pub fn auto_advance(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.auto_advance_ms)
    }

    /// 設定値の妥当性を検証する。
    /// 生成ツールの URL と信頼オリジンが食い違う設定はここで弾く。
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.checked_origin().map(|_| ())
    }

    /// 検証したうえで `trusted_origin` を正規化した設定を返す。
    /// 大文字のホストや既定ポートの明示 (`:443`) は、ブラウザが報告する表記に揃える。
    pub fn canonicalize(mut self) -> Result<Self, ConfigError> {
        self.trusted_origin = self.checked_origin()?;
        Ok(self)
    }

    fn checked_origin(&self) -> Result<String, ConfigError> {
        if self.trusted_origin.is_empty() {
            return Err(ConfigError::EmptyOrigin);
        }
        let trusted = web_url(&self.trusted_origin)
            .filter(|url| url.path() == "/" && url.query().is_none() && url.fragment().is_none())
            .ok_or_else(|| ConfigError::NotAnOrigin(self.trusted_origin.clone()))?
            .origin()
            .ascii_serialization();

        let url_origin = web_url(&self.generator_url)
            .ok_or_else(|| ConfigError::BadGeneratorUrl(self.generator_url.clone()))?
            .origin()
            .ascii_serialization();
        if url_origin != trusted {
            return Err(ConfigError::OriginMismatch {
                url: self.generator_url.clone(),
                trusted,
            });
        }

        if self.load_timeout_ms == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        let dimensions = MapDimensions::new(self.default_width, self.default_height);
        if dimensions.width == 0 || dimensions.height == 0 {
            return Err(ConfigError::ZeroDimension {
                width: dimensions.width,
                height: dimensions.height,
            });
        }
        if !dimensions.is_within_limits() {
            return Err(ConfigError::TooLarge {
                width: dimensions.width,
                height: dimensions.height,
            });
        }
        Ok(trusted)
    }
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            trusted_origin: Self::DEFAULT_ORIGIN.to_owned(),
            generator_url: Self::DEFAULT_ORIGIN.to_owned(),
            load_timeout_ms: Self::DEFAULT_LOAD_TIMEOUT_MS,
            sandbox: Self::DEFAULT_SANDBOX.to_owned(),
            default_width: DEFAULT_WIDTH,
            default_height: DEFAULT_HEIGHT,
            auto_advance_ms: Self::DEFAULT_AUTO_ADVANCE_MS,
        }
    }
}

/// http(s) などオリジンを持つ絶対 URL だけを受け付ける。ユーザー情報付きの URL は拒否する。
fn web_url(s: &str) -> Option<Url> {
    let url = Url::parse(s).ok()?;
    let has_userinfo = !url.username().is_empty() || url.password().is_some();
    (url.origin().is_tuple() && !has_userinfo).then_some(url)
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("trusted origin must not be empty")]
    EmptyOrigin,

    #[error("trusted origin {0:?} must be a bare scheme://host[:port] without credentials")]
    NotAnOrigin(String),

    #[error("generator url {0:?} is not an absolute http(s) url without credentials")]
    BadGeneratorUrl(String),

    #[error("generator url {url:?} is not served from the trusted origin {trusted:?}")]
    OriginMismatch { url: String, trusted: String },

    #[error("load timeout must be positive")]
    ZeroTimeout,

    #[error("default map dimensions must be positive, got {width}x{height}")]
    ZeroDimension { width: u32, height: u32 },

    #[error("default map dimensions {width}x{height} exceed the {}x{} limit", MapDimensions::MAX_SIDE, MapDimensions::MAX_SIDE)]
    TooLarge { width: u32, height: u32 },

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = BridgeConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.load_timeout().as_secs(), 10);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = BridgeConfig::from_json(r#"{ "loadTimeoutMs": 2500 }"#).unwrap();
        assert_eq!(config.load_timeout_ms, 2500);
        assert_eq!(config.trusted_origin, BridgeConfig::DEFAULT_ORIGIN);
        assert_eq!(config.default_width, 12);
    }

    #[test]
    fn test_generator_url_must_match_origin() {
        let config = BridgeConfig {
            generator_url: "https://imaginative-figolla-9cbf50.netlify.app/editor".to_owned(),
            ..BridgeConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::OriginMismatch { .. })
        ));

        let config = BridgeConfig {
            generator_url: "https://map-generator-1.vercel.app/editor?mode=hex".to_owned(),
            ..BridgeConfig::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_trusted_origin_must_be_bare() {
        let config = BridgeConfig {
            trusted_origin: "https://map-generator-1.vercel.app/editor".to_owned(),
            ..BridgeConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::NotAnOrigin(_))));

        for not_an_origin in ["map-generator-1.vercel.app", "data:text/html,hi", "file:///tmp/x"] {
            let config = BridgeConfig {
                trusted_origin: not_an_origin.to_owned(),
                ..BridgeConfig::default()
            };
            assert!(
                matches!(config.validate(), Err(ConfigError::NotAnOrigin(_))),
                "{not_an_origin}"
            );
        }

        let config = BridgeConfig {
            trusted_origin: String::new(),
            ..BridgeConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::EmptyOrigin)));
    }

    #[test]
    fn test_rejects_zero_values() {
        assert!(matches!(
            BridgeConfig::from_json(r#"{ "loadTimeoutMs": 0 }"#),
            Err(ConfigError::ZeroTimeout)
        ));
        assert!(matches!(
            BridgeConfig::from_json(r#"{ "defaultHeight": 0 }"#),
            Err(ConfigError::ZeroDimension { width: 12, height: 0 })
        ));
        assert!(matches!(
            BridgeConfig::from_json("not json"),
            Err(ConfigError::Serde(_))
        ));
    }

    #[test]
    fn test_trusted_origin_is_canonicalized() {
        for written in [
            "https://Map-Generator-1.vercel.app",
            "HTTPS://map-generator-1.vercel.app",
            "https://map-generator-1.vercel.app:443",
            "https://map-generator-1.vercel.app/",
        ] {
            let config = BridgeConfig {
                trusted_origin: written.to_owned(),
                ..BridgeConfig::default()
            }
            .canonicalize()
            .unwrap();
            assert_eq!(config.trusted_origin, BridgeConfig::DEFAULT_ORIGIN, "{written}");
        }

        let config = BridgeConfig::from_json(
            r#"{ "trustedOrigin": "http://LOCALHOST:5173", "generatorUrl": "http://localhost:5173/editor" }"#,
        )
        .unwrap();
        assert_eq!(config.trusted_origin, "http://localhost:5173");
    }

    #[test]
    fn test_credentials_are_rejected() {
        let config = BridgeConfig {
            trusted_origin: "https://user:pw@map-generator-1.vercel.app".to_owned(),
            ..BridgeConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::NotAnOrigin(_))));

        let config = BridgeConfig {
            generator_url: "https://user@map-generator-1.vercel.app/editor".to_owned(),
            ..BridgeConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::BadGeneratorUrl(_))));
    }

    #[test]
    fn test_non_default_port_is_a_different_origin() {
        let config = BridgeConfig {
            trusted_origin: "https://map-generator-1.vercel.app:8443".to_owned(),
            ..BridgeConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::OriginMismatch { .. })
        ));
    }

    #[test]
    fn test_rejects_oversized_default_map() {
        let config = BridgeConfig {
            default_width: 1_000_000,
            default_height: 1_000_000,
            ..BridgeConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::TooLarge {
                width: 1_000_000,
                height: 1_000_000
            })
        ));

        let max = MapDimensions::MAX_SIDE;
        let config = BridgeConfig {
            default_width: max,
            default_height: max,
            ..BridgeConfig::default()
        };
        assert!(config.validate().is_ok());
    }
}
