//! 分层配置与 provider 描述文件的 TOML 装载。
//!
//! ## 契约说明（What）
//! - [`LayeringConfig`] 描述一个分层 provider：名称前缀与是否直接返回底层结果；
//! - [`ProviderProfile`] 以数据形式声明 provider 身份及其能力描述符，便于测试与演示装配；
//! - 解析失败统一返回 [`ConfigError`]，前缀非法时不会构造出配置。

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::LayerError;
use crate::info::{Info, Provider};
use crate::layer::{NameLayering, ResolveRequest, Resolver, layered_getinfo};
use crate::name::DELIMITER;

/// 配置装载失败。
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to decode TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid layer prefix `{prefix}`: must be non-empty and must not contain `_`")]
    InvalidPrefix { prefix: String },
}

impl ConfigError {
    /// 稳定错误码。
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Toml(_) => "spark.fabric.config.decode_failed",
            Self::InvalidPrefix { .. } => "spark.fabric.config.invalid_prefix",
        }
    }
}

/// 分层 provider 配置。
///
/// ```toml
/// prefix = "rxm"
/// get_base_info = false
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayeringConfig {
    /// 分层名称前缀，同时是分层 provider 自身的名称。
    pub prefix: String,
    /// 为真时跳过向上翻译，直接返回底层描述符。
    #[serde(default)]
    pub get_base_info: bool,
}

impl LayeringConfig {
    pub fn new(prefix: impl Into<String>) -> Result<Self, ConfigError> {
        let config = Self {
            prefix: prefix.into(),
            get_base_info: false,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.prefix.is_empty() || self.prefix.contains(DELIMITER) {
            return Err(ConfigError::InvalidPrefix {
                prefix: self.prefix.clone(),
            });
        }
        Ok(())
    }

    /// 以 [`NameLayering`] 作为翻译规则执行分层解析。
    pub fn getinfo<R>(
        &self,
        request: &ResolveRequest<'_>,
        prov: &Provider,
        prov_info: &Info,
        hints: Option<&Info>,
        resolver: &R,
    ) -> Result<Info, LayerError<R::Error>>
    where
        R: Resolver + ?Sized,
    {
        layered_getinfo(
            request,
            prov,
            prov_info,
            hints,
            &NameLayering::from_config(self),
            resolver,
            self.get_base_info,
        )
    }
}

/// provider 身份与能力描述符。
///
/// ```toml
/// [provider]
/// name = "verbs"
/// version = 1
///
/// [info]
/// caps = "MSG | RMA"
/// addr_format = "sockaddr_ib"
///
/// [info.domain_attr]
/// name = "mlx5_0"
/// threading = "domain"
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderProfile {
    pub provider: Provider,
    #[serde(default)]
    pub info: Info,
}

impl ProviderProfile {
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(raw)?)
    }
}
