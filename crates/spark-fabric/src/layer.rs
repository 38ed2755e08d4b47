//! 分层 provider 的描述符转换流程。
//!
//! ## 模块定位（Why）
//! - 分层 provider（例如 `rxm`）自身不直接访问硬件，而是把用户请求翻译给底层 provider，
//!   再把底层返回的描述符翻译回分层视角；
//! - 两个方向的翻译规则随分层 provider 而变，由 [`InfoTransform`] 注入；底层解析入口由
//!   [`Resolver`] 注入。
//!
//! ## 流程（How）
//! 1. 以 [`CheckType::Layered`] 执行兼容性检查，不兼容立即返回；
//! 2. 用户 hints → 底层 hints；
//! 3. 调用底层解析入口，失败原样包装为 [`LayerError::Delegated`]；
//! 4. 请求底层视角时直接返回底层结果，否则翻译回分层视角。
//!
//! ## 资源（Trade-offs）
//! - 中间描述符均为栈上拥有的值，任一出口返回时随作用域释放；
//! - 每次调用最多访问底层一次，不做重试。

use crate::LOG_TARGET;
use crate::check::{CheckType, check_info};
use crate::config::LayeringConfig;
use crate::error::{LayerError, TransformError};
use crate::info::{Info, Provider};

/// 透传给底层解析入口的请求参数。
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ResolveRequest<'a> {
    /// 调用方期望的 API 版本。
    pub version: u32,
    pub node: Option<&'a str>,
    pub service: Option<&'a str>,
    pub flags: u64,
}

/// 底层 provider 的解析入口。
///
/// # 教案式说明
/// - **契约（What）**：给定请求与（已翻译为底层视角的）hints，返回一份底层描述符；
/// - **风险（Trade-offs）**：实现可以阻塞；分层流程对其只调用一次，错误类型由实现自定。
pub trait Resolver {
    type Error;

    fn resolve(
        &self,
        request: &ResolveRequest<'_>,
        hints: Option<&Info>,
    ) -> Result<Info, Self::Error>;
}

impl<R: Resolver + ?Sized> Resolver for &R {
    type Error = R::Error;

    fn resolve(
        &self,
        request: &ResolveRequest<'_>,
        hints: Option<&Info>,
    ) -> Result<Info, Self::Error> {
        (**self).resolve(request, hints)
    }
}

/// 分层视角与底层视角之间的双向翻译。
pub trait InfoTransform {
    /// 用户 hints（分层视角）→ 底层 hints。用户未给出 hints 时仍需产出一份底层 hints。
    fn to_base_hints(&self, hints: Option<&Info>) -> Result<Info, TransformError>;

    /// 底层描述符 → 分层视角的描述符。
    fn from_base_info(&self, base: &Info) -> Result<Info, TransformError>;
}

/// 以两个闭包实现 [`InfoTransform`]；闭包返回 `None` 视为分配失败。
#[derive(Clone, Debug)]
pub struct FnTransform<D, U> {
    down: D,
    up: U,
}

impl<D, U> FnTransform<D, U>
where
    D: Fn(Option<&Info>) -> Option<Info>,
    U: Fn(&Info) -> Option<Info>,
{
    pub fn new(down: D, up: U) -> Self {
        Self { down, up }
    }
}

impl<D, U> InfoTransform for FnTransform<D, U>
where
    D: Fn(Option<&Info>) -> Option<Info>,
    U: Fn(&Info) -> Option<Info>,
{
    fn to_base_hints(&self, hints: Option<&Info>) -> Result<Info, TransformError> {
        (self.down)(hints).ok_or(TransformError::OutOfMemory)
    }

    fn from_base_info(&self, base: &Info) -> Result<Info, TransformError> {
        (self.up)(base).ok_or(TransformError::OutOfMemory)
    }
}

/// 仅改写 fabric/domain 名称的标准分层翻译。
///
/// - 向下：`rxm_verbs_IB-1234` → fabric `IB-1234`（provider `verbs`），`rxm_mlx5_0` → domain `mlx5_0`；
/// - 向上：以 `prefix` 重新拼出分层名称，fabric 记录的 `prov_name` 保持为底层 provider；
/// - 其余字段原样复制。
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NameLayering {
    prefix: String,
}

impl NameLayering {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn from_config(config: &LayeringConfig) -> Self {
        Self::new(config.prefix.clone())
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }
}

impl InfoTransform for NameLayering {
    fn to_base_hints(&self, hints: Option<&Info>) -> Result<Info, TransformError> {
        let Some(hints) = hints else {
            return Ok(Info::default());
        };
        let mut base = hints.clone();
        if let Some(fabric) = hints.fabric_attr.as_ref() {
            base.fabric_attr = Some(fabric.to_base()?);
        }
        if let Some(domain) = hints.domain_attr.as_ref() {
            base.domain_attr = Some(domain.to_base()?);
        }
        Ok(base)
    }

    fn from_base_info(&self, base: &Info) -> Result<Info, TransformError> {
        let mut layered = base.clone();
        layered.fabric_attr = base
            .fabric_attr
            .as_ref()
            .map(|fabric| fabric.from_base(&self.prefix));
        layered.domain_attr = base
            .domain_attr
            .as_ref()
            .map(|domain| domain.from_base(&self.prefix));
        Ok(layered)
    }
}

/// 分层 provider 的解析入口。
///
/// # 教案式说明
/// - **意图（Why）**：把“预检 → 向下翻译 → 委托底层 → 向上翻译”固定为一处实现，
///   各分层 provider 只需提供翻译规则；
/// - **契约（What）**：
///   - 预检失败返回 [`LayerError::Incompatible`]，底层从未被调用；
///   - 翻译失败返回 [`LayerError::OutOfMemory`] 或 [`LayerError::Parse`]；
///   - 底层失败原样返回 [`LayerError::Delegated`]；
///   - `get_base_info` 为真时返回未经翻译的底层结果；
/// - **执行（How）**：底层 hints 与底层结果都是局部值，任一出口均随作用域释放。
pub fn layered_getinfo<T, R>(
    request: &ResolveRequest<'_>,
    prov: &Provider,
    prov_info: &Info,
    hints: Option<&Info>,
    transform: &T,
    resolver: &R,
    get_base_info: bool,
) -> Result<Info, LayerError<R::Error>>
where
    T: InfoTransform + ?Sized,
    R: Resolver + ?Sized,
{
    check_info(prov, prov_info, hints, CheckType::Layered)?;

    let base_hints = transform.to_base_hints(hints)?;
    tracing::debug!(
        target: LOG_TARGET,
        provider = %prov.name,
        get_base_info,
        "delegating to base provider"
    );
    let base_info = resolver
        .resolve(request, Some(&base_hints))
        .map_err(LayerError::Delegated)?;

    if get_base_info {
        return Ok(base_info);
    }
    Ok(transform.from_base_info(&base_info)?)
}
