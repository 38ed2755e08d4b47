//! # error 模块说明
//!
//! ## 角色定位（Why）
//! - 集中定义能力协商核心可能返回的全部失败语义：名称解析失败、不兼容、分配失败与底层委托失败；
//! - 每个错误都带有稳定错误码（`spark.fabric.*`），便于上层按码聚合告警或切换 provider。
//!
//! ## 设计要求（What）
//! - 所有错误类型派生 `thiserror::Error`；
//! - 不兼容错误按违反的字段细分，并在掩码类检查中携带“支持值/请求值”；
//! - 核心内的失败从不致命：调用方应尝试其他 provider 或放宽 hints。

use thiserror::Error;

use crate::caps::{Caps, Mode, MrMode, MsgOrder, OpFlags};
use crate::info::{QueueKind, QueueLimit};
use crate::model::{
    AddrFormat, AvType, EndpointType, ProgressModel, Protocol, ResourceMgmt, ThreadingModel,
};

/// 名称解析失败。
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ParseError {
    /// 名称中的 `_` 分段少于要求的数量。
    #[error("name `{name}` has {found} `_`-delimited token(s), expected {expected}")]
    TooFewTokens {
        name: String,
        expected: usize,
        found: usize,
    },
    /// 调用方请求 0 个分段。
    #[error("token count must be at least one")]
    ZeroTokens,
}

impl ParseError {
    /// 稳定错误码。
    pub const fn code(&self) -> &'static str {
        match self {
            Self::TooFewTokens { .. } => "spark.fabric.name.too_few_tokens",
            Self::ZeroTokens => "spark.fabric.name.zero_tokens",
        }
    }
}

/// 用户请求与 provider 声明不兼容。
///
/// # 教案式说明
/// - **意图（Why）**：检查器在首个违反处立即返回，变体即“违反了哪个字段”，
///   上层可据此决定放宽哪一项 hints；
/// - **契约（What）**：掩码类变体携带 provider 支持值与用户请求值；数值上限类携带两侧数值；
/// - **风险（Trade-offs）**：名称类变体只保存请求的名称，避免在热路径上克隆 provider 侧字符串。
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum Incompatible {
    #[error("unsupported capabilities: supported {supported}, requested {requested}")]
    Caps { supported: Caps, requested: Caps },

    #[error("needed mode not set: expected {expected}, given {given}")]
    Mode { expected: Mode, given: Mode },

    #[error("address format {requested:?} not supported by {supported:?}")]
    AddrFormat {
        supported: AddrFormat,
        requested: AddrFormat,
    },

    #[error("unknown fabric name `{requested}`")]
    FabricName { requested: String },

    #[error("unsupported provider version: supported {supported}, requested {requested}")]
    ProviderVersion { supported: u32, requested: u32 },

    #[error("unknown domain name `{requested}`")]
    DomainName { requested: String },

    #[error("invalid threading model: provider {supported:?}, requested {requested:?}")]
    Threading {
        supported: ThreadingModel,
        requested: ThreadingModel,
    },

    #[error("invalid control progress model: provider {supported:?}, requested {requested:?}")]
    ControlProgress {
        supported: ProgressModel,
        requested: ProgressModel,
    },

    #[error("invalid data progress model: provider {supported:?}, requested {requested:?}")]
    DataProgress {
        supported: ProgressModel,
        requested: ProgressModel,
    },

    #[error("invalid resource mgmt model: provider {supported:?}, requested {requested:?}")]
    ResourceMgmt {
        supported: ResourceMgmt,
        requested: ResourceMgmt,
    },

    #[error("invalid AV type: provider {supported:?}, requested {requested:?}")]
    AvType {
        supported: AvType,
        requested: AvType,
    },

    #[error("invalid memory registration mode: provider {supported}, requested {requested}")]
    MrMode { supported: MrMode, requested: MrMode },

    #[error("CQ data size too large: supported {supported}, requested {requested}")]
    CqDataSize { supported: usize, requested: usize },

    #[error("unsupported endpoint type: provider {supported:?}, requested {requested:?}")]
    EndpointType {
        supported: EndpointType,
        requested: EndpointType,
    },

    #[error("unsupported protocol: provider {}, requested {}", .supported.0, .requested.0)]
    Protocol {
        supported: Protocol,
        requested: Protocol,
    },

    #[error("unsupported protocol version: supported {supported}, requested {requested}")]
    ProtocolVersion { supported: u32, requested: u32 },

    #[error("max message size too large: supported {supported}, requested {requested}")]
    MaxMsgSize { supported: usize, requested: usize },

    #[error("{queue} caps not supported: supported {supported}, requested {requested}")]
    QueueCaps {
        queue: QueueKind,
        supported: Caps,
        requested: Caps,
    },

    #[error("{queue} needed mode not set: expected {expected}, given {given}")]
    QueueMode {
        queue: QueueKind,
        expected: Mode,
        given: Mode,
    },

    #[error("{queue} op_flags not supported: supported {supported}, requested {requested}")]
    OpFlags {
        queue: QueueKind,
        supported: OpFlags,
        requested: OpFlags,
    },

    #[error("{queue} msg_order not supported: supported {supported}, requested {requested}")]
    MsgOrder {
        queue: QueueKind,
        supported: MsgOrder,
        requested: MsgOrder,
    },

    #[error("{queue} comp_order not supported: supported {supported}, requested {requested}")]
    CompOrder {
        queue: QueueKind,
        supported: MsgOrder,
        requested: MsgOrder,
    },

    #[error("{queue} {} too large: supported {supported}, requested {requested}", .limit.as_str())]
    QueueLimit {
        queue: QueueKind,
        limit: QueueLimit,
        supported: usize,
        requested: usize,
    },
}

impl Incompatible {
    /// 稳定错误码，格式为 `spark.fabric.incompatible.<field>`。
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Caps { .. } => "spark.fabric.incompatible.caps",
            Self::Mode { .. } => "spark.fabric.incompatible.mode",
            Self::AddrFormat { .. } => "spark.fabric.incompatible.addr_format",
            Self::FabricName { .. } => "spark.fabric.incompatible.fabric_name",
            Self::ProviderVersion { .. } => "spark.fabric.incompatible.prov_version",
            Self::DomainName { .. } => "spark.fabric.incompatible.domain_name",
            Self::Threading { .. } => "spark.fabric.incompatible.threading",
            Self::ControlProgress { .. } => "spark.fabric.incompatible.control_progress",
            Self::DataProgress { .. } => "spark.fabric.incompatible.data_progress",
            Self::ResourceMgmt { .. } => "spark.fabric.incompatible.resource_mgmt",
            Self::AvType { .. } => "spark.fabric.incompatible.av_type",
            Self::MrMode { .. } => "spark.fabric.incompatible.mr_mode",
            Self::CqDataSize { .. } => "spark.fabric.incompatible.cq_data_size",
            Self::EndpointType { .. } => "spark.fabric.incompatible.ep_type",
            Self::Protocol { .. } => "spark.fabric.incompatible.protocol",
            Self::ProtocolVersion { .. } => "spark.fabric.incompatible.protocol_version",
            Self::MaxMsgSize { .. } => "spark.fabric.incompatible.max_msg_size",
            Self::QueueCaps { .. } => "spark.fabric.incompatible.queue_caps",
            Self::QueueMode { .. } => "spark.fabric.incompatible.queue_mode",
            Self::OpFlags { .. } => "spark.fabric.incompatible.op_flags",
            Self::MsgOrder { .. } => "spark.fabric.incompatible.msg_order",
            Self::CompOrder { .. } => "spark.fabric.incompatible.comp_order",
            Self::QueueLimit { .. } => "spark.fabric.incompatible.queue_limit",
        }
    }
}

/// 描述符转换回调的失败。
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum TransformError {
    /// 无法分配转换结果。
    #[error("out of memory while transforming descriptor")]
    OutOfMemory,
    /// 分层名称无法拆解。
    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// 分层解析流程的失败。
///
/// # 教案式说明
/// - **意图（Why）**：把“预检不兼容”“转换失败”“底层 provider 失败”区分开，
///   使调用方能判断问题出在本层还是底层；
/// - **契约（What）**：`Delegated` 原样承载底层 provider 的错误，不做任何改写；
/// - **执行（How）**：无论从哪个分支返回，转换出的中间描述符均已释放。
#[derive(Debug, Error)]
pub enum LayerError<E> {
    #[error(transparent)]
    Incompatible(#[from] Incompatible),

    #[error("out of memory while translating layered descriptor")]
    OutOfMemory,

    #[error(transparent)]
    Parse(ParseError),

    #[error("base provider resolution failed: {0}")]
    Delegated(E),
}

impl<E> LayerError<E> {
    /// 稳定错误码；底层失败统一归入 `spark.fabric.layer.delegated`。
    pub fn code(&self) -> &'static str {
        match self {
            Self::Incompatible(err) => err.code(),
            Self::OutOfMemory => "spark.fabric.layer.out_of_memory",
            Self::Parse(err) => err.code(),
            Self::Delegated(_) => "spark.fabric.layer.delegated",
        }
    }
}

impl<E> From<TransformError> for LayerError<E> {
    fn from(value: TransformError) -> Self {
        match value {
            TransformError::OutOfMemory => Self::OutOfMemory,
            TransformError::Parse(err) => Self::Parse(err),
        }
    }
}
