//! 能力描述符及其嵌套属性记录。
//!
//! ## 契约说明（What）
//! - [`Info`] 是用户请求（hints）与 provider 声明共用的顶层记录；
//! - 嵌套记录以 `Option` 表达：用户侧缺失表示“不约束”，协商侧缺失表示“沿用默认值”；
//! - 数值字段中的 `0` 在用户侧意为“未指定”，协商时不会覆盖默认值。
//!
//! ## 生命周期（How）
//! - 描述符由 provider 的解析入口或用户构造，检查阶段只读借用；
//! - 分层转换时会克隆出新的描述符，其所有权归转换器，直至交还调用方。

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::caps::{Caps, Mode, MrMode, MsgOrder, OpFlags};
use crate::model::{
    AddrFormat, AvType, EndpointType, ProgressModel, Protocol, ResourceMgmt, ThreadingModel,
};

/// provider 身份，诊断日志会携带其名称。
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provider {
    /// provider 名称，例如 `verbs` 或 `rxm`。
    pub name: String,
    /// provider 实现版本。
    #[serde(default)]
    pub version: u32,
}

impl Provider {
    /// 构造 provider 身份。
    pub fn new(name: impl Into<String>, version: u32) -> Self {
        Self {
            name: name.into(),
            version,
        }
    }
}

/// fabric 级属性。
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FabricAttr {
    /// fabric 名称；分层 provider 的名称编码了底层身份。
    pub name: Option<String>,
    /// provider 名称；对分层 provider 而言记录底层 provider。
    pub prov_name: Option<String>,
    /// provider 版本。用户侧表示要求的最低版本。
    pub prov_version: u32,
}

/// domain 级属性。
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DomainAttr {
    pub name: Option<String>,
    pub threading: ThreadingModel,
    pub control_progress: ProgressModel,
    pub data_progress: ProgressModel,
    pub resource_mgmt: ResourceMgmt,
    pub av_type: AvType,
    pub mr_mode: MrMode,
    /// 完成队列可携带的远端数据字节数上限。
    pub cq_data_size: usize,
}

/// 端点属性。
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EpAttr {
    pub ep_type: EndpointType,
    pub protocol: Protocol,
    pub protocol_version: u32,
    pub max_msg_size: usize,
    /// 发送上下文数量；`0` 表示默认。
    pub tx_ctx_cnt: usize,
    /// 接收上下文数量；`0` 表示默认。
    pub rx_ctx_cnt: usize,
}

/// 接收队列属性。
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RxAttr {
    pub caps: Caps,
    pub mode: Mode,
    pub op_flags: OpFlags,
    pub msg_order: MsgOrder,
    pub comp_order: MsgOrder,
    /// provider 可缓冲的未匹配接收数据总量。
    pub total_buffered_recv: usize,
    /// 队列深度。
    pub size: usize,
    pub iov_limit: usize,
}

/// 发送队列属性。
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TxAttr {
    pub caps: Caps,
    pub mode: Mode,
    pub op_flags: OpFlags,
    pub msg_order: MsgOrder,
    pub comp_order: MsgOrder,
    /// 可内联发送的最大字节数。
    pub inject_size: usize,
    /// 队列深度。
    pub size: usize,
    pub iov_limit: usize,
    pub rma_iov_limit: usize,
}

/// 顶层能力描述符。
///
/// # 教案式说明
/// - **意图（Why）**：用户与 provider 使用同一结构表达“想要什么”与“能提供什么”，
///   兼容性检查与协商因此可以逐字段对应；
/// - **契约（What）**：`caps` 为可选特性（opt-in），`mode` 为 provider 施加的义务；
///   嵌套记录缺失时不参与检查；
/// - **风险（Trade-offs）**：记录以值语义持有，分层转换时需要整体克隆，换取无共享可变状态。
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Info {
    pub caps: Caps,
    pub mode: Mode,
    pub addr_format: AddrFormat,
    pub fabric_attr: Option<FabricAttr>,
    pub domain_attr: Option<DomainAttr>,
    pub ep_attr: Option<EpAttr>,
    pub rx_attr: Option<RxAttr>,
    pub tx_attr: Option<TxAttr>,
}

impl Info {
    /// 仅指定能力与模式的描述符，其余字段取默认值。
    pub fn with_caps(caps: Caps, mode: Mode) -> Self {
        Self {
            caps,
            mode,
            ..Self::default()
        }
    }
}

/// 收发队列种类，用于诊断与错误中标注违反发生在哪一侧。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum QueueKind {
    Rx,
    Tx,
}

impl QueueKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Rx => "rx",
            Self::Tx => "tx",
        }
    }
}

impl fmt::Display for QueueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 队列上的数值上限字段。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum QueueLimit {
    TotalBufferedRecv,
    InjectSize,
    Size,
    IovLimit,
    RmaIovLimit,
}

impl QueueLimit {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TotalBufferedRecv => "total_buffered_recv",
            Self::InjectSize => "inject_size",
            Self::Size => "size",
            Self::IovLimit => "iov_limit",
            Self::RmaIovLimit => "rma_iov_limit",
        }
    }
}

/// 收发队列属性的统一视图。
///
/// # 教案式说明
/// - **意图（Why）**：接收与发送队列共享掩码检查与合并规则，差异只在数值上限字段；
/// - **契约（What）**：[`QueueAttr::LIMITS`] 按检查顺序列出该队列拥有的上限字段，
///   [`QueueAttr::limit`] 与 [`QueueAttr::limit_mut`] 对不属于该队列的字段分别返回 `0` 与 `None`；
/// - **执行（How）**：检查器与协商器都只经由此 trait 访问队列，接收/发送两侧各实现一次。
pub trait QueueAttr {
    const KIND: QueueKind;
    const LIMITS: &'static [QueueLimit];

    fn caps(&self) -> Caps;
    fn caps_mut(&mut self) -> &mut Caps;
    fn mode(&self) -> Mode;
    fn op_flags(&self) -> OpFlags;
    fn op_flags_mut(&mut self) -> &mut OpFlags;
    fn msg_order(&self) -> MsgOrder;
    fn comp_order(&self) -> MsgOrder;
    fn limit(&self, limit: QueueLimit) -> usize;
    fn limit_mut(&mut self, limit: QueueLimit) -> Option<&mut usize>;
}

macro_rules! queue_attr_common {
    () => {
        fn caps(&self) -> Caps {
            self.caps
        }

        fn caps_mut(&mut self) -> &mut Caps {
            &mut self.caps
        }

        fn mode(&self) -> Mode {
            self.mode
        }

        fn op_flags(&self) -> OpFlags {
            self.op_flags
        }

        fn op_flags_mut(&mut self) -> &mut OpFlags {
            &mut self.op_flags
        }

        fn msg_order(&self) -> MsgOrder {
            self.msg_order
        }

        fn comp_order(&self) -> MsgOrder {
            self.comp_order
        }
    };
}

impl QueueAttr for RxAttr {
    const KIND: QueueKind = QueueKind::Rx;
    const LIMITS: &'static [QueueLimit] = &[
        QueueLimit::TotalBufferedRecv,
        QueueLimit::Size,
        QueueLimit::IovLimit,
    ];

    queue_attr_common!();

    fn limit(&self, limit: QueueLimit) -> usize {
        match limit {
            QueueLimit::TotalBufferedRecv => self.total_buffered_recv,
            QueueLimit::Size => self.size,
            QueueLimit::IovLimit => self.iov_limit,
            QueueLimit::InjectSize | QueueLimit::RmaIovLimit => 0,
        }
    }

    fn limit_mut(&mut self, limit: QueueLimit) -> Option<&mut usize> {
        match limit {
            QueueLimit::TotalBufferedRecv => Some(&mut self.total_buffered_recv),
            QueueLimit::Size => Some(&mut self.size),
            QueueLimit::IovLimit => Some(&mut self.iov_limit),
            QueueLimit::InjectSize | QueueLimit::RmaIovLimit => None,
        }
    }
}

impl QueueAttr for TxAttr {
    const KIND: QueueKind = QueueKind::Tx;
    const LIMITS: &'static [QueueLimit] = &[
        QueueLimit::InjectSize,
        QueueLimit::Size,
        QueueLimit::IovLimit,
        QueueLimit::RmaIovLimit,
    ];

    queue_attr_common!();

    fn limit(&self, limit: QueueLimit) -> usize {
        match limit {
            QueueLimit::InjectSize => self.inject_size,
            QueueLimit::Size => self.size,
            QueueLimit::IovLimit => self.iov_limit,
            QueueLimit::RmaIovLimit => self.rma_iov_limit,
            QueueLimit::TotalBufferedRecv => 0,
        }
    }

    fn limit_mut(&mut self, limit: QueueLimit) -> Option<&mut usize> {
        match limit {
            QueueLimit::InjectSize => Some(&mut self.inject_size),
            QueueLimit::Size => Some(&mut self.size),
            QueueLimit::IovLimit => Some(&mut self.iov_limit),
            QueueLimit::RmaIovLimit => Some(&mut self.rma_iov_limit),
            QueueLimit::TotalBufferedRecv => None,
        }
    }
}
