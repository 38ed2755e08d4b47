//! 有序模型与描述符中的枚举标签。
//!
//! ## 模块定位（Why）
//! - 线程模型、进度模型与资源管理模型构成全序：从“最受限/需手动”到“最宽松/自动”；
//! - 兼容性判断只需比较等级：请求等级不得低于 provider 保证的最低等级。
//!
//! ## 契约说明（What）
//! - 等级 1 为最受限，`Unspec` 恒为最高等级（匹配任意）；
//! - 无法识别的原始值映射为 `Unknown`，等级为 [`INVALID_RANK`]，低于所有合法等级，
//!   因而作为请求时必然失败；
//! - 其余标签（地址向量类型、端点类型、地址格式、协议）仅做相等或族内包含判断。

use serde::{Deserialize, Serialize};

/// 未知枚举值的等级哨兵，低于所有合法等级。
pub const INVALID_RANK: i8 = -1;

/// 具备全序等级的模型。
///
/// # 教案式说明
/// - **意图（Why）**：三张等级表共享同一比较谓词，通过 trait 收敛，避免重复实现；
/// - **契约（What）**：`rank` 必须为纯函数；`Unspec` 返回最大值，未知值返回 [`INVALID_RANK`]；
/// - **逻辑（How）**：[`OrderedModel::permits`] 即 `rank(requested) >= rank(provider)`。
pub trait OrderedModel: Copy {
    /// 返回模型等级。
    fn rank(self) -> i8;

    /// 判断请求的模型是否落在 provider 保证的范围内。
    fn permits(requested: Self, provider: Self) -> bool {
        requested.rank() >= provider.rank()
    }
}

/// 线程模型，按并行度排序。
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThreadingModel {
    /// 未指定。
    #[default]
    Unspec,
    /// 所有对象均线程安全。
    Safe,
    /// 单个 fabric 对象内串行。
    Fid,
    /// 单个 domain 内串行。
    Domain,
    /// 单个完成队列内串行。
    Completion,
    /// 单个端点内串行。
    Endpoint,
    /// 原始值不在定义范围内。
    Unknown,
}

impl ThreadingModel {
    /// 从 ABI 原始值构造。
    pub const fn from_raw(raw: u32) -> Self {
        match raw {
            0 => Self::Unspec,
            1 => Self::Safe,
            2 => Self::Fid,
            3 => Self::Domain,
            4 => Self::Completion,
            5 => Self::Endpoint,
            _ => Self::Unknown,
        }
    }
}

impl OrderedModel for ThreadingModel {
    fn rank(self) -> i8 {
        match self {
            Self::Safe => 1,
            Self::Fid => 2,
            Self::Endpoint => 3,
            Self::Completion => 4,
            Self::Domain => 5,
            Self::Unspec => 6,
            Self::Unknown => INVALID_RANK,
        }
    }
}

/// 进度模型，按自动化程度排序。
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressModel {
    /// 未指定。
    #[default]
    Unspec,
    /// provider 自动推进。
    Auto,
    /// 由应用调用驱动推进。
    Manual,
    /// 原始值不在定义范围内。
    Unknown,
}

impl ProgressModel {
    /// 从 ABI 原始值构造。
    pub const fn from_raw(raw: u32) -> Self {
        match raw {
            0 => Self::Unspec,
            1 => Self::Auto,
            2 => Self::Manual,
            _ => Self::Unknown,
        }
    }
}

impl OrderedModel for ProgressModel {
    fn rank(self) -> i8 {
        match self {
            Self::Auto => 1,
            Self::Manual => 2,
            Self::Unspec => 3,
            Self::Unknown => INVALID_RANK,
        }
    }
}

/// 资源管理模型，按启用程度排序。
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceMgmt {
    /// 未指定。
    #[default]
    Unspec,
    /// 由应用保证不溢出队列。
    Disabled,
    /// provider 负责防止队列溢出。
    Enabled,
    /// 原始值不在定义范围内。
    Unknown,
}

impl ResourceMgmt {
    /// 从 ABI 原始值构造。
    pub const fn from_raw(raw: u32) -> Self {
        match raw {
            0 => Self::Unspec,
            1 => Self::Disabled,
            2 => Self::Enabled,
            _ => Self::Unknown,
        }
    }
}

impl OrderedModel for ResourceMgmt {
    fn rank(self) -> i8 {
        match self {
            Self::Enabled => 1,
            Self::Disabled => 2,
            Self::Unspec => 3,
            Self::Unknown => INVALID_RANK,
        }
    }
}

/// 地址向量类型。
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AvType {
    #[default]
    Unspec,
    Map,
    Table,
}

/// 端点类型。
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndpointType {
    #[default]
    Unspec,
    /// 面向连接的可靠消息。
    Msg,
    /// 无连接不可靠数据报。
    Dgram,
    /// 无连接可靠数据报。
    Rdm,
    SockStream,
    SockDgram,
}

/// 地址格式标签。
///
/// `Sockaddr` 与 `SockaddrIb` 是地址族，分别涵盖若干子格式，见 [`AddrFormat::accepts`]。
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AddrFormat {
    #[default]
    Unspec,
    Sockaddr,
    SockaddrIn,
    SockaddrIn6,
    SockaddrIb,
    Psmx,
    Gni,
    Bgq,
    Mlx,
    Str,
}

impl AddrFormat {
    /// 以 `self` 为 provider 格式，判断是否接受用户请求的格式。
    ///
    /// - 用户未指定时恒为真；
    /// - 通用 socket 地址接受 IPv4/IPv6 子格式；IPv4 与 IPv6 仅接受自身；
    /// - InfiniBand socket 地址额外接受 IB 格式；
    /// - 其余格式要求精确相等。
    pub fn accepts(self, user: AddrFormat) -> bool {
        if user == AddrFormat::Unspec {
            return true;
        }
        match self {
            AddrFormat::Sockaddr => matches!(
                user,
                AddrFormat::Sockaddr | AddrFormat::SockaddrIn | AddrFormat::SockaddrIn6
            ),
            AddrFormat::SockaddrIb => matches!(
                user,
                AddrFormat::Sockaddr
                    | AddrFormat::SockaddrIn
                    | AddrFormat::SockaddrIn6
                    | AddrFormat::SockaddrIb
            ),
            other => other == user,
        }
    }
}

/// 端点协议标识。协议编号是开放集合（provider 可声明私有协议），因此以新类型表达。
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Protocol(pub u32);

impl Protocol {
    pub const UNSPEC: Protocol = Protocol(0);
    pub const RDMA_CM_IB_RC: Protocol = Protocol(1);
    pub const IWARP: Protocol = Protocol(2);
    pub const IB_UD: Protocol = Protocol(3);
    pub const PSMX: Protocol = Protocol(4);
    pub const UDP: Protocol = Protocol(5);
    pub const SOCK_TCP: Protocol = Protocol(6);
    pub const RXM: Protocol = Protocol(11);

    /// 是否未指定。
    pub const fn is_unspec(self) -> bool {
        self.0 == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const THREADING: [ThreadingModel; 7] = [
        ThreadingModel::Unspec,
        ThreadingModel::Safe,
        ThreadingModel::Fid,
        ThreadingModel::Domain,
        ThreadingModel::Completion,
        ThreadingModel::Endpoint,
        ThreadingModel::Unknown,
    ];

    #[test]
    fn threading_ranks_follow_parallelism() {
        let ordered = [
            ThreadingModel::Safe,
            ThreadingModel::Fid,
            ThreadingModel::Endpoint,
            ThreadingModel::Completion,
            ThreadingModel::Domain,
            ThreadingModel::Unspec,
        ];
        for pair in ordered.windows(2) {
            assert!(pair[0].rank() < pair[1].rank(), "{pair:?}");
        }
    }

    #[test]
    fn permits_matches_rank_order_for_every_pair() {
        for user in THREADING {
            for prov in THREADING {
                assert_eq!(
                    ThreadingModel::permits(user, prov),
                    user.rank() >= prov.rank(),
                    "user={user:?} prov={prov:?}"
                );
            }
        }
    }

    #[test]
    fn unspecified_request_is_always_satisfied() {
        for prov in THREADING {
            assert!(ThreadingModel::permits(ThreadingModel::Unspec, prov));
        }
        assert!(ProgressModel::permits(ProgressModel::Unspec, ProgressModel::Manual));
        assert!(ResourceMgmt::permits(ResourceMgmt::Unspec, ResourceMgmt::Enabled));
    }

    #[test]
    fn unknown_request_never_passes_a_valid_provider() {
        assert!(!ThreadingModel::permits(
            ThreadingModel::from_raw(42),
            ThreadingModel::Safe
        ));
        assert!(!ProgressModel::permits(ProgressModel::from_raw(9), ProgressModel::Auto));
        assert!(!ResourceMgmt::permits(ResourceMgmt::from_raw(7), ResourceMgmt::Enabled));
    }

    #[test]
    fn progress_and_resource_ranks() {
        assert!(ProgressModel::permits(ProgressModel::Manual, ProgressModel::Auto));
        assert!(!ProgressModel::permits(ProgressModel::Auto, ProgressModel::Manual));
        assert!(ResourceMgmt::permits(ResourceMgmt::Disabled, ResourceMgmt::Enabled));
        assert!(!ResourceMgmt::permits(ResourceMgmt::Enabled, ResourceMgmt::Disabled));
    }

    #[test]
    fn addr_format_families() {
        use AddrFormat::*;
        assert!(Sockaddr.accepts(SockaddrIn6));
        assert!(!Sockaddr.accepts(SockaddrIb));
        assert!(SockaddrIn.accepts(SockaddrIn));
        assert!(!SockaddrIn.accepts(SockaddrIn6));
        assert!(!SockaddrIn6.accepts(SockaddrIn));
        assert!(SockaddrIb.accepts(SockaddrIn));
        assert!(SockaddrIb.accepts(SockaddrIb));
        assert!(Psmx.accepts(Unspec));
        assert!(!Psmx.accepts(Gni));
    }
}
