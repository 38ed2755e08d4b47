//! 能力描述符中的位掩码类型。
//!
//! ## 模块定位（Why）
//! - 能力（caps）、模式（mode）、操作标志、消息序与内存注册模式均以位集合表达，
//!   兼容性判断归结为子集/超集关系；
//! - 主能力位与次能力位的划分决定协商阶段的合并规则，集中在此处声明为编译期常量。
//!
//! ## 契约说明（What）
//! - 所有位值与 fabric ABI 保持一致，便于直接与 provider 的原始掩码互转（`from_bits_retain`）；
//! - `Display` 输出 `MSG | TAGGED` 形式，供诊断日志中的 “Supported/Requested” 使用；
//! - 序列化为同样的文本形式，配置文件可以直接书写标志名。

use core::fmt;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// 端点能力位。既用于用户请求（opt-in），也用于 provider 的能力声明。
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct Caps: u64 {
        /// 消息收发。
        const MSG = 1 << 1;
        /// 远端内存读写。
        const RMA = 1 << 2;
        /// 带标签的消息匹配。
        const TAGGED = 1 << 3;
        /// 远端原子操作。
        const ATOMIC = 1 << 4;
        /// 组播。
        const MULTICAST = 1 << 5;
        /// 发起远端读。
        const READ = 1 << 8;
        /// 发起远端写。
        const WRITE = 1 << 9;
        /// 接收方向。
        const RECV = 1 << 10;
        /// 发送方向。
        const SEND = 1 << 11;
        /// 作为远端读的目标。
        const REMOTE_READ = 1 << 12;
        /// 作为远端写的目标。
        const REMOTE_WRITE = 1 << 13;
        /// 单个接收缓冲承载多条消息。
        const MULTI_RECV = 1 << 16;
        const TRIGGER = 1 << 20;
        const FENCE = 1 << 21;
        /// 同节点通信。
        const LOCAL_COMM = 1 << 51;
        /// 跨节点通信。
        const REMOTE_COMM = 1 << 52;
        /// 跨进程共享地址向量。
        const SHARED_AV = 1 << 53;
        /// RMA 目标侧完成事件。
        const RMA_EVENT = 1 << 56;
        /// 完成数据中携带源地址。
        const SOURCE = 1 << 57;
        /// 指定远端接收上下文。
        const NAMED_RX_CTX = 1 << 58;
        /// 按源地址匹配接收。
        const DIRECTED_RECV = 1 << 59;
    }
}

/// 主能力位：彼此互斥的语义类别，协商时由用户选择完全覆盖默认值。
pub const PRIMARY_CAPS: Caps = Caps::MSG
    .union(Caps::RMA)
    .union(Caps::TAGGED)
    .union(Caps::ATOMIC)
    .union(Caps::MULTICAST)
    .union(Caps::NAMED_RX_CTX)
    .union(Caps::DIRECTED_RECV)
    .union(Caps::READ)
    .union(Caps::WRITE)
    .union(Caps::RECV)
    .union(Caps::SEND)
    .union(Caps::REMOTE_READ)
    .union(Caps::REMOTE_WRITE);

/// 次能力位：叠加型修饰位，协商时始终从默认值保留。
pub const SECONDARY_CAPS: Caps = Caps::MULTI_RECV
    .union(Caps::SOURCE)
    .union(Caps::RMA_EVENT)
    .union(Caps::SHARED_AV)
    .union(Caps::TRIGGER)
    .union(Caps::FENCE)
    .union(Caps::LOCAL_COMM)
    .union(Caps::REMOTE_COMM);

bitflags! {
    /// 模式位：provider 要求调用方承担的义务，用户必须全部接受。
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct Mode: u64 {
        /// 每个操作上下文需使用 provider 可写的上下文结构。
        const CONTEXT = 1 << 59;
        /// 收发缓冲需预留消息前缀空间。
        const MSG_PREFIX = 1 << 58;
        /// IO 向量在操作完成前由应用保持有效。
        const ASYNC_IOV = 1 << 57;
        /// 远端 CQ 数据需要预先提交接收缓冲。
        const RX_CQ_DATA = 1 << 56;
        /// 本地缓冲需注册。
        const LOCAL_MR = 1 << 55;
        const NOTIFY_FLAGS_ONLY = 1 << 54;
        const RESTRICTED_COMP = 1 << 53;
        const CONTEXT2 = 1 << 52;
    }
}

bitflags! {
    /// 收发队列的默认操作标志。
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct OpFlags: u64 {
        const MULTI_RECV = 1 << 16;
        const REMOTE_CQ_DATA = 1 << 17;
        const MORE = 1 << 18;
        const PEEK = 1 << 19;
        const TRIGGER = 1 << 20;
        const FENCE = 1 << 21;
        const COMPLETION = 1 << 24;
        const INJECT = 1 << 25;
        const INJECT_COMPLETE = 1 << 26;
        const TRANSMIT_COMPLETE = 1 << 27;
        const DELIVERY_COMPLETE = 1 << 28;
        const AFFINITY = 1 << 29;
        const COMMIT_COMPLETE = 1 << 30;
    }
}

bitflags! {
    /// 消息序与完成序掩码。(x)A(y) 表示 y 之后的 x 不会越过 y。
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct MsgOrder: u64 {
        const RAR = 1 << 0;
        const RAW = 1 << 1;
        const RAS = 1 << 2;
        const WAR = 1 << 3;
        const WAW = 1 << 4;
        const WAS = 1 << 5;
        const SAR = 1 << 6;
        const SAW = 1 << 7;
        const SAS = 1 << 8;
        const STRICT = 0x1ff;
        const DATA = 1 << 16;
    }
}

bitflags! {
    /// 内存注册模式。
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct MrMode: u32 {
        const BASIC = 1 << 0;
        const SCALABLE = 1 << 1;
        const LOCAL = 1 << 2;
        const RAW = 1 << 3;
        const VIRT_ADDR = 1 << 4;
        const ALLOCATED = 1 << 5;
        const PROV_KEY = 1 << 6;
        const MMU_NOTIFY = 1 << 7;
        const RMA_EVENT = 1 << 8;
        const ENDPOINT = 1 << 9;
    }
}

macro_rules! flag_set_impls {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl Default for $ty {
                fn default() -> Self {
                    Self::empty()
                }
            }

            impl fmt::Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    if self.is_empty() {
                        return f.write_str("none");
                    }
                    bitflags::parser::to_writer(self, f)
                }
            }
        )+
    };
}

flag_set_impls!(Caps, Mode, OpFlags, MsgOrder, MrMode);

impl Caps {
    /// 主/次能力位的合并：`primary` 贡献主能力位，`secondary` 贡献次能力位。
    ///
    /// - 协商阶段的所有能力重算都归结为这一公式；
    /// - 不属于任一分区的位会被丢弃。
    #[must_use]
    pub const fn partition_merge(primary: Caps, secondary: Caps) -> Caps {
        primary
            .intersection(PRIMARY_CAPS)
            .union(secondary.intersection(SECONDARY_CAPS))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partitions_are_disjoint() {
        assert!(PRIMARY_CAPS.intersection(SECONDARY_CAPS).is_empty());
    }

    #[test]
    fn display_joins_flag_names() {
        assert_eq!((Caps::MSG | Caps::TAGGED).to_string(), "MSG | TAGGED");
        assert_eq!(Mode::empty().to_string(), "none");
    }

    #[test]
    fn partition_merge_takes_each_half_from_its_source() {
        let merged = Caps::partition_merge(
            Caps::TAGGED | Caps::SOURCE,
            Caps::MSG | Caps::MULTI_RECV,
        );
        assert_eq!(merged, Caps::TAGGED | Caps::MULTI_RECV);
    }
}
