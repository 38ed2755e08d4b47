//! # spark-fabric
//!
//! ## 定位与职责（Why）
//! - fabric 网络栈中 provider 的能力协商核心：用户以能力描述符（hints）表达需求，
//!   provider 据此判断能否满足，并把自身默认值调整为最终交付的描述符；
//! - 分层 provider（例如在 `verbs` 之上提供可靠数据报的 `rxm`）借助本 crate 完成名称编解码、
//!   描述符双向翻译与底层委托。
//!
//! ## 模块地图（What）
//! - `caps`：能力、模式等位掩码及主/次能力位分区；
//! - `model`：有序模型（线程、进度、资源管理）的等级比较与其余枚举标签；
//! - `info`：描述符及其嵌套属性记录；
//! - `name`：`_` 分隔的分层名称拆解与拼接；
//! - `check`：按固定顺序执行的兼容性检查，首个违反即返回；
//! - `layer`：分层 provider 的“预检 → 向下翻译 → 委托 → 向上翻译”流程；
//! - `alter`：hints 与 provider 默认值的合并；
//! - `config`：分层配置与 provider 描述文件的 TOML 装载；
//! - `error`：带稳定错误码的错误类型。
//!
//! ## 运行模型（How）
//! - 全部操作同步执行，不持有共享可变状态；诊断经由 `tracing` 以 `INFO` 级别输出到
//!   target `spark_fabric::core`，订阅者由宿主安装；
//! - 日志从不影响控制流。
//!
//! ## 风险提示（Trade-offs）
//! - `op_flags` 默认不参与兼容性判定，需要严格检查时使用 [`CheckOptions`]。

pub mod alter;
pub mod caps;
pub mod check;
pub mod config;
pub mod error;
pub mod info;
pub mod layer;
pub mod model;
pub mod name;

/// 诊断日志使用的 tracing target。
pub(crate) const LOG_TARGET: &str = "spark_fabric::core";

pub use alter::alter_info;
pub use caps::{Caps, Mode, MrMode, MsgOrder, OpFlags, PRIMARY_CAPS, SECONDARY_CAPS};
pub use check::{CheckOptions, CheckType, check_info, check_info_with};
pub use config::{ConfigError, LayeringConfig, ProviderProfile};
pub use error::{Incompatible, LayerError, ParseError, TransformError};
pub use info::{
    DomainAttr, EpAttr, FabricAttr, Info, Provider, QueueAttr, QueueKind, QueueLimit, RxAttr,
    TxAttr,
};
pub use layer::{
    FnTransform, InfoTransform, NameLayering, ResolveRequest, Resolver, layered_getinfo,
};
pub use model::{
    AddrFormat, AvType, EndpointType, OrderedModel, ProgressModel, Protocol, ResourceMgmt,
    ThreadingModel,
};
pub use name::{NameTokens, ParseMode, check_name, parse_name};
