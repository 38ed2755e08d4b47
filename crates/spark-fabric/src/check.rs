//! 用户请求与 provider 声明之间的兼容性检查。
//!
//! ## 模块定位（Why）
//! - provider 在返回能力描述符之前，需要确认用户 hints 不超出自身能力；
//! - 检查在首个违反处停止，返回的 [`Incompatible`] 变体即“违反的字段”，同时输出一条诊断日志。
//!
//! ## 检查顺序（What）
//! 1. 用户未给出 hints：视为兼容；
//! 2. 顶层 `caps`、`mode`、`addr_format`；
//! 3. fabric、domain、endpoint 记录，仅在用户给出对应记录时检查；
//! 4. 接收队列与发送队列共用 [`check_queue_attr`]，发送队列多出 inject/rma iov 两个上限。
//!
//! ## 风险提示（Trade-offs）
//! - provider 未声明某条记录时按默认值（全零、`Unspec`）参与比较；
//! - `op_flags` 默认不参与判定，只有 [`CheckOptions::strict_op_flags`] 打开时才要求子集关系。

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use crate::LOG_TARGET;
use crate::error::Incompatible;
use crate::info::{DomainAttr, EpAttr, FabricAttr, Info, Provider, QueueAttr};
use crate::model::{
    AvType, EndpointType, OrderedModel, ProgressModel, ResourceMgmt, ThreadingModel,
};
use crate::name::check_name;

/// 名称比较方式。
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckType {
    /// 整串比较。
    #[default]
    Plain,
    /// 仅比较分层名称的首个分段。
    Layered,
}

/// 检查选项。
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CheckOptions {
    pub check: CheckType,
    /// 要求用户 `op_flags` 为 provider `op_flags` 的子集。
    pub strict_op_flags: bool,
}

impl From<CheckType> for CheckOptions {
    fn from(check: CheckType) -> Self {
        Self {
            check,
            strict_op_flags: false,
        }
    }
}

/// 以默认选项检查用户请求是否可由 provider 满足。
pub fn check_info(
    prov: &Provider,
    prov_info: &Info,
    user: Option<&Info>,
    check: CheckType,
) -> Result<(), Incompatible> {
    check_info_with(prov, prov_info, user, &CheckOptions::from(check))
}

/// 按 `options` 检查用户请求是否可由 provider 满足。
///
/// # 教案式说明
/// - **契约（What）**：只读借用两侧描述符；返回首个违反项，成功返回 `Ok(())`；
/// - **执行（How）**：按模块文档列出的顺序逐项比较，任一失败立即返回；
/// - **日志**：每个失败输出一条 `INFO` 级日志（target `spark_fabric::core`），携带 provider 名称、
///   错误码以及支持值/请求值。
pub fn check_info_with(
    prov: &Provider,
    prov_info: &Info,
    user: Option<&Info>,
    options: &CheckOptions,
) -> Result<(), Incompatible> {
    let Some(user) = user else {
        return Ok(());
    };

    if !prov_info.caps.contains(user.caps) {
        return Err(reject(
            prov,
            Incompatible::Caps {
                supported: prov_info.caps,
                requested: user.caps,
            },
        ));
    }

    if !user.mode.contains(prov_info.mode) {
        return Err(reject(
            prov,
            Incompatible::Mode {
                expected: prov_info.mode,
                given: user.mode,
            },
        ));
    }

    if !prov_info.addr_format.accepts(user.addr_format) {
        return Err(reject(
            prov,
            Incompatible::AddrFormat {
                supported: prov_info.addr_format,
                requested: user.addr_format,
            },
        ));
    }

    if let Some(user_attr) = user.fabric_attr.as_ref() {
        let prov_attr = declared(prov_info.fabric_attr.as_ref());
        check_fabric_attr(prov, &prov_attr, user_attr, options.check)?;
    }

    if let Some(user_attr) = user.domain_attr.as_ref() {
        let prov_attr = declared(prov_info.domain_attr.as_ref());
        check_domain_attr(prov, &prov_attr, user_attr, options.check)?;
    }

    if let Some(user_attr) = user.ep_attr.as_ref() {
        let prov_attr = declared(prov_info.ep_attr.as_ref());
        check_ep_attr(prov, &prov_attr, user_attr)?;
    }

    if let Some(user_attr) = user.rx_attr.as_ref() {
        let prov_attr = declared(prov_info.rx_attr.as_ref());
        check_queue_attr(prov, &*prov_attr, user_attr, options)?;
    }

    if let Some(user_attr) = user.tx_attr.as_ref() {
        let prov_attr = declared(prov_info.tx_attr.as_ref());
        check_queue_attr(prov, &*prov_attr, user_attr, options)?;
    }

    Ok(())
}

/// 检查 fabric 记录：名称匹配与 provider 最低版本。
pub fn check_fabric_attr(
    prov: &Provider,
    prov_attr: &FabricAttr,
    user_attr: &FabricAttr,
    check: CheckType,
) -> Result<(), Incompatible> {
    if let Some(requested) = user_attr.name.as_deref()
        && !check_name(requested, prov_attr.name.as_deref().unwrap_or_default(), check)
    {
        return Err(reject(
            prov,
            Incompatible::FabricName {
                requested: requested.to_owned(),
            },
        ));
    }

    if user_attr.prov_version > prov_attr.prov_version {
        return Err(reject(
            prov,
            Incompatible::ProviderVersion {
                supported: prov_attr.prov_version,
                requested: user_attr.prov_version,
            },
        ));
    }

    Ok(())
}

/// 检查 domain 记录：名称、三类有序模型、AV 类型、MR 模式与 CQ 数据长度。
pub fn check_domain_attr(
    prov: &Provider,
    prov_attr: &DomainAttr,
    user_attr: &DomainAttr,
    check: CheckType,
) -> Result<(), Incompatible> {
    if let Some(requested) = user_attr.name.as_deref()
        && !check_name(requested, prov_attr.name.as_deref().unwrap_or_default(), check)
    {
        return Err(reject(
            prov,
            Incompatible::DomainName {
                requested: requested.to_owned(),
            },
        ));
    }

    if !ThreadingModel::permits(user_attr.threading, prov_attr.threading) {
        return Err(reject(
            prov,
            Incompatible::Threading {
                supported: prov_attr.threading,
                requested: user_attr.threading,
            },
        ));
    }

    if !ProgressModel::permits(user_attr.control_progress, prov_attr.control_progress) {
        return Err(reject(
            prov,
            Incompatible::ControlProgress {
                supported: prov_attr.control_progress,
                requested: user_attr.control_progress,
            },
        ));
    }

    if !ProgressModel::permits(user_attr.data_progress, prov_attr.data_progress) {
        return Err(reject(
            prov,
            Incompatible::DataProgress {
                supported: prov_attr.data_progress,
                requested: user_attr.data_progress,
            },
        ));
    }

    if !ResourceMgmt::permits(user_attr.resource_mgmt, prov_attr.resource_mgmt) {
        return Err(reject(
            prov,
            Incompatible::ResourceMgmt {
                supported: prov_attr.resource_mgmt,
                requested: user_attr.resource_mgmt,
            },
        ));
    }

    if prov_attr.av_type != AvType::Unspec
        && user_attr.av_type != AvType::Unspec
        && prov_attr.av_type != user_attr.av_type
    {
        return Err(reject(
            prov,
            Incompatible::AvType {
                supported: prov_attr.av_type,
                requested: user_attr.av_type,
            },
        ));
    }

    if !user_attr.mr_mode.is_empty() && user_attr.mr_mode != prov_attr.mr_mode {
        return Err(reject(
            prov,
            Incompatible::MrMode {
                supported: prov_attr.mr_mode,
                requested: user_attr.mr_mode,
            },
        ));
    }

    if user_attr.cq_data_size > prov_attr.cq_data_size {
        return Err(reject(
            prov,
            Incompatible::CqDataSize {
                supported: prov_attr.cq_data_size,
                requested: user_attr.cq_data_size,
            },
        ));
    }

    Ok(())
}

/// 检查端点记录。
pub fn check_ep_attr(
    prov: &Provider,
    prov_attr: &EpAttr,
    user_attr: &EpAttr,
) -> Result<(), Incompatible> {
    if user_attr.ep_type != EndpointType::Unspec && user_attr.ep_type != prov_attr.ep_type {
        return Err(reject(
            prov,
            Incompatible::EndpointType {
                supported: prov_attr.ep_type,
                requested: user_attr.ep_type,
            },
        ));
    }

    if !user_attr.protocol.is_unspec() && user_attr.protocol != prov_attr.protocol {
        return Err(reject(
            prov,
            Incompatible::Protocol {
                supported: prov_attr.protocol,
                requested: user_attr.protocol,
            },
        ));
    }

    if user_attr.protocol_version != 0 && user_attr.protocol_version > prov_attr.protocol_version {
        return Err(reject(
            prov,
            Incompatible::ProtocolVersion {
                supported: prov_attr.protocol_version,
                requested: user_attr.protocol_version,
            },
        ));
    }

    if user_attr.max_msg_size > prov_attr.max_msg_size {
        return Err(reject(
            prov,
            Incompatible::MaxMsgSize {
                supported: prov_attr.max_msg_size,
                requested: user_attr.max_msg_size,
            },
        ));
    }

    Ok(())
}

/// 接收/发送队列共用的检查流程。
///
/// 掩码检查顺序固定为 caps、mode、op_flags、msg_order、comp_order，随后按
/// [`QueueAttr::LIMITS`] 的顺序比较数值上限。
pub fn check_queue_attr<Q: QueueAttr>(
    prov: &Provider,
    prov_attr: &Q,
    user_attr: &Q,
    options: &CheckOptions,
) -> Result<(), Incompatible> {
    let queue = Q::KIND;

    if !prov_attr.caps().contains(user_attr.caps()) {
        return Err(reject(
            prov,
            Incompatible::QueueCaps {
                queue,
                supported: prov_attr.caps(),
                requested: user_attr.caps(),
            },
        ));
    }

    if !user_attr.mode().contains(prov_attr.mode()) {
        return Err(reject(
            prov,
            Incompatible::QueueMode {
                queue,
                expected: prov_attr.mode(),
                given: user_attr.mode(),
            },
        ));
    }

    if options.strict_op_flags && !prov_attr.op_flags().contains(user_attr.op_flags()) {
        return Err(reject(
            prov,
            Incompatible::OpFlags {
                queue,
                supported: prov_attr.op_flags(),
                requested: user_attr.op_flags(),
            },
        ));
    }

    if !prov_attr.msg_order().contains(user_attr.msg_order()) {
        return Err(reject(
            prov,
            Incompatible::MsgOrder {
                queue,
                supported: prov_attr.msg_order(),
                requested: user_attr.msg_order(),
            },
        ));
    }

    if !prov_attr.comp_order().contains(user_attr.comp_order()) {
        return Err(reject(
            prov,
            Incompatible::CompOrder {
                queue,
                supported: prov_attr.comp_order(),
                requested: user_attr.comp_order(),
            },
        ));
    }

    for &limit in Q::LIMITS {
        let supported = prov_attr.limit(limit);
        let requested = user_attr.limit(limit);
        if requested > supported {
            return Err(reject(
                prov,
                Incompatible::QueueLimit {
                    queue,
                    limit,
                    supported,
                    requested,
                },
            ));
        }
    }

    Ok(())
}

/// provider 未声明的记录按默认值参与比较。
fn declared<T: Clone + Default>(attr: Option<&T>) -> Cow<'_, T> {
    attr.map_or_else(|| Cow::Owned(T::default()), Cow::Borrowed)
}

fn reject(prov: &Provider, err: Incompatible) -> Incompatible {
    tracing::info!(
        target: LOG_TARGET,
        provider = %prov.name,
        code = err.code(),
        "{err}"
    );
    err
}

#[cfg(test)]
mod tests {
    use tracing_test::traced_test;

    use super::*;
    use crate::caps::{Caps, Mode, MrMode, MsgOrder, OpFlags};
    use crate::info::{QueueKind, QueueLimit, RxAttr, TxAttr};
    use crate::model::{AddrFormat, Protocol};

    fn verbs() -> Provider {
        Provider::new("verbs", 1)
    }

    fn prov_info() -> Info {
        Info {
            caps: Caps::MSG | Caps::RMA | Caps::RECV | Caps::SEND,
            mode: Mode::LOCAL_MR,
            addr_format: AddrFormat::SockaddrIb,
            fabric_attr: Some(FabricAttr {
                name: Some("IB-1234".into()),
                prov_name: Some("verbs".into()),
                prov_version: 5,
            }),
            domain_attr: Some(DomainAttr {
                name: Some("mlx5_0".into()),
                threading: ThreadingModel::Safe,
                control_progress: ProgressModel::Auto,
                data_progress: ProgressModel::Auto,
                mr_mode: MrMode::BASIC,
                cq_data_size: 4,
                ..DomainAttr::default()
            }),
            ep_attr: Some(EpAttr {
                protocol: Protocol::RDMA_CM_IB_RC,
                protocol_version: 1,
                max_msg_size: 1 << 20,
                ..EpAttr::default()
            }),
            rx_attr: Some(RxAttr {
                caps: Caps::MSG | Caps::RECV,
                op_flags: OpFlags::COMPLETION,
                msg_order: MsgOrder::SAS,
                size: 128,
                iov_limit: 4,
                ..RxAttr::default()
            }),
            tx_attr: Some(TxAttr {
                caps: Caps::MSG | Caps::SEND,
                inject_size: 64,
                size: 128,
                iov_limit: 4,
                rma_iov_limit: 1,
                ..TxAttr::default()
            }),
        }
    }

    fn check(user: &Info) -> Result<(), Incompatible> {
        check_info(&verbs(), &prov_info(), Some(user), CheckType::Plain)
    }

    #[test]
    fn absent_hints_are_compatible() {
        assert_eq!(
            check_info(&verbs(), &prov_info(), None, CheckType::Plain),
            Ok(())
        );
    }

    #[test]
    fn matching_request_passes() {
        let mut user = prov_info();
        user.caps = Caps::MSG;
        user.domain_attr.as_mut().unwrap().threading = ThreadingModel::Domain;
        assert_eq!(check(&user), Ok(()));
    }

    #[test]
    #[traced_test]
    fn unsupported_caps_are_reported_with_masks() {
        let user = Info::with_caps(Caps::MSG | Caps::TAGGED, Mode::LOCAL_MR);
        let err = check(&user).unwrap_err();
        assert_eq!(
            err,
            Incompatible::Caps {
                supported: prov_info().caps,
                requested: Caps::MSG | Caps::TAGGED,
            }
        );
        assert_eq!(err.code(), "spark.fabric.incompatible.caps");
        assert!(logs_contain("verbs"));
        assert!(logs_contain("unsupported capabilities"));
    }

    #[test]
    fn missing_required_mode_fails() {
        let user = Info::with_caps(Caps::MSG, Mode::CONTEXT);
        assert!(matches!(check(&user), Err(Incompatible::Mode { .. })));
    }

    #[test]
    fn caps_are_checked_before_mode() {
        let user = Info::with_caps(Caps::ATOMIC, Mode::empty());
        assert!(matches!(check(&user), Err(Incompatible::Caps { .. })));
    }

    #[test]
    fn addr_format_family_is_accepted() {
        let mut user = Info::with_caps(Caps::MSG, Mode::LOCAL_MR);
        user.addr_format = AddrFormat::SockaddrIn;
        assert_eq!(check(&user), Ok(()));
        user.addr_format = AddrFormat::Psmx;
        assert!(matches!(check(&user), Err(Incompatible::AddrFormat { .. })));
    }

    #[test]
    fn fabric_name_and_version() {
        let mut user = Info::with_caps(Caps::MSG, Mode::LOCAL_MR);
        user.fabric_attr = Some(FabricAttr {
            name: Some("ib-1234".into()),
            ..FabricAttr::default()
        });
        assert_eq!(check(&user), Ok(()));

        user.fabric_attr = Some(FabricAttr {
            name: Some("eth-0".into()),
            ..FabricAttr::default()
        });
        assert_eq!(
            check(&user),
            Err(Incompatible::FabricName {
                requested: "eth-0".into()
            })
        );

        user.fabric_attr = Some(FabricAttr {
            prov_version: 6,
            ..FabricAttr::default()
        });
        assert_eq!(
            check(&user),
            Err(Incompatible::ProviderVersion {
                supported: 5,
                requested: 6,
            })
        );
    }

    #[test]
    fn layered_check_compares_prefix_token() {
        let prov = Provider::new("rxm", 1);
        let mut prov_info = prov_info();
        prov_info.domain_attr.as_mut().unwrap().name = Some("rxm".into());
        let mut user = Info::with_caps(Caps::MSG, Mode::LOCAL_MR);
        user.domain_attr = Some(DomainAttr {
            name: Some("rxm_mlx5_0".into()),
            ..DomainAttr::default()
        });
        assert_eq!(
            check_info(&prov, &prov_info, Some(&user), CheckType::Layered),
            Ok(())
        );
        assert!(matches!(
            check_info(&prov, &prov_info, Some(&user), CheckType::Plain),
            Err(Incompatible::DomainName { .. })
        ));
    }

    #[test]
    fn domain_models_follow_rank_order() {
        let mut user = Info::with_caps(Caps::MSG, Mode::LOCAL_MR);
        user.domain_attr = Some(DomainAttr {
            control_progress: ProgressModel::Manual,
            ..DomainAttr::default()
        });
        assert_eq!(check(&user), Ok(()));

        let mut prov_info = prov_info();
        prov_info.domain_attr.as_mut().unwrap().threading = ThreadingModel::Domain;
        user.domain_attr = Some(DomainAttr {
            threading: ThreadingModel::Safe,
            ..DomainAttr::default()
        });
        assert_eq!(
            check_info(&verbs(), &prov_info, Some(&user), CheckType::Plain),
            Err(Incompatible::Threading {
                supported: ThreadingModel::Domain,
                requested: ThreadingModel::Safe,
            })
        );
    }

    #[test]
    fn domain_scalar_fields() {
        let mut user = Info::with_caps(Caps::MSG, Mode::LOCAL_MR);
        user.domain_attr = Some(DomainAttr {
            av_type: AvType::Table,
            ..DomainAttr::default()
        });
        // provider 未指定 AV 类型时任意请求均可。
        assert_eq!(check(&user), Ok(()));

        user.domain_attr = Some(DomainAttr {
            mr_mode: MrMode::SCALABLE,
            ..DomainAttr::default()
        });
        assert!(matches!(check(&user), Err(Incompatible::MrMode { .. })));

        user.domain_attr = Some(DomainAttr {
            cq_data_size: 8,
            ..DomainAttr::default()
        });
        assert!(matches!(check(&user), Err(Incompatible::CqDataSize { .. })));
    }

    #[test]
    fn endpoint_fields() {
        let mut user = Info::with_caps(Caps::MSG, Mode::LOCAL_MR);
        user.ep_attr = Some(EpAttr {
            ep_type: EndpointType::Msg,
            ..EpAttr::default()
        });
        assert!(matches!(check(&user), Err(Incompatible::EndpointType { .. })));

        user.ep_attr = Some(EpAttr {
            protocol: Protocol::IWARP,
            ..EpAttr::default()
        });
        assert!(matches!(check(&user), Err(Incompatible::Protocol { .. })));

        user.ep_attr = Some(EpAttr {
            protocol_version: 2,
            ..EpAttr::default()
        });
        assert!(matches!(check(&user), Err(Incompatible::ProtocolVersion { .. })));

        user.ep_attr = Some(EpAttr {
            max_msg_size: (1 << 20) + 1,
            ..EpAttr::default()
        });
        assert!(matches!(check(&user), Err(Incompatible::MaxMsgSize { .. })));
    }

    #[test]
    fn queue_limits_are_checked_in_order() {
        let mut user = Info::with_caps(Caps::MSG, Mode::LOCAL_MR);
        user.tx_attr = Some(TxAttr {
            inject_size: 65,
            size: 129,
            ..TxAttr::default()
        });
        assert_eq!(
            check(&user),
            Err(Incompatible::QueueLimit {
                queue: QueueKind::Tx,
                limit: QueueLimit::InjectSize,
                supported: 64,
                requested: 65,
            })
        );

        user.tx_attr = None;
        user.rx_attr = Some(RxAttr {
            iov_limit: 5,
            ..RxAttr::default()
        });
        assert_eq!(
            check(&user),
            Err(Incompatible::QueueLimit {
                queue: QueueKind::Rx,
                limit: QueueLimit::IovLimit,
                supported: 4,
                requested: 5,
            })
        );
    }

    #[test]
    fn queue_masks() {
        let mut user = Info::with_caps(Caps::MSG, Mode::LOCAL_MR);
        user.rx_attr = Some(RxAttr {
            caps: Caps::SEND,
            ..RxAttr::default()
        });
        assert!(matches!(
            check(&user),
            Err(Incompatible::QueueCaps {
                queue: QueueKind::Rx,
                ..
            })
        ));

        user.rx_attr = Some(RxAttr {
            msg_order: MsgOrder::RAW,
            ..RxAttr::default()
        });
        assert!(matches!(check(&user), Err(Incompatible::MsgOrder { .. })));

        user.rx_attr = Some(RxAttr {
            comp_order: MsgOrder::STRICT,
            ..RxAttr::default()
        });
        assert!(matches!(check(&user), Err(Incompatible::CompOrder { .. })));
    }

    #[test]
    fn op_flags_only_checked_when_strict() {
        let mut user = Info::with_caps(Caps::MSG, Mode::LOCAL_MR);
        user.rx_attr = Some(RxAttr {
            op_flags: OpFlags::INJECT,
            ..RxAttr::default()
        });
        assert_eq!(check(&user), Ok(()));

        let strict = CheckOptions {
            check: CheckType::Plain,
            strict_op_flags: true,
        };
        assert_eq!(
            check_info_with(&verbs(), &prov_info(), Some(&user), &strict),
            Err(Incompatible::OpFlags {
                queue: QueueKind::Rx,
                supported: OpFlags::COMPLETION,
                requested: OpFlags::INJECT,
            })
        );
    }

    #[test]
    fn undeclared_provider_record_compares_as_default() {
        let mut prov_info = prov_info();
        prov_info.ep_attr = None;
        let mut user = Info::with_caps(Caps::MSG, Mode::LOCAL_MR);
        user.ep_attr = Some(EpAttr::default());
        assert_eq!(
            check_info(&verbs(), &prov_info, Some(&user), CheckType::Plain),
            Ok(())
        );
        user.ep_attr = Some(EpAttr {
            max_msg_size: 1,
            ..EpAttr::default()
        });
        assert!(matches!(
            check_info(&verbs(), &prov_info, Some(&user), CheckType::Plain),
            Err(Incompatible::MaxMsgSize { .. })
        ));
    }
}
