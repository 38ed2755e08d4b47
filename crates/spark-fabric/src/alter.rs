//! 以用户 hints 调整 provider 默认描述符。
//!
//! ## 合并规则（What）
//! - 主能力位由 hints 决定，次能力位始终保留默认值，见 [`Caps::partition_merge`]；
//! - 队列的 `op_flags` 由 hints 覆盖；数值字段仅在 hints 为非零时覆盖；
//! - 没有 hints 时只做能力位重算，该路径幂等；
//! - 默认描述符中缺失的记录保持缺失。

use crate::caps::Caps;
use crate::info::{Info, QueueAttr};

/// 将 `hints` 合并进 provider 默认描述符 `info`。
pub fn alter_info(info: &mut Info, hints: Option<&Info>) {
    let Some(hints) = hints else {
        info.caps = Caps::partition_merge(info.caps, info.caps);
        let caps = info.caps;
        alter_queue_attr(info.rx_attr.as_mut(), None, caps);
        alter_queue_attr(info.tx_attr.as_mut(), None, caps);
        return;
    };

    info.caps = Caps::partition_merge(hints.caps, info.caps);

    if let (Some(ep), Some(hint)) = (info.ep_attr.as_mut(), hints.ep_attr.as_ref()) {
        if hint.tx_ctx_cnt != 0 {
            ep.tx_ctx_cnt = hint.tx_ctx_cnt;
        }
        if hint.rx_ctx_cnt != 0 {
            ep.rx_ctx_cnt = hint.rx_ctx_cnt;
        }
    }

    let caps = info.caps;
    alter_queue_attr(info.rx_attr.as_mut(), hints.rx_attr.as_ref(), caps);
    alter_queue_attr(info.tx_attr.as_mut(), hints.tx_attr.as_ref(), caps);
}

/// 调整单个队列记录。
///
/// 没有对应 hint 记录时，主能力位收敛到顶层能力 `info_caps` 之内。
pub fn alter_queue_attr<Q: QueueAttr>(attr: Option<&mut Q>, hint: Option<&Q>, info_caps: Caps) {
    let Some(attr) = attr else {
        return;
    };

    let Some(hint) = hint else {
        let caps = attr.caps();
        *attr.caps_mut() = Caps::partition_merge(info_caps & caps, caps);
        return;
    };

    *attr.op_flags_mut() = hint.op_flags();
    let caps = attr.caps();
    *attr.caps_mut() = Caps::partition_merge(hint.caps(), caps);
    for &limit in Q::LIMITS {
        let requested = hint.limit(limit);
        if requested != 0
            && let Some(slot) = attr.limit_mut(limit)
        {
            *slot = requested;
        }
    }
}
