//! 分层 provider 名称的编解码。
//!
//! ## 模块定位（Why）
//! - 分层 provider 以 `_` 连接的名称串联身份链：domain 名称形如 `rxm_mlx5_0`，
//!   fabric 名称形如 `rxm_verbs_IB-1234`；
//! - 最后一段本身可能含有 `_`（例如 `mlx5_0`），因此拆解时只切出前导分段，剩余部分原样保留。
//!
//! ## 契约说明（What）
//! - [`parse_name`] 返回恰好 `count` 个分段，分段少于要求时返回 [`ParseError`]；
//! - 分段遵循 `strtok` 语义：前导分隔符与连续分隔符被跳过；
//! - [`NameTokens`] 独占一份输入副本，所有分段均借用该副本，释放一次即可。
//!
//! ## 风险提示（Trade-offs）
//! - 名称不做转义处理，provider 前缀本身不得包含 `_`，否则拆解结果会错位。

use core::ops::{Index, Range};

use crate::LOG_TARGET;
use crate::check::CheckType;
use crate::error::ParseError;
use crate::info::{DomainAttr, FabricAttr};

/// 名称分隔符。
pub const DELIMITER: char = '_';

/// 拆解模式。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParseMode {
    /// 最后一个分段延伸到输入末尾，保留其中的分隔符。
    Full,
    /// 只关心前导分段，多余输入被忽略。
    PrefixOnly,
}

/// 名称拆解结果。
///
/// # 教案式说明
/// - **意图（Why）**：调用点需要按下标取用固定数量的分段，同时避免为每个分段单独分配；
/// - **契约（What）**：`len()` 恒等于请求的分段数；分段借用内部副本，生命周期与结构体一致；
/// - **执行（How）**：内部保存一份 `Box<str>` 与各分段的字节区间。
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NameTokens {
    source: Box<str>,
    spans: Vec<Range<usize>>,
}

impl NameTokens {
    /// 分段数量。
    pub fn len(&self) -> usize {
        self.spans.len()
    }

    /// 是否没有分段。成功解析的结果恒为 `false`。
    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    /// 取第 `index` 个分段。
    pub fn get(&self, index: usize) -> Option<&str> {
        self.spans.get(index).map(|span| &self.source[span.clone()])
    }

    /// 按顺序遍历分段。
    pub fn iter(&self) -> impl Iterator<Item = &str> + '_ {
        self.spans.iter().map(|span| &self.source[span.clone()])
    }

    /// 被拆解的原始名称。
    pub fn source(&self) -> &str {
        &self.source
    }
}

impl Index<usize> for NameTokens {
    type Output = str;

    fn index(&self, index: usize) -> &str {
        &self.source[self.spans[index].clone()]
    }
}

/// 将 `name` 拆解为恰好 `count` 个分段。
///
/// # 契约（What）
/// - `count == 0` 返回 [`ParseError::ZeroTokens`]；
/// - 分段不足返回 [`ParseError::TooFewTokens`]，此时不保留任何副本；
/// - [`ParseMode::Full`] 下，若输入在最后一个分段之后仍有内容，这部分（连同分隔符）并入最后一个分段。
pub fn parse_name(name: &str, count: usize, mode: ParseMode) -> Result<NameTokens, ParseError> {
    if count == 0 {
        return Err(ParseError::ZeroTokens);
    }

    let source: Box<str> = name.into();
    let mut spans = Vec::with_capacity(count);
    let mut cursor = 0;
    while spans.len() < count {
        let Some(offset) = source[cursor..].find(|c: char| c != DELIMITER) else {
            break;
        };
        let start = cursor + offset;
        let end = source[start..]
            .find(DELIMITER)
            .map_or(source.len(), |len| start + len);
        spans.push(start..end);
        cursor = end;
    }

    if spans.len() < count {
        tracing::info!(
            target: LOG_TARGET,
            layered_name = name,
            expected = count,
            found = spans.len(),
            "failed to parse layered name"
        );
        return Err(ParseError::TooFewTokens {
            name: name.to_owned(),
            expected: count,
            found: spans.len(),
        });
    }

    if mode == ParseMode::Full
        && let Some(last) = spans.last_mut()
    {
        last.end = source.len();
    }

    Ok(NameTokens { source, spans })
}

/// 组合分层 domain 名称：`<prefix>_<base_domain>`。
pub fn compose_domain_name(prefix: &str, base_domain: &str) -> String {
    format!("{prefix}{DELIMITER}{base_domain}")
}

/// 组合分层 fabric 名称：`<prefix>_<base_prov>_<base_fabric>`，例如 `rxm_verbs_IB-1234`。
pub fn compose_fabric_name(prefix: &str, base_prov: &str, base_fabric: &str) -> String {
    format!("{prefix}{DELIMITER}{base_prov}{DELIMITER}{base_fabric}")
}

/// 判断用户给出的名称是否指向 `prov_name`。
///
/// - 分层模式：仅取用户名称的首个分段与 `prov_name` 比较；
/// - 普通模式：整串比较；
/// - 比较均忽略 ASCII 大小写；用户名称无法拆解时视为不匹配。
pub fn check_name(user_name: &str, prov_name: &str, check: CheckType) -> bool {
    match check {
        CheckType::Layered => match parse_name(user_name, 1, ParseMode::PrefixOnly) {
            Ok(tokens) => tokens[0].eq_ignore_ascii_case(prov_name),
            Err(_) => false,
        },
        CheckType::Plain => user_name.eq_ignore_ascii_case(prov_name),
    }
}

impl DomainAttr {
    /// 分层 domain 属性 → 底层 domain 属性：丢弃前缀，第二个分段成为底层名称。
    pub fn to_base(&self) -> Result<DomainAttr, ParseError> {
        let name = match self.name.as_deref() {
            Some(layered) => Some(parse_name(layered, 2, ParseMode::Full)?[1].to_owned()),
            None => None,
        };
        Ok(DomainAttr {
            name,
            ..self.clone()
        })
    }

    /// 底层 domain 属性 → 分层 domain 属性。
    pub fn from_base(&self, prefix: &str) -> DomainAttr {
        DomainAttr {
            name: self
                .name
                .as_deref()
                .map(|base| compose_domain_name(prefix, base)),
            ..self.clone()
        }
    }
}

impl FabricAttr {
    /// 分层 fabric 属性 → 底层 fabric 属性：第二段为底层 provider，第三段为底层 fabric 名称。
    pub fn to_base(&self) -> Result<FabricAttr, ParseError> {
        let Some(layered) = self.name.as_deref() else {
            return Ok(self.clone());
        };
        let tokens = parse_name(layered, 3, ParseMode::Full)?;
        Ok(FabricAttr {
            name: Some(tokens[2].to_owned()),
            prov_name: Some(tokens[1].to_owned()),
            prov_version: self.prov_version,
        })
    }

    /// 底层 fabric 属性 → 分层 fabric 属性；`prov_name` 继续指向底层 provider。
    ///
    /// 底层记录缺少名称或 provider 名称时，分层名称留空。
    pub fn from_base(&self, prefix: &str) -> FabricAttr {
        let name = match (self.prov_name.as_deref(), self.name.as_deref()) {
            (Some(prov), Some(fabric)) => Some(compose_fabric_name(prefix, prov, fabric)),
            _ => None,
        };
        FabricAttr {
            name,
            ..self.clone()
        }
    }
}
