//! 余额/成员关系解析
//!
//! 远程余额查询与本地离线索引实现同一个 trait，扫描驱动按模式组合使用

use std::collections::HashMap;

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::error::Result;

/// 解析策略类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolverKind {
    /// 远程余额服务（有网络开销）
    Remote,
    /// 本地离线成员索引
    Local,
}

/// 一次解析的结果
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// 远程：地址 → 原生币余额；响应中缺失的地址不出现
    Balances(HashMap<String, Decimal>),
    /// 本地：按输入顺序划分为存在/不存在
    Membership {
        present: Vec<String>,
        absent: Vec<String>,
    },
}

impl Resolution {
    /// 命中的地址：余额大于零，或存在于索引中
    pub fn matched(&self, queried: &[String]) -> Vec<String> {
        match self {
            Resolution::Balances(balances) => queried
                .iter()
                .filter(|a| balances.get(*a).is_some_and(|b| *b > Decimal::ZERO))
                .cloned()
                .collect(),
            Resolution::Membership { present, .. } => present.clone(),
        }
    }

    /// 未命中的地址（零余额、未知或不在索引中）
    pub fn unmatched(&self, queried: &[String]) -> Vec<String> {
        match self {
            Resolution::Balances(balances) => queried
                .iter()
                .filter(|a| !balances.get(*a).is_some_and(|b| *b > Decimal::ZERO))
                .cloned()
                .collect(),
            Resolution::Membership { absent, .. } => absent.clone(),
        }
    }

    /// 远程结果中的余额；缺失视为零
    pub fn balance_of(&self, address: &str) -> Option<Decimal> {
        match self {
            Resolution::Balances(balances) => {
                Some(balances.get(address).copied().unwrap_or(Decimal::ZERO))
            }
            Resolution::Membership { .. } => None,
        }
    }
}

/// 余额解析器
///
/// 对批次只读；部分响应缺失不应导致整个批次失败
#[async_trait]
pub trait BalanceResolver: Send + Sync {
    fn kind(&self) -> ResolverKind;

    async fn resolve(&self, addresses: &[String]) -> Result<Resolution>;
}
