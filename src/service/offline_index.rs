//! 本地离线地址索引
//!
//! 文本文件，每行一个地址（可带逗号分隔的附加列），`#` 开头为注释。
//! 比较时统一转为小写，因此与 EIP-55 大小写无关。

use std::collections::HashSet;
use std::path::Path;

use async_trait::async_trait;

use crate::error::{Result, ScanError};
use crate::service::balance_resolver::{BalanceResolver, Resolution, ResolverKind};

#[derive(Debug, Clone, Default)]
pub struct OfflineIndex {
    addresses: HashSet<String>,
}

impl OfflineIndex {
    pub fn from_addresses<I, S>(addresses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            addresses: addresses
                .into_iter()
                .filter_map(|a| normalize(a.as_ref()))
                .collect(),
        }
    }

    /// 从文件加载；文件不可读属于启动期配置错误
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            ScanError::Config(format!("failed to read offline index {:?}: {}", path, e))
        })?;

        let index = Self::parse(&content);
        tracing::info!(path = ?path, addresses = index.len(), "offline index loaded");
        Ok(index)
    }

    /// 解析索引文本，跳过空行、注释和无法识别的行
    pub fn parse(content: &str) -> Self {
        let mut addresses = HashSet::new();
        let mut rejected = 0usize;

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let field = line.split([',', '\t', ' ']).next().unwrap_or_default();
            match normalize(field) {
                Some(address) => {
                    addresses.insert(address);
                }
                None => rejected += 1,
            }
        }

        if rejected > 0 {
            tracing::warn!(rejected, "offline index lines ignored");
        }

        Self { addresses }
    }

    pub fn contains(&self, address: &str) -> bool {
        normalize(address).is_some_and(|a| self.addresses.contains(&a))
    }

    /// 按输入顺序划分为 (存在, 不存在)
    pub fn lookup(&self, addresses: &[String]) -> (Vec<String>, Vec<String>) {
        addresses
            .iter()
            .cloned()
            .partition(|address| self.contains(address))
    }

    pub fn len(&self) -> usize {
        self.addresses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }
}

/// `0x` + 40 hex → 小写；其他格式返回 None
fn normalize(address: &str) -> Option<String> {
    let address = address.trim();
    let hex_part = address
        .strip_prefix("0x")
        .or_else(|| address.strip_prefix("0X"))?;

    if hex_part.len() == 40 && hex_part.chars().all(|c| c.is_ascii_hexdigit()) {
        Some(format!("0x{}", hex_part.to_ascii_lowercase()))
    } else {
        None
    }
}

#[async_trait]
impl BalanceResolver for OfflineIndex {
    fn kind(&self) -> ResolverKind {
        ResolverKind::Local
    }

    async fn resolve(&self, addresses: &[String]) -> Result<Resolution> {
        let (present, absent) = self.lookup(addresses);
        Ok(Resolution::Membership { present, absent })
    }
}
