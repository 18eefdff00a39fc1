//! 发现单元与批次索引

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 地址记录：一次派生的完整结果
///
/// 命中（有余额或在离线索引中）时整条记录交给 Recorder
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressRecord {
    /// 链符号
    pub chain: String,
    /// EIP-55 地址
    pub address: String,
    /// 助记词
    pub mnemonic: String,
    /// 私钥 (hex)
    pub private_key: String,
    /// 主密钥 xprv
    pub root_key: String,
    /// 派生路径
    pub derivation_path: String,
    /// 远程查询到的余额（原生币单位）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub balance: Option<Decimal>,
}

impl AddressRecord {
    pub fn with_balance(mut self, balance: Decimal) -> Self {
        self.balance = Some(balance);
        self
    }
}

impl std::fmt::Display for AddressRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "chain={} address={} path={} mnemonic=\"{}\" private_key={} root_key={}",
            self.chain,
            self.address,
            self.derivation_path,
            self.mnemonic,
            self.private_key,
            self.root_key
        )?;
        if let Some(balance) = &self.balance {
            write!(f, " balance={}", balance)?;
        }
        Ok(())
    }
}

// 私钥与助记词不进入 Debug 输出（日志中只会出现 Debug）
impl std::fmt::Debug for AddressRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AddressRecord")
            .field("chain", &self.chain)
            .field("address", &self.address)
            .field("derivation_path", &self.derivation_path)
            .field("balance", &self.balance)
            .finish_non_exhaustive()
    }
}

/// 一批派生结果：地址 → 记录，外加有序地址列表
///
/// 不变量：列表中每个地址在映射中恰有一条记录，反之亦然
#[derive(Debug, Clone, Default)]
pub struct AddressBatch {
    records: HashMap<String, AddressRecord>,
    order: Vec<String>,
}

impl AddressBatch {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            records: HashMap::with_capacity(capacity),
            order: Vec::with_capacity(capacity),
        }
    }

    /// 插入记录；地址已存在时保留原记录并返回 false
    pub fn insert(&mut self, record: AddressRecord) -> bool {
        if self.records.contains_key(&record.address) {
            return false;
        }
        self.order.push(record.address.clone());
        self.records.insert(record.address.clone(), record);
        true
    }

    /// 合并另一批次（用于多 worker 生成）
    pub fn merge(&mut self, other: AddressBatch) {
        let AddressBatch { mut records, order } = other;
        for address in order {
            if let Some(record) = records.remove(&address) {
                self.insert(record);
            }
        }
    }

    pub fn get(&self, address: &str) -> Option<&AddressRecord> {
        self.records.get(address)
    }

    pub fn addresses(&self) -> &[String] {
        &self.order
    }

    pub fn records(&self) -> impl Iterator<Item = &AddressRecord> {
        self.order.iter().filter_map(|a| self.records.get(a))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// 拆分为 (映射, 有序列表)
    pub fn into_parts(self) -> (HashMap<String, AddressRecord>, Vec<String>) {
        (self.records, self.order)
    }
}
