//! 链配置模块
//!
//! 定义扫描支持的 EVM 链及其派生参数、原生币精度和余额查询端点

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::domain::key_manager::{DerivationPath, PURPOSE_BIP44};

/// 链配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainConfig {
    /// 链 ID (EIP-155)
    pub chain_id: u64,
    /// 链名称
    pub name: String,
    /// 链符号 (ETH, BNB, MATIC)
    pub symbol: String,
    /// BIP44 purpose
    pub purpose: u32,
    /// SLIP-44 coin type (用于派生路径)
    pub coin_type: u32,
    /// 原生币精度（最小单位到显示单位的 10 的幂）
    pub decimals: u32,
    /// Etherscan 兼容的余额查询 API
    pub explorer_api_url: String,
}

impl ChainConfig {
    /// 生成派生路径
    ///
    /// # Arguments
    /// * `account` - 账户索引 (通常为 0)
    /// * `change` - 找零索引 (外部地址为 0，内部地址为 1)
    /// * `index` - 地址索引
    pub fn derivation_path(&self, account: u32, change: u32, index: u32) -> DerivationPath {
        DerivationPath {
            purpose: self.purpose,
            coin_type: self.coin_type,
            account,
            change,
            index,
        }
    }
}

/// 链配置注册表
pub struct ChainRegistry {
    configs: HashMap<u64, ChainConfig>,
    symbol_map: HashMap<String, u64>,
}

impl ChainRegistry {
    /// 创建预配置的注册表
    pub fn new() -> Self {
        let mut registry = Self {
            configs: HashMap::new(),
            symbol_map: HashMap::new(),
        };

        registry.register_default_chains();
        registry
    }

    /// 注册默认支持的链
    fn register_default_chains(&mut self) {
        // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
        // 所有 EVM 链共享 secp256k1 + Keccak 地址编码
        // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

        // Ethereum Mainnet
        self.register(ChainConfig {
            chain_id: 1,
            name: "Ethereum".to_string(),
            symbol: "ETH".to_string(),
            purpose: PURPOSE_BIP44,
            coin_type: 60,
            decimals: 18,
            explorer_api_url: "https://api.etherscan.io/api".to_string(),
        });

        // BSC (Binance Smart Chain)
        self.register(ChainConfig {
            chain_id: 56,
            name: "BNB Smart Chain".to_string(),
            symbol: "BNB".to_string(),
            purpose: PURPOSE_BIP44,
            coin_type: 60, // BSC 使用与 ETH 相同的派生路径
            decimals: 18,
            explorer_api_url: "https://api.bscscan.com/api".to_string(),
        });

        // Polygon
        self.register(ChainConfig {
            chain_id: 137,
            name: "Polygon".to_string(),
            symbol: "MATIC".to_string(),
            purpose: PURPOSE_BIP44,
            coin_type: 60,
            decimals: 18,
            explorer_api_url: "https://api.polygonscan.com/api".to_string(),
        });
    }

    /// 注册链配置
    pub fn register(&mut self, config: ChainConfig) {
        self.symbol_map
            .insert(config.symbol.to_lowercase(), config.chain_id);
        self.symbol_map
            .insert(config.name.to_lowercase(), config.chain_id);
        self.configs.insert(config.chain_id, config);
    }

    /// 通过 chain_id 获取配置
    pub fn get_by_chain_id(&self, chain_id: u64) -> Option<&ChainConfig> {
        self.configs.get(&chain_id)
    }

    /// 通过符号或名称获取配置（不区分大小写）
    pub fn get_by_symbol(&self, symbol: &str) -> Option<&ChainConfig> {
        let chain_id = self.symbol_map.get(&symbol.trim().to_lowercase())?;
        self.configs.get(chain_id)
    }

    /// 列出所有支持的链
    pub fn list_all(&self) -> Vec<&ChainConfig> {
        let mut chains: Vec<_> = self.configs.values().collect();
        chains.sort_by_key(|c| c.chain_id);
        chains
    }
}

impl Default for ChainRegistry {
    fn default() -> Self {
        Self::new()
    }
}
