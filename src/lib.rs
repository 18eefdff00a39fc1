//! hdscan - HD 钱包地址批量生成与余额扫描
//!
//! 助记词 → BIP32 主密钥 → BIP44 子密钥 → EIP-55 地址 → 本地索引/远程余额解析 → 记录命中

pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod service;

// 重新导出常用类型
pub use error::{Result, ScanError};

pub mod prelude {
    pub use crate::{
        config::{Config, ScanMode},
        domain::{
            AddressBatch, AddressRecord, BitStrength, ChainConfig, ChainRegistry, KeyManager,
            MnemonicSource, OsRngMnemonicSource,
        },
        error::{Result, ScanError},
        service::{
            AddressBatchGenerator, BalanceResolver, EtherscanResolver, FileRecorder, OfflineIndex,
            Recorder, ScanDriver, ScanReport, ScanSettings,
        },
    };
}
