//! Domain 模块
//!
//! 密钥派生与地址编码核心

pub mod address_record;
pub mod chain_config;
pub mod chain_encoder;
pub mod key_manager;
pub mod mnemonic;

// 重新导出常用类型
pub use address_record::{AddressBatch, AddressRecord};
pub use chain_config::{ChainConfig, ChainRegistry};
pub use chain_encoder::{encode_ethereum, is_valid_checksum_address, EncodedKey};
pub use key_manager::{ChildKey, DerivationPath, KeyManager, PURPOSE_BIP44};
pub use mnemonic::{BitStrength, MnemonicSource, OsRngMnemonicSource};
