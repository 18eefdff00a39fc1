//! 地址批量生成
//!
//! 每个地址使用独立的新助记词，或在同一助记词下枚举前几个子账户

use std::sync::Arc;

use crate::domain::{
    encode_ethereum, AddressBatch, AddressRecord, BitStrength, ChainConfig, KeyManager,
    MnemonicSource,
};
use crate::error::Result;

/// 子账户枚举数量 (index 0..4)
pub const SUB_ACCOUNT_COUNT: u32 = 4;

/// 地址批量生成器
///
/// 克隆代价低（共享助记词来源），每个 worker 持有自己的克隆
#[derive(Clone)]
pub struct AddressBatchGenerator {
    chain: ChainConfig,
    passphrase: String,
    source: Arc<dyn MnemonicSource>,
}

impl AddressBatchGenerator {
    pub fn new(chain: ChainConfig, passphrase: String, source: Arc<dyn MnemonicSource>) -> Self {
        Self {
            chain,
            passphrase,
            source,
        }
    }

    pub fn chain(&self) -> &ChainConfig {
        &self.chain
    }

    /// 生成 `count` 个独立钱包，派生路径 m/44'/coin'/0'/0/0
    ///
    /// 单个种子的助记词/派生/编码错误只跳过该种子，批次继续
    pub fn generate(&self, bit_strength: BitStrength, count: usize) -> AddressBatch {
        let mut batch = AddressBatch::with_capacity(count);
        let mut skipped = 0usize;

        for _ in 0..count {
            match self.generate_one(bit_strength) {
                Ok(record) => {
                    if !batch.insert(record) {
                        tracing::warn!(chain = %self.chain.symbol, "duplicate address in batch, skipped");
                    }
                }
                Err(e) => {
                    skipped += 1;
                    tracing::warn!(
                        chain = %self.chain.symbol,
                        bits = bit_strength.bits(),
                        kind = e.kind(),
                        error = %e,
                        "seed skipped"
                    );
                }
            }
        }

        tracing::debug!(
            chain = %self.chain.symbol,
            bits = bit_strength.bits(),
            requested = count,
            generated = batch.len(),
            skipped,
            "batch generated"
        );

        batch
    }

    /// 同一助记词下派生 index 0..4 的地址，共享主密钥
    pub fn generate_sub_accounts(
        &self,
        bit_strength: BitStrength,
        mnemonic: &str,
    ) -> Result<AddressBatch> {
        let key_manager = KeyManager::new(bit_strength, &self.passphrase, mnemonic)?;
        let root_key = key_manager.master_key_b58()?;

        let mut batch = AddressBatch::with_capacity(SUB_ACCOUNT_COUNT as usize);
        for index in 0..SUB_ACCOUNT_COUNT {
            let record = self.derive_record(&key_manager, &root_key, index)?;
            batch.insert(record);
        }

        Ok(batch)
    }

    fn generate_one(&self, bit_strength: BitStrength) -> Result<AddressRecord> {
        let key_manager =
            KeyManager::generate(bit_strength, &self.passphrase, self.source.as_ref())?;
        let root_key = key_manager.master_key_b58()?;
        self.derive_record(&key_manager, &root_key, 0)
    }

    /// 派生 m/purpose'/coin'/0'/0/index 并编码为地址记录
    pub fn derive_record(
        &self,
        key_manager: &KeyManager,
        root_key: &str,
        index: u32,
    ) -> Result<AddressRecord> {
        let path = self.chain.derivation_path(0, 0, index);
        let child = key_manager.derive(&path)?;
        let encoded = encode_ethereum(child.private_key_bytes().as_slice())?;

        Ok(AddressRecord {
            chain: self.chain.symbol.clone(),
            address: encoded.address,
            mnemonic: key_manager.mnemonic(),
            private_key: encoded.private_key_hex,
            root_key: root_key.to_string(),
            derivation_path: child.path.to_string(),
            balance: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use super::*;
    use crate::domain::{ChainRegistry, OsRngMnemonicSource};
    use crate::error::ScanError;

    const HARDHAT_MNEMONIC: &str = "test test test test test test test test test test test junk";

    /// 按顺序返回预设助记词
    struct ScriptedSource(Mutex<VecDeque<String>>);

    impl ScriptedSource {
        fn new(phrases: &[&str]) -> Self {
            Self(Mutex::new(phrases.iter().map(|p| p.to_string()).collect()))
        }
    }

    impl MnemonicSource for ScriptedSource {
        fn generate(&self, _strength: BitStrength) -> Result<String> {
            self.0
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| ScanError::InvalidSeed("script exhausted".into()))
        }
    }

    fn eth() -> ChainConfig {
        ChainRegistry::new().get_by_symbol("ETH").unwrap().clone()
    }

    #[test]
    fn test_generate_independent_wallets() {
        let generator =
            AddressBatchGenerator::new(eth(), String::new(), Arc::new(OsRngMnemonicSource));
        let batch = generator.generate(BitStrength::Bits128, 8);

        assert_eq!(batch.len(), 8);
        assert_eq!(batch.addresses().len(), 8);

        let mut mnemonics: Vec<_> = batch.records().map(|r| r.mnemonic.clone()).collect();
        mnemonics.sort();
        mnemonics.dedup();
        assert_eq!(mnemonics.len(), 8);

        for record in batch.records() {
            assert_eq!(record.derivation_path, "m/44'/60'/0'/0/0");
            assert_eq!(record.chain, "ETH");
            assert!(record.root_key.starts_with("xprv"));
        }
    }

    #[test]
    fn test_generate_skips_bad_seed() {
        let source = ScriptedSource::new(&[
            HARDHAT_MNEMONIC,
            "not a valid mnemonic at all",
        ]);
        let generator = AddressBatchGenerator::new(eth(), String::new(), Arc::new(source));

        let batch = generator.generate(BitStrength::Bits128, 3);
        assert_eq!(batch.len(), 1);
        assert!(batch
            .get("0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266")
            .is_some());
    }

    #[test]
    fn test_sub_accounts_share_root_key() {
        let generator =
            AddressBatchGenerator::new(eth(), String::new(), Arc::new(OsRngMnemonicSource));
        let batch = generator
            .generate_sub_accounts(BitStrength::Bits128, HARDHAT_MNEMONIC)
            .unwrap();

        assert_eq!(
            batch.addresses(),
            &[
                "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266".to_string(),
                "0x70997970C51812dc3A010C7d01b50e0d17dc79C8".to_string(),
                "0x3C44CdDdB6a900fa2b585dd299e03d12FA4293BC".to_string(),
                "0x90F79bf6EB2c4f870365E785982E1f101E93b906".to_string(),
            ]
        );

        let roots: Vec<_> = batch.records().map(|r| r.root_key.as_str()).collect();
        assert!(roots.windows(2).all(|w| w[0] == w[1]));
        assert_eq!(
            batch
                .get("0x90F79bf6EB2c4f870365E785982E1f101E93b906")
                .unwrap()
                .derivation_path,
            "m/44'/60'/0'/0/3"
        );
    }

    #[test]
    fn test_sub_accounts_reject_mismatched_strength() {
        let generator =
            AddressBatchGenerator::new(eth(), String::new(), Arc::new(OsRngMnemonicSource));
        assert!(generator
            .generate_sub_accounts(BitStrength::Bits160, HARDHAT_MNEMONIC)
            .is_err());
    }
}
