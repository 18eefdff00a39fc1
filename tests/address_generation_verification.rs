//! 地址生成算法验证测试
//!
//! 验证助记词 → 主密钥 → BIP44 子密钥 → EIP-55 地址的完整流水线
//! 与标准钱包（MetaMask、Hardhat 等）结果一致

mod common;

use common::*;
use hdscan::domain::{
    encode_ethereum, is_valid_checksum_address, BitStrength, KeyManager, PURPOSE_BIP44,
};
use hdscan::service::SUB_ACCOUNT_COUNT;

/// BIP39 标准测试向量
///
/// - Mnemonic: "abandon ×11 about"
/// - m/44'/60'/0'/0/0 → 0x9858EfFD232B4033E47d90003D41EC34EcaEda94
#[test]
fn test_ethereum_address_bip39_vector() {
    let km = KeyManager::new(BitStrength::Bits128, "", ABANDON_MNEMONIC).unwrap();
    let child = km.get_key(PURPOSE_BIP44, 60, 0, 0, 0).unwrap();
    let encoded = encode_ethereum(child.private_key_bytes().as_slice()).unwrap();

    assert_eq!(encoded.address, ABANDON_ADDRESS_0);
    assert_eq!(child.path.to_string(), "m/44'/60'/0'/0/0");
}

/// Hardhat / Anvil 默认账户
#[test]
fn test_hardhat_default_accounts() {
    let expected = [
        (
            "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266",
            "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80",
        ),
        (
            "0x70997970C51812dc3A010C7d01b50e0d17dc79C8",
            "59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d",
        ),
        (
            "0x3C44CdDdB6a900fa2b585dd299e03d12FA4293BC",
            "5de4111afa1a4b94908f83103eb1f1706367c2e68ca870fc3fb9a804cdab365a",
        ),
        (
            "0x90F79bf6EB2c4f870365E785982E1f101E93b906",
            "7c852118294e51e653712a81e05800f419141751be58f605c371e15141b007a6",
        ),
    ];

    let km = KeyManager::new(BitStrength::Bits128, "", HARDHAT_MNEMONIC).unwrap();
    for (index, (address, private_key)) in expected.iter().enumerate() {
        let child = km.get_key(PURPOSE_BIP44, 60, 0, 0, index as u32).unwrap();
        let encoded = encode_ethereum(child.private_key_bytes().as_slice()).unwrap();
        assert_eq!(&encoded.address, address, "index {}", index);
        assert_eq!(&encoded.private_key_hex, private_key, "index {}", index);
    }
}

/// 子账户枚举与逐个派生结果一致，且共享同一根密钥
#[test]
fn test_sub_accounts_match_hardhat() {
    let generator = scripted_generator(&[]);
    let batch = generator
        .generate_sub_accounts(BitStrength::Bits128, HARDHAT_MNEMONIC)
        .unwrap();

    assert_eq!(batch.len(), SUB_ACCOUNT_COUNT as usize);
    assert_eq!(
        batch.addresses(),
        &[
            "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266".to_string(),
            "0x70997970C51812dc3A010C7d01b50e0d17dc79C8".to_string(),
            "0x3C44CdDdB6a900fa2b585dd299e03d12FA4293BC".to_string(),
            "0x90F79bf6EB2c4f870365E785982E1f101E93b906".to_string(),
        ]
    );

    let km = KeyManager::new(BitStrength::Bits128, "", HARDHAT_MNEMONIC).unwrap();
    let root = km.master_key_b58().unwrap();
    assert!(batch.records().all(|r| r.root_key == root));
}

/// 批量生成：N 个独立助记词 → N 条记录，地址格式与校验和正确
#[test]
fn test_batch_of_independent_wallets() {
    for strength in BitStrength::ALL {
        let generator = hdscan::service::AddressBatchGenerator::new(
            eth(),
            String::new(),
            std::sync::Arc::new(hdscan::domain::OsRngMnemonicSource),
        );
        let batch = generator.generate(strength, 5);

        assert_eq!(batch.len(), 5);
        assert_eq!(batch.addresses().len(), 5);
        for record in batch.records() {
            assert_eq!(record.address.len(), 42);
            assert!(record.address.starts_with("0x"));
            assert!(is_valid_checksum_address(&record.address));
            assert_eq!(
                record.mnemonic.split_whitespace().count(),
                strength.word_count()
            );
            assert_eq!(batch.get(&record.address), Some(record));
        }
    }
}

/// passphrase 改变全部派生结果
#[test]
fn test_passphrase_changes_addresses() {
    let plain = KeyManager::new(BitStrength::Bits128, "", ABANDON_MNEMONIC).unwrap();
    let salted = KeyManager::new(BitStrength::Bits128, "TREZOR", ABANDON_MNEMONIC).unwrap();

    let a = plain.get_key(PURPOSE_BIP44, 60, 0, 0, 0).unwrap();
    let b = salted.get_key(PURPOSE_BIP44, 60, 0, 0, 0).unwrap();
    assert_ne!(*a.private_key_bytes(), *b.private_key_bytes());
}

/// 助记词与声明的位强度不符时拒绝
#[test]
fn test_word_count_must_match_strength() {
    let err = KeyManager::new(BitStrength::Bits256, "", HARDHAT_MNEMONIC).unwrap_err();
    assert_eq!(err.kind(), "invalid_seed");
}
