//! HD 密钥管理
//!
//! 助记词 + 密码 → BIP39 种子 → BIP32 主密钥 → BIP44 子密钥
//!
//! 所有派生都是输入的纯函数：同一 (种子, 路径) 永远得到同一密钥

use bip39::{Language, Mnemonic};
use coins_bip32::prelude::*;
use k256::ecdsa::SigningKey;
use zeroize::Zeroizing;

use crate::domain::mnemonic::{BitStrength, MnemonicSource};
use crate::error::{Result, ScanError};

/// BIP44 purpose
pub const PURPOSE_BIP44: u32 = 44;

/// 硬化派生标志位
pub const HARDENED: u32 = 0x8000_0000;

/// 单层派生遇到无效子密钥时最多尝试的后续索引数
pub const MAX_INVALID_CHILD_RETRIES: u32 = 16;

/// BIP44 派生路径: m/purpose'/coin_type'/account'/change/index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DerivationPath {
    pub purpose: u32,
    pub coin_type: u32,
    pub account: u32,
    pub change: u32,
    pub index: u32,
}

impl DerivationPath {
    /// 逐层的 (索引, 是否硬化)
    pub fn levels(&self) -> [(u32, bool); 5] {
        [
            (self.purpose, true),
            (self.coin_type, true),
            (self.account, true),
            (self.change, false),
            (self.index, false),
        ]
    }

    fn with_levels(levels: [u32; 5]) -> Self {
        Self {
            purpose: levels[0],
            coin_type: levels[1],
            account: levels[2],
            change: levels[3],
            index: levels[4],
        }
    }
}

impl std::fmt::Display for DerivationPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "m/{}'/{}'/{}'/{}/{}",
            self.purpose, self.coin_type, self.account, self.change, self.index
        )
    }
}

/// 派生出的子密钥
#[derive(Clone)]
pub struct ChildKey {
    /// 实际使用的路径（遇到无效索引时可能与请求路径不同）
    pub path: DerivationPath,
    key: XPriv,
}

impl ChildKey {
    /// 32 字节大端私钥标量
    pub fn private_key_bytes(&self) -> Zeroizing<[u8; 32]> {
        let signing_key: &SigningKey = self.key.as_ref();
        Zeroizing::new(signing_key.to_bytes().into())
    }

    pub fn xpriv(&self) -> &XPriv {
        &self.key
    }
}

impl std::fmt::Debug for ChildKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChildKey")
            .field("path", &self.path.to_string())
            .finish_non_exhaustive()
    }
}

/// HD 密钥管理器
///
/// 每个实例独占一个主密钥；构造后只读，可在线程间共享。
pub struct KeyManager {
    bit_strength: BitStrength,
    mnemonic: Mnemonic,
    master: XPriv,
}

impl KeyManager {
    /// 从助记词创建
    ///
    /// 助记词无法解析、校验和错误或词数与 `bit_strength` 不符时返回 `InvalidSeed`
    pub fn new(bit_strength: BitStrength, passphrase: &str, mnemonic: &str) -> Result<Self> {
        let mnemonic = Mnemonic::parse_in(Language::English, mnemonic)
            .map_err(|e| ScanError::InvalidSeed(e.to_string()))?;

        if mnemonic.word_count() != bit_strength.word_count() {
            return Err(ScanError::InvalidSeed(format!(
                "mnemonic has {} words, {}-bit strength requires {}",
                mnemonic.word_count(),
                bit_strength,
                bit_strength.word_count()
            )));
        }

        let seed = Zeroizing::new(mnemonic.to_seed(passphrase));
        let master = XPriv::root_from_seed(seed.as_ref(), Some(Hint::Legacy))
            .map_err(|e| ScanError::Derivation(format!("master key: {}", e)))?;

        Ok(Self {
            bit_strength,
            mnemonic,
            master,
        })
    }

    /// 从助记词来源取一个新助记词并创建
    pub fn generate(
        bit_strength: BitStrength,
        passphrase: &str,
        source: &dyn MnemonicSource,
    ) -> Result<Self> {
        let phrase = Zeroizing::new(source.generate(bit_strength)?);
        Self::new(bit_strength, passphrase, &phrase)
    }

    pub fn bit_strength(&self) -> BitStrength {
        self.bit_strength
    }

    /// 规范化后的助记词
    pub fn mnemonic(&self) -> String {
        self.mnemonic.to_string()
    }

    pub fn master_key(&self) -> &XPriv {
        &self.master
    }

    /// 主密钥的 Base58Check 序列化 (xprv...)，仅用于展示/导出
    pub fn master_key_b58(&self) -> Result<String> {
        serialize_xpriv(&self.master)
    }

    /// 按 BIP44 路径逐层派生子密钥
    ///
    /// 某一层得到无效子密钥（概率约 2^-127）时按 BIP32 规定跳到下一个索引，
    /// 最多尝试 `MAX_INVALID_CHILD_RETRIES` 次；实际路径记录在 `ChildKey::path`。
    pub fn get_key(
        &self,
        purpose: u32,
        coin_type: u32,
        account: u32,
        change: u32,
        index: u32,
    ) -> Result<ChildKey> {
        let requested = DerivationPath {
            purpose,
            coin_type,
            account,
            change,
            index,
        };
        self.derive(&requested)
    }

    pub fn derive(&self, path: &DerivationPath) -> Result<ChildKey> {
        let mut key = self.master.clone();
        let mut effective = [0u32; 5];

        for (level, (index, hardened)) in path.levels().into_iter().enumerate() {
            let (child, used) = derive_level(&key, index, hardened)?;
            effective[level] = used;
            key = child;
        }

        let effective = DerivationPath::with_levels(effective);
        if effective != *path {
            tracing::warn!(
                requested = %path,
                effective = %effective,
                "derivation skipped invalid child index"
            );
        }

        Ok(ChildKey {
            path: effective,
            key,
        })
    }
}

impl std::fmt::Debug for KeyManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyManager")
            .field("bit_strength", &self.bit_strength)
            .finish_non_exhaustive()
    }
}

/// 派生单层子密钥，无效索引时递增重试
fn derive_level(parent: &XPriv, index: u32, hardened: bool) -> Result<(XPriv, u32)> {
    if index >= HARDENED {
        return Err(ScanError::Derivation(format!(
            "path component {} exceeds 2^31 - 1",
            index
        )));
    }

    let mut candidate = index;
    let mut last_error = String::new();

    for _ in 0..MAX_INVALID_CHILD_RETRIES {
        if candidate >= HARDENED {
            break;
        }

        let raw = if hardened { candidate | HARDENED } else { candidate };
        match parent.derive_child(raw) {
            Ok(child) => return Ok((child, candidate)),
            Err(e) => {
                tracing::warn!(index = candidate, hardened, error = %e, "invalid child key");
                last_error = e.to_string();
                candidate += 1;
            }
        }
    }

    Err(ScanError::Derivation(format!(
        "no valid child key from index {}: {}",
        index, last_error
    )))
}

/// BIP32 主网扩展私钥序列化 (Legacy hint → `xprv` 前缀)
pub fn serialize_xpriv(key: &XPriv) -> Result<String> {
    MainnetEncoder::xpriv_to_base58(key)
        .map_err(|e| ScanError::Derivation(format!("xprv encoding: {}", e)))
}
