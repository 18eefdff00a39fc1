//! 助记词与熵来源
//!
//! 助记词由外部来源提供，扫描核心只消费，不持久化

use bip39::{Language, Mnemonic};
use rand::{rngs::OsRng, RngCore};
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::error::{Result, ScanError};

/// BIP39 熵位强度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum BitStrength {
    Bits128,
    Bits160,
    Bits192,
    Bits224,
    Bits256,
}

impl BitStrength {
    /// 所有合法强度，按从弱到强排列
    pub const ALL: [BitStrength; 5] = [
        BitStrength::Bits128,
        BitStrength::Bits160,
        BitStrength::Bits192,
        BitStrength::Bits224,
        BitStrength::Bits256,
    ];

    pub fn bits(self) -> u32 {
        match self {
            BitStrength::Bits128 => 128,
            BitStrength::Bits160 => 160,
            BitStrength::Bits192 => 192,
            BitStrength::Bits224 => 224,
            BitStrength::Bits256 => 256,
        }
    }

    /// 熵字节数 (16..=32)
    pub fn entropy_bytes(self) -> usize {
        (self.bits() / 8) as usize
    }

    /// 对应的助记词数量：每 32 位熵 3 个词
    pub fn word_count(self) -> usize {
        (self.bits() / 32 * 3) as usize
    }

    pub fn from_word_count(words: usize) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.word_count() == words)
    }
}

impl TryFrom<u32> for BitStrength {
    type Error = ScanError;

    fn try_from(bits: u32) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|s| s.bits() == bits)
            .ok_or_else(|| {
                ScanError::InvalidSeed(format!(
                    "unsupported bit strength {} (expected 128, 160, 192, 224 or 256)",
                    bits
                ))
            })
    }
}

impl From<BitStrength> for u32 {
    fn from(strength: BitStrength) -> u32 {
        strength.bits()
    }
}

impl std::fmt::Display for BitStrength {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.bits())
    }
}

/// 助记词来源
pub trait MnemonicSource: Send + Sync {
    /// 生成一个新的 BIP39 英文助记词
    fn generate(&self, strength: BitStrength) -> Result<String>;
}

/// 使用操作系统 CSPRNG 的助记词来源
#[derive(Debug, Clone, Copy, Default)]
pub struct OsRngMnemonicSource;

impl MnemonicSource for OsRngMnemonicSource {
    fn generate(&self, strength: BitStrength) -> Result<String> {
        let mut entropy = Zeroizing::new(vec![0u8; strength.entropy_bytes()]);
        OsRng
            .try_fill_bytes(entropy.as_mut_slice())
            .map_err(|e| ScanError::InvalidSeed(format!("entropy source failed: {}", e)))?;

        let mnemonic = Mnemonic::from_entropy_in(Language::English, entropy.as_slice())
            .map_err(|e| ScanError::InvalidSeed(e.to_string()))?;

        Ok(mnemonic.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bit_strength_table() {
        let table: Vec<(u32, usize, usize)> = BitStrength::ALL
            .iter()
            .map(|s| (s.bits(), s.entropy_bytes(), s.word_count()))
            .collect();

        assert_eq!(
            table,
            vec![
                (128, 16, 12),
                (160, 20, 15),
                (192, 24, 18),
                (224, 28, 21),
                (256, 32, 24),
            ]
        );
    }

    #[test]
    fn test_bit_strength_conversion() {
        assert_eq!(BitStrength::try_from(192).unwrap(), BitStrength::Bits192);
        assert!(BitStrength::try_from(100).is_err());
        assert_eq!(BitStrength::from_word_count(24), Some(BitStrength::Bits256));
        assert_eq!(BitStrength::from_word_count(13), None);
    }

    #[test]
    fn test_os_rng_source_word_counts() {
        let source = OsRngMnemonicSource;
        for strength in BitStrength::ALL {
            let phrase = source.generate(strength).unwrap();
            assert_eq!(phrase.split_whitespace().count(), strength.word_count());
            // 生成的助记词必须通过 BIP39 校验
            assert!(Mnemonic::parse_in(Language::English, &phrase).is_ok());
        }
    }

    #[test]
    fn test_os_rng_source_is_not_repeating() {
        let source = OsRngMnemonicSource;
        let a = source.generate(BitStrength::Bits128).unwrap();
        let b = source.generate(BitStrength::Bits128).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_bit_strength_serde_as_number() {
        let json = serde_json::to_string(&BitStrength::Bits224).unwrap();
        assert_eq!(json, "224");
        let parsed: BitStrength = serde_json::from_str("160").unwrap();
        assert_eq!(parsed, BitStrength::Bits160);
        assert!(serde_json::from_str::<BitStrength>("161").is_err());
    }
}
