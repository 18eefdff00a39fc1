//! EVM 地址编码
//!
//! 私钥标量 → secp256k1 公钥 → Keccak-256 → 后 20 字节 → EIP-55 大小写校验
//!
//! 每次哈希都构造新的 Keccak 上下文，函数无共享状态，可并发调用

use k256::ecdsa::SigningKey;
use sha3::{Digest, Keccak256};

use crate::error::{Result, ScanError};

/// 私钥长度（字节）
pub const PRIVATE_KEY_LEN: usize = 32;

/// 坐标宽度（字节）
const COORDINATE_LEN: usize = 32;

/// 编码结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedKey {
    /// 私钥 (小写 hex，64 字符)
    pub private_key_hex: String,
    /// 未压缩公钥 X || Y (hex，128 字符，无 0x04 前缀)
    pub public_key_hex: String,
    /// EIP-55 校验地址
    pub address: String,
}

/// 从 32 字节私钥生成 Ethereum 地址
///
/// 长度不是 32、值为零或不小于曲线阶的输入在哈希之前被拒绝
pub fn encode_ethereum(private_key: &[u8]) -> Result<EncodedKey> {
    if private_key.len() != PRIVATE_KEY_LEN {
        return Err(ScanError::Encoding(format!(
            "expected {} bytes, got {}",
            PRIVATE_KEY_LEN,
            private_key.len()
        )));
    }

    let signing_key = SigningKey::from_slice(private_key).map_err(|_| {
        ScanError::Encoding("scalar is zero or not below the secp256k1 order".to_string())
    })?;

    let public_key = uncompressed_public_key(&signing_key)?;
    let address = to_checksum_address(&public_key_to_address(&public_key));

    Ok(EncodedKey {
        private_key_hex: hex::encode(private_key),
        public_key_hex: hex::encode(public_key),
        address,
    })
}

/// 公钥 X || Y，两个坐标都按 32 字节定宽大端编码
fn uncompressed_public_key(signing_key: &SigningKey) -> Result<[u8; 2 * COORDINATE_LEN]> {
    let point = signing_key.verifying_key().to_encoded_point(false);

    let (x, y) = match (point.x(), point.y()) {
        (Some(x), Some(y)) => (x, y),
        _ => {
            return Err(ScanError::Encoding(
                "public key is the identity point".to_string(),
            ))
        }
    };

    let mut out = [0u8; 2 * COORDINATE_LEN];
    out[..COORDINATE_LEN].copy_from_slice(x);
    out[COORDINATE_LEN..].copy_from_slice(y);
    Ok(out)
}

/// Keccak-256(X || Y) 的后 20 字节
pub fn public_key_to_address(public_key: &[u8; 64]) -> [u8; 20] {
    let hash = Keccak256::digest(public_key);
    let mut address = [0u8; 20];
    address.copy_from_slice(&hash[12..]);
    address
}

/// 原始地址 → `0x` + EIP-55 大小写混合 hex
pub fn to_checksum_address(address: &[u8; 20]) -> String {
    format!("0x{}", checksum_hex(&hex::encode(address)))
}

/// 对 40 个小写 hex 字符应用 EIP-55 大小写
///
/// 字符 i 为字母且对应半字节（偶数位取高 4 位，奇数位取低 4 位）大于 7 时大写
pub fn checksum_hex(lower_hex: &str) -> String {
    let hash = Keccak256::digest(lower_hex.as_bytes());

    lower_hex
        .chars()
        .enumerate()
        .map(|(i, ch)| {
            let byte = hash[i / 2];
            let nibble = if i % 2 == 0 { byte >> 4 } else { byte & 0x0f };
            if ch.is_ascii_alphabetic() && nibble > 7 {
                ch.to_ascii_uppercase()
            } else {
                ch
            }
        })
        .collect()
}

/// 验证地址符合 `0x` + 40 hex 且大小写与 EIP-55 一致
pub fn is_valid_checksum_address(address: &str) -> bool {
    let Some(hex_part) = address.strip_prefix("0x") else {
        return false;
    };

    if hex_part.len() != 40 || !hex_part.chars().all(|c| c.is_ascii_hexdigit()) {
        return false;
    }

    checksum_hex(&hex_part.to_ascii_lowercase()) == hex_part
}
