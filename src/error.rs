//! 扫描错误类型
//!
//! 除配置错误外，所有错误都只影响单个种子/地址/批次，不终止扫描

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScanError {
    /// 助记词无法解析、校验和错误或与位强度不匹配
    #[error("Invalid seed: {0}")]
    InvalidSeed(String),

    /// 密钥派生内部失败
    #[error("Key derivation failed: {0}")]
    Derivation(String),

    /// 私钥标量格式错误（长度、零值或超出曲线阶）
    #[error("Invalid private key: {0}")]
    Encoding(String),

    /// 远程余额服务不可用、超时或响应格式错误
    #[error("Balance resolver unavailable: {0}")]
    ResolverUnavailable(String),

    /// 结果写入失败
    #[error("Recorder failure: {0}")]
    Recorder(String),

    /// 启动时的配置错误（唯一的致命错误）
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ScanError {
    /// 错误是否可在单个种子/批次范围内恢复
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, ScanError::Config(_))
    }

    /// 用于日志的错误分类
    pub fn kind(&self) -> &'static str {
        match self {
            ScanError::InvalidSeed(_) => "invalid_seed",
            ScanError::Derivation(_) => "derivation_error",
            ScanError::Encoding(_) => "encoding_error",
            ScanError::ResolverUnavailable(_) => "resolver_unavailable",
            ScanError::Recorder(_) => "recorder_failure",
            ScanError::Config(_) => "config_error",
        }
    }
}

impl From<reqwest::Error> for ScanError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ScanError::ResolverUnavailable(format!("request timed out: {}", err))
        } else {
            ScanError::ResolverUnavailable(err.to_string())
        }
    }
}

impl From<std::io::Error> for ScanError {
    fn from(err: std::io::Error) -> Self {
        ScanError::Recorder(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ScanError>;
