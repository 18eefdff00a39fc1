//! 配置管理模块
//! 支持从环境变量和配置文件加载配置

use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::domain::{BitStrength, ChainRegistry};
use crate::error::ScanError;

/// 应用配置结构体
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub scan: ScanConfig,
    #[serde(default)]
    pub resolver: ResolverConfig,
    #[serde(default)]
    pub index: IndexConfig,
    #[serde(default)]
    pub recorder: RecorderConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// 扫描模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanMode {
    /// 本地索引 + 远程余额查询
    Online,
    /// 仅本地索引，无网络
    Offline,
}

impl FromStr for ScanMode {
    type Err = ScanError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "online" => Ok(ScanMode::Online),
            "offline" => Ok(ScanMode::Offline),
            other => Err(ScanError::Config(format!(
                "unknown scan mode '{}' (expected online or offline)",
                other
            ))),
        }
    }
}

/// 扫描配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    pub mode: ScanMode,
    /// 链符号或名称 (ETH, BNB, MATIC)
    pub chain: String,
    pub bit_strengths: Vec<BitStrength>,
    pub online_batch_size: usize,
    pub offline_batch_size: usize,
    pub workers: usize,
    /// BIP39 passphrase，默认为空
    pub passphrase: String,
}

/// 远程余额服务配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// 为空时使用链配置中的默认 API
    pub api_url: Option<String>,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
    pub max_addresses_per_request: usize,
    pub max_retries: u32,
}

/// 本地离线索引配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    pub path: Option<String>,
}

/// 结果记录配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecorderConfig {
    pub path: String,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String, // "json" or "text"
    pub enable_file_logging: bool,
    pub log_file_path: Option<String>,
}

fn env_parse<T: FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.trim().parse().ok())
}

/// 解析逗号分隔的位强度列表，无效项被忽略
pub fn parse_bit_strengths(value: &str) -> Vec<BitStrength> {
    value
        .split(',')
        .filter_map(|s| s.trim().parse::<u32>().ok())
        .filter_map(|bits| BitStrength::try_from(bits).ok())
        .collect()
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            mode: env_parse("SCAN_MODE").unwrap_or(ScanMode::Online),
            chain: std::env::var("SCAN_CHAIN").unwrap_or_else(|_| "ETH".to_string()),
            bit_strengths: std::env::var("SCAN_BIT_STRENGTHS")
                .ok()
                .map(|v| parse_bit_strengths(&v))
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| BitStrength::ALL.to_vec()),
            online_batch_size: env_parse("SCAN_ONLINE_BATCH_SIZE").unwrap_or(20),
            offline_batch_size: env_parse("SCAN_OFFLINE_BATCH_SIZE").unwrap_or(1000),
            workers: env_parse("SCAN_WORKERS").unwrap_or_else(|| {
                std::thread::available_parallelism()
                    .map(|n| n.get())
                    .unwrap_or(4)
            }),
            passphrase: std::env::var("SCAN_PASSPHRASE").unwrap_or_default(),
        }
    }
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            api_url: std::env::var("ETHERSCAN_API_URL").ok(),
            api_key: std::env::var("ETHERSCAN_API_KEY").ok(),
            timeout_secs: env_parse("RESOLVER_TIMEOUT_SECS").unwrap_or(15),
            max_addresses_per_request: env_parse("RESOLVER_MAX_ADDRESSES").unwrap_or(20),
            max_retries: env_parse("RESOLVER_MAX_RETRIES").unwrap_or(2),
        }
    }
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            path: std::env::var("OFFLINE_INDEX_PATH").ok(),
        }
    }
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            path: std::env::var("RECORD_PATH").unwrap_or_else(|_| "./found.txt".to_string()),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            format: std::env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string()),
            enable_file_logging: std::env::var("LOG_FILE_ENABLED")
                .ok()
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
            log_file_path: std::env::var("LOG_FILE_PATH").ok(),
        }
    }
}

impl Config {
    /// 从环境变量加载配置
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            scan: ScanConfig::default(),
            resolver: ResolverConfig::default(),
            index: IndexConfig::default(),
            recorder: RecorderConfig::default(),
            logging: LoggingConfig::default(),
        })
    }

    /// 从配置文件加载配置（缺失的字段回退到环境变量/默认值）
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;

        let config: Config =
            toml::from_str(&content).with_context(|| "Failed to parse config file as TOML")?;

        Ok(config)
    }

    /// 从环境变量和配置文件合并加载（配置文件优先级更高）
    pub fn from_env_and_file<P: AsRef<Path>>(path: Option<P>) -> Result<Self> {
        match path {
            Some(path) if path.as_ref().exists() => Self::from_file(path),
            Some(path) => {
                anyhow::bail!("Config file not found: {:?}", path.as_ref())
            }
            None => Self::from_env(),
        }
    }

    /// 验证配置有效性
    pub fn validate(&self) -> Result<()> {
        if ChainRegistry::new().get_by_symbol(&self.scan.chain).is_none() {
            anyhow::bail!("SCAN_CHAIN '{}' is not a supported chain", self.scan.chain);
        }

        if self.scan.bit_strengths.is_empty() {
            anyhow::bail!("SCAN_BIT_STRENGTHS must list at least one of 128,160,192,224,256");
        }

        if self.scan.online_batch_size == 0 || self.scan.offline_batch_size == 0 {
            anyhow::bail!("Batch sizes must be greater than zero");
        }

        if self.scan.workers == 0 {
            anyhow::bail!("SCAN_WORKERS must be greater than zero");
        }

        if self.scan.mode == ScanMode::Offline && self.index.path.is_none() {
            anyhow::bail!("OFFLINE_INDEX_PATH is required in offline mode");
        }

        if let Some(url) = &self.resolver.api_url {
            let parsed = reqwest::Url::parse(url)
                .with_context(|| format!("ETHERSCAN_API_URL is not a valid URL: {}", url))?;
            if parsed.scheme() != "http" && parsed.scheme() != "https" {
                anyhow::bail!("ETHERSCAN_API_URL must use http or https");
            }
        }

        if self.resolver.timeout_secs == 0 {
            anyhow::bail!("RESOLVER_TIMEOUT_SECS must be greater than zero");
        }

        if self.resolver.max_addresses_per_request == 0 {
            anyhow::bail!("RESOLVER_MAX_ADDRESSES must be greater than zero");
        }

        // 验证日志级别
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.to_lowercase().as_str()) {
            anyhow::bail!("LOG_LEVEL must be one of: {:?}", valid_levels);
        }

        // 验证日志格式
        if self.logging.format != "json" && self.logging.format != "text" {
            anyhow::bail!("LOG_FORMAT must be 'json' or 'text'");
        }

        Ok(())
    }
}
