//! 远程余额查询 - Etherscan 兼容 `balancemulti` 接口
//!
//! GET <base_url><逗号分隔地址>
//! 响应: {status, message, result: [{account, balance}]}，balance 为最小单位十进制字符串

use std::{collections::HashMap, time::Duration};

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::error::{Result, ScanError};
use crate::service::balance_resolver::{BalanceResolver, Resolution, ResolverKind};

/// Etherscan `balancemulti` 单次最多 20 个地址
pub const DEFAULT_MAX_ADDRESSES_PER_REQUEST: usize = 20;

const DEFAULT_MAX_RETRIES: u32 = 2;
const DEFAULT_RETRY_DELAY_MS: u64 = 500;

/// rust_decimal 支持的最大小数位
const MAX_DECIMALS: u32 = 28;

#[derive(Debug, Deserialize)]
struct EtherscanResponse {
    #[serde(default)]
    status: String,
    #[serde(default)]
    message: String,
    /// 成功时为数组，失败时为错误字符串
    result: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct AccountBalance {
    account: String,
    balance: String,
}

/// 远程余额解析器
pub struct EtherscanResolver {
    http_client: reqwest::Client,
    base_url: String,
    decimals: u32,
    max_addresses_per_request: usize,
    max_retries: u32,
    retry_delay: Duration,
}

impl EtherscanResolver {
    /// 创建解析器
    ///
    /// `base_url` 是完整的查询前缀（地址直接拼接在后面），格式错误属于启动期配置错误
    pub fn new(base_url: &str, decimals: u32, timeout: Duration) -> Result<Self> {
        let parsed = reqwest::Url::parse(base_url)
            .map_err(|e| ScanError::Config(format!("invalid balance API url {}: {}", base_url, e)))?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(ScanError::Config(format!(
                "balance API url must be http(s): {}",
                base_url
            )));
        }
        if decimals > MAX_DECIMALS {
            return Err(ScanError::Config(format!(
                "unsupported native unit decimals: {}",
                decimals
            )));
        }

        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout.min(Duration::from_secs(10)))
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(4)
            .build()
            .map_err(|e| ScanError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            base_url: base_url.to_string(),
            decimals,
            max_addresses_per_request: DEFAULT_MAX_ADDRESSES_PER_REQUEST,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay: Duration::from_millis(DEFAULT_RETRY_DELAY_MS),
        })
    }

    /// 每次请求的地址上限（至少 1）
    pub fn with_max_addresses_per_request(mut self, max: usize) -> Self {
        self.max_addresses_per_request = max.max(1);
        self
    }

    pub fn with_retry(mut self, max_retries: u32, delay: Duration) -> Self {
        self.max_retries = max_retries;
        self.retry_delay = delay;
        self
    }

    /// 由 API 根地址和 key 拼出 `balancemulti` 查询前缀
    pub fn balance_multi_url(api_url: &str, api_key: Option<&str>) -> String {
        let mut url = format!(
            "{}?module=account&action=balancemulti&tag=latest",
            api_url.trim_end_matches('/')
        );
        if let Some(key) = api_key.filter(|k| !k.is_empty()) {
            url.push_str("&apikey=");
            url.push_str(key);
        }
        url.push_str("&address=");
        url
    }

    /// 查询单个分片（带重试）
    async fn query_chunk(&self, chunk: &[String]) -> Result<HashMap<String, Decimal>> {
        let uri = format!("{}{}", self.base_url, chunk.join(","));
        let mut attempt = 0;

        loop {
            match self.fetch(&uri).await {
                Ok(body) => return parse_balance_response(&body, chunk, self.decimals),
                Err(e) if attempt < self.max_retries => {
                    attempt += 1;
                    tracing::debug!(attempt, error = %e, "balance query failed, retrying");
                    tokio::time::sleep(self.retry_delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn fetch(&self, uri: &str) -> Result<String> {
        let response = self.http_client.get(uri).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScanError::ResolverUnavailable(format!(
                "HTTP {}",
                status.as_u16()
            )));
        }

        Ok(response.text().await?)
    }
}

#[async_trait]
impl BalanceResolver for EtherscanResolver {
    fn kind(&self) -> ResolverKind {
        ResolverKind::Remote
    }

    async fn resolve(&self, addresses: &[String]) -> Result<Resolution> {
        let mut balances = HashMap::with_capacity(addresses.len());
        let mut failed_chunks = 0usize;
        let mut last_error = None;

        let chunks: Vec<&[String]> = addresses.chunks(self.max_addresses_per_request).collect();
        let total_chunks = chunks.len();

        for chunk in chunks {
            match self.query_chunk(chunk).await {
                Ok(found) => balances.extend(found),
                Err(e) => {
                    failed_chunks += 1;
                    tracing::warn!(
                        addresses = chunk.len(),
                        kind = e.kind(),
                        error = %e,
                        "balance query failed, addresses treated as unknown"
                    );
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(e) if failed_chunks == total_chunks => Err(e),
            _ => Ok(Resolution::Balances(balances)),
        }
    }
}

/// 解析 `balancemulti` 响应
///
/// 响应地址按不区分大小写匹配，结果用调用方的地址拼写作为键；
/// 不在查询列表中的账户和无法解析的余额被忽略
pub fn parse_balance_response(
    body: &str,
    queried: &[String],
    decimals: u32,
) -> Result<HashMap<String, Decimal>> {
    let response: EtherscanResponse = serde_json::from_str(body)
        .map_err(|e| ScanError::ResolverUnavailable(format!("malformed response: {}", e)))?;

    let entries: Vec<AccountBalance> = match response.result {
        serde_json::Value::Array(_) => serde_json::from_value(response.result).map_err(|e| {
            ScanError::ResolverUnavailable(format!("malformed result entries: {}", e))
        })?,
        other => {
            return Err(ScanError::ResolverUnavailable(format!(
                "status={} message={} result={}",
                response.status, response.message, other
            )))
        }
    };

    let lookup: HashMap<String, &String> = queried
        .iter()
        .map(|a| (a.to_ascii_lowercase(), a))
        .collect();

    let mut balances = HashMap::with_capacity(entries.len());
    for entry in entries {
        let Some(original) = lookup.get(&entry.account.to_ascii_lowercase()) else {
            continue;
        };

        match to_native_units(&entry.balance, decimals) {
            Ok(value) => {
                balances.insert((*original).clone(), value);
            }
            Err(e) => {
                tracing::warn!(address = %original, error = %e, "unparseable balance ignored");
            }
        }
    }

    Ok(balances)
}

/// 最小单位十进制字符串 → 原生币单位（精确，无浮点）
///
/// ETH: 1 ether = 10^18 wei，所以 "1000000000000000000" → 1
pub fn to_native_units(raw: &str, decimals: u32) -> Result<Decimal> {
    let value: u128 = raw
        .trim()
        .parse()
        .map_err(|e| ScanError::ResolverUnavailable(format!("invalid balance {:?}: {}", raw, e)))?;

    let value = i128::try_from(value)
        .map_err(|_| ScanError::ResolverUnavailable(format!("balance out of range: {}", raw)))?;

    Decimal::try_from_i128_with_scale(value, decimals)
        .map(|d| d.normalize())
        .map_err(|e| ScanError::ResolverUnavailable(format!("balance out of range {}: {}", raw, e)))
}
