//! 测试辅助模块
//! 提供桩实现：脚本化助记词来源、远程解析器替身、失败的记录器

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rust_decimal::Decimal;

use hdscan::config::ScanMode;
use hdscan::domain::{BitStrength, ChainConfig, ChainRegistry, MnemonicSource};
use hdscan::error::{Result, ScanError};
use hdscan::service::{
    AddressBatchGenerator, BalanceResolver, Resolution, ResolverKind, ScanSettings, Recorder,
};

pub const HARDHAT_MNEMONIC: &str = "test test test test test test test test test test test junk";
pub const HARDHAT_ADDRESS_0: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";

pub const ABANDON_MNEMONIC: &str = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";
pub const ABANDON_ADDRESS_0: &str = "0x9858EfFD232B4033E47d90003D41EC34EcaEda94";

pub fn eth() -> ChainConfig {
    ChainRegistry::new()
        .get_by_symbol("ETH")
        .cloned()
        .expect("ETH is registered")
}

/// 按顺序返回预设助记词，用完后返回 InvalidSeed
pub struct ScriptedSource(Mutex<VecDeque<String>>);

impl ScriptedSource {
    pub fn new(phrases: &[&str]) -> Self {
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

pub fn scripted_generator(phrases: &[&str]) -> AddressBatchGenerator {
    AddressBatchGenerator::new(eth(), String::new(), Arc::new(ScriptedSource::new(phrases)))
}

/// 单线程、单一 128 位强度的小批次设置
pub fn settings(mode: ScanMode, batch_size: usize) -> ScanSettings {
    ScanSettings {
        mode,
        bit_strengths: vec![BitStrength::Bits128],
        online_batch_size: batch_size,
        offline_batch_size: batch_size,
        workers: 1,
    }
}

/// 被调用即 panic：证明离线路径不会发起网络请求
pub struct PanickingResolver;

#[async_trait]
impl BalanceResolver for PanickingResolver {
    fn kind(&self) -> ResolverKind {
        ResolverKind::Remote
    }

    async fn resolve(&self, addresses: &[String]) -> Result<Resolution> {
        panic!("remote resolver must not be called (got {} addresses)", addresses.len());
    }
}

/// 返回固定余额，并记录每次查询的地址
#[derive(Default)]
pub struct FixedBalanceResolver {
    balances: HashMap<String, Decimal>,
    calls: Mutex<Vec<Vec<String>>>,
}

impl FixedBalanceResolver {
    pub fn new(balances: &[(&str, Decimal)]) -> Self {
        Self {
            balances: balances
                .iter()
                .map(|(a, b)| (a.to_string(), *b))
                .collect(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl BalanceResolver for FixedBalanceResolver {
    fn kind(&self) -> ResolverKind {
        ResolverKind::Remote
    }

    async fn resolve(&self, addresses: &[String]) -> Result<Resolution> {
        self.calls.lock().unwrap().push(addresses.to_vec());
        Ok(Resolution::Balances(
            addresses
                .iter()
                .filter_map(|a| self.balances.get(a).map(|b| (a.clone(), *b)))
                .collect(),
        ))
    }
}

/// 远程服务始终不可用
pub struct UnavailableResolver;

#[async_trait]
impl BalanceResolver for UnavailableResolver {
    fn kind(&self) -> ResolverKind {
        ResolverKind::Remote
    }

    async fn resolve(&self, _addresses: &[String]) -> Result<Resolution> {
        Err(ScanError::ResolverUnavailable("connection refused".into()))
    }
}

/// 写入始终失败
pub struct FailingRecorder;

#[async_trait]
impl Recorder for FailingRecorder {
    async fn record(&self, _line: &str) -> Result<()> {
        Err(ScanError::Recorder("disk full".into()))
    }
}
