//! 扫描驱动
//!
//! 生成批次 → 本地索引解析 →（在线模式）远程余额解析 → 记录命中
//!
//! 状态机: Idle → Generating → Resolving → Recording → Generating ... → Idle

use std::sync::Arc;

use tokio::sync::watch;

use crate::config::{ScanConfig, ScanMode};
use crate::domain::{AddressBatch, AddressRecord, BitStrength};
use crate::service::balance_resolver::BalanceResolver;
use crate::service::batch_generator::AddressBatchGenerator;
use crate::service::recorder::Recorder;

/// 扫描参数（由配置显式传入，不读取全局状态）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanSettings {
    pub mode: ScanMode,
    pub bit_strengths: Vec<BitStrength>,
    pub online_batch_size: usize,
    pub offline_batch_size: usize,
    /// 并行生成的 worker 数
    pub workers: usize,
}

impl ScanSettings {
    pub fn from_config(config: &ScanConfig) -> Self {
        Self {
            mode: config.mode,
            bit_strengths: config.bit_strengths.clone(),
            online_batch_size: config.online_batch_size,
            offline_batch_size: config.offline_batch_size,
            workers: config.workers,
        }
    }

    /// 离线模式没有网络开销，批次更大
    pub fn batch_size(&self) -> usize {
        match self.mode {
            ScanMode::Online => self.online_batch_size,
            ScanMode::Offline => self.offline_batch_size,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    Idle,
    Generating,
    Resolving,
    Recording,
}

/// 扫描统计
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanReport {
    pub batches: u64,
    pub generated: u64,
    pub matched: u64,
    pub recorded: u64,
    pub recorder_failures: u64,
    pub resolver_failures: u64,
}

pub struct ScanDriver {
    settings: ScanSettings,
    generator: AddressBatchGenerator,
    local: Arc<dyn BalanceResolver>,
    remote: Option<Arc<dyn BalanceResolver>>,
    recorder: Arc<dyn Recorder>,
    state: watch::Sender<ScanState>,
}

impl ScanDriver {
    pub fn new(
        settings: ScanSettings,
        generator: AddressBatchGenerator,
        local: Arc<dyn BalanceResolver>,
        remote: Option<Arc<dyn BalanceResolver>>,
        recorder: Arc<dyn Recorder>,
    ) -> Self {
        let (state, _) = watch::channel(ScanState::Idle);
        Self {
            settings,
            generator,
            local,
            remote,
            recorder,
            state,
        }
    }

    pub fn settings(&self) -> &ScanSettings {
        &self.settings
    }

    pub fn state(&self) -> ScanState {
        *self.state.borrow()
    }

    /// 订阅状态变化
    pub fn subscribe_state(&self) -> watch::Receiver<ScanState> {
        self.state.subscribe()
    }

    /// 有界扫描：每个位强度一个批次，完成后返回
    ///
    /// 在线模式下，本地索引未命中的地址再走远程余额查询
    pub async fn run_bounded(&self) -> ScanReport {
        let mut report = ScanReport::default();
        let allow_remote = self.settings.mode == ScanMode::Online;
        let size = self.settings.batch_size();

        for &strength in &self.settings.bit_strengths {
            self.process_batch(strength, size, allow_remote, &mut report)
                .await;
        }

        self.transition(ScanState::Idle);
        tracing::info!(
            chain = %self.generator.chain().symbol,
            mode = ?self.settings.mode,
            batches = report.batches,
            generated = report.generated,
            matched = report.matched,
            recorded = report.recorded,
            "bounded scan finished"
        );
        report
    }

    /// 无界离线扫描：循环生成 + 本地解析，直到收到停止信号
    ///
    /// 从不调用远程解析器。停止信号在批次之间检查，进行中的批次会完成记录。
    pub async fn run_unbounded(&self, shutdown: watch::Receiver<bool>) -> ScanReport {
        let mut report = ScanReport::default();
        let size = self.settings.offline_batch_size;

        tracing::info!(
            chain = %self.generator.chain().symbol,
            batch_size = size,
            "unbounded offline scan started"
        );

        if self.settings.bit_strengths.is_empty() {
            tracing::warn!("no bit strengths configured, unbounded scan not started");
            return report;
        }

        'scan: loop {
            if *shutdown.borrow() {
                break;
            }

            for &strength in &self.settings.bit_strengths {
                if *shutdown.borrow() {
                    break 'scan;
                }
                self.process_batch(strength, size, false, &mut report).await;
            }

            if report.batches % 100 == 0 {
                tracing::info!(
                    batches = report.batches,
                    generated = report.generated,
                    matched = report.matched,
                    "scan progress"
                );
            }
        }

        self.transition(ScanState::Idle);
        tracing::info!(
            batches = report.batches,
            generated = report.generated,
            matched = report.matched,
            recorded = report.recorded,
            "unbounded scan stopped"
        );
        report
    }

    async fn process_batch(
        &self,
        strength: BitStrength,
        size: usize,
        allow_remote: bool,
        report: &mut ScanReport,
    ) {
        self.transition(ScanState::Generating);
        let batch = self.generate_batch(strength, size).await;
        report.batches += 1;
        report.generated += batch.len() as u64;

        self.transition(ScanState::Resolving);
        let hits = self.resolve_batch(&batch, allow_remote, report).await;

        self.transition(ScanState::Recording);
        report.matched += hits.len() as u64;
        for record in hits {
            tracing::info!(chain = %record.chain, address = %record.address, "match found");
            match self.recorder.record(&record.to_string()).await {
                Ok(()) => report.recorded += 1,
                Err(e) => {
                    report.recorder_failures += 1;
                    tracing::error!(address = %record.address, error = %e, "failed to record match");
                }
            }
        }
    }

    /// CPU 密集的派生放到阻塞线程池，按 worker 数拆分
    async fn generate_batch(&self, strength: BitStrength, size: usize) -> AddressBatch {
        let workers = self.settings.workers.clamp(1, size.max(1));
        let base = size / workers;
        let extra = size % workers;

        let handles: Vec<_> = (0..workers)
            .map(|worker| {
                let count = base + usize::from(worker < extra);
                let generator = self.generator.clone();
                tokio::task::spawn_blocking(move || generator.generate(strength, count))
            })
            .collect();

        let mut batch = AddressBatch::with_capacity(size);
        for result in futures::future::join_all(handles).await {
            match result {
                Ok(part) => batch.merge(part),
                Err(e) => tracing::error!(error = %e, "generation worker failed"),
            }
        }
        batch
    }

    /// 返回命中的记录；远程命中会附带余额
    async fn resolve_batch(
        &self,
        batch: &AddressBatch,
        allow_remote: bool,
        report: &mut ScanReport,
    ) -> Vec<AddressRecord> {
        let addresses = batch.addresses();
        let mut hits = Vec::new();

        let absent = match self.local.resolve(addresses).await {
            Ok(resolution) => {
                hits.extend(
                    resolution
                        .matched(addresses)
                        .iter()
                        .filter_map(|a| batch.get(a).cloned()),
                );
                resolution.unmatched(addresses)
            }
            Err(e) => {
                report.resolver_failures += 1;
                tracing::warn!(error = %e, "local index lookup failed");
                addresses.to_vec()
            }
        };

        let remote = match (&self.remote, allow_remote) {
            (Some(remote), true) if !absent.is_empty() => remote,
            _ => return hits,
        };

        match remote.resolve(&absent).await {
            Ok(resolution) => {
                for address in resolution.matched(&absent) {
                    if let Some(record) = batch.get(&address) {
                        let balance = resolution.balance_of(&address).unwrap_or_default();
                        hits.push(record.clone().with_balance(balance));
                    }
                }
            }
            Err(e) => {
                report.resolver_failures += 1;
                tracing::warn!(
                    addresses = absent.len(),
                    kind = e.kind(),
                    error = %e,
                    "remote balance lookup failed, batch treated as empty"
                );
            }
        }

        hits
    }

    fn transition(&self, next: ScanState) {
        let previous = self.state.send_replace(next);
        if previous != next {
            tracing::debug!(from = ?previous, to = ?next, "scan state");
        }
    }
}
