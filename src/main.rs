//! hdscan 主入口

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::sync::watch;

use hdscan::{
    config::{Config, ScanMode},
    domain::{BitStrength, ChainConfig, ChainRegistry, OsRngMnemonicSource},
    infrastructure::logging::init_logging,
    service::{
        AddressBatchGenerator, BalanceResolver, EtherscanResolver, FileRecorder, OfflineIndex,
        ScanDriver, ScanSettings, SUB_ACCOUNT_COUNT,
    },
};

const RESOLVER_RETRY_DELAY: Duration = Duration::from_millis(500);

#[derive(Debug, Parser)]
#[command(name = "hdscan", version, about = "HD wallet address generation and balance scanner")]
struct Cli {
    /// TOML 配置文件
    #[arg(long, env = "CONFIG_PATH", global = true)]
    config: Option<PathBuf>,

    /// 覆盖 SCAN_CHAIN
    #[arg(long, global = true)]
    chain: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// 有界扫描：每个位强度生成一个批次
    Scan {
        /// online 或 offline，覆盖 SCAN_MODE
        #[arg(long)]
        mode: Option<ScanMode>,
        /// 重复整轮扫描的次数
        #[arg(long, default_value_t = 1)]
        rounds: u32,
    },
    /// 无界离线扫描，Ctrl-C 停止
    Hunt,
    /// 从已有助记词派生前几个子账户
    Derive {
        #[arg(long, env = "SCAN_MNEMONIC", hide_env_values = true)]
        mnemonic: String,
        /// 同时输出私钥和根密钥
        #[arg(long)]
        show_secrets: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // 1. 加载 .env
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // 2. 加载并校验配置
    let mut config = Config::from_env_and_file(cli.config.as_ref())?;
    if let Some(chain) = &cli.chain {
        config.scan.chain = chain.clone();
    }
    match &cli.command {
        Command::Scan {
            mode: Some(mode), ..
        } => config.scan.mode = *mode,
        Command::Hunt => config.scan.mode = ScanMode::Offline,
        _ => {}
    }
    config.validate().context("Invalid configuration")?;

    // 3. 初始化日志（guard 必须存活到进程退出）
    let _log_guard = init_logging(&config.logging)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    let chain = ChainRegistry::new()
        .get_by_symbol(&config.scan.chain)
        .cloned()
        .with_context(|| format!("Unsupported chain: {}", config.scan.chain))?;

    tracing::info!(
        chain = %chain.symbol,
        mode = ?config.scan.mode,
        workers = config.scan.workers,
        "hdscan starting"
    );

    match cli.command {
        Command::Scan { rounds, .. } => {
            let driver = build_driver(&config, chain)?;
            for round in 1..=rounds.max(1) {
                let report = driver.run_bounded().await;
                tracing::info!(
                    round,
                    generated = report.generated,
                    matched = report.matched,
                    recorded = report.recorded,
                    resolver_failures = report.resolver_failures,
                    recorder_failures = report.recorder_failures,
                    "scan round complete"
                );
            }
        }
        Command::Hunt => {
            let driver = build_driver(&config, chain)?;
            let (shutdown_tx, shutdown_rx) = watch::channel(false);

            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    tracing::info!("shutdown signal received, finishing current batch");
                    let _ = shutdown_tx.send(true);
                }
            });

            let report = driver.run_unbounded(shutdown_rx).await;
            tracing::info!(
                batches = report.batches,
                generated = report.generated,
                matched = report.matched,
                recorded = report.recorded,
                "hunt finished"
            );
        }
        Command::Derive {
            mnemonic,
            show_secrets,
        } => derive_sub_accounts(&config, chain, &mnemonic, show_secrets)?,
    }

    Ok(())
}

/// 按配置组装扫描驱动
fn build_driver(config: &Config, chain: ChainConfig) -> Result<ScanDriver> {
    let local = match &config.index.path {
        Some(path) => OfflineIndex::load(path)
            .with_context(|| format!("Failed to load offline index: {}", path))?,
        None => OfflineIndex::default(),
    };

    let remote: Option<Arc<dyn BalanceResolver>> = match config.scan.mode {
        ScanMode::Online => {
            let api_url = config
                .resolver
                .api_url
                .as_deref()
                .unwrap_or(&chain.explorer_api_url);
            let base_url =
                EtherscanResolver::balance_multi_url(api_url, config.resolver.api_key.as_deref());
            let resolver = EtherscanResolver::new(
                &base_url,
                chain.decimals,
                Duration::from_secs(config.resolver.timeout_secs),
            )?
            .with_max_addresses_per_request(config.resolver.max_addresses_per_request)
            .with_retry(config.resolver.max_retries, RESOLVER_RETRY_DELAY);
            Some(Arc::new(resolver) as Arc<dyn BalanceResolver>)
        }
        ScanMode::Offline => None,
    };

    let generator = AddressBatchGenerator::new(
        chain,
        config.scan.passphrase.clone(),
        Arc::new(OsRngMnemonicSource),
    );

    Ok(ScanDriver::new(
        ScanSettings::from_config(&config.scan),
        generator,
        Arc::new(local),
        remote,
        Arc::new(FileRecorder::new(&config.recorder.path)),
    ))
}

/// 输出已有助记词的子账户
fn derive_sub_accounts(
    config: &Config,
    chain: ChainConfig,
    mnemonic: &str,
    show_secrets: bool,
) -> Result<()> {
    let words = mnemonic.split_whitespace().count();
    let bit_strength = BitStrength::from_word_count(words)
        .with_context(|| format!("Unsupported mnemonic length: {} words", words))?;

    let generator = AddressBatchGenerator::new(
        chain,
        config.scan.passphrase.clone(),
        Arc::new(OsRngMnemonicSource),
    );
    let batch = generator.generate_sub_accounts(bit_strength, mnemonic)?;

    for record in batch.records() {
        if show_secrets {
            println!("{}", record);
        } else {
            println!("{} {}", record.derivation_path, record.address);
        }
    }

    tracing::debug!(count = SUB_ACCOUNT_COUNT, "sub-accounts derived");
    Ok(())
}
