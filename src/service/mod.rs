pub mod balance_resolver;
pub mod batch_generator;
pub mod etherscan_client; // 远程 balancemulti 查询
pub mod offline_index;
pub mod recorder;
pub mod scan_driver;

pub use balance_resolver::{BalanceResolver, Resolution, ResolverKind};
pub use batch_generator::{AddressBatchGenerator, SUB_ACCOUNT_COUNT};
pub use etherscan_client::EtherscanResolver;
pub use offline_index::OfflineIndex;
pub use recorder::{FileRecorder, MemoryRecorder, Recorder};
pub use scan_driver::{ScanDriver, ScanReport, ScanSettings, ScanState};
