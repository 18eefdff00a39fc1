//! 命中结果记录
//!
//! 只追加；写入失败向上返回，由扫描驱动记录日志后继续

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::error::{Result, ScanError};

#[async_trait]
pub trait Recorder: Send + Sync {
    /// 记录一条可读的序列化结果
    async fn record(&self, line: &str) -> Result<()>;
}

/// 追加写入文件，每行带 RFC 3339 时间戳
pub struct FileRecorder {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileRecorder {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl Recorder for FileRecorder {
    async fn record(&self, line: &str) -> Result<()> {
        let _guard = self.lock.lock().await;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| ScanError::Recorder(format!("open {:?}: {}", self.path, e)))?;

        let entry = format!("{} {}\n", chrono::Utc::now().to_rfc3339(), line);
        file.write_all(entry.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }
}

/// 内存记录器，用于测试
#[derive(Debug, Default)]
pub struct MemoryRecorder {
    lines: std::sync::Mutex<Vec<String>>,
}

impl MemoryRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines
            .lock()
            .map(|lines| lines.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl Recorder for MemoryRecorder {
    async fn record(&self, line: &str) -> Result<()> {
        self.lines
            .lock()
            .map_err(|_| ScanError::Recorder("memory recorder poisoned".to_string()))?
            .push(line.to_string());
        Ok(())
    }
}
