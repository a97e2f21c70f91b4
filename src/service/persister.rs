//! 结果持久化
//!
//! 两个只追加的文本文件：
//! - 助记词日志：每个生成的助记词一行
//! - 结果文件：`<地址> || <助记词> || <余额1> || <余额2> ...`
//!
//! 每条记录先拼成完整一行，再用一次 `write_all` 追加写入。

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::{fs::OpenOptions, io::AsyncWriteExt};

use crate::{
    domain::{balance::IterationResult, mnemonic::SeedPhrase, network::NetworkId},
    error::Result,
};

#[async_trait]
pub trait ResultPersister: Send + Sync {
    /// 记录一个生成的助记词（不论是否命中）
    async fn record_seed(&self, phrase: &SeedPhrase) -> Result<()>;

    /// 追加一条迭代结果，不覆盖、不去重
    async fn persist(&self, result: &IterationResult) -> Result<()>;
}

/// 文件实现
pub struct FileResultPersister {
    mnemonic_log: PathBuf,
    results: PathBuf,
    /// 余额摘要的网络顺序
    order: Vec<NetworkId>,
}

impl FileResultPersister {
    pub fn new(
        mnemonic_log: impl Into<PathBuf>,
        results: impl Into<PathBuf>,
        order: Vec<NetworkId>,
    ) -> Self {
        Self {
            mnemonic_log: mnemonic_log.into(),
            results: results.into(),
            order,
        }
    }

    pub fn results_path(&self) -> &Path {
        &self.results
    }

    pub fn mnemonic_log_path(&self) -> &Path {
        &self.mnemonic_log
    }

    /// 结果行（不含换行符）
    pub fn format_result(&self, result: &IterationResult) -> String {
        format!(
            "{} || {} || {}",
            result.address,
            result.phrase,
            result.report.summary(&self.order)
        )
    }

    async fn append_line(path: &Path, line: &str) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut record = String::with_capacity(line.len() + 1);
        record.push_str(line);
        record.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await?;
        file.write_all(record.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }
}

#[async_trait]
impl ResultPersister for FileResultPersister {
    async fn record_seed(&self, phrase: &SeedPhrase) -> Result<()> {
        Self::append_line(&self.mnemonic_log, &phrase.to_string()).await
    }

    async fn persist(&self, result: &IterationResult) -> Result<()> {
        let line = self.format_result(result);
        Self::append_line(&self.results, &line).await?;
        tracing::info!(path = %self.results.display(), address = %result.address, "Result persisted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use tempfile::TempDir;

    use super::*;
    use crate::domain::{
        balance::{BalanceReport, NetworkBalance},
        derivation::WalletAddress,
        network::NetworkRegistry,
    };

    const VECTOR: &str = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

    fn sample_result() -> IterationResult {
        let registry = NetworkRegistry::new();
        let mut report = BalanceReport::new();
        for spec in registry.list_all() {
            let balance = match spec.id {
                NetworkId::Polygon => NetworkBalance::success(spec, Decimal::new(25, 1)),
                NetworkId::Arbitrum => NetworkBalance::failed(spec, "timeout"),
                _ => NetworkBalance::success(spec, Decimal::ZERO),
            };
            report.insert(balance);
        }
        IterationResult::new(
            SeedPhrase::parse(VECTOR).unwrap(),
            WalletAddress::from_bytes(&[0x42; 20]),
            report,
        )
    }

    fn persister(dir: &TempDir) -> FileResultPersister {
        FileResultPersister::new(
            dir.path().join("mnemonic.txt"),
            dir.path().join("out/results.txt"),
            NetworkRegistry::new().order(),
        )
    }

    #[tokio::test]
    async fn test_persist_twice_appends_two_lines() {
        let dir = TempDir::new().unwrap();
        let persister = persister(&dir);
        let result = sample_result();

        persister.persist(&result).await.unwrap();
        persister.persist(&result).await.unwrap();

        let content = std::fs::read_to_string(persister.results_path()).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], lines[1]);
        assert_eq!(
            lines[0],
            format!(
                "{} || {} || 0.0 ETH || 0.0 BNB || 2.5 MATIC || 0.0 ETH",
                result.address, VECTOR
            )
        );
    }

    #[tokio::test]
    async fn test_record_seed_appends() {
        let dir = TempDir::new().unwrap();
        let persister = persister(&dir);
        let phrase = SeedPhrase::parse(VECTOR).unwrap();

        persister.record_seed(&phrase).await.unwrap();
        persister.record_seed(&phrase).await.unwrap();

        let content = std::fs::read_to_string(persister.mnemonic_log_path()).unwrap();
        assert_eq!(content, format!("{}\n{}\n", VECTOR, VECTOR));
    }

    #[tokio::test]
    async fn test_existing_content_is_kept() {
        let dir = TempDir::new().unwrap();
        let persister = persister(&dir);
        std::fs::write(persister.mnemonic_log_path(), "earlier line\n").unwrap();

        persister
            .record_seed(&SeedPhrase::parse(VECTOR).unwrap())
            .await
            .unwrap();

        let content = std::fs::read_to_string(persister.mnemonic_log_path()).unwrap();
        assert!(content.starts_with("earlier line\n"));
        assert_eq!(content.lines().count(), 2);
    }
}
