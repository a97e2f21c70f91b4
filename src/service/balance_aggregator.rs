//! 多网络余额聚合
//!
//! 同一地址在所有网络上的查询并发执行，等待全部结束后再汇总；
//! 主网络失败在汇总后向上传播，次网络失败已在客户端降级为零余额。

use std::sync::Arc;

use crate::{
    config::Config,
    domain::{
        balance::BalanceReport,
        derivation::WalletAddress,
        network::{NetworkId, NetworkRegistry},
    },
    error::{Result, ScanError},
    service::explorer_client::{BalanceQueryClient, EtherscanSource, RetryPolicy},
};

pub struct BalanceAggregator {
    clients: Vec<BalanceQueryClient>,
}

impl BalanceAggregator {
    pub fn new(clients: Vec<BalanceQueryClient>) -> Self {
        Self { clients }
    }

    /// 按配置为注册表中每个网络创建 Etherscan 客户端，共享一个 HTTP 连接池
    pub fn from_config(config: &Config, registry: &NetworkRegistry) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.scanner.request_timeout())
            .build()?;
        let backoff = std::time::Duration::from_millis(config.retry.backoff_ms);

        let mut clients = Vec::with_capacity(registry.list_all().len());
        for spec in registry.list_all() {
            let explorer = config.networks.resolve(spec)?;
            let attempts = if spec.is_primary() {
                config.retry.primary_max_attempts
            } else {
                config.retry.secondary_max_attempts
            };
            let retry = RetryPolicy::new(attempts, backoff);

            tracing::debug!(
                network = %spec.id,
                base_url = %explorer.base_url,
                attempts,
                deadline_ms = retry.worst_case(config.scanner.request_timeout()).as_millis() as u64,
                "Configured balance client"
            );

            let source = Arc::new(EtherscanSource::with_client(http.clone(), explorer));
            clients.push(BalanceQueryClient::new(spec.clone(), source, retry));
        }

        Ok(Self::new(clients))
    }

    pub fn networks(&self) -> Vec<NetworkId> {
        self.clients.iter().map(|c| c.spec().id).collect()
    }

    /// 聚合余额：每个网络恰好一条记录
    pub async fn aggregate(&self, address: &WalletAddress) -> Result<BalanceReport> {
        let outcomes = futures::future::join_all(
            self.clients
                .iter()
                .map(|client| client.query_balance(address)),
        )
        .await;

        let mut report = BalanceReport::new();
        let mut primary_error: Option<ScanError> = None;

        for (client, outcome) in self.clients.iter().zip(outcomes) {
            match outcome {
                Ok(balance) => report.insert(balance),
                // 只有主网络会返回 Err；保留第一个错误
                Err(e) => {
                    tracing::debug!(network = %client.spec().id, "Load-bearing query failed");
                    primary_error.get_or_insert(e);
                }
            }
        }

        match primary_error {
            Some(e) => Err(e),
            None => Ok(report),
        }
    }
}
