//! 浏览器 API 余额查询客户端
//!
//! `BalanceSource` 负责一次 HTTP 请求；`BalanceQueryClient` 在其之上实现
//! 固定间隔的有限重试，以及主/次网络不同的失败处理：
//! - 主网络重试耗尽 → `ScanError::QueryExhausted`
//! - 次网络重试耗尽 → 零余额失败条目，不报错

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use serde::Deserialize;

use crate::{
    config::ResolvedExplorer,
    domain::{
        balance::{format_units, NetworkBalance},
        derivation::WalletAddress,
        network::{NetworkRole, NetworkSpec},
    },
    error::{QueryError, QueryResult, Result, ScanError},
};

/// 单次余额请求，返回最小单位的整数余额
#[async_trait]
pub trait BalanceSource: Send + Sync {
    async fn fetch_raw_balance(&self, address: &WalletAddress) -> QueryResult<u128>;
}

/// Etherscan 系 API 响应 `{"status":"1","message":"OK","result":"123"}`
#[derive(Debug, Deserialize)]
struct ExplorerResponse {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    result: Option<serde_json::Value>,
}

/// Etherscan / BscScan / PolygonScan / Arbiscan 通用实现
pub struct EtherscanSource {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl EtherscanSource {
    /// 复用已有的 HTTP 客户端（连接池在各网络间共享）
    pub fn with_client(client: reqwest::Client, explorer: ResolvedExplorer) -> Self {
        Self {
            client,
            base_url: explorer.base_url,
            api_key: explorer.api_key,
        }
    }
}

#[async_trait]
impl BalanceSource for EtherscanSource {
    async fn fetch_raw_balance(&self, address: &WalletAddress) -> QueryResult<u128> {
        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("module", "account"),
                ("action", "balance"),
                ("address", address.as_str()),
                ("tag", "latest"),
                ("apikey", self.api_key.as_str()),
            ])
            .send()
            .await
            .map_err(|e| QueryError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(QueryError::Transport(format!("HTTP status {}", status)));
        }

        let body: ExplorerResponse = response
            .json()
            .await
            .map_err(|e| QueryError::MalformedResponse(e.to_string()))?;

        parse_raw_balance(body)
    }
}

fn parse_raw_balance(body: ExplorerResponse) -> QueryResult<u128> {
    let result = body.result.ok_or_else(|| {
        QueryError::MalformedResponse(format!(
            "missing result field (message: {})",
            body.message.as_deref().unwrap_or("-")
        ))
    })?;

    // result 通常是十进制字符串；出错时是错误描述（如 "Invalid API Key"）
    let text = match &result {
        serde_json::Value::String(s) => s.trim().to_string(),
        serde_json::Value::Number(n) => n.to_string(),
        other => {
            return Err(QueryError::MalformedResponse(format!(
                "unexpected result type: {}",
                other
            )))
        }
    };

    text.parse::<u128>()
        .map_err(|_| QueryError::MalformedResponse(format!("non-numeric balance: {}", text)))
}

/// 重试策略：固定次数、固定间隔
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff,
        }
    }

    /// 最坏情况下一次查询占用的时间上界
    pub fn worst_case(&self, request_timeout: Duration) -> Duration {
        request_timeout * self.max_attempts + self.backoff * (self.max_attempts - 1)
    }
}

/// 单个网络的余额查询客户端
pub struct BalanceQueryClient {
    spec: NetworkSpec,
    source: Arc<dyn BalanceSource>,
    retry: RetryPolicy,
}

impl BalanceQueryClient {
    pub fn new(spec: NetworkSpec, source: Arc<dyn BalanceSource>, retry: RetryPolicy) -> Self {
        Self {
            spec,
            source,
            retry,
        }
    }

    pub fn spec(&self) -> &NetworkSpec {
        &self.spec
    }

    /// 查询余额
    ///
    /// 次网络的失败在这里吞掉并转为零余额条目；主网络失败向上传播。
    pub async fn query_balance(&self, address: &WalletAddress) -> Result<NetworkBalance> {
        match self.query_with_retry(address).await {
            Ok(balance) => Ok(balance),
            Err((attempts, last_error)) => match self.spec.role {
                NetworkRole::Primary => Err(ScanError::QueryExhausted {
                    network: self.spec.id,
                    attempts,
                    last_error,
                }),
                NetworkRole::Secondary => {
                    tracing::warn!(
                        network = %self.spec.id,
                        attempts,
                        address = %address,
                        "Balance unknown, treating as zero: {}",
                        last_error
                    );
                    Ok(NetworkBalance::failed(&self.spec, last_error.to_string()))
                }
            },
        }
    }

    async fn query_with_retry(
        &self,
        address: &WalletAddress,
    ) -> std::result::Result<NetworkBalance, (u32, QueryError)> {
        let mut attempt = 0u32;
        loop {
            attempt += 1;

            let outcome = self
                .source
                .fetch_raw_balance(address)
                .await
                .and_then(|raw| {
                    format_units(raw, self.spec.decimals).ok_or_else(|| {
                        QueryError::MalformedResponse(format!("balance out of range: {}", raw))
                    })
                });

            match outcome {
                Ok(balance) => return Ok(NetworkBalance::success(&self.spec, balance)),
                Err(e) => {
                    tracing::warn!(
                        network = %self.spec.id,
                        attempt,
                        max_attempts = self.retry.max_attempts,
                        "Error retrieving balance: {}",
                        e
                    );
                    if attempt >= self.retry.max_attempts {
                        return Err((attempt, e));
                    }
                }
            }

            tokio::time::sleep(self.retry.backoff).await;
        }
    }
}
