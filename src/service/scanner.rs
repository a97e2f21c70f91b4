//! 扫描主循环
//!
//! 生成助记词 → 派生地址 → 聚合余额 → 决定继续或落盘。
//! 单轮失败（主网络重试耗尽、文件写入失败等）只记录警告并丢弃本轮，循环本身没有
//! 迭代上限也没有全局超时，唯一的正常结束条件是发现正余额。

use std::{sync::Arc, time::Duration};

use serde::{Deserialize, Serialize};

use crate::{
    config::Config,
    domain::{
        balance::IterationResult,
        derivation::{AddressDeriver, EvmAddressDeriver},
        mnemonic::{MnemonicGenerator, MnemonicGeneratorFactory},
        network::{NetworkId, NetworkRegistry},
    },
    error::{Result, ScanError},
    service::{
        balance_aggregator::BalanceAggregator,
        persister::{FileResultPersister, ResultPersister},
    },
};

/// 终止策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminationPolicy {
    /// 任一网络余额为正时落盘并停止
    #[default]
    StopOnFirstBalance,
    /// 每轮都落盘，永不停止
    RecordAndContinue,
}

impl std::str::FromStr for TerminationPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "stop_on_first_balance" | "stop" => Ok(TerminationPolicy::StopOnFirstBalance),
            "record_and_continue" | "continue" => Ok(TerminationPolicy::RecordAndContinue),
            other => Err(format!("unknown termination policy: {}", other)),
        }
    }
}

/// 单轮结果
#[derive(Debug)]
pub enum IterationOutcome {
    /// 发现正余额，已落盘，循环结束
    Found(IterationResult),
    /// 全部为零，丢弃
    Discarded(IterationResult),
    /// RecordAndContinue 策略下已落盘，继续
    Recorded(IterationResult),
    /// 本轮失败，丢弃
    Failed(ScanError),
}

impl IterationOutcome {
    pub fn is_terminal(&self) -> bool {
        matches!(self, IterationOutcome::Found(_))
    }
}

pub struct SeedScanner {
    generator: Arc<dyn MnemonicGenerator>,
    deriver: Box<dyn AddressDeriver>,
    aggregator: BalanceAggregator,
    persister: Arc<dyn ResultPersister>,
    policy: TerminationPolicy,
    delay: Duration,
    order: Vec<NetworkId>,
    iterations: u64,
    failures: u64,
}

impl SeedScanner {
    pub fn new(
        generator: Box<dyn MnemonicGenerator>,
        deriver: Box<dyn AddressDeriver>,
        aggregator: BalanceAggregator,
        persister: Arc<dyn ResultPersister>,
    ) -> Self {
        let order = aggregator.networks();
        Self {
            generator: Arc::from(generator),
            deriver,
            aggregator,
            persister,
            policy: TerminationPolicy::default(),
            delay: Duration::from_secs(1),
            order,
            iterations: 0,
            failures: 0,
        }
    }

    /// 按配置装配全部组件
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let registry = NetworkRegistry::new();
        registry
            .validate_configs()
            .map_err(|errors| anyhow::anyhow!("Invalid network registry: {}", errors.join("; ")))?;

        let aggregator = BalanceAggregator::from_config(config, &registry)?;
        let persister = Arc::new(FileResultPersister::new(
            &config.scanner.mnemonic_log_path,
            &config.scanner.results_path,
            registry.order(),
        ));

        Ok(Self::new(
            MnemonicGeneratorFactory::create(config.scanner.generator),
            Box::new(EvmAddressDeriver::new()?),
            aggregator,
            persister,
        )
        .with_policy(config.scanner.termination)
        .with_delay(config.scanner.inter_iteration_delay()))
    }

    pub fn with_policy(mut self, policy: TerminationPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn iterations(&self) -> u64 {
        self.iterations
    }

    pub fn failures(&self) -> u64 {
        self.failures
    }

    /// 运行直到发现正余额
    pub async fn run(&mut self) -> IterationResult {
        tracing::info!(
            policy = ?self.policy,
            delay_ms = self.delay.as_millis() as u64,
            networks = ?self.order,
            "Scanner started"
        );

        loop {
            if let IterationOutcome::Found(result) = self.step().await {
                tracing::info!(
                    iterations = self.iterations,
                    failures = self.failures,
                    address = %result.address,
                    "Scanner stopped: balance found"
                );
                return result;
            }

            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
        }
    }

    /// 执行一轮迭代；错误在这里截获，不会传出
    pub async fn step(&mut self) -> IterationOutcome {
        self.iterations += 1;
        let iteration = self.iterations;

        let result = match self.try_iteration().await {
            Ok(result) => result,
            Err(e) => {
                self.failures += 1;
                tracing::warn!(iteration, "Error: {}. Regenerating mnemonic...", e);
                return IterationOutcome::Failed(e);
            }
        };

        tracing::info!(
            iteration,
            address = %result.address,
            balances = %result.report.summary(&self.order),
            "Wallet checked"
        );

        match self.policy {
            TerminationPolicy::StopOnFirstBalance if result.has_positive_balance => {
                self.persist_finding(&result).await;
                IterationOutcome::Found(result)
            }
            TerminationPolicy::StopOnFirstBalance => IterationOutcome::Discarded(result),
            TerminationPolicy::RecordAndContinue => {
                if result.has_positive_balance {
                    tracing::info!(iteration, address = %result.address, "Positive balance found");
                }
                if let Err(e) = self.persister.persist(&result).await {
                    self.failures += 1;
                    tracing::warn!(iteration, "Failed to record result: {}", e);
                    return IterationOutcome::Failed(e);
                }
                IterationOutcome::Recorded(result)
            }
        }
    }

    async fn try_iteration(&self) -> Result<IterationResult> {
        // 抽词生成器的重抽循环是同步的，放到阻塞线程池执行
        let generator = Arc::clone(&self.generator);
        let phrase = tokio::task::spawn_blocking(move || generator.generate())
            .await
            .map_err(|e| ScanError::Generation(e.to_string()))?;
        self.persister.record_seed(&phrase).await?;

        let address = self.deriver.derive(&phrase)?;
        let report = self.aggregator.aggregate(&address).await?;

        Ok(IterationResult::new(phrase, address, report))
    }

    /// 命中结果写入失败时，把整条记录写进错误日志，保证不丢失
    async fn persist_finding(&self, result: &IterationResult) {
        if let Err(e) = self.persister.persist(result).await {
            tracing::error!(
                address = %result.address,
                phrase = %result.phrase,
                balances = %result.report.summary(&self.order),
                "Failed to persist finding: {}",
                e
            );
        }
    }
}
