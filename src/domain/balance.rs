//! 余额模型

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::{
    derivation::WalletAddress,
    mnemonic::SeedPhrase,
    network::{NetworkId, NetworkSpec},
};

/// 查询结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "reason", rename_all = "lowercase")]
pub enum QueryOutcome {
    Success,
    Failure(String),
}

/// 单个网络的余额
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkBalance {
    pub network: NetworkId,
    /// 原生币符号
    pub symbol: String,
    /// 显示单位余额
    pub balance: Decimal,
    pub outcome: QueryOutcome,
}

impl NetworkBalance {
    pub fn success(spec: &NetworkSpec, balance: Decimal) -> Self {
        Self {
            network: spec.id,
            symbol: spec.symbol.clone(),
            balance,
            outcome: QueryOutcome::Success,
        }
    }

    /// 失败条目余额记为 0
    pub fn failed(spec: &NetworkSpec, reason: impl Into<String>) -> Self {
        Self {
            network: spec.id,
            symbol: spec.symbol.clone(),
            balance: Decimal::ZERO,
            outcome: QueryOutcome::Failure(reason.into()),
        }
    }

    pub fn is_positive(&self) -> bool {
        self.balance > Decimal::ZERO
    }

    pub fn is_failure(&self) -> bool {
        matches!(self.outcome, QueryOutcome::Failure(_))
    }

    /// `<数量> <符号>`，例如 `5.0 BNB`
    pub fn display(&self) -> String {
        format!("{} {}", format_decimal(self.balance), self.symbol)
    }
}

/// 一个地址在所有网络上的余额，每个网络恰好一条
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BalanceReport {
    entries: BTreeMap<NetworkId, NetworkBalance>,
}

impl BalanceReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, balance: NetworkBalance) {
        self.entries.insert(balance.network, balance);
    }

    pub fn get(&self, network: NetworkId) -> Option<&NetworkBalance> {
        self.entries.get(&network)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &NetworkBalance> {
        self.entries.values()
    }

    pub fn has_positive_balance(&self) -> bool {
        self.entries.values().any(NetworkBalance::is_positive)
    }

    /// 按给定网络顺序生成 ` || ` 分隔的余额摘要
    pub fn summary(&self, order: &[NetworkId]) -> String {
        order
            .iter()
            .filter_map(|id| self.entries.get(id))
            .map(NetworkBalance::display)
            .collect::<Vec<_>>()
            .join(" || ")
    }
}

/// 单轮迭代结果
#[derive(Debug, Clone)]
pub struct IterationResult {
    pub phrase: SeedPhrase,
    pub address: WalletAddress,
    pub report: BalanceReport,
    pub has_positive_balance: bool,
}

impl IterationResult {
    pub fn new(phrase: SeedPhrase, address: WalletAddress, report: BalanceReport) -> Self {
        let has_positive_balance = report.has_positive_balance();
        Self {
            phrase,
            address,
            report,
            has_positive_balance,
        }
    }
}

/// 最小单位整数 → 显示单位
///
/// 超出 `Decimal` 96 位尾数范围时返回 None。
pub fn format_units(raw: u128, decimals: u32) -> Option<Decimal> {
    let raw = i128::try_from(raw).ok()?;
    Decimal::try_from_i128_with_scale(raw, decimals)
        .ok()
        .map(|d| d.normalize())
}

/// 与 ethers `formatEther` 一致：整数也保留一位小数 (`1.0`、`0.0`)
pub fn format_decimal(value: Decimal) -> String {
    let value = value.normalize();
    if value.scale() == 0 {
        format!("{}.0", value)
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;
    use crate::domain::network::NetworkRegistry;

    #[test]
    fn test_one_ether() {
        let value = format_units(1_000_000_000_000_000_000, 18).unwrap();
        assert_eq!(value, Decimal::ONE);
        assert_eq!(format_decimal(value), "1.0");
    }

    #[test]
    fn test_fractional_and_zero() {
        assert_eq!(
            format_decimal(format_units(1_500_000_000_000_000_000, 18).unwrap()),
            "1.5"
        );
        assert_eq!(format_decimal(format_units(1, 18).unwrap()), "0.000000000000000001");
        assert_eq!(format_decimal(format_units(0, 18).unwrap()), "0.0");
    }

    #[test]
    fn test_out_of_range_value() {
        assert!(format_units(u128::MAX, 18).is_none());
    }

    #[test]
    fn test_report_positive_and_summary() {
        let registry = NetworkRegistry::new();
        let mut report = BalanceReport::new();
        for spec in registry.list_all() {
            let balance = if spec.id == NetworkId::Bsc {
                Decimal::from_str("5").unwrap()
            } else {
                Decimal::ZERO
            };
            report.insert(NetworkBalance::success(spec, balance));
        }

        assert_eq!(report.len(), 4);
        assert!(report.has_positive_balance());
        assert_eq!(
            report.summary(&registry.order()),
            "0.0 ETH || 5.0 BNB || 0.0 MATIC || 0.0 ETH"
        );
    }

    #[test]
    fn test_failed_entry_is_zero() {
        let registry = NetworkRegistry::new();
        let polygon = registry.get(NetworkId::Polygon).unwrap();
        let entry = NetworkBalance::failed(polygon, "timeout");

        assert!(entry.is_failure());
        assert!(!entry.is_positive());
        assert_eq!(entry.display(), "0.0 MATIC");
    }
}
