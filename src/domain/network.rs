//! 网络配置模块
//!
//! 定义扫描覆盖的 EVM 网络及其浏览器 API 端点。网络按固定顺序注册，
//! 该顺序同时决定结果文件中余额摘要的排列顺序。

use std::fmt;

use serde::{Deserialize, Serialize};

/// 网络标识
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkId {
    Ethereum,
    Bsc,
    Polygon,
    Arbitrum,
}

impl NetworkId {
    pub const ALL: [NetworkId; 4] = [
        NetworkId::Ethereum,
        NetworkId::Bsc,
        NetworkId::Polygon,
        NetworkId::Arbitrum,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            NetworkId::Ethereum => "ethereum",
            NetworkId::Bsc => "bsc",
            NetworkId::Polygon => "polygon",
            NetworkId::Arbitrum => "arbitrum",
        }
    }
}

impl fmt::Display for NetworkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 网络在扫描循环中的角色
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkRole {
    /// 主网络：查询失败会中止本轮迭代
    Primary,
    /// 次网络：查询失败降级为零余额
    Secondary,
}

/// 网络描述
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkSpec {
    pub id: NetworkId,
    /// 显示名称
    pub name: String,
    /// 原生币符号 (ETH, BNB, MATIC)
    pub symbol: String,
    /// 原生币精度（最小单位到显示单位的十进制指数）
    pub decimals: u32,
    pub role: NetworkRole,
    /// 浏览器 API 默认地址
    pub default_api_url: String,
    /// API key 对应的环境变量/配置键
    pub api_key_var: String,
    /// API 地址覆盖对应的环境变量
    pub api_url_var: String,
}

impl NetworkSpec {
    pub fn is_primary(&self) -> bool {
        self.role == NetworkRole::Primary
    }
}

/// 网络注册表
pub struct NetworkRegistry {
    networks: Vec<NetworkSpec>,
}

impl NetworkRegistry {
    /// 创建预配置的注册表（Ethereum 为主网络）
    pub fn new() -> Self {
        let mut registry = Self {
            networks: Vec::new(),
        };

        registry.register_default_networks();
        registry
    }

    fn register_default_networks(&mut self) {
        self.register(NetworkSpec {
            id: NetworkId::Ethereum,
            name: "Ethereum".to_string(),
            symbol: "ETH".to_string(),
            decimals: 18,
            role: NetworkRole::Primary,
            default_api_url: "https://api.etherscan.io/api".to_string(),
            api_key_var: "ETHERSCAN_KEY".to_string(),
            api_url_var: "ETHERSCAN_API_URL".to_string(),
        });

        self.register(NetworkSpec {
            id: NetworkId::Bsc,
            name: "BNB Smart Chain".to_string(),
            symbol: "BNB".to_string(),
            decimals: 18,
            role: NetworkRole::Secondary,
            default_api_url: "https://api.bscscan.com/api".to_string(),
            api_key_var: "BSCSCAN_KEY".to_string(),
            api_url_var: "BSCSCAN_API_URL".to_string(),
        });

        self.register(NetworkSpec {
            id: NetworkId::Polygon,
            name: "Polygon".to_string(),
            symbol: "MATIC".to_string(),
            decimals: 18,
            role: NetworkRole::Secondary,
            default_api_url: "https://api.polygonscan.com/api".to_string(),
            api_key_var: "POLYGONSCAN_KEY".to_string(),
            api_url_var: "POLYGONSCAN_API_URL".to_string(),
        });

        // Arbitrum 原生币同样是 ETH
        self.register(NetworkSpec {
            id: NetworkId::Arbitrum,
            name: "Arbitrum One".to_string(),
            symbol: "ETH".to_string(),
            decimals: 18,
            role: NetworkRole::Secondary,
            default_api_url: "https://api.arbiscan.io/api".to_string(),
            api_key_var: "ARBISCAN_KEY".to_string(),
            api_url_var: "ARBISCAN_API_URL".to_string(),
        });
    }

    /// 注册网络；同一 id 重复注册时覆盖原有配置并保留位置
    pub fn register(&mut self, spec: NetworkSpec) {
        match self.networks.iter_mut().find(|n| n.id == spec.id) {
            Some(existing) => *existing = spec,
            None => self.networks.push(spec),
        }
    }

    pub fn get(&self, id: NetworkId) -> Option<&NetworkSpec> {
        self.networks.iter().find(|n| n.id == id)
    }

    /// 按注册顺序列出所有网络
    pub fn list_all(&self) -> &[NetworkSpec] {
        &self.networks
    }

    /// 网络 id 的固定顺序
    pub fn order(&self) -> Vec<NetworkId> {
        self.networks.iter().map(|n| n.id).collect()
    }

    /// 验证注册表完整性：恰好一个主网络，符号与 URL 非空
    pub fn validate_configs(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        let primaries = self.networks.iter().filter(|n| n.is_primary()).count();
        if primaries != 1 {
            errors.push(format!("expected exactly one primary network, found {}", primaries));
        }

        for spec in &self.networks {
            if spec.symbol.is_empty() {
                errors.push(format!("Network {} has empty symbol", spec.id));
            }
            if spec.default_api_url.is_empty() {
                errors.push(format!("Network {} has empty default_api_url", spec.id));
            }
            if spec.decimals > 28 {
                errors.push(format!(
                    "Network {} has unsupported decimals: {}",
                    spec.id, spec.decimals
                ));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

impl Default for NetworkRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_registry() {
        let registry = NetworkRegistry::new();

        let eth = registry.get(NetworkId::Ethereum).unwrap();
        assert_eq!(eth.symbol, "ETH");
        assert!(eth.is_primary());

        let bsc = registry.get(NetworkId::Bsc).unwrap();
        assert_eq!(bsc.symbol, "BNB");
        assert_eq!(bsc.role, NetworkRole::Secondary);

        let secondaries = registry.list_all().iter().filter(|n| !n.is_primary()).count();
        assert_eq!(secondaries, 3);
        assert!(registry.validate_configs().is_ok());
    }

    #[test]
    fn test_fixed_order() {
        let registry = NetworkRegistry::new();
        assert_eq!(registry.order(), NetworkId::ALL.to_vec());
    }

    #[test]
    fn test_all_networks_use_eighteen_decimals() {
        let registry = NetworkRegistry::new();
        assert!(registry.list_all().iter().all(|n| n.decimals == 18));
    }

    #[test]
    fn test_register_replaces_in_place() {
        let mut registry = NetworkRegistry::new();
        let mut polygon = registry.get(NetworkId::Polygon).unwrap().clone();
        polygon.symbol = "POL".to_string();
        registry.register(polygon);

        assert_eq!(registry.list_all().len(), 4);
        assert_eq!(registry.order()[2], NetworkId::Polygon);
        assert_eq!(registry.get(NetworkId::Polygon).unwrap().symbol, "POL");
    }

    #[test]
    fn test_two_primaries_rejected() {
        let mut registry = NetworkRegistry::new();
        let mut bsc = registry.get(NetworkId::Bsc).unwrap().clone();
        bsc.role = NetworkRole::Primary;
        registry.register(bsc);

        assert!(registry.validate_configs().is_err());
    }
}
