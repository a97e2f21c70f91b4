//! 测试辅助模块
//! 为每个网络启动一个模拟浏览器 API，并生成指向它们的配置

#![allow(dead_code)]

use std::path::Path;

use seedprobe::{
    config::{Config, ExplorerConfig, LoggingConfig, NetworksConfig, RetryConfig, ScannerConfig},
    domain::{mnemonic::GeneratorKind, network::NetworkId},
    service::TerminationPolicy,
};
use wiremock::{
    matchers::{method, path, query_param},
    Mock, MockServer, ResponseTemplate,
};

pub const VECTOR_MNEMONIC: &str = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";
pub const VECTOR_ADDRESS: &str = "0x9858EfFD232B4033E47d90003D41EC34EcaEda94";

/// 每个网络一个模拟服务器
pub struct Explorers {
    pub ethereum: MockServer,
    pub bsc: MockServer,
    pub polygon: MockServer,
    pub arbitrum: MockServer,
}

impl Explorers {
    pub async fn start() -> Self {
        Self {
            ethereum: MockServer::start().await,
            bsc: MockServer::start().await,
            polygon: MockServer::start().await,
            arbitrum: MockServer::start().await,
        }
    }

    pub fn server(&self, id: NetworkId) -> &MockServer {
        match id {
            NetworkId::Ethereum => &self.ethereum,
            NetworkId::Bsc => &self.bsc,
            NetworkId::Polygon => &self.polygon,
            NetworkId::Arbitrum => &self.arbitrum,
        }
    }

    /// 除 `except` 外的网络都返回同一余额
    pub async fn mount_others(&self, except: NetworkId, raw: &str) {
        for id in NetworkId::ALL {
            if id != except {
                mount_balance(self.server(id), raw).await;
            }
        }
    }

    pub async fn mount_all(&self, raw: &str) {
        for id in NetworkId::ALL {
            mount_balance(self.server(id), raw).await;
        }
    }
}

pub fn api_key(id: NetworkId) -> String {
    format!("{}-key", id)
}

pub fn balance_body(raw: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(serde_json::json!({
        "status": "1",
        "message": "OK",
        "result": raw,
    }))
}

pub async fn mount_balance(server: &MockServer, raw: &str) {
    Mock::given(method("GET"))
        .and(path("/api"))
        .and(query_param("module", "account"))
        .and(query_param("action", "balance"))
        .respond_with(balance_body(raw))
        .mount(server)
        .await;
}

pub async fn mount_status(server: &MockServer, status: u16) {
    Mock::given(method("GET"))
        .and(path("/api"))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}

pub fn explorer_config(server: &MockServer, id: NetworkId) -> ExplorerConfig {
    ExplorerConfig {
        api_key: Some(api_key(id)),
        base_url: Some(format!("{}/api", server.uri())),
    }
}

/// 指向模拟服务器、没有迭代间隔和重试间隔的配置
pub fn test_config(explorers: &Explorers, dir: &Path) -> Config {
    Config {
        logging: LoggingConfig {
            level: "debug".to_string(),
            format: "text".to_string(),
            enable_file_logging: false,
            log_file_path: None,
        },
        scanner: ScannerConfig {
            inter_iteration_delay_ms: 0,
            termination: TerminationPolicy::StopOnFirstBalance,
            generator: GeneratorKind::Entropy,
            mnemonic_log_path: dir.join("mnemonic.txt").to_string_lossy().into_owned(),
            results_path: dir.join("results.txt").to_string_lossy().into_owned(),
            request_timeout_ms: 2_000,
        },
        retry: RetryConfig {
            primary_max_attempts: 3,
            secondary_max_attempts: 1,
            backoff_ms: 0,
        },
        networks: NetworksConfig {
            ethereum: explorer_config(&explorers.ethereum, NetworkId::Ethereum),
            bsc: explorer_config(&explorers.bsc, NetworkId::Bsc),
            polygon: explorer_config(&explorers.polygon, NetworkId::Polygon),
            arbitrum: explorer_config(&explorers.arbitrum, NetworkId::Arbitrum),
        },
    }
}
