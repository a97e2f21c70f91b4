//! 配置管理模块
//! 支持从环境变量、TOML 配置文件以及旧版 config.json / config.txt 密钥文件加载配置

use std::{collections::HashMap, path::Path, time::Duration};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::{
    domain::{
        mnemonic::GeneratorKind,
        network::{NetworkId, NetworkRegistry, NetworkSpec},
    },
    service::scanner::TerminationPolicy,
};

/// 应用配置结构体
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub scanner: ScannerConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub networks: NetworksConfig,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String, // "json" or "text"
    pub enable_file_logging: bool,
    pub log_file_path: Option<String>,
}

/// 扫描循环配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerConfig {
    /// 两轮迭代之间的等待（毫秒），用于遵守 API 速率限制
    pub inter_iteration_delay_ms: u64,
    pub termination: TerminationPolicy,
    pub generator: GeneratorKind,
    /// 所有生成过的助记词
    pub mnemonic_log_path: String,
    /// 命中记录
    pub results_path: String,
    /// 单次 HTTP 请求超时（毫秒）
    pub request_timeout_ms: u64,
}

/// 重试配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub primary_max_attempts: u32,
    pub secondary_max_attempts: u32,
    /// 固定间隔，不做指数增长
    pub backoff_ms: u64,
}

/// 单个浏览器 API 配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExplorerConfig {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub base_url: Option<String>,
}

/// 各网络浏览器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworksConfig {
    #[serde(default)]
    pub ethereum: ExplorerConfig,
    #[serde(default)]
    pub bsc: ExplorerConfig,
    #[serde(default)]
    pub polygon: ExplorerConfig,
    #[serde(default)]
    pub arbitrum: ExplorerConfig,
}

/// 启动时解析完成的端点
#[derive(Debug, Clone)]
pub struct ResolvedExplorer {
    pub base_url: String,
    pub api_key: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            format: std::env::var("LOG_FORMAT").unwrap_or_else(|_| "text".into()),
            enable_file_logging: std::env::var("LOG_FILE_ENABLED")
                .ok()
                .map(|v| v == "1")
                .unwrap_or(false),
            log_file_path: std::env::var("LOG_FILE_PATH").ok(),
        }
    }
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            inter_iteration_delay_ms: std::env::var("SCAN_DELAY_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(1000),
            termination: std::env::var("SCAN_TERMINATION")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or_default(),
            generator: std::env::var("SCAN_GENERATOR")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or_default(),
            mnemonic_log_path: std::env::var("MNEMONIC_LOG_PATH")
                .unwrap_or_else(|_| "mnemonic.txt".into()),
            results_path: std::env::var("RESULTS_PATH").unwrap_or_else(|_| "results.txt".into()),
            request_timeout_ms: std::env::var("REQUEST_TIMEOUT_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(10_000),
        }
    }
}

impl ScannerConfig {
    pub fn inter_iteration_delay(&self) -> Duration {
        Duration::from_millis(self.inter_iteration_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            primary_max_attempts: std::env::var("PRIMARY_MAX_ATTEMPTS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(3),
            secondary_max_attempts: std::env::var("SECONDARY_MAX_ATTEMPTS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(1),
            backoff_ms: std::env::var("RETRY_BACKOFF_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(1000),
        }
    }
}

impl Default for NetworksConfig {
    fn default() -> Self {
        let mut config = Self {
            ethereum: ExplorerConfig::default(),
            bsc: ExplorerConfig::default(),
            polygon: ExplorerConfig::default(),
            arbitrum: ExplorerConfig::default(),
        };
        config.fill_from_env(&NetworkRegistry::new());
        config
    }
}

impl NetworksConfig {
    pub fn get(&self, id: NetworkId) -> &ExplorerConfig {
        match id {
            NetworkId::Ethereum => &self.ethereum,
            NetworkId::Bsc => &self.bsc,
            NetworkId::Polygon => &self.polygon,
            NetworkId::Arbitrum => &self.arbitrum,
        }
    }

    pub fn get_mut(&mut self, id: NetworkId) -> &mut ExplorerConfig {
        match id {
            NetworkId::Ethereum => &mut self.ethereum,
            NetworkId::Bsc => &mut self.bsc,
            NetworkId::Polygon => &mut self.polygon,
            NetworkId::Arbitrum => &mut self.arbitrum,
        }
    }

    /// 用环境变量补齐未设置的字段（已设置的不覆盖）
    pub fn fill_from_env(&mut self, registry: &NetworkRegistry) {
        let env: HashMap<String, String> = registry
            .list_all()
            .iter()
            .flat_map(|spec| [spec.api_key_var.clone(), spec.api_url_var.clone()])
            .filter_map(|key| std::env::var(&key).ok().map(|v| (key, v)))
            .collect();
        self.fill_from_map(registry, &env);
    }

    /// 用键值表补齐未设置的字段，键名与环境变量相同 (ETHERSCAN_KEY ...)
    pub fn fill_from_map(&mut self, registry: &NetworkRegistry, map: &HashMap<String, String>) {
        for spec in registry.list_all() {
            let explorer = self.get_mut(spec.id);
            if explorer.api_key.as_deref().map_or(true, str::is_empty) {
                if let Some(key) = map.get(&spec.api_key_var).filter(|v| !v.is_empty()) {
                    explorer.api_key = Some(key.clone());
                }
            }
            if explorer.base_url.is_none() {
                if let Some(url) = map.get(&spec.api_url_var).filter(|v| !v.is_empty()) {
                    explorer.base_url = Some(url.clone());
                }
            }
        }
    }

    /// 解析端点；缺少 API key 时报错
    pub fn resolve(&self, spec: &NetworkSpec) -> Result<ResolvedExplorer> {
        let explorer = self.get(spec.id);
        let api_key = explorer
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "Missing API key for {} (set {} or networks.{}.api_key)",
                    spec.name,
                    spec.api_key_var,
                    spec.id
                )
            })?;
        let base_url = explorer
            .base_url
            .clone()
            .unwrap_or_else(|| spec.default_api_url.clone());

        Ok(ResolvedExplorer { base_url, api_key })
    }
}

impl Config {
    /// 从环境变量加载配置
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            logging: LoggingConfig::default(),
            scanner: ScannerConfig::default(),
            retry: RetryConfig::default(),
            networks: NetworksConfig::default(),
        })
    }

    /// 从 TOML 配置文件加载配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;

        let mut config: Config =
            toml::from_str(&content).with_context(|| "Failed to parse config file as TOML")?;
        config.networks.fill_from_env(&NetworkRegistry::new());

        Ok(config)
    }

    /// 从环境变量和配置文件合并加载（配置文件优先级更高）
    ///
    /// 未指定 TOML 文件时，依次尝试工作目录下的 config.json 与 config.txt。
    pub fn from_env_and_file<P: AsRef<Path>>(path: Option<P>) -> Result<Self> {
        let mut config = Self::from_env()?;

        match path {
            Some(path) if path.as_ref().exists() => {
                config = Self::from_file(path)?;
            }
            Some(path) => {
                anyhow::bail!("Config file not found: {:?}", path.as_ref());
            }
            None => {
                if let Some(keys) = load_legacy_key_file(Path::new("."))? {
                    config
                        .networks
                        .fill_from_map(&NetworkRegistry::new(), &keys);
                }
            }
        }

        Ok(config)
    }

    /// 验证配置有效性；所有网络的 API key 都是必需的
    pub fn validate(&self) -> Result<()> {
        let registry = NetworkRegistry::new();
        let missing: Vec<&str> = registry
            .list_all()
            .iter()
            .filter(|spec| self.networks.resolve(spec).is_err())
            .map(|spec| spec.api_key_var.as_str())
            .collect();
        if !missing.is_empty() {
            anyhow::bail!(
                "Please provide valid API keys (missing: {})",
                missing.join(", ")
            );
        }

        if self.retry.primary_max_attempts == 0 || self.retry.secondary_max_attempts == 0 {
            anyhow::bail!("Retry attempts must be at least 1");
        }

        // 验证日志级别
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.to_lowercase().as_str()) {
            anyhow::bail!("LOG_LEVEL must be one of: {:?}", valid_levels);
        }

        // 验证日志格式
        if self.logging.format != "json" && self.logging.format != "text" {
            anyhow::bail!("LOG_FORMAT must be 'json' or 'text'");
        }

        Ok(())
    }
}

/// 读取旧版密钥文件：config.json（扁平 JSON 对象）优先，其次 config.txt（KEY=VALUE 每行一条）
pub fn load_legacy_key_file(dir: &Path) -> Result<Option<HashMap<String, String>>> {
    let json_path = dir.join("config.json");
    if json_path.exists() {
        let content = std::fs::read_to_string(&json_path)
            .with_context(|| format!("Failed to read {:?}", json_path))?;
        let raw: HashMap<String, serde_json::Value> = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {:?} as JSON object", json_path))?;
        let keys = raw
            .into_iter()
            .filter_map(|(k, v)| match v {
                serde_json::Value::String(s) => Some((k, s)),
                serde_json::Value::Number(n) => Some((k, n.to_string())),
                _ => None,
            })
            .collect();
        return Ok(Some(keys));
    }

    let txt_path = dir.join("config.txt");
    if txt_path.exists() {
        let content = std::fs::read_to_string(&txt_path)
            .with_context(|| format!("Failed to read {:?}", txt_path))?;
        return Ok(Some(parse_key_value_lines(&content)));
    }

    Ok(None)
}

fn parse_key_value_lines(content: &str) -> HashMap<String, String> {
    content
        .lines()
        .filter_map(|line| line.split_once('='))
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .filter(|(k, v)| !k.is_empty() && !v.is_empty())
        .collect()
}
