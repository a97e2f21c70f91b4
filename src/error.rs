//! 错误类型
//!
//! 单次查询的失败用 `QueryError` 表示，扫描循环层面的失败用 `ScanError` 表示。

use thiserror::Error;

use crate::domain::network::NetworkId;

/// 单次浏览器 API 请求失败
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum QueryError {
    /// 网络或 HTTP 层失败（连接错误、超时、非 2xx 状态码）
    #[error("transport error: {0}")]
    Transport(String),

    /// 响应结构不符合预期（缺少 result 字段、非数字余额）
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

/// 扫描错误
#[derive(Debug, Error)]
pub enum ScanError {
    /// 助记词校验和不匹配（生成器保证不会出现，仅作防御）
    #[error("invalid seed phrase: {0}")]
    InvalidSeed(String),

    /// 主网络重试耗尽
    #[error("{network} balance query failed after {attempts} attempt(s): {last_error}")]
    QueryExhausted {
        network: NetworkId,
        attempts: u32,
        #[source]
        last_error: QueryError,
    },

    /// 结果文件写入失败
    #[error("failed to persist result: {0}")]
    Persist(#[from] std::io::Error),

    /// 生成任务异常退出
    #[error("mnemonic generation failed: {0}")]
    Generation(String),

    /// 地址派生失败（非校验和原因）
    #[error("address derivation failed: {0}")]
    Derivation(String),
}

impl From<bip39::Error> for ScanError {
    fn from(err: bip39::Error) -> Self {
        ScanError::InvalidSeed(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ScanError>;

pub type QueryResult<T> = std::result::Result<T, QueryError>;
