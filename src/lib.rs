//! seedprobe - 多链助记词余额探测
//!
//! 随机生成 BIP39 助记词，派生 EVM 地址，并发查询多个浏览器 API 的原生币余额，
//! 直到发现正余额为止。

pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod service;

// 重新导出常用类型
pub use error::{QueryError, ScanError};
