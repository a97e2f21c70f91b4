//! Domain 模块
//!
//! 助记词、地址派生、网络与余额模型

pub mod balance;
pub mod derivation;
pub mod mnemonic;
pub mod network;

// 重新导出常用类型
pub use balance::{BalanceReport, IterationResult, NetworkBalance, QueryOutcome};
pub use derivation::{AddressDeriver, EvmAddressDeriver, WalletAddress};
pub use mnemonic::{
    EntropyMnemonicGenerator, GeneratorKind, MnemonicGenerator, SeedPhrase,
    WordSamplingGenerator,
};
pub use network::{NetworkId, NetworkRegistry, NetworkRole, NetworkSpec};
