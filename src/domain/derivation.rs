//! 地址派生
//!
//! 助记词 → BIP39 种子 → BIP32 (m/44'/60'/0'/0/0) → secp256k1 公钥 → Keccak256 → EIP-55 地址

use std::fmt;

use coins_bip32::path::DerivationPath;

use crate::{
    domain::mnemonic::SeedPhrase,
    error::{Result, ScanError},
};

/// 默认派生路径（EVM 第一个外部地址）
pub const DEFAULT_DERIVATION_PATH: &str = "m/44'/60'/0'/0/0";

/// EVM 钱包地址（EIP-55 大小写校验格式）
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WalletAddress(String);

impl WalletAddress {
    /// 从 20 字节地址构造
    pub fn from_bytes(bytes: &[u8; 20]) -> Self {
        Self(to_checksum_address(bytes))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WalletAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for WalletAddress {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// 地址派生能力
pub trait AddressDeriver: Send + Sync {
    /// 确定性纯函数：同一助记词总是得到同一地址
    fn derive(&self, phrase: &SeedPhrase) -> Result<WalletAddress>;
}

/// secp256k1 / EVM 派生
pub struct EvmAddressDeriver {
    path: DerivationPath,
}

impl EvmAddressDeriver {
    pub fn new() -> Result<Self> {
        Self::with_path(DEFAULT_DERIVATION_PATH)
    }

    pub fn with_path(path: &str) -> Result<Self> {
        let path = path
            .parse::<DerivationPath>()
            .map_err(|e| ScanError::Derivation(format!("invalid derivation path {}: {}", path, e)))?;
        Ok(Self { path })
    }

    fn derive_from_seed(&self, seed: &[u8]) -> Result<WalletAddress> {
        use coins_bip32::prelude::*;
        use k256::ecdsa::SigningKey;
        use sha3::{Digest, Keccak256};

        let master_key = XPriv::root_from_seed(seed, None)
            .map_err(|e| ScanError::Derivation(format!("master key: {}", e)))?;

        let derived_key = master_key
            .derive_path(&self.path)
            .map_err(|e| ScanError::Derivation(format!("child key: {}", e)))?;

        // XPriv 实现 AsRef<SigningKey>
        let signing_key: &SigningKey = derived_key.as_ref();
        let public_key = signing_key.verifying_key().to_encoded_point(false); // 未压缩格式
        let public_key_slice = &public_key.as_bytes()[1..]; // 去掉 0x04 前缀

        let hash = Keccak256::digest(public_key_slice);
        let mut address = [0u8; 20];
        address.copy_from_slice(&hash[12..]); // 取后 20 字节

        Ok(WalletAddress::from_bytes(&address))
    }
}

impl AddressDeriver for EvmAddressDeriver {
    fn derive(&self, phrase: &SeedPhrase) -> Result<WalletAddress> {
        // SeedPhrase 构造时已校验；这里再校验一次文本
        SeedPhrase::parse(&phrase.to_string())?;
        self.derive_from_seed(&phrase.to_seed())
    }
}

/// EIP-55: 对小写十六进制地址做 Keccak256，哈希半字节 >= 8 的字母位大写
pub fn to_checksum_address(bytes: &[u8; 20]) -> String {
    use sha3::{Digest, Keccak256};

    let lower = hex::encode(bytes);
    let hash = Keccak256::digest(lower.as_bytes());

    let mut out = String::with_capacity(42);
    out.push_str("0x");
    for (i, c) in lower.chars().enumerate() {
        let nibble = if i % 2 == 0 {
            hash[i / 2] >> 4
        } else {
            hash[i / 2] & 0x0f
        };
        if c.is_ascii_alphabetic() && nibble >= 8 {
            out.push(c.to_ascii_uppercase());
        } else {
            out.push(c);
        }
    }
    out
}
