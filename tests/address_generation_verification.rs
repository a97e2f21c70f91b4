//! 地址生成算法验证测试
//!
//! 使用公开测试向量验证派生结果与 MetaMask 等标准钱包一致

use std::collections::HashSet;

use seedprobe::domain::{
    derivation::{AddressDeriver, EvmAddressDeriver},
    mnemonic::{EntropyMnemonicGenerator, MnemonicGenerator, SeedPhrase},
};

/// 测试向量：
/// - Mnemonic: "abandon ... about"
/// - Expected address: 0x9858EfFD232B4033E47d90003D41EC34EcaEda94
#[test]
fn test_ethereum_address_bip39_vector() {
    let deriver = EvmAddressDeriver::new().unwrap();
    let phrase = SeedPhrase::parse(
        "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about",
    )
    .unwrap();

    let address = deriver.derive(&phrase).unwrap();
    assert_eq!(address.as_str(), "0x9858EfFD232B4033E47d90003D41EC34EcaEda94");
}

/// Hardhat / Anvil 默认助记词的第一个账户
#[test]
fn test_ethereum_address_hardhat_vector() {
    let deriver = EvmAddressDeriver::new().unwrap();
    let phrase =
        SeedPhrase::parse("test test test test test test test test test test test junk").unwrap();

    let address = deriver.derive(&phrase).unwrap();
    assert_eq!(address.as_str(), "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266");
}

#[test]
fn test_derivation_is_deterministic() {
    let deriver = EvmAddressDeriver::new().unwrap();
    let phrase = EntropyMnemonicGenerator::new().generate();

    let first = deriver.derive(&phrase).unwrap();
    let second = deriver.derive(&phrase).unwrap();
    assert_eq!(first, second);

    // 0x + 40 位十六进制
    assert!(first.as_str().starts_with("0x"));
    assert_eq!(first.as_str().len(), 42);
    assert!(first.as_str()[2..].chars().all(|c| c.is_ascii_hexdigit()));
}

#[test]
fn test_generated_phrases_are_distinct() {
    let generator = EntropyMnemonicGenerator::new();
    let deriver = EvmAddressDeriver::new().unwrap();

    let addresses: HashSet<String> = (0..20)
        .map(|_| {
            let phrase = generator.generate();
            assert!(matches!(phrase.word_count(), 12 | 24));
            deriver.derive(&phrase).unwrap().to_string()
        })
        .collect();

    assert_eq!(addresses.len(), 20);
}

#[test]
fn test_other_account_path_gives_other_address() {
    let phrase = SeedPhrase::parse(
        "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about",
    )
    .unwrap();
    let default = EvmAddressDeriver::new().unwrap().derive(&phrase).unwrap();
    let second = EvmAddressDeriver::with_path("m/44'/60'/0'/0/1")
        .unwrap()
        .derive(&phrase)
        .unwrap();

    assert_ne!(default, second);
}
