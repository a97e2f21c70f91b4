//! 助记词生成
//!
//! 两种生成方式：
//! - `EntropyMnemonicGenerator`：先取熵再计算校验和，一次必然有效
//! - `WordSamplingGenerator`：从词表随机抽词，校验失败则重抽

use std::fmt;

use bip39::{Language, Mnemonic};
use rand::{seq::SliceRandom, Rng, RngCore};
use serde::{Deserialize, Serialize};

use crate::error::{Result, ScanError};

/// 助记词长度
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WordCount {
    Twelve,
    TwentyFour,
}

impl WordCount {
    /// 无偏抛硬币选择 12 或 24
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        if rng.gen_bool(0.5) {
            WordCount::Twelve
        } else {
            WordCount::TwentyFour
        }
    }

    pub fn words(self) -> usize {
        match self {
            WordCount::Twelve => 12,
            WordCount::TwentyFour => 24,
        }
    }

    /// 对应的熵字节数 (128 / 256 bit)
    pub fn entropy_bytes(self) -> usize {
        match self {
            WordCount::Twelve => 16,
            WordCount::TwentyFour => 32,
        }
    }
}

/// 已通过 BIP39 校验的助记词，构造后不可变
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedPhrase(Mnemonic);

impl SeedPhrase {
    /// 解析并校验助记词（英文词表）
    pub fn parse(phrase: &str) -> Result<Self> {
        let mnemonic = Mnemonic::parse_in(Language::English, phrase)?;
        match mnemonic.word_count() {
            12 | 24 => Ok(Self(mnemonic)),
            n => Err(ScanError::InvalidSeed(format!(
                "unsupported word count: {}",
                n
            ))),
        }
    }

    pub fn word_count(&self) -> usize {
        self.0.word_count()
    }

    /// BIP39 种子（空密码）
    pub fn to_seed(&self) -> [u8; 64] {
        self.0.to_seed("")
    }
}

impl fmt::Display for SeedPhrase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// 助记词生成器
///
/// `generate` 对调用方不会失败：实现内部重试直到得到有效助记词。
pub trait MnemonicGenerator: Send + Sync {
    fn generate(&self) -> SeedPhrase;
}

/// 熵优先生成器
#[derive(Debug, Default, Clone)]
pub struct EntropyMnemonicGenerator;

impl EntropyMnemonicGenerator {
    pub fn new() -> Self {
        Self
    }

    pub fn generate_with<R: RngCore + ?Sized>(&self, rng: &mut R) -> SeedPhrase {
        loop {
            let word_count = WordCount::random(rng);
            let mut entropy = [0u8; 32];
            let entropy = &mut entropy[..word_count.entropy_bytes()];
            rng.fill_bytes(entropy);

            match Mnemonic::from_entropy(entropy) {
                Ok(mnemonic) => return SeedPhrase(mnemonic),
                Err(e) => tracing::warn!("Entropy rejected by bip39 encoder: {}", e),
            }
        }
    }
}

impl MnemonicGenerator for EntropyMnemonicGenerator {
    fn generate(&self) -> SeedPhrase {
        self.generate_with(&mut rand::thread_rng())
    }
}

/// 词表来源
pub trait WordSource: Send + Sync {
    fn word_list(&self) -> &[&'static str];
}

/// BIP39 英文词表 (2048 词)
#[derive(Debug, Default, Clone, Copy)]
pub struct Bip39EnglishWords;

impl WordSource for Bip39EnglishWords {
    fn word_list(&self) -> &[&'static str] {
        Language::English.word_list()
    }
}

/// 抽词-校验生成器
///
/// 12 词约 1/16、24 词约 1/256 的样本能通过校验和，剩余样本全部丢弃。
pub struct WordSamplingGenerator<W: WordSource> {
    source: W,
}

impl<W: WordSource> WordSamplingGenerator<W> {
    pub fn new(source: W) -> Self {
        Self { source }
    }

    /// 抽一次样；校验失败返回 None
    pub fn sample_once<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<SeedPhrase> {
        let words = self.source.word_list();
        if words.is_empty() {
            return None;
        }

        let count = WordCount::random(rng).words();
        let phrase = (0..count)
            .filter_map(|_| words.choose(rng).copied())
            .collect::<Vec<_>>()
            .join(" ");

        SeedPhrase::parse(&phrase).ok()
    }

    /// 最多抽 `max_attempts` 次
    pub fn try_generate(&self, max_attempts: u64) -> Option<SeedPhrase> {
        let mut rng = rand::thread_rng();
        (0..max_attempts).find_map(|_| self.sample_once(&mut rng))
    }
}

impl<W: WordSource> MnemonicGenerator for WordSamplingGenerator<W> {
    fn generate(&self) -> SeedPhrase {
        let mut rng = rand::thread_rng();
        let mut rejected: u64 = 0;
        loop {
            if let Some(phrase) = self.sample_once(&mut rng) {
                tracing::debug!(rejected, words = phrase.word_count(), "Sampled valid mnemonic");
                return phrase;
            }
            rejected += 1;
        }
    }
}

/// 生成方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeneratorKind {
    #[default]
    Entropy,
    WordSampling,
}

impl std::str::FromStr for GeneratorKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "entropy" => Ok(GeneratorKind::Entropy),
            "word_sampling" | "sampling" => Ok(GeneratorKind::WordSampling),
            other => Err(format!("unknown generator kind: {}", other)),
        }
    }
}

/// 生成器工厂
pub struct MnemonicGeneratorFactory;

impl MnemonicGeneratorFactory {
    pub fn create(kind: GeneratorKind) -> Box<dyn MnemonicGenerator> {
        match kind {
            GeneratorKind::Entropy => Box::new(EntropyMnemonicGenerator::new()),
            GeneratorKind::WordSampling => Box::new(WordSamplingGenerator::new(Bip39EnglishWords)),
        }
    }
}
