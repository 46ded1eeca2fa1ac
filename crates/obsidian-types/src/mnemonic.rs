//! Recovery phrase encoding/decoding for Obsidian.
//!
//! 24 words from the BIP39 English wordlist = 256 bits of entropy + 8-bit
//! checksum. The master seed is the BIP39 PBKDF2 seed with an empty
//! passphrase.

use crate::constants::{MNEMONIC_ENTROPY_SIZE, MNEMONIC_WORDS, SEED_SIZE};
use bip39::{Language, Mnemonic};
use rand::RngCore;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MnemonicError {
    #[error("expected 24 words, got {0}")]
    WrongWordCount(usize),

    #[error("unknown word \"{word}\" at position {position}")]
    UnknownWord { word: String, position: usize },

    #[error("checksum mismatch")]
    ChecksumMismatch,

    #[error("invalid entropy length: {0} bits")]
    InvalidEntropy(usize),

    #[error("ambiguous wordlist")]
    AmbiguousLanguage,
}

impl MnemonicError {
    fn from_bip39(err: bip39::Error, words: &[&str]) -> Self {
        match err {
            bip39::Error::BadWordCount(n) => MnemonicError::WrongWordCount(n),
            bip39::Error::UnknownWord(position) => MnemonicError::UnknownWord {
                word: words.get(position).map(|w| w.to_string()).unwrap_or_default(),
                position,
            },
            bip39::Error::BadEntropyBitCount(bits) => MnemonicError::InvalidEntropy(bits),
            bip39::Error::InvalidChecksum => MnemonicError::ChecksumMismatch,
            _ => MnemonicError::AmbiguousLanguage,
        }
    }
}

/// Collapse whitespace and lowercase a user-typed phrase.
pub fn normalize_mnemonic(phrase: &str) -> String {
    phrase
        .split_whitespace()
        .map(|w| w.to_lowercase())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Generate a fresh 24-word phrase from OS entropy.
pub fn generate_mnemonic() -> Result<String, MnemonicError> {
    let mut entropy = [0u8; MNEMONIC_ENTROPY_SIZE];
    rand::rngs::OsRng.fill_bytes(&mut entropy);
    entropy_to_mnemonic(&entropy)
}

/// Encode 32 bytes of entropy as a 24-word phrase.
pub fn entropy_to_mnemonic(entropy: &[u8]) -> Result<String, MnemonicError> {
    if entropy.len() != MNEMONIC_ENTROPY_SIZE {
        return Err(MnemonicError::InvalidEntropy(entropy.len() * 8));
    }
    let mnemonic = Mnemonic::from_entropy_in(Language::English, entropy)
        .map_err(|e| MnemonicError::from_bip39(e, &[]))?;
    Ok(mnemonic.to_string())
}

fn parse(phrase: &str) -> Result<Mnemonic, MnemonicError> {
    let normalized = normalize_mnemonic(phrase);
    let words: Vec<&str> = normalized.split(' ').filter(|w| !w.is_empty()).collect();
    if words.len() != MNEMONIC_WORDS {
        return Err(MnemonicError::WrongWordCount(words.len()));
    }
    Mnemonic::parse_in_normalized(Language::English, &normalized)
        .map_err(|e| MnemonicError::from_bip39(e, &words))
}

/// Check word count, wordlist membership, and checksum.
pub fn validate_mnemonic(phrase: &str) -> Result<(), MnemonicError> {
    parse(phrase).map(|_| ())
}

/// Expand a phrase into the 64-byte master seed.
pub fn mnemonic_to_seed(phrase: &str) -> Result<[u8; SEED_SIZE], MnemonicError> {
    Ok(parse(phrase)?.to_seed(""))
}
