//! Recovery phrase and master seed.

use crate::error::WalletError;
use obsidian_types::constants::SEED_SIZE;
use obsidian_types::mnemonic::{generate_mnemonic, mnemonic_to_seed, normalize_mnemonic};
use std::fmt;
use zeroize::Zeroize;

/// A checksummed 24-word phrase and the 64-byte seed expanded from it.
///
/// Immutable once created. Both fields are wiped on drop.
#[derive(Clone)]
pub struct SeedArtifact {
    phrase: String,
    seed: [u8; SEED_SIZE],
}

impl SeedArtifact {
    /// Fresh phrase from OS entropy.
    pub fn generate() -> Result<Self, WalletError> {
        let phrase = generate_mnemonic()?;
        Self::from_phrase(&phrase)
    }

    /// Validate a phrase (word count, wordlist, checksum) and expand it.
    pub fn from_phrase(phrase: &str) -> Result<Self, WalletError> {
        let seed = mnemonic_to_seed(phrase)?;
        Ok(Self {
            phrase: normalize_mnemonic(phrase),
            seed,
        })
    }

    pub fn phrase(&self) -> &str {
        &self.phrase
    }

    pub fn seed(&self) -> &[u8; SEED_SIZE] {
        &self.seed
    }
}

impl PartialEq for SeedArtifact {
    fn eq(&self, other: &Self) -> bool {
        self.seed == other.seed
    }
}

impl Eq for SeedArtifact {}

impl fmt::Debug for SeedArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SeedArtifact(<redacted>)")
    }
}

impl Drop for SeedArtifact {
    fn drop(&mut self) {
        self.phrase.zeroize();
        self.seed.zeroize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use obsidian_types::MnemonicError;

    #[test]
    fn test_generate_then_reload() {
        let a = SeedArtifact::generate().unwrap();
        let b = SeedArtifact::from_phrase(a.phrase()).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.phrase().split(' ').count(), 24);
    }

    #[test]
    fn test_invalid_phrase() {
        let err = SeedArtifact::from_phrase("not a real phrase").unwrap_err();
        assert!(matches!(
            err,
            WalletError::InvalidMnemonic(MnemonicError::WrongWordCount(4))
        ));
    }

    #[test]
    fn test_debug_hides_phrase() {
        let a = SeedArtifact::generate().unwrap();
        assert_eq!(format!("{:?}", a), "SeedArtifact(<redacted>)");
    }
}
