//! Obsidian network constants, address prefixes, and derivation parameters.

use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// Address Kinds
// =============================================================================

/// The two address families managed by a wallet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AddressKind {
    /// Publicly visible address (obs...)
    Transparent,
    /// Privacy-preserving address with separate spending/viewing keys (zobs...)
    Shielded,
}

impl AddressKind {
    /// Human-readable prefix that starts every address of this kind.
    pub fn prefix(self) -> &'static str {
        match self {
            AddressKind::Transparent => TRANSPARENT_PREFIX,
            AddressKind::Shielded => SHIELDED_PREFIX,
        }
    }

    /// Version byte carried inside the Base58Check payload.
    pub fn version_byte(self) -> u8 {
        match self {
            AddressKind::Transparent => TRANSPARENT_VERSION,
            AddressKind::Shielded => SHIELDED_VERSION,
        }
    }

    /// Length of the key material following the version byte.
    pub fn payload_len(self) -> usize {
        match self {
            AddressKind::Transparent => HASH160_SIZE,
            AddressKind::Shielded => SHIELDED_PAYLOAD_SIZE,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AddressKind::Transparent => "transparent",
            AddressKind::Shielded => "shielded",
        }
    }
}

impl fmt::Display for AddressKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Address Prefixes
// =============================================================================

pub const TRANSPARENT_PREFIX: &str = "obs";
pub const SHIELDED_PREFIX: &str = "zobs";

/// Version byte for transparent (pay-to-pubkey-hash) addresses.
pub const TRANSPARENT_VERSION: u8 = 0x00;

/// Version byte for shielded addresses.
pub const SHIELDED_VERSION: u8 = 0x1c;

// =============================================================================
// Key and Data Sizes
// =============================================================================

/// HASH160 (RIPEMD160 of SHA256) output size.
pub const HASH160_SIZE: usize = 20;

/// Compressed secp256k1 public key size.
pub const COMPRESSED_PUBKEY_SIZE: usize = 33;

/// BIP340 x-only public key size.
pub const XONLY_PUBKEY_SIZE: usize = 32;

/// Shielded payload: compressed viewing pubkey, then HASH160 of the x-only
/// spending pubkey.
pub const SHIELDED_PAYLOAD_SIZE: usize = COMPRESSED_PUBKEY_SIZE + HASH160_SIZE;

/// BIP39 seed size produced by PBKDF2-HMAC-SHA512.
pub const SEED_SIZE: usize = 64;

/// Fixed memo size inside a sealed shielded note.
pub const MEMO_SIZE: usize = 512;

// =============================================================================
// Mnemonic
// =============================================================================

/// Words in a recovery phrase (256 bits of entropy).
pub const MNEMONIC_WORDS: usize = 24;

/// Entropy bytes behind a 24-word phrase.
pub const MNEMONIC_ENTROPY_SIZE: usize = 32;

// =============================================================================
// Derivation
// =============================================================================

/// BIP44 purpose for transparent keys: m/44'/0'/0'/0/i
pub const TRANSPARENT_PURPOSE: u32 = 44;

/// Purpose for shielded spending keys: m/32'/0'/i'
pub const SHIELDED_PURPOSE: u32 = 32;

/// Coin type used on both paths.
pub const COIN_TYPE: u32 = 0;

/// HKDF info string separating the viewing key from the spending key.
pub const VIEWING_KEY_INFO: &[u8] = b"obsidian-shielded-viewing-key";

// =============================================================================
// Amounts
// =============================================================================

/// Atomic units per OBS.
pub const COIN: u64 = 100_000_000;

/// Decimal places of one atomic unit.
pub const DISPLAY_DECIMALS: usize = 8;

// =============================================================================
// Network
// =============================================================================

/// Default node RPC endpoint.
pub const DEFAULT_RPC_ENDPOINT: &str = "http://localhost:8545";
