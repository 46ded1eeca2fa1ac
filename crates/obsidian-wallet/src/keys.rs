//! Wallet key derivation.
//!
//! Both address families hang off the same BIP39 master seed but live in
//! disjoint BIP32 subtrees:
//!
//! - transparent: `m/44'/0'/0'/0/i`, secp256k1 keypair, `obs` address
//! - shielded:    `m/32'/0'/i'` spending key; the viewing key is a one-way
//!   HKDF-SHA256 expansion of it; the `zobs` address carries the viewing
//!   public key and a HASH160 commitment to the x-only spending key
//!
//! Derivation is a pure function of (seed, index, kind).

use crate::error::WalletError;
use bitcoin::bip32::{ChildNumber, DerivationPath, Xpriv};
use bitcoin::secp256k1::{Keypair, PublicKey, Secp256k1, SecretKey, XOnlyPublicKey};
use bitcoin::{Network, PrivateKey};
use hkdf::Hkdf;
use obsidian_tx::SigningKey;
use obsidian_types::address::{shielded_address, transparent_address};
use obsidian_types::constants::{
    COIN_TYPE, SEED_SIZE, SHIELDED_PURPOSE, TRANSPARENT_PURPOSE, VIEWING_KEY_INFO,
};
use obsidian_types::AddressKind;
use sha2::Sha256;
use std::fmt;

// ── Key types ───────────────────────────────────────────────────────────────

/// Transparent keypair at a derivation index.
#[derive(Clone, PartialEq, Eq)]
pub struct TransparentKeyPair {
    pub index: u32,
    private_key: SecretKey,
    pub public_key: PublicKey,
    pub address: String,
}

impl TransparentKeyPair {
    /// Private key in compressed mainnet WIF.
    pub fn private_key_wif(&self) -> String {
        PrivateKey::new(self.private_key, Network::Bitcoin).to_wif()
    }

    /// Compressed public key as hex.
    pub fn public_key_hex(&self) -> String {
        hex::encode(self.public_key.serialize())
    }

    pub fn signing_key(&self) -> SigningKey {
        SigningKey::Transparent(self.private_key)
    }
}

impl fmt::Debug for TransparentKeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransparentKeyPair")
            .field("index", &self.index)
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

/// Shielded key set at a derivation index.
#[derive(Clone, PartialEq, Eq)]
pub struct ShieldedKeySet {
    pub index: u32,
    spending_key: SecretKey,
    viewing_key: SecretKey,
    pub address: String,
}

impl ShieldedKeySet {
    pub fn spending_key_hex(&self) -> String {
        hex::encode(self.spending_key.secret_bytes())
    }

    pub fn viewing_key_hex(&self) -> String {
        hex::encode(self.viewing_key.secret_bytes())
    }

    /// Viewing secret, for opening notes sealed to this address.
    pub fn viewing_key(&self) -> &SecretKey {
        &self.viewing_key
    }

    pub fn viewing_public_key(&self) -> PublicKey {
        PublicKey::from_secret_key(&Secp256k1::new(), &self.viewing_key)
    }

    /// BIP340 public key that authorizes spends from this address.
    pub fn spending_public_key(&self) -> XOnlyPublicKey {
        Keypair::from_secret_key(&Secp256k1::new(), &self.spending_key)
            .x_only_public_key()
            .0
    }

    pub fn signing_key(&self) -> SigningKey {
        SigningKey::Shielded(self.spending_key)
    }
}

impl fmt::Debug for ShieldedKeySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShieldedKeySet")
            .field("index", &self.index)
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

/// Either kind of derived key, as handed to the address registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DerivedKey {
    Transparent(TransparentKeyPair),
    Shielded(ShieldedKeySet),
}

impl DerivedKey {
    pub fn kind(&self) -> AddressKind {
        match self {
            DerivedKey::Transparent(_) => AddressKind::Transparent,
            DerivedKey::Shielded(_) => AddressKind::Shielded,
        }
    }

    pub fn index(&self) -> u32 {
        match self {
            DerivedKey::Transparent(k) => k.index,
            DerivedKey::Shielded(k) => k.index,
        }
    }

    pub fn address(&self) -> &str {
        match self {
            DerivedKey::Transparent(k) => &k.address,
            DerivedKey::Shielded(k) => &k.address,
        }
    }

    pub fn signing_key(&self) -> SigningKey {
        match self {
            DerivedKey::Transparent(k) => k.signing_key(),
            DerivedKey::Shielded(k) => k.signing_key(),
        }
    }
}

// ── Paths ───────────────────────────────────────────────────────────────────

fn hardened(i: u32) -> Result<ChildNumber, WalletError> {
    ChildNumber::from_hardened_idx(i).map_err(|e| WalletError::KeyDerivation(e.to_string()))
}

fn normal(i: u32) -> Result<ChildNumber, WalletError> {
    ChildNumber::from_normal_idx(i).map_err(|e| WalletError::KeyDerivation(e.to_string()))
}

/// `m/44'/0'/0'/0/index`
pub fn transparent_path(index: u32) -> Result<DerivationPath, WalletError> {
    Ok(DerivationPath::from(vec![
        hardened(TRANSPARENT_PURPOSE)?,
        hardened(COIN_TYPE)?,
        hardened(0)?,
        normal(0)?,
        normal(index)?,
    ]))
}

/// `m/32'/0'/index'`
pub fn shielded_path(index: u32) -> Result<DerivationPath, WalletError> {
    Ok(DerivationPath::from(vec![
        hardened(SHIELDED_PURPOSE)?,
        hardened(COIN_TYPE)?,
        hardened(index)?,
    ]))
}

fn derive_secret(seed: &[u8], path: &DerivationPath) -> Result<SecretKey, WalletError> {
    if seed.len() != SEED_SIZE {
        return Err(WalletError::KeyDerivation(format!(
            "seed must be {} bytes, got {}",
            SEED_SIZE,
            seed.len()
        )));
    }
    let secp = Secp256k1::new();
    let master = Xpriv::new_master(Network::Bitcoin, seed)
        .map_err(|e| WalletError::KeyDerivation(e.to_string()))?;
    let child = master
        .derive_priv(&secp, path)
        .map_err(|e| WalletError::KeyDerivation(e.to_string()))?;
    Ok(child.private_key)
}

// ── Derivation ──────────────────────────────────────────────────────────────

/// Derive the transparent keypair at `index`.
pub fn derive_transparent(seed: &[u8], index: u32) -> Result<TransparentKeyPair, WalletError> {
    let private_key = derive_secret(seed, &transparent_path(index)?)?;
    let public_key = PublicKey::from_secret_key(&Secp256k1::new(), &private_key);
    let address = transparent_address(&public_key.serialize());
    log::debug!("derived transparent key {} -> {}", index, address);

    Ok(TransparentKeyPair {
        index,
        private_key,
        public_key,
        address,
    })
}

/// Derive the shielded key set at `index`.
pub fn derive_shielded(seed: &[u8], index: u32) -> Result<ShieldedKeySet, WalletError> {
    let spending_key = derive_secret(seed, &shielded_path(index)?)?;
    let viewing_key = viewing_key_from_spending(&spending_key)?;
    let secp = Secp256k1::new();
    let viewing_public = PublicKey::from_secret_key(&secp, &viewing_key);
    let (spending_public, _parity) =
        Keypair::from_secret_key(&secp, &spending_key).x_only_public_key();
    let address = shielded_address(&viewing_public.serialize(), &spending_public.serialize());
    log::debug!("derived shielded key {} -> {}", index, address);

    Ok(ShieldedKeySet {
        index,
        spending_key,
        viewing_key,
        address,
    })
}

/// Derive the key of either kind at `index`.
pub fn derive(seed: &[u8], kind: AddressKind, index: u32) -> Result<DerivedKey, WalletError> {
    match kind {
        AddressKind::Transparent => derive_transparent(seed, index).map(DerivedKey::Transparent),
        AddressKind::Shielded => derive_shielded(seed, index).map(DerivedKey::Shielded),
    }
}

/// One-way expansion of a spending key into its viewing key.
///
/// A counter byte is appended to the info string in the (negligible) case
/// that the output is not a valid scalar.
pub fn viewing_key_from_spending(spending_key: &SecretKey) -> Result<SecretKey, WalletError> {
    let hk = Hkdf::<Sha256>::new(None, &spending_key.secret_bytes());
    for counter in 0..=u8::MAX {
        let mut info = VIEWING_KEY_INFO.to_vec();
        if counter > 0 {
            info.push(counter);
        }
        let mut okm = [0u8; 32];
        hk.expand(&info, &mut okm)
            .map_err(|e| WalletError::KeyDerivation(e.to_string()))?;
        if let Ok(key) = SecretKey::from_slice(&okm) {
            return Ok(key);
        }
    }
    Err(WalletError::KeyDerivation("viewing key expansion exhausted".into()))
}
