//! Address registry.
//!
//! One ordered collection per address family. Position in the collection
//! equals derivation index, so indices are strictly increasing, never reused
//! and never gapped.

use crate::error::WalletError;
use crate::keys::{DerivedKey, ShieldedKeySet, TransparentKeyPair};
use obsidian_tx::SigningKey;
use obsidian_types::AddressKind;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddressRegistry {
    transparent: Vec<TransparentKeyPair>,
    shielded: Vec<ShieldedKeySet>,
}

impl AddressRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index the next key of `kind` must be derived at.
    pub fn next_index(&self, kind: AddressKind) -> u32 {
        let len = match kind {
            AddressKind::Transparent => self.transparent.len(),
            AddressKind::Shielded => self.shielded.len(),
        };
        len as u32
    }

    /// Append a derived key and return its address.
    ///
    /// The key must carry exactly `next_index(kind)`; anything else would
    /// leave a gap or overwrite an existing entry.
    pub fn add(&mut self, key: DerivedKey) -> Result<String, WalletError> {
        let kind = key.kind();
        let expected = self.next_index(kind);
        if key.index() != expected {
            return Err(WalletError::IndexConflict {
                kind,
                index: key.index(),
                expected,
            });
        }
        let address = key.address().to_string();
        match key {
            DerivedKey::Transparent(k) => self.transparent.push(k),
            DerivedKey::Shielded(k) => self.shielded.push(k),
        }
        log::debug!("registered {} address #{}", kind, expected);
        Ok(address)
    }

    /// Addresses of `kind` in derivation order.
    pub fn list(&self, kind: AddressKind) -> Vec<String> {
        match kind {
            AddressKind::Transparent => {
                self.transparent.iter().map(|k| k.address.clone()).collect()
            }
            AddressKind::Shielded => self.shielded.iter().map(|k| k.address.clone()).collect(),
        }
    }

    pub fn transparent_keys(&self) -> &[TransparentKeyPair] {
        &self.transparent
    }

    pub fn shielded_keys(&self) -> &[ShieldedKeySet] {
        &self.shielded
    }

    pub fn contains(&self, address: &str) -> bool {
        self.transparent.iter().any(|k| k.address == address)
            || self.shielded.iter().any(|k| k.address == address)
    }

    pub fn is_empty(&self) -> bool {
        self.transparent.is_empty() && self.shielded.is_empty()
    }

    /// Spending material for an address this wallet generated.
    pub fn lookup_signing_material(&self, address: &str) -> Result<SigningKey, WalletError> {
        if let Some(k) = self.transparent.iter().find(|k| k.address == address) {
            return Ok(k.signing_key());
        }
        if let Some(k) = self.shielded.iter().find(|k| k.address == address) {
            return Ok(k.signing_key());
        }
        Err(WalletError::UnknownAddress(address.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::derive;
    use crate::seed::SeedArtifact;

    fn seed() -> SeedArtifact {
        SeedArtifact::generate().unwrap()
    }

    fn fill(reg: &mut AddressRegistry, seed: &SeedArtifact, kind: AddressKind, n: u32) {
        for _ in 0..n {
            let key = derive(seed.seed(), kind, reg.next_index(kind)).unwrap();
            reg.add(key).unwrap();
        }
    }

    #[test]
    fn test_indices_are_per_kind() {
        let s = seed();
        let mut reg = AddressRegistry::new();
        fill(&mut reg, &s, AddressKind::Transparent, 3);
        assert_eq!(reg.next_index(AddressKind::Transparent), 3);
        assert_eq!(reg.next_index(AddressKind::Shielded), 0);

        fill(&mut reg, &s, AddressKind::Shielded, 1);
        assert_eq!(reg.next_index(AddressKind::Shielded), 1);
        assert_eq!(reg.list(AddressKind::Transparent).len(), 3);
        assert_eq!(reg.list(AddressKind::Shielded).len(), 1);
    }

    #[test]
    fn test_list_follows_derivation_order() {
        let s = seed();
        let mut reg = AddressRegistry::new();
        fill(&mut reg, &s, AddressKind::Shielded, 4);
        for (i, k) in reg.shielded_keys().iter().enumerate() {
            assert_eq!(k.index, i as u32);
        }
        let listed = reg.list(AddressKind::Shielded);
        assert!(listed.iter().all(|a| a.starts_with("zobs")));
    }

    #[test]
    fn test_gap_and_reuse_rejected() {
        let s = seed();
        let mut reg = AddressRegistry::new();
        let gap = derive(s.seed(), AddressKind::Transparent, 2).unwrap();
        assert!(matches!(
            reg.add(gap),
            Err(WalletError::IndexConflict { index: 2, expected: 0, .. })
        ));

        fill(&mut reg, &s, AddressKind::Transparent, 1);
        let reuse = derive(s.seed(), AddressKind::Transparent, 0).unwrap();
        assert!(matches!(reg.add(reuse), Err(WalletError::IndexConflict { .. })));
        assert_eq!(reg.list(AddressKind::Transparent).len(), 1);
    }

    #[test]
    fn test_lookup_signing_material() {
        let s = seed();
        let mut reg = AddressRegistry::new();
        fill(&mut reg, &s, AddressKind::Transparent, 1);
        fill(&mut reg, &s, AddressKind::Shielded, 1);

        let t = reg.list(AddressKind::Transparent).remove(0);
        let z = reg.list(AddressKind::Shielded).remove(0);
        assert_eq!(reg.lookup_signing_material(&t).unwrap().kind(), AddressKind::Transparent);
        assert_eq!(reg.lookup_signing_material(&z).unwrap().kind(), AddressKind::Shielded);

        let other = derive(seed().seed(), AddressKind::Transparent, 0).unwrap();
        assert!(matches!(
            reg.lookup_signing_material(other.address()),
            Err(WalletError::UnknownAddress(_))
        ));
    }
}
