//! Aggregate wallet state.

use crate::error::WalletError;
use crate::keys::derive;
use crate::ledger::Ledger;
use crate::registry::AddressRegistry;
use crate::seed::SeedArtifact;
use obsidian_types::AddressKind;

/// Seed, keys of both families, history and node endpoint.
///
/// Equality is field-for-field, including key and ledger order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletState {
    pub seed: SeedArtifact,
    pub registry: AddressRegistry,
    pub ledger: Ledger,
    pub endpoint: String,
}

impl WalletState {
    /// Fresh state for `seed` holding the first address of each family.
    pub fn new(seed: SeedArtifact, endpoint: &str) -> Result<Self, WalletError> {
        let mut state = Self {
            seed,
            registry: AddressRegistry::new(),
            ledger: Ledger::new(),
            endpoint: endpoint.to_string(),
        };
        state.derive_next(AddressKind::Transparent)?;
        state.derive_next(AddressKind::Shielded)?;
        Ok(state)
    }

    /// Derive and register the next address of `kind`.
    pub fn derive_next(&mut self, kind: AddressKind) -> Result<String, WalletError> {
        let index = self.registry.next_index(kind);
        let key = derive(self.seed.seed(), kind, index)?;
        self.registry.add(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state_has_first_addresses() {
        let seed = SeedArtifact::generate().unwrap();
        let state = WalletState::new(seed, "http://node:8545").unwrap();
        assert_eq!(state.registry.list(AddressKind::Transparent).len(), 1);
        assert_eq!(state.registry.list(AddressKind::Shielded).len(), 1);
        assert!(state.ledger.is_empty());
        assert_eq!(state.endpoint, "http://node:8545");
    }

    #[test]
    fn test_same_seed_same_state() {
        let seed = SeedArtifact::generate().unwrap();
        let mut a = WalletState::new(seed.clone(), "e").unwrap();
        let mut b = WalletState::new(seed, "e").unwrap();
        assert_eq!(
            a.derive_next(AddressKind::Shielded).unwrap(),
            b.derive_next(AddressKind::Shielded).unwrap()
        );
        assert_eq!(a, b);
    }
}
