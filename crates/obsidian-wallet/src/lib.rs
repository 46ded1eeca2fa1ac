//! Obsidian wallet core.
//!
//! Provides the recovery phrase, deterministic key derivation for
//! transparent and shielded addresses, the address registry, transaction
//! history, wallet file persistence, and the [`WalletService`] operation
//! contract that ties them to a remote node.

pub mod error;
pub mod keys;
pub mod ledger;
pub mod registry;
pub mod seed;
pub mod state;
pub mod storage;
pub mod wallet;

pub use error::WalletError;
pub use keys::{derive_shielded, derive_transparent, DerivedKey, ShieldedKeySet, TransparentKeyPair};
pub use ledger::{Ledger, TransactionRecord};
pub use registry::AddressRegistry;
pub use seed::SeedArtifact;
pub use state::WalletState;
pub use wallet::{NodeFactory, WalletService};

pub use obsidian_types::{AddressKind, Amount};
