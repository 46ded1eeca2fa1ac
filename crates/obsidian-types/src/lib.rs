//! Core types and constants for the Obsidian wallet.
//!
//! This crate provides the foundational types used across all Obsidian crates:
//! address encoding/decoding for both address families, atomic-unit amounts,
//! and recovery phrase handling.

pub mod address;
pub mod amount;
pub mod constants;
pub mod mnemonic;

pub use address::{AddressError, ParsedAddress};
pub use amount::{Amount, AmountError};
pub use constants::AddressKind;
pub use mnemonic::MnemonicError;
