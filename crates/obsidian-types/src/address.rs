//! Obsidian address parsing, validation, and creation.
//!
//! Both address families share one layout: a text prefix followed by
//! Base58Check(version || payload).
//!
//! - transparent: `obs` + Base58Check(0x00 || HASH160(compressed pubkey))
//! - shielded:    `zobs` + Base58Check(0x1c || compressed viewing pubkey ||
//!   HASH160(x-only spending pubkey))
//!
//! Shielded addresses carry the full viewing public key so that a sender
//! can seal a note to the recipient without any further lookup. The trailing
//! spend commitment ties the address to the one key allowed to spend from it.

use crate::constants::{AddressKind, COMPRESSED_PUBKEY_SIZE, HASH160_SIZE, XONLY_PUBKEY_SIZE};
use bitcoin::hashes::{hash160, Hash};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AddressError {
    #[error("address must be a non-empty string")]
    Empty,

    #[error("unknown address prefix")]
    UnknownPrefix,

    #[error("base58 decode error: {0}")]
    Base58(String),

    #[error("version byte 0x{actual:02x} is not a {kind} address (expected 0x{expected:02x})")]
    VersionMismatch {
        kind: AddressKind,
        expected: u8,
        actual: u8,
    },

    #[error("invalid payload length: expected {expected} bytes, got {actual}")]
    InvalidDataLength { expected: usize, actual: usize },

    #[error("shielded address does not carry a valid viewing key")]
    InvalidViewingKey,
}

/// Result of parsing an address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedAddress {
    pub kind: AddressKind,
    /// HASH160 for transparent; viewing pubkey and spend commitment for shielded.
    pub payload: Vec<u8>,
}

impl ParsedAddress {
    pub fn is_shielded(&self) -> bool {
        self.kind == AddressKind::Shielded
    }

    /// The recipient's viewing public key, present only on shielded addresses.
    pub fn viewing_public_key(&self) -> Option<[u8; COMPRESSED_PUBKEY_SIZE]> {
        if !self.is_shielded() {
            return None;
        }
        self.payload.get(..COMPRESSED_PUBKEY_SIZE)?.try_into().ok()
    }

    /// HASH160 of the x-only spending pubkey, present only on shielded addresses.
    pub fn spend_commitment(&self) -> Option<[u8; HASH160_SIZE]> {
        if !self.is_shielded() {
            return None;
        }
        self.payload.get(COMPRESSED_PUBKEY_SIZE..)?.try_into().ok()
    }

    /// Payload as lowercase hex.
    pub fn payload_hex(&self) -> String {
        hex::encode(&self.payload)
    }

    /// Re-encode this parsed address back to its string form.
    pub fn to_address_string(&self) -> String {
        encode_raw(self.kind, &self.payload)
    }
}

/// Classify an address by its prefix alone, without checksum verification.
pub fn address_kind(address: &str) -> Option<AddressKind> {
    let address = address.trim();
    // Longest prefix first.
    if address.starts_with(AddressKind::Shielded.prefix()) {
        Some(AddressKind::Shielded)
    } else if address.starts_with(AddressKind::Transparent.prefix()) {
        Some(AddressKind::Transparent)
    } else {
        None
    }
}

/// Parse and validate an Obsidian address string.
pub fn parse_address(address: &str) -> Result<ParsedAddress, AddressError> {
    let address = address.trim();
    if address.is_empty() {
        return Err(AddressError::Empty);
    }

    let kind = address_kind(address).ok_or(AddressError::UnknownPrefix)?;
    let body = &address[kind.prefix().len()..];

    let data = bitcoin::base58::decode_check(body)
        .map_err(|e| AddressError::Base58(e.to_string()))?;

    let (&version, payload) = data.split_first().ok_or(AddressError::InvalidDataLength {
        expected: 1 + kind.payload_len(),
        actual: 0,
    })?;

    if version != kind.version_byte() {
        return Err(AddressError::VersionMismatch {
            kind,
            expected: kind.version_byte(),
            actual: version,
        });
    }

    if payload.len() != kind.payload_len() {
        return Err(AddressError::InvalidDataLength {
            expected: kind.payload_len(),
            actual: payload.len(),
        });
    }

    if kind == AddressKind::Shielded
        && bitcoin::secp256k1::PublicKey::from_slice(&payload[..COMPRESSED_PUBKEY_SIZE]).is_err()
    {
        return Err(AddressError::InvalidViewingKey);
    }

    Ok(ParsedAddress {
        kind,
        payload: payload.to_vec(),
    })
}

/// Check if a string is a valid Obsidian address.
pub fn is_valid_address(address: &str) -> bool {
    parse_address(address).is_ok()
}

/// Create a transparent address from a compressed public key.
pub fn transparent_address(public_key: &[u8; COMPRESSED_PUBKEY_SIZE]) -> String {
    let digest: [u8; HASH160_SIZE] = hash160::Hash::hash(public_key).to_byte_array();
    encode_raw(AddressKind::Transparent, &digest)
}

/// Create a shielded address from a compressed viewing public key and the
/// x-only spending public key.
pub fn shielded_address(
    viewing_public_key: &[u8; COMPRESSED_PUBKEY_SIZE],
    spending_public_key: &[u8; XONLY_PUBKEY_SIZE],
) -> String {
    let mut payload = viewing_public_key.to_vec();
    payload.extend_from_slice(&spend_commitment(spending_public_key));
    encode_raw(AddressKind::Shielded, &payload)
}

/// HASH160 of an x-only spending public key.
pub fn spend_commitment(spending_public_key: &[u8; XONLY_PUBKEY_SIZE]) -> [u8; HASH160_SIZE] {
    hash160::Hash::hash(spending_public_key).to_byte_array()
}

fn encode_raw(kind: AddressKind, payload: &[u8]) -> String {
    let mut data = Vec::with_capacity(1 + payload.len());
    data.push(kind.version_byte());
    data.extend_from_slice(payload);
    format!("{}{}", kind.prefix(), bitcoin::base58::encode_check(&data))
}

#[cfg(test)]
mod tests {
    use super::*;

    // Generator point G, compressed.
    const G: [u8; 33] = [
        0x02, 0x79, 0xbe, 0x66, 0x7e, 0xf9, 0xdc, 0xbb, 0xac, 0x55, 0xa0, 0x62, 0x95, 0xce,
        0x87, 0x0b, 0x07, 0x02, 0x9b, 0xfc, 0xdb, 0x2d, 0xce, 0x28, 0xd9, 0x59, 0xf2, 0x81,
        0x5b, 0x16, 0xf8, 0x17, 0x98,
    ];

    fn g_xonly() -> [u8; 32] {
        G[1..].try_into().unwrap()
    }

    #[test]
    fn test_transparent_address_known_hash() {
        let addr = transparent_address(&G);
        assert!(addr.starts_with("obs1"), "version 0x00 encodes as a leading '1': {}", addr);

        let parsed = parse_address(&addr).unwrap();
        assert_eq!(parsed.kind, AddressKind::Transparent);
        // HASH160 of the compressed generator point (the well-known key for privkey = 1).
        assert_eq!(parsed.payload_hex(), "751e76e8199196d454941c45d1b3a323f1433bd6");
    }

    #[test]
    fn test_shielded_address_carries_viewing_key() {
        let addr = shielded_address(&G, &g_xonly());
        assert!(addr.starts_with("zobs"));

        let parsed = parse_address(&addr).unwrap();
        assert!(parsed.is_shielded());
        assert_eq!(parsed.payload.len(), AddressKind::Shielded.payload_len());
        assert_eq!(parsed.viewing_public_key(), Some(G));
        assert_eq!(parsed.spend_commitment(), Some(spend_commitment(&g_xonly())));
        assert_eq!(parsed.to_address_string(), addr);
    }

    #[test]
    fn test_spend_commitment_distinguishes_spenders() {
        let mut other = g_xonly();
        other[31] ^= 1;
        assert_ne!(shielded_address(&G, &g_xonly()), shielded_address(&G, &other));

        let t = parse_address(&transparent_address(&G)).unwrap();
        assert_eq!(t.spend_commitment(), None);
        assert_eq!(t.viewing_public_key(), None);
    }

    #[test]
    fn test_rejects_viewing_key_only_payload() {
        let mut data = vec![AddressKind::Shielded.version_byte()];
        data.extend_from_slice(&G);
        let addr = format!("zobs{}", bitcoin::base58::encode_check(&data));
        assert_eq!(
            parse_address(&addr),
            Err(AddressError::InvalidDataLength { expected: 53, actual: 33 })
        );
    }

    #[test]
    fn test_rejects_off_curve_viewing_key() {
        let mut bogus = G;
        bogus[0] = 0x05;
        let addr = shielded_address(&bogus, &g_xonly());
        assert_eq!(parse_address(&addr), Err(AddressError::InvalidViewingKey));
    }

    #[test]
    fn test_address_kind_by_prefix() {
        assert_eq!(address_kind("obs1abc"), Some(AddressKind::Transparent));
        assert_eq!(address_kind("zobsabc"), Some(AddressKind::Shielded));
        assert_eq!(address_kind("bc1qxyz"), None);
        assert_eq!(address_kind(""), None);
    }

    #[test]
    fn test_rejects_bad_checksum() {
        let mut addr = transparent_address(&G);
        let last = addr.pop().unwrap();
        addr.push(if last == '2' { '3' } else { '2' });
        assert!(matches!(parse_address(&addr), Err(AddressError::Base58(_))));
        assert!(!is_valid_address(&addr));
    }

    #[test]
    fn test_rejects_swapped_prefix() {
        // A transparent body under the shielded prefix fails the version check.
        let t = transparent_address(&G);
        let swapped = format!("zobs{}", &t[3..]);
        assert!(matches!(
            parse_address(&swapped),
            Err(AddressError::VersionMismatch { .. })
        ));
    }

    #[test]
    fn test_rejects_empty_and_unknown() {
        assert_eq!(parse_address("   "), Err(AddressError::Empty));
        assert_eq!(parse_address("external_addr"), Err(AddressError::UnknownPrefix));
    }
}
