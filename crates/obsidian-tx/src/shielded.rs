//! Shielded note sealing.
//!
//! The note plaintext is
//! `value (8, LE) || rcm (32) || memo_len (2, LE) || memo (512, zero padded)`.
//! It is encrypted to a viewing public key:
//!
//! ```text
//! shared     = ECDH(ephemeral_secret, viewing_pubkey)
//! key        = HKDF-SHA256(salt = ephemeral_pubkey, ikm = shared, info = "obsidian-note-key")
//! ciphertext = nonce (12) || AES-256-GCM(key, nonce, plaintext)
//! commitment = SHA256(plaintext)
//! nullifier  = SHA256(commitment || spending_key)
//! ```
//!
//! The proof system behind shielded spends is left to the node; the wallet
//! only needs something implementing [`ShieldedProver`].

use crate::types::SealedNote;
use crate::TxError;
use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use bitcoin::secp256k1::ecdh::SharedSecret;
use bitcoin::secp256k1::{PublicKey, Secp256k1, SecretKey};
use hkdf::Hkdf;
use obsidian_types::constants::MEMO_SIZE;
use rand::RngCore;
use sha2::{Digest, Sha256};

const NOTE_KEY_INFO: &[u8] = b"obsidian-note-key";
const NONCE_SIZE: usize = 12;
const RCM_SIZE: usize = 32;
const MEMO_LEN_OFFSET: usize = 8 + RCM_SIZE;
const MEMO_OFFSET: usize = MEMO_LEN_OFFSET + 2;
const NOTE_PLAINTEXT_SIZE: usize = MEMO_OFFSET + MEMO_SIZE;

/// What goes into a sealed note.
pub struct NoteRequest<'a> {
    pub value: u64,
    pub memo: &'a str,
    /// Viewing key the note is readable with.
    pub viewing_public_key: &'a PublicKey,
    /// Set when a shielded address spends; produces a nullifier.
    pub spending_key: Option<&'a SecretKey>,
}

/// Decrypted contents of a sealed note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotePlaintext {
    pub value: u64,
    pub rcm: [u8; RCM_SIZE],
    pub memo: String,
}

/// Swappable shielded primitive.
pub trait ShieldedProver: Send + Sync {
    fn seal(&self, request: &NoteRequest<'_>) -> Result<SealedNote, TxError>;
}

/// Default prover: ECDH + AES-256-GCM note encryption.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoteEncryption;

impl NoteEncryption {
    /// Decrypt a note with the viewing secret it was sealed to.
    pub fn open(
        &self,
        note: &SealedNote,
        viewing_key: &SecretKey,
    ) -> Result<NotePlaintext, TxError> {
        let eph_bytes = hex::decode(&note.ephemeral_public_key)
            .map_err(|e| TxError::Parse(e.to_string()))?;
        let ephemeral = PublicKey::from_slice(&eph_bytes)
            .map_err(|e| TxError::Parse(e.to_string()))?;
        let data = hex::decode(&note.ciphertext).map_err(|e| TxError::Parse(e.to_string()))?;
        if data.len() < NONCE_SIZE {
            return Err(TxError::Parse("note ciphertext too short".into()));
        }
        let (nonce_bytes, ciphertext) = data.split_at(NONCE_SIZE);

        let key = note_key(&SharedSecret::new(&ephemeral, viewing_key), &eph_bytes)?;
        let plaintext = aes_open(&key, nonce_bytes, ciphertext)?;
        if plaintext.len() != NOTE_PLAINTEXT_SIZE {
            return Err(TxError::Parse(format!(
                "note plaintext is {} bytes, expected {}",
                plaintext.len(),
                NOTE_PLAINTEXT_SIZE
            )));
        }
        if hex::encode(Sha256::digest(&plaintext)) != note.commitment {
            return Err(TxError::Encryption("note commitment mismatch".into()));
        }

        decode_plaintext(&plaintext)
    }
}

impl ShieldedProver for NoteEncryption {
    fn seal(&self, request: &NoteRequest<'_>) -> Result<SealedNote, TxError> {
        let mut rng = rand::thread_rng();
        let mut rcm = [0u8; RCM_SIZE];
        rng.fill_bytes(&mut rcm);
        let plaintext = encode_plaintext(request.value, &rcm, request.memo)?;

        let secp = Secp256k1::new();
        let ephemeral = random_secret_key(&mut rng);
        let ephemeral_pub = PublicKey::from_secret_key(&secp, &ephemeral).serialize();
        let key = note_key(
            &SharedSecret::new(request.viewing_public_key, &ephemeral),
            &ephemeral_pub,
        )?;

        let mut nonce_bytes = [0u8; NONCE_SIZE];
        rng.fill_bytes(&mut nonce_bytes);
        let ciphertext = aes_seal(&key, &nonce_bytes, &plaintext)?;

        let mut sealed = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
        sealed.extend_from_slice(&nonce_bytes);
        sealed.extend_from_slice(&ciphertext);

        let commitment: [u8; 32] = Sha256::digest(&plaintext).into();
        let nullifier = request.spending_key.map(|sk| {
            let mut h = Sha256::new();
            h.update(commitment);
            h.update(sk.secret_bytes());
            hex::encode(h.finalize())
        });

        Ok(SealedNote {
            ephemeral_public_key: hex::encode(ephemeral_pub),
            ciphertext: hex::encode(sealed),
            commitment: hex::encode(commitment),
            nullifier,
        })
    }
}

/// Reject memos that do not fit the fixed note slot.
pub fn check_memo(memo: &str) -> Result<(), TxError> {
    if memo.len() > MEMO_SIZE {
        return Err(TxError::MemoTooLarge {
            len: memo.len(),
            max: MEMO_SIZE,
        });
    }
    Ok(())
}

fn encode_plaintext(value: u64, rcm: &[u8; RCM_SIZE], memo: &str) -> Result<Vec<u8>, TxError> {
    check_memo(memo)?;
    let mut out = Vec::with_capacity(NOTE_PLAINTEXT_SIZE);
    out.extend_from_slice(&value.to_le_bytes());
    out.extend_from_slice(rcm);
    // check_memo bounds the length to MEMO_SIZE.
    out.extend_from_slice(&(memo.len() as u16).to_le_bytes());
    out.extend_from_slice(memo.as_bytes());
    out.resize(NOTE_PLAINTEXT_SIZE, 0);
    Ok(out)
}

fn decode_plaintext(plaintext: &[u8]) -> Result<NotePlaintext, TxError> {
    let mut value = [0u8; 8];
    value.copy_from_slice(&plaintext[..8]);
    let mut rcm = [0u8; RCM_SIZE];
    rcm.copy_from_slice(&plaintext[8..8 + RCM_SIZE]);

    let mut len = [0u8; 2];
    len.copy_from_slice(&plaintext[MEMO_LEN_OFFSET..MEMO_OFFSET]);
    let memo_len = u16::from_le_bytes(len) as usize;
    if memo_len > MEMO_SIZE {
        return Err(TxError::Parse(format!("note memo length {} exceeds {}", memo_len, MEMO_SIZE)));
    }
    let memo = String::from_utf8(plaintext[MEMO_OFFSET..MEMO_OFFSET + memo_len].to_vec())
        .map_err(|e| TxError::Parse(e.to_string()))?;

    Ok(NotePlaintext {
        value: u64::from_le_bytes(value),
        rcm,
        memo,
    })
}

fn note_key(shared: &SharedSecret, ephemeral_pub: &[u8]) -> Result<[u8; 32], TxError> {
    let hk = Hkdf::<Sha256>::new(Some(ephemeral_pub), &shared.secret_bytes());
    let mut key = [0u8; 32];
    hk.expand(NOTE_KEY_INFO, &mut key)
        .map_err(|e| TxError::Encryption(e.to_string()))?;
    Ok(key)
}

#[allow(deprecated)] // aes-gcm 0.10 uses generic-array 0.x
fn aes_seal(key: &[u8; 32], nonce: &[u8], plaintext: &[u8]) -> Result<Vec<u8>, TxError> {
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key));
    cipher
        .encrypt(Nonce::from_slice(nonce), plaintext)
        .map_err(|e| TxError::Encryption(e.to_string()))
}

#[allow(deprecated)]
fn aes_open(key: &[u8; 32], nonce: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>, TxError> {
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key));
    cipher
        .decrypt(Nonce::from_slice(nonce), ciphertext)
        .map_err(|_| TxError::Encryption("note authentication failed".into()))
}

fn random_secret_key<R: RngCore>(rng: &mut R) -> SecretKey {
    loop {
        let mut bytes = [0u8; 32];
        rng.fill_bytes(&mut bytes);
        // Out-of-range scalars occur with probability ~2^-128.
        if let Ok(sk) = SecretKey::from_slice(&bytes) {
            return sk;
        }
    }
}
