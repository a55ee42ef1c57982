//! AES-256-GCM note encryption with the title bound as associated data.
//!
//! The title is authenticated but not encrypted: moving a ciphertext under
//! a different title changes the AAD and fails verification, so a swap
//! attack surfaces as [`StoreError::IntegrityViolation`] instead of silent
//! misdelivery.

use std::collections::HashSet;

use aes_gcm::aead::{Aead, KeyInit, Payload};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use zeroize::Zeroizing;

use crate::error::StoreError;
use crate::kdf::SubKey;
use crate::snapshot::EncryptedNote;
use crate::types::{NONCE_LENGTH, TAG_LENGTH};

/// Build AAD from a note title.
/// Format: [4 bytes: title length (u32 BE)][title UTF-8]
fn build_aad(title: &str) -> Vec<u8> {
    let title_bytes = title.as_bytes();
    let mut aad = Vec::with_capacity(4 + title_bytes.len());
    aad.extend_from_slice(&(title_bytes.len() as u32).to_be_bytes());
    aad.extend_from_slice(title_bytes);
    aad
}

/// Per-session note cipher.
///
/// Tracks every nonce generated or observed under its key; a repeat within
/// the session is refused rather than encrypted with.
pub struct NoteCipher {
    cipher: Aes256Gcm,
    seen_nonces: HashSet<[u8; NONCE_LENGTH]>,
}

impl NoteCipher {
    pub fn new(key: &SubKey) -> Self {
        Self {
            // SubKey is always KEY_LENGTH bytes, so this cannot panic.
            cipher: Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.as_bytes())),
            seen_nonces: HashSet::new(),
        }
    }

    /// Record a nonce already in use under this key (e.g. from a loaded
    /// snapshot) so it is never drawn again this session.
    pub fn observe_nonce(&mut self, nonce: [u8; NONCE_LENGTH]) {
        self.seen_nonces.insert(nonce);
    }

    fn fresh_nonce(&mut self) -> Result<[u8; NONCE_LENGTH], StoreError> {
        let mut nonce = [0u8; NONCE_LENGTH];
        getrandom::getrandom(&mut nonce).map_err(|e| StoreError::RngFailed(e.to_string()))?;
        if !self.seen_nonces.insert(nonce) {
            return Err(StoreError::NonceReuse);
        }
        Ok(nonce)
    }

    /// Encrypt a note body under its title with a fresh random nonce.
    pub fn encrypt(&mut self, title: &str, body: &[u8]) -> Result<EncryptedNote, StoreError> {
        let nonce_bytes = self.fresh_nonce()?;
        let nonce = Nonce::from_slice(&nonce_bytes);
        let aad = build_aad(title);

        let mut output = self
            .cipher
            .encrypt(
                nonce,
                Payload {
                    msg: body,
                    aad: &aad,
                },
            )
            .map_err(|e| StoreError::EncryptionFailed(e.to_string()))?;

        // The aead crate appends the 16-byte tag to the ciphertext.
        let split = output.len() - TAG_LENGTH;
        let tag_bytes = output.split_off(split);
        let mut tag = [0u8; TAG_LENGTH];
        tag.copy_from_slice(&tag_bytes);

        Ok(EncryptedNote {
            nonce: nonce_bytes,
            ciphertext: output,
            tag,
        })
    }

    /// Decrypt a note body, verifying it was encrypted under this exact
    /// title. Verification failure yields no plaintext bytes at all.
    pub fn decrypt(
        &self,
        title: &str,
        note: &EncryptedNote,
    ) -> Result<Zeroizing<Vec<u8>>, StoreError> {
        let nonce = Nonce::from_slice(&note.nonce);
        let aad = build_aad(title);

        let mut joined = Vec::with_capacity(note.ciphertext.len() + TAG_LENGTH);
        joined.extend_from_slice(&note.ciphertext);
        joined.extend_from_slice(&note.tag);

        let plaintext = self
            .cipher
            .decrypt(
                nonce,
                Payload {
                    msg: &joined,
                    aad: &aad,
                },
            )
            .map_err(|_| StoreError::IntegrityViolation {
                title: title.to_owned(),
            })?;

        Ok(Zeroizing::new(plaintext))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kdf::derive_master_key;
    use crate::types::SALT_LENGTH;

    fn test_cipher() -> NoteCipher {
        let master = derive_master_key(b"p@ss", &[7u8; SALT_LENGTH], 1_000).unwrap();
        NoteCipher::new(&master.encryption_key().unwrap())
    }

    #[test]
    fn encrypt_decrypt_round_trip() {
        let mut cipher = test_cipher();
        let note = cipher.encrypt("diary", b"hello").unwrap();
        let plaintext = cipher.decrypt("diary", &note).unwrap();
        assert_eq!(&plaintext[..], b"hello");
    }

    #[test]
    fn empty_body_round_trip() {
        let mut cipher = test_cipher();
        let note = cipher.encrypt("diary", b"").unwrap();
        assert!(cipher.decrypt("diary", &note).unwrap().is_empty());
    }

    #[test]
    fn swap_attack_detected() {
        let mut cipher = test_cipher();
        let note = cipher.encrypt("A", b"body").unwrap();
        let err = cipher.decrypt("B", &note).unwrap_err();
        assert!(matches!(
            err,
            StoreError::IntegrityViolation { title } if title == "B"
        ));
    }

    #[test]
    fn tampered_ciphertext_detected() {
        let mut cipher = test_cipher();
        let mut note = cipher.encrypt("diary", b"hello").unwrap();
        note.ciphertext[0] ^= 0x01;
        assert!(cipher.decrypt("diary", &note).is_err());
    }

    #[test]
    fn tampered_nonce_detected() {
        let mut cipher = test_cipher();
        let mut note = cipher.encrypt("diary", b"hello").unwrap();
        note.nonce[0] ^= 0x01;
        assert!(cipher.decrypt("diary", &note).is_err());
    }

    #[test]
    fn tampered_tag_detected() {
        let mut cipher = test_cipher();
        let mut note = cipher.encrypt("diary", b"hello").unwrap();
        note.tag[0] ^= 0x01;
        assert!(cipher.decrypt("diary", &note).is_err());
    }

    #[test]
    fn every_single_bit_flip_detected() {
        let mut cipher = test_cipher();
        let note = cipher.encrypt("diary", b"hi").unwrap();
        for byte in 0..note.ciphertext.len() {
            for bit in 0..8 {
                let mut corrupted = note.clone();
                corrupted.ciphertext[byte] ^= 1 << bit;
                assert!(cipher.decrypt("diary", &corrupted).is_err());
            }
        }
    }

    #[test]
    fn wrong_key_fails() {
        let mut cipher = test_cipher();
        let note = cipher.encrypt("diary", b"hello").unwrap();
        let other_master = derive_master_key(b"other", &[7u8; SALT_LENGTH], 1_000).unwrap();
        let other = NoteCipher::new(&other_master.encryption_key().unwrap());
        assert!(other.decrypt("diary", &note).is_err());
    }

    #[test]
    fn nonces_never_repeat() {
        let mut cipher = test_cipher();
        let mut seen = HashSet::new();
        for _ in 0..10_000 {
            let note = cipher.encrypt("t", b"x").unwrap();
            assert!(seen.insert(note.nonce), "nonce repeated");
        }
    }

    #[test]
    fn different_ciphertext_each_time() {
        let mut cipher = test_cipher();
        let a = cipher.encrypt("diary", b"same").unwrap();
        let b = cipher.encrypt("diary", b"same").unwrap();
        assert_ne!(a.nonce, b.nonce);
        assert_ne!(a.ciphertext, b.ciphertext);
    }

    #[test]
    fn observed_nonce_is_never_redrawn() {
        let mut cipher = test_cipher();
        let note = cipher.encrypt("diary", b"hello").unwrap();
        let mut fresh = test_cipher();
        fresh.observe_nonce(note.nonce);
        // A redraw of an observed nonce is astronomically unlikely; this
        // just checks the bookkeeping accepts external nonces.
        let again = fresh.encrypt("diary", b"hello").unwrap();
        assert_ne!(again.nonce, note.nonce);
    }

    #[test]
    fn title_aad_is_length_prefixed() {
        let aad = build_aad("diary");
        assert_eq!(&aad[..4], &5u32.to_be_bytes());
        assert_eq!(&aad[4..], b"diary");
    }
}
