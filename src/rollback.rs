//! Snapshot checksum and within-session rollback detection.
//!
//! rollbackTag = HMAC-SHA256(macKey, canonical snapshot body)
//!
//! The checksum covers the whole snapshot, so splicing one stale note into
//! an otherwise-current snapshot is rejected along with wholesale
//! tampering. Freshness is tracked per session: the guard compares an
//! incoming tag against the last tag this session sealed or accepted.
//! Without a trusted external counter, rollback across independent process
//! restarts is indistinguishable from a legitimate external edit and is
//! out of scope.

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::StoreError;
use crate::kdf::SubKey;
use crate::snapshot::{encode_body, EncryptedNote, StoreSnapshot};
use crate::types::{ROLLBACK_TAG_LENGTH, SALT_LENGTH};

type HmacSha256 = Hmac<Sha256>;

/// HMAC-SHA256 checksum over a canonical snapshot body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RollbackTag([u8; ROLLBACK_TAG_LENGTH]);

impl RollbackTag {
    pub fn from_bytes(bytes: [u8; ROLLBACK_TAG_LENGTH]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; ROLLBACK_TAG_LENGTH] {
        &self.0
    }
}

/// Seals and verifies snapshot checksums under the integrity sub-key.
pub struct RollbackGuard {
    key: SubKey,
}

impl RollbackGuard {
    pub fn new(key: SubKey) -> Self {
        Self { key }
    }

    fn mac(&self) -> HmacSha256 {
        // KEY_LENGTH key material; HMAC accepts any length.
        HmacSha256::new_from_slice(self.key.as_bytes()).expect("HMAC accepts any key length")
    }

    /// Compute the checksum over a snapshot body.
    pub fn seal(
        &self,
        salt: &[u8; SALT_LENGTH],
        notes: &[(String, EncryptedNote)],
    ) -> RollbackTag {
        let mut mac = self.mac();
        mac.update(&encode_body(salt, notes));
        let mut tag = [0u8; ROLLBACK_TAG_LENGTH];
        tag.copy_from_slice(&mac.finalize().into_bytes());
        RollbackTag(tag)
    }

    /// Verify a snapshot's checksum and, when this session has sealed or
    /// accepted a tag before, its freshness.
    ///
    /// `MacVerificationFailed` means the snapshot bytes do not match the
    /// embedded tag under this key (tampering, or a different password).
    /// `RollbackDetected` means the bytes are internally valid but carry a
    /// tag other than the last one this session observed: a previously
    /// valid, stale snapshot has been reintroduced.
    pub fn verify(
        &self,
        snapshot: &StoreSnapshot,
        last_known: Option<&RollbackTag>,
    ) -> Result<(), StoreError> {
        let mut mac = self.mac();
        mac.update(&snapshot.body_bytes());
        mac.verify_slice(snapshot.tag.as_bytes())
            .map_err(|_| StoreError::MacVerificationFailed)?;

        if let Some(last) = last_known {
            if snapshot.tag != *last {
                return Err(StoreError::RollbackDetected);
            }
        }
        Ok(())
    }
}
