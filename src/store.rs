//! Note store session: key derivation, all-or-nothing open, in-memory
//! edits, and sealed snapshots on save.
//!
//! A session owns its key material and note map; multiple independent
//! sessions (distinct passwords and snapshots) can coexist. Operations are
//! synchronous and CPU-bound; persistence of the returned snapshot bytes
//! is the caller's concern. Key material and note bodies are zeroized when
//! the session is dropped.

use std::collections::BTreeMap;

use tracing::debug;
use zeroize::Zeroizing;

use crate::cipher::NoteCipher;
use crate::error::StoreError;
use crate::kdf::{derive_master_key, generate_salt, DEFAULT_ITERATIONS};
use crate::rollback::{RollbackGuard, RollbackTag};
use crate::snapshot::StoreSnapshot;
use crate::types::{MAX_NOTE_LEN, SALT_LENGTH};

/// An open note store session.
pub struct NoteStore {
    salt: [u8; SALT_LENGTH],
    cipher: NoteCipher,
    guard: RollbackGuard,
    notes: BTreeMap<String, Zeroizing<Vec<u8>>>,
    last_tag: Option<RollbackTag>,
}

impl NoteStore {
    /// Create an empty store with a fresh random salt.
    pub fn create(password: &[u8]) -> Result<Self, StoreError> {
        Self::create_with_iterations(password, DEFAULT_ITERATIONS)
    }

    /// Create an empty store with an explicit PBKDF2 iteration count.
    ///
    /// The same count must be supplied when reopening the store.
    pub fn create_with_iterations(password: &[u8], iterations: u32) -> Result<Self, StoreError> {
        let salt = generate_salt()?;
        let master = derive_master_key(password, &salt, iterations)?;
        let store = Self {
            salt,
            cipher: NoteCipher::new(&master.encryption_key()?),
            guard: RollbackGuard::new(master.integrity_key()?),
            notes: BTreeMap::new(),
            last_tag: None,
        };
        debug!("created empty store");
        Ok(store)
    }

    /// Open a store from a persisted snapshot.
    ///
    /// Verifies the snapshot checksum, then decrypts every note under its
    /// own title. Trust is all-or-nothing: the first note that fails
    /// verification aborts the open and no data is exposed.
    pub fn open(password: &[u8], snapshot: &StoreSnapshot) -> Result<Self, StoreError> {
        Self::open_with_iterations(password, snapshot, DEFAULT_ITERATIONS)
    }

    /// Open a store that was created with an explicit iteration count.
    pub fn open_with_iterations(
        password: &[u8],
        snapshot: &StoreSnapshot,
        iterations: u32,
    ) -> Result<Self, StoreError> {
        let master = derive_master_key(password, &snapshot.salt, iterations)?;
        let guard = RollbackGuard::new(master.integrity_key()?);
        // Fresh session: no previously observed tag to compare against.
        guard.verify(snapshot, None)?;

        let mut cipher = NoteCipher::new(&master.encryption_key()?);
        let notes = decrypt_all(&mut cipher, snapshot)?;

        debug!(notes = notes.len(), "opened store");
        Ok(Self {
            salt: snapshot.salt,
            cipher,
            guard,
            notes,
            last_tag: Some(snapshot.tag.clone()),
        })
    }

    /// Fetch a note body.
    pub fn get(&self, title: &str) -> Result<&[u8], StoreError> {
        self.notes
            .get(title)
            .map(|body| body.as_slice())
            .ok_or_else(|| StoreError::NotFound {
                title: title.to_owned(),
            })
    }

    /// Insert or overwrite a note. In-memory only until [`save`](Self::save).
    pub fn set(&mut self, title: &str, body: &[u8]) -> Result<(), StoreError> {
        if body.len() > MAX_NOTE_LEN {
            return Err(StoreError::NoteTooLong {
                max: MAX_NOTE_LEN,
                got: body.len(),
            });
        }
        self.notes
            .insert(title.to_owned(), Zeroizing::new(body.to_vec()));
        Ok(())
    }

    /// Remove a note. In-memory only until [`save`](Self::save).
    pub fn delete(&mut self, title: &str) -> Result<(), StoreError> {
        self.notes
            .remove(title)
            .map(drop)
            .ok_or_else(|| StoreError::NotFound {
                title: title.to_owned(),
            })
    }

    /// Re-encrypt every note with a fresh nonce, seal the snapshot, and
    /// return it for the caller to persist. The sealed tag becomes this
    /// session's freshness reference.
    pub fn save(&mut self) -> Result<StoreSnapshot, StoreError> {
        let mut encrypted = Vec::with_capacity(self.notes.len());
        for (title, body) in &self.notes {
            encrypted.push((title.clone(), self.cipher.encrypt(title, body)?));
        }
        let tag = self.guard.seal(&self.salt, &encrypted);
        self.last_tag = Some(tag.clone());
        debug!(notes = encrypted.len(), "sealed snapshot");
        Ok(StoreSnapshot {
            salt: self.salt,
            notes: encrypted,
            tag,
        })
    }

    /// Replace the in-memory notes from externally persisted bytes within
    /// the same session.
    ///
    /// On top of the checksum check, the snapshot's tag must equal the
    /// last tag this session sealed or accepted; a previously valid but
    /// stale snapshot is reported as [`StoreError::RollbackDetected`].
    pub fn reload(&mut self, snapshot: &StoreSnapshot) -> Result<(), StoreError> {
        self.guard.verify(snapshot, self.last_tag.as_ref())?;
        let notes = decrypt_all(&mut self.cipher, snapshot)?;
        debug!(notes = notes.len(), "reloaded store");
        self.notes = notes;
        self.last_tag = Some(snapshot.tag.clone());
        Ok(())
    }

    /// The store's persistent salt.
    pub fn salt(&self) -> &[u8; SALT_LENGTH] {
        &self.salt
    }

    /// Number of notes currently in memory.
    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    /// Titles currently in memory, in ascending order.
    pub fn titles(&self) -> impl Iterator<Item = &str> {
        self.notes.keys().map(String::as_str)
    }
}

/// Decrypt every note in a snapshot under its own title, recording the
/// snapshot's nonces in the cipher's session history.
fn decrypt_all(
    cipher: &mut NoteCipher,
    snapshot: &StoreSnapshot,
) -> Result<BTreeMap<String, Zeroizing<Vec<u8>>>, StoreError> {
    let mut notes = BTreeMap::new();
    for (title, note) in &snapshot.notes {
        let body = cipher.decrypt(title, note)?;
        cipher.observe_nonce(note.nonce);
        notes.insert(title.clone(), body);
    }
    Ok(notes)
}
