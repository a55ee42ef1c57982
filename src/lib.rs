//! Local encrypted note store.
//!
//! Notes (title + body) are encrypted at rest and two tampering classes
//! are detected before any data is trusted:
//!
//! - **swap attacks**: each note's title is bound into its AEAD tag as
//!   associated data, so a ciphertext moved under a different title fails
//!   decryption ([`cipher`]);
//! - **rollback attacks**: an HMAC checksum over the whole snapshot is
//!   compared against the last tag the session sealed, so a stale but
//!   previously valid snapshot is rejected within a running session
//!   ([`rollback`]).
//!
//! The master key is derived from the password with PBKDF2 and expanded
//! into independent encryption and integrity sub-keys ([`kdf`]).
//! [`store::NoteStore`] orchestrates the three; persistence of the
//! serialized [`snapshot::StoreSnapshot`] is left to the caller.

pub mod cipher;
pub mod error;
pub mod kdf;
pub mod rollback;
pub mod snapshot;
pub mod store;
pub mod types;

pub use cipher::NoteCipher;
pub use error::StoreError;
pub use kdf::{derive_master_key, MasterKey, SubKey, DEFAULT_ITERATIONS};
pub use rollback::{RollbackGuard, RollbackTag};
pub use snapshot::{EncryptedNote, StoreSnapshot};
pub use store::NoteStore;
pub use types::{MAX_NOTE_LEN, NONCE_LENGTH, ROLLBACK_TAG_LENGTH, SALT_LENGTH, TAG_LENGTH};
