use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Key derivation failed: {0}")]
    KeyDerivation(String),

    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("Integrity violation for note \"{title}\": ciphertext, nonce, or title does not match what was encrypted")]
    IntegrityViolation { title: String },

    #[error("Snapshot checksum verification failed: data has been tampered with or the password is wrong")]
    MacVerificationFailed,

    #[error("Rollback detected: snapshot is older than the last one sealed by this session")]
    RollbackDetected,

    #[error("No note found under title \"{title}\"")]
    NotFound { title: String },

    #[error("Note too long: maximum {max} bytes, got {got}")]
    NoteTooLong { max: usize, got: usize },

    #[error("Nonce reuse detected within this session")]
    NonceReuse,

    #[error("Malformed snapshot: {0}")]
    MalformedSnapshot(String),

    #[error("Random number generation failed: {0}")]
    RngFailed(String),
}
