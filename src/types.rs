/// Snapshot wire format version.
///
/// Version 1: [version:1B][salt:16B][note count:4B BE]
///            per note: [title len:4B BE][title][nonce:12B][ct len:4B BE][ct][tag:16B]
///            [rollback tag:32B]
pub const SNAPSHOT_VERSION: u8 = 1;

/// Supported snapshot versions (for decoding).
pub const SUPPORTED_SNAPSHOT_VERSIONS: &[u8] = &[1];

/// AES-GCM nonce length in bytes (96 bits per NIST recommendation).
pub const NONCE_LENGTH: usize = 12;

/// AES-GCM authentication tag length in bytes (128 bits).
pub const TAG_LENGTH: usize = 16;

/// Key length in bytes (256 bits) for the master key and both sub-keys.
pub const KEY_LENGTH: usize = 32;

/// PBKDF2 salt length in bytes. Generated once at store creation and
/// persisted with the snapshot; never regenerated for an existing store.
pub const SALT_LENGTH: usize = 16;

/// HMAC-SHA256 rollback tag length in bytes.
pub const ROLLBACK_TAG_LENGTH: usize = 32;

/// Maximum note body length in bytes.
pub const MAX_NOTE_LEN: usize = 2048;
