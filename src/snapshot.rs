//! Persisted snapshot format.
//!
//! Wire format v1:
//! [version=1:1B][salt:16B][note count:4B BE]
//! per note, ordered ascending by title bytes:
//!   [title len:4B BE][title][nonce:12B][ct len:4B BE][ciphertext][tag:16B]
//! [rollback tag:32B]
//!
//! Every variable-length field is length-prefixed and notes are strictly
//! ordered, so each byte sequence has exactly one parse. The checksum in
//! [`crate::rollback`] is computed over everything except the trailing
//! rollback tag.

use crate::error::StoreError;
use crate::rollback::RollbackTag;
use crate::types::{
    NONCE_LENGTH, ROLLBACK_TAG_LENGTH, SALT_LENGTH, SNAPSHOT_VERSION, SUPPORTED_SNAPSHOT_VERSIONS,
    TAG_LENGTH,
};

/// A single note as persisted: nonce, ciphertext, and AEAD tag.
///
/// The title is not stored here; it travels alongside in the snapshot and
/// is bound into the tag as associated data at encryption time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedNote {
    pub nonce: [u8; NONCE_LENGTH],
    pub ciphertext: Vec<u8>,
    pub tag: [u8; TAG_LENGTH],
}

/// The full persisted state of a store: salt, encrypted notes, checksum.
#[derive(Debug, Clone)]
pub struct StoreSnapshot {
    pub salt: [u8; SALT_LENGTH],
    /// Ordered ascending by title bytes.
    pub notes: Vec<(String, EncryptedNote)>,
    pub tag: RollbackTag,
}

impl StoreSnapshot {
    /// Canonical encoding of everything except the trailing rollback tag.
    /// This is the exact input the snapshot checksum is computed over.
    pub fn body_bytes(&self) -> Vec<u8> {
        encode_body(&self.salt, &self.notes)
    }

    /// Serialize the snapshot to its canonical byte encoding.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = self.body_bytes();
        out.extend_from_slice(self.tag.as_bytes());
        out
    }

    /// Parse a snapshot from its canonical byte encoding.
    pub fn from_bytes(data: &[u8]) -> Result<Self, StoreError> {
        let mut r = Reader::new(data);

        let version = r.take(1)?[0];
        if !SUPPORTED_SNAPSHOT_VERSIONS.contains(&version) {
            return Err(StoreError::MalformedSnapshot(format!(
                "unsupported snapshot version {}",
                version
            )));
        }

        let mut salt = [0u8; SALT_LENGTH];
        salt.copy_from_slice(r.take(SALT_LENGTH)?);

        let count = r.read_u32()? as usize;
        let mut notes = Vec::with_capacity(count.min(1024));
        let mut prev_title: Option<String> = None;
        for _ in 0..count {
            let title_len = r.read_u32()? as usize;
            let title = std::str::from_utf8(r.take(title_len)?)
                .map_err(|_| StoreError::MalformedSnapshot("title is not valid UTF-8".into()))?
                .to_owned();
            if let Some(prev) = &prev_title {
                if title.as_bytes() <= prev.as_bytes() {
                    return Err(StoreError::MalformedSnapshot(
                        "titles out of order or duplicated".into(),
                    ));
                }
            }

            let mut nonce = [0u8; NONCE_LENGTH];
            nonce.copy_from_slice(r.take(NONCE_LENGTH)?);

            let ct_len = r.read_u32()? as usize;
            let ciphertext = r.take(ct_len)?.to_vec();

            let mut tag = [0u8; TAG_LENGTH];
            tag.copy_from_slice(r.take(TAG_LENGTH)?);

            prev_title = Some(title.clone());
            notes.push((
                title,
                EncryptedNote {
                    nonce,
                    ciphertext,
                    tag,
                },
            ));
        }

        let mut tag_bytes = [0u8; ROLLBACK_TAG_LENGTH];
        tag_bytes.copy_from_slice(r.take(ROLLBACK_TAG_LENGTH)?);

        if !r.is_empty() {
            return Err(StoreError::MalformedSnapshot(format!(
                "{} trailing bytes after rollback tag",
                r.remaining()
            )));
        }

        Ok(Self {
            salt,
            notes,
            tag: RollbackTag::from_bytes(tag_bytes),
        })
    }
}

/// Encode the checksum-covered portion of a snapshot.
pub(crate) fn encode_body(salt: &[u8; SALT_LENGTH], notes: &[(String, EncryptedNote)]) -> Vec<u8> {
    let mut out = Vec::with_capacity(
        1 + SALT_LENGTH
            + 4
            + notes
                .iter()
                .map(|(t, n)| 4 + t.len() + NONCE_LENGTH + 4 + n.ciphertext.len() + TAG_LENGTH)
                .sum::<usize>(),
    );
    out.push(SNAPSHOT_VERSION);
    out.extend_from_slice(salt);
    out.extend_from_slice(&(notes.len() as u32).to_be_bytes());
    for (title, note) in notes {
        out.extend_from_slice(&(title.len() as u32).to_be_bytes());
        out.extend_from_slice(title.as_bytes());
        out.extend_from_slice(&note.nonce);
        out.extend_from_slice(&(note.ciphertext.len() as u32).to_be_bytes());
        out.extend_from_slice(&note.ciphertext);
        out.extend_from_slice(&note.tag);
    }
    out
}

struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], StoreError> {
        if self.remaining() < n {
            return Err(StoreError::MalformedSnapshot(format!(
                "truncated: wanted {} bytes, {} left",
                n,
                self.remaining()
            )));
        }
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn read_u32(&mut self) -> Result<u32, StoreError> {
        let bytes = self.take(4)?;
        Ok(u32::from_be_bytes(bytes.try_into().expect("slice is exactly 4 bytes")))
    }

    fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn is_empty(&self) -> bool {
        self.remaining() == 0
    }
}
