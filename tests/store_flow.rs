//! End-to-end store flows over the serialized snapshot encoding, the way a
//! persistence layer would drive the core.

use notelock::{NoteStore, StoreError, StoreSnapshot};

const TEST_ITERATIONS: u32 = 1_000;

#[test]
fn end_to_end_over_serialized_bytes() {
    let mut session1 = NoteStore::create_with_iterations(b"p@ss", TEST_ITERATIONS).unwrap();
    session1.set("diary", b"hello").unwrap();
    let bytes = session1.save().unwrap().to_bytes();

    // A later session gets only the password and the persisted blob.
    let snapshot = StoreSnapshot::from_bytes(&bytes).unwrap();
    let session2 = NoteStore::open_with_iterations(b"p@ss", &snapshot, TEST_ITERATIONS).unwrap();
    assert_eq!(session2.get("diary").unwrap(), b"hello");
}

#[test]
fn every_persisted_byte_is_covered() {
    let mut store = NoteStore::create_with_iterations(b"p@ss", TEST_ITERATIONS).unwrap();
    store.set("diary", b"hello").unwrap();
    store.set("todo", b"buy milk").unwrap();
    let bytes = store.save().unwrap().to_bytes();

    for i in 0..bytes.len() {
        let mut corrupted = bytes.clone();
        corrupted[i] ^= 0x01;
        let outcome = StoreSnapshot::from_bytes(&corrupted)
            .and_then(|s| NoteStore::open_with_iterations(b"p@ss", &s, TEST_ITERATIONS).map(drop));
        assert!(outcome.is_err(), "corruption at byte {} accepted", i);
    }
}

#[test]
fn deletion_survives_persistence() {
    let mut store = NoteStore::create_with_iterations(b"p@ss", TEST_ITERATIONS).unwrap();
    store.set("keep", b"kept").unwrap();
    store.set("drop", b"dropped").unwrap();
    store.save().unwrap();
    store.delete("drop").unwrap();
    let bytes = store.save().unwrap().to_bytes();

    let snapshot = StoreSnapshot::from_bytes(&bytes).unwrap();
    let reopened = NoteStore::open_with_iterations(b"p@ss", &snapshot, TEST_ITERATIONS).unwrap();
    assert_eq!(reopened.len(), 1);
    assert_eq!(reopened.get("keep").unwrap(), b"kept");
    assert!(matches!(
        reopened.get("drop"),
        Err(StoreError::NotFound { .. })
    ));
}

#[test]
fn rolled_back_blob_is_rejected_within_session() {
    let mut store = NoteStore::create_with_iterations(b"p@ss", TEST_ITERATIONS).unwrap();
    store.set("diary", b"original").unwrap();
    let old_bytes = store.save().unwrap().to_bytes();

    store.set("diary", b"amended").unwrap();
    let new_bytes = store.save().unwrap().to_bytes();

    // An adversary swaps the persisted file back to the older blob.
    let stale = StoreSnapshot::from_bytes(&old_bytes).unwrap();
    assert!(matches!(
        store.reload(&stale),
        Err(StoreError::RollbackDetected)
    ));

    let current = StoreSnapshot::from_bytes(&new_bytes).unwrap();
    store.reload(&current).unwrap();
    assert_eq!(store.get("diary").unwrap(), b"amended");
}

#[test]
fn empty_store_round_trips() {
    let mut store = NoteStore::create_with_iterations(b"p@ss", TEST_ITERATIONS).unwrap();
    let bytes = store.save().unwrap().to_bytes();
    let snapshot = StoreSnapshot::from_bytes(&bytes).unwrap();
    let reopened = NoteStore::open_with_iterations(b"p@ss", &snapshot, TEST_ITERATIONS).unwrap();
    assert!(reopened.is_empty());
}

#[test]
fn unicode_titles_and_binary_bodies() {
    let mut store = NoteStore::create_with_iterations(b"p@ss", TEST_ITERATIONS).unwrap();
    let body: Vec<u8> = (0..=255u8).collect();
    store.set("日記 📓", &body).unwrap();
    let bytes = store.save().unwrap().to_bytes();

    let snapshot = StoreSnapshot::from_bytes(&bytes).unwrap();
    let reopened = NoteStore::open_with_iterations(b"p@ss", &snapshot, TEST_ITERATIONS).unwrap();
    assert_eq!(reopened.get("日記 📓").unwrap(), &body[..]);
}
