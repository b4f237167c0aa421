//! Tests for MemoryStore
//!
//! These tests verify:
//! - Reads after writes are served from memory
//! - Misses are cached like hits
//! - delete / delete_all drop cache entries
//! - The cache never runs ahead of the wrapped store
//! - Listener forwarding to the wrapped DiskStore

use std::fs;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use shelfkv::{
    BincodeSerializer, DiskStore, Durability, MemoryStore, Serializer, ShelfError, Storage,
};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

/// Storage wrapper counting calls into the wrapped store
struct CountingStore<S> {
    inner: S,
    reads: AtomicUsize,
    writes: AtomicUsize,
    deletes: AtomicUsize,
}

impl<S> CountingStore<S> {
    fn new(inner: S) -> Self {
        Self {
            inner,
            reads: AtomicUsize::new(0),
            writes: AtomicUsize::new(0),
            deletes: AtomicUsize::new(0),
        }
    }

    fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn deletes(&self) -> usize {
        self.deletes.load(Ordering::SeqCst)
    }
}

impl<V, S: Storage<V>> Storage<V> for CountingStore<S> {
    fn write(&self, key: &str, value: &V, durability: Durability) -> shelfkv::Result<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.write(key, value, durability)
    }

    fn read(&self, key: &str, durability: Durability) -> shelfkv::Result<Option<V>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.inner.read(key, durability)
    }

    fn exist(&self, key: &str) -> shelfkv::Result<bool> {
        self.inner.exist(key)
    }

    fn delete(&self, key: &str) -> shelfkv::Result<()> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        self.inner.delete(key)
    }

    fn delete_all(&self) -> shelfkv::Result<()> {
        self.inner.delete_all()
    }
}

type Disk = DiskStore<String, BincodeSerializer>;

fn setup_counted_store() -> (TempDir, MemoryStore<String, CountingStore<Disk>>) {
    let temp_dir = TempDir::new().unwrap();
    let disk = DiskStore::open("cache", temp_dir.path(), BincodeSerializer::new()).unwrap();
    (temp_dir, MemoryStore::new(CountingStore::new(disk)))
}

fn s(value: &str) -> String {
    value.to_string()
}

/// UTF-8 serializer that refuses to encode "poison"
struct PickySerializer;

impl Serializer<String> for PickySerializer {
    fn serialize(&self, value: &String) -> shelfkv::Result<Vec<u8>> {
        if value == "poison" {
            return Err(ShelfError::Serialization("poisoned value".to_string()));
        }
        Ok(value.as_bytes().to_vec())
    }

    fn deserialize(&self, bytes: &[u8]) -> shelfkv::Result<String> {
        String::from_utf8(bytes.to_vec()).map_err(|e| ShelfError::Deserialization(e.to_string()))
    }
}

// =============================================================================
// Read-Through Tests
// =============================================================================

#[test]
fn test_read_after_write_is_served_from_memory() {
    let (_temp, store) = setup_counted_store();

    store.write("k", &s("v"), Durability::Safe).unwrap();

    assert_eq!(store.read("k", Durability::Safe).unwrap(), Some(s("v")));
    assert_eq!(store.read("k", Durability::Safe).unwrap(), Some(s("v")));
    assert_eq!(store.inner().reads(), 0);
    assert_eq!(store.inner().writes(), 1);
}

#[test]
fn test_first_read_goes_to_disk_then_memory() {
    let temp_dir = TempDir::new().unwrap();
    let disk: Disk = DiskStore::open("cache", temp_dir.path(), BincodeSerializer::new()).unwrap();
    disk.write("k", &s("on disk"), Durability::Safe).unwrap();
    let store: MemoryStore<String, _> = MemoryStore::new(CountingStore::new(disk));

    assert_eq!(store.read("k", Durability::Safe).unwrap(), Some(s("on disk")));
    assert_eq!(store.read("k", Durability::Safe).unwrap(), Some(s("on disk")));
    assert_eq!(store.inner().reads(), 1);
}

#[test]
fn test_miss_is_cached() {
    let (temp, store) = setup_counted_store();

    assert_eq!(store.read("k", Durability::Safe).unwrap(), None);
    assert!(store.is_cached("k"));

    // Written behind the overlay's back: the cached miss hides it
    let other: Disk = DiskStore::open("cache", temp.path(), BincodeSerializer::new()).unwrap();
    other.write("k", &s("sneaky"), Durability::Safe).unwrap();

    assert_eq!(store.read("k", Durability::Safe).unwrap(), None);
    assert_eq!(store.inner().reads(), 1);
}

#[test]
fn test_read_errors_are_not_cached() {
    let temp_dir = TempDir::new().unwrap();
    let disk: DiskStore<String, _> =
        DiskStore::open("cache", temp_dir.path(), PickySerializer).unwrap();
    fs::write(disk.record_path("k").unwrap(), [0xff, 0xfe]).unwrap();
    let store: MemoryStore<String, _> = MemoryStore::new(disk);

    let result = store.read("k", Durability::Fast);

    assert!(matches!(result, Err(ShelfError::Deserialization(_))));
    assert!(!store.is_cached("k"));
}

// =============================================================================
// Write-Through Tests
// =============================================================================

#[test]
fn test_write_replaces_cached_miss() {
    let (_temp, store) = setup_counted_store();
    assert_eq!(store.read("k", Durability::Safe).unwrap(), None);

    store.write("k", &s("now here"), Durability::Fast).unwrap();

    assert_eq!(store.read("k", Durability::Safe).unwrap(), Some(s("now here")));
    assert_eq!(store.inner().reads(), 1);
}

#[test]
fn test_failed_write_still_reads_previous_value() {
    let temp_dir = TempDir::new().unwrap();
    let disk: DiskStore<String, _> =
        DiskStore::open("cache", temp_dir.path(), PickySerializer).unwrap();
    let store: MemoryStore<String, _> = MemoryStore::new(disk);
    store.write("k", &s("good"), Durability::Safe).unwrap();

    let result = store.write("k", &s("poison"), Durability::Safe);

    assert!(matches!(result, Err(ShelfError::Serialization(_))));
    assert_eq!(store.read("k", Durability::Safe).unwrap(), Some(s("good")));
    assert_eq!(store.inner().read("k", Durability::Safe).unwrap(), Some(s("good")));
}

#[test]
fn test_failed_first_write_leaves_key_uncached() {
    let temp_dir = TempDir::new().unwrap();
    let disk: DiskStore<String, _> =
        DiskStore::open("cache", temp_dir.path(), PickySerializer).unwrap();
    let store: MemoryStore<String, _> = MemoryStore::new(disk);

    assert!(store.write("k", &s("poison"), Durability::Safe).is_err());

    assert!(!store.is_cached("k"));
    assert_eq!(store.cached_len(), 0);
}

#[test]
fn test_write_persists_to_wrapped_store() {
    let (temp, store) = setup_counted_store();

    store.write("k", &s("durable"), Durability::Safe).unwrap();

    let fresh: Disk = DiskStore::open("cache", temp.path(), BincodeSerializer::new()).unwrap();
    assert_eq!(fresh.read("k", Durability::Safe).unwrap(), Some(s("durable")));
}

// =============================================================================
// Delete Tests
// =============================================================================

#[test]
fn test_delete_clears_entry_and_rereads_from_disk() {
    let (_temp, store) = setup_counted_store();
    store.write("k", &s("v"), Durability::Safe).unwrap();

    store.delete("k").unwrap();

    assert!(!store.is_cached("k"));
    assert_eq!(store.inner().deletes(), 1);
    assert_eq!(store.read("k", Durability::Safe).unwrap(), None);
    assert_eq!(store.inner().reads(), 1);
    assert!(!store.exist("k").unwrap());
}

#[test]
fn test_delete_all_clears_memory_and_disk() {
    let (temp, store) = setup_counted_store();
    for i in 0..4 {
        store.write(&format!("k{}", i), &format!("v{}", i), Durability::Safe).unwrap();
    }
    store.read("missing", Durability::Safe).unwrap();
    assert_eq!(store.cached_len(), 5);

    store.delete_all().unwrap();

    assert_eq!(store.cached_len(), 0);
    assert!(!temp.path().join("cache").exists());
    for i in 0..4 {
        assert!(!store.exist(&format!("k{}", i)).unwrap());
    }
}

// =============================================================================
// Forwarding Tests
// =============================================================================

#[test]
fn test_exist_delegates_to_disk() {
    let (temp, store) = setup_counted_store();
    let other: Disk = DiskStore::open("cache", temp.path(), BincodeSerializer::new()).unwrap();
    other.write("k", &s("v"), Durability::Safe).unwrap();

    assert!(store.exist("k").unwrap());
}

#[test]
fn test_listener_forwarding() {
    let temp_dir = TempDir::new().unwrap();
    let disk: Disk = DiskStore::open("cache", temp_dir.path(), BincodeSerializer::new()).unwrap();
    let store: MemoryStore<String, _> = MemoryStore::new(disk);
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    store.set_listener("k", move |_: &String| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    store.write("k", &s("a"), Durability::Safe).unwrap();
    store.remove_listener("k");
    store.write("k", &s("b"), Durability::Safe).unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_put_get_use_inner_durability() {
    let temp_dir = TempDir::new().unwrap();
    let disk: Disk = DiskStore::open("cache", temp_dir.path(), BincodeSerializer::new())
        .unwrap()
        .with_durability(Durability::Fast);
    let store: MemoryStore<String, _> = MemoryStore::new(disk);

    assert_eq!(store.durability(), Durability::Fast);
    store.put("k", &s("v")).unwrap();
    assert_eq!(store.get("k").unwrap(), Some(s("v")));
}

#[test]
fn test_into_inner_returns_wrapped_store() {
    let (_temp, store) = setup_counted_store();
    store.write("k", &s("v"), Durability::Safe).unwrap();

    let counting = store.into_inner();

    assert_eq!(counting.writes(), 1);
    assert_eq!(counting.read("k", Durability::Safe).unwrap(), Some(s("v")));
}

#[test]
fn test_panicking_listener_does_not_leave_stale_entry() {
    let temp_dir = TempDir::new().unwrap();
    let disk: Disk = DiskStore::open("cache", temp_dir.path(), BincodeSerializer::new()).unwrap();
    let store: MemoryStore<String, _> = MemoryStore::new(disk);
    store.write("k", &s("old"), Durability::Safe).unwrap();
    store.set_listener("k", |_: &String| panic!("listener failed"));

    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        store.write("k", &s("new"), Durability::Safe)
    }));
    store.remove_listener("k");

    assert!(result.is_err());
    assert!(!store.is_cached("k"));
    assert_eq!(store.read("k", Durability::Safe).unwrap(), Some(s("new")));
    assert_eq!(store.inner().read("k", Durability::Safe).unwrap(), Some(s("new")));
}
