//! Durable key-value storage for cart persistence.
//!
//! The cart is serialized wholesale into a named slot. Backends only deal in
//! raw strings; serialization and validation live in [`crate::store`].

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use thiserror::Error;

/// Storage slot keys for durable cart data.
pub mod slots {
    /// Slot holding the serialized cart state.
    pub const CART: &str = "cart";
}

/// Errors from a storage backend.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Underlying I/O failed (missing permissions, full disk, ...).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// A string-keyed durable persistence mechanism.
///
/// Slots are overwritten wholesale, never incrementally. Implementations are
/// origin-scoped in the browser sense: one data directory (or map) per
/// profile. Concurrent writers racing on a slot are accepted; the last
/// writer wins.
pub trait CartStorage {
    /// Read the raw contents of a slot. An absent slot is `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the backend cannot be read.
    fn read(&self, slot: &str) -> Result<Option<String>, StorageError>;

    /// Overwrite a slot with the given contents.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the backend cannot be written.
    fn write(&self, slot: &str, value: &str) -> Result<(), StorageError>;
}

/// File-backed storage: one JSON file per slot under a data directory.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Open (and create if missing) a storage directory.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the directory cannot be created.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn slot_path(&self, slot: &str) -> PathBuf {
        self.dir.join(format!("{slot}.json"))
    }

    /// The directory holding the slot files.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl CartStorage for FileStorage {
    fn read(&self, slot: &str) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(self.slot_path(slot)) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, slot: &str, value: &str) -> Result<(), StorageError> {
        fs::write(self.slot_path(slot), value)?;
        Ok(())
    }
}

/// In-memory storage for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    slots: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    /// Create an empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a slot with raw contents, bypassing the store. Useful for
    /// exercising load-time sanitization.
    pub fn seed(&self, slot: &str, value: &str) {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(slot.to_string(), value.to_string());
    }
}

impl CartStorage for MemoryStorage {
    fn read(&self, slot: &str) -> Result<Option<String>, StorageError> {
        Ok(self
            .slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(slot)
            .cloned())
    }

    fn write(&self, slot: &str, value: &str) -> Result<(), StorageError> {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(slot.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_file_storage_missing_slot_reads_none() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path()).unwrap();
        assert!(storage.read(slots::CART).unwrap().is_none());
    }

    #[test]
    fn test_file_storage_overwrites_wholesale() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path()).unwrap();

        storage.write(slots::CART, "{\"items\":[1]}").unwrap();
        storage.write(slots::CART, "{\"items\":[]}").unwrap();

        assert_eq!(
            storage.read(slots::CART).unwrap().as_deref(),
            Some("{\"items\":[]}")
        );
    }

    #[test]
    fn test_file_storage_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("profile").join("storefront");
        let storage = FileStorage::new(&nested).unwrap();

        storage.write(slots::CART, "{}").unwrap();
        assert!(nested.join("cart.json").exists());
    }

    #[test]
    fn test_memory_storage_roundtrip() {
        let storage = MemoryStorage::new();
        assert!(storage.read(slots::CART).unwrap().is_none());

        storage.write(slots::CART, "payload").unwrap();
        assert_eq!(storage.read(slots::CART).unwrap().as_deref(), Some("payload"));
    }
}
