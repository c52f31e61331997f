//! Key/value access to the shared ledger
//!
//! The engine only ever needs single-key reads and writes. Ordering and
//! atomicity across invocations belong to whatever substrate implements
//! [`Ledger`]; the two implementations here cover durable local storage
//! (`sled`) and an in-process map.
use super::error::LedgerError;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};

pub trait Ledger {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, LedgerError>;
    fn put(&self, key: &str, value: Vec<u8>) -> Result<(), LedgerError>;
}

impl<L: Ledger + ?Sized> Ledger for Arc<L> {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, LedgerError> {
        (**self).get(key)
    }
    fn put(&self, key: &str, value: Vec<u8>) -> Result<(), LedgerError> {
        (**self).put(key, value)
    }
}

/// Ledger state held in a named sled tree.
#[derive(Clone)]
pub struct SledLedger {
    tree: sled::Tree,
}

impl SledLedger {
    pub fn new(tree: sled::Tree) -> Self {
        Self { tree }
    }

    /// Open (or create) the database at `path` and use the tree `name`.
    pub fn open(path: impl AsRef<Path>, name: &str) -> Result<Self, LedgerError> {
        let db = sled::open(path)?;
        Ok(Self::new(db.open_tree(name)?))
    }
}

impl Ledger for SledLedger {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, LedgerError> {
        Ok(self.tree.get(key.as_bytes())?.map(|value| value.to_vec()))
    }
    fn put(&self, key: &str, value: Vec<u8>) -> Result<(), LedgerError> {
        self.tree.insert(key.as_bytes(), value)?;
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MemoryLedger {
    entries: RwLock<BTreeMap<String, Vec<u8>>>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }
    /// Number of keys held. A poisoned map is still counted.
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Ledger for MemoryLedger {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, LedgerError> {
        let entries = self.entries.read().map_err(|_| LedgerError::Poisoned)?;
        Ok(entries.get(key).cloned())
    }
    fn put(&self, key: &str, value: Vec<u8>) -> Result<(), LedgerError> {
        let mut entries = self.entries.write().map_err(|_| LedgerError::Poisoned)?;
        entries.insert(key.to_string(), value);
        Ok(())
    }
}
