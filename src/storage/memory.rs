//! In-process storage used by tests

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use super::{Scope, Storage, StorageError};

#[derive(Default)]
pub struct MemoryStorage {
    values: Mutex<HashMap<(Scope, String), String>>,
    fail_writes: AtomicBool,
    fail_reads: AtomicBool,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following `set` return an error
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Make every following `get` return an error
    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn raw(&self, key: &str, scope: Scope) -> Option<String> {
        self.values
            .lock()
            .unwrap()
            .get(&(scope, key.to_string()))
            .cloned()
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn get(&self, key: &str, scope: Scope) -> Result<Option<String>, StorageError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable("reads disabled".to_string()));
        }
        Ok(self.raw(key, scope))
    }

    async fn set(&self, key: &str, value: &str, scope: Scope) -> Result<(), StorageError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable("writes disabled".to_string()));
        }
        self.values
            .lock()
            .unwrap()
            .insert((scope, key.to_string()), value.to_string());
        Ok(())
    }
}
