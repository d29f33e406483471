//! Key-value persistence
//!
//! The rest of the app only sees the [`Storage`] trait: an async get/set of a
//! string by key, in either the shared scope (visible to every member) or the
//! private scope (this device only). Values are JSON blobs encoded here.
//!
//! Reads never fail from the caller's point of view: a missing key, an I/O
//! error and an unparseable payload all come back as `None`. Writes report
//! success as a bool and are only logged on failure.

pub mod file;
#[cfg(test)]
pub mod memory;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};

pub use file::FileStorage;
#[cfg(test)]
pub use memory::MemoryStorage;

/// Private: this device's profile
pub const PROFILE_KEY: &str = "huddle-user";
/// Shared: voter name -> rankings
pub const VOTES_KEY: &str = "huddle-votes";
/// Shared: activity feed, newest first
pub const FEED_KEY: &str = "huddle-feed";
/// Shared: chat log, oldest first
pub const CHAT_KEY: &str = "huddle-chat";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    Shared,
    Private,
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid storage key: {0:?}")]
    InvalidKey(String),

    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait Storage: Send + Sync {
    async fn get(&self, key: &str, scope: Scope) -> Result<Option<String>, StorageError>;
    async fn set(&self, key: &str, value: &str, scope: Scope) -> Result<(), StorageError>;
}

/// Load and decode a value. Absent, unreadable and malformed all mean `None`.
pub async fn load<T: DeserializeOwned>(storage: &dyn Storage, key: &str, scope: Scope) -> Option<T> {
    let raw = match storage.get(key, scope).await {
        Ok(Some(raw)) => raw,
        Ok(None) => {
            tracing::debug!("No stored value for {}", key);
            return None;
        }
        Err(e) => {
            tracing::debug!("Storage read failed for {}: {}", key, e);
            return None;
        }
    };

    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!("Ignoring malformed value for {}: {}", key, e);
            None
        }
    }
}

/// Encode and store a value. Returns whether the write was acknowledged.
pub async fn save<T: Serialize + ?Sized>(storage: &dyn Storage, key: &str, value: &T, scope: Scope) -> bool {
    let raw = match serde_json::to_string(value) {
        Ok(raw) => raw,
        Err(e) => {
            tracing::error!("Storage: could not encode {}: {}", key, e);
            return false;
        }
    };

    match storage.set(key, &raw, scope).await {
        Ok(()) => true,
        Err(e) => {
            tracing::error!("Storage: write to {} failed: {}", key, e);
            false
        }
    }
}

/// Keys become file names, so keep them to a safe alphabet
pub fn validate_key(key: &str) -> Result<(), StorageError> {
    let valid = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(StorageError::InvalidKey(key.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::VoteMap;

    #[tokio::test]
    async fn test_load_absent_is_none() {
        let storage = MemoryStorage::new();
        let votes: Option<VoteMap> = load(&storage, VOTES_KEY, Scope::Shared).await;
        assert!(votes.is_none());
    }

    #[tokio::test]
    async fn test_load_malformed_is_none() {
        let storage = MemoryStorage::new();
        storage.set(FEED_KEY, "{not json", Scope::Shared).await.unwrap();
        let feed: Option<Vec<crate::model::FeedItem>> = load(&storage, FEED_KEY, Scope::Shared).await;
        assert!(feed.is_none());
    }

    #[tokio::test]
    async fn test_scopes_are_separate() {
        let storage = MemoryStorage::new();
        assert!(save(&storage, "k", &vec![1, 2, 3], Scope::Private).await);

        let private: Option<Vec<i32>> = load(&storage, "k", Scope::Private).await;
        let shared: Option<Vec<i32>> = load(&storage, "k", Scope::Shared).await;
        assert_eq!(private, Some(vec![1, 2, 3]));
        assert_eq!(shared, None);
    }

    #[tokio::test]
    async fn test_save_reports_failure() {
        let storage = MemoryStorage::new();
        storage.fail_writes(true);
        assert!(!save(&storage, "k", &1, Scope::Shared).await);
    }

    #[test]
    fn test_validate_key() {
        assert!(validate_key("huddle-votes").is_ok());
        assert!(validate_key("a_b-9").is_ok());
        assert!(validate_key("").is_err());
        assert!(validate_key("../etc/passwd").is_err());
        assert!(validate_key("a b").is_err());
    }
}
