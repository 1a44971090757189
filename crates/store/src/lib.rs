//! Namespaced, encrypted key/value store.
//!
//! Every key except the two reserved, unnamespaced keys `title` and
//! `subtitle` is written under the namespace derived from that pair (see
//! [`hackare_crypto::derive_namespace`]) and encrypted with either an
//! externally supplied master key for that namespace or, absent one, a
//! deterministic fallback key derived straight from the namespace string.
//! Reading or writing under the fallback key publishes a warning on the
//! event bus's `fallback-namespace` topic — callers should surface that as
//! a "these settings are not encrypted under a passphrase" notice.

pub mod error;

use std::{
    collections::HashMap,
    fs::{self, File, OpenOptions},
    io::{Read, Write},
    path::{Path, PathBuf},
    sync::RwLock,
};

pub use error::StoreError;
use hackare_common::event_bus::{topic, EventBus};
use serde_json::Value;
use tracing::warn;

const TITLE_KEY: &str = "title";
const SUBTITLE_KEY: &str = "subtitle";

/// File-backed, namespace-isolated settings store.
pub struct NamespacedStore {
    base_dir: PathBuf,
    namespace: RwLock<Option<String>>,
    master_keys: RwLock<HashMap<String, [u8; 32]>>,
    events: EventBus,
}

impl NamespacedStore {
    pub fn new(base_dir: PathBuf, events: EventBus) -> Self {
        Self {
            base_dir,
            namespace: RwLock::new(None),
            master_keys: RwLock::new(HashMap::new()),
            events,
        }
    }

    /// Set the active namespace, derived by the caller from `(title,
    /// subtitle)` via [`hackare_crypto::derive_namespace`].
    pub fn set_namespace(&self, namespace: String) {
        let mut guard = self.namespace.write().unwrap_or_else(|e| e.into_inner());
        *guard = Some(namespace);
    }

    /// Install the password-derived master key for a namespace. Until this
    /// is called for a given namespace, reads and writes there fall back to
    /// [`hackare_crypto::fallback_key`] and are flagged on the event bus.
    pub fn set_master_key(&self, namespace: &str, key: [u8; 32]) {
        let mut guard = self.master_keys.write().unwrap_or_else(|e| e.into_inner());
        guard.insert(namespace.to_string(), key);
    }

    fn key_for_namespace(&self, namespace: &str) -> [u8; 32] {
        if let Some(key) = self
            .master_keys
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(namespace)
        {
            return *key;
        }
        warn!(namespace, "no master key installed, using fallback namespace key");
        self.events.publish(
            topic::FALLBACK_NAMESPACE,
            serde_json::json!({ "namespace": namespace }),
        );
        hackare_crypto::fallback_key(namespace)
    }

    fn current_namespace(&self) -> Option<String> {
        self.namespace.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn path_for_reserved(&self, key: &str) -> PathBuf {
        self.base_dir.join(format!("hackare_{key}"))
    }

    fn path_for_namespaced(&self, namespace: &str, key: &str) -> PathBuf {
        self.base_dir.join(format!("hackare_{namespace}_{}", sanitize(key)))
    }

    /// Read a key. `title`/`subtitle` are read back as plain JSON strings;
    /// every other key requires an active namespace and is decrypted.
    pub async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        if key == TITLE_KEY || key == SUBTITLE_KEY {
            let path = self.path_for_reserved(key);
            return read_plain(path).await;
        }

        let namespace = self.current_namespace().ok_or_else(|| {
            StoreError::Lock("no namespace set, call set_namespace first".to_string())
        })?;
        let path = self.path_for_namespaced(&namespace, key);
        let sealed = match read_bytes(path).await? {
            Some(bytes) => bytes,
            None => return Ok(None),
        };

        let crypto_key = self.key_for_namespace(&namespace);
        match hackare_crypto::xchacha20::open(&crypto_key, &sealed) {
            Some(plaintext) => Ok(Some(serde_json::from_slice(&plaintext)?)),
            None => Err(StoreError::DecryptFailed(key.to_string())),
        }
    }

    /// Write a key. See [`Self::get`] for the reserved-key/namespace split.
    pub async fn set(&self, key: &str, value: &Value) -> Result<(), StoreError> {
        if key == TITLE_KEY || key == SUBTITLE_KEY {
            let path = self.path_for_reserved(key);
            let plaintext = serde_json::to_vec(value)?;
            return write_bytes(path, plaintext).await;
        }

        let namespace = self.current_namespace().ok_or_else(|| {
            StoreError::Lock("no namespace set, call set_namespace first".to_string())
        })?;
        let path = self.path_for_namespaced(&namespace, key);
        let plaintext = serde_json::to_vec(value)?;
        let crypto_key = self.key_for_namespace(&namespace);
        let sealed = hackare_crypto::xchacha20::seal(&crypto_key, &plaintext)
            .map_err(|e| StoreError::Lock(e.to_string()))?;
        write_bytes(path, sealed).await
    }

    /// Remove a key, if present.
    pub async fn remove(&self, key: &str) -> Result<(), StoreError> {
        let path = if key == TITLE_KEY || key == SUBTITLE_KEY {
            self.path_for_reserved(key)
        } else {
            let namespace = self.current_namespace().ok_or_else(|| {
                StoreError::Lock("no namespace set, call set_namespace first".to_string())
            })?;
            self.path_for_namespaced(&namespace, key)
        };

        tokio::task::spawn_blocking(move || -> Result<(), StoreError> {
            match fs::remove_file(&path) {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
                Err(e) => Err(e.into()),
            }
        })
        .await
        .map_err(|e| StoreError::Lock(e.to_string()))?
    }
}

fn sanitize(key: &str) -> String {
    key.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .collect()
}

async fn read_plain(path: PathBuf) -> Result<Option<Value>, StoreError> {
    let bytes = read_bytes(path).await?;
    match bytes {
        Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        None => Ok(None),
    }
}

async fn read_bytes(path: PathBuf) -> Result<Option<Vec<u8>>, StoreError> {
    tokio::task::spawn_blocking(move || -> Result<Option<Vec<u8>>, StoreError> {
        if !path.exists() {
            return Ok(None);
        }
        let file = File::open(&path)?;
        let mut lock = fd_lock::RwLock::new(file);
        let mut guard = lock
            .read()
            .map_err(|e| StoreError::Lock(format!("lock failed: {e}")))?;
        let mut buf = Vec::new();
        guard.read_to_end(&mut buf)?;
        Ok(Some(buf))
    })
    .await
    .map_err(|e| StoreError::Lock(e.to_string()))?
}

async fn write_bytes(path: PathBuf, bytes: Vec<u8>) -> Result<(), StoreError> {
    tokio::task::spawn_blocking(move || -> Result<(), StoreError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).write(true).truncate(true).open(&path)?;
        let mut lock = fd_lock::RwLock::new(file);
        let mut guard = lock
            .write()
            .map_err(|e| StoreError::Lock(format!("lock failed: {e}")))?;
        guard.write_all(&bytes)?;
        Ok(())
    })
    .await
    .map_err(|e| StoreError::Lock(e.to_string()))?
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use hackare_common::event_bus::EventBus;
    use tempfile::tempdir;

    use super::*;

    fn store() -> (tempfile::TempDir, NamespacedStore) {
        let dir = tempdir().unwrap();
        let store = NamespacedStore::new(dir.path().to_path_buf(), EventBus::default());
        (dir, store)
    }

    #[tokio::test]
    async fn reserved_keys_round_trip_unencrypted() {
        let (_dir, store) = store();
        store.set(TITLE_KEY, &serde_json::json!("hacka.re")).await.unwrap();
        assert_eq!(
            store.get(TITLE_KEY).await.unwrap(),
            Some(serde_json::json!("hacka.re"))
        );
    }

    #[tokio::test]
    async fn namespaced_key_requires_namespace() {
        let (_dir, store) = store();
        let err = store.set("apiKey", &serde_json::json!("sk-x")).await.unwrap_err();
        assert!(matches!(err, StoreError::Lock(_)));
    }

    #[tokio::test]
    async fn namespaced_key_round_trips_via_fallback_key() {
        let (_dir, store) = store();
        store.set_namespace("ns1".to_string());
        store.set("apiKey", &serde_json::json!("sk-x")).await.unwrap();
        assert_eq!(
            store.get("apiKey").await.unwrap(),
            Some(serde_json::json!("sk-x"))
        );
    }

    #[tokio::test]
    async fn namespace_isolation_prevents_cross_namespace_reads() {
        let (_dir, store) = store();

        store.set_namespace("ns-a".to_string());
        store.set("apiKey", &serde_json::json!("secret-a")).await.unwrap();

        store.set_namespace("ns-b".to_string());
        assert_eq!(store.get("apiKey").await.unwrap(), None);
    }

    #[tokio::test]
    async fn master_key_changes_ciphertext_but_not_semantics() {
        let (_dir, store) = store();
        store.set_namespace("ns1".to_string());
        store.set_master_key("ns1", [7u8; 32]);
        store.set("apiKey", &serde_json::json!("sk-x")).await.unwrap();
        assert_eq!(
            store.get("apiKey").await.unwrap(),
            Some(serde_json::json!("sk-x"))
        );
    }

    #[tokio::test]
    async fn wrong_master_key_fails_to_decrypt() {
        let (_dir, store) = store();
        store.set_namespace("ns1".to_string());
        store.set_master_key("ns1", [7u8; 32]);
        store.set("apiKey", &serde_json::json!("sk-x")).await.unwrap();

        store.set_master_key("ns1", [9u8; 32]);
        let err = store.get("apiKey").await.unwrap_err();
        assert!(matches!(err, StoreError::DecryptFailed(_)));
    }

    #[tokio::test]
    async fn missing_key_returns_none() {
        let (_dir, store) = store();
        store.set_namespace("ns1".to_string());
        assert_eq!(store.get("nope").await.unwrap(), None);
    }

    #[tokio::test]
    async fn remove_is_idempotent() {
        let (_dir, store) = store();
        store.set_namespace("ns1".to_string());
        store.set("apiKey", &serde_json::json!("sk-x")).await.unwrap();
        store.remove("apiKey").await.unwrap();
        assert_eq!(store.get("apiKey").await.unwrap(), None);
        store.remove("apiKey").await.unwrap();
    }
}
