//! Durable ledger stores.

use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::SystemTime;

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use sharehub_entity::share::LedgerDocument;

use crate::error::LedgerError;

/// Identity of the stored bytes, used to notice rewrites by other processes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreFingerprint {
    /// Last modification time, when the platform reports one.
    pub modified: Option<SystemTime>,
    /// Size (or generation for in-memory stores).
    pub len: u64,
}

/// Durable backing of the ledger.
#[async_trait]
pub trait LedgerStore: Send + Sync + std::fmt::Debug {
    /// Read the stored document. `None` when nothing has been stored yet.
    async fn load(&self) -> Result<Option<LedgerDocument>, LedgerError>;

    /// Overwrite the stored document, returning the fingerprint of exactly
    /// the bytes written.
    async fn save(&self, document: &LedgerDocument) -> Result<StoreFingerprint, LedgerError>;

    /// Fingerprint of the stored bytes. `None` when nothing is stored.
    async fn fingerprint(&self) -> Result<Option<StoreFingerprint>, LedgerError>;

    /// Human-readable location for logs.
    fn describe(&self) -> String;
}

/// JSON file store shared with the admin tool.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Create a store backed by `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the ledger file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "ledger".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl LedgerStore for JsonFileStore {
    async fn load(&self) -> Result<Option<LedgerDocument>, LedgerError> {
        let bytes = match fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(LedgerError::io(
                    format!("failed to read ledger {}", self.path.display()),
                    e,
                ));
            }
        };

        let document = LedgerDocument::decode(&bytes)?;
        debug!(path = %self.path.display(), shares = document.shares.len(), "Loaded ledger");
        Ok(Some(document))
    }

    async fn save(&self, document: &LedgerDocument) -> Result<StoreFingerprint, LedgerError> {
        let bytes = document.encode().map_err(LedgerError::Encode)?;
        let temp = self.temp_path();
        let context = || format!("failed to write ledger {}", self.path.display());

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| LedgerError::io(context(), e))?;
        }

        let mut file = fs::File::create(&temp)
            .await
            .map_err(|e| LedgerError::io(context(), e))?;
        file.write_all(&bytes)
            .await
            .map_err(|e| LedgerError::io(context(), e))?;
        file.sync_all()
            .await
            .map_err(|e| LedgerError::io(context(), e))?;
        // Taken before the rename so a concurrent writer cannot slip in
        // between; rename keeps both mtime and length.
        let meta = file
            .metadata()
            .await
            .map_err(|e| LedgerError::io(context(), e))?;
        drop(file);

        fs::rename(&temp, &self.path)
            .await
            .map_err(|e| LedgerError::io(context(), e))?;

        debug!(path = %self.path.display(), bytes = bytes.len(), "Flushed ledger");
        Ok(StoreFingerprint {
            modified: meta.modified().ok(),
            len: meta.len(),
        })
    }

    async fn fingerprint(&self) -> Result<Option<StoreFingerprint>, LedgerError> {
        match fs::metadata(&self.path).await {
            Ok(meta) => Ok(Some(StoreFingerprint {
                modified: meta.modified().ok(),
                len: meta.len(),
            })),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(LedgerError::io(
                format!("failed to stat ledger {}", self.path.display()),
                e,
            )),
        }
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// In-memory store holding the encoded document.
#[derive(Debug, Default)]
pub struct MemoryStore {
    bytes: Mutex<Option<Vec<u8>>>,
    generation: AtomicU64,
    saves: AtomicUsize,
    fail_saves: AtomicBool,
}

impl MemoryStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// A store pre-populated with `document`.
    pub fn with_document(document: &LedgerDocument) -> Result<Self, LedgerError> {
        let store = Self::new();
        store.put(document)?;
        Ok(store)
    }

    /// Number of successful saves so far.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    /// Make subsequent saves fail with an I/O error.
    pub fn set_fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    /// Replace the stored document as another process would.
    pub fn put(&self, document: &LedgerDocument) -> Result<(), LedgerError> {
        self.replace(document).map(drop)
    }

    fn replace(&self, document: &LedgerDocument) -> Result<StoreFingerprint, LedgerError> {
        let bytes = document.encode().map_err(LedgerError::Encode)?;
        let mut slot = self
            .bytes
            .lock()
            .map_err(|_| LedgerError::io("memory store", poisoned()))?;
        *slot = Some(bytes);
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(StoreFingerprint {
            modified: None,
            len: generation,
        })
    }

    /// Decode whatever is currently stored.
    pub fn snapshot(&self) -> Result<Option<LedgerDocument>, LedgerError> {
        let slot = self
            .bytes
            .lock()
            .map_err(|_| LedgerError::io("memory store", poisoned()))?;
        slot.as_deref()
            .map(LedgerDocument::decode)
            .transpose()
            .map_err(LedgerError::from)
    }
}

#[async_trait]
impl LedgerStore for MemoryStore {
    async fn load(&self) -> Result<Option<LedgerDocument>, LedgerError> {
        self.snapshot()
    }

    async fn save(&self, document: &LedgerDocument) -> Result<StoreFingerprint, LedgerError> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(LedgerError::io(
                "memory store",
                std::io::Error::other("injected save failure"),
            ));
        }
        let fingerprint = self.replace(document)?;
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(fingerprint)
    }

    async fn fingerprint(&self) -> Result<Option<StoreFingerprint>, LedgerError> {
        let stored = self
            .bytes
            .lock()
            .map_err(|_| LedgerError::io("memory store", poisoned()))?
            .is_some();
        Ok(stored.then(|| StoreFingerprint {
            modified: None,
            len: self.generation.load(Ordering::SeqCst),
        }))
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

fn poisoned() -> std::io::Error {
    std::io::Error::other("lock poisoned")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sharehub_entity::share::{CreateShare, UseLimit};

    fn sample() -> LedgerDocument {
        let mut doc = LedgerDocument::empty(Some(8080));
        let record = CreateShare {
            token: "abc123".into(),
            target_path: "/srv/data".into(),
            uses: UseLimit::Remaining(2),
            expires_at: None,
            allow_upload: true,
        }
        .into_record(Utc::now());
        doc.shares.insert(record.token.clone(), record);
        doc
    }

    #[tokio::test]
    async fn test_file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("data.json"));

        assert!(store.load().await.unwrap().is_none());
        assert!(store.fingerprint().await.unwrap().is_none());

        let doc = sample();
        store.save(&doc).await.unwrap();
        assert_eq!(store.load().await.unwrap(), Some(doc.clone()));

        // Save(Load(store)) leaves the store semantically unchanged.
        let loaded = store.load().await.unwrap().unwrap();
        store.save(&loaded).await.unwrap();
        assert_eq!(store.load().await.unwrap(), Some(doc));
        assert!(!dir.path().join("data.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_file_store_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("nested/deeper/data.json"));
        store.save(&sample()).await.unwrap();
        assert!(store.fingerprint().await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_file_store_reports_corruption() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.json");
        std::fs::write(&path, b"{ broken").unwrap();

        let err = JsonFileStore::new(&path).load().await.unwrap_err();
        assert!(matches!(err, LedgerError::Document(_)));
    }

    #[tokio::test]
    async fn test_memory_store_generation_changes_on_put() {
        let store = MemoryStore::with_document(&sample()).unwrap();
        let before = store.fingerprint().await.unwrap();
        store.put(&sample()).unwrap();
        assert_ne!(store.fingerprint().await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_save_returns_fingerprint_of_written_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let file = JsonFileStore::new(dir.path().join("data.json"));
        let written = file.save(&sample()).await.unwrap();
        assert_eq!(file.fingerprint().await.unwrap(), Some(written));

        let memory = MemoryStore::new();
        let first = memory.save(&sample()).await.unwrap();
        assert_eq!(memory.fingerprint().await.unwrap(), Some(first));
        memory.put(&sample()).unwrap();
        assert_ne!(memory.fingerprint().await.unwrap(), Some(first));
    }

    #[tokio::test]
    async fn test_memory_store_injected_failure() {
        let store = MemoryStore::new();
        store.set_fail_saves(true);
        assert!(store.save(&sample()).await.is_err());
        assert_eq!(store.save_count(), 0);
    }
}
