//! Local filesystem access beneath a share's target path.

use std::path::{Component, Path, PathBuf};

use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::{Stream, StreamExt};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use sharehub_core::error::{AppError, ErrorKind};
use sharehub_core::result::AppResult;

/// Upper bound on `_{n}` suffixes tried before giving up on a name.
const MAX_NAME_ATTEMPTS: u32 = 10_000;

/// A path inside a share after resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedEntry {
    /// Absolute filesystem path.
    pub path: PathBuf,
    /// Whether the path is a directory.
    pub is_dir: bool,
    /// Size in bytes (files only).
    pub size: u64,
}

/// One row of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntryInfo {
    /// File name.
    pub name: String,
    /// Whether the entry is a directory.
    pub is_dir: bool,
    /// Size in bytes.
    pub size: u64,
    /// Last modification time.
    pub modified: Option<DateTime<Utc>>,
}

/// A file written by [`LocalShareProvider::store_stream`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    /// Name the file was stored under.
    pub name: String,
    /// Bytes written.
    pub size: u64,
}

/// Filesystem view rooted at a share's target path.
#[derive(Debug, Clone)]
pub struct LocalShareProvider {
    root: PathBuf,
}

impl LocalShareProvider {
    /// Create a provider rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The share's target path.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Join the request remainder onto the root.
    ///
    /// Any `..`, root or prefix component is rejected as not found so that a
    /// request can never name a path outside the share.
    pub fn resolve(&self, remainder: &str) -> AppResult<PathBuf> {
        let mut path = self.root.clone();
        for component in Path::new(remainder.trim_start_matches('/')).components() {
            match component {
                Component::Normal(part) => path.push(part),
                Component::CurDir => {}
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                    return Err(AppError::not_found(format!("Path not found: {remainder}")));
                }
            }
        }
        Ok(path)
    }

    /// Resolve and stat the remainder.
    pub async fn stat(&self, remainder: &str) -> AppResult<ResolvedEntry> {
        let path = self.resolve(remainder)?;
        let meta = fs::metadata(&path).await.map_err(|e| {
            debug!(path = %path.display(), error = %e, "Stat failed");
            AppError::with_source(
                ErrorKind::NotFound,
                format!("Path not found: {remainder}"),
                e,
            )
        })?;

        Ok(ResolvedEntry {
            path,
            is_dir: meta.is_dir(),
            size: meta.len(),
        })
    }

    /// List a directory, skipping hidden entries. Directories sort first,
    /// then by name.
    pub async fn list_dir(&self, dir: &Path) -> AppResult<Vec<DirEntryInfo>> {
        let mut reader = fs::read_dir(dir).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to list directory: {}", dir.display()),
                e,
            )
        })?;

        let mut entries = Vec::new();
        while let Some(entry) = reader.next_entry().await.map_err(|e| {
            AppError::with_source(ErrorKind::Storage, "Failed to read directory entry", e)
        })? {
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.starts_with('.') {
                continue;
            }

            // Follow symlinks; fall back to the link itself when dangling.
            let meta = match fs::metadata(entry.path()).await {
                Ok(meta) => meta,
                Err(_) => match entry.metadata().await {
                    Ok(meta) => meta,
                    Err(_) => continue,
                },
            };

            entries.push(DirEntryInfo {
                name,
                is_dir: meta.is_dir(),
                size: if meta.is_dir() { 0 } else { meta.len() },
                modified: meta.modified().ok().map(DateTime::<Utc>::from),
            });
        }

        entries.sort_by(|a, b| b.is_dir.cmp(&a.is_dir).then_with(|| a.name.cmp(&b.name)));
        Ok(entries)
    }

    /// Stream an uploaded file into `dir` without ever overwriting.
    ///
    /// `file_name` must already be sanitized. On collision the name becomes
    /// `{stem}_{unix_seconds}{.ext}`, then `{stem}_{unix_seconds}_{n}{.ext}`.
    /// A failure mid-stream removes the partial file.
    pub async fn store_stream<S, E>(
        &self,
        dir: &Path,
        file_name: &str,
        now: DateTime<Utc>,
        stream: S,
    ) -> AppResult<StoredFile>
    where
        S: Stream<Item = Result<Bytes, E>> + Send,
        E: std::error::Error + Send + Sync + 'static,
    {
        let (name, path, mut file) = create_unique(dir, file_name, now).await?;

        let mut stream = std::pin::pin!(stream);
        let mut size = 0u64;
        let result: AppResult<()> = async {
            while let Some(chunk) = stream.next().await {
                let chunk = chunk.map_err(|e| {
                    AppError::with_source(ErrorKind::Validation, "Failed to read upload", e)
                })?;
                size += chunk.len() as u64;
                file.write_all(&chunk).await.map_err(|e| {
                    AppError::with_source(ErrorKind::Storage, "Failed to write upload", e)
                })?;
            }
            file.flush()
                .await
                .map_err(|e| AppError::with_source(ErrorKind::Storage, "Failed to flush upload", e))
        }
        .await;

        if let Err(err) = result {
            drop(file);
            let _ = fs::remove_file(&path).await;
            return Err(err);
        }

        debug!(path = %path.display(), bytes = size, "Stored upload");
        Ok(StoredFile { name, size })
    }
}

/// Reduce a client-supplied file name to its final component.
///
/// Returns `None` when nothing usable remains (empty, `.` or `..`).
pub fn sanitize_file_name(raw: &str) -> Option<String> {
    let base = raw
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();
    if base.is_empty() || base == "." || base == ".." || base.chars().any(char::is_control) {
        return None;
    }
    Some(base.to_string())
}

async fn create_unique(
    dir: &Path,
    file_name: &str,
    now: DateTime<Utc>,
) -> AppResult<(String, PathBuf, fs::File)> {
    let (stem, ext) = split_name(file_name);
    let stamp = now.timestamp();

    for attempt in 0..MAX_NAME_ATTEMPTS {
        let name = match attempt {
            0 => file_name.to_string(),
            1 => format!("{stem}_{stamp}{ext}"),
            n => format!("{stem}_{stamp}_{}{ext}", n - 1),
        };
        let path = dir.join(&name);

        match fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
        {
            Ok(file) => return Ok((name, path, file)),
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => continue,
            Err(e) => {
                return Err(AppError::with_source(
                    ErrorKind::Storage,
                    format!("Failed to create file: {name}"),
                    e,
                ));
            }
        }
    }

    Err(AppError::storage(format!(
        "No free name for upload: {file_name}"
    )))
}

fn split_name(file_name: &str) -> (&str, &str) {
    match file_name.rfind('.') {
        Some(0) | None => (file_name, ""),
        Some(idx) => file_name.split_at(idx),
    }
}
