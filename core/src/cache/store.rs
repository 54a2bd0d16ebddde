//! Object storage backends for the narration cache.
//!
//! Objects are written once and never mutated: a missing object is an
//! ordinary `None`, only genuine backend failures are errors.

use crate::{NarrationError, Result};
use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, trace};

/// Public, write-once object storage.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Public URL of the object at `path`, if it exists
    async fn locate(&self, path: &str) -> Result<Option<String>>;

    /// Object contents, if it exists
    async fn get(&self, path: &str) -> Result<Option<Bytes>>;

    /// Upload an object and return its public URL
    async fn put(&self, path: &str, body: Bytes, content_type: &str) -> Result<String>;
}

fn join_url(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}

/// In-process store backed by a DashMap. Suitable for development and testing.
pub struct InMemoryBlobStore {
    objects: DashMap<String, (Bytes, String)>,
    public_base_url: String,
}

impl InMemoryBlobStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_base_url(public_base_url: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            objects: DashMap::new(),
            public_base_url: public_base_url.into(),
        })
    }

    /// Drop an object (used to simulate partially written entries)
    pub fn remove(&self, path: &str) -> bool {
        self.objects.remove(path).is_some()
    }

    pub fn content_type(&self, path: &str) -> Option<String> {
        self.objects.get(path).map(|entry| entry.value().1.clone())
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

impl Default for InMemoryBlobStore {
    fn default() -> Self {
        Self {
            objects: DashMap::new(),
            public_base_url: "memory://blob".to_string(),
        }
    }
}

#[async_trait]
impl BlobStore for InMemoryBlobStore {
    async fn locate(&self, path: &str) -> Result<Option<String>> {
        Ok(self
            .objects
            .contains_key(path)
            .then(|| join_url(&self.public_base_url, path)))
    }

    async fn get(&self, path: &str) -> Result<Option<Bytes>> {
        Ok(self.objects.get(path).map(|entry| entry.value().0.clone()))
    }

    async fn put(&self, path: &str, body: Bytes, content_type: &str) -> Result<String> {
        trace!(target: "cache", path = %path, bytes = body.len(), "Storing object in memory");
        self.objects
            .insert(path.to_string(), (body, content_type.to_string()));
        Ok(join_url(&self.public_base_url, path))
    }
}

/// Objects stored as files below a root directory, served at a public base URL.
pub struct FsBlobStore {
    root: PathBuf,
    public_base_url: String,
}

impl FsBlobStore {
    pub fn new(root: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_base_url: public_base_url.into(),
        }
    }

    fn file_path(&self, path: &str) -> Result<PathBuf> {
        let mut full = self.root.clone();
        for part in path.split('/') {
            if part.is_empty() || part == "." || part == ".." {
                return Err(NarrationError::StorageFailed(format!(
                    "invalid object path: {path}"
                )));
            }
            full.push(part);
        }
        Ok(full)
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn locate(&self, path: &str) -> Result<Option<String>> {
        let file = self.file_path(path)?;
        match tokio::fs::metadata(&file).await {
            Ok(meta) if meta.is_file() => Ok(Some(join_url(&self.public_base_url, path))),
            Ok(_) => Ok(None),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(NarrationError::StorageFailed(format!(
                "failed to stat {}: {}",
                file.display(),
                e
            ))),
        }
    }

    async fn get(&self, path: &str) -> Result<Option<Bytes>> {
        let file = self.file_path(path)?;
        match tokio::fs::read(&file).await {
            Ok(data) => Ok(Some(Bytes::from(data))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(NarrationError::StorageFailed(format!(
                "failed to read {}: {}",
                file.display(),
                e
            ))),
        }
    }

    async fn put(&self, path: &str, body: Bytes, _content_type: &str) -> Result<String> {
        let file = self.file_path(path)?;
        let storage_err = |e: std::io::Error| {
            NarrationError::StorageFailed(format!("failed to write {}: {}", file.display(), e))
        };
        let Some(parent) = file.parent().map(PathBuf::from) else {
            return Err(NarrationError::StorageFailed(format!(
                "invalid object path: {path}"
            )));
        };
        tokio::fs::create_dir_all(&parent).await.map_err(storage_err)?;

        // Readers must never observe a half-written object, and concurrent
        // writers of the same key each get their own temp file.
        let target = file.clone();
        let bytes = body.len();
        tokio::task::spawn_blocking(move || write_atomically(&parent, &target, &body))
            .await
            .map_err(|e| NarrationError::StorageFailed(format!("write task failed: {e}")))?
            .map_err(storage_err)?;

        debug!(target: "cache", path = %file.display(), bytes, "Stored object on disk");
        Ok(join_url(&self.public_base_url, path))
    }
}

/// Write `body` to a unique temp file in `dir` and rename it over `target`.
/// Losing the rename to a concurrent writer is fine: objects are
/// content-addressed, so whatever is already there is the same object.
fn write_atomically(dir: &Path, target: &Path, body: &[u8]) -> std::io::Result<()> {
    let mut tmp = tempfile::Builder::new()
        .prefix(".blob-")
        .suffix(".part")
        .tempfile_in(dir)?;
    tmp.write_all(body)?;
    tmp.as_file().sync_all()?;
    match tmp.persist(target) {
        Ok(_) => Ok(()),
        Err(_) if target.is_file() => Ok(()),
        Err(e) => Err(e.error),
    }
}

/// Remote object store speaking plain HTTP: public reads by URL, authenticated
/// `PUT` uploads.
pub struct HttpBlobStore {
    http: reqwest::Client,
    public_base_url: String,
    upload_base_url: String,
    token: Option<String>,
}

impl HttpBlobStore {
    pub fn new(
        http: reqwest::Client,
        public_base_url: impl Into<String>,
        upload_base_url: impl Into<String>,
        token: Option<String>,
    ) -> Self {
        Self {
            http,
            public_base_url: public_base_url.into(),
            upload_base_url: upload_base_url.into(),
            token,
        }
    }

    fn request_err(path: &str, e: reqwest::Error) -> NarrationError {
        NarrationError::StorageFailed(format!("request for {path} failed: {e}"))
    }
}

#[async_trait]
impl BlobStore for HttpBlobStore {
    async fn locate(&self, path: &str) -> Result<Option<String>> {
        let url = join_url(&self.public_base_url, path);
        let resp = self
            .http
            .head(&url)
            .send()
            .await
            .map_err(|e| Self::request_err(path, e))?;

        match resp.status() {
            s if s.is_success() => Ok(Some(url)),
            reqwest::StatusCode::NOT_FOUND => Ok(None),
            s => Err(NarrationError::StorageFailed(format!(
                "HEAD {url} returned status {s}"
            ))),
        }
    }

    async fn get(&self, path: &str) -> Result<Option<Bytes>> {
        let url = join_url(&self.public_base_url, path);
        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| Self::request_err(path, e))?;

        match resp.status() {
            s if s.is_success() => {
                let body = resp.bytes().await.map_err(|e| Self::request_err(path, e))?;
                Ok(Some(body))
            }
            reqwest::StatusCode::NOT_FOUND => Ok(None),
            s => Err(NarrationError::StorageFailed(format!(
                "GET {url} returned status {s}"
            ))),
        }
    }

    async fn put(&self, path: &str, body: Bytes, content_type: &str) -> Result<String> {
        let upload_url = join_url(&self.upload_base_url, path);
        let mut req = self
            .http
            .put(&upload_url)
            .header("content-type", content_type)
            .body(body);
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }

        let resp = req.send().await.map_err(|e| Self::request_err(path, e))?;
        if !resp.status().is_success() {
            let status = resp.status();
            let detail = resp.text().await.unwrap_or_default();
            return Err(NarrationError::StorageFailed(format!(
                "PUT {upload_url} returned status {status}: {detail}"
            )));
        }

        Ok(join_url(&self.public_base_url, path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_urls_without_double_slashes() {
        assert_eq!(join_url("https://cdn/", "/tts/a.mp3"), "https://cdn/tts/a.mp3");
        assert_eq!(join_url("https://cdn", "tts/a.mp3"), "https://cdn/tts/a.mp3");
    }

    #[test]
    fn fs_store_rejects_escaping_paths() {
        let store = FsBlobStore::new("/tmp/narration", "http://localhost");
        assert!(store.file_path("tts/../../etc/passwd").is_err());
        assert!(store.file_path("tts//x").is_err());
        assert!(store.file_path("tts/a/b.mp3").is_ok());
    }
}
