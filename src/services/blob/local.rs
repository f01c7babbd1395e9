use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::{fs, io::AsyncWriteExt};
use uuid::Uuid;

use crate::services::blob::store::{BlobError, BlobResult, BlobStore};

/// Filesystem-backed blob store (the images directory served next to the API).
///
/// Blobs are written atomically via a temp file + rename pattern:
/// the temp name (`.<uuid>.jpg.tmp`) is never returned by `store`, so a write that
/// fails or is interrupted is not resolvable by `read`. Temp files left behind by a
/// crash are swept when the store is opened.
#[derive(Clone, Debug)]
pub struct LocalBlobStore {
    root: PathBuf,
    max_bytes: usize,
}

impl LocalBlobStore {
    /// Default upper bound for a single image payload (10 MiB).
    pub const DEFAULT_MAX_BYTES: usize = 10 * 1024 * 1024;

    pub async fn new(root: impl Into<PathBuf>, max_bytes: usize) -> BlobResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root).await?;

        let swept = sweep_temp_files(&root).await?;
        if swept > 0 {
            tracing::warn!(dir = %root.display(), count = swept, "removed leftover temp blobs");
        }

        Ok(Self { root, max_bytes })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, name: &str) -> BlobResult<PathBuf> {
        // names come from our own records, but never let one escape the root
        let valid = !name.is_empty()
            && !name.starts_with('.')
            && !name.contains(['/', '\\'])
            && Path::new(name).file_name().is_some_and(|f| f == name);
        if !valid {
            return Err(BlobError::InvalidName(name.to_string()));
        }
        Ok(self.root.join(name))
    }

    async fn write_temp(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
        let mut file = fs::File::create(path).await?;
        file.write_all(bytes).await?;
        file.sync_all().await?;
        Ok(())
    }
}

fn is_temp_name(name: &str) -> bool {
    name.starts_with('.') && name.ends_with(".tmp")
}

async fn sweep_temp_files(root: &Path) -> std::io::Result<usize> {
    let mut swept = 0;
    let mut entries = fs::read_dir(root).await?;
    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name();
        if name.to_str().is_some_and(is_temp_name) && entry.file_type().await?.is_file() {
            fs::remove_file(entry.path()).await?;
            swept += 1;
        }
    }
    Ok(swept)
}

#[cfg(unix)]
async fn sync_dir(dir: &Path) -> std::io::Result<()> {
    fs::File::open(dir).await?.sync_all().await
}

#[cfg(not(unix))]
async fn sync_dir(_dir: &Path) -> std::io::Result<()> {
    Ok(())
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    async fn store(&self, bytes: &[u8]) -> BlobResult<String> {
        if bytes.len() > self.max_bytes {
            return Err(BlobError::TooLarge {
                size: bytes.len(),
                max: self.max_bytes,
            });
        }

        let name = format!("{}.jpg", Uuid::new_v4());
        let path = self.path_for(&name)?;
        let temp_path = self.root.join(format!(".{name}.tmp"));

        if let Err(e) = Self::write_temp(&temp_path, bytes).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }
        if let Err(e) = fs::rename(&temp_path, &path).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }
        // the rename itself is only durable once the directory entry is flushed
        if let Err(e) = sync_dir(&self.root).await {
            let _ = fs::remove_file(&path).await;
            return Err(e.into());
        }

        tracing::debug!(blob = %name, size = bytes.len(), "blob stored");
        Ok(name)
    }

    async fn read(&self, name: &str) -> BlobResult<Vec<u8>> {
        let path = self.path_for(name)?;
        match fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(BlobError::NotFound(name.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn remove(&self, name: &str) -> BlobResult<()> {
        let path = self.path_for(name)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(BlobError::NotFound(name.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn store_read_remove() {
        let temp = TempDir::new().unwrap();
        let store = LocalBlobStore::new(temp.path(), 1024).await.unwrap();

        let name = store.store(b"jpeg bytes").await.unwrap();
        assert!(name.ends_with(".jpg"));
        assert_eq!(store.read(&name).await.unwrap(), b"jpeg bytes");

        store.remove(&name).await.unwrap();
        assert!(matches!(
            store.read(&name).await,
            Err(BlobError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn generated_names_are_unique() {
        let temp = TempDir::new().unwrap();
        let store = LocalBlobStore::new(temp.path(), 1024).await.unwrap();

        let a = store.store(b"same").await.unwrap();
        let b = store.store(b"same").await.unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn oversized_payload_is_rejected_without_a_file() {
        let temp = TempDir::new().unwrap();
        let store = LocalBlobStore::new(temp.path(), 4).await.unwrap();

        let err = store.store(b"too long").await.unwrap_err();
        assert!(matches!(err, BlobError::TooLarge { size: 8, max: 4 }));
        assert_eq!(std::fs::read_dir(temp.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn names_outside_the_root_are_refused() {
        let temp = TempDir::new().unwrap();
        let store = LocalBlobStore::new(temp.path(), 1024).await.unwrap();

        for name in ["../secret.jpg", "a/b.jpg", "", ".hidden.jpg.tmp", ".."] {
            assert!(
                matches!(store.read(name).await, Err(BlobError::InvalidName(_))),
                "{name} should be refused"
            );
        }
    }

    #[tokio::test]
    async fn creates_missing_root_directory() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("wwwroot").join("images");
        let store = LocalBlobStore::new(&root, 1024).await.unwrap();

        assert!(store.root().is_dir());
    }

    #[tokio::test]
    async fn leftover_temp_files_are_swept_on_open() {
        let temp = TempDir::new().unwrap();
        let orphan = temp.path().join(format!(".{}.jpg.tmp", Uuid::new_v4()));
        std::fs::write(&orphan, b"half written").unwrap();
        let kept = temp.path().join(format!("{}.jpg", Uuid::new_v4()));
        std::fs::write(&kept, b"complete").unwrap();

        LocalBlobStore::new(temp.path(), 1024).await.unwrap();

        assert!(!orphan.exists());
        assert!(kept.exists());
    }

    #[tokio::test]
    async fn store_leaves_no_temp_file_behind() {
        let temp = TempDir::new().unwrap();
        let store = LocalBlobStore::new(temp.path(), 1024).await.unwrap();

        let name = store.store(b"jpeg").await.unwrap();

        let names: Vec<String> = std::fs::read_dir(temp.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(names, vec![name]);
    }
}
