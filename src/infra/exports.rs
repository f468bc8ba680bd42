//! Filesystem storage for rendered export workbooks.

use std::path::{Component, Path, PathBuf};

use bytes::Bytes;
use thiserror::Error;
use tokio::{fs, io::AsyncWriteExt};

#[derive(Debug, Error)]
pub enum ExportStorageError {
    #[error("invalid artifact name")]
    InvalidPath,
    #[error("export artifact not found")]
    Missing,
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Directory holding one file per finished export.
#[derive(Debug)]
pub struct ExportStorage {
    root: PathBuf,
}

impl ExportStorage {
    /// Initialise storage rooted at the provided directory, creating it if necessary.
    pub fn new(root: PathBuf) -> Result<Self, std::io::Error> {
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write `data` under `name`. The content lands in a sibling temp file
    /// first and is renamed into place, so readers never see a partial file.
    pub async fn write(&self, name: &str, data: &[u8]) -> Result<PathBuf, ExportStorageError> {
        let absolute = self.resolve(name)?;
        let staging = absolute.with_extension("partial");

        let mut file = fs::File::create(&staging).await?;
        if let Err(err) = file.write_all(data).await {
            drop(file);
            let _ = fs::remove_file(&staging).await;
            return Err(err.into());
        }
        file.flush().await?;
        drop(file);

        fs::rename(&staging, &absolute).await?;
        Ok(absolute)
    }

    pub async fn read(&self, name: &str) -> Result<Bytes, ExportStorageError> {
        let absolute = self.resolve(name)?;
        match fs::read(absolute).await {
            Ok(data) => Ok(Bytes::from(data)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                Err(ExportStorageError::Missing)
            }
            Err(err) => Err(err.into()),
        }
    }

    fn resolve(&self, name: &str) -> Result<PathBuf, ExportStorageError> {
        let relative = Path::new(name);
        let mut components = relative.components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(_)), None) => Ok(self.root.join(relative)),
            _ => Err(ExportStorageError::InvalidPath),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn written_artifacts_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let storage = ExportStorage::new(dir.path().join("exports")).unwrap();

        let path = storage.write("catalog-1.xlsx", b"payload").await.unwrap();
        assert!(path.starts_with(storage.root()));
        assert_eq!(
            storage.read("catalog-1.xlsx").await.unwrap(),
            Bytes::from_static(b"payload")
        );
        assert!(!storage.root().join("catalog-1.partial").exists());
    }

    #[tokio::test]
    async fn missing_artifact_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let storage = ExportStorage::new(dir.path().to_path_buf()).unwrap();
        assert!(matches!(
            storage.read("nope.xlsx").await,
            Err(ExportStorageError::Missing)
        ));
    }

    #[tokio::test]
    async fn names_cannot_escape_the_root() {
        let dir = tempfile::tempdir().unwrap();
        let storage = ExportStorage::new(dir.path().to_path_buf()).unwrap();
        for name in ["../evil.xlsx", "/etc/passwd", "nested/file.xlsx", "", "."] {
            assert!(
                matches!(storage.read(name).await, Err(ExportStorageError::InvalidPath)),
                "`{name}` should be rejected"
            );
        }
    }
}
