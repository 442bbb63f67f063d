use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncRead, AsyncWriteExt};
use uuid::Uuid;

/// Prefix of in-flight upload files inside the storage directory.
pub const STAGING_PREFIX: &str = ".upload-";

/// Bytes written to a temporary file that has not been given its final name yet.
#[derive(Debug)]
pub struct StagedUpload {
    pub temp_path: PathBuf,
    pub size: u64,
}

#[async_trait]
pub trait StorageGateway: Send + Sync {
    /// Absolute path of the storage directory.
    fn root(&self) -> &Path;

    fn absolute_path(&self, filename: &str) -> PathBuf {
        self.root().join(filename)
    }

    /// Creates the storage directory when missing. Returns `true` if it was created.
    async fn ensure_directory_exists(&self) -> Result<bool>;

    /// Deletes staging files left behind by an interrupted upload. Returns how
    /// many were removed.
    async fn purge_staging(&self) -> Result<usize>;

    /// Streams `reader` into a hidden temporary file in the storage directory.
    async fn stage_upload<'a>(
        &self,
        reader: Box<dyn AsyncRead + Unpin + Send + 'a>,
    ) -> Result<StagedUpload>;

    /// Renames a staged upload onto `filename`, replacing any existing file.
    async fn commit(&self, staged: StagedUpload, filename: &str) -> Result<PathBuf>;

    /// Removes a staged upload that will not be committed.
    async fn discard(&self, staged: StagedUpload);

    /// Stage + commit in one step.
    async fn write_uploaded_file<'a>(
        &self,
        filename: &str,
        reader: Box<dyn AsyncRead + Unpin + Send + 'a>,
    ) -> Result<PathBuf> {
        let staged = self.stage_upload(reader).await?;
        self.commit(staged, filename).await
    }

    /// Names of all entries in the storage directory, in directory order.
    /// Callers filter by name.
    async fn list_directory(&self) -> Result<Vec<String>>;

    async fn file_exists(&self, filename: &str) -> bool;
}

/// Storage gateway over a local directory.
pub struct LocalStorage {
    root: PathBuf,
}

impl LocalStorage {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    fn staging_path(&self) -> PathBuf {
        self.root
            .join(format!("{}{}.part", STAGING_PREFIX, Uuid::new_v4()))
    }
}

#[async_trait]
impl StorageGateway for LocalStorage {
    fn root(&self) -> &Path {
        &self.root
    }

    async fn ensure_directory_exists(&self) -> Result<bool> {
        match tokio::fs::metadata(&self.root).await {
            Ok(meta) if meta.is_dir() => return Ok(false),
            Ok(_) => bail!(
                "Storage path {} exists but is not a directory",
                self.root.display()
            ),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("Failed to inspect {}", self.root.display()));
            }
        }

        match tokio::fs::create_dir_all(&self.root).await {
            Ok(()) => Ok(true),
            // Lost a race with another creator; still has to be a directory.
            Err(e) if e.kind() == ErrorKind::AlreadyExists && self.root.is_dir() => Ok(false),
            Err(e) => Err(e).with_context(|| {
                format!("Failed to create storage directory {}", self.root.display())
            }),
        }
    }

    async fn purge_staging(&self) -> Result<usize> {
        let mut removed = 0;
        for name in self.list_directory().await? {
            if !name.starts_with(STAGING_PREFIX) {
                continue;
            }
            let path = self.absolute_path(&name);
            match tokio::fs::remove_file(&path).await {
                Ok(()) => removed += 1,
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => {
                    tracing::warn!("Failed to remove stale staging file {}: {}", path.display(), e)
                }
            }
        }
        Ok(removed)
    }

    async fn stage_upload<'a>(
        &self,
        mut reader: Box<dyn AsyncRead + Unpin + Send + 'a>,
    ) -> Result<StagedUpload> {
        let temp_path = self.staging_path();

        let written: std::io::Result<u64> = async {
            let mut file = tokio::fs::File::create(&temp_path).await?;
            let size = tokio::io::copy(&mut reader, &mut file).await?;
            file.flush().await?;
            file.sync_all().await?;
            Ok(size)
        }
        .await;

        match written {
            Ok(size) => Ok(StagedUpload { temp_path, size }),
            Err(e) => {
                remove_quietly(&temp_path).await;
                Err(e).context("Failed to write upload to staging file")
            }
        }
    }

    async fn commit(&self, staged: StagedUpload, filename: &str) -> Result<PathBuf> {
        let destination = self.absolute_path(filename);

        if let Err(e) = tokio::fs::rename(&staged.temp_path, &destination).await {
            remove_quietly(&staged.temp_path).await;
            return Err(e)
                .with_context(|| format!("Failed to move upload to {}", destination.display()));
        }

        Ok(destination)
    }

    async fn discard(&self, staged: StagedUpload) {
        remove_quietly(&staged.temp_path).await;
    }

    async fn list_directory(&self) -> Result<Vec<String>> {
        let mut entries = tokio::fs::read_dir(&self.root)
            .await
            .with_context(|| format!("Failed to read {}", self.root.display()))?;
        let mut names = Vec::new();

        while let Some(entry) = entries.next_entry().await? {
            match entry.file_name().into_string() {
                Ok(name) => names.push(name),
                Err(raw) => tracing::warn!("Skipping non UTF-8 filename: {:?}", raw),
            }
        }

        Ok(names)
    }

    async fn file_exists(&self, filename: &str) -> bool {
        tokio::fs::try_exists(self.absolute_path(filename))
            .await
            .unwrap_or(false)
    }
}

async fn remove_quietly(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        if e.kind() != ErrorKind::NotFound {
            tracing::warn!("Failed to remove staging file {}: {}", path.display(), e);
        }
    }
}
