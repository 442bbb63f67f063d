use crate::config::ServiceConfig;
use crate::services::storage::{LocalStorage, StorageGateway};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// Resolves the configured storage directory to an absolute path and makes
/// sure it exists. The service cannot run without it, so failures are fatal.
pub async fn setup_storage(config: &ServiceConfig) -> Result<Arc<LocalStorage>> {
    let root = resolve_storage_dir(&config.storage_dir)?;
    let storage = LocalStorage::new(root);

    let created = storage.ensure_directory_exists().await?;
    if created {
        info!("📁 Storage directory created: {}", storage.root().display());
    } else {
        info!("📁 Storage directory: {}", storage.root().display());
    }

    let purged = storage.purge_staging().await?;
    if purged > 0 {
        info!("🧹 Removed {} stale staging file(s)", purged);
    }

    Ok(Arc::new(storage))
}

pub fn resolve_storage_dir(dir: &Path) -> Result<PathBuf> {
    if dir.is_absolute() {
        return Ok(dir.to_path_buf());
    }

    let cwd = std::env::current_dir().context("Failed to read current directory")?;
    Ok(cwd.join(dir))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_storage_dir_keeps_absolute() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(resolve_storage_dir(dir.path()).unwrap(), dir.path());
    }

    #[test]
    fn test_resolve_storage_dir_joins_relative() {
        let resolved = resolve_storage_dir(Path::new("images")).unwrap();
        assert!(resolved.is_absolute());
        assert!(resolved.ends_with("images"));
    }

    #[tokio::test]
    async fn test_setup_storage_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let config = ServiceConfig::development(dir.path().join("images"));

        let storage = setup_storage(&config).await.unwrap();
        assert!(storage.root().is_dir());
    }

    #[tokio::test]
    async fn test_setup_storage_rejects_plain_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("images");
        std::fs::write(&path, b"not a directory").unwrap();

        let config = ServiceConfig::development(path);
        assert!(setup_storage(&config).await.is_err());
    }

    #[tokio::test]
    async fn test_setup_storage_removes_interrupted_uploads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("images");
        std::fs::create_dir(&path).unwrap();
        std::fs::write(path.join(".upload-dead.part"), b"partial").unwrap();
        std::fs::write(path.join("kept.gif"), b"GIF89a").unwrap();

        let storage = setup_storage(&ServiceConfig::development(path))
            .await
            .unwrap();
        assert_eq!(storage.list_directory().await.unwrap(), vec!["kept.gif"]);
    }
}
