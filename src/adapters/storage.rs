use crate::core::{DirectoryLister, FileMover, Storage};
use crate::utils::error::{FormError, Result};
use std::path::{Path, PathBuf};

/// Filesystem storage rooted at the working directory of a batch.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    base_path: String,
}

impl LocalStorage {
    pub fn new(base_path: String) -> Self {
        Self { base_path }
    }

    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    fn resolve(&self, path: &str) -> PathBuf {
        Path::new(&self.base_path).join(path)
    }
}

async fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }
    Ok(())
}

impl Storage for LocalStorage {
    async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        let data = tokio::fs::read(self.resolve(path)).await?;
        Ok(data)
    }

    async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
        let full_path = self.resolve(path);
        ensure_parent(&full_path).await?;
        tokio::fs::write(full_path, data).await?;
        Ok(())
    }

    async fn remove_file(&self, path: &str) -> Result<()> {
        tokio::fs::remove_file(self.resolve(path)).await?;
        Ok(())
    }
}

impl DirectoryLister for LocalStorage {
    async fn list_files(&self, dir: &str, extension: &str) -> Result<Vec<String>> {
        let mut entries = match tokio::fs::read_dir(self.resolve(dir)).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut files = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            let path = entry.path();
            let matches = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case(extension));
            if matches {
                if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                    files.push(name.to_string());
                }
            }
        }

        files.sort();
        Ok(files)
    }
}

impl FileMover for LocalStorage {
    async fn move_file(&self, from: &str, to: &str) -> Result<()> {
        let source = self.resolve(from);
        let destination = self.resolve(to);
        let filing_error = |e: std::io::Error| FormError::FilingError {
            from: from.to_string(),
            to: to.to_string(),
            message: e.to_string(),
        };

        if let Some(parent) = destination.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(filing_error)?;
        }
        tokio::fs::rename(&source, &destination)
            .await
            .map_err(filing_error)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_list_filters_extension_and_directories() {
        let temp_dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(temp_dir.path().to_str().unwrap().to_string());

        storage.write_file("b.pdf", b"%PDF").await.unwrap();
        storage.write_file("a.PDF", b"%PDF").await.unwrap();
        storage.write_file("notes.txt", b"").await.unwrap();
        storage.write_file("converted/c.pdf", b"%PDF").await.unwrap();

        let files = storage.list_files(".", "pdf").await.unwrap();
        assert_eq!(files, vec!["a.PDF", "b.pdf"]);

        let missing = storage.list_files("errored", "pdf").await.unwrap();
        assert!(missing.is_empty());
    }

    #[tokio::test]
    async fn test_move_creates_destination() {
        let temp_dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(temp_dir.path().to_str().unwrap().to_string());
        storage.write_file("a.pdf", b"%PDF").await.unwrap();

        storage.move_file("a.pdf", "converted/a.pdf").await.unwrap();

        assert!(temp_dir.path().join("converted/a.pdf").exists());
        assert!(!temp_dir.path().join("a.pdf").exists());
    }

    #[tokio::test]
    async fn test_move_missing_file_is_filing_error() {
        let temp_dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(temp_dir.path().to_str().unwrap().to_string());

        let err = storage
            .move_file("absent.pdf", "converted/absent.pdf")
            .await
            .unwrap_err();
        assert!(matches!(err, FormError::FilingError { .. }));
    }
}
