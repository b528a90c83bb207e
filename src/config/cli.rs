use crate::utils::error::Result;
use std::path::{Path, PathBuf};

/// Writes translated documents under a base directory.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
}

impl LocalStorage {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    pub async fn write_file(&self, path: &Path, data: &[u8]) -> Result<PathBuf> {
        let full_path = self.base_path.join(path);

        if let Some(parent) = full_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        tokio::fs::write(&full_path, data).await?;
        Ok(full_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_write_file_creates_parent_directories() {
        let temp_dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(temp_dir.path());

        let written = storage
            .write_file(Path::new("out/nested/translated.pdf"), b"%PDF-1.7")
            .await
            .unwrap();

        assert_eq!(written, temp_dir.path().join("out/nested/translated.pdf"));
        assert_eq!(std::fs::read(written).unwrap(), b"%PDF-1.7");
    }
}
