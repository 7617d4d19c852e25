//! Local filesystem access used by the pipeline.

use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;

#[async_trait]
pub trait LocalFiles: Send + Sync {
    /// Regular files directly inside `dir`, sorted by name.
    async fn list_files(&self, dir: &Path) -> io::Result<Vec<PathBuf>>;

    async fn remove_file(&self, path: &Path) -> io::Result<()>;

    /// Remove `dir` if it is empty.
    async fn remove_dir(&self, dir: &Path) -> io::Result<()>;

    /// Remove `dir` and everything under it.
    async fn remove_dir_all(&self, dir: &Path) -> io::Result<()>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct TokioLocalFiles;

#[async_trait]
impl LocalFiles for TokioLocalFiles {
    async fn list_files(&self, dir: &Path) -> io::Result<Vec<PathBuf>> {
        let mut entries = tokio::fs::read_dir(dir).await?;
        let mut files = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_file() {
                files.push(entry.path());
            }
        }
        files.sort();
        Ok(files)
    }

    async fn remove_file(&self, path: &Path) -> io::Result<()> {
        tokio::fs::remove_file(path).await
    }

    async fn remove_dir(&self, dir: &Path) -> io::Result<()> {
        tokio::fs::remove_dir(dir).await
    }

    async fn remove_dir_all(&self, dir: &Path) -> io::Result<()> {
        tokio::fs::remove_dir_all(dir).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn lists_only_regular_files_in_order() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.MP4"), b"b").unwrap();
        std::fs::write(dir.path().join("a.JPG"), b"a").unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();

        let files = TokioLocalFiles.list_files(dir.path()).await.unwrap();
        assert_eq!(
            files,
            vec![dir.path().join("a.JPG"), dir.path().join("b.MP4")]
        );
    }

    #[tokio::test]
    async fn remove_dir_refuses_non_empty() {
        let dir = tempfile::tempdir().unwrap();
        let device_dir = dir.path().join("10_0_0_5");
        std::fs::create_dir(&device_dir).unwrap();
        std::fs::write(device_dir.join("left.JPG"), b"x").unwrap();

        assert!(TokioLocalFiles.remove_dir(&device_dir).await.is_err());
        TokioLocalFiles
            .remove_file(&device_dir.join("left.JPG"))
            .await
            .unwrap();
        TokioLocalFiles.remove_dir(&device_dir).await.unwrap();
        assert!(!device_dir.exists());
    }
}
