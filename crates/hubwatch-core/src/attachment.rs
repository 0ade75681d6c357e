//! Scoped temporary files for attachment delivery.
//!
//! A [`StagedFile`] owns a uniquely named temporary file. The file is removed
//! when the value is dropped, so it is cleaned up on every exit path: after a
//! successful send, after a failed send, and when an earlier step errors out.

use std::future::Future;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, warn};

const TEMP_PREFIX: &str = "hubwatch-";

/// File contents written to temporary storage, awaiting delivery.
#[derive(Debug)]
pub struct StagedFile {
    file: NamedTempFile,
    file_name: String,
}

impl StagedFile {
    /// Writes `bytes` to a new temporary file in `dir`.
    ///
    /// The temporary file keeps the extension of `file_name`.
    pub fn write_in(dir: &Path, file_name: &str, bytes: &[u8]) -> io::Result<Self> {
        let suffix = Path::new(file_name)
            .extension()
            .map(|ext| format!(".{}", ext.to_string_lossy()))
            .unwrap_or_default();

        let mut file = tempfile::Builder::new()
            .prefix(TEMP_PREFIX)
            .suffix(&suffix)
            .tempfile_in(dir)?;
        file.write_all(bytes)?;
        file.flush()?;

        debug!(path = %file.path().display(), bytes = bytes.len(), "Staged attachment");

        Ok(Self {
            file,
            file_name: file_name.to_string(),
        })
    }

    /// Location of the temporary file.
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Name shown to the recipient.
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Hands the file to `send`, then removes it whatever the outcome.
    pub async fn deliver<F, Fut, T, E>(self, send: F) -> Result<T, E>
    where
        F: FnOnce(PathBuf, String) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let result = send(self.file.path().to_path_buf(), self.file_name.clone()).await;

        let path = self.file.path().to_path_buf();
        if let Err(e) = self.file.close() {
            warn!(path = %path.display(), error = %e, "Failed to remove staged attachment");
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_keeps_extension_and_content() {
        let dir = tempfile::tempdir().unwrap();
        let staged = StagedFile::write_in(dir.path(), "main.rs", b"fn main() {}").unwrap();

        assert_eq!(staged.file_name(), "main.rs");
        assert!(staged.path().to_string_lossy().ends_with(".rs"));
        assert_eq!(std::fs::read(staged.path()).unwrap(), b"fn main() {}");
    }

    #[test]
    fn test_unique_names() {
        let dir = tempfile::tempdir().unwrap();
        let a = StagedFile::write_in(dir.path(), "a.txt", b"a").unwrap();
        let b = StagedFile::write_in(dir.path(), "a.txt", b"b").unwrap();
        assert_ne!(a.path(), b.path());
    }

    #[test]
    fn test_drop_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let staged = StagedFile::write_in(dir.path(), "Makefile", b"all:").unwrap();
        let path = staged.path().to_path_buf();
        assert!(path.exists());

        drop(staged);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_deliver_removes_file_after_success() {
        let dir = tempfile::tempdir().unwrap();
        let staged = StagedFile::write_in(dir.path(), "notes.md", b"# hi").unwrap();
        let path = staged.path().to_path_buf();

        let sent = staged
            .deliver(|p, name| async move {
                let bytes = std::fs::read(&p).map_err(|e| e.to_string())?;
                Ok::<_, String>((bytes, name))
            })
            .await
            .unwrap();

        assert_eq!(sent.0, b"# hi");
        assert_eq!(sent.1, "notes.md");
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_deliver_removes_file_after_failure() {
        let dir = tempfile::tempdir().unwrap();
        let staged = StagedFile::write_in(dir.path(), "notes.md", b"# hi").unwrap();
        let path = staged.path().to_path_buf();

        let result: Result<(), String> = staged
            .deliver(|_, _| async { Err("upload failed".to_string()) })
            .await;

        assert_eq!(result.unwrap_err(), "upload failed");
        assert!(!path.exists());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
