//! Local filesystem capability.
//!
//! The delta filter, directory materialization and the fetcher only touch the
//! disk through [`LocalStore`], so a run can be pointed at a fake store in
//! tests. [`FsStore`] is the real implementation.

use std::fs::{self, DirBuilder, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::time::SystemTime;

/// Permission bits for created directories and files (Unix only).
pub const CREATE_MODE: u32 = 0o755;

/// The subset of file metadata delta mode compares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalMetadata {
    pub len: u64,
    /// `None` on platforms without modification times.
    pub modified: Option<SystemTime>,
}

pub trait LocalStore: Send + Sync {
    /// Metadata of `path`, or `Ok(None)` if nothing exists there.
    fn stat(&self, path: &Path) -> io::Result<Option<LocalMetadata>>;

    /// Creates `path` and any missing ancestors. Succeeds if it already
    /// exists as a directory.
    fn create_dir_all(&self, path: &Path) -> io::Result<()>;

    /// Creates or truncates `path` and writes `contents` to it.
    fn write_file(&self, path: &Path, contents: &[u8]) -> io::Result<()>;
}

/// [`LocalStore`] on the real filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsStore;

impl LocalStore for FsStore {
    fn stat(&self, path: &Path) -> io::Result<Option<LocalMetadata>> {
        match fs::metadata(path) {
            Ok(meta) => Ok(Some(LocalMetadata {
                len: meta.len(),
                modified: meta.modified().ok(),
            })),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        let mut builder = DirBuilder::new();
        builder.recursive(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::DirBuilderExt;
            builder.mode(CREATE_MODE);
        }
        builder.create(path)
    }

    fn write_file(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(CREATE_MODE);
        }
        let mut file = options.open(path)?;
        file.write_all(contents)?;
        file.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_stat_missing_is_none() {
        let temp = TempDir::new().unwrap();
        assert_eq!(FsStore.stat(&temp.path().join("nope")).unwrap(), None);
    }

    #[test]
    fn test_write_then_stat() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("f.bin");
        FsStore.write_file(&path, b"hello").unwrap();
        let meta = FsStore.stat(&path).unwrap().unwrap();
        assert_eq!(meta.len, 5);
        assert!(meta.modified.is_some());
    }

    #[test]
    fn test_write_overwrites() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("f.txt");
        FsStore.write_file(&path, b"longer content").unwrap();
        FsStore.write_file(&path, b"short").unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"short");
    }

    #[test]
    fn test_create_dir_all_is_idempotent() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("a/b/c");
        FsStore.create_dir_all(&path).unwrap();
        FsStore.create_dir_all(&path).unwrap();
        assert!(path.is_dir());
    }

    #[cfg(unix)]
    #[test]
    fn test_created_directory_is_owner_rwx() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let path = temp.path().join("d");
        FsStore.create_dir_all(&path).unwrap();
        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o700, 0o700);
    }
}
