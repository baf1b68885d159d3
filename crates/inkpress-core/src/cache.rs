/*
 * cache.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Content-addressed cache directories under a build's scratch root.
 */

//! Content-addressed cache directories.
//!
//! Layout below the scratch root:
//!
//! ```text
//! <root>/template/<sha224(url)>             cloned remote templates
//! <root>/template/<sha224(url)>.lock        lock guarding the clone
//! <root>/transform/<sha224(id NUL template)>  staging dir per build rule
//! <root>/transform/<sha224(...)>.lock        lock guarding the staging dir
//! ```
//!
//! A clone is written under an exclusive lock and read under a shared one.
//! A staging dir is held exclusively from rendering until its artifacts
//! have been copied out.

use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use fs2::FileExt;
use sha2::{Digest, Sha224};
use tracing::{debug, warn};

/// Compute the SHA-224 hash of `content` as a lowercase hex string.
pub fn content_hash(content: &[u8]) -> String {
    let mut hasher = Sha224::new();
    hasher.update(content);
    hex::encode(hasher.finalize())
}

/// Directory layout of a scratch root.
#[derive(Debug, Clone)]
pub struct CacheLayout {
    root: PathBuf,
}

impl CacheLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Clone directory of a remote template.
    pub fn template_dir(&self, url: &str) -> PathBuf {
        self.root.join("template").join(content_hash(url.as_bytes()))
    }

    /// Staging directory of one (rule id, template reference) pair.
    ///
    /// The two parts are separated by a NUL byte so that distinct pairs
    /// never share a key.
    pub fn transform_dir(&self, id: &str, template: &str) -> PathBuf {
        let mut key = Vec::with_capacity(id.len() + template.len() + 1);
        key.extend_from_slice(id.as_bytes());
        key.push(0);
        key.extend_from_slice(template.as_bytes());
        self.root.join("transform").join(content_hash(&key))
    }
}

/// Create `path` unless it already exists.
///
/// Returns `true` if this call created the directory. Parents are created
/// as needed; the final component is created atomically, so of several
/// concurrent callers exactly one sees `true`.
pub fn create_dir_if_absent(path: &Path) -> io::Result<bool> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    match fs::create_dir(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists && path.is_dir() => Ok(false),
        Err(e) => Err(e),
    }
}

/// Lock on a cache entry, held until dropped.
///
/// The lock lives in a sibling file named `<entry>.lock`. Acquiring blocks
/// until no conflicting lock is held, by this or any other process.
#[derive(Debug)]
pub struct CacheLock {
    path: PathBuf,
    file: File,
}

impl CacheLock {
    /// Take an exclusive lock on `entry`.
    pub fn acquire(entry: &Path) -> io::Result<Self> {
        let lock = Self::open(entry)?;
        debug!(path = ?lock.path, "Acquiring exclusive cache lock");
        lock.file.lock_exclusive()?;
        Ok(lock)
    }

    /// Take a shared lock on `entry`.
    pub fn acquire_shared(entry: &Path) -> io::Result<Self> {
        let lock = Self::open(entry)?;
        debug!(path = ?lock.path, "Acquiring shared cache lock");
        lock.file.lock_shared()?;
        Ok(lock)
    }

    /// Turn an exclusive lock into a shared one.
    pub fn downgrade(&self) -> io::Result<()> {
        self.file.lock_shared()
    }

    fn open(entry: &Path) -> io::Result<Self> {
        let path = lock_path(entry);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)?;
        Ok(Self { path, file })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for CacheLock {
    fn drop(&mut self) {
        // The lock file is left in place.
        if let Err(e) = FileExt::unlock(&self.file) {
            warn!(path = ?self.path, error = %e, "Failed to release cache lock");
        }
    }
}

fn lock_path(entry: &Path) -> PathBuf {
    let mut name = entry.as_os_str().to_owned();
    name.push(".lock");
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_content_hash_is_sha224() {
        assert_eq!(
            content_hash(b""),
            "d14a028c2a3a2bc9476102bb288234c415a2b01f828ea62ac5b3e42f"
        );
        assert_eq!(content_hash(b"abc").len(), 56);
    }

    #[test]
    fn test_transform_dir_depends_on_both_parts() {
        let layout = CacheLayout::new("/scratch");
        let a = layout.transform_dir("D1", "https://example.com/t.git");
        let b = layout.transform_dir("D2", "https://example.com/t.git");
        let c = layout.transform_dir("D", "1https://example.com/t.git");
        assert_ne!(a, b);
        assert_ne!(a, c);
        assert!(a.starts_with("/scratch/transform"));
        assert_eq!(a, layout.transform_dir("D1", "https://example.com/t.git"));
    }

    #[test]
    fn test_template_dir_is_stable() {
        let layout = CacheLayout::new("/scratch");
        let url = "https://example.com/t.git";
        assert_eq!(layout.template_dir(url), layout.template_dir(url));
        assert!(layout.template_dir(url).starts_with("/scratch/template"));
    }

    #[test]
    fn test_create_dir_if_absent() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("template").join("abc");
        assert!(create_dir_if_absent(&dir).unwrap());
        assert!(!create_dir_if_absent(&dir).unwrap());

        let file = temp.path().join("plain");
        fs::write(&file, "x").unwrap();
        assert!(create_dir_if_absent(&file).is_err());
    }

    #[test]
    fn test_cache_lock_file_beside_entry() {
        let temp = TempDir::new().unwrap();
        let entry = temp.path().join("template").join("abc");
        let lock = CacheLock::acquire(&entry).unwrap();
        assert_eq!(lock.path(), temp.path().join("template").join("abc.lock"));
        assert!(lock.path().exists());
        drop(lock);

        // Re-acquiring after release must not block.
        let _again = CacheLock::acquire(&entry).unwrap();
    }

    #[test]
    fn test_shared_locks_coexist() {
        let temp = TempDir::new().unwrap();
        let entry = temp.path().join("abc");
        let writer = CacheLock::acquire(&entry).unwrap();
        writer.downgrade().unwrap();

        let reader = CacheLock::acquire_shared(&entry).unwrap();
        let observer = File::open(lock_path(&entry)).unwrap();
        assert!(observer.try_lock_shared().is_ok());
        FileExt::unlock(&observer).unwrap();
        assert!(observer.try_lock_exclusive().is_err());

        drop(writer);
        drop(reader);
        assert!(observer.try_lock_exclusive().is_ok());
    }

    #[test]
    fn test_exclusive_lock_blocks_other_holders() {
        let temp = TempDir::new().unwrap();
        let entry = temp.path().join("abc");
        let lock = CacheLock::acquire(&entry).unwrap();

        let other = File::open(lock_path(&entry)).unwrap();
        assert!(other.try_lock_shared().is_err());
        drop(lock);
        assert!(other.try_lock_shared().is_ok());
    }
}
