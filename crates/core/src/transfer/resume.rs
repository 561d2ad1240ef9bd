//! Durable resume state for multipart uploads
//!
//! One small file per in-progress upload, named by the task fingerprint and
//! holding the remote upload id as its entire contents. The locally cached
//! record only names the upload; the remote part listing stays authoritative
//! for which parts completed.
//!
//! Store I/O failures are never fatal: they degrade to "no resume available"
//! with a warning and the transfer proceeds fresh.

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::hash;

/// Stable identity of one upload task: absolute local path, file size, and
/// remote key. Changing any component invalidates resumability, so a
/// different file at the same remote key can never reuse a stale upload.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn new(local_abs_path: &Path, file_size: u64, remote_key: &str) -> Self {
        let seed = format!("{}!!!{}!!!{}", local_abs_path.display(), file_size, remote_key);
        Self(hash::md5_hex(seed.as_bytes()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Persists upload ids under a local cache directory
#[derive(Debug, Clone)]
pub struct ResumeStore {
    dir: PathBuf,
}

impl ResumeStore {
    /// Store under the user cache directory (~/.cache/osc/uploads)
    pub fn new() -> Result<Self> {
        let dir = dirs::cache_dir()
            .ok_or_else(|| Error::Config("Could not determine cache directory".into()))?
            .join("osc")
            .join("uploads");
        Ok(Self { dir })
    }

    /// Store under a custom directory (useful for testing)
    pub fn with_dir(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// File holding the upload id for this fingerprint
    pub fn path_for(&self, fingerprint: &Fingerprint) -> PathBuf {
        self.dir.join(fingerprint.as_str())
    }

    /// Load the recorded upload id, or None when absent or unreadable
    pub fn load(&self, fingerprint: &Fingerprint) -> Option<String> {
        let path = self.path_for(fingerprint);
        match std::fs::read_to_string(&path) {
            Ok(content) => {
                let upload_id = content.trim().to_string();
                if upload_id.is_empty() {
                    None
                } else {
                    Some(upload_id)
                }
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => None,
            Err(err) => {
                tracing::warn!("Cannot read resume record {}: {err}", path.display());
                None
            }
        }
    }

    /// Record an upload id. Failures are logged and swallowed; losing the
    /// record only costs resumability, not correctness.
    pub fn save(&self, fingerprint: &Fingerprint, upload_id: &str) {
        let path = self.path_for(fingerprint);
        let write = || -> std::io::Result<()> {
            std::fs::create_dir_all(&self.dir)?;
            std::fs::write(&path, upload_id)
        };
        if let Err(err) = write() {
            tracing::warn!("Cannot write resume record {}: {err}", path.display());
        }
    }

    /// Drop the record after a successful completion
    pub fn delete(&self, fingerprint: &Fingerprint) {
        let path = self.path_for(fingerprint);
        match std::fs::remove_file(&path) {
            Ok(()) => {}
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => {
                tracing::warn!(
                    "Cannot delete resume record {}, please remove it manually: {err}",
                    path.display()
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store() -> (ResumeStore, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = ResumeStore::with_dir(dir.path().join("uploads"));
        (store, dir)
    }

    #[test]
    fn test_fingerprint_is_stable() {
        let a = Fingerprint::new(Path::new("/data/a.bin"), 100, "backup/a.bin");
        let b = Fingerprint::new(Path::new("/data/a.bin"), 100, "backup/a.bin");
        assert_eq!(a, b);
    }

    #[test]
    fn test_fingerprint_sensitivity() {
        let base = Fingerprint::new(Path::new("/data/a.bin"), 100, "backup/a.bin");

        let other_size = Fingerprint::new(Path::new("/data/a.bin"), 101, "backup/a.bin");
        assert_ne!(base, other_size);

        let other_key = Fingerprint::new(Path::new("/data/a.bin"), 100, "backup/b.bin");
        assert_ne!(base, other_key);

        let other_path = Fingerprint::new(Path::new("/data/b.bin"), 100, "backup/a.bin");
        assert_ne!(base, other_path);
    }

    #[test]
    fn test_save_load_delete_round_trip() {
        let (store, _dir) = temp_store();
        let fp = Fingerprint::new(Path::new("/data/a.bin"), 100, "a.bin");

        assert!(store.load(&fp).is_none());

        store.save(&fp, "upload-123");
        assert_eq!(store.load(&fp).as_deref(), Some("upload-123"));

        store.delete(&fp);
        assert!(store.load(&fp).is_none());
    }

    #[test]
    fn test_load_trims_whitespace() {
        let (store, _dir) = temp_store();
        let fp = Fingerprint::new(Path::new("/data/a.bin"), 1, "a");
        std::fs::create_dir_all(store.dir.clone()).unwrap();
        std::fs::write(store.path_for(&fp), "upload-42\n").unwrap();

        assert_eq!(store.load(&fp).as_deref(), Some("upload-42"));
    }

    #[test]
    fn test_empty_record_is_no_resume() {
        let (store, _dir) = temp_store();
        let fp = Fingerprint::new(Path::new("/data/a.bin"), 1, "a");
        std::fs::create_dir_all(store.dir.clone()).unwrap();
        std::fs::write(store.path_for(&fp), "").unwrap();

        assert!(store.load(&fp).is_none());
    }

    #[test]
    fn test_delete_missing_record_is_quiet() {
        let (store, _dir) = temp_store();
        let fp = Fingerprint::new(Path::new("/data/a.bin"), 1, "a");
        store.delete(&fp);
    }
}
