//! Path parsing and resolution
//!
//! Handles parsing of remote paths in the format: alias/bucket[/key]
//! Local paths are passed through as-is. Also provides the prefix <-> relative
//! path mapping used by folder transfers and sync-delete reconciliation.

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// A parsed remote path pointing to an object storage location
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemotePath {
    /// Alias name
    pub alias: String,
    /// Bucket name
    pub bucket: String,
    /// Object key (empty for bucket root)
    pub key: String,
    /// Whether the path ends with a slash (directory semantics)
    pub is_dir: bool,
}

impl RemotePath {
    /// Create a new RemotePath. Leading slashes in the key are stripped,
    /// matching what the remote API expects.
    pub fn new(
        alias: impl Into<String>,
        bucket: impl Into<String>,
        key: impl Into<String>,
    ) -> Self {
        let key: String = key.into();
        let key = key.trim_start_matches('/').to_string();
        let is_dir = key.ends_with('/') || key.is_empty();
        Self {
            alias: alias.into(),
            bucket: bucket.into(),
            key,
            is_dir,
        }
    }

    /// Get the full path as a string (alias/bucket/key)
    pub fn to_full_path(&self) -> String {
        if self.key.is_empty() {
            format!("{}/{}", self.alias, self.bucket)
        } else {
            format!("{}/{}/{}", self.alias, self.bucket, self.key)
        }
    }

    /// The key as a directory-like prefix: empty stays empty, anything else
    /// gains a trailing slash.
    pub fn as_prefix(&self) -> String {
        if self.key.is_empty() || self.key.ends_with('/') {
            self.key.clone()
        } else {
            format!("{}/", self.key)
        }
    }

    /// A sibling path under the same alias and bucket
    pub fn with_key(&self, key: impl Into<String>) -> Self {
        Self::new(&self.alias, &self.bucket, key)
    }

    /// Join a child path component
    pub fn join(&self, child: &str) -> Self {
        let base = self.key.trim_end_matches('/');
        let key = if base.is_empty() {
            child.to_string()
        } else {
            format!("{base}/{child}")
        };
        Self::new(&self.alias, &self.bucket, key)
    }
}

impl std::fmt::Display for RemotePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_full_path())
    }
}

/// Parsed path that can be either local or remote
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedPath {
    /// Local filesystem path
    Local(PathBuf),
    /// Remote object storage path
    Remote(RemotePath),
}

impl ParsedPath {
    /// Check if this is a remote path
    pub fn is_remote(&self) -> bool {
        matches!(self, ParsedPath::Remote(_))
    }

    /// Check if this is a local path
    pub fn is_local(&self) -> bool {
        matches!(self, ParsedPath::Local(_))
    }

    /// Get the remote path if this is a remote path
    pub fn as_remote(&self) -> Option<&RemotePath> {
        match self {
            ParsedPath::Remote(p) => Some(p),
            ParsedPath::Local(_) => None,
        }
    }

    /// Get the local path if this is a local path
    pub fn as_local(&self) -> Option<&PathBuf> {
        match self {
            ParsedPath::Local(p) => Some(p),
            ParsedPath::Remote(_) => None,
        }
    }
}

/// Parse a path string into a ParsedPath
///
/// Remote paths have the format: alias/bucket[/key]
/// Local paths are anything that:
/// - Starts with / (absolute path)
/// - Starts with ./ or ../ (relative path)
/// - Or doesn't match the alias/bucket pattern
pub fn parse_path(path: &str) -> Result<ParsedPath> {
    if path.is_empty() {
        return Err(Error::InvalidPath("Path cannot be empty".into()));
    }

    // Absolute paths are local
    if path.starts_with('/') {
        return Ok(ParsedPath::Local(PathBuf::from(path)));
    }

    // Explicit relative paths are local
    if path.starts_with("./") || path.starts_with("../") {
        return Ok(ParsedPath::Local(PathBuf::from(path)));
    }

    // Windows absolute paths
    #[cfg(windows)]
    if path.len() >= 2 && path.chars().nth(1) == Some(':') {
        return Ok(ParsedPath::Local(PathBuf::from(path)));
    }

    let parts: Vec<&str> = path.splitn(3, '/').collect();

    match parts.len() {
        1 => {
            // A bare name with a dot or backslash is a local file in the
            // current directory; a bare alias is incomplete for transfers.
            if parts[0].contains('.') || parts[0].contains('\\') {
                Ok(ParsedPath::Local(PathBuf::from(path)))
            } else {
                Err(Error::InvalidPath(format!(
                    "Path '{path}' is incomplete. Use format: alias/bucket[/key]"
                )))
            }
        }
        2 => {
            let alias = parts[0];
            let bucket = parts[1];

            if !is_valid_alias_name(alias) {
                return Ok(ParsedPath::Local(PathBuf::from(path)));
            }

            if bucket.is_empty() {
                return Err(Error::InvalidPath("Bucket name cannot be empty".into()));
            }

            Ok(ParsedPath::Remote(RemotePath::new(alias, bucket, "")))
        }
        3 => {
            let alias = parts[0];
            let bucket = parts[1];
            let key = parts[2];

            if !is_valid_alias_name(alias) {
                return Ok(ParsedPath::Local(PathBuf::from(path)));
            }

            if bucket.is_empty() {
                return Err(Error::InvalidPath("Bucket name cannot be empty".into()));
            }

            Ok(ParsedPath::Remote(RemotePath::new(alias, bucket, key)))
        }
        _ => unreachable!(),
    }
}

/// Check if a string is a valid alias name
fn is_valid_alias_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// Strip a key prefix, yielding the path of the object relative to that
/// prefix. Returns None when the key does not live under the prefix.
///
/// The inverse of [`relative_to_key`]; folder downloads and sync-delete
/// rely on the round-trip being exact.
pub fn key_to_relative<'a>(prefix: &str, key: &'a str) -> Option<&'a str> {
    key.strip_prefix(prefix)
}

/// Re-join a relative object path under a key prefix.
pub fn relative_to_key(prefix: &str, relative: &str) -> String {
    format!("{prefix}{relative}")
}

/// Map a relative object path to a local filesystem path under `root`,
/// converting '/' separators to the platform separator.
pub fn relative_to_local(root: &Path, relative: &str) -> PathBuf {
    root.join(relative.replace('/', std::path::MAIN_SEPARATOR_STR))
}

/// Map a local path under `root` back to a relative object path with '/'
/// separators. Returns None when the path is not under `root`.
pub fn local_to_relative(root: &Path, local: &Path) -> Option<String> {
    let relative = local.strip_prefix(root).ok()?;
    let mut out = String::new();
    for component in relative.components() {
        if !out.is_empty() {
            out.push('/');
        }
        out.push_str(&component.as_os_str().to_string_lossy());
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_remote_path() {
        let path = parse_path("minio/bucket/file.txt").unwrap();
        assert!(path.is_remote());

        let remote = path.as_remote().unwrap();
        assert_eq!(remote.alias, "minio");
        assert_eq!(remote.bucket, "bucket");
        assert_eq!(remote.key, "file.txt");
        assert!(!remote.is_dir);
    }

    #[test]
    fn test_parse_remote_path_dir() {
        let path = parse_path("minio/bucket/dir/").unwrap();
        let remote = path.as_remote().unwrap();
        assert_eq!(remote.key, "dir/");
        assert!(remote.is_dir);
    }

    #[test]
    fn test_parse_remote_path_bucket_only() {
        let path = parse_path("minio/bucket").unwrap();
        let remote = path.as_remote().unwrap();
        assert_eq!(remote.alias, "minio");
        assert_eq!(remote.bucket, "bucket");
        assert_eq!(remote.key, "");
        assert!(remote.is_dir);
    }

    #[test]
    fn test_parse_local_absolute_path() {
        let path = parse_path("/home/user/file.txt").unwrap();
        assert!(path.is_local());
        assert_eq!(
            path.as_local().unwrap().to_str().unwrap(),
            "/home/user/file.txt"
        );
    }

    #[test]
    fn test_parse_local_relative_path() {
        let path = parse_path("./file.txt").unwrap();
        assert!(path.is_local());

        let path = parse_path("../file.txt").unwrap();
        assert!(path.is_local());
    }

    #[test]
    fn test_parse_empty_path() {
        assert!(parse_path("").is_err());
    }

    #[test]
    fn test_parse_alias_only() {
        assert!(parse_path("minio").is_err());
    }

    #[test]
    fn test_local_path_with_dots() {
        let path = parse_path("some.file.txt");
        assert!(path.is_ok());
        assert!(path.unwrap().is_local());
    }

    #[test]
    fn test_leading_slashes_stripped() {
        let remote = RemotePath::new("minio", "bucket", "//dir/file.txt");
        assert_eq!(remote.key, "dir/file.txt");
    }

    #[test]
    fn test_as_prefix() {
        assert_eq!(RemotePath::new("a", "b", "").as_prefix(), "");
        assert_eq!(RemotePath::new("a", "b", "dir").as_prefix(), "dir/");
        assert_eq!(RemotePath::new("a", "b", "dir/").as_prefix(), "dir/");
    }

    #[test]
    fn test_remote_path_join() {
        let path = RemotePath::new("minio", "bucket", "");
        let child = path.join("dir/");
        assert_eq!(child.key, "dir/");
        assert!(child.is_dir);

        let file = child.join("file.txt");
        assert_eq!(file.key, "dir/file.txt");
        assert!(!file.is_dir);
    }

    #[test]
    fn test_remote_path_display() {
        let path = RemotePath::new("minio", "bucket", "key/file.txt");
        assert_eq!(path.to_string(), "minio/bucket/key/file.txt");
    }

    #[test]
    fn test_key_relative_round_trip() {
        let prefix = "photos/2024/";
        let key = "photos/2024/trip/day1.jpg";
        let rel = key_to_relative(prefix, key).unwrap();
        assert_eq!(rel, "trip/day1.jpg");
        assert_eq!(relative_to_key(prefix, rel), key);
    }

    #[test]
    fn test_key_to_relative_outside_prefix() {
        assert!(key_to_relative("photos/", "video/a.mp4").is_none());
    }

    #[test]
    fn test_local_relative_round_trip() {
        let root = Path::new("/data/mirror");
        let local = relative_to_local(root, "trip/day1.jpg");
        let rel = local_to_relative(root, &local).unwrap();
        assert_eq!(rel, "trip/day1.jpg");
    }
}
