//! ObjectStore trait definition
//!
//! This trait defines the interface for S3-compatible storage operations.
//! It allows the transfer engine and the CLI to be decoupled from the
//! specific S3 SDK implementation.

use std::collections::HashMap;
use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::io::AsyncRead;

use crate::error::Result;
use crate::path::RemotePath;

/// User-metadata key under which the full-object content hash is stored.
///
/// Attached on upload and compared by sync mode; the remote echoes it back
/// in HEAD responses.
pub const CONTENT_MD5_META_KEY: &str = "md5";

/// Metadata for an object or bucket
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectInfo {
    /// Object key or bucket name
    pub key: String,

    /// Size in bytes (None for buckets)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<i64>,

    /// Human-readable size
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_human: Option<String>,

    /// Last modified timestamp
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<jiff::Timestamp>,

    /// ETag (usually MD5 for single-part uploads)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,

    /// Content hash stored as user metadata at upload time
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_md5: Option<String>,

    /// Storage class
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_class: Option<String>,

    /// Content type
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,

    /// Whether this is a directory/prefix
    pub is_dir: bool,
}

impl ObjectInfo {
    /// Create a new ObjectInfo for a file
    pub fn file(key: impl Into<String>, size: i64) -> Self {
        Self {
            key: key.into(),
            size_bytes: Some(size),
            size_human: Some(humansize::format_size(size.max(0) as u64, humansize::BINARY)),
            last_modified: None,
            etag: None,
            content_md5: None,
            storage_class: None,
            content_type: None,
            is_dir: false,
        }
    }

    /// Create a new ObjectInfo for a directory/prefix
    pub fn dir(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            size_bytes: None,
            size_human: None,
            last_modified: None,
            etag: None,
            content_md5: None,
            storage_class: None,
            content_type: None,
            is_dir: true,
        }
    }

    /// Create a new ObjectInfo for a bucket
    pub fn bucket(name: impl Into<String>) -> Self {
        Self::dir(name)
    }
}

/// Result of a plain (non-versioned) list operation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListResult {
    /// Listed objects and common prefixes
    pub items: Vec<ObjectInfo>,

    /// Whether the result is truncated (more items available)
    pub truncated: bool,

    /// Continuation marker for the next page
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_marker: Option<String>,
}

/// One entry of a versioned listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectVersion {
    pub key: String,

    pub version_id: String,

    /// Whether this is the current version of the key
    pub is_latest: bool,

    /// Delete markers have no body
    pub is_delete_marker: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<jiff::Timestamp>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
}

/// Result of a versioned list operation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionedListResult {
    pub versions: Vec<ObjectVersion>,

    pub truncated: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_key_marker: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_version_id_marker: Option<String>,
}

/// A listing page, either plain or versioned.
///
/// The two shapes are structurally different; callers match instead of
/// downcasting a shared interface type.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ObjectListing {
    Plain(ListResult),
    Versioned(VersionedListResult),
}

/// Options for plain list operations
#[derive(Debug, Clone, Default)]
pub struct ListOptions {
    /// Maximum number of keys to return per request
    pub max_keys: Option<i32>,

    /// Delimiter for grouping (usually "/")
    pub delimiter: Option<String>,

    /// Additional prefix appended to the path key
    pub prefix: Option<String>,

    /// Continuation marker for pagination
    pub marker: Option<String>,

    /// Whether to list recursively (ignore delimiter)
    pub recursive: bool,
}

/// Options for versioned list operations
#[derive(Debug, Clone, Default)]
pub struct VersionListOptions {
    pub max_keys: Option<i32>,

    pub delimiter: Option<String>,

    pub key_marker: Option<String>,

    pub version_id_marker: Option<String>,

    pub recursive: bool,
}

/// An inclusive byte range, HTTP Range header style
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    pub end: u64,
}

impl ByteRange {
    /// Range covering `len` bytes starting at `offset`
    pub fn from_offset(offset: u64, len: u64) -> Self {
        Self {
            start: offset,
            end: offset + len.saturating_sub(1),
        }
    }

    pub fn len(&self) -> u64 {
        self.end - self.start + 1
    }

    pub fn is_empty(&self) -> bool {
        self.end < self.start
    }

    /// Render as an HTTP Range header value
    pub fn to_header(&self) -> String {
        format!("bytes={}-{}", self.start, self.end)
    }
}

/// Body of a put operation
#[derive(Debug, Clone)]
pub enum PutBody {
    /// In-memory bytes (small objects, parts)
    Bytes(Vec<u8>),
    /// Stream the named local file
    File(PathBuf),
}

impl PutBody {
    pub fn empty() -> Self {
        PutBody::Bytes(Vec::new())
    }
}

/// Header/metadata overrides attached to uploads and copies
#[derive(Debug, Clone, Default)]
pub struct ObjectMeta {
    pub content_type: Option<String>,

    pub storage_class: Option<String>,

    /// Content hash recorded under [`CONTENT_MD5_META_KEY`]
    pub content_md5: Option<String>,

    /// Additional user metadata entries
    pub metadata: HashMap<String, String>,
}

/// One part of a multipart upload, as reported or submitted to the remote
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartInfo {
    pub part_number: i32,

    pub etag: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<i64>,
}

/// Result of a ListParts call
#[derive(Debug, Clone, Default)]
pub struct ListPartsResult {
    pub parts: Vec<PartInfo>,

    pub truncated: bool,

    pub next_part_number_marker: Option<String>,
}

/// An in-progress multipart upload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MultipartUpload {
    pub key: String,

    pub upload_id: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub initiated: Option<jiff::Timestamp>,
}

/// Result of a ListMultipartUploads call
#[derive(Debug, Clone, Default)]
pub struct ListUploadsResult {
    pub uploads: Vec<MultipartUpload>,

    pub truncated: bool,

    pub next_key_marker: Option<String>,

    pub next_upload_id_marker: Option<String>,
}

/// Identifies one object (optionally one version) for deletion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectIdent {
    pub key: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub version_id: Option<String>,
}

impl ObjectIdent {
    pub fn key(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            version_id: None,
        }
    }

    pub fn version(key: impl Into<String>, version_id: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            version_id: Some(version_id.into()),
        }
    }
}

/// Per-key failure inside a batch delete
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteError {
    pub key: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Result of a batch delete
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeleteResult {
    pub deleted: Vec<ObjectIdent>,

    pub errors: Vec<DeleteError>,
}

/// Source of a server-side copy, within the same endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyLocator {
    pub bucket: String,
    pub key: String,
}

impl CopyLocator {
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
        }
    }

    /// Render as the CopySource request value: bucket/key
    pub fn to_source_string(&self) -> String {
        format!("{}/{}", self.bucket, self.key)
    }
}

impl From<&RemotePath> for CopyLocator {
    fn from(path: &RemotePath) -> Self {
        Self::new(&path.bucket, &path.key)
    }
}

/// Bucket versioning state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VersioningStatus {
    Enabled,
    Suspended,
    /// Versioning has never been configured on the bucket
    Unset,
}

impl std::fmt::Display for VersioningStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VersioningStatus::Enabled => write!(f, "Enabled"),
            VersioningStatus::Suspended => write!(f, "Suspended"),
            VersioningStatus::Unset => write!(f, "Unset"),
        }
    }
}

/// Restore tier for archived objects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestoreTier {
    Expedited,
    Standard,
    Bulk,
}

/// Parameters of an archive restore request
#[derive(Debug, Clone)]
pub struct RestoreRequest {
    /// Days the restored copy stays available
    pub days: i32,
    pub tier: RestoreTier,
}

/// One ACL grant as reported by the remote
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AclGrant {
    pub grantee: String,
    pub permission: String,
}

/// ACL state of a bucket or object
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AclGrants {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,

    pub grants: Vec<AclGrant>,
}

/// ACL change request: a canned ACL and/or explicit grant lists
#[derive(Debug, Clone, Default)]
pub struct AclUpdate {
    /// Canned ACL name, e.g. "private" or "public-read"
    pub canned: Option<String>,

    pub grant_read: Vec<String>,

    pub grant_write: Vec<String>,

    pub grant_full_control: Vec<String>,
}

/// Streamed object content
pub type ObjectReader = Box<dyn AsyncRead + Send + Unpin>;

/// Trait for S3-compatible storage operations
///
/// Implemented by the S3 adapter; engine tests supply an in-memory double.
/// Absent objects surface as [`crate::Error::NotFound`] so callers can treat
/// 404 as a branch signal rather than a failure.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// List buckets
    async fn list_buckets(&self) -> Result<Vec<ObjectInfo>>;

    /// Check if a bucket exists
    async fn bucket_exists(&self, bucket: &str) -> Result<bool>;

    /// Create a bucket
    async fn create_bucket(&self, bucket: &str) -> Result<()>;

    /// Delete a bucket
    async fn delete_bucket(&self, bucket: &str) -> Result<()>;

    /// List objects under a bucket or prefix
    async fn list_objects(&self, path: &RemotePath, options: ListOptions) -> Result<ListResult>;

    /// List object versions under a bucket or prefix
    async fn list_object_versions(
        &self,
        path: &RemotePath,
        options: VersionListOptions,
    ) -> Result<VersionedListResult>;

    /// Get object metadata
    async fn head_object(&self, path: &RemotePath) -> Result<ObjectInfo>;

    /// Get object content, optionally limited to a byte range
    async fn get_object(&self, path: &RemotePath, range: Option<ByteRange>)
        -> Result<ObjectReader>;

    /// Upload an object in a single request
    async fn put_object(
        &self,
        path: &RemotePath,
        body: PutBody,
        meta: &ObjectMeta,
    ) -> Result<ObjectInfo>;

    /// Delete one object (optionally one version)
    async fn delete_object(&self, path: &RemotePath, version_id: Option<&str>) -> Result<()>;

    /// Delete a batch of objects in one request
    async fn delete_objects(&self, bucket: &str, objects: Vec<ObjectIdent>)
        -> Result<DeleteResult>;

    /// Server-side copy of a whole object
    async fn copy_object(
        &self,
        dst: &RemotePath,
        src: &CopyLocator,
        meta: &ObjectMeta,
    ) -> Result<ObjectInfo>;

    /// Start a multipart upload, returning the upload id
    async fn create_multipart_upload(&self, path: &RemotePath, meta: &ObjectMeta)
        -> Result<String>;

    /// Upload one part, returning its etag
    async fn upload_part(
        &self,
        path: &RemotePath,
        upload_id: &str,
        part_number: i32,
        body: Vec<u8>,
    ) -> Result<String>;

    /// Server-side copy of a source byte range into one part, returning its etag
    async fn upload_part_copy(
        &self,
        path: &RemotePath,
        upload_id: &str,
        part_number: i32,
        src: &CopyLocator,
        range: ByteRange,
    ) -> Result<String>;

    /// List parts already uploaded for an in-progress multipart upload
    async fn list_parts(
        &self,
        path: &RemotePath,
        upload_id: &str,
        marker: Option<String>,
    ) -> Result<ListPartsResult>;

    /// Complete a multipart upload; parts must be sorted ascending by number
    async fn complete_multipart_upload(
        &self,
        path: &RemotePath,
        upload_id: &str,
        parts: &[PartInfo],
    ) -> Result<()>;

    /// Abort a multipart upload, discarding its parts
    async fn abort_multipart_upload(&self, path: &RemotePath, upload_id: &str) -> Result<()>;

    /// List in-progress multipart uploads under a prefix
    async fn list_multipart_uploads(
        &self,
        path: &RemotePath,
        key_marker: Option<String>,
        upload_id_marker: Option<String>,
    ) -> Result<ListUploadsResult>;

    /// Restore an archived object
    async fn restore_object(&self, path: &RemotePath, request: &RestoreRequest) -> Result<()>;

    /// Get bucket versioning state
    async fn get_bucket_versioning(&self, bucket: &str) -> Result<VersioningStatus>;

    /// Enable or suspend bucket versioning
    async fn put_bucket_versioning(&self, bucket: &str, enabled: bool) -> Result<()>;

    /// Get object ACL
    async fn get_object_acl(&self, path: &RemotePath) -> Result<AclGrants>;

    /// Set object ACL
    async fn put_object_acl(&self, path: &RemotePath, update: &AclUpdate) -> Result<()>;

    /// Get bucket ACL
    async fn get_bucket_acl(&self, bucket: &str) -> Result<AclGrants>;

    /// Set bucket ACL
    async fn put_bucket_acl(&self, bucket: &str, update: &AclUpdate) -> Result<()>;

    /// Generate a presigned GET URL
    async fn presign_get(&self, path: &RemotePath, expires_secs: u64) -> Result<String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_info_file() {
        let info = ObjectInfo::file("test.txt", 1024);
        assert_eq!(info.key, "test.txt");
        assert_eq!(info.size_bytes, Some(1024));
        assert!(!info.is_dir);
    }

    #[test]
    fn test_object_info_dir() {
        let info = ObjectInfo::dir("path/to/dir/");
        assert_eq!(info.key, "path/to/dir/");
        assert!(info.is_dir);
        assert!(info.size_bytes.is_none());
    }

    #[test]
    fn test_byte_range() {
        let range = ByteRange::from_offset(0, 100);
        assert_eq!(range.start, 0);
        assert_eq!(range.end, 99);
        assert_eq!(range.len(), 100);
        assert_eq!(range.to_header(), "bytes=0-99");

        let range = ByteRange::from_offset(200, 50);
        assert_eq!(range.to_header(), "bytes=200-249");
        assert_eq!(range.len(), 50);
    }

    #[test]
    fn test_copy_locator_source_string() {
        let src = CopyLocator::new("bucket", "dir/file.bin");
        assert_eq!(src.to_source_string(), "bucket/dir/file.bin");
    }

    #[test]
    fn test_listing_tagged_serialization() {
        let listing = ObjectListing::Plain(ListResult {
            items: vec![ObjectInfo::file("a.txt", 1)],
            truncated: false,
            next_marker: None,
        });
        let json = serde_json::to_string(&listing).unwrap();
        assert!(json.contains("\"kind\":\"plain\""));

        let listing = ObjectListing::Versioned(VersionedListResult {
            versions: vec![],
            truncated: false,
            next_key_marker: None,
            next_version_id_marker: None,
        });
        let json = serde_json::to_string(&listing).unwrap();
        assert!(json.contains("\"kind\":\"versioned\""));
    }
}
