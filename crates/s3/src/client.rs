//! S3 client implementation
//!
//! Wraps aws-sdk-s3 and implements the ObjectStore trait from osc-core.

use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{
    BucketCannedAcl, BucketVersioningStatus, CompletedMultipartUpload, CompletedPart, Delete,
    GlacierJobParameters, ObjectCannedAcl, ObjectIdentifier, RestoreRequest as SdkRestoreRequest,
    StorageClass, Tier, VersioningConfiguration,
};

use osc_core::traits::{
    AclGrants, AclUpdate, ByteRange, CopyLocator, DeleteError, DeleteResult, ListOptions,
    ListPartsResult, ListResult, ListUploadsResult, MultipartUpload, ObjectIdent, ObjectInfo,
    ObjectListing, ObjectMeta, ObjectReader, ObjectStore, ObjectVersion, PartInfo, PutBody,
    RestoreRequest, RestoreTier, VersionListOptions, VersionedListResult, VersioningStatus,
    CONTENT_MD5_META_KEY,
};
use osc_core::{Alias, Error, RemotePath, Result};

/// S3 client wrapper
pub struct S3Client {
    inner: aws_sdk_s3::Client,
    #[allow(dead_code)]
    alias: Alias,
}

impl S3Client {
    /// Create a new S3 client from an alias configuration
    pub async fn new(alias: Alias) -> Result<Self> {
        let endpoint = alias.endpoint.clone();
        let region = alias.region.clone();
        let access_key = alias.access_key.clone();
        let secret_key = alias.secret_key.clone();
        let session_token = alias.session_token.clone();

        let credentials = aws_credential_types::Credentials::new(
            access_key,
            secret_key,
            session_token,
            None, // expiry
            "osc-static-credentials",
        );

        let config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .credentials_provider(credentials)
            .region(aws_config::Region::new(region))
            .endpoint_url(&endpoint)
            .load()
            .await;

        // Path-style addressing for compatibility with self-hosted backends
        let s3_config = aws_sdk_s3::config::Builder::from(&config)
            .force_path_style(alias.bucket_lookup == "path" || alias.bucket_lookup == "auto")
            .build();

        let client = aws_sdk_s3::Client::from_conf(s3_config);

        Ok(Self {
            inner: client,
            alias,
        })
    }

    /// Get the underlying aws-sdk-s3 client
    pub fn inner(&self) -> &aws_sdk_s3::Client {
        &self.inner
    }

    /// Combined user metadata map for a put-style request
    fn metadata_map(meta: &ObjectMeta) -> Option<HashMap<String, String>> {
        let mut map = meta.metadata.clone();
        if let Some(md5) = &meta.content_md5 {
            map.insert(CONTENT_MD5_META_KEY.to_string(), md5.clone());
        }
        if map.is_empty() {
            None
        } else {
            Some(map)
        }
    }

    fn info_from_head(
        key: &str,
        size: i64,
        response: &aws_sdk_s3::operation::head_object::HeadObjectOutput,
    ) -> ObjectInfo {
        let mut info = ObjectInfo::file(key, size);

        if let Some(modified) = response.last_modified() {
            info.last_modified = jiff::Timestamp::from_second(modified.secs()).ok();
        }
        if let Some(etag) = response.e_tag() {
            info.etag = Some(etag.trim_matches('"').to_string());
        }
        if let Some(ct) = response.content_type() {
            info.content_type = Some(ct.to_string());
        }
        if let Some(sc) = response.storage_class() {
            info.storage_class = Some(sc.as_str().to_string());
        }
        if let Some(metadata) = response.metadata() {
            info.content_md5 = metadata.get(CONTENT_MD5_META_KEY).cloned();
        }
        info
    }
}

/// Classify an SDK error by its rendered text, the way the service reports
/// absence vs. access vs. transport problems.
fn classify(what: &str, err_text: String) -> Error {
    if err_text.contains("NotFound")
        || err_text.contains("NoSuchKey")
        || err_text.contains("NoSuchBucket")
        || err_text.contains("NoSuchUpload")
    {
        Error::NotFound(what.to_string())
    } else if err_text.contains("AccessDenied")
        || err_text.contains("InvalidAccessKeyId")
        || err_text.contains("SignatureDoesNotMatch")
    {
        Error::Auth(err_text)
    } else {
        Error::Network(err_text)
    }
}

#[async_trait]
impl ObjectStore for S3Client {
    async fn list_buckets(&self) -> Result<Vec<ObjectInfo>> {
        let response = self
            .inner
            .list_buckets()
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        let buckets = response
            .buckets()
            .iter()
            .map(|b| {
                let mut info = ObjectInfo::bucket(b.name().unwrap_or_default());
                if let Some(creation_date) = b.creation_date() {
                    info.last_modified = jiff::Timestamp::from_second(creation_date.secs()).ok();
                }
                info
            })
            .collect();

        Ok(buckets)
    }

    async fn bucket_exists(&self, bucket: &str) -> Result<bool> {
        match self.inner.head_bucket().bucket(bucket).send().await {
            Ok(_) => Ok(true),
            Err(e) => match classify(bucket, e.to_string()) {
                Error::NotFound(_) => Ok(false),
                err => Err(err),
            },
        }
    }

    async fn create_bucket(&self, bucket: &str) -> Result<()> {
        self.inner
            .create_bucket()
            .bucket(bucket)
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        Ok(())
    }

    async fn delete_bucket(&self, bucket: &str) -> Result<()> {
        self.inner
            .delete_bucket()
            .bucket(bucket)
            .send()
            .await
            .map_err(|e| classify(&format!("Bucket not found: {bucket}"), e.to_string()))?;

        Ok(())
    }

    async fn list_objects(&self, path: &RemotePath, options: ListOptions) -> Result<ListResult> {
        let mut request = self.inner.list_objects_v2().bucket(&path.bucket);

        let prefix = if path.key.is_empty() {
            options.prefix.clone()
        } else if let Some(p) = &options.prefix {
            Some(format!("{}{}", path.key, p))
        } else {
            Some(path.key.clone())
        };
        if let Some(p) = prefix {
            request = request.prefix(p);
        }

        if !options.recursive {
            request = request.delimiter(options.delimiter.as_deref().unwrap_or("/"));
        }
        if let Some(max) = options.max_keys {
            request = request.max_keys(max);
        }
        if let Some(marker) = &options.marker {
            request = request.continuation_token(marker);
        }

        let response = request
            .send()
            .await
            .map_err(|e| classify(&path.to_string(), e.to_string()))?;

        let mut items = Vec::new();

        for prefix in response.common_prefixes() {
            if let Some(p) = prefix.prefix() {
                items.push(ObjectInfo::dir(p));
            }
        }

        for object in response.contents() {
            let key = object.key().unwrap_or_default().to_string();
            let size = object.size().unwrap_or(0);
            let mut info = ObjectInfo::file(&key, size);

            if let Some(modified) = object.last_modified() {
                info.last_modified = jiff::Timestamp::from_second(modified.secs()).ok();
            }
            if let Some(etag) = object.e_tag() {
                info.etag = Some(etag.trim_matches('"').to_string());
            }
            if let Some(sc) = object.storage_class() {
                info.storage_class = Some(sc.as_str().to_string());
            }

            items.push(info);
        }

        Ok(ListResult {
            items,
            truncated: response.is_truncated().unwrap_or(false),
            next_marker: response.next_continuation_token().map(|s| s.to_string()),
        })
    }

    async fn list_object_versions(
        &self,
        path: &RemotePath,
        options: VersionListOptions,
    ) -> Result<VersionedListResult> {
        let mut request = self
            .inner
            .list_object_versions()
            .bucket(&path.bucket)
            .prefix(&path.key);

        if !options.recursive {
            request = request.delimiter(options.delimiter.as_deref().unwrap_or("/"));
        }
        if let Some(max) = options.max_keys {
            request = request.max_keys(max);
        }
        if let Some(marker) = &options.key_marker {
            request = request.key_marker(marker);
        }
        if let Some(marker) = &options.version_id_marker {
            request = request.version_id_marker(marker);
        }

        let response = request
            .send()
            .await
            .map_err(|e| classify(&path.to_string(), e.to_string()))?;

        let mut versions = Vec::new();

        for marker in response.delete_markers() {
            versions.push(ObjectVersion {
                key: marker.key().unwrap_or_default().to_string(),
                version_id: marker.version_id().unwrap_or_default().to_string(),
                is_latest: marker.is_latest().unwrap_or(false),
                is_delete_marker: true,
                size_bytes: None,
                last_modified: marker
                    .last_modified()
                    .and_then(|t| jiff::Timestamp::from_second(t.secs()).ok()),
                etag: None,
            });
        }

        for version in response.versions() {
            versions.push(ObjectVersion {
                key: version.key().unwrap_or_default().to_string(),
                version_id: version.version_id().unwrap_or_default().to_string(),
                is_latest: version.is_latest().unwrap_or(false),
                is_delete_marker: false,
                size_bytes: version.size(),
                last_modified: version
                    .last_modified()
                    .and_then(|t| jiff::Timestamp::from_second(t.secs()).ok()),
                etag: version.e_tag().map(|e| e.trim_matches('"').to_string()),
            });
        }

        Ok(VersionedListResult {
            versions,
            truncated: response.is_truncated().unwrap_or(false),
            next_key_marker: response.next_key_marker().map(|s| s.to_string()),
            next_version_id_marker: response.next_version_id_marker().map(|s| s.to_string()),
        })
    }

    async fn head_object(&self, path: &RemotePath) -> Result<ObjectInfo> {
        let response = self
            .inner
            .head_object()
            .bucket(&path.bucket)
            .key(&path.key)
            .send()
            .await
            .map_err(|e| classify(&path.to_string(), e.to_string()))?;

        let size = response.content_length().unwrap_or(0);
        Ok(Self::info_from_head(&path.key, size, &response))
    }

    async fn get_object(
        &self,
        path: &RemotePath,
        range: Option<ByteRange>,
    ) -> Result<ObjectReader> {
        let mut request = self.inner.get_object().bucket(&path.bucket).key(&path.key);
        if let Some(range) = range {
            request = request.range(range.to_header());
        }

        let response = request
            .send()
            .await
            .map_err(|e| classify(&path.to_string(), e.to_string()))?;

        Ok(Box::new(Box::pin(response.body.into_async_read())))
    }

    async fn put_object(
        &self,
        path: &RemotePath,
        body: PutBody,
        meta: &ObjectMeta,
    ) -> Result<ObjectInfo> {
        let (stream, size) = match body {
            PutBody::Bytes(bytes) => {
                let size = bytes.len() as i64;
                (ByteStream::from(bytes), size)
            }
            PutBody::File(file) => {
                let size = std::fs::metadata(&file)?.len() as i64;
                let stream = ByteStream::from_path(&file)
                    .await
                    .map_err(|e| Error::General(format!("Cannot stream {}: {e}", file.display())))?;
                (stream, size)
            }
        };

        let mut request = self
            .inner
            .put_object()
            .bucket(&path.bucket)
            .key(&path.key)
            .body(stream)
            .set_metadata(Self::metadata_map(meta));

        if let Some(ct) = &meta.content_type {
            request = request.content_type(ct);
        }
        if let Some(sc) = &meta.storage_class {
            request = request.storage_class(StorageClass::from(sc.as_str()));
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        let mut info = ObjectInfo::file(&path.key, size);
        if let Some(etag) = response.e_tag() {
            info.etag = Some(etag.trim_matches('"').to_string());
        }
        info.content_md5 = meta.content_md5.clone();
        info.last_modified = Some(jiff::Timestamp::now());

        Ok(info)
    }

    async fn delete_object(&self, path: &RemotePath, version_id: Option<&str>) -> Result<()> {
        self.inner
            .delete_object()
            .bucket(&path.bucket)
            .key(&path.key)
            .set_version_id(version_id.map(|s| s.to_string()))
            .send()
            .await
            .map_err(|e| classify(&path.to_string(), e.to_string()))?;

        Ok(())
    }

    async fn delete_objects(
        &self,
        bucket: &str,
        objects: Vec<ObjectIdent>,
    ) -> Result<DeleteResult> {
        if objects.is_empty() {
            return Ok(DeleteResult::default());
        }

        let identifiers: Vec<ObjectIdentifier> = objects
            .iter()
            .map(|ident| {
                ObjectIdentifier::builder()
                    .key(&ident.key)
                    .set_version_id(ident.version_id.clone())
                    .build()
                    .map_err(|e| Error::General(e.to_string()))
            })
            .collect::<Result<_>>()?;

        let delete = Delete::builder()
            .set_objects(Some(identifiers))
            .build()
            .map_err(|e| Error::General(e.to_string()))?;

        let response = self
            .inner
            .delete_objects()
            .bucket(bucket)
            .delete(delete)
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        let deleted = response
            .deleted()
            .iter()
            .filter_map(|d| {
                d.key().map(|k| ObjectIdent {
                    key: k.to_string(),
                    version_id: d.version_id().map(|v| v.to_string()),
                })
            })
            .collect();

        let errors = response
            .errors()
            .iter()
            .map(|e| DeleteError {
                key: e.key().unwrap_or_default().to_string(),
                code: e.code().map(|c| c.to_string()),
                message: e.message().map(|m| m.to_string()),
            })
            .collect();

        Ok(DeleteResult { deleted, errors })
    }

    async fn copy_object(
        &self,
        dst: &RemotePath,
        src: &CopyLocator,
        meta: &ObjectMeta,
    ) -> Result<ObjectInfo> {
        let mut request = self
            .inner
            .copy_object()
            .copy_source(src.to_source_string())
            .bucket(&dst.bucket)
            .key(&dst.key);

        if let Some(sc) = &meta.storage_class {
            request = request.storage_class(StorageClass::from(sc.as_str()));
        }

        let response = request
            .send()
            .await
            .map_err(|e| classify(&src.to_source_string(), e.to_string()))?;

        let mut info = self.head_object(dst).await?;
        if let Some(copy_result) = response.copy_object_result() {
            if let Some(etag) = copy_result.e_tag() {
                info.etag = Some(etag.trim_matches('"').to_string());
            }
        }

        Ok(info)
    }

    async fn create_multipart_upload(
        &self,
        path: &RemotePath,
        meta: &ObjectMeta,
    ) -> Result<String> {
        let mut request = self
            .inner
            .create_multipart_upload()
            .bucket(&path.bucket)
            .key(&path.key)
            .set_metadata(Self::metadata_map(meta));

        if let Some(ct) = &meta.content_type {
            request = request.content_type(ct);
        }
        if let Some(sc) = &meta.storage_class {
            request = request.storage_class(StorageClass::from(sc.as_str()));
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        response
            .upload_id()
            .map(|id| id.to_string())
            .ok_or_else(|| Error::General("No upload id in InitiateMultipartUpload reply".into()))
    }

    async fn upload_part(
        &self,
        path: &RemotePath,
        upload_id: &str,
        part_number: i32,
        body: Vec<u8>,
    ) -> Result<String> {
        let response = self
            .inner
            .upload_part()
            .bucket(&path.bucket)
            .key(&path.key)
            .upload_id(upload_id)
            .part_number(part_number)
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        response
            .e_tag()
            .map(|etag| etag.trim_matches('"').to_string())
            .ok_or_else(|| Error::General(format!("No etag in UploadPart {part_number} reply")))
    }

    async fn upload_part_copy(
        &self,
        path: &RemotePath,
        upload_id: &str,
        part_number: i32,
        src: &CopyLocator,
        range: ByteRange,
    ) -> Result<String> {
        let response = self
            .inner
            .upload_part_copy()
            .bucket(&path.bucket)
            .key(&path.key)
            .upload_id(upload_id)
            .part_number(part_number)
            .copy_source(src.to_source_string())
            .copy_source_range(range.to_header())
            .send()
            .await
            .map_err(|e| classify(&src.to_source_string(), e.to_string()))?;

        response
            .copy_part_result()
            .and_then(|r| r.e_tag())
            .map(|etag| etag.trim_matches('"').to_string())
            .ok_or_else(|| Error::General(format!("No etag in UploadPartCopy {part_number} reply")))
    }

    async fn list_parts(
        &self,
        path: &RemotePath,
        upload_id: &str,
        marker: Option<String>,
    ) -> Result<ListPartsResult> {
        let mut request = self
            .inner
            .list_parts()
            .bucket(&path.bucket)
            .key(&path.key)
            .upload_id(upload_id)
            .max_parts(1000);

        if let Some(marker) = marker {
            request = request.part_number_marker(marker);
        }

        let response = request
            .send()
            .await
            .map_err(|e| classify(&format!("upload {upload_id}"), e.to_string()))?;

        let parts = response
            .parts()
            .iter()
            .filter_map(|part| {
                Some(PartInfo {
                    part_number: part.part_number()?,
                    etag: part.e_tag()?.trim_matches('"').to_string(),
                    size_bytes: part.size(),
                })
            })
            .collect();

        Ok(ListPartsResult {
            parts,
            truncated: response.is_truncated().unwrap_or(false),
            next_part_number_marker: response.next_part_number_marker().map(|s| s.to_string()),
        })
    }

    async fn complete_multipart_upload(
        &self,
        path: &RemotePath,
        upload_id: &str,
        parts: &[PartInfo],
    ) -> Result<()> {
        let completed: Vec<CompletedPart> = parts
            .iter()
            .map(|part| {
                CompletedPart::builder()
                    .part_number(part.part_number)
                    .e_tag(&part.etag)
                    .build()
            })
            .collect();

        self.inner
            .complete_multipart_upload()
            .bucket(&path.bucket)
            .key(&path.key)
            .upload_id(upload_id)
            .multipart_upload(
                CompletedMultipartUpload::builder()
                    .set_parts(Some(completed))
                    .build(),
            )
            .send()
            .await
            .map_err(|e| classify(&format!("upload {upload_id}"), e.to_string()))?;

        Ok(())
    }

    async fn abort_multipart_upload(&self, path: &RemotePath, upload_id: &str) -> Result<()> {
        self.inner
            .abort_multipart_upload()
            .bucket(&path.bucket)
            .key(&path.key)
            .upload_id(upload_id)
            .send()
            .await
            .map_err(|e| classify(&format!("upload {upload_id}"), e.to_string()))?;

        Ok(())
    }

    async fn list_multipart_uploads(
        &self,
        path: &RemotePath,
        key_marker: Option<String>,
        upload_id_marker: Option<String>,
    ) -> Result<ListUploadsResult> {
        let mut request = self
            .inner
            .list_multipart_uploads()
            .bucket(&path.bucket)
            .max_uploads(1000);

        if !path.key.is_empty() {
            request = request.prefix(&path.key);
        }
        if let Some(marker) = key_marker {
            request = request.key_marker(marker);
        }
        if let Some(marker) = upload_id_marker {
            request = request.upload_id_marker(marker);
        }

        let response = request
            .send()
            .await
            .map_err(|e| classify(&path.to_string(), e.to_string()))?;

        let uploads = response
            .uploads()
            .iter()
            .filter_map(|upload| {
                Some(MultipartUpload {
                    key: upload.key()?.to_string(),
                    upload_id: upload.upload_id()?.to_string(),
                    initiated: upload
                        .initiated()
                        .and_then(|t| jiff::Timestamp::from_second(t.secs()).ok()),
                })
            })
            .collect();

        Ok(ListUploadsResult {
            uploads,
            truncated: response.is_truncated().unwrap_or(false),
            next_key_marker: response.next_key_marker().map(|s| s.to_string()),
            next_upload_id_marker: response.next_upload_id_marker().map(|s| s.to_string()),
        })
    }

    async fn restore_object(&self, path: &RemotePath, request: &RestoreRequest) -> Result<()> {
        let tier = match request.tier {
            RestoreTier::Expedited => Tier::Expedited,
            RestoreTier::Standard => Tier::Standard,
            RestoreTier::Bulk => Tier::Bulk,
        };
        let job = GlacierJobParameters::builder()
            .tier(tier)
            .build()
            .map_err(|e| Error::General(e.to_string()))?;
        let restore = SdkRestoreRequest::builder()
            .days(request.days)
            .glacier_job_parameters(job)
            .build();

        self.inner
            .restore_object()
            .bucket(&path.bucket)
            .key(&path.key)
            .restore_request(restore)
            .send()
            .await
            .map_err(|e| classify(&path.to_string(), e.to_string()))?;

        Ok(())
    }

    async fn get_bucket_versioning(&self, bucket: &str) -> Result<VersioningStatus> {
        let response = self
            .inner
            .get_bucket_versioning()
            .bucket(bucket)
            .send()
            .await
            .map_err(|e| classify(bucket, e.to_string()))?;

        Ok(match response.status() {
            Some(BucketVersioningStatus::Enabled) => VersioningStatus::Enabled,
            Some(BucketVersioningStatus::Suspended) => VersioningStatus::Suspended,
            _ => VersioningStatus::Unset,
        })
    }

    async fn put_bucket_versioning(&self, bucket: &str, enabled: bool) -> Result<()> {
        let status = if enabled {
            BucketVersioningStatus::Enabled
        } else {
            BucketVersioningStatus::Suspended
        };

        self.inner
            .put_bucket_versioning()
            .bucket(bucket)
            .versioning_configuration(VersioningConfiguration::builder().status(status).build())
            .send()
            .await
            .map_err(|e| classify(bucket, e.to_string()))?;

        Ok(())
    }

    async fn get_object_acl(&self, path: &RemotePath) -> Result<AclGrants> {
        let response = self
            .inner
            .get_object_acl()
            .bucket(&path.bucket)
            .key(&path.key)
            .send()
            .await
            .map_err(|e| classify(&path.to_string(), e.to_string()))?;

        Ok(crate::acl::flatten_grants(
            response.owner(),
            response.grants(),
        ))
    }

    async fn put_object_acl(&self, path: &RemotePath, update: &AclUpdate) -> Result<()> {
        let mut request = self
            .inner
            .put_object_acl()
            .bucket(&path.bucket)
            .key(&path.key);

        if let Some(canned) = &update.canned {
            request = request.acl(ObjectCannedAcl::from(canned.as_str()));
        }
        if !update.grant_read.is_empty() {
            request = request.grant_read(crate::acl::grant_header(&update.grant_read));
        }
        if !update.grant_write.is_empty() {
            request = request.grant_write(crate::acl::grant_header(&update.grant_write));
        }
        if !update.grant_full_control.is_empty() {
            request = request.grant_full_control(crate::acl::grant_header(&update.grant_full_control));
        }

        request
            .send()
            .await
            .map_err(|e| classify(&path.to_string(), e.to_string()))?;

        Ok(())
    }

    async fn get_bucket_acl(&self, bucket: &str) -> Result<AclGrants> {
        let response = self
            .inner
            .get_bucket_acl()
            .bucket(bucket)
            .send()
            .await
            .map_err(|e| classify(bucket, e.to_string()))?;

        Ok(crate::acl::flatten_grants(
            response.owner(),
            response.grants(),
        ))
    }

    async fn put_bucket_acl(&self, bucket: &str, update: &AclUpdate) -> Result<()> {
        let mut request = self.inner.put_bucket_acl().bucket(bucket);

        if let Some(canned) = &update.canned {
            request = request.acl(BucketCannedAcl::from(canned.as_str()));
        }
        if !update.grant_read.is_empty() {
            request = request.grant_read(crate::acl::grant_header(&update.grant_read));
        }
        if !update.grant_write.is_empty() {
            request = request.grant_write(crate::acl::grant_header(&update.grant_write));
        }
        if !update.grant_full_control.is_empty() {
            request = request.grant_full_control(crate::acl::grant_header(&update.grant_full_control));
        }

        request
            .send()
            .await
            .map_err(|e| classify(bucket, e.to_string()))?;

        Ok(())
    }

    async fn presign_get(&self, path: &RemotePath, expires_secs: u64) -> Result<String> {
        let config = PresigningConfig::expires_in(std::time::Duration::from_secs(expires_secs))
            .map_err(|e| Error::General(e.to_string()))?;

        let presigned = self
            .inner
            .get_object()
            .bucket(&path.bucket)
            .key(&path.key)
            .presigned(config)
            .await
            .map_err(|e| classify(&path.to_string(), e.to_string()))?;

        Ok(presigned.uri().to_string())
    }
}

// Listing helpers shared by the CLI's plain/versioned views
impl S3Client {
    /// One listing page in the shape requested by the caller
    pub async fn list_page(
        &self,
        path: &RemotePath,
        versions: bool,
        options: ListOptions,
    ) -> Result<ObjectListing> {
        if versions {
            let result = self
                .list_object_versions(
                    path,
                    VersionListOptions {
                        max_keys: options.max_keys,
                        delimiter: options.delimiter,
                        key_marker: options.marker,
                        version_id_marker: None,
                        recursive: options.recursive,
                    },
                )
                .await?;
            Ok(ObjectListing::Versioned(result))
        } else {
            Ok(ObjectListing::Plain(self.list_objects(path, options).await?))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_not_found() {
        assert!(matches!(
            classify("x", "service error: NoSuchKey".into()),
            Error::NotFound(_)
        ));
        assert!(matches!(
            classify("x", "NotFound".into()),
            Error::NotFound(_)
        ));
        assert!(matches!(
            classify("x", "NoSuchUpload: gone".into()),
            Error::NotFound(_)
        ));
    }

    #[test]
    fn test_classify_auth() {
        assert!(matches!(
            classify("x", "AccessDenied".into()),
            Error::Auth(_)
        ));
        assert!(matches!(
            classify("x", "SignatureDoesNotMatch".into()),
            Error::Auth(_)
        ));
    }

    #[test]
    fn test_classify_network_fallback() {
        assert!(matches!(
            classify("x", "connection reset".into()),
            Error::Network(_)
        ));
    }

    #[test]
    fn test_metadata_map_includes_content_hash() {
        let meta = ObjectMeta {
            content_md5: Some("abc".into()),
            ..Default::default()
        };
        let map = S3Client::metadata_map(&meta).unwrap();
        assert_eq!(map.get(CONTENT_MD5_META_KEY).map(|s| s.as_str()), Some("abc"));

        assert!(S3Client::metadata_map(&ObjectMeta::default()).is_none());
    }
}
