//! In-memory ObjectStore double for transfer engine tests
//!
//! Single-endpoint, bucket-agnostic object map with multipart session
//! tracking, failure injection, and call recording so tests can assert on
//! abort/complete behavior and per-part upload traffic.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use osc_core::error::{Error, Result};
use osc_core::traits::*;
use osc_core::RemotePath;

#[derive(Debug, Clone)]
pub struct StoredObject {
    pub data: Vec<u8>,
    pub content_md5: Option<String>,
}

#[derive(Debug, Default)]
struct UploadSession {
    key: String,
    meta_md5: Option<String>,
    parts: BTreeMap<i32, (String, Vec<u8>)>,
}

#[derive(Default)]
pub struct MemoryStore {
    objects: Mutex<BTreeMap<String, StoredObject>>,
    sessions: Mutex<HashMap<String, UploadSession>>,
    upload_counter: AtomicUsize,

    /// Part numbers whose UploadPart always fails
    pub fail_upload_parts: Mutex<HashSet<i32>>,
    /// Part numbers whose UploadPartCopy always fails
    pub fail_copy_parts: Mutex<HashSet<i32>>,
    /// Keys whose PutObject always fails
    pub fail_put_keys: Mutex<HashSet<String>>,

    pub create_upload_calls: AtomicUsize,
    pub complete_calls: AtomicUsize,
    pub abort_calls: AtomicUsize,
    /// Part numbers of every UploadPart request, in arrival order
    pub uploaded_part_log: Mutex<Vec<i32>>,
    /// Part-number sequences submitted to CompleteMultipartUpload
    pub completion_orders: Mutex<Vec<Vec<i32>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_object(&self, key: &str, data: &[u8]) {
        let md5 = osc_core::hash::md5_hex(data);
        self.objects.lock().unwrap().insert(
            key.to_string(),
            StoredObject {
                data: data.to_vec(),
                content_md5: Some(md5),
            },
        );
    }

    pub fn object_data(&self, key: &str) -> Option<Vec<u8>> {
        self.objects.lock().unwrap().get(key).map(|o| o.data.clone())
    }

    pub fn object_keys(&self) -> Vec<String> {
        self.objects.lock().unwrap().keys().cloned().collect()
    }

    pub fn session_count(&self) -> usize {
        self.sessions.lock().unwrap().len()
    }

    fn info_for(key: &str, object: &StoredObject) -> ObjectInfo {
        let mut info = ObjectInfo::file(key, object.data.len() as i64);
        info.content_md5 = object.content_md5.clone();
        info.etag = Some(osc_core::hash::md5_hex(&object.data));
        info
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn list_buckets(&self) -> Result<Vec<ObjectInfo>> {
        Ok(vec![])
    }

    async fn bucket_exists(&self, _bucket: &str) -> Result<bool> {
        Ok(true)
    }

    async fn create_bucket(&self, _bucket: &str) -> Result<()> {
        Ok(())
    }

    async fn delete_bucket(&self, _bucket: &str) -> Result<()> {
        Ok(())
    }

    async fn list_objects(&self, path: &RemotePath, options: ListOptions) -> Result<ListResult> {
        let prefix = format!("{}{}", path.key, options.prefix.unwrap_or_default());
        let max_keys = options.max_keys.unwrap_or(1000) as usize;

        let objects = self.objects.lock().unwrap();
        let mut matching: Vec<(&String, &StoredObject)> = objects
            .iter()
            .filter(|(key, _)| key.starts_with(&prefix))
            .filter(|(key, _)| match &options.marker {
                Some(marker) => key.as_str() > marker.as_str(),
                None => true,
            })
            .collect();

        let truncated = matching.len() > max_keys;
        matching.truncate(max_keys);

        let items: Vec<ObjectInfo> = matching
            .iter()
            .map(|(key, object)| Self::info_for(key, object))
            .collect();
        let next_marker = if truncated {
            matching.last().map(|(key, _)| (*key).clone())
        } else {
            None
        };

        Ok(ListResult {
            items,
            truncated,
            next_marker,
        })
    }

    async fn list_object_versions(
        &self,
        _path: &RemotePath,
        _options: VersionListOptions,
    ) -> Result<VersionedListResult> {
        Ok(VersionedListResult {
            versions: vec![],
            truncated: false,
            next_key_marker: None,
            next_version_id_marker: None,
        })
    }

    async fn head_object(&self, path: &RemotePath) -> Result<ObjectInfo> {
        let objects = self.objects.lock().unwrap();
        objects
            .get(&path.key)
            .map(|object| Self::info_for(&path.key, object))
            .ok_or_else(|| Error::NotFound(path.to_string()))
    }

    async fn get_object(
        &self,
        path: &RemotePath,
        range: Option<ByteRange>,
    ) -> Result<ObjectReader> {
        let objects = self.objects.lock().unwrap();
        let object = objects
            .get(&path.key)
            .ok_or_else(|| Error::NotFound(path.to_string()))?;
        let data = match range {
            Some(range) => {
                let start = range.start as usize;
                let end = ((range.end + 1) as usize).min(object.data.len());
                object.data[start.min(end)..end].to_vec()
            }
            None => object.data.clone(),
        };
        Ok(Box::new(std::io::Cursor::new(data)))
    }

    async fn put_object(
        &self,
        path: &RemotePath,
        body: PutBody,
        meta: &ObjectMeta,
    ) -> Result<ObjectInfo> {
        if self.fail_put_keys.lock().unwrap().contains(&path.key) {
            return Err(Error::Network("injected put failure".into()));
        }
        let data = match body {
            PutBody::Bytes(bytes) => bytes,
            PutBody::File(path) => std::fs::read(path)?,
        };
        let object = StoredObject {
            content_md5: meta.content_md5.clone(),
            data,
        };
        let info = Self::info_for(&path.key, &object);
        self.objects.lock().unwrap().insert(path.key.clone(), object);
        Ok(info)
    }

    async fn delete_object(&self, path: &RemotePath, _version_id: Option<&str>) -> Result<()> {
        self.objects
            .lock()
            .unwrap()
            .remove(&path.key)
            .map(|_| ())
            .ok_or_else(|| Error::NotFound(path.to_string()))
    }

    async fn delete_objects(
        &self,
        _bucket: &str,
        objects: Vec<ObjectIdent>,
    ) -> Result<DeleteResult> {
        let mut map = self.objects.lock().unwrap();
        let mut result = DeleteResult::default();
        for ident in objects {
            if map.remove(&ident.key).is_some() {
                result.deleted.push(ident);
            } else {
                result.errors.push(DeleteError {
                    key: ident.key,
                    code: Some("NoSuchKey".into()),
                    message: None,
                });
            }
        }
        Ok(result)
    }

    async fn copy_object(
        &self,
        dst: &RemotePath,
        src: &CopyLocator,
        _meta: &ObjectMeta,
    ) -> Result<ObjectInfo> {
        let mut objects = self.objects.lock().unwrap();
        let source = objects
            .get(&src.key)
            .cloned()
            .ok_or_else(|| Error::NotFound(src.to_source_string()))?;
        let info = Self::info_for(&dst.key, &source);
        objects.insert(dst.key.clone(), source);
        Ok(info)
    }

    async fn create_multipart_upload(
        &self,
        path: &RemotePath,
        meta: &ObjectMeta,
    ) -> Result<String> {
        self.create_upload_calls.fetch_add(1, Ordering::SeqCst);
        let id = format!("upload-{}", self.upload_counter.fetch_add(1, Ordering::SeqCst) + 1);
        self.sessions.lock().unwrap().insert(
            id.clone(),
            UploadSession {
                key: path.key.clone(),
                meta_md5: meta.content_md5.clone(),
                parts: BTreeMap::new(),
            },
        );
        Ok(id)
    }

    async fn upload_part(
        &self,
        _path: &RemotePath,
        upload_id: &str,
        part_number: i32,
        body: Vec<u8>,
    ) -> Result<String> {
        self.uploaded_part_log.lock().unwrap().push(part_number);
        if self.fail_upload_parts.lock().unwrap().contains(&part_number) {
            return Err(Error::Network(format!(
                "injected failure for part {part_number}"
            )));
        }
        let etag = osc_core::hash::md5_hex(&body);
        let mut sessions = self.sessions.lock().unwrap();
        let session = sessions
            .get_mut(upload_id)
            .ok_or_else(|| Error::NotFound(format!("upload {upload_id}")))?;
        session.parts.insert(part_number, (etag.clone(), body));
        Ok(etag)
    }

    async fn upload_part_copy(
        &self,
        _path: &RemotePath,
        upload_id: &str,
        part_number: i32,
        src: &CopyLocator,
        range: ByteRange,
    ) -> Result<String> {
        if self.fail_copy_parts.lock().unwrap().contains(&part_number) {
            return Err(Error::Network(format!(
                "injected failure for part copy {part_number}"
            )));
        }
        let data = {
            let objects = self.objects.lock().unwrap();
            let source = objects
                .get(&src.key)
                .ok_or_else(|| Error::NotFound(src.to_source_string()))?;
            let start = range.start as usize;
            let end = ((range.end + 1) as usize).min(source.data.len());
            source.data[start.min(end)..end].to_vec()
        };
        let etag = osc_core::hash::md5_hex(&data);
        let mut sessions = self.sessions.lock().unwrap();
        let session = sessions
            .get_mut(upload_id)
            .ok_or_else(|| Error::NotFound(format!("upload {upload_id}")))?;
        session.parts.insert(part_number, (etag.clone(), data));
        Ok(etag)
    }

    async fn list_parts(
        &self,
        _path: &RemotePath,
        upload_id: &str,
        _marker: Option<String>,
    ) -> Result<ListPartsResult> {
        let sessions = self.sessions.lock().unwrap();
        let session = sessions
            .get(upload_id)
            .ok_or_else(|| Error::NotFound(format!("upload {upload_id}")))?;
        Ok(ListPartsResult {
            parts: session
                .parts
                .iter()
                .map(|(&part_number, (etag, data))| PartInfo {
                    part_number,
                    etag: etag.clone(),
                    size_bytes: Some(data.len() as i64),
                })
                .collect(),
            truncated: false,
            next_part_number_marker: None,
        })
    }

    async fn complete_multipart_upload(
        &self,
        path: &RemotePath,
        upload_id: &str,
        parts: &[PartInfo],
    ) -> Result<()> {
        self.complete_calls.fetch_add(1, Ordering::SeqCst);
        self.completion_orders
            .lock()
            .unwrap()
            .push(parts.iter().map(|p| p.part_number).collect());

        let mut sessions = self.sessions.lock().unwrap();
        let session = sessions
            .remove(upload_id)
            .ok_or_else(|| Error::NotFound(format!("upload {upload_id}")))?;

        let mut data = Vec::new();
        for part in parts {
            let (etag, bytes) = session
                .parts
                .get(&part.part_number)
                .ok_or_else(|| Error::Conflict(format!("missing part {}", part.part_number)))?;
            if etag != &part.etag {
                return Err(Error::Conflict(format!(
                    "etag mismatch for part {}",
                    part.part_number
                )));
            }
            data.extend_from_slice(bytes);
        }

        self.objects.lock().unwrap().insert(
            path.key.clone(),
            StoredObject {
                data,
                content_md5: session.meta_md5,
            },
        );
        Ok(())
    }

    async fn abort_multipart_upload(&self, _path: &RemotePath, upload_id: &str) -> Result<()> {
        self.abort_calls.fetch_add(1, Ordering::SeqCst);
        self.sessions
            .lock()
            .unwrap()
            .remove(upload_id)
            .map(|_| ())
            .ok_or_else(|| Error::NotFound(format!("upload {upload_id}")))
    }

    async fn list_multipart_uploads(
        &self,
        _path: &RemotePath,
        _key_marker: Option<String>,
        _upload_id_marker: Option<String>,
    ) -> Result<ListUploadsResult> {
        let sessions = self.sessions.lock().unwrap();
        Ok(ListUploadsResult {
            uploads: sessions
                .iter()
                .map(|(id, session)| MultipartUpload {
                    key: session.key.clone(),
                    upload_id: id.clone(),
                    initiated: None,
                })
                .collect(),
            truncated: false,
            next_key_marker: None,
            next_upload_id_marker: None,
        })
    }

    async fn restore_object(&self, _path: &RemotePath, _request: &RestoreRequest) -> Result<()> {
        Ok(())
    }

    async fn get_bucket_versioning(&self, _bucket: &str) -> Result<VersioningStatus> {
        Ok(VersioningStatus::Unset)
    }

    async fn put_bucket_versioning(&self, _bucket: &str, _enabled: bool) -> Result<()> {
        Ok(())
    }

    async fn get_object_acl(&self, _path: &RemotePath) -> Result<AclGrants> {
        Ok(AclGrants::default())
    }

    async fn put_object_acl(&self, _path: &RemotePath, _update: &AclUpdate) -> Result<()> {
        Ok(())
    }

    async fn get_bucket_acl(&self, _bucket: &str) -> Result<AclGrants> {
        Ok(AclGrants::default())
    }

    async fn put_bucket_acl(&self, _bucket: &str, _update: &AclUpdate) -> Result<()> {
        Ok(())
    }

    async fn presign_get(&self, path: &RemotePath, _expires_secs: u64) -> Result<String> {
        Ok(format!("https://signed.example/{}", path.key))
    }
}
