//! Transfer orchestration state and shared helpers
//!
//! One [`TransferManager`] owns everything mutable about its transfers:
//! the resume store handle, the progress sink, and the per-task part
//! ledgers created inside each operation. Instances are cheap to clone so
//! transfer units spawned on the pool can carry their own handle.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::error::{Error, Result};
use crate::path::RemotePath;
use crate::prompt::{AlwaysNo, Confirm};
use crate::retry;
use crate::traits::{ListOptions, ListResult, ObjectInfo, ObjectMeta, ObjectStore, PartInfo};

use super::filter::ContentSummary;
use super::resume::{Fingerprint, ResumeStore};
use super::{TransferConfig, TransferProgress, LIST_PAGE_SIZE, NullProgress};

/// Threshold above which hashing a local file deserves a progress note
const HASH_NOTICE_SIZE: u64 = 20 * 1024 * 1024;

/// In-memory state of one multipart upload session
#[derive(Debug, Default)]
pub(super) struct MultipartSession {
    pub upload_id: String,
    /// Parts the remote has confirmed, keyed by part number
    pub completed: HashMap<i32, String>,
}

/// Completed-part ledger shared by the units of one task.
///
/// Mutated under a lock by each completing unit; read once, after all units
/// returned, when assembling the completion request.
pub(super) type PartLedger = Arc<Mutex<HashMap<i32, String>>>;

/// Top-level transfer orchestrator
pub struct TransferManager<S: ObjectStore> {
    pub(super) store: Arc<S>,
    pub(super) config: TransferConfig,
    pub(super) resume: ResumeStore,
    pub(super) progress: Arc<dyn TransferProgress>,
    pub(super) confirm: Arc<dyn Confirm>,
}

impl<S: ObjectStore> Clone for TransferManager<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            config: self.config.clone(),
            resume: self.resume.clone(),
            progress: self.progress.clone(),
            confirm: self.confirm.clone(),
        }
    }
}

impl<S: ObjectStore + 'static> TransferManager<S> {
    pub fn new(store: Arc<S>, config: TransferConfig, resume: ResumeStore) -> Self {
        Self {
            store,
            config,
            resume,
            progress: Arc::new(NullProgress),
            confirm: Arc::new(AlwaysNo),
        }
    }

    /// Attach a progress sink (indicatif in the CLI)
    pub fn with_progress(mut self, progress: Arc<dyn TransferProgress>) -> Self {
        self.progress = progress;
        self
    }

    /// Attach a confirmation capability for destructive passes
    pub fn with_confirm(mut self, confirm: Arc<dyn Confirm>) -> Self {
        self.confirm = confirm;
        self
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn config(&self) -> &TransferConfig {
        &self.config
    }

    /// HEAD with retry; absence maps to None
    pub(super) async fn head_if_exists(&self, path: &RemotePath) -> Result<Option<ObjectInfo>> {
        let result = retry::with_backoff("HeadObject", self.config.retry_times, || {
            self.store.head_object(path)
        })
        .await;
        match result {
            Ok(info) => Ok(Some(info)),
            Err(Error::NotFound(_)) => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// One listing page with retry
    pub(super) async fn list_page(
        &self,
        path: &RemotePath,
        prefix: &str,
        marker: Option<String>,
    ) -> Result<ListResult> {
        retry::with_backoff("ListObjects", self.config.retry_times, || {
            let options = ListOptions {
                recursive: true,
                max_keys: Some(LIST_PAGE_SIZE),
                prefix: if prefix.is_empty() {
                    None
                } else {
                    Some(prefix.to_string())
                },
                marker: marker.clone(),
                ..Default::default()
            };
            self.store.list_objects(path, options)
        })
        .await
    }

    /// Content summary of a local file; hash skipped on request
    pub(super) async fn local_summary(
        &self,
        path: &std::path::Path,
        size: u64,
        skip_hash: bool,
    ) -> Result<ContentSummary> {
        if skip_hash {
            return Ok(ContentSummary::new(size, None));
        }
        if size > HASH_NOTICE_SIZE {
            tracing::info!(
                "Computing content hash of \"{}\"; pass --skip-hash to skip",
                path.display()
            );
        }
        let md5 = crate::hash::file_md5_async(path).await?;
        tracing::debug!("Content hash of \"{}\" is {md5}", path.display());
        Ok(ContentSummary::new(size, Some(md5)))
    }

    /// Content summary carried in remote object metadata
    pub(super) fn remote_summary(info: &ObjectInfo) -> ContentSummary {
        ContentSummary::new(
            info.size_bytes.unwrap_or(0).max(0) as u64,
            info.content_md5.clone(),
        )
    }

    /// Obtain a multipart session: resume a recorded upload when its remote
    /// state is still listable, otherwise initiate a fresh one.
    ///
    /// Only the remote part listing seeds the completed set; a record that
    /// the remote no longer recognizes is discarded.
    pub(super) async fn resume_or_init(
        &self,
        dest: &RemotePath,
        fingerprint: &Fingerprint,
        meta: &ObjectMeta,
        force: bool,
    ) -> Result<MultipartSession> {
        if !force {
            if let Some(upload_id) = self.resume.load(fingerprint) {
                match self.list_remote_parts(dest, &upload_id).await {
                    Ok(completed) => {
                        tracing::info!(
                            "Continuing upload of {dest} from last breakpoint ({} parts done)",
                            completed.len()
                        );
                        return Ok(MultipartSession {
                            upload_id,
                            completed,
                        });
                    }
                    Err(err) => {
                        tracing::debug!("Recorded upload for {dest} is unusable: {err}");
                        self.resume.delete(fingerprint);
                    }
                }
            }
        }

        let upload_id = retry::with_backoff(
            "InitiateMultipartUpload",
            self.config.retry_times,
            || self.store.create_multipart_upload(dest, meta),
        )
        .await?;
        self.resume.save(fingerprint, &upload_id);
        Ok(MultipartSession {
            upload_id,
            completed: HashMap::new(),
        })
    }

    /// Full remote part listing for an upload id, following pagination
    pub(super) async fn list_remote_parts(
        &self,
        dest: &RemotePath,
        upload_id: &str,
    ) -> Result<HashMap<i32, String>> {
        let mut completed = HashMap::new();
        let mut marker: Option<String> = None;
        loop {
            let page = retry::with_backoff("ListParts", self.config.retry_times, || {
                self.store.list_parts(dest, upload_id, marker.clone())
            })
            .await?;

            for part in page.parts {
                completed.insert(part.part_number, part.etag.trim_matches('"').to_string());
            }
            if page.truncated {
                marker = page.next_part_number_marker;
            } else {
                break;
            }
        }
        Ok(completed)
    }

    /// Submit the completion request: ledger entries sorted ascending by
    /// part number, as the remote requires.
    pub(super) async fn complete_session(
        &self,
        dest: &RemotePath,
        upload_id: &str,
        ledger: &PartLedger,
    ) -> Result<()> {
        let mut parts: Vec<PartInfo> = {
            let completed = ledger.lock().expect("part ledger poisoned");
            completed
                .iter()
                .map(|(&part_number, etag)| PartInfo {
                    part_number,
                    etag: etag.clone(),
                    size_bytes: None,
                })
                .collect()
        };
        parts.sort_by_key(|p| p.part_number);

        tracing::debug!("Completing multipart upload of {dest} with {} parts", parts.len());
        retry::with_backoff("CompleteMultipartUpload", self.config.retry_times, || {
            self.store.complete_multipart_upload(dest, upload_id, &parts)
        })
        .await
    }

    /// Abort a multipart session, reclaiming storage-side partial state
    pub(super) async fn abort_session(&self, dest: &RemotePath, upload_id: &str) {
        let result = retry::with_backoff("AbortMultipartUpload", self.config.retry_times, || {
            self.store.abort_multipart_upload(dest, upload_id)
        })
        .await;
        if let Err(err) = result {
            tracing::warn!("Abort of upload {upload_id} for {dest} failed: {err}");
        }
    }

    /// Ask before a destructive pass; `force` skips the prompt
    pub(super) fn confirm_or_cancel(&self, question: &str, force: bool) -> Result<()> {
        if force || self.confirm.confirm(question, false) {
            Ok(())
        } else {
            Err(Error::Cancelled)
        }
    }
}
