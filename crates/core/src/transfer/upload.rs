//! Upload paths: single-shot PUT, resumable multipart, and folder trees

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tokio::io::{AsyncReadExt, AsyncSeekExt};

use crate::error::{Error, Result};
use crate::hash;
use crate::path::RemotePath;
use crate::retry;
use crate::traits::{ObjectMeta, ObjectStore, PutBody};

use super::filter::{SyncDecision, SyncFilter};
use super::planner::{PartPlan, TransferStrategy};
use super::pool::WorkerPool;
use super::resume::Fingerprint;
use super::{DeleteCounts, TransferCounts, TransferOptions, TransferStatus, LIST_PAGE_SIZE};

impl<S: ObjectStore + 'static> super::TransferManager<S> {
    /// Upload one local file to `dest`.
    ///
    /// Strategy is single-shot while the file fits in one part and under
    /// the single-request ceiling; multipart otherwise. Multipart uploads
    /// resume from a recorded breakpoint unless `force` is set.
    pub async fn upload_file(
        &self,
        local: &Path,
        dest: &RemotePath,
        meta: &ObjectMeta,
        opts: &TransferOptions,
    ) -> Result<TransferStatus> {
        let size = std::fs::metadata(local)?.len();
        let filter = SyncFilter::new(&opts.include, &opts.ignore)?;

        match TransferStrategy::for_upload(size, self.config.part_size) {
            TransferStrategy::Single => {
                self.single_upload(local, dest, size, meta, opts, &filter).await
            }
            TransferStrategy::Multipart => {
                self.multipart_upload(local, dest, size, meta, opts, &filter).await
            }
        }
    }

    /// Upload a directory tree under the `dest` prefix.
    ///
    /// Breadth-first walk; files are batched and fanned out on the worker
    /// pool, with files too large for one request uploaded via multipart
    /// after each batch drains. With `--sync --delete`, a reconciliation
    /// pass afterwards removes remote objects absent locally.
    pub async fn upload_tree(
        &self,
        local_root: &Path,
        dest: &RemotePath,
        meta: &ObjectMeta,
        opts: &TransferOptions,
    ) -> Result<TransferCounts> {
        let filter = SyncFilter::new(&opts.include, &opts.ignore)?;
        let prefix = dest.as_prefix();
        let mut counts = TransferCounts::default();

        let mut queue: VecDeque<(PathBuf, String)> =
            VecDeque::from([(local_root.to_path_buf(), prefix.clone())]);
        let mut batch: Vec<(PathBuf, String)> = Vec::new();

        while let Some((dir, key_prefix)) = queue.pop_front() {
            for entry in std::fs::read_dir(&dir)? {
                let entry = entry?;
                let path = entry.path();
                let name = entry.file_name().to_string_lossy().to_string();
                if entry.file_type()?.is_dir() {
                    queue.push_back((path, format!("{key_prefix}{name}/")));
                } else {
                    batch.push((path, format!("{key_prefix}{name}")));
                    if batch.len() >= LIST_PAGE_SIZE as usize {
                        let flushed = std::mem::take(&mut batch);
                        counts.merge(self.upload_batch(flushed, dest, meta, opts, &filter).await);
                    }
                }
            }
        }
        if !batch.is_empty() {
            counts.merge(self.upload_batch(batch, dest, meta, opts, &filter).await);
        }

        tracing::info!(
            "{} files uploaded, {} files skipped, {} files failed",
            counts.succeeded,
            counts.skipped,
            counts.failed
        );

        if opts.sync && opts.delete {
            self.confirm_or_cancel(
                &format!(
                    "WARN: you are deleting objects under '{}' that have no local counterpart, please make sure",
                    dest.with_key(prefix.clone())
                ),
                opts.force,
            )?;
            tracing::info!("Synchronizing delete, please wait.");
            match self.sync_delete_remote(local_root, dest).await {
                Ok(DeleteCounts { deleted, failed }) => {
                    tracing::info!("{deleted} files sync deleted, {failed} files sync failed");
                }
                Err(err) => tracing::warn!("Sync delete failed: {err}"),
            }
        }

        Ok(counts)
    }

    /// Upload one batch: small files concurrently, oversized files via
    /// multipart afterwards (multipart fan-out has its own gate).
    async fn upload_batch(
        &self,
        files: Vec<(PathBuf, String)>,
        dest: &RemotePath,
        meta: &ObjectMeta,
        opts: &TransferOptions,
        filter: &SyncFilter,
    ) -> TransferCounts {
        let mut counts = TransferCounts::default();
        let mut singles = Vec::new();
        let mut multiparts = Vec::new();

        for (path, key) in files {
            let size = match std::fs::metadata(&path) {
                Ok(stat) => stat.len(),
                Err(err) => {
                    tracing::warn!("Upload of \"{}\" FAILED: {err}", path.display());
                    counts.record(TransferStatus::Failed);
                    continue;
                }
            };
            match TransferStrategy::for_upload(size, self.config.part_size) {
                TransferStrategy::Single => singles.push((path, key, size)),
                TransferStrategy::Multipart => multiparts.push((path, key, size)),
            }
        }

        let pool = WorkerPool::new(self.config.max_workers);
        let units = singles.into_iter().map(|(path, key, size)| {
            let mgr = self.clone();
            let target = dest.with_key(key);
            let meta = meta.clone();
            let opts = opts.clone();
            let filter = filter.clone();
            async move {
                match mgr
                    .single_upload(&path, &target, size, &meta, &opts, &filter)
                    .await
                {
                    Ok(status) => status,
                    Err(err) => {
                        tracing::warn!("Upload of \"{}\" FAILED: {err}", path.display());
                        TransferStatus::Failed
                    }
                }
            }
        });
        for status in pool.run_all(units).await {
            counts.record(status);
        }

        for (path, key, size) in multiparts {
            let target = dest.with_key(key);
            let status = match self
                .multipart_upload(&path, &target, size, meta, opts, filter)
                .await
            {
                Ok(status) => status,
                Err(err) => {
                    tracing::warn!("Upload of \"{}\" FAILED: {err}", path.display());
                    TransferStatus::Failed
                }
            };
            counts.record(status);
        }

        counts
    }

    /// One PUT request. Returns Skipped without any network transfer when
    /// the filter or the sync comparison says so.
    pub(super) async fn single_upload(
        &self,
        local: &Path,
        dest: &RemotePath,
        size: u64,
        meta: &ObjectMeta,
        opts: &TransferOptions,
        filter: &SyncFilter,
    ) -> Result<TransferStatus> {
        let source = self.local_summary(local, size, opts.skip_hash).await?;

        let destination = if opts.sync && !opts.force {
            self.head_if_exists(dest).await?.map(|info| Self::remote_summary(&info))
        } else {
            None
        };
        if let SyncDecision::Skip(reason) =
            filter.decide(&dest.key, &source, destination.as_ref(), opts.sync && !opts.force, opts.skip_hash)
        {
            tracing::debug!("Skip {} => {dest} ({reason:?})", local.display());
            return Ok(TransferStatus::Skipped);
        }

        tracing::info!("Upload {} => {dest}", local.display());
        let mut meta = meta.clone();
        meta.content_md5 = source.md5.clone();

        let body = local.to_path_buf();
        let result = retry::with_backoff("PutObject", self.config.retry_times, || {
            self.store
                .put_object(dest, PutBody::File(body.clone()), &meta)
        })
        .await;

        match result {
            Ok(_) => Ok(TransferStatus::Done),
            Err(err) => {
                tracing::warn!("Upload of \"{}\" FAILED: {err}", local.display());
                Ok(TransferStatus::Failed)
            }
        }
    }

    /// Multipart upload with durable resume.
    ///
    /// Terminal part failures leave the resume record (and the remote
    /// upload) in place so the next invocation can continue; they do not
    /// abort the session.
    pub(super) async fn multipart_upload(
        &self,
        local: &Path,
        dest: &RemotePath,
        size: u64,
        meta: &ObjectMeta,
        opts: &TransferOptions,
        filter: &SyncFilter,
    ) -> Result<TransferStatus> {
        let source = self.local_summary(local, size, opts.skip_hash).await?;

        let destination = if opts.sync && !opts.force {
            self.head_if_exists(dest).await?.map(|info| Self::remote_summary(&info))
        } else {
            None
        };
        if let SyncDecision::Skip(reason) =
            filter.decide(&dest.key, &source, destination.as_ref(), opts.sync && !opts.force, opts.skip_hash)
        {
            tracing::debug!("Skip {} => {dest} ({reason:?})", local.display());
            return Ok(TransferStatus::Skipped);
        }

        tracing::info!("Upload {} => {dest}", local.display());
        let mut meta = meta.clone();
        meta.content_md5 = source.md5.clone();

        let abs_local = std::path::absolute(local)?;
        let fingerprint = Fingerprint::new(&abs_local, size, &dest.key);
        let session = self.resume_or_init(dest, &fingerprint, &meta, opts.force).await?;

        let plan = PartPlan::new(size, self.config.part_size);
        let remaining: Vec<_> = plan
            .parts
            .iter()
            .copied()
            .filter(|part| !session.completed.contains_key(&part.number))
            .collect();

        self.progress.start(size);
        for part in &plan.parts {
            if session.completed.contains_key(&part.number) {
                self.progress.add(part.len);
            }
        }

        let ledger: super::manager::PartLedger = Arc::new(Mutex::new(session.completed));
        let upload_id = session.upload_id;

        let pool = WorkerPool::new(self.config.max_workers.min(remaining.len().max(1)));
        let units = remaining.into_iter().map(|part| {
            let mgr = self.clone();
            let local = abs_local.clone();
            let dest = dest.clone();
            let upload_id = upload_id.clone();
            let ledger = ledger.clone();
            let skip_hash = opts.skip_hash;
            async move {
                let what = format!("UploadPart {} of {dest}", part.number);
                let result = retry::with_backoff(&what, mgr.config.retry_times, || {
                    let store = mgr.store.clone();
                    let local = local.clone();
                    let dest = dest.clone();
                    let upload_id = upload_id.clone();
                    async move {
                        let data = read_file_range(&local, part.offset, part.len).await?;
                        let local_md5 = hash::md5_hex(&data);
                        let etag = store
                            .upload_part(&dest, &upload_id, part.number, data)
                            .await?;
                        let etag = etag.trim_matches('"').to_string();
                        if !skip_hash && !hash::digests_equal(&etag, &local_md5) {
                            return Err(Error::IntegrityMismatch(format!(
                                "part {}: remote etag {etag} != local {local_md5}",
                                part.number
                            )));
                        }
                        Ok(etag)
                    }
                })
                .await;

                match result {
                    Ok(etag) => {
                        ledger
                            .lock()
                            .expect("part ledger poisoned")
                            .insert(part.number, etag);
                        mgr.progress.add(part.len);
                        (part.number, TransferStatus::Done)
                    }
                    Err(err) => {
                        tracing::warn!("{what} failed terminally: {err}");
                        (part.number, TransferStatus::Failed)
                    }
                }
            }
        });

        let outcomes = pool.run_all(units).await;
        let failed = outcomes
            .iter()
            .filter(|(_, status)| *status == TransferStatus::Failed)
            .count();
        if failed > 0 {
            // Resumable failure: keep the record and the remote session.
            self.progress.finish();
            tracing::warn!(
                "{failed} parts of \"{}\" failed. Retry the last command to continue from the breakpoint.",
                local.display()
            );
            return Ok(TransferStatus::Failed);
        }

        if let Err(err) = self.complete_session(dest, &upload_id, &ledger).await {
            self.progress.finish();
            tracing::warn!("Complete multipart upload of {dest} failed: {err}");
            return Ok(TransferStatus::Failed);
        }
        self.progress.finish();
        self.resume.delete(&fingerprint);
        Ok(TransferStatus::Done)
    }
}

/// Read one part's bytes through a dedicated file handle
async fn read_file_range(path: &Path, offset: u64, len: u64) -> Result<Vec<u8>> {
    let mut file = tokio::fs::File::open(path).await?;
    file.seek(std::io::SeekFrom::Start(offset)).await?;
    let mut buf = vec![0u8; len as usize];
    file.read_exact(&mut buf).await?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_read_file_range() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.bin");
        std::fs::write(&path, b"0123456789").unwrap();

        assert_eq!(read_file_range(&path, 0, 4).await.unwrap(), b"0123");
        assert_eq!(read_file_range(&path, 4, 6).await.unwrap(), b"456789");
        assert!(read_file_range(&path, 8, 4).await.is_err());
    }
}
