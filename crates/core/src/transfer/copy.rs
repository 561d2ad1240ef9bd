//! Remote-to-remote copy: single server-side copy, multipart part copy,
//! and prefix trees. Move is copy plus source delete.

use std::sync::{Arc, Mutex};

use crate::error::Result;
use crate::path::{key_to_relative, RemotePath};
use crate::retry;
use crate::traits::{ByteRange, CopyLocator, ObjectMeta, ObjectStore};

use super::filter::{self, SyncDecision, SyncFilter};
use super::planner::{PartPlan, TransferStrategy};
use super::pool::WorkerPool;
use super::{DeleteCounts, TransferCounts, TransferOptions, TransferStatus};

/// Whether the source survives the operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyMode {
    Copy,
    Move,
}

impl<S: ObjectStore + 'static> super::TransferManager<S> {
    /// Copy one object to `dest` within the same endpoint.
    ///
    /// Objects under the single-request ceiling use one server-side copy;
    /// larger ones go through a multipart session of ranged part copies.
    /// Part-copy sessions hold no resume record, so a terminal part failure
    /// aborts the remote session before surfacing the failure.
    pub async fn copy_file(
        &self,
        src: &RemotePath,
        dest: &RemotePath,
        meta: &ObjectMeta,
        opts: &TransferOptions,
        mode: CopyMode,
    ) -> Result<TransferStatus> {
        let filter = SyncFilter::new(&opts.include, &opts.ignore)?;
        self.copy_one(src, dest, meta, opts, mode, &filter).await
    }

    /// Copy every object under the `src` prefix to the `dest` prefix.
    pub async fn copy_tree(
        &self,
        src: &RemotePath,
        dest: &RemotePath,
        meta: &ObjectMeta,
        opts: &TransferOptions,
        mode: CopyMode,
    ) -> Result<TransferCounts> {
        let filter = SyncFilter::new(&opts.include, &opts.ignore)?;
        let src_prefix = src.as_prefix();
        let src_root = src.with_key(src_prefix.clone());
        let dest_prefix = dest.as_prefix();
        let mut counts = TransferCounts::default();
        let mut marker: Option<String> = None;

        loop {
            let page = self.list_page(&src_root, "", marker.clone()).await?;

            let pool = WorkerPool::new(self.config.max_workers);
            let units = page
                .items
                .iter()
                .filter(|item| !item.is_dir && !item.key.ends_with('/'))
                .filter_map(|item| {
                    let relative = key_to_relative(&src_prefix, &item.key)?;
                    Some((item.key.clone(), format!("{dest_prefix}{relative}")))
                })
                .map(|(src_key, dest_key)| {
                    let mgr = self.clone();
                    let source = src.with_key(src_key);
                    let target = dest.with_key(dest_key);
                    let meta = meta.clone();
                    let opts = opts.clone();
                    let filter = filter.clone();
                    async move {
                        match mgr
                            .copy_one(&source, &target, &meta, &opts, mode, &filter)
                            .await
                        {
                            Ok(status) => status,
                            Err(err) => {
                                tracing::warn!("Copy of {source} FAILED: {err}");
                                TransferStatus::Failed
                            }
                        }
                    }
                });
            for status in pool.run_all(units).await {
                counts.record(status);
            }

            if page.truncated {
                marker = page.next_marker;
            } else {
                break;
            }
        }

        let verb = match mode {
            CopyMode::Copy => "copied",
            CopyMode::Move => "moved",
        };
        tracing::info!(
            "{} files {verb}, {} files skipped, {} files failed",
            counts.succeeded,
            counts.skipped,
            counts.failed
        );

        if opts.sync && opts.delete {
            self.confirm_or_cancel(
                &format!(
                    "WARN: you are deleting objects under '{}' that have no source counterpart, please make sure",
                    dest.with_key(dest_prefix.clone())
                ),
                opts.force,
            )?;
            tracing::info!("Synchronizing delete, please wait.");
            match self.sync_delete_copy_dest(src, dest).await {
                Ok(DeleteCounts { deleted, failed }) => {
                    tracing::info!("{deleted} files sync deleted, {failed} files sync failed");
                }
                Err(err) => tracing::warn!("Sync delete failed: {err}"),
            }
        }

        Ok(counts)
    }

    async fn copy_one(
        &self,
        src: &RemotePath,
        dest: &RemotePath,
        meta: &ObjectMeta,
        opts: &TransferOptions,
        mode: CopyMode,
        filter: &SyncFilter,
    ) -> Result<TransferStatus> {
        if !filter.matches(&src.key) {
            tracing::debug!("Skip {src} => {dest}");
            return Ok(TransferStatus::Skipped);
        }

        let Some(source_info) = self.head_if_exists(src).await? else {
            tracing::warn!("Copy source not found: {src}");
            return Ok(TransferStatus::Failed);
        };
        let source_summary = Self::remote_summary(&source_info);

        if opts.sync && !opts.force {
            let destination = self
                .head_if_exists(dest)
                .await?
                .map(|info| Self::remote_summary(&info));
            if let SyncDecision::Skip(_) =
                filter::compare(&source_summary, destination.as_ref(), opts.skip_hash)
            {
                tracing::debug!("Skip {src} => {dest}");
                return Ok(TransferStatus::Skipped);
            }
        }

        match mode {
            CopyMode::Copy => tracing::info!("Copy {src} => {dest}"),
            CopyMode::Move => tracing::info!("Move {src} => {dest}"),
        }

        let size = source_summary.size;
        let status = match TransferStrategy::for_copy(size, self.config.copy_split) {
            TransferStrategy::Single => self.single_copy(src, dest, meta).await,
            TransferStrategy::Multipart => self.multipart_copy(src, dest, size, meta).await,
        }?;

        if status == TransferStatus::Done && mode == CopyMode::Move {
            let result = retry::with_backoff("DeleteObject", self.config.retry_times, || {
                self.store.delete_object(src, None)
            })
            .await;
            if let Err(err) = result {
                tracing::warn!("Moved object but could not delete source {src}: {err}");
            }
        }
        Ok(status)
    }

    async fn single_copy(
        &self,
        src: &RemotePath,
        dest: &RemotePath,
        meta: &ObjectMeta,
    ) -> Result<TransferStatus> {
        let locator = CopyLocator::from(src);
        let result = retry::with_backoff("CopyObject", self.config.retry_times, || {
            self.store.copy_object(dest, &locator, meta)
        })
        .await;

        match result {
            Ok(_) => Ok(TransferStatus::Done),
            Err(err) => {
                tracing::warn!("Copy of {src} FAILED: {err}");
                Ok(TransferStatus::Failed)
            }
        }
    }

    async fn multipart_copy(
        &self,
        src: &RemotePath,
        dest: &RemotePath,
        size: u64,
        meta: &ObjectMeta,
    ) -> Result<TransferStatus> {
        let upload_id = retry::with_backoff(
            "InitiateMultipartUpload",
            self.config.retry_times,
            || self.store.create_multipart_upload(dest, meta),
        )
        .await?;

        let plan = PartPlan::new(size, self.config.part_size);
        let locator = CopyLocator::from(src);
        let ledger: super::manager::PartLedger = Arc::new(Mutex::new(Default::default()));

        let pool = WorkerPool::new(self.config.max_workers.min(plan.len().max(1)));
        let units = plan.parts.iter().copied().map(|part| {
            let mgr = self.clone();
            let dest = dest.clone();
            let upload_id = upload_id.clone();
            let locator = locator.clone();
            let ledger = ledger.clone();
            async move {
                let what = format!("CopyPart {} of {dest}", part.number);
                let result = retry::with_backoff(&what, mgr.config.retry_times, || {
                    let range = ByteRange::from_offset(part.offset, part.len);
                    mgr.store
                        .upload_part_copy(&dest, &upload_id, part.number, &locator, range)
                })
                .await
                .map(|etag| etag.trim_matches('"').to_string());

                match result {
                    Ok(etag) => {
                        ledger
                            .lock()
                            .expect("part ledger poisoned")
                            .insert(part.number, etag);
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
            // No resume record exists for part copies; reclaim the remote
            // partial state instead of leaking it.
            tracing::warn!("Failed to copy {failed} parts of {src}");
            self.abort_session(dest, &upload_id).await;
            return Ok(TransferStatus::Failed);
        }

        if let Err(err) = self.complete_session(dest, &upload_id, &ledger).await {
            tracing::warn!("Complete multipart copy of {dest} failed: {err}");
            return Ok(TransferStatus::Failed);
        }
        Ok(TransferStatus::Done)
    }
}
