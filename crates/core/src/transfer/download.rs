//! Download paths: whole-object GET, concurrent ranged parts, and folder trees

use std::path::Path;

use tokio::io::{AsyncSeekExt, AsyncWriteExt};

use crate::error::Result;
use crate::path::{key_to_relative, relative_to_local, RemotePath};
use crate::retry;
use crate::traits::{ByteRange, ObjectStore};

use super::filter::{self, SyncDecision, SyncFilter};
use super::planner::{PartPlan, TransferStrategy};
use super::pool::WorkerPool;
use super::{DeleteCounts, TransferCounts, TransferOptions, TransferStatus};

/// Copy buffer for streaming object bodies to disk (1 MiB)
const WRITE_BUF_SIZE: usize = 1024 * 1024;

/// Outcome of the destination-side check before a download
enum LocalCheck {
    Proceed,
    Skip,
    /// Destination exists and neither --sync nor --force was given
    Conflict,
}

impl<S: ObjectStore + 'static> super::TransferManager<S> {
    /// Download one object to `local`.
    ///
    /// Objects above the split threshold are fetched as concurrent ranged
    /// parts written at disjoint offsets of a preallocated file.
    pub async fn download_file(
        &self,
        src: &RemotePath,
        local: &Path,
        opts: &TransferOptions,
    ) -> Result<TransferStatus> {
        let info = retry::with_backoff("HeadObject", self.config.retry_times, || {
            self.store.head_object(src)
        })
        .await?;
        let size = info.size_bytes.unwrap_or(0).max(0) as u64;
        let filter = SyncFilter::new(&opts.include, &opts.ignore)?;

        match TransferStrategy::for_download(size, self.config.download_split) {
            TransferStrategy::Single => {
                self.single_download(src, local, size, opts, &filter).await
            }
            TransferStrategy::Multipart => {
                self.multipart_download(src, local, size, opts, &filter).await
            }
        }
    }

    /// Mirror a remote prefix into a local directory.
    ///
    /// Pages through the listing; files under the split threshold fan out
    /// on the worker pool, larger ones download as ranged parts afterwards.
    /// With `--sync --delete`, local files without a remote counterpart are
    /// removed after an interactive confirmation.
    pub async fn download_tree(
        &self,
        src: &RemotePath,
        local_root: &Path,
        opts: &TransferOptions,
    ) -> Result<TransferCounts> {
        let filter = SyncFilter::new(&opts.include, &opts.ignore)?;
        let prefix = src.as_prefix();
        let prefix_path = src.with_key(prefix.clone());
        let mut counts = TransferCounts::default();
        let mut marker: Option<String> = None;

        loop {
            let page = self.list_page(&prefix_path, "", marker.clone()).await?;

            let mut singles = Vec::new();
            let mut multiparts = Vec::new();
            for item in &page.items {
                // keys with a trailing slash are empty folder placeholders
                if item.is_dir || item.key.ends_with('/') {
                    continue;
                }
                let Some(relative) = key_to_relative(&prefix, &item.key) else {
                    continue;
                };
                let local = relative_to_local(local_root, relative);
                let size = item.size_bytes.unwrap_or(0).max(0) as u64;
                match TransferStrategy::for_download(size, self.config.download_split) {
                    TransferStrategy::Single => singles.push((item.key.clone(), local, size)),
                    TransferStrategy::Multipart => multiparts.push((item.key.clone(), local, size)),
                }
            }

            let pool = WorkerPool::new(self.config.max_workers);
            let units = singles.into_iter().map(|(key, local, size)| {
                let mgr = self.clone();
                let source = src.with_key(key);
                let opts = opts.clone();
                let filter = filter.clone();
                async move {
                    match mgr
                        .single_download(&source, &local, size, &opts, &filter)
                        .await
                    {
                        Ok(status) => status,
                        Err(err) => {
                            tracing::warn!("Download of {source} FAILED: {err}");
                            TransferStatus::Failed
                        }
                    }
                }
            });
            for status in pool.run_all(units).await {
                counts.record(status);
            }

            for (key, local, size) in multiparts {
                let source = src.with_key(key);
                let status = match self
                    .multipart_download(&source, &local, size, opts, &filter)
                    .await
                {
                    Ok(status) => status,
                    Err(err) => {
                        tracing::warn!("Download of {source} FAILED: {err}");
                        TransferStatus::Failed
                    }
                };
                counts.record(status);
            }

            if page.truncated {
                marker = page.next_marker;
            } else {
                break;
            }
        }

        tracing::info!(
            "{} files downloaded, {} files skipped, {} files failed",
            counts.succeeded,
            counts.skipped,
            counts.failed
        );

        if opts.sync && opts.delete {
            self.confirm_or_cancel(
                &format!(
                    "WARN: you are deleting files under the '{}' local path, please make sure",
                    local_root.display()
                ),
                opts.force,
            )?;
            tracing::info!("Synchronizing delete, please wait.");
            match self.sync_delete_local(local_root, src).await {
                Ok(DeleteCounts { deleted, failed }) => {
                    tracing::info!("{deleted} files sync deleted, {failed} files sync failed");
                }
                Err(err) => tracing::warn!("Sync delete failed: {err}"),
            }
        }

        Ok(counts)
    }

    /// Filter and overwrite guard for one download destination
    async fn check_local_destination(
        &self,
        src: &RemotePath,
        local: &Path,
        opts: &TransferOptions,
        filter: &SyncFilter,
    ) -> Result<LocalCheck> {
        if !filter.matches(&src.key) {
            tracing::debug!("Skip {src} => {}", local.display());
            return Ok(LocalCheck::Skip);
        }
        if opts.force || !local.is_file() {
            return Ok(LocalCheck::Proceed);
        }
        if !opts.sync {
            tracing::warn!(
                "The file {} already exists, use --force to overwrite it",
                local.display()
            );
            return Ok(LocalCheck::Conflict);
        }

        let Some(info) = self.head_if_exists(src).await? else {
            return Ok(LocalCheck::Proceed);
        };
        let local_size = std::fs::metadata(local)?.len();
        let local_summary = self.local_summary(local, local_size, opts.skip_hash).await?;
        let remote_summary = Self::remote_summary(&info);
        match filter::compare(&remote_summary, Some(&local_summary), opts.skip_hash) {
            SyncDecision::Skip(_) => {
                tracing::debug!("Skip {src} => {}", local.display());
                Ok(LocalCheck::Skip)
            }
            SyncDecision::Proceed => Ok(LocalCheck::Proceed),
        }
    }

    /// One GET request streamed to disk
    pub(super) async fn single_download(
        &self,
        src: &RemotePath,
        local: &Path,
        _size: u64,
        opts: &TransferOptions,
        filter: &SyncFilter,
    ) -> Result<TransferStatus> {
        match self.check_local_destination(src, local, opts, filter).await? {
            LocalCheck::Skip => return Ok(TransferStatus::Skipped),
            LocalCheck::Conflict => return Ok(TransferStatus::Failed),
            LocalCheck::Proceed => {}
        }

        tracing::info!("Download {src} => {}", local.display());
        create_parent_dirs(local)?;

        let result = retry::with_backoff("GetObject", self.config.retry_times, || {
            let store = self.store.clone();
            let src = src.clone();
            let local = local.to_path_buf();
            async move {
                let mut reader = store.get_object(&src, None).await?;
                let mut file = tokio::fs::File::create(&local).await?;
                tokio::io::copy(&mut reader, &mut file).await?;
                file.flush().await?;
                Ok(())
            }
        })
        .await;

        match result {
            Ok(()) => Ok(TransferStatus::Done),
            Err(err) => {
                tracing::warn!("Download of {src} FAILED: {err}");
                Ok(TransferStatus::Failed)
            }
        }
    }

    /// Concurrent ranged download into a preallocated file.
    ///
    /// Each unit opens its own descriptor and writes its disjoint range via
    /// seek-then-write; ranges never overlap. A terminal part failure
    /// removes the partial file — ranged downloads are not resumable.
    pub(super) async fn multipart_download(
        &self,
        src: &RemotePath,
        local: &Path,
        size: u64,
        opts: &TransferOptions,
        filter: &SyncFilter,
    ) -> Result<TransferStatus> {
        match self.check_local_destination(src, local, opts, filter).await? {
            LocalCheck::Skip => return Ok(TransferStatus::Skipped),
            LocalCheck::Conflict => return Ok(TransferStatus::Failed),
            LocalCheck::Proceed => {}
        }

        tracing::info!("Download {src} => {}", local.display());
        create_parent_dirs(local)?;

        // The file must exist at full length before units seek into it.
        {
            let file = tokio::fs::File::create(local).await?;
            file.set_len(size).await?;
        }

        let plan = PartPlan::new(size, self.config.part_size);
        self.progress.start(size);

        let pool = WorkerPool::new(self.config.max_workers.min(plan.len().max(1)));
        let units = plan.parts.iter().copied().map(|part| {
            let mgr = self.clone();
            let src = src.clone();
            let local = local.to_path_buf();
            async move {
                let what = format!("GetObject part {} of {src}", part.number);
                let result = retry::with_backoff(&what, mgr.config.retry_times, || {
                    let store = mgr.store.clone();
                    let src = src.clone();
                    let local = local.clone();
                    async move {
                        let range = ByteRange::from_offset(part.offset, part.len);
                        let mut reader = store.get_object(&src, Some(range)).await?;
                        let mut file = tokio::fs::OpenOptions::new()
                            .write(true)
                            .open(&local)
                            .await?;
                        file.seek(std::io::SeekFrom::Start(part.offset)).await?;
                        let written = copy_exact(&mut reader, &mut file, part.len).await?;
                        file.flush().await?;
                        Ok(written)
                    }
                })
                .await;

                match result {
                    Ok(written) => {
                        mgr.progress.add(written);
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
        self.progress.finish();
        let failed = outcomes
            .iter()
            .filter(|(_, status)| *status == TransferStatus::Failed)
            .count();
        if failed > 0 {
            tracing::warn!("{failed} parts of {src} failed to download");
            if let Err(err) = std::fs::remove_file(local) {
                tracing::warn!("Cannot delete partial file {}: {err}", local.display());
            }
            return Ok(TransferStatus::Failed);
        }
        Ok(TransferStatus::Done)
    }
}

/// Create the destination's parent directories as needed
fn create_parent_dirs(local: &Path) -> Result<()> {
    if let Some(parent) = local.parent() {
        if !parent.as_os_str().is_empty() && !parent.is_dir() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

/// Stream at most `len` bytes from `reader` into `writer`
async fn copy_exact<R, W>(reader: &mut R, writer: &mut W, len: u64) -> Result<u64>
where
    R: tokio::io::AsyncRead + Unpin + ?Sized,
    W: tokio::io::AsyncWrite + Unpin,
{
    use tokio::io::AsyncReadExt;

    let mut buf = vec![0u8; WRITE_BUF_SIZE.min(len.max(1) as usize)];
    let mut remaining = len;
    while remaining > 0 {
        let want = buf.len().min(remaining as usize);
        let n = reader.read(&mut buf[..want]).await?;
        if n == 0 {
            break;
        }
        writer.write_all(&buf[..n]).await?;
        remaining -= n as u64;
    }
    Ok(len - remaining)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_copy_exact_stops_at_len() {
        let data = b"0123456789".to_vec();
        let mut reader = std::io::Cursor::new(data);
        let mut out = Vec::new();
        let written = copy_exact(&mut reader, &mut out, 4).await.unwrap();
        assert_eq!(written, 4);
        assert_eq!(out, b"0123");
    }

    #[tokio::test]
    async fn test_copy_exact_short_source() {
        let mut reader = std::io::Cursor::new(b"01".to_vec());
        let mut out = Vec::new();
        let written = copy_exact(&mut reader, &mut out, 10).await.unwrap();
        assert_eq!(written, 2);
    }

    #[test]
    fn test_create_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a/b/c.txt");
        create_parent_dirs(&nested).unwrap();
        assert!(nested.parent().unwrap().is_dir());
    }
}
