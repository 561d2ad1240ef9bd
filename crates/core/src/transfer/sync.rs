//! Sync-delete reconciliation passes
//!
//! After a `--sync --delete` mirror, the destination tree is walked and
//! every entry absent from the source side is removed. Existence is checked
//! per entry (HEAD / stat), one round trip per destination entry.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::path::{key_to_relative, relative_to_local, RemotePath};
use crate::retry;
use crate::traits::{ObjectIdent, ObjectStore};

use super::DeleteCounts;

impl<S: ObjectStore + 'static> super::TransferManager<S> {
    /// Upload counterpart: delete remote objects with no local file.
    pub(super) async fn sync_delete_remote(
        &self,
        local_root: &Path,
        dest: &RemotePath,
    ) -> Result<DeleteCounts> {
        let prefix = dest.as_prefix();
        let prefix_path = dest.with_key(prefix.clone());
        let mut counts = DeleteCounts::default();
        let mut marker: Option<String> = None;

        loop {
            let page = self.list_page(&prefix_path, "", marker.clone()).await?;

            let mut stale: Vec<ObjectIdent> = Vec::new();
            for item in &page.items {
                if item.is_dir {
                    continue;
                }
                let Some(relative) = key_to_relative(&prefix, &item.key) else {
                    continue;
                };
                let local = relative_to_local(local_root, relative);
                if !local.is_file() {
                    stale.push(ObjectIdent::key(item.key.clone()));
                }
            }
            counts.merge(self.delete_batch(&dest.bucket, stale).await);

            if page.truncated {
                marker = page.next_marker;
            } else {
                break;
            }
        }
        Ok(counts)
    }

    /// Download counterpart: delete local files with no remote object.
    pub(super) async fn sync_delete_local(
        &self,
        local_root: &Path,
        src: &RemotePath,
    ) -> Result<DeleteCounts> {
        let prefix = src.as_prefix();
        let mut counts = DeleteCounts::default();

        let mut queue: VecDeque<(PathBuf, String)> =
            VecDeque::from([(local_root.to_path_buf(), prefix)]);
        while let Some((dir, key_prefix)) = queue.pop_front() {
            for entry in std::fs::read_dir(&dir)? {
                let entry = entry?;
                let path = entry.path();
                let name = entry.file_name().to_string_lossy().to_string();
                if entry.file_type()?.is_dir() {
                    queue.push_back((path, format!("{key_prefix}{name}/")));
                    continue;
                }

                let counterpart = src.with_key(format!("{key_prefix}{name}"));
                match self.head_if_exists(&counterpart).await? {
                    Some(_) => {}
                    None => match std::fs::remove_file(&path) {
                        Ok(()) => {
                            tracing::info!("Delete {}", path.display());
                            counts.deleted += 1;
                        }
                        Err(err) => {
                            tracing::warn!("Delete {} failed: {err}", path.display());
                            counts.failed += 1;
                        }
                    },
                }
            }
        }
        Ok(counts)
    }

    /// Copy counterpart: delete destination objects whose source is gone.
    pub(super) async fn sync_delete_copy_dest(
        &self,
        src: &RemotePath,
        dest: &RemotePath,
    ) -> Result<DeleteCounts> {
        let src_prefix = src.as_prefix();
        let dest_prefix = dest.as_prefix();
        let dest_root = dest.with_key(dest_prefix.clone());
        let mut counts = DeleteCounts::default();
        let mut marker: Option<String> = None;

        loop {
            let page = self.list_page(&dest_root, "", marker.clone()).await?;

            let mut stale: Vec<ObjectIdent> = Vec::new();
            for item in &page.items {
                if item.is_dir {
                    continue;
                }
                let Some(relative) = key_to_relative(&dest_prefix, &item.key) else {
                    continue;
                };
                let counterpart = src.with_key(format!("{src_prefix}{relative}"));
                if self.head_if_exists(&counterpart).await?.is_none() {
                    stale.push(ObjectIdent::key(item.key.clone()));
                }
            }
            counts.merge(self.delete_batch(&dest.bucket, stale).await);

            if page.truncated {
                marker = page.next_marker;
            } else {
                break;
            }
        }
        Ok(counts)
    }

    /// Batch delete with per-key error accounting
    async fn delete_batch(&self, bucket: &str, stale: Vec<ObjectIdent>) -> DeleteCounts {
        let mut counts = DeleteCounts::default();
        if stale.is_empty() {
            return counts;
        }

        let result = retry::with_backoff("DeleteObjects", self.config.retry_times, || {
            self.store.delete_objects(bucket, stale.clone())
        })
        .await;

        match result {
            Ok(outcome) => {
                for ident in &outcome.deleted {
                    tracing::info!("Delete {bucket}/{}", ident.key);
                }
                for err in &outcome.errors {
                    tracing::info!(
                        "Delete {bucket}/{} failed, code: {}, msg: {}",
                        err.key,
                        err.code.as_deref().unwrap_or("-"),
                        err.message.as_deref().unwrap_or("-")
                    );
                }
                counts.deleted += outcome.deleted.len();
                counts.failed += outcome.errors.len();
            }
            Err(err) => {
                tracing::warn!("Batch delete failed: {err}");
                counts.failed += stale.len();
            }
        }
        counts
    }
}

impl DeleteCounts {
    pub(super) fn merge(&mut self, other: DeleteCounts) {
        self.deleted += other.deleted;
        self.failed += other.failed;
    }
}
