//! Chunked transfer engine
//!
//! Splits large objects into parts, drives a bounded worker pool, tracks
//! partial multipart progress durably so interrupted uploads resume, verifies
//! integrity, and reconciles local/remote trees for one-way sync.
//!
//! All mutable transfer state is owned by a [`TransferManager`] instance;
//! nothing lives in globals, so concurrent operations in one process cannot
//! corrupt each other.

mod copy;
mod download;
pub mod filter;
mod manager;
pub mod planner;
pub mod pool;
pub mod resume;
mod sync;
mod upload;

pub use copy::CopyMode;
pub use filter::{ContentSummary, SkipReason, SyncDecision, SyncFilter};
pub use manager::TransferManager;
pub use planner::{Part, PartPlan, TransferStrategy};
pub use pool::WorkerPool;
pub use resume::{Fingerprint, ResumeStore};

use crate::config::TransferDefaults;

/// Largest object a single PUT (or single server-side copy) may carry: 5 GiB.
pub const SINGLE_MAX_SIZE: u64 = 5 * 1024 * 1024 * 1024;

/// Most parts a multipart upload may have.
pub const MAX_PARTS: u64 = 10_000;

/// Listing page size; also the folder-walk batch size.
pub const LIST_PAGE_SIZE: i32 = 1000;

/// Tuning knobs of one transfer operation
#[derive(Debug, Clone)]
pub struct TransferConfig {
    /// Part size in bytes for multipart transfers
    pub part_size: u64,

    /// Maximum concurrent transfer units per admission gate
    pub max_workers: usize,

    /// Retries per unit before terminal failure
    pub retry_times: u32,

    /// Downloads larger than this are split into ranged parts
    pub download_split: u64,

    /// Copies at or above this size go through ranged part copies; the
    /// remote rejects single copies at the single-request ceiling
    pub copy_split: u64,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self::from(&TransferDefaults::default())
    }
}

impl From<&TransferDefaults> for TransferConfig {
    fn from(defaults: &TransferDefaults) -> Self {
        Self {
            part_size: defaults.part_size_mb.max(1) * 1024 * 1024,
            max_workers: defaults.max_workers.max(1),
            retry_times: defaults.retry_times,
            download_split: defaults.download_split_mb.max(1) * 1024 * 1024,
            copy_split: SINGLE_MAX_SIZE,
        }
    }
}

/// Behavior flags shared by upload, download, and copy operations
#[derive(Debug, Clone, Default)]
pub struct TransferOptions {
    /// Skip the sync comparison and any overwrite/confirmation guard;
    /// for multipart uploads, also ignore any existing resume record
    pub force: bool,

    /// Sync mode: skip destinations already identical by size + content hash
    pub sync: bool,

    /// With sync: delete destination entries absent from the source
    pub delete: bool,

    /// Compare by size only; do not compute content hashes
    pub skip_hash: bool,

    /// Include globs (empty means everything)
    pub include: Vec<String>,

    /// Ignore globs
    pub ignore: Vec<String>,
}

/// Terminal outcome of one object transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferStatus {
    Done,
    Skipped,
    Failed,
}

/// Aggregate outcome counts for batch operations
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransferCounts {
    pub succeeded: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl TransferCounts {
    pub fn record(&mut self, status: TransferStatus) {
        match status {
            TransferStatus::Done => self.succeeded += 1,
            TransferStatus::Skipped => self.skipped += 1,
            TransferStatus::Failed => self.failed += 1,
        }
    }

    pub fn merge(&mut self, other: TransferCounts) {
        self.succeeded += other.succeeded;
        self.skipped += other.skipped;
        self.failed += other.failed;
    }

    /// Overall status: failure iff anything failed
    pub fn all_ok(&self) -> bool {
        self.failed == 0
    }

    pub fn total(&self) -> usize {
        self.succeeded + self.skipped + self.failed
    }
}

/// Outcome of a sync-delete reconciliation pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeleteCounts {
    pub deleted: usize,
    pub failed: usize,
}

/// Byte-level progress sink updated concurrently by transfer units.
///
/// Implementations must be safe for atomic increments from many tasks; the
/// CLI backs this with an indicatif bar, tests and quiet mode use
/// [`NullProgress`].
pub trait TransferProgress: Send + Sync {
    fn start(&self, _total_bytes: u64) {}
    fn add(&self, _bytes: u64) {}
    fn finish(&self) {}
}

/// Progress sink that discards updates
#[derive(Debug, Clone, Copy, Default)]
pub struct NullProgress;

impl TransferProgress for NullProgress {}
