//! Part planning for chunked transfers
//!
//! Computes chunk boundaries and decides single-shot vs. multipart. Parts
//! partition `[0, total)` exactly and contiguously; the last part absorbs
//! the remainder bytes.

use super::{MAX_PARTS, SINGLE_MAX_SIZE};

/// One contiguous byte range of a transfer, numbered from 1
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Part {
    pub number: i32,
    pub offset: u64,
    pub len: u64,
}

/// Transfer strategy for one object
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferStrategy {
    /// One request, no parts
    Single,
    /// Ranged parts through a multipart session or concurrent ranged reads
    Multipart,
}

impl TransferStrategy {
    /// Upload strategy: single-shot while the object fits in one part and
    /// under the single-request ceiling. Zero-length objects are always
    /// single-shot with an empty body.
    pub fn for_upload(size: u64, part_size: u64) -> Self {
        if size <= part_size && size <= SINGLE_MAX_SIZE {
            TransferStrategy::Single
        } else {
            TransferStrategy::Multipart
        }
    }

    /// Download strategy: split once the object exceeds the split threshold.
    pub fn for_download(size: u64, split_threshold: u64) -> Self {
        if size <= split_threshold {
            TransferStrategy::Single
        } else {
            TransferStrategy::Multipart
        }
    }

    /// Copy strategy: one server-side copy while under the single-request
    /// ceiling, ranged part copies otherwise.
    pub fn for_copy(size: u64, single_max: u64) -> Self {
        if size < single_max {
            TransferStrategy::Single
        } else {
            TransferStrategy::Multipart
        }
    }
}

/// An ordered list of parts covering `[0, total)`
#[derive(Debug, Clone)]
pub struct PartPlan {
    /// Effective chunk size after ceiling adjustment
    pub chunk_size: u64,
    pub parts: Vec<Part>,
}

impl PartPlan {
    /// Split `total` bytes into parts of `chunk_size`, growing the chunk
    /// tenfold while the part-count ceiling would be exceeded. The final
    /// remainder, if any, becomes one extra (smaller) part.
    pub fn new(total: u64, chunk_size: u64) -> Self {
        let mut chunk = chunk_size.clamp(1, SINGLE_MAX_SIZE);
        while total / chunk >= MAX_PARTS {
            chunk *= 10;
        }

        let full_parts = total / chunk;
        let remainder = total - full_parts * chunk;

        let mut parts = Vec::with_capacity((full_parts + 1) as usize);
        for i in 0..full_parts {
            parts.push(Part {
                number: (i + 1) as i32,
                offset: i * chunk,
                len: chunk,
            });
        }
        if remainder > 0 {
            parts.push(Part {
                number: (full_parts + 1) as i32,
                offset: full_parts * chunk,
                len: remainder,
            });
        }

        Self {
            chunk_size: chunk,
            parts,
        }
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    pub fn total_bytes(&self) -> u64 {
        self.parts.iter().map(|p| p.len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_partitions(total: u64, chunk: u64) {
        let plan = PartPlan::new(total, chunk);

        assert!(plan.parts.len() as u64 <= MAX_PARTS);
        assert_eq!(plan.total_bytes(), total);

        // contiguous, non-overlapping, 1-based ascending numbers
        let mut expected_offset = 0u64;
        for (i, part) in plan.parts.iter().enumerate() {
            assert_eq!(part.number, (i + 1) as i32);
            assert_eq!(part.offset, expected_offset);
            assert!(part.len > 0);
            expected_offset += part.len;
        }
        assert_eq!(expected_offset, total);
    }

    #[test]
    fn test_exact_multiple() {
        let plan = PartPlan::new(1000, 100);
        assert_eq!(plan.parts.len(), 10);
        assert!(plan.parts.iter().all(|p| p.len == 100));
        assert_partitions(1000, 100);
    }

    #[test]
    fn test_remainder_becomes_extra_part() {
        let plan = PartPlan::new(1050, 100);
        assert_eq!(plan.parts.len(), 11);
        assert_eq!(plan.parts[10].len, 50);
        assert_eq!(plan.parts[10].offset, 1000);
        assert_partitions(1050, 100);
    }

    #[test]
    fn test_single_small_part() {
        let plan = PartPlan::new(37, 100);
        assert_eq!(plan.parts.len(), 1);
        assert_eq!(plan.parts[0].len, 37);
        assert_partitions(37, 100);
    }

    #[test]
    fn test_zero_total_is_empty_plan() {
        let plan = PartPlan::new(0, 100);
        assert!(plan.is_empty());
    }

    #[test]
    fn test_chunk_growth_respects_part_ceiling() {
        // 10_000 full chunks would hit the ceiling exactly; chunk grows x10
        let chunk = 1024u64;
        let total = chunk * MAX_PARTS;
        let plan = PartPlan::new(total, chunk);
        assert_eq!(plan.chunk_size, chunk * 10);
        assert_eq!(plan.parts.len(), 1000);
        assert_partitions(total, chunk);

        // just under the ceiling keeps the configured chunk
        let plan = PartPlan::new(total - 1, chunk);
        assert_eq!(plan.chunk_size, chunk);
        assert_eq!(plan.parts.len(), MAX_PARTS as usize);
        assert_partitions(total - 1, chunk);
    }

    #[test]
    fn test_chunk_growth_repeats_until_satisfied() {
        let chunk = 8u64;
        let total = chunk * MAX_PARTS * 100;
        let plan = PartPlan::new(total, chunk);
        assert_eq!(plan.chunk_size, chunk * 1000);
        assert!((plan.parts.len() as u64) < MAX_PARTS);
        assert_partitions(total, chunk);
    }

    #[test]
    fn test_partition_property_sweep() {
        for total in [1, 99, 100, 101, 999, 12_345, 100_000] {
            for chunk in [1, 7, 100, 4096] {
                assert_partitions(total, chunk);
            }
        }
    }

    #[test]
    fn test_upload_strategy() {
        assert_eq!(
            TransferStrategy::for_upload(0, 100),
            TransferStrategy::Single
        );
        assert_eq!(
            TransferStrategy::for_upload(100, 100),
            TransferStrategy::Single
        );
        assert_eq!(
            TransferStrategy::for_upload(101, 100),
            TransferStrategy::Multipart
        );
        // over the single-request ceiling regardless of part size
        assert_eq!(
            TransferStrategy::for_upload(SINGLE_MAX_SIZE + 1, u64::MAX),
            TransferStrategy::Multipart
        );
    }

    #[test]
    fn test_download_strategy() {
        assert_eq!(
            TransferStrategy::for_download(100, 1000),
            TransferStrategy::Single
        );
        assert_eq!(
            TransferStrategy::for_download(1001, 1000),
            TransferStrategy::Multipart
        );
    }

    #[test]
    fn test_copy_strategy() {
        assert_eq!(
            TransferStrategy::for_copy(1, SINGLE_MAX_SIZE),
            TransferStrategy::Single
        );
        assert_eq!(
            TransferStrategy::for_copy(SINGLE_MAX_SIZE, SINGLE_MAX_SIZE),
            TransferStrategy::Multipart
        );
    }
}
