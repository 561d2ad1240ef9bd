//! Transfer skip decisions
//!
//! Combines include/ignore glob matching with the size + content-hash
//! comparison used by sync mode. The filter itself is pure: the caller
//! fetches the destination metadata (HEAD) and hands it in, so decisions
//! are deterministic and unit-testable.

use glob::Pattern;

use crate::error::{Error, Result};
use crate::hash;

/// Why a transfer was skipped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Path excluded by the include/ignore globs
    Filtered,
    /// Sync comparison found the destination already identical
    AlreadyCurrent,
}

/// Whether a given path transfer should run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncDecision {
    Proceed,
    Skip(SkipReason),
}

/// Size and optional content hash of one side of a comparison
#[derive(Debug, Clone, Default)]
pub struct ContentSummary {
    pub size: u64,
    pub md5: Option<String>,
}

impl ContentSummary {
    pub fn new(size: u64, md5: Option<String>) -> Self {
        Self { size, md5 }
    }
}

/// Include/ignore glob matcher plus content-equality check
#[derive(Debug, Clone, Default)]
pub struct SyncFilter {
    include: Vec<Pattern>,
    ignore: Vec<Pattern>,
}

impl SyncFilter {
    /// Compile the glob lists. An empty include list matches everything.
    pub fn new(include: &[String], ignore: &[String]) -> Result<Self> {
        let compile = |rules: &[String]| -> Result<Vec<Pattern>> {
            rules
                .iter()
                .map(|rule| {
                    Pattern::new(rule)
                        .map_err(|e| Error::InvalidPath(format!("Bad glob '{rule}': {e}")))
                })
                .collect()
        };
        Ok(Self {
            include: compile(include)?,
            ignore: compile(ignore)?,
        })
    }

    /// Glob check: at least one include match (or no include rules) and no
    /// ignore match.
    pub fn matches(&self, candidate: &str) -> bool {
        let included =
            self.include.is_empty() || self.include.iter().any(|p| p.matches(candidate));
        let ignored = self.ignore.iter().any(|p| p.matches(candidate));
        included && !ignored
    }

    /// Full decision for one path: glob filtering first, then (in sync mode)
    /// the content comparison against the destination. An absent destination
    /// always proceeds.
    pub fn decide(
        &self,
        candidate: &str,
        source: &ContentSummary,
        destination: Option<&ContentSummary>,
        sync: bool,
        skip_hash: bool,
    ) -> SyncDecision {
        if !self.matches(candidate) {
            return SyncDecision::Skip(SkipReason::Filtered);
        }
        if sync {
            return compare(source, destination, skip_hash);
        }
        SyncDecision::Proceed
    }
}

/// Content comparison between source and destination.
///
/// Equal means same size and, unless `skip_hash`, both hashes present and
/// equal. Anything else proceeds.
pub fn compare(
    source: &ContentSummary,
    destination: Option<&ContentSummary>,
    skip_hash: bool,
) -> SyncDecision {
    let Some(dest) = destination else {
        return SyncDecision::Proceed;
    };
    if source.size != dest.size {
        return SyncDecision::Proceed;
    }
    if skip_hash {
        return SyncDecision::Skip(SkipReason::AlreadyCurrent);
    }
    match (&source.md5, &dest.md5) {
        (Some(a), Some(b)) if hash::digests_equal(a, b) => {
            SyncDecision::Skip(SkipReason::AlreadyCurrent)
        }
        _ => SyncDecision::Proceed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(size: u64, md5: &str) -> ContentSummary {
        ContentSummary::new(size, Some(md5.to_string()))
    }

    #[test]
    fn test_empty_include_matches_everything() {
        let filter = SyncFilter::new(&[], &[]).unwrap();
        assert!(filter.matches("any/path.txt"));
    }

    #[test]
    fn test_include_and_ignore_globs() {
        let filter = SyncFilter::new(
            &["*.jpg".to_string(), "photos/*".to_string()],
            &["photos/private/*".to_string()],
        )
        .unwrap();

        assert!(filter.matches("cover.jpg"));
        assert!(filter.matches("photos/day1.png"));
        assert!(!filter.matches("notes.txt"));
        assert!(!filter.matches("photos/private/secret.png"));
    }

    #[test]
    fn test_bad_glob_is_rejected() {
        assert!(SyncFilter::new(&["[".to_string()], &[]).is_err());
    }

    #[test]
    fn test_compare_identical_skips() {
        let local = summary(100, "aa");
        let remote = summary(100, "AA");
        assert_eq!(
            compare(&local, Some(&remote), false),
            SyncDecision::Skip(SkipReason::AlreadyCurrent)
        );
    }

    #[test]
    fn test_compare_size_mismatch_proceeds() {
        let local = summary(100, "aa");
        let remote = summary(101, "aa");
        assert_eq!(compare(&local, Some(&remote), false), SyncDecision::Proceed);
    }

    #[test]
    fn test_compare_hash_mismatch_proceeds() {
        let local = summary(100, "aa");
        let remote = summary(100, "bb");
        assert_eq!(compare(&local, Some(&remote), false), SyncDecision::Proceed);
    }

    #[test]
    fn test_compare_absent_destination_proceeds() {
        let local = summary(100, "aa");
        assert_eq!(compare(&local, None, false), SyncDecision::Proceed);
        assert_eq!(compare(&local, None, true), SyncDecision::Proceed);
    }

    #[test]
    fn test_compare_skip_hash_uses_size_only() {
        let local = ContentSummary::new(100, None);
        let remote = ContentSummary::new(100, None);
        assert_eq!(
            compare(&local, Some(&remote), true),
            SyncDecision::Skip(SkipReason::AlreadyCurrent)
        );
        // without skip_hash, a missing hash is not proof of equality
        assert_eq!(compare(&local, Some(&remote), false), SyncDecision::Proceed);
    }

    #[test]
    fn test_decide_filtering_wins_over_sync() {
        let filter = SyncFilter::new(&[], &["*.tmp".to_string()]).unwrap();
        let local = summary(1, "aa");
        assert_eq!(
            filter.decide("scratch.tmp", &local, None, true, false),
            SyncDecision::Skip(SkipReason::Filtered)
        );
    }

    #[test]
    fn test_decide_without_sync_ignores_destination() {
        let filter = SyncFilter::new(&[], &[]).unwrap();
        let local = summary(1, "aa");
        let remote = summary(1, "aa");
        assert_eq!(
            filter.decide("a.txt", &local, Some(&remote), false, false),
            SyncDecision::Proceed
        );
    }
}
