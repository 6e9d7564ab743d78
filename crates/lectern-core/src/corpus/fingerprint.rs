//! Corpus change detection.
//!
//! The fingerprint digests every indexable file's path, modified time
//! and size. It decides whether a persisted index snapshot is still
//! valid, so it only needs collision resistance against accidental
//! change, not an adversary.

use std::hash::Hasher;
use std::path::Path;

use twox_hash::XxHash64;

use super::{scan_corpus, CorpusError, CorpusFile};

/// Digests a scanned file listing.
///
/// Entries are sorted lexicographically by path before hashing so the
/// digest is independent of directory iteration order. The modification
/// time enters at nanosecond precision: a same-size rewrite within one
/// second must still produce a different digest.
pub fn compute_fingerprint(files: &[CorpusFile]) -> String {
    let mut entries: Vec<String> = files
        .iter()
        .map(|f| format!("{}:{}:{}", f.rel_path, f.modified_nanos, f.size_bytes))
        .collect();
    entries.sort();

    let mut hasher = XxHash64::with_seed(0);
    hasher.write(entries.join("|").as_bytes());
    format!("{:016x}", hasher.finish())
}

/// Scans `root` and digests the result.
pub fn fingerprint_corpus(root: &Path) -> Result<String, CorpusError> {
    Ok(compute_fingerprint(&scan_corpus(root)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::FileKind;
    use std::path::PathBuf;
    use std::time::{Duration, SystemTime};
    use tempfile::TempDir;

    const SEC: u128 = 1_000_000_000;

    fn file(rel: &str, modified_nanos: u128, size: u64) -> CorpusFile {
        CorpusFile {
            abs_path: PathBuf::from(rel),
            rel_path: rel.to_string(),
            kind: FileKind::Text,
            size_bytes: size,
            modified_secs: (modified_nanos / SEC) as i64,
            modified_nanos,
        }
    }

    fn set_mtime(path: &Path, mtime: SystemTime) {
        std::fs::File::options()
            .write(true)
            .open(path)
            .unwrap()
            .set_modified(mtime)
            .unwrap();
    }

    #[test]
    fn identical_listings_produce_identical_digests() {
        let files = vec![file("a.txt", 100 * SEC, 10), file("b.txt", 200 * SEC, 20)];
        assert_eq!(compute_fingerprint(&files), compute_fingerprint(&files));
    }

    #[test]
    fn digest_is_order_independent() {
        let forward = vec![file("a.txt", 100 * SEC, 10), file("b.txt", 200 * SEC, 20)];
        let reversed = vec![file("b.txt", 200 * SEC, 20), file("a.txt", 100 * SEC, 10)];
        assert_eq!(compute_fingerprint(&forward), compute_fingerprint(&reversed));
    }

    #[test]
    fn touching_mtime_changes_the_digest() {
        let before = vec![file("a.txt", 100 * SEC, 10)];
        let after = vec![file("a.txt", 101 * SEC, 10)];
        assert_ne!(compute_fingerprint(&before), compute_fingerprint(&after));
    }

    #[test]
    fn sub_second_touch_changes_the_digest() {
        let before = vec![file("a.txt", 100 * SEC + 200_000_000, 10)];
        let after = vec![file("a.txt", 100 * SEC + 800_000_000, 10)];
        assert_eq!(before[0].modified_secs, after[0].modified_secs);
        assert_ne!(compute_fingerprint(&before), compute_fingerprint(&after));
    }

    #[test]
    fn resizing_changes_the_digest() {
        let before = vec![file("a.txt", 100 * SEC, 10)];
        let after = vec![file("a.txt", 100 * SEC, 11)];
        assert_ne!(compute_fingerprint(&before), compute_fingerprint(&after));
    }

    #[test]
    fn same_second_rewrite_changes_the_scan_digest() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.txt");
        let base = SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000);

        std::fs::write(&path, "first draft").unwrap();
        set_mtime(&path, base + Duration::from_millis(200));
        let before = fingerprint_corpus(dir.path()).unwrap();

        // equal length, so only the sub-second mtime distinguishes them
        std::fs::write(&path, "later draft").unwrap();
        set_mtime(&path, base + Duration::from_millis(800));
        let after = fingerprint_corpus(dir.path()).unwrap();

        assert_ne!(before, after);
    }

    #[test]
    fn digest_is_sixteen_hex_chars() {
        let digest = compute_fingerprint(&[file("a.txt", SEC, 1)]);
        assert_eq!(digest.len(), 16);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn empty_listing_still_digests() {
        let digest = compute_fingerprint(&[]);
        assert_eq!(digest.len(), 16);
    }
}
