//! SHA-256 checksum utility for change detection.

use sha2::{Digest, Sha256};

/// Compute SHA256 checksum of a string
pub fn compute_checksum(s: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(s.as_bytes());
    let result = hasher.finalize();
    format!("{:x}", result)
}

/// Compute an order-sensitive SHA256 checksum over a sequence of lines.
///
/// Each line is terminated with `\n` before hashing so that `["ab", "c"]`
/// and `["a", "bc"]` produce different digests.
pub fn compute_lines_checksum<I, S>(lines: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut hasher = Sha256::new();
    for line in lines {
        hasher.update(line.as_ref().as_bytes());
        hasher.update(b"\n");
    }
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checksum_is_stable_hex() {
        let a = compute_checksum("ALTER TABLE Releases ADD COLUMN x INTEGER");
        let b = compute_checksum("ALTER TABLE Releases ADD COLUMN x INTEGER");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_lines_checksum_respects_boundaries() {
        assert_ne!(
            compute_lines_checksum(["ab", "c"]),
            compute_lines_checksum(["a", "bc"])
        );
        assert_ne!(
            compute_lines_checksum(["a", "b"]),
            compute_lines_checksum(["b", "a"])
        );
    }
}
