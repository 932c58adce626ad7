/*!
 * Content verification for blobs
 */

use modelvault_core_interface::{Result, StoreSystem, StoreSystemExt};
use modelvault_core_manifest::{Digest, DigestAlgorithm};
use std::path::Path;

/// Outcome of hashing one blob
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verification {
    Match,
    /// Contents hash to something else; carries the actual hex
    Mismatch(String),
}

/// Hash the file at `path` and compare with `expected`
pub fn verify_blob<S: StoreSystem + ?Sized>(
    system: &S,
    path: &Path,
    expected: &Digest,
) -> Result<Verification> {
    let actual = match expected.algorithm() {
        DigestAlgorithm::Sha256 => hex::encode(system.calculate_file_hash(path)?),
    };

    if actual == expected.hex() {
        Ok(Verification::Match)
    } else {
        Ok(Verification::Mismatch(actual))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::system::MockSystem;

    // SHA256 of "hello world"
    const HELLO: &str = "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9";

    #[test]
    fn test_matching_blob() {
        let system = MockSystem::new();
        system.add_file("/b/blob", b"hello world");
        let digest = Digest::sha256(HELLO).unwrap();
        assert_eq!(
            verify_blob(&system, Path::new("/b/blob"), &digest).unwrap(),
            Verification::Match
        );
    }

    #[test]
    fn test_corrupted_blob() {
        let system = MockSystem::new();
        system.add_file("/b/blob", b"hello w0rld");
        let digest = Digest::sha256(HELLO).unwrap();
        let result = verify_blob(&system, Path::new("/b/blob"), &digest).unwrap();
        assert!(matches!(result, Verification::Mismatch(actual) if actual.len() == 64));
    }

    #[test]
    fn test_missing_blob_errors() {
        let system = MockSystem::new();
        let digest = Digest::sha256(HELLO).unwrap();
        let err = verify_blob(&system, Path::new("/b/nothing"), &digest).unwrap_err();
        assert!(err.is_not_found());
    }
}
