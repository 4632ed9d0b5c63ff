//! Content checksums for conversion inputs and outputs.
//!
//! Both files are hashed with SHA-256 in fixed-size chunks so arbitrarily
//! large videos never need to fit in memory. A checksum that cannot be
//! computed makes the result unverifiable; it never fails the job.

use crate::error::{CoreError, CoreResult};

use log::{debug, warn};
use sha2::{Digest, Sha256};

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Read size for streaming checksums.
pub const CHECKSUM_CHUNK_SIZE: usize = 64 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationResult {
    Verified {
        checksum_in: String,
        checksum_out: String,
    },
    Unverifiable(String),
}

impl VerificationResult {
    #[must_use]
    pub fn is_verified(&self) -> bool {
        matches!(self, VerificationResult::Verified { .. })
    }

    /// Whether input and output have identical content.
    #[must_use]
    pub fn checksums_match(&self) -> bool {
        match self {
            VerificationResult::Verified {
                checksum_in,
                checksum_out,
            } => checksum_in == checksum_out,
            VerificationResult::Unverifiable(_) => false,
        }
    }
}

/// Lowercase hex SHA-256 of the file at `path`.
pub fn sha256_file(path: &Path) -> CoreResult<String> {
    let file = File::open(path)?;
    let mut reader = BufReader::with_capacity(CHECKSUM_CHUNK_SIZE, file);
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; CHECKSUM_CHUNK_SIZE];

    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

/// Checksums `input` and `output`.
#[must_use]
pub fn verify(input: &Path, output: &Path) -> VerificationResult {
    let checksum = |path: &Path| {
        sha256_file(path).map_err(|e| {
            CoreError::VerificationUnavailable(format!("cannot checksum {}: {e}", path.display()))
        })
    };

    match checksum(input).and_then(|cin| checksum(output).map(|cout| (cin, cout))) {
        Ok((checksum_in, checksum_out)) => {
            debug!("sha256 {} = {checksum_in}", input.display());
            debug!("sha256 {} = {checksum_out}", output.display());
            VerificationResult::Verified {
                checksum_in,
                checksum_out,
            }
        }
        Err(e) => {
            warn!("{e}");
            VerificationResult::Unverifiable(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_known_digest() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("abc");
        fs::write(&path, b"abc").unwrap();
        assert_eq!(
            sha256_file(&path).unwrap(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_copy_matches_and_modified_differs() {
        let dir = tempfile::tempdir().unwrap();
        let original = dir.path().join("in.bin");
        let copy = dir.path().join("copy.bin");
        let modified = dir.path().join("modified.bin");

        // Larger than one chunk so the streaming path is exercised.
        let data: Vec<u8> = (0..(CHECKSUM_CHUNK_SIZE * 2 + 17)).map(|i| (i % 251) as u8).collect();
        fs::write(&original, &data).unwrap();
        fs::write(&copy, &data).unwrap();
        let mut changed = data.clone();
        changed[CHECKSUM_CHUNK_SIZE + 3] ^= 0x01;
        fs::write(&modified, &changed).unwrap();

        let same = verify(&original, &copy);
        assert!(same.is_verified());
        assert!(same.checksums_match());

        let different = verify(&original, &modified);
        assert!(different.is_verified());
        assert!(!different.checksums_match());
    }

    #[test]
    fn test_missing_output_is_unverifiable() {
        let dir = tempfile::tempdir().unwrap();
        let original = dir.path().join("in.bin");
        fs::write(&original, b"data").unwrap();

        match verify(&original, &dir.path().join("missing.mp4")) {
            VerificationResult::Unverifiable(reason) => assert!(reason.contains("missing.mp4")),
            other => panic!("expected unverifiable, got {other:?}"),
        }
    }
}
