// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Output fingerprints — SHA-256 of every written SVG, recorded in the batch
// report so reruns can be compared file by file.

use std::path::Path;

use sha2::{Digest, Sha256};
use tracewerk_core::error::Result;

/// Compute the SHA-256 hash of `data` and return it as a lowercase hex string.
pub fn hash_bytes(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Hash a file already on disk.
pub fn hash_file(path: impl AsRef<Path>) -> Result<String> {
    let data = std::fs::read(path)?;
    Ok(hash_bytes(&data))
}

/// Whether the file at `path` hashes to `expected_hex` (case-insensitive).
pub fn verify_file(path: impl AsRef<Path>, expected_hex: &str) -> Result<bool> {
    Ok(hash_file(path)?.eq_ignore_ascii_case(expected_hex))
}
