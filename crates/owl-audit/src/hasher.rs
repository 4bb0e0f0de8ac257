// hasher.rs — SHA-256 hashing for the audit hash chain.
//
// Each appended line records the hash of the line before it. Hashes are
// 64-character lowercase hex strings.

use sha2::{Digest, Sha256};

/// Hash arbitrary bytes, returning a lowercase hex-encoded SHA-256 string.
pub fn hash_bytes(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

/// Hash a raw log line.
pub fn hash_line(line: &str) -> String {
    hash_bytes(line.as_bytes())
}
