// hasher.rs — SHA-256 content hashes for snapshots.
//
// Every snapshot records the hash of the bytes it captured, so a restore can
// prove it is writing back exactly what was backed up.

use sha2::{Digest, Sha256};

/// Hash arbitrary bytes, returning a lowercase hex-encoded SHA-256 string.
pub fn hash_bytes(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_known_value() {
        // SHA-256("") = e3b0c442...b855
        assert_eq!(
            hash_bytes(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn hash_distinguishes_content() {
        assert_ne!(hash_bytes(b"#111111"), hash_bytes(b"#333333"));
        assert_eq!(hash_bytes(b"#111111").len(), 64);
    }
}
