//! API key material
//!
//! Keys are shown to their owner once; only the sha256 hex digest is stored.

use rand::RngCore;
use sha2::{Digest, Sha256};

const KEY_PREFIX: &str = "cbo_";
const KEY_BYTES: usize = 24;

/// Generate a fresh random API key
pub fn generate_api_key() -> String {
    let mut bytes = [0u8; KEY_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    format!("{}{}", KEY_PREFIX, hex::encode(bytes))
}

/// Digest stored in `api_keys.key_hash`
pub fn hash_api_key(key: &str) -> String {
    hex::encode(Sha256::digest(key.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_is_sha256_hex() {
        assert_eq!(
            hash_api_key("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_generated_keys_are_unique_and_prefixed() {
        let a = generate_api_key();
        let b = generate_api_key();

        assert!(a.starts_with(KEY_PREFIX));
        assert_eq!(a.len(), KEY_PREFIX.len() + KEY_BYTES * 2);
        assert_ne!(a, b);
        assert_eq!(hash_api_key(&a).len(), 64);
    }
}
