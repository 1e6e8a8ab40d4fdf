/// Unkeyed Blake2b with a 32-byte digest.
pub fn blake2b_256(data: &[u8]) -> [u8; 32] {
    let hash = blake2b_simd::Params::new().hash_length(32).hash(data);

    let mut result = [0u8; 32];
    result.copy_from_slice(hash.as_bytes());
    result
}

/// Blake2b-256 over the concatenation of `parts`.
pub fn blake2b_256_concat(parts: &[&[u8]]) -> [u8; 32] {
    let mut state = blake2b_simd::Params::new().hash_length(32).to_state();
    for part in parts {
        state.update(part);
    }

    let mut result = [0u8; 32];
    result.copy_from_slice(state.finalize().as_bytes());
    result
}
