// ============================================================================
// src/util/kdf.rs – Minimal PBKDF2-HMAC-SHA256 implementation
// ============================================================================

use sha2::{Digest, Sha256};

/// Fill `out` with PBKDF2-HMAC-SHA256 output for the given password/salt.
pub fn pbkdf2_sha256(password: &[u8], salt: &[u8], iterations: u32, out: &mut [u8]) {
    assert!(iterations >= 1, "iterations must be >= 1");

    // Block indices are 1-based per RFC 2898.
    for (i, chunk) in out.chunks_mut(32).enumerate() {
        let block = derive_block(password, salt, iterations, i as u32 + 1);
        chunk.copy_from_slice(&block[..chunk.len()]);
    }
}

fn derive_block(password: &[u8], salt: &[u8], iterations: u32, index: u32) -> [u8; 32] {
    let mut seed = Vec::with_capacity(salt.len() + 4);
    seed.extend_from_slice(salt);
    seed.extend_from_slice(&index.to_be_bytes());

    let mut u = hmac_sha256(password, &seed);
    let mut acc = u;
    for _ in 1..iterations {
        u = hmac_sha256(password, &u);
        for (a, b) in acc.iter_mut().zip(u.iter()) {
            *a ^= b;
        }
    }
    acc
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> [u8; 32] {
    let mut key_block = [0u8; 64];
    if key.len() > 64 {
        key_block[..32].copy_from_slice(&Sha256::digest(key));
    } else {
        key_block[..key.len()].copy_from_slice(key);
    }

    let mut inner = Sha256::new();
    let ipad: Vec<u8> = key_block.iter().map(|b| b ^ 0x36).collect();
    inner.update(&ipad);
    inner.update(data);
    let inner_digest = inner.finalize();

    let mut outer = Sha256::new();
    let opad: Vec<u8> = key_block.iter().map(|b| b ^ 0x5c).collect();
    outer.update(&opad);
    outer.update(inner_digest);

    let mut out = [0u8; 32];
    out.copy_from_slice(&outer.finalize());
    out
}
