//! MurmurHash3 x64_128.
//!
//! Original algorithm by Austin Appleby (public domain). The `fbx` crate uses it
//! to turn arena keys into well-distributed 64-bit wire identifiers.

const C1: u64 = 0x87c3_7b91_1142_53d5;
const C2: u64 = 0x4cf5_ad43_2745_937f;

/// Compute MurmurHash3 x64_128 of `data` with the given seed.
///
/// Returns the two 64-bit halves `(h1, h2)`.
pub fn hash128(data: &[u8], seed: u64) -> (u64, u64) {
    let len = data.len();
    let mut h1 = seed;
    let mut h2 = seed;

    let mut blocks = data.chunks_exact(16);
    for block in &mut blocks {
        let (lo, hi) = block.split_at(8);
        let k1 = u64::from_le_bytes(to_array(lo));
        let k2 = u64::from_le_bytes(to_array(hi));

        h1 ^= mix_k1(k1);
        h1 = h1.rotate_left(27).wrapping_add(h2);
        h1 = h1.wrapping_mul(5).wrapping_add(0x52dc_e729);

        h2 ^= mix_k2(k2);
        h2 = h2.rotate_left(31).wrapping_add(h1);
        h2 = h2.wrapping_mul(5).wrapping_add(0x3849_5ab5);
    }

    // Tail: up to 15 trailing bytes, little-endian into k1 (0..8) and k2 (8..16).
    let tail = blocks.remainder();
    let mut k1 = 0u64;
    let mut k2 = 0u64;
    for (i, &byte) in tail.iter().enumerate() {
        if i < 8 {
            k1 |= (byte as u64) << (8 * i);
        } else {
            k2 |= (byte as u64) << (8 * (i - 8));
        }
    }
    if tail.len() > 8 {
        h2 ^= mix_k2(k2);
    }
    if !tail.is_empty() {
        h1 ^= mix_k1(k1);
    }

    h1 ^= len as u64;
    h2 ^= len as u64;

    h1 = h1.wrapping_add(h2);
    h2 = h2.wrapping_add(h1);

    h1 = fmix64(h1);
    h2 = fmix64(h2);

    h1 = h1.wrapping_add(h2);
    h2 = h2.wrapping_add(h1);

    (h1, h2)
}

/// Fold the 128-bit hash of a single `u64` into 64 bits.
#[inline]
pub fn hash_u64(value: u64, seed: u64) -> u64 {
    let (h1, h2) = hash128(&value.to_le_bytes(), seed);
    h1 ^ h2
}

#[inline]
fn mix_k1(k1: u64) -> u64 {
    k1.wrapping_mul(C1).rotate_left(31).wrapping_mul(C2)
}

#[inline]
fn mix_k2(k2: u64) -> u64 {
    k2.wrapping_mul(C2).rotate_left(33).wrapping_mul(C1)
}

#[inline]
fn to_array(bytes: &[u8]) -> [u8; 8] {
    let mut out = [0u8; 8];
    out.copy_from_slice(bytes);
    out
}

/// Final avalanche.
#[inline]
fn fmix64(mut h: u64) -> u64 {
    h ^= h >> 33;
    h = h.wrapping_mul(0xff51_afd7_ed55_8ccd);
    h ^= h >> 33;
    h = h.wrapping_mul(0xc4ce_b9fe_1a85_ec53);
    h ^= h >> 33;
    h
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_zero_seed() {
        assert_eq!(hash128(&[], 0), (0, 0));
    }

    #[test]
    fn test_known_vector() {
        // Reference value from the canonical C++ implementation.
        let (h1, h2) = hash128(b"hello", 0);
        assert_eq!(h1, 0xcbd8_a7b3_41bd_9b02);
        assert_eq!(h2, 0x5b1e_906a_48ae_1d19);
    }

    #[test]
    fn test_block_and_tail() {
        let data: Vec<u8> = (0..37).collect();
        let a = hash128(&data, 0);
        let b = hash128(&data[..36], 0);
        assert_ne!(a, b);
        assert_eq!(a, hash128(&data, 0));
    }

    #[test]
    fn test_hash_u64_spreads() {
        assert_ne!(hash_u64(1, 0), hash_u64(2, 0));
        assert_ne!(hash_u64(1, 0), hash_u64(1, 7));
    }
}
