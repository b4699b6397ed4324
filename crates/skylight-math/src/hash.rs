//! Stateless integer hashes for per-cell and per-ray randomness.
//!
//! Deterministic across platforms: the star field and the cloud march jitter
//! must produce identical patterns for identical inputs.

/// 32-bit integer finaliser (lowbias32).
#[inline]
pub fn hash_u32(mut x: u32) -> u32 {
    x ^= x >> 16;
    x = x.wrapping_mul(0x7feb_352d);
    x ^= x >> 15;
    x = x.wrapping_mul(0x846c_a68b);
    x ^= x >> 16;
    x
}

/// Hash of a 2D integer cell.
#[inline]
pub fn hash2(x: i32, y: i32) -> u32 {
    hash_u32((x as u32) ^ hash_u32((y as u32).wrapping_add(0x9e37_79b9)))
}

/// Hash of a 3D integer cell.
#[inline]
pub fn hash3(x: i32, y: i32, z: i32) -> u32 {
    hash_u32((x as u32) ^ hash2(y, z).wrapping_add(0x85eb_ca6b))
}

/// Map a hash to `[0, 1)`.
#[inline]
pub fn hash_to_unit(h: u32) -> f32 {
    (h >> 8) as f32 / (1u32 << 24) as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_is_deterministic() {
        assert_eq!(hash2(12, -7), hash2(12, -7));
        assert_eq!(hash3(1, 2, 3), hash3(1, 2, 3));
    }

    #[test]
    fn test_hash_distinguishes_neighbours() {
        assert_ne!(hash2(0, 0), hash2(1, 0));
        assert_ne!(hash2(0, 0), hash2(0, 1));
        assert_ne!(hash2(1, 0), hash2(0, 1));
    }

    #[test]
    fn test_hash_to_unit_range() {
        let mut sum = 0.0;
        for i in 0..10_000 {
            let u = hash_to_unit(hash_u32(i));
            assert!((0.0..1.0).contains(&u), "value out of range: {u}");
            sum += u;
        }
        let mean = sum / 10_000.0;
        assert!((mean - 0.5).abs() < 0.02, "hash is biased: mean {mean}");
    }
}
