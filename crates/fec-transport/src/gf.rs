//! GF(2^8) arithmetic for the erasure codec.
//!
//! All four lookup tables are built once per process and shared read-only
//! by every codec instance; `init` is idempotent and safe to call from any
//! thread. Addition is XOR, multiplication and inversion are table lookups,
//! and `add_scaled_row` is the single hot loop the encoder, decoder and
//! matrix inversion all reduce to.

use std::sync::OnceLock;

/// Primitive polynomial for the field: 1 + x² + x³ + x⁴ + x⁸.
const PRIM_POLY: u8 = 0x1d;

/// Sentinel stored as the logarithm of zero, which has none.
pub const LOG_ZERO: u8 = 0xff;

pub struct GfTables {
    /// Powers of the generator: `pow[i]` = α^i for i in 0..=254.
    /// Index 255 is never referenced (all exponent arithmetic is mod 255).
    pub(crate) pow: [u8; 256],
    /// Discrete logs: `log[pow[i]] == i`; `log[0]` is [`LOG_ZERO`].
    pub(crate) log: [u8; 256],
    /// Full multiplication table.
    pub(crate) mul: [[u8; 256]; 256],
    /// Multiplicative inverses; `inv[0]` is 0 and is not a true inverse.
    pub(crate) inv: [u8; 256],
}

static TABLES: OnceLock<Box<GfTables>> = OnceLock::new();

fn build_tables() -> Box<GfTables> {
    let mut t = Box::new(GfTables {
        pow: [0; 256],
        log: [0; 256],
        mul: [[0; 256]; 256],
        inv: [0; 256],
    });

    // The first eight powers are α shifted left; α^8 is the primitive
    // polynomial reduced back into the field.
    for i in 0..8 {
        t.pow[i] = 1 << i;
        t.log[t.pow[i] as usize] = i as u8;
    }
    t.pow[8] = PRIM_POLY;
    t.log[PRIM_POLY as usize] = 8;

    // α^i = α^(i-1) · α, reducing by the polynomial when the high bit
    // would shift out.
    for i in 9..255 {
        let prev = t.pow[i - 1];
        t.pow[i] = if prev >= 0x80 {
            (prev << 1) ^ PRIM_POLY
        } else {
            prev << 1
        };
        t.log[t.pow[i] as usize] = i as u8;
    }
    t.log[0] = LOG_ZERO;

    for i in 1..256 {
        for j in 1..256 {
            let e = (t.log[i] as usize + t.log[j] as usize) % 255;
            t.mul[i][j] = t.pow[e];
        }
    }
    // Row and column zero stay all-zero.

    t.inv[0] = 0;
    t.inv[1] = 1;
    for i in 2..256 {
        t.inv[i] = t.pow[255 - t.log[i] as usize];
    }

    t
}

/// Force table construction. Idempotent; `add`/`mul`/`inv` call it lazily,
/// so this exists only for callers that want the one-time cost up front.
pub fn init() {
    let _ = tables();
}

#[inline]
pub(crate) fn tables() -> &'static GfTables {
    TABLES.get_or_init(build_tables).as_ref()
}

/// Field addition (and subtraction).
#[inline]
pub fn add(a: u8, b: u8) -> u8 {
    a ^ b
}

/// Field multiplication.
#[inline]
pub fn mul(a: u8, b: u8) -> u8 {
    tables().mul[a as usize][b as usize]
}

/// Multiplicative inverse. `inv(0)` returns 0, which is not an inverse;
/// callers that require a true inverse must not pass zero.
#[inline]
pub fn inv(a: u8) -> u8 {
    tables().inv[a as usize]
}

/// `dst[i] ^= scalar · src[i]` over the overlapping prefix of the two rows.
///
/// A `src` shorter than `dst` behaves as if zero-padded, which is exactly
/// the stripe-padding contract short data shares rely on.
#[inline]
pub fn add_scaled_row(dst: &mut [u8], src: &[u8], scalar: u8) {
    let row = &tables().mul[scalar as usize];
    for (d, &s) in dst.iter_mut().zip(src.iter()) {
        *d ^= row[s as usize];
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pow_log_roundtrip() {
        let t = tables();
        for i in 0..255usize {
            let e = t.pow[i];
            assert_ne!(e, 0, "powers never hit zero");
            assert_eq!(t.log[e as usize] as usize, i);
        }
        assert_eq!(t.log[0], LOG_ZERO);
    }

    #[test]
    fn test_powers_cover_field() {
        let t = tables();
        let mut seen = [false; 256];
        for i in 0..255usize {
            seen[t.pow[i] as usize] = true;
        }
        // Every non-zero element is a power of the generator.
        assert!(seen[1..].iter().all(|&s| s));
        assert!(!seen[0]);
    }

    #[test]
    fn test_field_axioms() {
        let (a, b, c) = (1u8, 37u8, 78u8);
        // Distributivity and associativity on the same probes the original
        // arithmetic was validated with.
        assert_eq!(mul(a, add(b, c)), add(mul(a, b), mul(a, c)));
        assert_eq!(mul(mul(a, b), c), mul(a, mul(b, c)));
        assert_eq!(mul(mul(b, c), b), mul(mul(b, b), c));
        assert_eq!(mul(b, inv(b)), 1);
    }

    #[test]
    fn test_inverses() {
        for x in 1..=255u8 {
            assert_eq!(mul(x, inv(x)), 1, "x = {x}");
        }
        assert_eq!(inv(0), 0);
    }

    #[test]
    fn test_mul_by_zero_and_one() {
        for x in 0..=255u8 {
            assert_eq!(mul(x, 0), 0);
            assert_eq!(mul(0, x), 0);
            assert_eq!(mul(x, 1), x);
            assert_eq!(mul(1, x), x);
        }
    }

    #[test]
    fn test_add_scaled_row() {
        let mut dst = [0x00u8, 0x0f, 0xf0, 0xff];
        let src = [1u8, 2, 3, 4];
        let expect: Vec<u8> = dst
            .iter()
            .zip(src.iter())
            .map(|(&d, &s)| add(d, mul(7, s)))
            .collect();
        add_scaled_row(&mut dst, &src, 7);
        assert_eq!(&dst[..], &expect[..]);
    }

    #[test]
    fn test_add_scaled_row_short_src_is_zero_padded() {
        let mut dst = [9u8, 9, 9, 9];
        add_scaled_row(&mut dst, &[0xaa, 0xbb], 5);
        assert_eq!(dst[2], 9);
        assert_eq!(dst[3], 9);
    }
}
