//! Systematic Reed-Solomon erasure codec over GF(2^8).
//!
//! A codec is the immutable (k, n) parameter pair plus the n×k generator
//! matrix derived from them: identity on the top k rows (data shares pass
//! through unmodified), Vandermonde-derived parity rows below. Encoding is
//! stateless per output index so parity shares can be produced lazily;
//! decoding reconstructs missing data rows in place inside an
//! index-aligned stripe buffer.

use crate::error::FecError;
use crate::gf;
use crate::matrix;

pub struct FecCodec {
    k: usize,
    n: usize,
    /// n×k row-major generator matrix; immutable after construction.
    gen: Vec<u8>,
}

impl FecCodec {
    /// Build a codec for k data shares and n total shares,
    /// 1 ≤ k ≤ n ≤ 256.
    pub fn new(k: usize, n: usize) -> Result<Self, FecError> {
        if k < 1 || k > n || n > 256 {
            return Err(FecError::InvalidParameters { k, n });
        }
        gf::init();

        // k = 1 degenerates the Vandermonde construction; every share is a
        // copy of the single data share, so the generator is a ones column.
        if k == 1 {
            return Ok(Self { k, n, gen: vec![1u8; n] });
        }

        // Vandermonde matrix over n distinct points: row 0 is the powers
        // of zero, row r > 0 the powers of α^(r-1).
        let t = gf::tables();
        let mut tmp = vec![0u8; n * k];
        tmp[0] = 1;
        for row in 1..n {
            for col in 0..k {
                tmp[row * k + col] = t.pow[((row - 1) * col) % 255];
            }
        }

        // Invert the top k×k block and multiply it against the lower band;
        // that normalizes the top block to the identity, making the code
        // systematic while keeping every k-row subset invertible.
        matrix::invert_vandermonde(&mut tmp[..k * k], k)?;
        let parity = matrix::multiply(&tmp[k * k..], &tmp[..k * k], n - k, k, k);

        let mut gen = vec![0u8; n * k];
        for i in 0..k {
            gen[i * k + i] = 1;
        }
        gen[k * k..].copy_from_slice(&parity);

        Ok(Self { k, n, gen })
    }

    pub fn k(&self) -> usize {
        self.k
    }

    pub fn n(&self) -> usize {
        self.n
    }

    /// Produce the share at `index` from the k data rows into `dst`.
    ///
    /// For `index < k` this copies `data[index]` (systematic). For parity
    /// indices it accumulates the generator row against all k data rows.
    /// Data rows shorter than `dst` contribute as if zero-padded; the tail
    /// of `dst` is zero-filled accordingly.
    pub fn encode(&self, data: &[&[u8]], index: usize, dst: &mut [u8]) -> Result<(), FecError> {
        if index >= self.n {
            return Err(FecError::ShareIndexOutOfRange { index, n: self.n });
        }
        if data.len() != self.k {
            return Err(FecError::InvalidParameters { k: self.k, n: self.n });
        }

        if index < self.k {
            let row = data[index];
            let copy = row.len().min(dst.len());
            dst[..copy].copy_from_slice(&row[..copy]);
            dst[copy..].fill(0);
        } else {
            dst.fill(0);
            let coeffs = &self.gen[index * self.k..(index + 1) * self.k];
            for (i, row) in data.iter().enumerate() {
                gf::add_scaled_row(dst, row, coeffs[i]);
            }
        }
        Ok(())
    }

    /// Reconstruct the original k data rows in place.
    ///
    /// `buf` is an index-aligned stripe buffer of at least n×`share_len`
    /// bytes where the share with index j occupies row j; `indices` lists
    /// the k indices actually present. On success the first k rows of
    /// `buf` hold the original data. Rows that arrived as data shares are
    /// never touched; each missing data row is rebuilt from the inverted
    /// decode matrix. `indices` is reordered in the process.
    pub fn decode(
        &self,
        buf: &mut [u8],
        indices: &mut [usize],
        share_len: usize,
    ) -> Result<(), FecError> {
        if indices.len() != self.k {
            return Err(FecError::DecodeFailed("need exactly k shares"));
        }
        if buf.len() < self.n * share_len {
            return Err(FecError::InvalidParameters { k: self.k, n: self.n });
        }
        for &idx in indices.iter() {
            if idx >= self.n {
                return Err(FecError::ShareIndexOutOfRange { index: idx, n: self.n });
            }
        }

        shuffle(indices, self.k)?;

        // Gather the generator rows of the present shares and invert.
        let mut dec = vec![0u8; self.k * self.k];
        for (i, &idx) in indices.iter().enumerate() {
            dec[i * self.k..(i + 1) * self.k]
                .copy_from_slice(&self.gen[idx * self.k..(idx + 1) * self.k]);
        }
        if let Err(e) = matrix::invert(&mut dec, self.k) {
            // Distinct indices into a correct generator matrix always
            // invert; getting here means the codec state is inconsistent.
            tracing::warn!(k = self.k, n = self.n, "decode matrix not invertible");
            return Err(e);
        }

        // After the shuffle, position r holds a parity index exactly where
        // data share r is missing; rebuild those rows from the k present
        // ones. The sources are all distinct from every rebuilt row.
        let mut scratch = vec![0u8; share_len];
        for row in 0..self.k {
            if indices[row] < self.k {
                continue;
            }
            scratch.fill(0);
            for col in 0..self.k {
                let src = indices[col] * share_len;
                gf::add_scaled_row(&mut scratch, &buf[src..src + share_len], dec[row * self.k + col]);
            }
            buf[row * share_len..(row + 1) * share_len].copy_from_slice(&scratch);
        }

        Ok(())
    }
}

/// Settle data shares onto their home positions (`indices[i] == i`),
/// leaving parity shares wherever data is missing. A data index that is
/// already claimed signals a duplicate share.
fn shuffle(indices: &mut [usize], k: usize) -> Result<(), FecError> {
    let mut i = 0;
    while i < k {
        let idx = indices[i];
        if idx >= k || idx == i {
            i += 1;
        } else {
            if indices[idx] == idx {
                return Err(FecError::DecodeFailed("conflicting share placement"));
            }
            indices.swap(i, idx);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    #[test]
    fn test_new_rejects_bad_parameters() {
        assert!(matches!(
            FecCodec::new(0, 4),
            Err(FecError::InvalidParameters { .. })
        ));
        assert!(matches!(
            FecCodec::new(5, 4),
            Err(FecError::InvalidParameters { .. })
        ));
        assert!(matches!(
            FecCodec::new(4, 257),
            Err(FecError::InvalidParameters { .. })
        ));
        assert!(FecCodec::new(1, 1).is_ok());
        assert!(FecCodec::new(256, 256).is_ok());
    }

    #[test]
    fn test_generator_top_block_is_identity() {
        for (k, n) in [(1, 4), (3, 5), (4, 8), (16, 32)] {
            let codec = FecCodec::new(k, n).unwrap();
            for row in 0..k {
                for col in 0..k {
                    let want = u8::from(row == col);
                    assert_eq!(codec.gen[row * k + col], want, "k={k} n={n} [{row},{col}]");
                }
            }
        }
    }

    #[test]
    fn test_encode_systematic_passthrough() {
        let codec = FecCodec::new(3, 6).unwrap();
        let data: [&[u8]; 3] = [&[10, 20], &[30, 40], &[50, 60]];
        let mut out = [0u8; 2];
        for i in 0..3 {
            codec.encode(&data, i, &mut out).unwrap();
            assert_eq!(&out, data[i]);
        }
    }

    #[test]
    fn test_encode_index_out_of_range() {
        let codec = FecCodec::new(2, 4).unwrap();
        let data: [&[u8]; 2] = [&[1], &[2]];
        let mut out = [0u8; 1];
        assert!(matches!(
            codec.encode(&data, 4, &mut out),
            Err(FecError::ShareIndexOutOfRange { .. })
        ));
    }

    /// The reference scenario: k=4, n=8, 4-byte shares, erase half and
    /// recover from indices {3, 5, 1, 0}.
    #[test]
    fn test_decode_reference_scenario() {
        let codec = FecCodec::new(4, 8).unwrap();
        let src: [[u8; 4]; 4] = [[1, 2, 3, 4], [5, 6, 7, 8], [9, 10, 11, 12], [13, 14, 15, 16]];
        let data: Vec<&[u8]> = src.iter().map(|r| &r[..]).collect();

        let mut buf = vec![0u8; 8 * 4];
        for idx in 0..8 {
            let mut out = [0u8; 4];
            codec.encode(&data, idx, &mut out).unwrap();
            buf[idx * 4..(idx + 1) * 4].copy_from_slice(&out);
        }
        // Lose shares 2, 4, 6, 7.
        for gone in [2usize, 4, 6, 7] {
            buf[gone * 4..(gone + 1) * 4].fill(0);
        }

        let mut indices = vec![3usize, 5, 1, 0];
        codec.decode(&mut buf, &mut indices, 4).unwrap();

        for (i, row) in src.iter().enumerate() {
            assert_eq!(&buf[i * 4..(i + 1) * 4], &row[..], "row {i}");
        }
    }

    #[test]
    fn test_decode_random_roundtrips() {
        let mut rng = StdRng::seed_from_u64(7);
        for &(k, n) in &[(2usize, 3usize), (4, 8), (5, 9), (8, 12)] {
            let share_len = 32;
            let codec = FecCodec::new(k, n).unwrap();
            let src: Vec<Vec<u8>> =
                (0..k).map(|_| (0..share_len).map(|_| rng.gen()).collect()).collect();
            let data: Vec<&[u8]> = src.iter().map(|r| r.as_slice()).collect();

            let mut encoded = vec![0u8; n * share_len];
            for idx in 0..n {
                let mut out = vec![0u8; share_len];
                codec.encode(&data, idx, &mut out).unwrap();
                encoded[idx * share_len..(idx + 1) * share_len].copy_from_slice(&out);
            }

            // Keep a random k-subset of the n shares.
            let mut all: Vec<usize> = (0..n).collect();
            for i in (1..all.len()).rev() {
                all.swap(i, rng.gen_range(0..=i));
            }
            let mut kept: Vec<usize> = all[..k].to_vec();

            let mut buf = vec![0u8; n * share_len];
            for &idx in &kept {
                buf[idx * share_len..(idx + 1) * share_len]
                    .copy_from_slice(&encoded[idx * share_len..(idx + 1) * share_len]);
            }

            codec.decode(&mut buf, &mut kept, share_len).unwrap();
            for (i, row) in src.iter().enumerate() {
                assert_eq!(
                    &buf[i * share_len..(i + 1) * share_len],
                    row.as_slice(),
                    "k={k} n={n} row {i}"
                );
            }
        }
    }

    #[test]
    fn test_decode_rejects_wrong_share_count() {
        let codec = FecCodec::new(4, 8).unwrap();
        let mut buf = vec![0u8; 8 * 4];
        let mut indices = vec![0usize, 1, 2];
        assert!(matches!(
            codec.decode(&mut buf, &mut indices, 4),
            Err(FecError::DecodeFailed(_))
        ));
    }

    #[test]
    fn test_decode_rejects_duplicate_data_index() {
        let codec = FecCodec::new(3, 6).unwrap();
        let mut buf = vec![0u8; 6 * 4];
        let mut indices = vec![1usize, 1, 2];
        assert!(matches!(
            codec.decode(&mut buf, &mut indices, 4),
            Err(FecError::DecodeFailed(_))
        ));
    }

    #[test]
    fn test_decode_with_all_data_present_is_noop() {
        let codec = FecCodec::new(3, 5).unwrap();
        let mut buf = vec![0u8; 5 * 2];
        for (i, b) in buf.iter_mut().enumerate() {
            *b = i as u8;
        }
        let orig = buf.clone();
        let mut indices = vec![0usize, 1, 2];
        codec.decode(&mut buf, &mut indices, 2).unwrap();
        assert_eq!(buf, orig);
    }

    #[test]
    fn test_k1_codec_replicates() {
        let codec = FecCodec::new(1, 3).unwrap();
        let data: [&[u8]; 1] = [&[42, 43]];
        let mut out = [0u8; 2];
        for idx in 0..3 {
            codec.encode(&data, idx, &mut out).unwrap();
            assert_eq!(out, [42, 43]);
        }

        // Any single share recovers the data.
        let mut buf = vec![0u8; 3 * 2];
        buf[4..6].copy_from_slice(&[42, 43]);
        let mut indices = vec![2usize];
        codec.decode(&mut buf, &mut indices, 2).unwrap();
        assert_eq!(&buf[0..2], &[42, 43]);
    }
}
