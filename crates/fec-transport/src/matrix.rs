//! Matrix algebra over GF(2^8).
//!
//! Matrices are row-major `u8` slices with explicit dimensions. The two
//! inversion routines back the codec: general Gauss-Jordan with full
//! pivoting for the decode matrix, and the direct Vandermonde inverse
//! (polynomial coefficients + synthetic division) used once at generator
//! construction — exact in a finite field and cheaper than elimination.

use crate::error::FecError;
use crate::gf;

/// `a (n×k) · b (k×m) -> n×m`.
pub fn multiply(a: &[u8], b: &[u8], n: usize, k: usize, m: usize) -> Vec<u8> {
    debug_assert_eq!(a.len(), n * k);
    debug_assert_eq!(b.len(), k * m);

    let mut c = vec![0u8; n * m];
    for row in 0..n {
        for col in 0..m {
            let mut acc = 0u8;
            for i in 0..k {
                acc = gf::add(acc, gf::mul(a[row * k + i], b[i * m + col]));
            }
            c[row * m + col] = acc;
        }
    }
    c
}

/// Invert the k×k matrix `a` in place by Gauss-Jordan elimination with
/// full pivoting.
///
/// Pivot search tries the diagonal first, then the whole matrix, skipping
/// rows already used; a pivot count above one during the search means the
/// matrix is singular. Rows are swapped to bring each pivot onto the
/// diagonal and un-scrambled at the end from the recorded permutation.
pub fn invert(a: &mut [u8], k: usize) -> Result<(), FecError> {
    debug_assert_eq!(a.len(), k * k);

    // Pivot bookkeeping: row/column of each pivot, and per-column use counts.
    let mut indxr = vec![0usize; k];
    let mut indxc = vec![0usize; k];
    let mut ipiv = vec![0u8; k];

    // Compared against the pivot row to skip elimination when the row is
    // already an identity row.
    let mut id_row = vec![0u8; k];
    let mut pivot_row = vec![0u8; k];

    for col in 0..k {
        let mut found: Option<(usize, usize)> = None;

        if ipiv[col] != 1 && a[col * k + col] != 0 {
            found = Some((col, col));
        } else {
            'search: for row in 0..k {
                if ipiv[row] == 1 {
                    continue;
                }
                for i in 0..k {
                    match ipiv[i] {
                        0 => {
                            if a[row * k + i] != 0 {
                                found = Some((row, i));
                                break 'search;
                            }
                        }
                        1 => {}
                        _ => return Err(FecError::SingularMatrix),
                    }
                }
            }
        }

        let (irow, icol) = found.ok_or(FecError::SingularMatrix)?;
        ipiv[icol] += 1;

        if irow != icol {
            for i in 0..k {
                a.swap(irow * k + i, icol * k + i);
            }
        }
        indxr[col] = irow;
        indxc[col] = icol;

        let c = a[icol * k + icol];
        if c == 0 {
            return Err(FecError::SingularMatrix);
        }
        if c != 1 {
            let cinv = gf::inv(c);
            a[icol * k + icol] = 1;
            for i in 0..k {
                a[icol * k + i] = gf::mul(cinv, a[icol * k + i]);
            }
        }

        id_row[icol] = 1;
        if a[icol * k..icol * k + k] != id_row[..] {
            pivot_row.copy_from_slice(&a[icol * k..icol * k + k]);
            for i in 0..k {
                if i == icol {
                    continue;
                }
                let row = &mut a[i * k..i * k + k];
                let f = row[icol];
                row[icol] = 0;
                gf::add_scaled_row(row, &pivot_row, f);
            }
        }
        id_row[icol] = 0;
    }

    // Undo the row swaps by swapping the corresponding columns, last first.
    for col in (0..k).rev() {
        if indxr[col] != indxc[col] {
            for row in 0..k {
                a.swap(row * k + indxr[col], row * k + indxc[col]);
            }
        }
    }

    Ok(())
}

/// Invert the k×k Vandermonde matrix `a` in place.
///
/// Row i of `a` must be `[1, x_i, x_i², …]` with distinct x_i. The inverse
/// follows from the coefficients of P(x) = ∏(x − x_i): synthetic division
/// of P by (x − x_i) yields column i up to the scale factor P'(x_i).
pub fn invert_vandermonde(a: &mut [u8], k: usize) -> Result<(), FecError> {
    debug_assert_eq!(a.len(), k * k);

    if k == 1 {
        return Err(FecError::DegenerateMatrix);
    }

    // x-coordinates sit in the second column.
    let mut p = vec![0u8; k];
    for (i, x) in p.iter_mut().enumerate() {
        *x = a[i * k + 1];
    }

    // Coefficients of P(x); c[k] = 1 is implicit. Each step multiplies the
    // running product by (x − x_i) — in characteristic 2, x_i = −x_i.
    let mut c = vec![0u8; k];
    c[k - 1] = p[0];
    for i in 1..k {
        let pi = p[i];
        for j in (k - 1 - i)..(k - 1) {
            c[j] = gf::add(c[j], gf::mul(pi, c[j + 1]));
        }
        c[k - 1] = gf::add(c[k - 1], pi);
    }

    let mut b = vec![0u8; k];
    for row in 0..k {
        let x = p[row];
        let mut t = 1u8;
        b[k - 1] = 1;
        for i in (0..k - 1).rev() {
            b[i] = gf::add(c[i + 1], gf::mul(x, b[i + 1]));
            t = gf::add(gf::mul(x, t), b[i]);
        }
        // t = ∏_{j≠row}(x_row − x_j), non-zero while the x_i are distinct.
        let tinv = gf::inv(t);
        for col in 0..k {
            a[col * k + row] = gf::mul(tinv, b[col]);
        }
    }

    Ok(())
}
