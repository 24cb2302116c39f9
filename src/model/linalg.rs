use ndarray::{Array1, Array2};

/// Lower-triangular Cholesky factor of a symmetric positive definite matrix.
/// Returns None when the matrix is not positive definite.
pub fn cholesky(a: &Array2<f64>) -> Option<Array2<f64>> {
    let n = a.nrows();
    debug_assert_eq!(n, a.ncols());
    let mut l = Array2::<f64>::zeros((n, n));
    for i in 0..n {
        for j in 0..=i {
            let mut sum = a[[i, j]];
            for k in 0..j {
                sum -= l[[i, k]] * l[[j, k]];
            }
            if i == j {
                if sum <= 0.0 || !sum.is_finite() {
                    return None;
                }
                l[[i, j]] = sum.sqrt();
            } else {
                l[[i, j]] = sum / l[[j, j]];
            }
        }
    }
    Some(l)
}

/// Solve L x = b with L lower-triangular.
pub fn solve_lower(l: &Array2<f64>, b: &Array1<f64>) -> Array1<f64> {
    let n = l.nrows();
    let mut x = b.clone();
    for i in 0..n {
        for k in 0..i {
            let t = x[k];
            x[i] -= l[[i, k]] * t;
        }
        x[i] /= l[[i, i]];
    }
    x
}

/// Solve Lᵀ x = b with L lower-triangular.
pub fn solve_lower_transpose(l: &Array2<f64>, b: &Array1<f64>) -> Array1<f64> {
    let n = l.nrows();
    let mut x = b.clone();
    for i in (0..n).rev() {
        for k in (i + 1)..n {
            let t = x[k];
            x[i] -= l[[k, i]] * t;
        }
        x[i] /= l[[i, i]];
    }
    x
}

/// Solve A x = b given the lower Cholesky factor of A.
pub fn chol_solve(l: &Array2<f64>, b: &Array1<f64>) -> Array1<f64> {
    let y = solve_lower(l, b);
    solve_lower_transpose(l, &y)
}

/// L⁻¹ B for a matrix right-hand side, column by column.
pub fn solve_lower_matrix(l: &Array2<f64>, b: &Array2<f64>) -> Array2<f64> {
    let mut out = Array2::<f64>::zeros(b.raw_dim());
    for j in 0..b.ncols() {
        let col = b.column(j).to_owned();
        let solved = solve_lower(l, &col);
        out.column_mut(j).assign(&solved);
    }
    out
}

/// A⁻¹ from the lower Cholesky factor of A.
pub fn chol_inverse(l: &Array2<f64>) -> Array2<f64> {
    let n = l.nrows();
    let mut inv = Array2::<f64>::zeros((n, n));
    for j in 0..n {
        let mut e = Array1::<f64>::zeros(n);
        e[j] = 1.0;
        let col = chol_solve(l, &e);
        inv.column_mut(j).assign(&col);
    }
    inv
}

/// log det A from the lower Cholesky factor of A.
pub fn chol_log_det(l: &Array2<f64>) -> f64 {
    let mut sum = 0.0;
    for i in 0..l.nrows() {
        sum += l[[i, i]].ln();
    }
    2.0 * sum
}

#[cfg(test)]
#[path = "../../tests/src_inline/model/linalg.rs"]
mod tests;
