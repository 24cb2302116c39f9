use super::*;

use ndarray::array;

fn assert_close(a: f64, b: f64, tol: f64) {
    assert!((a - b).abs() <= tol, "{a} vs {b}");
}

#[test]
fn test_cholesky_known_factor() {
    // A = L Lᵀ for L = [[2,0],[1,3]].
    let a = array![[4.0, 2.0], [2.0, 10.0]];
    let l = cholesky(&a).unwrap();
    assert_close(l[[0, 0]], 2.0, 1e-12);
    assert_close(l[[1, 0]], 1.0, 1e-12);
    assert_close(l[[1, 1]], 3.0, 1e-12);
    assert_close(l[[0, 1]], 0.0, 0.0);
}

#[test]
fn test_cholesky_rejects_indefinite() {
    let a = array![[1.0, 2.0], [2.0, 1.0]];
    assert!(cholesky(&a).is_none());
}

#[test]
fn test_chol_solve_round_trip() {
    let a = array![[4.0, 2.0, 0.0], [2.0, 10.0, 1.0], [0.0, 1.0, 6.0]];
    let x_true = array![1.0, -2.0, 0.5];
    let b = a.dot(&x_true);
    let l = cholesky(&a).unwrap();
    let x = chol_solve(&l, &b);
    for i in 0..3 {
        assert_close(x[i], x_true[i], 1e-10);
    }
}

#[test]
fn test_chol_inverse_identity() {
    let a = array![[4.0, 2.0], [2.0, 10.0]];
    let l = cholesky(&a).unwrap();
    let inv = chol_inverse(&l);
    let eye = a.dot(&inv);
    assert_close(eye[[0, 0]], 1.0, 1e-12);
    assert_close(eye[[1, 1]], 1.0, 1e-12);
    assert_close(eye[[0, 1]], 0.0, 1e-12);
    assert_close(eye[[1, 0]], 0.0, 1e-12);
}

#[test]
fn test_chol_log_det() {
    // det = 4*10 - 2*2 = 36.
    let a = array![[4.0, 2.0], [2.0, 10.0]];
    let l = cholesky(&a).unwrap();
    assert_close(chol_log_det(&l), 36.0f64.ln(), 1e-12);
}

#[test]
fn test_solve_lower_matrix_columns() {
    let a = array![[4.0, 2.0], [2.0, 10.0]];
    let l = cholesky(&a).unwrap();
    let b = array![[1.0, 0.0], [0.0, 1.0]];
    let solved = solve_lower_matrix(&l, &b);
    for j in 0..2 {
        let col = b.column(j).to_owned();
        let expected = solve_lower(&l, &col);
        for i in 0..2 {
            assert_close(solved[[i, j]], expected[i], 1e-12);
        }
    }
}
