use ndarray::{Array1, Array2};
use thiserror::Error;

use crate::model::design::Design;
use crate::model::linalg::{
    chol_inverse, chol_log_det, chol_solve, cholesky, solve_lower, solve_lower_matrix,
};
use crate::model::optim::NelderMead;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error(
        "model fit did not converge after {iterations} iterations \
         (best REML deviance {deviance:.6}, simplex spread {spread:.3e})"
    )]
    NonConvergence {
        iterations: usize,
        deviance: f64,
        spread: f64,
    },
    #[error("singular model: {0}")]
    Singular(String),
    #[error("degenerate model input: {0}")]
    Degenerate(String),
}

#[derive(Debug, Clone)]
pub struct VarianceComponents {
    pub residual_sd: f64,
    pub intercept_sd: f64,
    pub slope_sd: Option<f64>,
    pub intercept_slope_corr: Option<f64>,
}

/// REML fit of the mixed model. Exposes the fixed-effect estimates and their
/// covariance for the contrast stage; not persisted anywhere.
#[derive(Debug, Clone)]
pub struct FittedModel {
    pub beta: Array1<f64>,
    /// sigma2 * (Xᵀ V⁻¹ X)⁻¹.
    pub beta_cov: Array2<f64>,
    pub sigma2: f64,
    /// Relative covariance factor parameters at the optimum.
    pub theta: Vec<f64>,
    pub reml_deviance: f64,
    pub iterations: usize,
    pub variance: VarianceComponents,
    pub n_observations: usize,
    pub n_subjects: usize,
}

struct Profiled {
    beta: Array1<f64>,
    xtvx_chol: Array2<f64>,
    sigma2: f64,
    deviance: f64,
}

/// Fit by profiled REML: the residual variance and fixed effects are profiled
/// out analytically, and the deviance is minimized over the relative
/// covariance factor Λ of the per-subject random effects (intercept + visit
/// slope, intercept only when a single post-baseline visit exists).
pub fn fit_reml(design: &Design) -> Result<FittedModel, ModelError> {
    let n = design.n_observations();
    let p = design.n_fixed_effects();
    if n <= p {
        return Err(ModelError::Degenerate(format!(
            "{n} observations cannot identify {p} fixed effects"
        )));
    }

    let groups = group_rows(design);
    let start: Vec<f64> = if design.with_slope {
        vec![1.0, 0.0, 1.0]
    } else {
        vec![1.0]
    };

    // Surface a structural failure (rank-deficient X) before optimizing;
    // inside the loop it only degrades to an infinite objective.
    profile(design, &groups, &start)?;

    let optimizer = NelderMead::default();
    let mut objective = |theta: &[f64]| -> f64 {
        match profile(design, &groups, theta) {
            Ok(profiled) => profiled.deviance,
            Err(_) => f64::INFINITY,
        }
    };
    let minimum = optimizer.minimize(&mut objective, &start);
    if !minimum.converged {
        return Err(ModelError::NonConvergence {
            iterations: minimum.iterations,
            deviance: minimum.value,
            spread: minimum.spread,
        });
    }

    let profiled = profile(design, &groups, &minimum.point)?;
    let beta_cov = chol_inverse(&profiled.xtvx_chol).mapv(|v| v * profiled.sigma2);
    let variance = variance_components(&minimum.point, profiled.sigma2, design.with_slope);

    tracing::info!(
        iterations = minimum.iterations,
        deviance = profiled.deviance,
        residual_sd = variance.residual_sd,
        intercept_sd = variance.intercept_sd,
        "REML fit converged"
    );

    Ok(FittedModel {
        beta: profiled.beta,
        beta_cov,
        sigma2: profiled.sigma2,
        theta: minimum.point,
        reml_deviance: profiled.deviance,
        iterations: minimum.iterations,
        variance,
        n_observations: n,
        n_subjects: design.n_subjects(),
    })
}

fn group_rows(design: &Design) -> Vec<Vec<usize>> {
    let mut groups = vec![Vec::new(); design.n_subjects()];
    for (row, &subject) in design.subject_index.iter().enumerate() {
        groups[subject].push(row);
    }
    groups
}

/// REML deviance and profiled estimates at a given relative covariance
/// factor. V₀ᵢ = I + Zᵢ Λ Λᵀ Zᵢᵀ per subject; β by generalized least squares;
/// σ² = rᵀV₀⁻¹r / (n − p).
fn profile(design: &Design, groups: &[Vec<usize>], theta: &[f64]) -> Result<Profiled, ModelError> {
    let n = design.n_observations();
    let p = design.n_fixed_effects();
    let q = if design.with_slope { 2 } else { 1 };

    let mut lambda = Array2::<f64>::zeros((q, q));
    lambda[[0, 0]] = theta[0];
    if design.with_slope {
        lambda[[1, 0]] = theta[1];
        lambda[[1, 1]] = theta[2];
    }

    let mut xtvx = Array2::<f64>::zeros((p, p));
    let mut xtvy = Array1::<f64>::zeros(p);
    let mut ytvy = 0.0;
    let mut logdet_v = 0.0;

    for rows in groups {
        if rows.is_empty() {
            continue;
        }
        let ni = rows.len();

        let mut z = Array2::<f64>::zeros((ni, q));
        for (i, &row) in rows.iter().enumerate() {
            z[[i, 0]] = 1.0;
            if design.with_slope {
                z[[i, 1]] = design.slope_covariate[row];
            }
        }
        let a = z.dot(&lambda);

        let mut v0 = a.dot(&a.t());
        for i in 0..ni {
            v0[[i, i]] += 1.0;
        }
        let l = cholesky(&v0).ok_or_else(|| {
            ModelError::Singular("subject covariance block is not positive definite".to_string())
        })?;
        logdet_v += chol_log_det(&l);

        let mut xi = Array2::<f64>::zeros((ni, p));
        let mut yi = Array1::<f64>::zeros(ni);
        for (i, &row) in rows.iter().enumerate() {
            for j in 0..p {
                xi[[i, j]] = design.x[[row, j]];
            }
            yi[i] = design.y[row];
        }

        let xw = solve_lower_matrix(&l, &xi);
        let yw = solve_lower(&l, &yi);

        xtvx = xtvx + xw.t().dot(&xw);
        xtvy = xtvy + xw.t().dot(&yw);
        ytvy += yw.dot(&yw);
    }

    let xtvx_chol = cholesky(&xtvx).ok_or_else(|| {
        ModelError::Singular(
            "normal equations are rank deficient (collinear fixed effects)".to_string(),
        )
    })?;
    let beta = chol_solve(&xtvx_chol, &xtvy);

    let rss = (ytvy - beta.dot(&xtvy)).max(f64::EPSILON * ytvy.abs().max(1.0));
    let dof = (n - p) as f64;
    let sigma2 = rss / dof;
    let deviance = logdet_v
        + chol_log_det(&xtvx_chol)
        + dof * (1.0 + (2.0 * std::f64::consts::PI * sigma2).ln());

    Ok(Profiled {
        beta,
        xtvx_chol,
        sigma2,
        deviance,
    })
}

fn variance_components(theta: &[f64], sigma2: f64, with_slope: bool) -> VarianceComponents {
    let residual_sd = sigma2.sqrt();
    if !with_slope {
        return VarianceComponents {
            residual_sd,
            intercept_sd: (sigma2 * theta[0] * theta[0]).sqrt(),
            slope_sd: None,
            intercept_slope_corr: None,
        };
    }

    // G = sigma2 * Λ Λᵀ for Λ = [[t0, 0], [t1, t2]].
    let g00 = sigma2 * theta[0] * theta[0];
    let g10 = sigma2 * theta[0] * theta[1];
    let g11 = sigma2 * (theta[1] * theta[1] + theta[2] * theta[2]);
    let intercept_sd = g00.sqrt();
    let slope_sd = g11.sqrt();
    let denom = intercept_sd * slope_sd;
    let corr = if denom > f64::EPSILON {
        Some(g10 / denom)
    } else {
        None
    };
    VarianceComponents {
        residual_sd,
        intercept_sd,
        slope_sd: Some(slope_sd),
        intercept_slope_corr: corr,
    }
}

#[cfg(test)]
#[path = "../../tests/src_inline/model/lmm.rs"]
mod tests;
