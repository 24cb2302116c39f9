/// Derivative-free Nelder-Mead simplex minimizer. Deterministic: the simplex
/// is seeded from the start point with fixed axis steps and no randomness.
#[derive(Debug, Clone)]
pub struct NelderMead {
    pub max_iterations: usize,
    pub tolerance: f64,
    pub initial_step: f64,
}

impl Default for NelderMead {
    fn default() -> Self {
        Self {
            max_iterations: 1000,
            tolerance: 1e-9,
            initial_step: 0.5,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Minimum {
    pub point: Vec<f64>,
    pub value: f64,
    pub iterations: usize,
    pub converged: bool,
    /// Objective spread across the final simplex.
    pub spread: f64,
}

impl NelderMead {
    pub fn minimize(&self, f: &mut dyn FnMut(&[f64]) -> f64, start: &[f64]) -> Minimum {
        let dim = start.len();
        let mut simplex: Vec<Vec<f64>> = Vec::with_capacity(dim + 1);
        simplex.push(start.to_vec());
        for i in 0..dim {
            let mut point = start.to_vec();
            point[i] += self.initial_step;
            simplex.push(point);
        }
        let mut values: Vec<f64> = simplex.iter().map(|p| f(p)).collect();

        let mut iterations = 0usize;
        let mut spread = f64::INFINITY;
        let mut converged = false;

        while iterations < self.max_iterations {
            iterations += 1;

            let mut order: Vec<usize> = (0..simplex.len()).collect();
            order.sort_by(|&a, &b| {
                values[a]
                    .partial_cmp(&values[b])
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
            simplex = order.iter().map(|&i| simplex[i].clone()).collect();
            values = order.iter().map(|&i| values[i]).collect();

            let best = values[0];
            let worst = values[dim];
            spread = worst - best;
            if spread.abs() <= self.tolerance * (1.0 + best.abs()) {
                converged = true;
                break;
            }

            let mut centroid = vec![0.0; dim];
            for point in simplex.iter().take(dim) {
                for (c, &v) in centroid.iter_mut().zip(point.iter()) {
                    *c += v;
                }
            }
            for c in centroid.iter_mut() {
                *c /= dim as f64;
            }

            let reflected = blend(&centroid, &simplex[dim], 2.0, -1.0);
            let f_reflected = f(&reflected);

            if f_reflected < values[0] {
                let expanded = blend(&centroid, &simplex[dim], 3.0, -2.0);
                let f_expanded = f(&expanded);
                if f_expanded < f_reflected {
                    simplex[dim] = expanded;
                    values[dim] = f_expanded;
                } else {
                    simplex[dim] = reflected;
                    values[dim] = f_reflected;
                }
                continue;
            }

            if f_reflected < values[dim - 1] {
                simplex[dim] = reflected;
                values[dim] = f_reflected;
                continue;
            }

            let contracted = if f_reflected < values[dim] {
                blend(&centroid, &reflected, 0.5, 0.5)
            } else {
                blend(&centroid, &simplex[dim], 0.5, 0.5)
            };
            let f_contracted = f(&contracted);
            if f_contracted < values[dim].min(f_reflected) {
                simplex[dim] = contracted;
                values[dim] = f_contracted;
                continue;
            }

            // Shrink toward the best vertex.
            for i in 1..=dim {
                simplex[i] = blend(&simplex[0], &simplex[i], 0.5, 0.5);
                values[i] = f(&simplex[i]);
            }
        }

        Minimum {
            point: simplex[0].clone(),
            value: values[0],
            iterations,
            converged,
            spread,
        }
    }
}

fn blend(a: &[f64], b: &[f64], wa: f64, wb: f64) -> Vec<f64> {
    a.iter().zip(b.iter()).map(|(&x, &y)| wa * x + wb * y).collect()
}

#[cfg(test)]
#[path = "../../tests/src_inline/model/optim.rs"]
mod tests;
