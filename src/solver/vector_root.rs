//! Vector root finding
//!
//! Multivariate Newton iteration for square systems F(x) = 0. The
//! Jacobian is estimated by forward finite differences, one evaluation
//! per dimension, and each Newton step solves J d = -F via Gaussian
//! elimination with partial pivoting. When the elimination hits a
//! degenerate pivot the solver retries the step as damped least squares
//! (JᵀJ + λI) d = -JᵀF before giving up with `SingularDerivative`.

use super::decision::{FailureReason, SolverDecision};

/// Solves a vector equation F(x) = 0 for a vector x.
#[derive(Debug, Clone, Copy)]
pub struct VectorRootSolver {
    /// Convergence tolerance on ‖F(x)‖ and on ‖Δx‖
    pub tolerance: f64,
    /// Iteration budget
    pub max_iterations: u32,
    /// Step size for the forward-difference Jacobian
    pub fd_step: f64,
    /// Pivots below this magnitude are treated as degenerate
    pub pivot_epsilon: f64,
    /// Levenberg damping used by the least-squares fallback
    pub damping: f64,
    /// Residual growth beyond this factor over its starting magnitude is
    /// declared divergence
    pub divergence_factor: f64,
}

impl Default for VectorRootSolver {
    fn default() -> Self {
        Self {
            tolerance: 1e-6,
            max_iterations: 30,
            fd_step: 1e-6,
            pivot_epsilon: 1e-12,
            damping: 1e-8,
            divergence_factor: 1e6,
        }
    }
}

impl VectorRootSolver {
    /// Newton iteration from an initial guess.
    ///
    /// The system must be square: `f` must return one residual component
    /// per unknown.
    pub fn solve(
        &self,
        f: impl Fn(&[f64]) -> Vec<f64>,
        initial_guess: &[f64],
    ) -> SolverDecision<Vec<f64>> {
        let n = initial_guess.len();
        let mut x = initial_guess.to_vec();
        let mut residual = f(&x);
        debug_assert_eq!(residual.len(), n, "residual dimension must match unknowns");

        let mut norm = l2_norm(&residual);
        let initial_magnitude = norm.max(1.0);

        for iteration in 0..self.max_iterations {
            if norm < self.tolerance {
                return SolverDecision::converged(x, iteration, norm);
            }

            let jacobian = self.estimate_jacobian(&f, &x, &residual);

            let step = match solve_linear(&jacobian, &negated(&residual), self.pivot_epsilon) {
                Some(step) => step,
                None => {
                    // Ill-conditioned Jacobian: damped least-squares retry.
                    match self.damped_least_squares(&jacobian, &residual) {
                        Some(step) => step,
                        None => {
                            return SolverDecision::failed(
                                x,
                                iteration,
                                norm,
                                FailureReason::SingularDerivative,
                            );
                        }
                    }
                }
            };

            for i in 0..n {
                x[i] += step[i];
            }
            residual = f(&x);
            let next_norm = l2_norm(&residual);

            if !next_norm.is_finite()
                || x.iter().any(|v| !v.is_finite())
                || next_norm > initial_magnitude * self.divergence_factor
            {
                return SolverDecision::failed(
                    x,
                    iteration + 1,
                    norm,
                    FailureReason::DivergedResidual,
                );
            }
            norm = next_norm;

            if l2_norm(&step) < self.tolerance {
                return if norm < self.tolerance {
                    SolverDecision::converged(x, iteration + 1, norm)
                } else {
                    // The step stalled without reaching the residual
                    // tolerance; a stalled Newton direction means the
                    // linearization stopped making progress.
                    SolverDecision::failed(
                        x,
                        iteration + 1,
                        norm,
                        FailureReason::SingularDerivative,
                    )
                };
            }
        }

        if norm < self.tolerance {
            SolverDecision::converged(x, self.max_iterations, norm)
        } else {
            SolverDecision::failed(
                x,
                self.max_iterations,
                norm,
                FailureReason::MaxIterationsExceeded,
            )
        }
    }

    /// Forward-difference Jacobian: column j is (F(x + h e_j) - F(x)) / h.
    fn estimate_jacobian(
        &self,
        f: &impl Fn(&[f64]) -> Vec<f64>,
        x: &[f64],
        residual: &[f64],
    ) -> Vec<Vec<f64>> {
        let n = x.len();
        let h = self.fd_step;
        let mut jacobian = vec![vec![0.0; n]; n];
        let mut probe = x.to_vec();
        for j in 0..n {
            let saved = probe[j];
            probe[j] = saved + h;
            let shifted = f(&probe);
            probe[j] = saved;
            for i in 0..n {
                jacobian[i][j] = (shifted[i] - residual[i]) / h;
            }
        }
        jacobian
    }

    /// Solves (JᵀJ + λI) d = -JᵀF. Returns `None` when even the damped
    /// normal equations are degenerate.
    fn damped_least_squares(&self, jacobian: &[Vec<f64>], residual: &[f64]) -> Option<Vec<f64>> {
        let n = residual.len();
        let mut normal = vec![vec![0.0; n]; n];
        let mut rhs = vec![0.0; n];
        for i in 0..n {
            for j in 0..n {
                let mut sum = 0.0;
                for k in 0..n {
                    sum += jacobian[k][i] * jacobian[k][j];
                }
                normal[i][j] = sum;
            }
            normal[i][i] += self.damping;
            let mut b = 0.0;
            for k in 0..n {
                b -= jacobian[k][i] * residual[k];
            }
            rhs[i] = b;
        }
        solve_linear(&normal, &rhs, self.pivot_epsilon)
    }
}

fn l2_norm(v: &[f64]) -> f64 {
    v.iter().map(|c| c * c).sum::<f64>().sqrt()
}

fn negated(v: &[f64]) -> Vec<f64> {
    v.iter().map(|c| -c).collect()
}

/// Gaussian elimination with partial pivoting on a dense square system.
/// Returns `None` when the best available pivot falls below `epsilon`.
fn solve_linear(matrix: &[Vec<f64>], rhs: &[f64], epsilon: f64) -> Option<Vec<f64>> {
    let n = rhs.len();
    let mut a: Vec<Vec<f64>> = matrix.to_vec();
    let mut b: Vec<f64> = rhs.to_vec();

    for col in 0..n {
        // Partial pivot: largest magnitude in this column.
        let mut pivot_row = col;
        let mut pivot_value = a[col][col].abs();
        for row in (col + 1)..n {
            if a[row][col].abs() > pivot_value {
                pivot_value = a[row][col].abs();
                pivot_row = row;
            }
        }
        if pivot_value < epsilon || !pivot_value.is_finite() {
            return None;
        }
        if pivot_row != col {
            a.swap(col, pivot_row);
            b.swap(col, pivot_row);
        }

        for row in (col + 1)..n {
            let factor = a[row][col] / a[col][col];
            if factor == 0.0 {
                continue;
            }
            for k in col..n {
                a[row][k] -= factor * a[col][k];
            }
            b[row] -= factor * b[col];
        }
    }

    // Back substitution.
    let mut x = vec![0.0; n];
    for row in (0..n).rev() {
        let mut sum = b[row];
        for k in (row + 1)..n {
            sum -= a[row][k] * x[k];
        }
        x[row] = sum / a[row][row];
    }
    Some(x)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_system_solves_in_one_step() {
        let solver = VectorRootSolver::default();
        // F(x) = A x - b with A = [[2, 0], [0, 3]], b = [4, 9].
        let decision = solver.solve(
            |x| vec![2.0 * x[0] - 4.0, 3.0 * x[1] - 9.0],
            &[0.0, 0.0],
        );
        assert!(decision.success);
        assert!((decision.value[0] - 2.0).abs() < 1e-5);
        assert!((decision.value[1] - 3.0).abs() < 1e-5);
        assert!(decision.iterations <= 3);
    }

    #[test]
    fn test_nonlinear_system_converges() {
        let solver = VectorRootSolver::default();
        // Intersection of the unit circle with the line y = x, upper branch.
        let decision = solver.solve(
            |x| vec![x[0] * x[0] + x[1] * x[1] - 1.0, x[1] - x[0]],
            &[0.8, 0.6],
        );
        assert!(decision.success);
        let expected = std::f64::consts::FRAC_1_SQRT_2;
        assert!((decision.value[0] - expected).abs() < 1e-5);
        assert!((decision.value[1] - expected).abs() < 1e-5);
    }

    #[test]
    fn test_singular_jacobian_reported() {
        let solver = VectorRootSolver {
            damping: 0.0,
            ..Default::default()
        };
        // Both residual components depend on the same combination, so the
        // Jacobian is rank one everywhere and the system has no isolated
        // root.
        let decision = solver.solve(
            |x| vec![x[0] + x[1] - 1.0, 2.0 * (x[0] + x[1]) - 5.0],
            &[0.0, 0.0],
        );
        assert!(!decision.success);
        assert_eq!(decision.reason, Some(FailureReason::SingularDerivative));
    }

    #[test]
    fn test_gaussian_elimination_with_pivoting() {
        // Leading zero forces a row swap.
        let a = vec![vec![0.0, 2.0], vec![1.0, 1.0]];
        let x = solve_linear(&a, &[4.0, 3.0], 1e-12).unwrap();
        assert!((x[0] - 1.0).abs() < 1e-12);
        assert!((x[1] - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_singular_matrix_returns_none() {
        let a = vec![vec![1.0, 2.0], vec![2.0, 4.0]];
        assert!(solve_linear(&a, &[1.0, 2.0], 1e-12).is_none());
    }

    #[test]
    fn test_no_root_exhausts_iterations() {
        let solver = VectorRootSolver::default();
        // ‖F‖ is bounded below by 1; no root exists.
        let decision = solver.solve(|x| vec![x[0] * x[0] + 1.0], &[0.5]);
        assert!(!decision.success);
        assert_ne!(decision.reason, None);
    }
}
