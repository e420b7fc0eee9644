//! One-class SVM outlier scoring
//!
//! Solves the nu-parameterised one-class dual
//!
//! ```text
//! min 1/2 a'Qa   s.t.  0 <= a_i <= 1,  sum(a) = nu * l
//! ```
//!
//! with sequential minimal optimisation using maximal-violating-pair
//! selection. The decision value of a training point is
//! `sum_j a_j K(x_j, x_i) - rho`; negative values are outliers. Roughly a
//! `nu` fraction of the sample ends up outside the boundary.
//!
//! The Gram matrix is held densely, so memory grows with the square of the
//! series length; `max_samples` bounds it.

use crate::kernel::{Gamma, RbfKernel};
use anomaly_core::{Error, PointScorer, PointScores, Result, ScorerProperties, TimeSeries};
use tracing::{debug, warn};

/// One-class SVM parameters
#[derive(Debug, Clone, PartialEq)]
pub struct OneClassSvmParameters {
    /// Upper bound on the outlier fraction and lower bound on the support
    /// vector fraction, in `(0, 1]`
    pub nu: f64,
    pub gamma: Gamma,
    /// Stopping tolerance on the maximal KKT violation
    pub tolerance: f64,
    pub max_iterations: usize,
    /// Largest series accepted
    pub max_samples: usize,
}

impl Default for OneClassSvmParameters {
    fn default() -> Self {
        Self {
            nu: 0.01,
            gamma: Gamma::Scale,
            tolerance: 1e-3,
            max_iterations: 100_000,
            max_samples: 4_000,
        }
    }
}

impl OneClassSvmParameters {
    pub fn validate(&self) -> Result<()> {
        if !(self.nu > 0.0 && self.nu <= 1.0) {
            return Err(Error::invalid_fraction("nu", self.nu));
        }
        if let Gamma::Value(g) = self.gamma {
            if !(g > 0.0 && g.is_finite()) {
                return Err(Error::InvalidParameter(format!(
                    "gamma = {g} must be positive"
                )));
            }
        }
        if !(self.tolerance > 0.0) {
            return Err(Error::InvalidParameter(
                "tolerance must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Dual solution: coefficients and offset
#[derive(Debug, Clone)]
struct DualSolution {
    /// `Q a` for every training point
    gradient: Vec<f64>,
    rho: f64,
    iterations: usize,
}

fn solve_dual(q: &[f64], n: usize, params: &OneClassSvmParameters) -> DualSolution {
    let total = params.nu * n as f64;
    let whole = (total.floor() as usize).min(n);
    let mut alpha = vec![0.0; n];
    for a in alpha.iter_mut().take(whole) {
        *a = 1.0;
    }
    if whole < n {
        alpha[whole] = total - whole as f64;
    }

    let mut gradient = vec![0.0; n];
    for (j, &a) in alpha.iter().enumerate() {
        if a != 0.0 {
            for (i, g) in gradient.iter_mut().enumerate() {
                *g += a * q[i * n + j];
            }
        }
    }

    let mut iterations = 0;
    while iterations < params.max_iterations {
        // i may grow (a_i < 1), j may shrink (a_j > 0)
        let mut up: Option<(usize, f64)> = None;
        let mut low: Option<(usize, f64)> = None;
        for t in 0..n {
            let v = -gradient[t];
            if alpha[t] < 1.0 && up.map_or(true, |(_, best)| v >= best) {
                up = Some((t, v));
            }
            if alpha[t] > 0.0 && low.map_or(true, |(_, best)| v <= best) {
                low = Some((t, v));
            }
        }
        let (Some((i, m_up)), Some((j, m_low))) = (up, low) else {
            break;
        };
        if m_up - m_low < params.tolerance {
            break;
        }

        let quad = (q[i * n + i] + q[j * n + j] - 2.0 * q[i * n + j]).max(1e-12);
        let step = ((gradient[j] - gradient[i]) / quad)
            .min(1.0 - alpha[i])
            .min(alpha[j]);
        alpha[i] += step;
        alpha[j] -= step;
        for (k, g) in gradient.iter_mut().enumerate() {
            *g += step * (q[k * n + i] - q[k * n + j]);
        }
        iterations += 1;
    }
    if iterations == params.max_iterations {
        warn!(
            iterations,
            "one-class SVM stopped at the iteration limit before convergence"
        );
    }

    // rho: mean gradient over free coefficients, else midpoint of the bounds
    let (mut free_sum, mut free_count) = (0.0, 0usize);
    let (mut upper, mut lower) = (f64::INFINITY, f64::NEG_INFINITY);
    for (a, &g) in alpha.iter().zip(&gradient) {
        if *a >= 1.0 {
            lower = lower.max(g);
        } else if *a <= 0.0 {
            upper = upper.min(g);
        } else {
            free_sum += g;
            free_count += 1;
        }
    }
    let rho = if free_count > 0 {
        free_sum / free_count as f64
    } else if upper.is_finite() && lower.is_finite() {
        (upper + lower) / 2.0
    } else if upper.is_finite() {
        upper
    } else {
        lower
    };

    DualSolution {
        gradient,
        rho,
        iterations,
    }
}

/// Point scorer backed by a one-class SVM with an RBF kernel
///
/// Scores are the negated decision values, so positive scores are outliers
/// and the threshold is always 0. Deterministic for a given input.
#[derive(Debug, Clone, Default)]
pub struct OneClassSvmScorer {
    params: OneClassSvmParameters,
}

impl OneClassSvmScorer {
    pub fn new(params: OneClassSvmParameters) -> Result<Self> {
        params.validate()?;
        Ok(Self { params })
    }

    pub fn with_nu(nu: f64) -> Result<Self> {
        Self::new(OneClassSvmParameters {
            nu,
            ..Default::default()
        })
    }

    pub fn parameters(&self) -> &OneClassSvmParameters {
        &self.params
    }
}

impl ScorerProperties for OneClassSvmScorer {
    fn algorithm_name(&self) -> &'static str {
        "OneClassSVM"
    }

    fn minimum_sample_size(&self) -> usize {
        2
    }
}

impl PointScorer for OneClassSvmScorer {
    fn score_points(&self, series: &TimeSeries) -> Result<PointScores> {
        let values = series.complete_values()?;
        let n = values.len();
        if n < self.minimum_sample_size() {
            return Err(Error::insufficient(self.minimum_sample_size(), n));
        }
        if n > self.params.max_samples {
            return Err(Error::InvalidInput(format!(
                "one-class SVM accepts at most {} samples, got {n}",
                self.params.max_samples
            )));
        }

        let kernel = RbfKernel::new(self.params.gamma.resolve(&values));
        let q = kernel.gram(&values);
        let solution = solve_dual(&q, n, &self.params);

        let scores: Vec<f64> = solution
            .gradient
            .iter()
            .map(|&g| solution.rho - g)
            .collect();
        if scores.iter().any(|s| !s.is_finite()) {
            return Err(Error::non_finite("one-class SVM decision values"));
        }
        let flags = scores.iter().map(|&s| s > 0.0).collect();

        let result = PointScores {
            scores,
            flags,
            threshold: 0.0,
        };
        debug!(
            series = series.name(),
            samples = n,
            nu = self.params.nu,
            gamma = kernel.gamma(),
            iterations = solution.iterations,
            rho = solution.rho,
            anomalies = result.anomaly_count(),
            "one-class SVM scored series"
        );
        Ok(result)
    }
}
