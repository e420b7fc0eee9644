//! Kernels for the one-class SVM

use anomaly_core::utils::variance;

/// Width parameter of the RBF kernel
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Gamma {
    /// `1 / (n_features * var(x))`, or 1 when the sample has no variance
    Scale,
    /// Fixed value
    Value(f64),
}

impl Default for Gamma {
    fn default() -> Self {
        Self::Scale
    }
}

impl Gamma {
    /// Resolve against a one-feature sample
    pub fn resolve(&self, values: &[f64]) -> f64 {
        match *self {
            Gamma::Value(g) => g,
            Gamma::Scale => {
                let var = variance(values);
                if var > 0.0 {
                    1.0 / var
                } else {
                    1.0
                }
            }
        }
    }
}

/// Gaussian radial basis function kernel
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RbfKernel {
    gamma: f64,
}

impl RbfKernel {
    pub fn new(gamma: f64) -> Self {
        Self { gamma }
    }

    pub fn gamma(&self) -> f64 {
        self.gamma
    }

    #[inline]
    pub fn eval(&self, x: f64, y: f64) -> f64 {
        let d = x - y;
        (-self.gamma * d * d).exp()
    }

    /// Dense row-major Gram matrix of the sample
    pub fn gram(&self, values: &[f64]) -> Vec<f64> {
        let n = values.len();
        let mut q = vec![0.0; n * n];
        for i in 0..n {
            q[i * n + i] = 1.0;
            for j in (i + 1)..n {
                let k = self.eval(values[i], values[j]);
                q[i * n + j] = k;
                q[j * n + i] = k;
            }
        }
        q
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_gamma_scale() {
        assert_relative_eq!(Gamma::Scale.resolve(&[1.0, 3.0]), 1.0);
        assert_relative_eq!(Gamma::Scale.resolve(&[0.0, 4.0]), 0.25);
        assert_eq!(Gamma::Scale.resolve(&[2.0, 2.0]), 1.0);
        assert_eq!(Gamma::Value(0.3).resolve(&[0.0, 4.0]), 0.3);
    }

    #[test]
    fn test_gram_is_symmetric_with_unit_diagonal() {
        let kernel = RbfKernel::new(0.5);
        let q = kernel.gram(&[0.0, 1.0, 3.0]);
        assert_eq!(q[0], 1.0);
        assert_eq!(q[4], 1.0);
        assert_eq!(q[1], q[3]);
        assert_relative_eq!(q[2], (-4.5f64).exp());
    }
}
