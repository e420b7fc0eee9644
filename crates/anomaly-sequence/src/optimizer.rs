//! Adam optimiser over flat parameter slices

/// Adam with bias correction
///
/// Moment buffers are allocated on the first update and keyed by slot
/// position, so every call must pass the same slots in the same order.
#[derive(Debug, Clone)]
pub struct Adam {
    learning_rate: f64,
    beta1: f64,
    beta2: f64,
    epsilon: f64,
    step: i32,
    first: Vec<Vec<f64>>,
    second: Vec<Vec<f64>>,
}

impl Adam {
    pub fn new(learning_rate: f64) -> Self {
        Self {
            learning_rate,
            beta1: 0.9,
            beta2: 0.999,
            epsilon: 1e-7,
            step: 0,
            first: Vec::new(),
            second: Vec::new(),
        }
    }

    pub fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    /// Number of updates applied so far
    pub fn steps(&self) -> usize {
        self.step as usize
    }

    pub fn update(&mut self, params: &mut [&mut [f64]], grads: &[&[f64]]) {
        debug_assert_eq!(params.len(), grads.len());
        if self.first.is_empty() {
            self.first = grads.iter().map(|g| vec![0.0; g.len()]).collect();
            self.second = self.first.clone();
        }

        self.step += 1;
        let correction1 = 1.0 - self.beta1.powi(self.step);
        let correction2 = 1.0 - self.beta2.powi(self.step);
        let (b1, b2) = (self.beta1, self.beta2);

        for (slot, (param, grad)) in params.iter_mut().zip(grads).enumerate() {
            let m = &mut self.first[slot];
            let v = &mut self.second[slot];
            for (((p, &g), m), v) in param.iter_mut().zip(grad.iter()).zip(m.iter_mut()).zip(v.iter_mut()) {
                *m = b1 * *m + (1.0 - b1) * g;
                *v = b2 * *v + (1.0 - b2) * g * g;
                let m_hat = *m / correction1;
                let v_hat = *v / correction2;
                *p -= self.learning_rate * m_hat / (v_hat.sqrt() + self.epsilon);
            }
        }
    }
}
