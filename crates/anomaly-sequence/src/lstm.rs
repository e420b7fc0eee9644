//! Single LSTM layer with backpropagation through time
//!
//! Gate layout in the stacked parameters is `[input, forget, cell, output]`,
//! each block `hidden` rows tall:
//!
//! ```text
//! z_t = W x_t + U h_{t-1} + b
//! i = sigmoid(z_i)  f = sigmoid(z_f)  g = tanh(z_g)  o = sigmoid(z_o)
//! c_t = f * c_{t-1} + i * g
//! h_t = o * tanh(c_t)
//! ```
//!
//! State starts at zero for every sequence.

use nalgebra::{DMatrix, DVector};
use rand::Rng;
use rand_distr::{Distribution, Uniform};

#[inline]
fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Glorot-uniform matrix of shape `rows x cols`
pub(crate) fn glorot_uniform<R: Rng + ?Sized>(rows: usize, cols: usize, rng: &mut R) -> DMatrix<f64> {
    let limit = (6.0 / (rows + cols) as f64).sqrt();
    let dist = Uniform::new_inclusive(-limit, limit);
    DMatrix::from_fn(rows, cols, |_, _| dist.sample(rng))
}

#[derive(Debug, Clone)]
pub struct LstmLayer {
    w: DMatrix<f64>,
    u: DMatrix<f64>,
    b: DVector<f64>,
    hidden: usize,
}

/// Values kept from one forward step for the backward pass
#[derive(Debug, Clone)]
struct LstmStep {
    x: DVector<f64>,
    h_prev: DVector<f64>,
    c_prev: DVector<f64>,
    i: DVector<f64>,
    f: DVector<f64>,
    g: DVector<f64>,
    o: DVector<f64>,
    tanh_c: DVector<f64>,
    h: DVector<f64>,
}

/// Forward pass over one sequence
#[derive(Debug, Clone)]
pub struct LstmTrace {
    hidden: usize,
    steps: Vec<LstmStep>,
}

impl LstmTrace {
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Hidden state after each step
    pub fn outputs(&self) -> impl Iterator<Item = &DVector<f64>> + '_ {
        self.steps.iter().map(|s| &s.h)
    }

    /// Hidden state after the final step, zero for an empty sequence
    pub fn last_hidden(&self) -> DVector<f64> {
        self.steps
            .last()
            .map(|s| s.h.clone())
            .unwrap_or_else(|| DVector::zeros(self.hidden))
    }
}

/// Parameter gradients of one layer, same shapes as the layer
#[derive(Debug, Clone)]
pub struct LstmGradients {
    pub w: DMatrix<f64>,
    pub u: DMatrix<f64>,
    pub b: DVector<f64>,
}

impl LstmGradients {
    pub fn slices(&self) -> [&[f64]; 3] {
        [self.w.as_slice(), self.u.as_slice(), self.b.as_slice()]
    }
}

impl LstmLayer {
    /// Glorot-uniform weights, zero biases except a forget-gate bias of 1
    pub fn new<R: Rng + ?Sized>(input: usize, hidden: usize, rng: &mut R) -> Self {
        let w = glorot_uniform(4 * hidden, input, rng);
        let u = glorot_uniform(4 * hidden, hidden, rng);
        let mut b = DVector::zeros(4 * hidden);
        b.rows_mut(hidden, hidden).fill(1.0);
        Self { w, u, b, hidden }
    }

    pub fn input_size(&self) -> usize {
        self.w.ncols()
    }

    pub fn hidden_size(&self) -> usize {
        self.hidden
    }

    pub fn zero_gradients(&self) -> LstmGradients {
        LstmGradients {
            w: DMatrix::zeros(self.w.nrows(), self.w.ncols()),
            u: DMatrix::zeros(self.u.nrows(), self.u.ncols()),
            b: DVector::zeros(self.b.len()),
        }
    }

    /// Mutable views of `[W, U, b]`, in the order of [`LstmGradients::slices`]
    pub fn parameters_mut(&mut self) -> [&mut [f64]; 3] {
        [
            self.w.as_mut_slice(),
            self.u.as_mut_slice(),
            self.b.as_mut_slice(),
        ]
    }

    pub fn forward(&self, inputs: &[DVector<f64>]) -> LstmTrace {
        let h = self.hidden;
        let mut h_prev = DVector::zeros(h);
        let mut c_prev = DVector::zeros(h);
        let mut steps = Vec::with_capacity(inputs.len());

        for x in inputs {
            let z = &self.w * x + &self.u * &h_prev + &self.b;
            let i = z.rows(0, h).map(sigmoid);
            let f = z.rows(h, h).map(sigmoid);
            let g = z.rows(2 * h, h).map(f64::tanh);
            let o = z.rows(3 * h, h).map(sigmoid);
            let c = f.component_mul(&c_prev) + i.component_mul(&g);
            let tanh_c = c.map(f64::tanh);
            let h_t = o.component_mul(&tanh_c);

            steps.push(LstmStep {
                x: x.clone(),
                h_prev,
                c_prev,
                i,
                f,
                g,
                o,
                tanh_c,
                h: h_t.clone(),
            });
            h_prev = h_t;
            c_prev = c;
        }

        LstmTrace { hidden: h, steps }
    }

    /// Backpropagate `dh[t]` (loss gradient w.r.t. each emitted hidden
    /// state) through the trace
    ///
    /// Parameter gradients are added to `grads`; the returned vectors are the
    /// gradients w.r.t. each input.
    pub fn backward(
        &self,
        trace: &LstmTrace,
        dh: &[DVector<f64>],
        grads: &mut LstmGradients,
    ) -> Vec<DVector<f64>> {
        debug_assert_eq!(dh.len(), trace.len());
        let h = self.hidden;
        let mut dx = vec![DVector::zeros(self.input_size()); trace.len()];
        let mut dh_next = DVector::zeros(h);
        let mut dc_next = DVector::zeros(h);

        for (t, step) in trace.steps.iter().enumerate().rev() {
            let dh_t = &dh[t] + &dh_next;
            let d_o = dh_t.component_mul(&step.tanh_c);
            let dc = dh_t
                .component_mul(&step.o)
                .component_mul(&step.tanh_c.map(|v| 1.0 - v * v))
                + &dc_next;
            let d_i = dc.component_mul(&step.g);
            let d_g = dc.component_mul(&step.i);
            let d_f = dc.component_mul(&step.c_prev);
            dc_next = dc.component_mul(&step.f);

            let dz = DVector::from_iterator(
                4 * h,
                d_i.iter()
                    .zip(step.i.iter())
                    .map(|(d, a)| d * a * (1.0 - a))
                    .chain(d_f.iter().zip(step.f.iter()).map(|(d, a)| d * a * (1.0 - a)))
                    .chain(d_g.iter().zip(step.g.iter()).map(|(d, a)| d * (1.0 - a * a)))
                    .chain(d_o.iter().zip(step.o.iter()).map(|(d, a)| d * a * (1.0 - a))),
            );

            grads.w.ger(1.0, &dz, &step.x, 1.0);
            grads.u.ger(1.0, &dz, &step.h_prev, 1.0);
            grads.b += &dz;
            dx[t] = self.w.tr_mul(&dz);
            dh_next = self.u.tr_mul(&dz);
        }

        dx
    }
}
