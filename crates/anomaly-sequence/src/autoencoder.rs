//! LSTM autoencoder for one-dimensional windows
//!
//! The encoder reads the window one value per step; its final hidden state is
//! the latent code. The decoder receives the latent code at every step and a
//! dense layer maps each decoder state back to a single value.

use crate::lstm::{glorot_uniform, LstmGradients, LstmLayer, LstmTrace};
use anomaly_core::utils::mean_squared_error;
use nalgebra::DVector;
use rand::Rng;

#[derive(Debug, Clone)]
pub struct LstmAutoencoder {
    encoder: LstmLayer,
    decoder: LstmLayer,
    dense_w: DVector<f64>,
    dense_b: f64,
}

/// Accumulated gradients for every autoencoder parameter
#[derive(Debug, Clone)]
pub struct AutoencoderGradients {
    encoder: LstmGradients,
    decoder: LstmGradients,
    dense_w: DVector<f64>,
    dense_b: f64,
}

impl AutoencoderGradients {
    /// Flat views in the order of [`LstmAutoencoder::parameters_mut`]
    pub fn slices(&self) -> Vec<&[f64]> {
        let mut out = Vec::with_capacity(8);
        out.extend(self.encoder.slices());
        out.extend(self.decoder.slices());
        out.push(self.dense_w.as_slice());
        out.push(std::slice::from_ref(&self.dense_b));
        out
    }
}

struct Forward {
    encoder: LstmTrace,
    decoder: LstmTrace,
    output: Vec<f64>,
}

impl LstmAutoencoder {
    pub fn new<R: Rng + ?Sized>(latent_dim: usize, rng: &mut R) -> Self {
        let encoder = LstmLayer::new(1, latent_dim, rng);
        let decoder = LstmLayer::new(latent_dim, latent_dim, rng);
        let dense_w = glorot_uniform(latent_dim, 1, rng).column(0).into_owned();
        Self {
            encoder,
            decoder,
            dense_w,
            dense_b: 0.0,
        }
    }

    pub fn latent_dim(&self) -> usize {
        self.encoder.hidden_size()
    }

    fn forward(&self, window: &[f64]) -> Forward {
        let inputs: Vec<DVector<f64>> = window
            .iter()
            .map(|&v| DVector::from_element(1, v))
            .collect();
        let encoder = self.encoder.forward(&inputs);
        let latent = encoder.last_hidden();
        let decoder = self.decoder.forward(&vec![latent; window.len()]);
        let output = decoder
            .outputs()
            .map(|h| self.dense_w.dot(h) + self.dense_b)
            .collect();
        Forward {
            encoder,
            decoder,
            output,
        }
    }

    /// Latent code of a window
    pub fn encode(&self, window: &[f64]) -> DVector<f64> {
        let inputs: Vec<DVector<f64>> = window
            .iter()
            .map(|&v| DVector::from_element(1, v))
            .collect();
        self.encoder.forward(&inputs).last_hidden()
    }

    pub fn reconstruct(&self, window: &[f64]) -> Vec<f64> {
        self.forward(window).output
    }

    /// Mean squared reconstruction error of a window
    pub fn reconstruction_error(&self, window: &[f64]) -> f64 {
        if window.is_empty() {
            return 0.0;
        }
        mean_squared_error(&self.reconstruct(window), window)
    }

    pub fn zero_gradients(&self) -> AutoencoderGradients {
        AutoencoderGradients {
            encoder: self.encoder.zero_gradients(),
            decoder: self.decoder.zero_gradients(),
            dense_w: DVector::zeros(self.dense_w.len()),
            dense_b: 0.0,
        }
    }

    /// Add `weight * d(MSE)/d(theta)` of one window to `grads` and return
    /// the window's MSE
    pub fn accumulate(&self, window: &[f64], weight: f64, grads: &mut AutoencoderGradients) -> f64 {
        let steps = window.len();
        if steps == 0 {
            return 0.0;
        }
        let forward = self.forward(window);
        let scale = 2.0 * weight / steps as f64;

        let mut loss = 0.0;
        let mut dh_decoder = Vec::with_capacity(steps);
        for ((y, x), h) in forward.output.iter().zip(window).zip(forward.decoder.outputs()) {
            let diff = y - x;
            loss += diff * diff;
            let dy = scale * diff;
            grads.dense_w.axpy(dy, h, 1.0);
            grads.dense_b += dy;
            dh_decoder.push(&self.dense_w * dy);
        }

        let dx_decoder = self
            .decoder
            .backward(&forward.decoder, &dh_decoder, &mut grads.decoder);
        let d_latent = dx_decoder
            .iter()
            .fold(DVector::<f64>::zeros(self.latent_dim()), |acc, d| acc + d);

        let mut dh_encoder = vec![DVector::zeros(self.latent_dim()); steps];
        dh_encoder[steps - 1] = d_latent;
        self.encoder
            .backward(&forward.encoder, &dh_encoder, &mut grads.encoder);

        loss / steps as f64
    }

    /// Flat mutable views of every parameter
    pub fn parameters_mut(&mut self) -> Vec<&mut [f64]> {
        let mut out: Vec<&mut [f64]> = Vec::with_capacity(8);
        out.extend(self.encoder.parameters_mut());
        out.extend(self.decoder.parameters_mut());
        out.push(self.dense_w.as_mut_slice());
        out.push(std::slice::from_mut(&mut self.dense_b));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_shapes() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let model = LstmAutoencoder::new(5, &mut rng);
        assert_eq!(model.latent_dim(), 5);
        assert_eq!(model.encode(&[0.1, 0.2, 0.3]).len(), 5);
        assert_eq!(model.reconstruct(&[0.1, 0.2, 0.3, 0.4]).len(), 4);
        assert!(model.reconstruction_error(&[0.5; 6]) >= 0.0);

        let grads = model.zero_gradients();
        let mut model = model;
        let shapes: Vec<usize> = grads.slices().iter().map(|s| s.len()).collect();
        let params: Vec<usize> = model.parameters_mut().iter().map(|s| s.len()).collect();
        assert_eq!(shapes, params);
        assert_eq!(shapes.len(), 8);
    }

    #[test]
    fn test_reconstruction_error_is_window_mse() {
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let model = LstmAutoencoder::new(3, &mut rng);
        let window = [0.0, 0.25, 0.5, 1.0];
        let output = model.reconstruct(&window);
        let expected = output
            .iter()
            .zip(&window)
            .map(|(y, x)| (y - x) * (y - x))
            .sum::<f64>()
            / 4.0;
        assert!((model.reconstruction_error(&window) - expected).abs() < 1e-15);
        assert_eq!(model.reconstruction_error(&[]), 0.0);
    }

    #[test]
    fn test_gradients_match_finite_differences() {
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let mut model = LstmAutoencoder::new(3, &mut rng);
        let window = [0.1, 0.8, 0.3, 0.6];

        let mut grads = model.zero_gradients();
        let loss = model.accumulate(&window, 1.0, &mut grads);
        assert!((loss - model.reconstruction_error(&window)).abs() < 1e-12);
        let analytic: Vec<Vec<f64>> = grads.slices().iter().map(|s| s.to_vec()).collect();

        let eps = 1e-6;
        for (slot, values) in analytic.iter().enumerate() {
            // a few entries of every parameter block
            for k in [0, values.len() / 2, values.len() - 1] {
                let original = model.parameters_mut()[slot][k];
                model.parameters_mut()[slot][k] = original + eps;
                let plus = model.reconstruction_error(&window);
                model.parameters_mut()[slot][k] = original - eps;
                let minus = model.reconstruction_error(&window);
                model.parameters_mut()[slot][k] = original;

                let numeric = (plus - minus) / (2.0 * eps);
                assert!(
                    (numeric - values[k]).abs() < 1e-6 + 1e-4 * numeric.abs(),
                    "slot {slot} entry {k}: numeric {numeric}, analytic {}",
                    values[k]
                );
            }
        }
    }
}
