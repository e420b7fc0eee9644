//! Mini-batch training of the autoencoder

use crate::autoencoder::LstmAutoencoder;
use crate::optimizer::Adam;
use anomaly_core::{Error, Result, RunBudget};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;
use std::time::{Duration, Instant};
use tracing::debug;

/// Summary of one training run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrainingReport {
    /// Mean window MSE over each epoch, in epoch order
    pub epoch_losses: Vec<f64>,
    pub training_windows: usize,
    pub optimizer_steps: usize,
    pub elapsed: Duration,
}

impl TrainingReport {
    pub fn final_loss(&self) -> Option<f64> {
        self.epoch_losses.last().copied()
    }
}

/// Shape of a training run
#[derive(Debug, Clone, Copy)]
pub(crate) struct TrainingSchedule {
    pub epochs: usize,
    pub batch_size: usize,
    pub learning_rate: f64,
}

/// Fit `model` to `windows`, reshuffling every epoch
///
/// The budget is checked before every mini-batch.
pub(crate) fn train<R: Rng + ?Sized>(
    model: &mut LstmAutoencoder,
    windows: &[&[f64]],
    schedule: TrainingSchedule,
    budget: &RunBudget,
    rng: &mut R,
) -> Result<TrainingReport> {
    let started = Instant::now();
    let mut optimizer = Adam::new(schedule.learning_rate);
    let mut order: Vec<usize> = (0..windows.len()).collect();
    let mut epoch_losses = Vec::with_capacity(schedule.epochs);

    for epoch in 0..schedule.epochs {
        order.shuffle(rng);
        let mut total = 0.0;
        for batch in order.chunks(schedule.batch_size) {
            budget.check()?;
            let mut grads = model.zero_gradients();
            let weight = 1.0 / batch.len() as f64;
            for &idx in batch {
                total += model.accumulate(windows[idx], weight, &mut grads);
            }
            optimizer.update(&mut model.parameters_mut(), &grads.slices());
        }

        let loss = total / windows.len().max(1) as f64;
        if !loss.is_finite() {
            return Err(Error::non_finite("training loss"));
        }
        debug!(epoch = epoch + 1, epochs = schedule.epochs, loss, "autoencoder epoch finished");
        epoch_losses.push(loss);
    }

    Ok(TrainingReport {
        epoch_losses,
        training_windows: windows.len(),
        optimizer_steps: optimizer.steps(),
        elapsed: started.elapsed(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use anomaly_core::CancellationToken;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn sine_windows() -> Vec<Vec<f64>> {
        (0..40)
            .map(|start| {
                (0..8)
                    .map(|i| 0.5 + 0.4 * ((start + i) as f64 * 0.4).sin())
                    .collect()
            })
            .collect()
    }

    #[test]
    fn test_loss_decreases() {
        let data = sine_windows();
        let windows: Vec<&[f64]> = data.iter().map(|w| w.as_slice()).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let mut model = LstmAutoencoder::new(6, &mut rng);
        let schedule = TrainingSchedule {
            epochs: 15,
            batch_size: 8,
            learning_rate: 0.01,
        };
        let report = train(&mut model, &windows, schedule, &RunBudget::unlimited(), &mut rng).unwrap();

        assert_eq!(report.epoch_losses.len(), 15);
        assert_eq!(report.training_windows, 40);
        assert_eq!(report.optimizer_steps, 15 * 5);
        let first = report.epoch_losses[0];
        let last = report.final_loss().unwrap();
        assert!(last < first, "loss went from {first} to {last}");
    }

    #[test]
    fn test_cancelled_before_first_batch() {
        let data = sine_windows();
        let windows: Vec<&[f64]> = data.iter().map(|w| w.as_slice()).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let mut model = LstmAutoencoder::new(2, &mut rng);
        let token = CancellationToken::new();
        token.cancel();
        let schedule = TrainingSchedule {
            epochs: 1,
            batch_size: 8,
            learning_rate: 0.01,
        };
        let result = train(&mut model, &windows, schedule, &RunBudget::with_token(token), &mut rng);
        assert!(matches!(result, Err(Error::Cancelled)));
    }
}
