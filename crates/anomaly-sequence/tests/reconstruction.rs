//! End-to-end behaviour of the sequence scorer

use anomaly_core::{AnnotatedSeries, CancellationToken, Error, RunBudget, TimeSeries, WindowScorer};
use anomaly_sequence::{SequenceParameters, SequenceReconstructionScorer};
use proptest::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};
use std::time::Duration;

fn drifting_sensor(n: usize, drift: usize, seed: u64) -> TimeSeries {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let noise = Normal::new(0.0, 0.5).unwrap();
    let start = n - drift;
    let values: Vec<f64> = (0..n)
        .map(|i| {
            let ramp = if i >= start {
                5.0 * (i - start) as f64 / (drift - 1) as f64
            } else {
                0.0
            };
            25.0 + noise.sample(&mut rng) + ramp
        })
        .collect();
    TimeSeries::from_values("sensor", &values)
}

fn quick_scorer(window_size: usize, epochs: usize) -> SequenceReconstructionScorer {
    SequenceReconstructionScorer::new(SequenceParameters {
        window_size,
        epochs,
        latent_dim: 8,
        seed: Some(42),
        ..Default::default()
    })
    .unwrap()
}

#[test]
fn test_drift_windows_reconstruct_worse() {
    let series = drifting_sensor(1000, 300, 42);
    let scorer = quick_scorer(30, 3);
    let (scores, report) = scorer
        .score_with_report(&series, &RunBudget::unlimited())
        .unwrap();

    assert_eq!(scores.len(), 970);
    assert_eq!(report.training_windows, 582);
    assert_eq!(report.epoch_losses.len(), 3);

    // window i covers rows [i, i + 30)
    let normal: Vec<f64> = scores.errors[..670].to_vec();
    let drifted: Vec<f64> = scores.errors[800..].to_vec();
    let mean = |v: &[f64]| v.iter().sum::<f64>() / v.len() as f64;
    assert!(
        mean(&drifted) > mean(&normal),
        "drift mean {} vs normal mean {}",
        mean(&drifted),
        mean(&normal)
    );

    let fraction = scores.anomaly_fraction();
    assert!((0.04..=0.06).contains(&fraction), "fraction above p95 = {fraction}");
    assert!(scores.errors.iter().all(|&e| e >= 0.0));
}

#[test]
fn test_annotated_output_has_n_minus_window_rows() {
    let series = drifting_sensor(200, 50, 1);
    let scores = quick_scorer(20, 1)
        .score_windows(&series, &RunBudget::unlimited())
        .unwrap();
    let mut annotated = AnnotatedSeries::from_series(&series).unwrap();
    annotated.apply_window_scores(&scores).unwrap();

    assert_eq!(annotated.len(), 180);
    assert_eq!(annotated.rows()[0].time, 20.0);
    assert_eq!(annotated.lstm_threshold(), Some(scores.threshold));
    assert!(annotated
        .rows()
        .iter()
        .all(|r| r.reconstruction_error.is_some() && r.anomaly_lstm.is_some()));
}

#[test]
fn test_cancelled_run_stops() {
    let series = drifting_sensor(300, 50, 2);
    let token = CancellationToken::new();
    token.cancel();
    let result = quick_scorer(30, 10).score_windows(&series, &RunBudget::with_token(token));
    assert!(matches!(result, Err(Error::Cancelled)));
}

#[test]
fn test_time_limit_stops_training() {
    let series = drifting_sensor(1000, 300, 3);
    let budget = RunBudget::unlimited().limit(Duration::from_millis(1));
    std::thread::sleep(Duration::from_millis(5));
    let result = quick_scorer(30, 50).score_windows(&series, &budget);
    assert!(matches!(result, Err(Error::TimedOut { .. })));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(8))]

    #[test]
    fn prop_output_length_is_n_minus_window(
        n in 6usize..60,
        window_size in 1usize..6,
    ) {
        let values: Vec<f64> = (0..n).map(|i| ((i * 7) % 5) as f64).collect();
        let series = TimeSeries::from_values("sensor", &values);
        let scorer = SequenceReconstructionScorer::new(SequenceParameters {
            window_size,
            epochs: 1,
            latent_dim: 2,
            seed: Some(0),
            ..Default::default()
        })
        .unwrap();
        let scores = scorer.score_windows(&series, &RunBudget::unlimited()).unwrap();
        prop_assert_eq!(scores.len(), n - window_size);
        prop_assert_eq!(scores.flags.len(), scores.errors.len());
    }
}
