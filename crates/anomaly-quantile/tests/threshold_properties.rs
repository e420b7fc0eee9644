//! Statistical properties of percentile thresholds

use anomaly_quantile::{percentile, PercentileThreshold};
use proptest::prelude::*;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

#[test]
fn test_about_five_percent_above_p95_on_continuous_scores() {
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    let scores: Vec<f64> = (0..2_000).map(|_| rng.gen::<f64>().powi(3)).collect();
    let (_, flags) = PercentileThreshold::default().fit_flag(&scores).unwrap();
    let fraction = flags.iter().filter(|&&f| f).count() as f64 / scores.len() as f64;
    assert!((fraction - 0.05).abs() < 0.005, "fraction above p95 = {fraction}");
}

proptest! {
    #[test]
    fn prop_percentile_is_monotone(
        data in prop::collection::vec(-1e3f64..1e3, 1..200),
        a in 0.0f64..100.0,
        b in 0.0f64..100.0,
    ) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(percentile(&data, lo).unwrap() <= percentile(&data, hi).unwrap());
    }

    #[test]
    fn prop_percentile_within_sample_range(
        data in prop::collection::vec(-1e3f64..1e3, 1..200),
        q in 0.0f64..=100.0,
    ) {
        let p = percentile(&data, q).unwrap();
        let min = data.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = data.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        prop_assert!(p >= min && p <= max);
    }

    #[test]
    fn prop_flagged_fraction_bounded(
        data in prop::collection::vec(0.0f64..1.0, 1..300),
    ) {
        let (_, flags) = PercentileThreshold::default().fit_flag(&data).unwrap();
        let fraction = flags.iter().filter(|&&f| f).count() as f64 / data.len() as f64;
        prop_assert!(fraction <= 0.05 + 1.0 / data.len() as f64);
    }
}
