//! Scoring pipeline
//!
//! One run takes a series through the configured stages in a fixed order:
//! gap removal, rolling features, the point scorers, then the sequence
//! scorer. The sequence stage drops the first `window_size` rows, so it
//! always runs last.

use crate::config::PipelineConfig;
use crate::Result;
use anomaly_core::{
    AnnotatedSeries, CancellationToken, PointScorer, PointScores, RollingFeatures, RunBudget,
    ScorerProperties, TimeSeries,
};
use anomaly_outlier::{IsolationForestScorer, OneClassSvmScorer};
use anomaly_sequence::{SequenceReconstructionScorer, TrainingReport};
use anomaly_telemetry::{
    fetch_driver_channel, write_annotated_csv_path, Channel, SessionKey, TelemetryProvider,
};
use serde::Serialize;
use std::fmt;
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Outcome of one scoring stage
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageSummary {
    pub algorithm: &'static str,
    /// Points or windows scored
    pub scored: usize,
    pub anomalies: usize,
    pub threshold: f64,
    pub elapsed: Duration,
}

impl StageSummary {
    pub fn anomaly_fraction(&self) -> f64 {
        if self.scored == 0 {
            return 0.0;
        }
        self.anomalies as f64 / self.scored as f64
    }
}

/// Everything a run produced
#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub annotated: AnnotatedSeries,
    /// Samples removed because their value was missing
    pub dropped_missing: usize,
    pub isolation: Option<StageSummary>,
    pub svm: Option<StageSummary>,
    pub sequence: Option<StageSummary>,
    pub training: Option<TrainingReport>,
    pub elapsed: Duration,
}

impl fmt::Display for PipelineReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{}: {} rows ({} missing dropped) in {:.2?}",
            self.annotated.name(),
            self.annotated.len(),
            self.dropped_missing,
            self.elapsed
        )?;
        for stage in [&self.isolation, &self.svm, &self.sequence].into_iter().flatten() {
            writeln!(
                f,
                "  {:<16} {:>5} / {:<5} anomalous ({:.1}%), threshold {:.4}",
                stage.algorithm,
                stage.anomalies,
                stage.scored,
                100.0 * stage.anomaly_fraction(),
                stage.threshold
            )?;
        }
        if let Some(loss) = self.training.as_ref().and_then(TrainingReport::final_loss) {
            writeln!(f, "  final training loss {loss:.6}")?;
        }
        Ok(())
    }
}

/// Runs the configured stages over a series
#[derive(Debug, Clone)]
pub struct ScoringPipeline {
    config: PipelineConfig,
    token: CancellationToken,
}

impl ScoringPipeline {
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            token: CancellationToken::new(),
        })
    }

    /// Stop sequence training when `token` is cancelled
    pub fn with_token(mut self, token: CancellationToken) -> Self {
        self.token = token;
        self
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn run(&self, series: &TimeSeries) -> Result<PipelineReport> {
        let started = Instant::now();
        let dropped_missing = series.missing_count();
        if dropped_missing > 0 {
            warn!(
                series = series.name(),
                dropped = dropped_missing,
                "dropping missing measurements"
            );
        }
        let clean = series.drop_missing();
        if clean.is_empty() {
            return Err(anomaly_core::Error::empty_input().into());
        }
        let mut annotated = AnnotatedSeries::from_series(&clean)?;
        info!(series = clean.name(), rows = clean.len(), "scoring series");

        if let Some(window) = self.config.rolling_window {
            if clean.len() >= window {
                let values = clean.complete_values()?;
                annotated.apply_rolling(&RollingFeatures::compute(&values, window)?)?;
                info!(window, "rolling features attached");
            } else {
                warn!(window, rows = clean.len(), "series shorter than rolling window");
            }
        }

        let isolation = match &self.config.isolation {
            Some(config) => {
                let scorer = IsolationForestScorer::new(config.into())?;
                let (scores, summary) = score_points(&scorer, &clean)?;
                annotated.apply_isolation(&scores)?;
                Some(summary)
            }
            None => None,
        };

        let svm = match &self.config.svm {
            Some(config) if clean.len() > config.max_samples => {
                warn!(
                    rows = clean.len(),
                    max_samples = config.max_samples,
                    "series larger than one-class SVM limit, skipping"
                );
                None
            }
            Some(config) => {
                let scorer = OneClassSvmScorer::new(config.into())?;
                let (scores, summary) = score_points(&scorer, &clean)?;
                annotated.apply_svm(&scores)?;
                Some(summary)
            }
            None => None,
        };

        let (sequence, training) = match &self.config.sequence {
            Some(config) => {
                let mut budget = RunBudget::with_token(self.token.clone());
                if let Some(limit) = config.time_limit()? {
                    budget = budget.limit(limit);
                }
                let scorer = SequenceReconstructionScorer::new(config.into())?;
                let stage = Instant::now();
                let (scores, report) = scorer.score_with_report(&clean, &budget)?;
                annotated.apply_window_scores(&scores)?;
                let summary = StageSummary {
                    algorithm: scorer.algorithm_name(),
                    scored: scores.len(),
                    anomalies: scores.anomaly_count(),
                    threshold: scores.threshold,
                    elapsed: stage.elapsed(),
                };
                info!(
                    algorithm = summary.algorithm,
                    windows = summary.scored,
                    anomalies = summary.anomalies,
                    epochs = report.epoch_losses.len(),
                    "sequence stage done"
                );
                (Some(summary), Some(report))
            }
            None => (None, None),
        };

        Ok(PipelineReport {
            annotated,
            dropped_missing,
            isolation,
            svm,
            sequence,
            training,
            elapsed: started.elapsed(),
        })
    }

    /// Run and write the annotated series as CSV
    pub fn run_to_csv(&self, series: &TimeSeries, path: impl AsRef<Path>) -> Result<PipelineReport> {
        let report = self.run(series)?;
        write_annotated_csv_path(path.as_ref(), &report.annotated)?;
        info!(path = %path.as_ref().display(), rows = report.annotated.len(), "saved annotated series");
        Ok(report)
    }

    /// Fetch one channel of a driver's fastest lap and run on it
    pub fn run_session<P: TelemetryProvider + ?Sized>(
        &self,
        provider: &P,
        key: &SessionKey,
        channel: Channel,
    ) -> Result<PipelineReport> {
        let series = fetch_driver_channel(provider, key, channel)?;
        self.run(&series)
    }
}

fn score_points<S: PointScorer>(
    scorer: &S,
    series: &TimeSeries,
) -> Result<(PointScores, StageSummary)> {
    let stage = Instant::now();
    let scores = scorer.score_points(series)?;
    let summary = StageSummary {
        algorithm: scorer.algorithm_name(),
        scored: scores.len(),
        anomalies: scores.anomaly_count(),
        threshold: scores.threshold,
        elapsed: stage.elapsed(),
    };
    info!(
        algorithm = summary.algorithm,
        points = summary.scored,
        anomalies = summary.anomalies,
        "point stage done"
    );
    Ok((scores, summary))
}
