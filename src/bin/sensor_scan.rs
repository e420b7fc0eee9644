//! # sensor-scan
//!
//! Command-line front end: score a simulated sensor, a CSV export or one
//! channel of an exported telemetry session.

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::time::Duration;
use telemetry_anomaly::anomaly_core::TimeSeries;
use telemetry_anomaly::anomaly_telemetry::{
    driver_codes, fetch_driver_channel, read_series_csv, CachedProvider, Channel,
    DirectoryProvider, DirectoryStore, ReplayStream, SensorSimulator, SessionKey, SessionKind,
    TelemetryProvider,
};
use telemetry_anomaly::{PipelineConfig, ScoringPipeline};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sensor-scan", version)]
#[command(about = "Anomaly scoring for sensor and telemetry series", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score a simulated drifting sensor
    Simulate {
        #[command(flatten)]
        sensor: SensorArgs,

        #[command(flatten)]
        scan: ScanArgs,
    },

    /// Score one column of a CSV file
    Scan {
        /// Input CSV file
        input: PathBuf,

        /// Column holding the timestamps
        #[arg(long, default_value = "time")]
        time_column: String,

        /// Column holding the measurements
        #[arg(long, default_value = "sensor")]
        value_column: String,

        #[command(flatten)]
        scan: ScanArgs,
    },

    /// Score one channel of a driver's fastest lap in an exported session
    Session {
        #[command(flatten)]
        session: SessionArgs,

        /// Channel to score (Speed, Throttle, Brake, nGear, Distance)
        #[arg(long, default_value = "Speed")]
        channel: Channel,

        /// Driver code, e.g. VER
        #[arg(long)]
        driver: String,

        #[command(flatten)]
        scan: ScanArgs,
    },

    /// List the drivers of an exported session
    Drivers {
        #[command(flatten)]
        session: SessionArgs,
    },
}

#[derive(Args)]
struct SensorArgs {
    /// Number of samples
    #[arg(long, default_value = "1000")]
    len: usize,

    /// Level of the undisturbed signal
    #[arg(long, default_value = "25.0")]
    base: f64,

    /// Standard deviation of the noise
    #[arg(long, default_value = "0.5")]
    noise: f64,

    /// Number of trailing samples that drift
    #[arg(long, default_value = "300")]
    drift_len: usize,

    /// Offset reached at the end of the drift
    #[arg(long, default_value = "5.0")]
    drift: f64,

    /// Seed of the simulated noise
    #[arg(long, default_value = "42")]
    data_seed: u64,
}

#[derive(Args)]
struct SessionArgs {
    /// Root of the exported session tree
    #[arg(long)]
    data_dir: PathBuf,

    /// Keep loaded sessions in this directory
    #[arg(long)]
    cache_dir: Option<PathBuf>,

    #[arg(long)]
    year: u16,

    /// Event name, e.g. "Monaco Grand Prix"
    #[arg(long)]
    event: String,

    /// Session (FP1, FP2, FP3, Q, S, R)
    #[arg(long, default_value = "R")]
    session: SessionKind,
}

impl SessionArgs {
    fn provider(&self) -> anyhow::Result<Box<dyn TelemetryProvider>> {
        let source = DirectoryProvider::new(&self.data_dir);
        Ok(match &self.cache_dir {
            Some(dir) => {
                let store = DirectoryStore::open(dir)
                    .with_context(|| format!("opening session store {}", dir.display()))?;
                Box::new(CachedProvider::new(source, store))
            }
            None => Box::new(source),
        })
    }
}

#[derive(Args)]
struct ScanArgs {
    /// JSON pipeline configuration; flags below override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Seed every randomised scorer
    #[arg(long)]
    seed: Option<u64>,

    /// Expected outlier fraction of the isolation forest
    #[arg(long)]
    contamination: Option<f64>,

    /// Outlier bound of the one-class SVM
    #[arg(long)]
    nu: Option<f64>,

    /// Rolling feature window
    #[arg(long)]
    rolling_window: Option<usize>,

    /// Sliding window length of the sequence scorer
    #[arg(long)]
    window_size: Option<usize>,

    /// Leading fraction of windows used for training
    #[arg(long)]
    train_fraction: Option<f64>,

    #[arg(long)]
    epochs: Option<usize>,

    #[arg(long)]
    batch_size: Option<usize>,

    #[arg(long)]
    latent_dim: Option<usize>,

    #[arg(long)]
    learning_rate: Option<f64>,

    /// Percentile of reconstruction errors used as threshold
    #[arg(long)]
    percentile: Option<f64>,

    /// Give up training after this many seconds
    #[arg(long)]
    time_limit: Option<f64>,

    #[arg(long)]
    no_isolation: bool,

    #[arg(long)]
    no_svm: bool,

    #[arg(long)]
    no_lstm: bool,

    /// Write the annotated series to this CSV file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Replay the series before scoring it
    #[arg(long)]
    replay: bool,

    /// Samples added per replay step
    #[arg(long, default_value = "10")]
    chunk_size: usize,

    /// Pause between replay steps, in milliseconds
    #[arg(long, default_value = "100")]
    interval_ms: u64,
}

impl ScanArgs {
    fn pipeline_config(&self) -> anyhow::Result<PipelineConfig> {
        let mut config = match &self.config {
            Some(path) => PipelineConfig::from_json_file(path)?,
            None => PipelineConfig::default(),
        };
        if let Some(seed) = self.seed {
            config = config.with_seed(seed);
        }
        if self.rolling_window.is_some() {
            config.rolling_window = self.rolling_window;
        }
        if self.no_isolation {
            config.isolation = None;
        }
        if self.no_svm {
            config.svm = None;
        }
        if self.no_lstm {
            config.sequence = None;
        }

        if let Some(isolation) = config.isolation.as_mut() {
            if let Some(contamination) = self.contamination {
                isolation.contamination = contamination;
            }
        }
        if let Some(svm) = config.svm.as_mut() {
            if let Some(nu) = self.nu {
                svm.nu = nu;
            }
        }
        if let Some(sequence) = config.sequence.as_mut() {
            sequence.window_size = self.window_size.unwrap_or(sequence.window_size);
            sequence.train_fraction = self.train_fraction.unwrap_or(sequence.train_fraction);
            sequence.epochs = self.epochs.unwrap_or(sequence.epochs);
            sequence.batch_size = self.batch_size.unwrap_or(sequence.batch_size);
            sequence.latent_dim = self.latent_dim.unwrap_or(sequence.latent_dim);
            sequence.learning_rate = self.learning_rate.unwrap_or(sequence.learning_rate);
            sequence.percentile = self.percentile.unwrap_or(sequence.percentile);
            if self.time_limit.is_some() {
                sequence.time_limit_secs = self.time_limit;
            }
        }
        Ok(config)
    }

    fn pipeline(&self) -> anyhow::Result<ScoringPipeline> {
        let config = self.pipeline_config()?;
        ScoringPipeline::new(config).context("invalid pipeline settings")
    }

    fn replay(&self, series: &TimeSeries) -> anyhow::Result<()> {
        let stream = ReplayStream::new(series.drop_missing(), self.chunk_size)?
            .interval(Duration::from_millis(self.interval_ms));
        for prefix in stream {
            if let Some(last) = prefix.samples().last() {
                println!(
                    "{:>6} samples  t = {:>8.2}  value = {:>10.4}",
                    prefix.len(),
                    last.time,
                    last.value.unwrap_or(f64::NAN)
                );
            }
        }
        Ok(())
    }

    fn run(&self, series: &TimeSeries) -> anyhow::Result<()> {
        let pipeline = self.pipeline()?;
        if self.replay {
            self.replay(series)?;
        }
        let report = match &self.output {
            Some(path) => pipeline
                .run_to_csv(series, path)
                .with_context(|| format!("scoring {}", series.name()))?,
            None => pipeline
                .run(series)
                .with_context(|| format!("scoring {}", series.name()))?,
        };
        print!("{report}");
        if let Some(path) = &self.output {
            println!("annotated series written to {}", path.display());
        }
        Ok(())
    }
}

fn read_input(path: &Path, time_column: &str, value_column: &str) -> anyhow::Result<TimeSeries> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("cannot open {}", path.display()))?;
    let series = read_series_csv(file, time_column, value_column)
        .with_context(|| format!("reading {}", path.display()))?;
    Ok(series)
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Simulate { sensor, scan } => {
            let series = SensorSimulator::new()
                .len(sensor.len)
                .base(sensor.base)
                .noise_std(sensor.noise)
                .drift(sensor.drift_len, sensor.drift)
                .seed(Some(sensor.data_seed))
                .generate()?;
            info!(len = series.len(), "simulated sensor");
            scan.run(&series)?;
        }
        Commands::Scan {
            input,
            time_column,
            value_column,
            scan,
        } => {
            let series = read_input(&input, &time_column, &value_column)?;
            scan.run(&series)?;
        }
        Commands::Session {
            session,
            channel,
            driver,
            scan,
        } => {
            let key = SessionKey::new(session.year, &session.event, session.session, &driver);
            let provider = session.provider()?;
            let series = fetch_driver_channel(provider.as_ref(), &key, channel)?;
            scan.run(&series)?;
        }
        Commands::Drivers { session } => {
            let provider = session.provider()?;
            let codes = driver_codes(
                provider.as_ref(),
                session.year,
                &session.event,
                session.session,
            )?;
            if codes.is_empty() {
                bail!("no drivers in {} {} {}", session.year, session.event, session.session);
            }
            println!("{}", codes.join(" "));
        }
    }

    Ok(())
}
