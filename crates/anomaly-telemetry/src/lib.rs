//! Series acquisition for telemetry anomaly scoring
//!
//! Everything that produces or persists a [`TimeSeries`](anomaly_core::TimeSeries):
//!
//! - [`TelemetryProvider`]: sessions by season, event and session kind, with
//!   [`fetch_driver_channel`] selecting one channel of a driver's fastest lap
//! - [`SessionStore`]: append-only storage of loaded sessions, injected into
//!   a [`CachedProvider`]
//! - CSV input of sensor exports and CSV round-trip of annotated series
//! - [`SensorSimulator`]: a seeded drifting sensor for demos and tests
//! - [`ReplayStream`]: cancellable, paced replay of a recorded series
//!
//! # Example
//!
//! ```rust
//! use anomaly_telemetry::{ReplayStream, SensorSimulator};
//! use std::time::Duration;
//!
//! let series = SensorSimulator::new().len(100).generate().unwrap();
//! let replay = ReplayStream::new(series, 40)
//!     .unwrap()
//!     .interval(Duration::ZERO);
//! let lengths: Vec<usize> = replay.map(|prefix| prefix.len()).collect();
//! assert_eq!(lengths, vec![40, 80, 100]);
//! ```

pub mod cached;
pub mod csv_io;
pub mod error;
pub mod provider;
pub mod replay;
pub mod session;
pub mod store;
pub mod synthetic;

pub use cached::CachedProvider;
pub use csv_io::{
    read_annotated_csv, read_annotated_csv_path, read_sensor_csv, read_series_csv,
    write_annotated_csv, write_annotated_csv_path, ANNOTATED_COLUMNS,
};
pub use error::{Error, Result};
pub use provider::{driver_codes, fetch_driver_channel, DirectoryProvider, TelemetryProvider};
pub use replay::{ReplayStream, DEFAULT_CHUNK_SIZE, DEFAULT_INTERVAL};
pub use session::{CarSample, Channel, Lap, Session, SessionKey, SessionKind};
pub use store::{DirectoryStore, MemoryStore, SessionStore, StoreKey, StoreStats};
pub use synthetic::SensorSimulator;
