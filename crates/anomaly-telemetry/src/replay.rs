//! Paced replay of a recorded series
//!
//! [`ReplayStream`] yields growing prefixes of a series, `chunk_size` samples
//! more each time, waiting `interval` between prefixes. The wait happens on
//! a [`CancellationToken`], so cancelling from another thread wakes the
//! stream at once and ends it.

use crate::{Error, Result};
use anomaly_core::{CancellationToken, TimeSeries};
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_CHUNK_SIZE: usize = 10;
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug)]
pub struct ReplayStream {
    series: TimeSeries,
    chunk_size: usize,
    interval: Duration,
    token: CancellationToken,
    emitted: usize,
}

impl ReplayStream {
    /// Replay in chunks of `chunk_size` at the default interval
    pub fn new(series: TimeSeries, chunk_size: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(Error::Core(anomaly_core::Error::InvalidParameter(
                "chunk_size must be at least 1".to_string(),
            )));
        }
        Ok(Self {
            series,
            chunk_size,
            interval: DEFAULT_INTERVAL,
            token: CancellationToken::new(),
            emitted: 0,
        })
    }

    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Observe an existing token instead of a private one
    pub fn with_token(mut self, token: CancellationToken) -> Self {
        self.token = token;
        self
    }

    /// Token that stops this stream; clone it to cancel from elsewhere
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Number of prefixes not yet yielded
    pub fn remaining(&self) -> usize {
        (self.series.len() - self.emitted).div_ceil(self.chunk_size)
    }
}

impl Iterator for ReplayStream {
    type Item = TimeSeries;

    fn next(&mut self) -> Option<TimeSeries> {
        if self.token.is_cancelled() || self.emitted >= self.series.len() {
            return None;
        }
        if self.emitted > 0 && self.token.wait_timeout(self.interval) {
            debug!(emitted = self.emitted, "replay cancelled");
            return None;
        }
        self.emitted = self.emitted.saturating_add(self.chunk_size).min(self.series.len());
        Some(self.series.prefix(self.emitted))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.token.is_cancelled() {
            return (0, Some(0));
        }
        (0, Some(self.remaining()))
    }
}
