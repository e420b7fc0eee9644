//! Telemetry sessions, laps and car samples

use crate::{Error, Result};
use anomaly_core::{Sample, TimeSeries};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Type of an on-track session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SessionKind {
    #[serde(rename = "FP1")]
    Practice1,
    #[serde(rename = "FP2")]
    Practice2,
    #[serde(rename = "FP3")]
    Practice3,
    #[serde(rename = "Q")]
    Qualifying,
    #[serde(rename = "S")]
    Sprint,
    #[serde(rename = "R")]
    Race,
}

impl SessionKind {
    pub const ALL: [SessionKind; 6] = [
        Self::Practice1,
        Self::Practice2,
        Self::Practice3,
        Self::Qualifying,
        Self::Sprint,
        Self::Race,
    ];

    /// Short code, e.g. `FP1` or `Q`
    pub fn code(&self) -> &'static str {
        match self {
            Self::Practice1 => "FP1",
            Self::Practice2 => "FP2",
            Self::Practice3 => "FP3",
            Self::Qualifying => "Q",
            Self::Sprint => "S",
            Self::Race => "R",
        }
    }
}

impl fmt::Display for SessionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for SessionKind {
    type Err = Error;

    /// Accepts the short codes and the spelled-out names, ignoring case
    fn from_str(s: &str) -> Result<Self> {
        let kind = match s.trim().to_ascii_uppercase().as_str() {
            "FP1" | "PRACTICE 1" => Self::Practice1,
            "FP2" | "PRACTICE 2" => Self::Practice2,
            "FP3" | "PRACTICE 3" => Self::Practice3,
            "Q" | "QUALIFYING" => Self::Qualifying,
            "S" | "SPRINT" => Self::Sprint,
            "R" | "RACE" => Self::Race,
            _ => {
                return Err(Error::invalid_selection(format!(
                    "unknown session type '{s}' (expected one of FP1, FP2, FP3, Q, S, R)"
                )))
            }
        };
        Ok(kind)
    }
}

/// Full lookup key for one driver's telemetry
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionKey {
    pub year: u16,
    pub event: String,
    pub session: SessionKind,
    pub driver: String,
}

impl SessionKey {
    /// Driver codes are stored upper-case
    pub fn new(year: u16, event: impl Into<String>, session: SessionKind, driver: &str) -> Self {
        Self {
            year,
            event: event.into(),
            session,
            driver: driver.trim().to_ascii_uppercase(),
        }
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} {}", self.year, self.event, self.session, self.driver)
    }
}

/// Telemetry channel of a car sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    /// km/h
    Speed,
    /// percent
    Throttle,
    /// 0 or 1
    Brake,
    Gear,
    /// metres from the start of the lap
    Distance,
}

impl Channel {
    pub const ALL: [Channel; 5] = [
        Self::Speed,
        Self::Throttle,
        Self::Brake,
        Self::Gear,
        Self::Distance,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Speed => "Speed",
            Self::Throttle => "Throttle",
            Self::Brake => "Brake",
            Self::Gear => "nGear",
            Self::Distance => "Distance",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Channel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let channel = match s.trim().to_ascii_lowercase().as_str() {
            "speed" => Self::Speed,
            "throttle" => Self::Throttle,
            "brake" => Self::Brake,
            "gear" | "ngear" => Self::Gear,
            "distance" => Self::Distance,
            _ => {
                return Err(Error::invalid_selection(format!(
                    "unknown telemetry channel '{s}'"
                )))
            }
        };
        Ok(channel)
    }
}

/// One car-data sample; `time` is seconds from the start of the lap
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CarSample {
    pub time: f64,
    pub speed: Option<f64>,
    pub throttle: Option<f64>,
    pub brake: Option<f64>,
    pub gear: Option<u8>,
    #[serde(default)]
    pub distance: Option<f64>,
}

impl CarSample {
    pub fn get(&self, channel: Channel) -> Option<f64> {
        match channel {
            Channel::Speed => self.speed,
            Channel::Throttle => self.throttle,
            Channel::Brake => self.brake,
            Channel::Gear => self.gear.map(f64::from),
            Channel::Distance => self.distance,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lap {
    pub driver: String,
    pub lap_number: u32,
    /// Seconds; `None` for laps without a valid time
    pub lap_time: Option<f64>,
    pub samples: Vec<CarSample>,
}

impl Lap {
    /// Copy of the lap with distance filled in from speed where missing
    ///
    /// Distance is the running sum of `speed / 3.6 * dt`, starting at 0 on
    /// the first sample; a missing speed contributes nothing.
    pub fn with_distance(&self) -> Lap {
        let mut lap = self.clone();
        if lap.samples.iter().all(|s| s.distance.is_some()) {
            return lap;
        }
        let mut travelled = 0.0;
        let mut previous_time = lap.samples.first().map(|s| s.time);
        for sample in &mut lap.samples {
            if let Some(prev) = previous_time {
                let dt = sample.time - prev;
                travelled += sample.speed.unwrap_or(0.0) / 3.6 * dt;
            }
            previous_time = Some(sample.time);
            sample.distance = Some(travelled);
        }
        lap
    }

    /// One channel of the lap as a time series named after the channel
    ///
    /// Fails with `InvalidSelection` when the channel carries no values at
    /// all on this lap.
    pub fn channel(&self, channel: Channel) -> Result<TimeSeries> {
        let lap = if channel == Channel::Distance {
            self.with_distance()
        } else {
            self.clone()
        };
        let samples: Vec<Sample> = lap
            .samples
            .iter()
            .map(|s| Sample {
                time: s.time,
                value: s.get(channel),
            })
            .collect();
        if samples.iter().all(|s| s.value.is_none()) {
            return Err(Error::invalid_selection(format!(
                "channel {channel} has no values on lap {} of {}",
                self.lap_number, self.driver
            )));
        }
        Ok(TimeSeries::new(channel.name(), samples)?)
    }
}

/// All laps of one session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub year: u16,
    pub event: String,
    pub kind: SessionKind,
    pub laps: Vec<Lap>,
}

impl Session {
    /// Sorted, de-duplicated driver codes of every lap
    pub fn driver_codes(&self) -> Vec<String> {
        self.laps
            .iter()
            .map(|lap| lap.driver.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn laps_of<'a>(&'a self, driver: &'a str) -> impl Iterator<Item = &'a Lap> + 'a {
        self.laps
            .iter()
            .filter(move |lap| lap.driver.eq_ignore_ascii_case(driver))
    }

    /// The driver's lap with the smallest time; untimed laps never qualify
    pub fn fastest_lap(&self, driver: &str) -> Option<&Lap> {
        self.laps
            .iter()
            .filter(|lap| lap.driver.eq_ignore_ascii_case(driver))
            .filter_map(|lap| lap.lap_time.map(|t| (t, lap)))
            .min_by(|(a, _), (b, _)| a.total_cmp(b))
            .map(|(_, lap)| lap)
    }
}
